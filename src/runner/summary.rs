//! Aggregate outcome of a run.

use crate::steps::{StepResult, StepStatus};
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Overall status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Every step succeeded.
    Success,
    /// A step failed and the rest were skipped.
    Failure,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::Success => write!(f, "success"),
            RunStatus::Failure => write!(f, "failure"),
        }
    }
}

/// Total elapsed time and per-step results of one run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// When the run started.
    pub started_at: DateTime<Utc>,

    /// Wall-clock time from first step start to last step end.
    pub elapsed: Duration,

    /// One result per declared step, in ordinal order.
    pub results: Vec<StepResult>,
}

impl RunSummary {
    /// Overall status: success only when no step failed or was skipped.
    pub fn status(&self) -> RunStatus {
        if self.results.iter().all(StepResult::is_success) {
            RunStatus::Success
        } else {
            RunStatus::Failure
        }
    }

    /// Whether the run succeeded.
    pub fn is_success(&self) -> bool {
        self.status() == RunStatus::Success
    }

    /// The step that aborted the run, if any.
    pub fn failed_step(&self) -> Option<&StepResult> {
        self.results
            .iter()
            .find(|r| r.status == StepStatus::Failed)
    }

    /// Number of results with the given status.
    pub fn count(&self, status: StepStatus) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }
}
