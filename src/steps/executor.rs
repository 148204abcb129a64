//! Single-step execution.
//!
//! Runs one step's action against the working context and captures the
//! outcome as a [`StepResult`].

use crate::error::DeployerError;
use crate::steps::actions::{ProcessFailure, StepContext};
use crate::steps::step::Step;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Status of a step in the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    /// Step is waiting to run.
    Pending,

    /// Step is currently executing.
    Running,

    /// Step completed successfully.
    Succeeded,

    /// Step failed.
    Failed,

    /// Step never ran because an earlier step failed.
    Skipped,
}

impl StepStatus {
    /// Check if this is a terminal state (no more changes expected).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StepStatus::Succeeded | StepStatus::Failed | StepStatus::Skipped
        )
    }

    /// Outcome word printed after the step label.
    pub fn outcome(&self) -> &'static str {
        match self {
            StepStatus::Pending => "PENDING",
            StepStatus::Running => "RUNNING",
            StepStatus::Succeeded => "OK",
            StepStatus::Failed => "FAILED",
            StepStatus::Skipped => "SKIPPED",
        }
    }
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StepStatus::Pending => "pending",
            StepStatus::Running => "running",
            StepStatus::Succeeded => "succeeded",
            StepStatus::Failed => "failed",
            StepStatus::Skipped => "skipped",
        };
        write!(f, "{}", s)
    }
}

/// Result of executing a step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepResult {
    /// Position of the step in the declared order.
    pub ordinal: usize,

    /// Step label.
    pub label: String,

    /// Step kind name.
    pub kind: &'static str,

    /// Terminal status.
    pub status: StepStatus,

    /// Execution duration.
    pub duration: Duration,

    /// Error detail (if failed).
    pub error: Option<String>,

    /// Captured output (if any).
    pub output: Option<String>,
}

impl StepResult {
    /// Create a success result.
    pub fn succeeded(step: &Step, duration: Duration, output: Option<String>) -> Self {
        Self::new(step, StepStatus::Succeeded, duration, None, output)
    }

    /// Create a failure result.
    pub fn failed(step: &Step, duration: Duration, error: String) -> Self {
        Self::new(step, StepStatus::Failed, duration, Some(error), None)
    }

    /// Attach captured output, e.g. what a failed process printed.
    pub fn with_output(mut self, output: Option<String>) -> Self {
        self.output = output;
        self
    }

    /// Create a skipped result.
    pub fn skipped(step: &Step) -> Self {
        Self::new(step, StepStatus::Skipped, Duration::ZERO, None, None)
    }

    fn new(
        step: &Step,
        status: StepStatus,
        duration: Duration,
        error: Option<String>,
        output: Option<String>,
    ) -> Self {
        Self {
            ordinal: step.ordinal,
            label: step.label.clone(),
            kind: step.kind.name(),
            status,
            duration,
            error,
            output,
        }
    }

    /// Whether the step succeeded.
    pub fn is_success(&self) -> bool {
        self.status == StepStatus::Succeeded
    }

    /// The failure as a `StepExecutionError`, if the step failed.
    pub fn to_error(&self) -> Option<DeployerError> {
        match (&self.status, &self.error) {
            (StepStatus::Failed, Some(message)) => Some(DeployerError::StepExecutionError {
                step: self.label.clone(),
                message: message.clone(),
            }),
            _ => None,
        }
    }
}

/// Execute a single step.
///
/// Action errors never escape: they become a failed [`StepResult`] carrying
/// the full error chain.
pub fn execute_step(step: &Step, ctx: &StepContext<'_>) -> StepResult {
    if ctx.settings.dry_run {
        debug!("Dry run, skipping side effect of step #{}", step.ordinal);
        return StepResult::succeeded(step, Duration::ZERO, Some("dry run".to_string()));
    }

    let start = Instant::now();
    match step.kind.action().apply(ctx) {
        Ok(output) => StepResult::succeeded(step, start.elapsed(), output),
        Err(e) => {
            let message = format!("{:#}", e);
            warn!("Step #{} '{}' failed: {}", step.ordinal, step.label, message);
            StepResult::failed(step, start.elapsed(), message)
                .with_output(ProcessFailure::output_of(&e).map(str::to_string))
        }
    }
}
