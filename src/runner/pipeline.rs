//! Sequential step execution.
//!
//! Steps run strictly in ordinal order, one at a time. The first failure
//! aborts the run: every remaining step is reported as skipped.

use crate::config::settings::ExecutionSettings;
use crate::error::Result;
use crate::runner::summary::RunSummary;
use crate::steps::{execute_step, Step, StepContext, StepResult};
use chrono::Utc;
use std::io::Write;
use std::time::Instant;
use tracing::{debug, info};

/// Runs an ordered step list against the working directory.
pub struct Executor<'a> {
    settings: &'a ExecutionSettings,
}

impl<'a> Executor<'a> {
    /// Create an executor for the given settings.
    pub fn new(settings: &'a ExecutionSettings) -> Self {
        Self { settings }
    }

    /// Execute the steps, writing progress to `sink`.
    ///
    /// Step failures are recorded in the returned [`RunSummary`].
    ///
    /// # Errors
    ///
    /// Returns `Io` only if writing to the sink fails.
    pub fn execute(&self, steps: &[Step], sink: &mut dyn Write) -> Result<RunSummary> {
        let started_at = Utc::now();
        let start = Instant::now();
        let ctx = StepContext::new(self.settings);
        let mut progress = Progress {
            sink,
            width: self.settings.label_width,
            verbose: self.settings.verbose,
        };

        info!("Running {} step(s)", steps.len());

        let mut results: Vec<StepResult> = Vec::with_capacity(steps.len());
        let mut aborted = false;

        for step in steps {
            if aborted {
                let result = StepResult::skipped(step);
                progress.skipped(&result)?;
                results.push(result);
                continue;
            }

            debug!("Step #{} '{}' running", step.ordinal, step.label);
            progress.start(step)?;

            let result = execute_step(step, &ctx);
            debug!(
                "Step #{} '{}' {} in {:?}",
                step.ordinal, step.label, result.status, result.duration
            );

            progress.finish(&result)?;
            aborted = !result.is_success();
            results.push(result);
        }

        Ok(RunSummary {
            started_at,
            elapsed: start.elapsed(),
            results,
        })
    }
}

/// Execute steps with default settings rooted at the current directory.
pub fn execute(steps: &[Step], sink: &mut dyn Write, verbose: bool) -> Result<RunSummary> {
    let settings = ExecutionSettings::default().with_verbose(verbose);
    Executor::new(&settings).execute(steps, sink)
}

/// Progress lines on the output sink.
struct Progress<'w> {
    sink: &'w mut dyn Write,
    width: usize,
    verbose: bool,
}

impl Progress<'_> {
    fn start(&mut self, step: &Step) -> Result<()> {
        if self.verbose {
            writeln!(self.sink, "{}", step.label)?;
            for (key, value) in step.kind.action().parameters() {
                writeln!(self.sink, "    {}: {}", key, value)?;
            }
        } else {
            write!(self.sink, "{:<width$}", step.label, width = self.width)?;
        }
        self.sink.flush()?;
        Ok(())
    }

    fn finish(&mut self, result: &StepResult) -> Result<()> {
        if self.verbose {
            if let Some(output) = &result.output {
                for line in output.lines() {
                    writeln!(self.sink, "    | {}", line)?;
                }
            }
            write!(self.sink, "{:<width$}", result.label, width = self.width)?;
        }
        self.outcome(result)
    }

    /// Skipped steps get no start marker, only the padded label and outcome.
    fn skipped(&mut self, result: &StepResult) -> Result<()> {
        write!(self.sink, "{:<width$}", result.label, width = self.width)?;
        self.outcome(result)
    }

    fn outcome(&mut self, result: &StepResult) -> Result<()> {
        writeln!(self.sink, " {}", result.status.outcome())?;
        if let Some(error) = &result.error {
            writeln!(self.sink, "    error: {}", error)?;
        }
        self.sink.flush()?;
        Ok(())
    }
}
