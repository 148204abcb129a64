//! Run command implementation.
//!
//! The `deployer run` command resolves the template against the data file
//! and executes the resulting steps.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::warn;

use crate::cli::args::RunArgs;
use crate::config::{resolve_files, ExecutionSettings};
use crate::error::Result;
use crate::runner::{exit_code, write_report, Executor};
use crate::workspace::TempWorkspace;

use super::dispatcher::{Command, CommandResult};

/// The run command implementation.
pub struct RunCommand {
    workdir: PathBuf,
    args: RunArgs,
    verbose: bool,
}

impl RunCommand {
    /// Create a new run command.
    ///
    /// `workdir` is used when the arguments do not name one.
    pub fn new(workdir: &Path, args: RunArgs, verbose: bool) -> Self {
        Self {
            workdir: args.workdir.clone().unwrap_or_else(|| workdir.to_path_buf()),
            args,
            verbose,
        }
    }

    /// Build execution settings from args.
    fn build_settings(&self) -> ExecutionSettings {
        ExecutionSettings::new(&self.workdir)
            .with_verbose(self.verbose)
            .with_dry_run(self.args.dry_run)
            .with_step_timeout(self.args.step_timeout.map(Duration::from_secs))
    }

    fn run(&self, settings: &ExecutionSettings, out: &mut dyn Write) -> Result<CommandResult> {
        let config = resolve_files(&self.args.inputs.template, &self.args.inputs.data)?;

        if self.args.dry_run {
            writeln!(out, "Running in dry-run mode - no steps will be applied")?;
        }

        let summary = Executor::new(settings).execute(config.steps(), out)?;
        write_report(&summary, out, self.verbose)?;

        match exit_code(&summary) {
            0 => Ok(CommandResult::success()),
            code => Ok(CommandResult::failure(code)),
        }
    }
}

impl Command for RunCommand {
    fn execute(&self, out: &mut dyn Write) -> Result<CommandResult> {
        let mut workspace = self.args.cleanup.as_ref().map(TempWorkspace::new);
        let settings = self.build_settings();

        writeln!(out, "Deployer {}", env!("CARGO_PKG_VERSION"))?;
        if self.verbose {
            writeln!(out, "Working directory: {}", self.workdir.display())?;
        }
        writeln!(out)?;

        let outcome = self.run(&settings, out);

        if let Some(workspace) = workspace.as_mut() {
            let label = format!("Removing {}", workspace.path().display());
            let status = match workspace.remove() {
                Ok(_) => "OK",
                Err(e) => {
                    warn!("Cleanup of {} failed: {}", workspace.path().display(), e);
                    "FAILED"
                }
            };
            writeln!(
                out,
                "{:<width$} {}",
                label,
                status,
                width = settings.label_width
            )?;
        }

        outcome
    }
}
