//! Command dispatching.
//!
//! This module provides the core command infrastructure:
//! - [`Command`] trait for implementing commands
//! - [`CommandResult`] for uniform result reporting
//! - [`CommandDispatcher`] for routing CLI subcommands

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::cli::args::{Cli, Commands};
use crate::error::Result;

/// Trait for command implementations.
pub trait Command {
    /// Execute the command, writing human-readable output to `out`.
    fn execute(&self, out: &mut dyn Write) -> Result<CommandResult>;
}

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult {
    /// Whether the command succeeded.
    pub success: bool,

    /// Exit code to use (0 for success, non-zero for failure).
    pub exit_code: i32,
}

impl CommandResult {
    /// Create a successful result.
    pub fn success() -> Self {
        Self {
            success: true,
            exit_code: 0,
        }
    }

    /// Create a failure result.
    pub fn failure(exit_code: i32) -> Self {
        Self {
            success: false,
            exit_code,
        }
    }
}

/// Dispatches CLI commands to their implementations.
pub struct CommandDispatcher {
    workdir: PathBuf,
}

impl CommandDispatcher {
    /// Create a dispatcher whose default working directory is `workdir`.
    pub fn new(workdir: PathBuf) -> Self {
        Self { workdir }
    }

    /// Default working directory.
    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Dispatch and execute a command.
    pub fn dispatch(&self, cli: &Cli, out: &mut dyn Write) -> Result<CommandResult> {
        match &cli.command {
            Some(Commands::Run(args)) => {
                let cmd = super::run::RunCommand::new(&self.workdir, args.clone(), cli.verbose);
                cmd.execute(out)
            }
            Some(Commands::Config(args)) => {
                let cmd = super::config::ConfigCommand::new(args.clone());
                cmd.execute(out)
            }
            None => {
                let cmd = super::run::RunCommand::new(&self.workdir, cli.run.clone(), cli.verbose);
                cmd.execute(out)
            }
        }
    }
}
