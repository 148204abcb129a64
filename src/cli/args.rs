//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Template used when none is given.
pub const DEFAULT_TEMPLATE: &str = "build.json.tpl";

/// Data file used when none is given.
pub const DEFAULT_DATA: &str = "build.data.json";

/// Deployer - resolve a templated build configuration and run its steps.
#[derive(Debug, Parser)]
#[command(name = "deployer")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// Show step parameters and command output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Arguments for the implicit `run` when no subcommand is given
    #[command(flatten)]
    pub run: RunArgs,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Resolve the template and run its steps (default if no command specified)
    Run(RunArgs),

    /// Show the resolved configuration without running anything
    Config(ConfigArgs),
}

/// Template and data file locations.
#[derive(Debug, Clone, clap::Args)]
pub struct InputArgs {
    /// Configuration template
    #[arg(short, long, env = "DEPLOYER_TEMPLATE", default_value = DEFAULT_TEMPLATE)]
    pub template: PathBuf,

    /// Data file with placeholder values
    #[arg(short, long, env = "DEPLOYER_DATA", default_value = DEFAULT_DATA)]
    pub data: PathBuf,
}

impl Default for InputArgs {
    fn default() -> Self {
        Self {
            template: PathBuf::from(DEFAULT_TEMPLATE),
            data: PathBuf::from(DEFAULT_DATA),
        }
    }
}

/// Arguments for the `run` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub inputs: InputArgs,

    /// Directory that relative step paths resolve against (default: current directory)
    #[arg(short = 'C', long, env = "DEPLOYER_WORKDIR")]
    pub workdir: Option<PathBuf>,

    /// Kill `run` steps that take longer than this many seconds
    #[arg(long, env = "DEPLOYER_STEP_TIMEOUT", value_name = "SECS")]
    pub step_timeout: Option<u64>,

    /// Show what would run without touching the filesystem
    #[arg(long)]
    pub dry_run: bool,

    /// Remove this directory after the run, whether it succeeded or not
    #[arg(long, value_name = "DIR")]
    pub cleanup: Option<PathBuf>,
}

/// Arguments for the `config` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ConfigArgs {
    #[command(flatten)]
    pub inputs: InputArgs,

    /// Print only the ordered step labels
    #[arg(long)]
    pub steps: bool,
}
