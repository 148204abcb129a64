//! Deployer - resolve a templated build configuration and run its steps.
//!
//! A run has two phases. First a configuration template is merged with a
//! data file, substituting every `{{name}}` placeholder and extracting an
//! ordered list of typed steps. Then the steps run one after another
//! against the working directory, stopping at the first failure.
//!
//! # Modules
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Document loading, placeholder substitution, and resolution
//! - [`error`] - Error types and result aliases
//! - [`runner`] - Sequential execution, run summary, and reporting
//! - [`shell`] - Process execution
//! - [`steps`] - Step model and per-step execution
//! - [`workspace`] - Scoped cleanup of a temporary directory
//!
//! # Example
//!
//! ```
//! use deployer::config::{resolve, DataFile, ExecutionSettings};
//! use deployer::runner::{Executor, RunStatus};
//! use serde_json::json;
//!
//! let workdir = tempfile::TempDir::new().unwrap();
//! let template = json!({"steps": [{"kind": "mkdir", "path": "{{outDir}}/bin"}]});
//! let data = DataFile::from_value(json!({"outDir": "build"})).unwrap();
//!
//! let config = resolve(&template, &data).unwrap();
//! let settings = ExecutionSettings::new(workdir.path());
//! let mut out = Vec::new();
//! let summary = Executor::new(&settings).execute(config.steps(), &mut out).unwrap();
//!
//! assert_eq!(summary.status(), RunStatus::Success);
//! assert!(workdir.path().join("build/bin").is_dir());
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod runner;
pub mod shell;
pub mod steps;
pub mod workspace;

pub use error::{DeployerError, Result};
