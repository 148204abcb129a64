//! Error types for deployer operations.
//!
//! This module defines [`DeployerError`], the error type used throughout
//! the crate, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Loading, resolution, and validation errors are fatal and surface before
//!   any step runs
//! - Step failures are recorded in the run summary rather than returned
//! - Use `anyhow::Error` (via `DeployerError::Other`) for unexpected errors

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for deployer operations.
#[derive(Debug, Error)]
pub enum DeployerError {
    /// A template or data document is missing, unreadable, or malformed.
    #[error("Failed to parse {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    /// A template placeholder has no matching key in the data file.
    #[error("Unresolved reference '{{{{{name}}}}}' at {location}")]
    UnresolvedReference { name: String, location: String },

    /// A step has an unsupported kind or invalid parameters.
    #[error("Invalid step #{ordinal}: {message}")]
    InvalidStep { ordinal: usize, message: String },

    /// A step's side effect failed at run time.
    #[error("Step '{step}' failed: {message}")]
    StepExecutionError { step: String, message: String },

    /// The resolved configuration is structurally invalid.
    #[error("Invalid configuration: {message}")]
    ConfigValidationError { message: String },

    /// A process could not be started or waited on.
    #[error("Command failed with exit code {code:?}: {command}")]
    CommandFailed { command: String, code: Option<i32> },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for deployer operations.
pub type Result<T> = std::result::Result<T, DeployerError>;
