//! Step model and per-step execution.
//!
//! - [`Step`] / [`StepKind`] - typed, ordered executable units
//! - [`StepAction`] - the capability each kind implements
//! - [`execute_step`] - run one step and capture a [`StepResult`]
//!
//! # Example
//!
//! ```no_run
//! use deployer::config::{DataFile, ExecutionSettings};
//! use deployer::steps::{execute_step, Step, StepContext, StepStatus};
//! use serde_json::json;
//!
//! let step = Step::from_value(
//!     1,
//!     &json!({"kind": "mkdir", "path": "build/bin"}),
//!     &DataFile::default(),
//! )
//! .unwrap();
//!
//! let settings = ExecutionSettings::new("/tmp/work");
//! let result = execute_step(&step, &StepContext::new(&settings));
//! assert_eq!(result.status, StepStatus::Succeeded);
//! ```

pub mod actions;
pub mod executor;
pub mod step;

pub use actions::{ProcessFailure, StepAction, StepContext};
pub use executor::{execute_step, StepResult, StepStatus};
pub use step::{
    CopyStep, DeleteStep, MkdirStep, RunStep, Step, StepKind, TemplateStep, WriteStep,
};
