//! Configuration loading and resolution.
//!
//! This module handles everything that happens before a step runs:
//! - Document loading in [`loader`]
//! - Placeholder parsing and substitution in [`interpolation`]
//! - Template resolution and step extraction in [`resolver`]
//! - Run settings in [`settings`]
//!
//! # Example
//!
//! ```
//! use deployer::config::{resolve, DataFile};
//! use serde_json::json;
//!
//! let template = json!({
//!     "dir": "{{outDir}}",
//!     "steps": [{"kind": "mkdir", "path": "{{outDir}}/bin"}]
//! });
//! let data = DataFile::from_value(json!({"outDir": "build"})).unwrap();
//!
//! let config = resolve(&template, &data).unwrap();
//! assert_eq!(config.steps()[0].label, "mkdir build/bin");
//! ```

pub mod interpolation;
pub mod loader;
pub mod resolver;
pub mod settings;

// Interpolation re-exports
pub use interpolation::{
    expand_text, parse_placeholders, render_text, substitute, DataFile,
    MissingKey, Segment,
};

// Loader re-exports
pub use loader::{load_data, load_document, load_template, parse_document, DocumentFormat};

// Resolver re-exports
pub use resolver::{resolve, resolve_files, resolve_value, ResolvedConfig, STEPS_KEY};

// Settings re-exports
pub use settings::ExecutionSettings;
