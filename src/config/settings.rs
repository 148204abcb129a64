//! Run settings.
//!
//! [`ExecutionSettings`] is built once by the caller and passed by reference
//! to the executor and to every step.

use std::path::PathBuf;
use std::time::Duration;

/// Settings that govern one run.
#[derive(Debug, Clone)]
pub struct ExecutionSettings {
    /// Directory that relative step paths resolve against.
    pub workdir: PathBuf,

    /// Write kind-specific parameter detail and process output.
    pub verbose: bool,

    /// Report what would run without touching the filesystem.
    pub dry_run: bool,

    /// Upper bound for `run` steps without their own `timeout` (None = unbounded).
    pub step_timeout: Option<Duration>,

    /// Column width of the padded step label.
    pub label_width: usize,
}

impl Default for ExecutionSettings {
    fn default() -> Self {
        Self {
            workdir: PathBuf::from("."),
            verbose: false,
            dry_run: false,
            step_timeout: None,
            label_width: 80,
        }
    }
}

impl ExecutionSettings {
    /// Settings rooted at the given working directory.
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
            ..Default::default()
        }
    }

    /// Enable or disable verbose output.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Enable or disable dry-run mode.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Bound `run` steps by a default timeout.
    pub fn with_step_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.step_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings() {
        let settings = ExecutionSettings::default();
        assert_eq!(settings.label_width, 80);
        assert!(!settings.verbose);
        assert!(!settings.dry_run);
        assert!(settings.step_timeout.is_none());
    }

    #[test]
    fn builder_sets_fields() {
        let settings = ExecutionSettings::new("/tmp/work")
            .with_verbose(true)
            .with_dry_run(true)
            .with_step_timeout(Some(Duration::from_secs(30)));

        assert_eq!(settings.workdir, PathBuf::from("/tmp/work"));
        assert!(settings.verbose);
        assert!(settings.dry_run);
        assert_eq!(settings.step_timeout, Some(Duration::from_secs(30)));
    }
}
