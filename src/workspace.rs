//! Scoped cleanup of a temporary working directory.
//!
//! The caller owns the temporary workspace that the templates were fetched
//! into. [`TempWorkspace`] removes it when the run ends, whether the run
//! succeeded, failed, or returned early with an error.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A directory that is removed when the guard is dropped.
#[derive(Debug)]
pub struct TempWorkspace {
    path: PathBuf,
    removed: bool,
}

impl TempWorkspace {
    /// Guard an existing or future directory.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            removed: false,
        }
    }

    /// The guarded directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the directory now.
    ///
    /// Returns `false` if there was nothing to remove. After this call the
    /// guard no longer acts on drop.
    pub fn remove(&mut self) -> io::Result<bool> {
        self.removed = true;
        match fs::remove_dir_all(&self.path) {
            Ok(()) => {
                debug!("Removed workspace {}", self.path.display());
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }
}

impl Drop for TempWorkspace {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        if let Err(e) = self.remove() {
            warn!(
                "Failed to remove workspace {}: {}",
                self.path.display(),
                e
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn drop_removes_directory() {
        let temp = TempDir::new().unwrap();
        let work = temp.path().join("temp");
        fs::create_dir_all(work.join("repo")).unwrap();

        {
            let _guard = TempWorkspace::new(&work);
        }

        assert!(!work.exists());
    }

    #[test]
    fn remove_reports_missing_directory() {
        let temp = TempDir::new().unwrap();
        let mut guard = TempWorkspace::new(temp.path().join("never-created"));
        assert!(!guard.remove().unwrap());
    }

    #[test]
    fn explicit_remove_disarms_drop() {
        let temp = TempDir::new().unwrap();
        let work = temp.path().join("temp");
        fs::create_dir(&work).unwrap();

        let mut guard = TempWorkspace::new(&work);
        assert!(guard.remove().unwrap());

        // Recreated after removal; the guard must leave it alone.
        fs::create_dir(&work).unwrap();
        drop(guard);
        assert!(work.exists());
    }
}
