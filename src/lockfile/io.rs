//! Loading and saving lock files.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::core::SkeletonError;
use crate::utils::fs::write_json_file;

use super::LockFile;

impl LockFile {
    /// Load the lock file at `path`.
    ///
    /// A missing or empty file is an empty lock file, not an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let content = fs::read_to_string(path).with_context(|| {
            format!(
                "Cannot read lock file: {}\n\n\
                    Possible causes:\n\
                    - Permission denied (check file ownership)\n\
                    - File is locked by another process",
                path.display()
            )
        })?;

        if content.trim().is_empty() {
            return Ok(Self::new());
        }

        serde_json::from_str(&content)
            .map_err(|e| SkeletonError::LockfileParseError {
                file: path.display().to_string(),
                reason: e.to_string(),
            })
            .with_context(|| {
                format!(
                    "Invalid JSON in lock file: {}\n\n\
                    The lock file may be corrupted. Re-run the package manager's \
                    update command to regenerate it.",
                    path.display()
                )
            })
    }

    /// Save the lock file to `path` atomically.
    pub fn save(&self, path: &Path) -> Result<()> {
        tracing::debug!(
            path = %path.display(),
            packages = self.packages.len(),
            dev_packages = self.packages_dev.len(),
            aliases = self.aliases.len(),
            "writing lock file"
        );
        write_json_file(path, self)
            .with_context(|| format!("Failed to save lock file: {}", path.display()))
    }
}
