//! I/O operations for manifest files.
//!
//! - [`ManifestStore`] - the seam the workflows read and write through
//! - [`JsonManifestFile`] - the file-backed store
//! - Parsing and serializing a [`Manifest`] as JSON

use crate::constants::{MANIFEST_ENV_VAR, MANIFEST_FILE};
use crate::core::SkeletonError;
use crate::core::file_error::{FileOperation, FileResultExt};
use crate::manifest::Manifest;
use crate::utils::fs::{atomic_write, to_json_pretty};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Durable storage for the project manifest.
///
/// Each logical transaction reads once and writes once; nothing is cached
/// between calls.
pub trait ManifestStore {
    /// Read the current manifest.
    fn read(&self) -> Result<Manifest>;

    /// Replace the stored manifest.
    fn write(&self, manifest: &Manifest) -> Result<()>;
}

impl Manifest {
    /// Parse a manifest from JSON text. `file` is only used in errors.
    pub fn parse(content: &str, file: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(content)
            .map_err(|e| SkeletonError::ManifestParseError {
                file: file.to_string(),
                reason: e.to_string(),
            })
            .with_context(|| format!("Invalid JSON syntax in manifest file: {file}"))?;

        Self::from_value(value)
            .map_err(|error| match error {
                SkeletonError::ManifestParseError {
                    reason,
                    ..
                } => SkeletonError::ManifestParseError {
                    file: file.to_string(),
                    reason,
                },
                other => other,
            })
            .map_err(Into::into)
    }

    /// Serialize the manifest the way the package manager writes it.
    pub fn to_json_string(&self) -> Result<String> {
        to_json_pretty(self.as_map())
    }
}

/// Manifest stored as a JSON file on disk.
#[derive(Debug, Clone)]
pub struct JsonManifestFile {
    path: PathBuf,
}

impl JsonManifestFile {
    /// Store backed by the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
        }
    }

    /// Store for the manifest in `project_dir`.
    ///
    /// The file name comes from the `COMPOSER` environment variable when it is
    /// set, `composer.json` otherwise.
    pub fn discover(project_dir: &Path) -> Self {
        let file_name = std::env::var(MANIFEST_ENV_VAR)
            .ok()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| MANIFEST_FILE.to_string());
        Self::new(project_dir.join(file_name))
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ManifestStore for JsonManifestFile {
    fn read(&self) -> Result<Manifest> {
        if !self.path.exists() {
            return Err(SkeletonError::ManifestNotFound {
                path: self.path.display().to_string(),
            }
            .into());
        }

        let content = std::fs::read_to_string(&self.path).with_file_context(
            FileOperation::Read,
            &self.path,
            "reading manifest file",
            "manifest_io",
        )?;

        Manifest::parse(&content, &self.path.display().to_string())
    }

    fn write(&self, manifest: &Manifest) -> Result<()> {
        let json = manifest.to_json_string()?;
        tracing::debug!(path = %self.path.display(), "writing manifest");
        atomic_write(&self.path, json.as_bytes())
            .with_context(|| format!("Failed to save manifest: {}", self.path.display()))
    }
}
