//! Installer configuration.
//!
//! Every setting has a default matching the package manager's conventions,
//! so a configuration file is only needed to point the installer at a
//! different plugin package, extension key or install command.
//!
//! # Location
//!
//! The first of these wins:
//!
//! 1. `--config <path>` on the command line
//! 2. `$SKELETON_INSTALLER_CONFIG`
//! 3. `<config dir>/skeleton-installer/config.toml`, when it exists
//!    (`~/.config` on Linux, `~/Library/Application Support` on macOS,
//!    `%APPDATA%` on Windows)
//!
//! Paths from the first two sources may use `~` and environment variables.
//! With none of them present the defaults apply. A file that exists but
//! cannot be parsed is an error.
//!
//! # Format
//!
//! ```toml
//! extension-key = "laminas-skeleton-installer"
//! legacy-extension-keys = ["zend-skeleton-installer"]
//! plugin-name = "laminas/laminas-skeleton-installer"
//! broadcast-events = ["post-package-install"]
//! install-command = ["composer", "update", "--with-dependencies"]
//! manifest-file = "composer.json"
//! lock-file = "composer.lock"
//! vendor-dir = "vendor"
//! ```
//!
//! When `manifest-file` is not set the `COMPOSER` environment variable is
//! honored. When `lock-file` is not set it is derived from the manifest file
//! name (`composer.json` -> `composer.lock`).

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::constants::{
    CONFIG_ENV_VAR, EXTENSION_KEY, LEGACY_EXTENSION_KEY, PLUGIN_NAME, VENDOR_DIR, events,
};
use crate::core::SkeletonError;
use crate::core::file_error::{FileOperation, FileResultExt};
use crate::manifest::{ExtensionKeys, JsonManifestFile};

/// Installer settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct InstallerConfig {
    /// `extra` key holding optional-package declarations
    pub extension_key: String,

    /// Fallback `extra` keys, read in order and removed on cleanup
    pub legacy_extension_keys: Vec<String>,

    /// Package removed by self-removal
    pub plugin_name: String,

    /// Events forwarded to the host event bus during the restricted install
    pub broadcast_events: Vec<String>,

    /// Program and arguments of the restricted install; package names are appended
    pub install_command: Vec<String>,

    /// Manifest file name inside the project directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest_file: Option<String>,

    /// Lock file name inside the project directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lock_file: Option<String>,

    /// Directory installed packages live in
    pub vendor_dir: String,
}

impl Default for InstallerConfig {
    fn default() -> Self {
        Self {
            extension_key: EXTENSION_KEY.to_string(),
            legacy_extension_keys: vec![LEGACY_EXTENSION_KEY.to_string()],
            plugin_name: PLUGIN_NAME.to_string(),
            broadcast_events: vec![events::POST_PACKAGE_INSTALL.to_string()],
            install_command: vec![
                "composer".to_string(),
                "update".to_string(),
                "--with-dependencies".to_string(),
            ],
            manifest_file: None,
            lock_file: None,
            vendor_dir: VENDOR_DIR.to_string(),
        }
    }
}

impl InstallerConfig {
    /// Load the configuration, resolving its location as described in the
    /// module docs.
    pub fn load(explicit: Option<&str>) -> Result<Self> {
        Self::load_with(explicit, |name| std::env::var(name).ok(), Self::default_path())
    }

    /// [`load`](Self::load) with the environment and default location supplied.
    pub fn load_with<F>(explicit: Option<&str>, env: F, default_path: Option<PathBuf>) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = explicit {
            return Self::load_from(&expand_path(path)?);
        }

        if let Some(path) = env(CONFIG_ENV_VAR).filter(|path| !path.trim().is_empty()) {
            return Self::load_from(&expand_path(&path)?);
        }

        match default_path {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => {
                tracing::debug!("no configuration file; using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load and validate the configuration file at `path`.
    pub fn load_from(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "loading configuration");
        let content = std::fs::read_to_string(path).with_file_context(
            FileOperation::Read,
            path,
            "reading installer configuration",
            "config",
        )?;

        let config: Self = toml::from_str(&content).map_err(|e| SkeletonError::ConfigError {
            message: format!("Failed to parse {}: {}", path.display(), e),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// `<config dir>/skeleton-installer/config.toml`, if the platform has a
    /// configuration directory.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("skeleton-installer").join("config.toml"))
    }

    /// Reject settings the workflows cannot run with.
    pub fn validate(&self) -> Result<(), SkeletonError> {
        let invalid = |message: &str| SkeletonError::ConfigError {
            message: message.to_string(),
        };

        if self.extension_key.trim().is_empty() {
            return Err(invalid("extension-key must not be empty"));
        }
        if self.plugin_name.trim().is_empty() {
            return Err(invalid("plugin-name must not be empty"));
        }
        if self.install_command.first().is_none_or(|program| program.trim().is_empty()) {
            return Err(invalid("install-command must name a program"));
        }
        if self.vendor_dir.trim().is_empty() {
            return Err(invalid("vendor-dir must not be empty"));
        }
        Ok(())
    }

    /// Extension keys to read declarations from.
    #[must_use]
    pub fn extension_keys(&self) -> ExtensionKeys {
        ExtensionKeys {
            canonical: self.extension_key.clone(),
            legacy: self.legacy_extension_keys.clone(),
        }
    }

    /// Path of the manifest in `project_dir`.
    #[must_use]
    pub fn manifest_path(&self, project_dir: &Path) -> PathBuf {
        match &self.manifest_file {
            Some(name) => project_dir.join(name),
            None => JsonManifestFile::discover(project_dir).path().to_path_buf(),
        }
    }

    /// Path of the lock file in `project_dir`.
    #[must_use]
    pub fn lock_path(&self, project_dir: &Path) -> PathBuf {
        match &self.lock_file {
            Some(name) => project_dir.join(name),
            None => {
                let manifest = self.manifest_path(project_dir);
                if manifest.extension().is_some_and(|extension| extension == "json") {
                    manifest.with_extension("lock")
                } else {
                    let mut name = manifest.into_os_string();
                    name.push(".lock");
                    PathBuf::from(name)
                }
            }
        }
    }

    /// Vendor directory in `project_dir`.
    #[must_use]
    pub fn vendor_path(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.vendor_dir)
    }
}

fn expand_path(path: &str) -> Result<PathBuf, SkeletonError> {
    shellexpand::full(path).map(|expanded| PathBuf::from(expanded.as_ref())).map_err(|e| {
        SkeletonError::ConfigError {
            message: format!("Failed to expand configuration path '{path}': {e}"),
        }
    })
}
