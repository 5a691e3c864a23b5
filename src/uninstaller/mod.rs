//! Self-removal.
//!
//! Once the optional packages have been dealt with the installer has no
//! further purpose in the project. [`Uninstaller`] removes it:
//!
//! 1. Find the installer's own package in the installed repository (any
//!    version). If it is not installed, say so and skip to step 4.
//! 2. Uninstall it through the installation manager.
//! 3. Rewrite the lock data without it, carrying every lock setting over
//!    unchanged. A failed write is reported and does not stop the removal.
//! 4. Drop its entry from the manifest's `require` section.

use anyhow::{Context, Result};

use crate::constants::{PLUGIN_NAME, messages};
use crate::installer::InstallationManager;
use crate::io::InteractivePrompt;
use crate::lockfile::{InstalledRepository, LockData, Locker, PartitionedPackages};
use crate::manifest::ManifestStore;

/// What a self-removal run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemovalReport {
    /// The package was installed and has been uninstalled.
    pub uninstalled: bool,
    /// The lock data was rewritten.
    pub lock_updated: bool,
    /// The manifest had a `require` entry for the package.
    pub manifest_updated: bool,
}

/// Removes the installer package from the project.
pub struct Uninstaller<'a> {
    io: &'a mut dyn InteractivePrompt,
    manifest: &'a dyn ManifestStore,
    repository: &'a mut dyn InstalledRepository,
    locker: &'a mut dyn Locker,
    installation_manager: &'a mut dyn InstallationManager,
    plugin_name: String,
}

impl<'a> Uninstaller<'a> {
    /// Uninstaller for the default plugin package.
    pub fn new(
        io: &'a mut dyn InteractivePrompt,
        manifest: &'a dyn ManifestStore,
        repository: &'a mut dyn InstalledRepository,
        locker: &'a mut dyn Locker,
        installation_manager: &'a mut dyn InstallationManager,
    ) -> Self {
        Self {
            io,
            manifest,
            repository,
            locker,
            installation_manager,
            plugin_name: PLUGIN_NAME.to_string(),
        }
    }

    /// Remove `name` instead of the default plugin package.
    #[must_use]
    pub fn with_plugin_name(mut self, name: impl Into<String>) -> Self {
        self.plugin_name = name.into();
        self
    }

    /// Run the removal.
    pub fn run(&mut self) -> Result<RemovalReport> {
        self.io.write(&format!("Removing {}...", self.plugin_name));

        let (uninstalled, lock_updated) = self.remove_plugin_install()?;
        let manifest_updated = self.remove_plugin_from_manifest()?;

        self.io.write(messages::COMPLETE);
        Ok(RemovalReport {
            uninstalled,
            lock_updated,
            manifest_updated,
        })
    }

    fn remove_plugin_install(&mut self) -> Result<(bool, bool)> {
        let Some(package) = self.repository.find_package(&self.plugin_name, "*")? else {
            self.io.write(messages::NOT_INSTALLED);
            return Ok((false, false));
        };

        self.installation_manager
            .uninstall(&mut *self.repository, &package)
            .with_context(|| format!("Failed to uninstall {}", self.plugin_name))?;
        self.io.write(&format!("    Removed plugin {}.", self.plugin_name));

        Ok((true, self.update_lock()))
    }

    fn update_lock(&mut self) -> bool {
        let remaining = self
            .repository
            .packages()
            .into_iter()
            .filter(|package| !package.name().eq_ignore_ascii_case(&self.plugin_name));
        let partitioned = PartitionedPackages::from_installed(remaining);
        tracing::debug!(
            packages = partitioned.packages.len(),
            dev_packages = partitioned.dev_packages.len(),
            aliases = partitioned.aliases.len(),
            "rewriting lock data"
        );

        let data = LockData::carry_over(partitioned, &*self.locker);
        match self.locker.set_lock_data(data) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Failed to write lock data: {e:#}");
                self.io.write(messages::LOCK_WRITE_FAILED);
                false
            }
        }
    }

    fn remove_plugin_from_manifest(&mut self) -> Result<bool> {
        self.io.write(messages::REMOVING_FROM_MANIFEST);

        let mut manifest = self.manifest.read()?;
        let removed = manifest.remove_requirement("require", &self.plugin_name);
        self.manifest.write(&manifest).context("Failed to remove the installer from the manifest")?;
        Ok(removed)
    }
}
