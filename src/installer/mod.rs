//! Host installer seams.
//!
//! The optional-package workflow never installs anything itself. It asks an
//! [`InstallerFactory`] for a fresh [`PackageInstaller`] bound to the updated
//! root package and a scoped event dispatcher, restricts it to the selected
//! packages, and runs it. Self-removal uses an [`InstallationManager`] to
//! uninstall a single package.
//!
//! Implementations:
//!
//! - [`CommandInstaller`] / [`CommandInstallerFactory`] - run the package
//!   manager's own update command as a child process
//! - [`FilesystemInstallationManager`] - remove a package's install directory

mod command;
mod filesystem;

pub use command::{BoundRequirement, CommandInstaller, CommandInstallerFactory};
pub use filesystem::FilesystemInstallationManager;

use crate::events::SharedDispatcher;
use crate::lockfile::{InstalledPackage, InstalledRepository};
use crate::package::link::RootPackage;
use anyhow::Result;

/// A configured, runnable install.
pub trait PackageInstaller {
    /// Install development requirements too.
    fn set_dev_mode(&mut self, dev_mode: bool);

    /// Resolve again instead of installing from the lock file.
    fn set_update(&mut self, update: bool);

    /// Restrict an update to these package names.
    fn set_update_allow_list(&mut self, packages: Vec<String>);

    /// Run the install. `0` means success.
    fn run(&mut self) -> Result<i32>;
}

/// Builds installers for a root package.
pub trait InstallerFactory {
    /// A fresh installer for `root_package` that reports events to `dispatcher`.
    fn create(
        &self,
        root_package: &RootPackage,
        dispatcher: SharedDispatcher,
    ) -> Result<Box<dyn PackageInstaller>>;
}

/// Performs install operations on individual packages.
pub trait InstallationManager {
    /// Uninstall `package` and remove it from `repository`.
    fn uninstall(
        &mut self,
        repository: &mut dyn InstalledRepository,
        package: &InstalledPackage,
    ) -> Result<()>;
}
