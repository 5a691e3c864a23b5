//! Skeleton Installer
//!
//! Optional-package selection for freshly scaffolded projects. A project
//! skeleton declares a list of optional packages in its manifest's `extra`
//! section; after the first install or update this crate asks the user which
//! of them they want, installs only those, records them in the manifest, and
//! finally removes itself from the project.
//!
//! # Architecture Overview
//!
//! The crate does not resolve or download anything on its own. Every host
//! capability it needs is a narrow trait, injected by the caller:
//!
//! - [`io::InteractivePrompt`] - ask a question, write a line
//! - [`manifest::ManifestStore`] - read and write the project manifest
//! - [`installer::InstallerFactory`] / [`installer::PackageInstaller`] - run a restricted install
//! - [`lockfile::Locker`] / [`lockfile::InstalledRepository`] - lock state and installed packages
//! - [`installer::InstallationManager`] - uninstall a single package
//! - [`events::EventDispatcher`] - the host event bus
//!
//! The two workflows built on top of these are
//! [`optional::OptionalPackagesInstaller`] and [`uninstaller::Uninstaller`];
//! [`plugin::Plugin`] wires them to the host lifecycle events.
//!
//! # Manifest Format
//!
//! ```json
//! {
//!     "name": "acme/skeleton",
//!     "require": {
//!         "laminas/laminas-skeleton-installer": "^1.0"
//!     },
//!     "extra": {
//!         "laminas-skeleton-installer": [
//!             {
//!                 "name": "laminas/laminas-db",
//!                 "constraint": "^2.5",
//!                 "prompt": "Would you like to install the database adapter?",
//!                 "module": true
//!             }
//!         ]
//!     }
//! }
//! ```
//!
//! # Command-Line Usage
//!
//! ```bash
//! # Prompt for optional packages and install the chosen ones
//! skeleton-installer optional
//!
//! # Remove the installer from the project
//! skeleton-installer remove-self
//!
//! # Both, in create-project order
//! skeleton-installer run
//! ```

// Core functionality modules
pub mod cli;
pub mod collection;
pub mod config;
pub mod constants;
pub mod core;

// Host seams
pub mod events;
pub mod installer;
pub mod io;
pub mod lockfile;
pub mod manifest;

// Workflows
pub mod optional;
pub mod package;
pub mod plugin;
pub mod uninstaller;

// Supporting modules
pub mod utils;
pub mod version;

// test_utils module is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
