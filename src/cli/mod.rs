//! Command-line interface for the skeleton installer.
//!
//! The CLI stands in for the host package manager: it builds a [`Host`] over
//! the project directory and drives the [`Plugin`] the way the host would.
//!
//! # Commands
//!
//! - `optional` - Prompt for optional packages and install the selected ones
//! - `remove-self` - Remove the installer package from the project
//! - `run` - Announce `post-install-cmd` to the plugin, then remove it
//!
//! # Global Options
//!
//! - `--verbose` - Enable debug logging
//! - `--quiet` - Disable logging
//! - `--config <path>` - Installer configuration file
//! - `--project-dir <path>` - Project directory (defaults to the current directory)
//!
//! # Examples
//!
//! ```bash
//! # After `composer create-project --no-scripts`
//! skeleton-installer run
//!
//! # Only the prompt
//! skeleton-installer --project-dir my-app optional
//!
//! # Debug a custom configuration
//! skeleton-installer --verbose --config ./installer.toml remove-self
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing_subscriber::EnvFilter;

use crate::config::InstallerConfig;
use crate::constants::events::POST_INSTALL_CMD;
use crate::events::{Event, EventDispatcher, ListenerDispatcher};
use crate::installer::{CommandInstallerFactory, FilesystemInstallationManager};
use crate::io::ConsoleIo;
use crate::lockfile::FileLockState;
use crate::manifest::{JsonManifestFile, ManifestStore};
use crate::optional::OptionalInstallOutcome;
use crate::package::link::RootPackage;
use crate::plugin::{Host, Plugin};

/// Settings derived from the global flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliConfig {
    /// Log filter; `None` disables logging.
    pub log_level: Option<String>,

    /// Installer configuration file given with `--config`.
    pub config_path: Option<String>,

    /// Project directory.
    pub project_dir: PathBuf,
}

/// Skeleton installer command line.
#[derive(Parser, Debug)]
#[command(
    name = "skeleton-installer",
    about = "Prompt for and install a project skeleton's optional packages",
    version,
    author,
    long_about = "Reads the optional packages a project skeleton declares in its manifest, installs the ones you pick, and removes the installer from the project afterwards."
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Disable logging; only prompts and results are printed.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to the installer configuration file.
    ///
    /// Overrides `$SKELETON_INSTALLER_CONFIG` and the default location.
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Project directory containing the manifest.
    #[arg(long, global = true, default_value = ".")]
    project_dir: PathBuf,
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Prompt for optional packages and install the selected ones
    Optional,

    /// Remove the installer package from the project
    RemoveSelf,

    /// Run the optional-package prompt as after an install, then remove the installer
    Run,
}

impl Cli {
    /// Execute the parsed command line.
    pub fn execute(self) -> Result<()> {
        let config = self.build_config();
        self.execute_with_config(config)
    }

    /// Settings derived from the global flags.
    ///
    /// `--verbose` maps to `debug`, `--quiet` disables logging and the default
    /// follows `RUST_LOG`, falling back to `warn`.
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            Some("debug".to_string())
        } else if self.quiet {
            None
        } else {
            Some(std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".to_string()))
        };

        CliConfig {
            log_level,
            config_path: self.config.clone(),
            project_dir: self.project_dir.clone(),
        }
    }

    /// Execute with explicit settings.
    pub fn execute_with_config(self, config: CliConfig) -> Result<()> {
        init_logging(config.log_level.as_deref());

        let installer_config = InstallerConfig::load(config.config_path.as_deref())?;
        let plugin = Plugin::new(build_host(&config.project_dir, &installer_config)?, installer_config);

        match self.command {
            Commands::Optional => {
                report_outcome(&plugin.install_optional_dependencies()?);
            }
            Commands::RemoveSelf => {
                plugin.uninstall()?;
            }
            Commands::Run => {
                plugin.activate();
                let code = plugin.host().event_dispatcher.dispatch(&Event::new(POST_INSTALL_CMD))?;
                if code != 0 {
                    tracing::warn!(code, "a {POST_INSTALL_CMD} listener reported failure");
                }
                plugin.uninstall()?;
            }
        }
        Ok(())
    }
}

fn init_logging(level: Option<&str>) {
    let Some(level) = level else {
        return;
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(level))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Host services over the project in `project_dir`.
pub fn build_host(project_dir: &Path, config: &InstallerConfig) -> Result<Host> {
    let manifest = JsonManifestFile::new(config.manifest_path(project_dir));
    let manifest_path = manifest.path().to_path_buf();
    let root_package = RootPackage::from_manifest(
        &manifest
            .read()
            .with_context(|| format!("Failed to load the root package from {}", manifest_path.display()))?,
    );

    Ok(Host {
        io: RefCell::new(Box::new(ConsoleIo::stdio())),
        manifest: Box::new(manifest),
        root_package: RefCell::new(root_package),
        installer_factory: Box::new(CommandInstallerFactory::new(
            config.install_command.clone(),
            project_dir,
            manifest_path,
        )),
        lock_state: Box::new(FileLockState::new(config.lock_path(project_dir))),
        installation_manager: RefCell::new(Box::new(FilesystemInstallationManager::new(
            config.vendor_path(project_dir),
        ))),
        event_dispatcher: Rc::new(ListenerDispatcher::new()),
    })
}

fn report_outcome(outcome: &OptionalInstallOutcome) {
    match outcome {
        OptionalInstallOutcome::NothingToDo => tracing::info!("no optional packages declared"),
        OptionalInstallOutcome::MinimalInstall => tracing::info!("minimal install selected"),
        OptionalInstallOutcome::NoneSelected => tracing::info!("no optional packages selected"),
        OptionalInstallOutcome::Installed(packages) => {
            tracing::info!(packages = %packages.join(", "), "optional packages installed");
        }
        OptionalInstallOutcome::InstallFailed {
            code,
            packages,
        } => {
            tracing::warn!(code, packages = %packages.join(", "), "optional package install failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lockfile::{InstalledRepository, LockStateLoader};
    use clap::CommandFactory;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_build_config() {
        let cli = Cli::parse_from(["skeleton-installer", "--verbose", "optional"]);
        assert_eq!(cli.build_config().log_level, Some("debug".to_string()));
        assert_eq!(cli.command, Commands::Optional);

        let cli = Cli::parse_from([
            "skeleton-installer",
            "remove-self",
            "--quiet",
            "--config",
            "installer.toml",
            "--project-dir",
            "app",
        ]);
        let config = cli.build_config();
        assert_eq!(config.log_level, None);
        assert_eq!(config.config_path, Some("installer.toml".to_string()));
        assert_eq!(config.project_dir, PathBuf::from("app"));
        assert_eq!(cli.command, Commands::RemoveSelf);
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        assert!(Cli::try_parse_from(["skeleton-installer", "-v", "-q", "run"]).is_err());
    }

    #[test]
    fn test_build_host_defers_lock_file() {
        let temp = tempdir().unwrap();
        std::fs::write(temp.path().join("composer.json"), json!({"name": "acme/app"}).to_string()).unwrap();
        let config = InstallerConfig {
            manifest_file: Some("composer.json".to_string()),
            ..InstallerConfig::default()
        };

        let host = build_host(temp.path(), &config).unwrap();
        std::fs::write(
            temp.path().join("composer.lock"),
            json!({"packages": [{"name": "vendor/newly", "version": "1.0.0"}]}).to_string(),
        )
        .unwrap();

        let state = host.lock_state.load().unwrap();
        assert!(state.repository.find_package("vendor/newly", "*").unwrap().is_some());
    }

    #[test]
    fn test_build_host_without_manifest_fails() {
        let temp = tempdir().unwrap();
        let config = InstallerConfig {
            manifest_file: Some("composer.json".to_string()),
            ..InstallerConfig::default()
        };
        assert!(build_host(temp.path(), &config).is_err());
    }

    #[test]
    fn test_build_host_reads_project() {
        let temp = tempdir().unwrap();
        std::fs::write(
            temp.path().join("composer.json"),
            json!({"name": "acme/app", "require": {"php": "^8.1"}}).to_string(),
        )
        .unwrap();
        let config = InstallerConfig {
            manifest_file: Some("composer.json".to_string()),
            ..InstallerConfig::default()
        };

        let host = build_host(temp.path(), &config).unwrap();
        assert_eq!(host.root_package.borrow().name(), "acme/app");
        assert!(host.lock_state.load().unwrap().repository.packages().is_empty());
    }
}
