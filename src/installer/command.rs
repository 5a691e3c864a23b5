//! Installer backed by the package manager's command line.
//!
//! The package manager resolves against the manifest on disk, not against the
//! in-memory root package. Before the command runs, the root package's
//! requirements are written into the manifest so the resolver sees the
//! selected packages. When the command fails the manifest is put back exactly
//! as it was.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::{Context, Result};

use crate::constants::events::{POST_PACKAGE_INSTALL, POST_UPDATE_CMD};
use crate::core::{FileOperation, FileResultExt, SkeletonError};
use crate::events::{Event, SharedDispatcher};
use crate::manifest::{JsonManifestFile, ManifestStore};
use crate::package::link::{Link, LinkDescription, RootPackage};
use crate::utils::fs::atomic_write;

use super::{InstallerFactory, PackageInstaller};

/// A requirement the manifest must declare while the command runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundRequirement {
    /// `require` or `require-dev`
    pub section: &'static str,
    /// Package name
    pub name: String,
    /// Constraint as written
    pub constraint: String,
}

impl BoundRequirement {
    fn from_link(link: &Link) -> Self {
        let section = match link.description() {
            LinkDescription::Requires => "require",
            LinkDescription::RequiresForDevelopment => "require-dev",
        };
        Self {
            section,
            name: link.target().to_string(),
            constraint: link.pretty_constraint().to_string(),
        }
    }
}

/// Manifest content saved before requirements were bound into it.
struct ManifestBackup {
    path: PathBuf,
    original: Vec<u8>,
}

impl ManifestBackup {
    fn restore(self) -> Result<()> {
        tracing::debug!(path = %self.path.display(), "restoring manifest after failed install");
        atomic_write(&self.path, &self.original)
            .with_context(|| format!("Failed to restore manifest: {}", self.path.display()))
    }
}

/// Runs the configured install command, restricted to the allow-list.
///
/// The command line is `<program> <args...> <allow-list...> --dev|--no-dev`.
/// Outside update mode the allow-list is not passed. On success one
/// `post-package-install` event is dispatched per allow-listed package,
/// followed by `post-update-cmd`.
pub struct CommandInstaller {
    program: PathBuf,
    args: Vec<String>,
    working_dir: PathBuf,
    dispatcher: SharedDispatcher,
    dev_mode: bool,
    update: bool,
    allow_list: Vec<String>,
    manifest_path: Option<PathBuf>,
    requirements: Vec<BoundRequirement>,
}

impl CommandInstaller {
    /// Installer running `program` with `args` inside `working_dir`.
    pub fn new(
        program: impl Into<PathBuf>,
        args: Vec<String>,
        working_dir: impl Into<PathBuf>,
        dispatcher: SharedDispatcher,
    ) -> Self {
        Self {
            program: program.into(),
            args,
            working_dir: working_dir.into(),
            dispatcher,
            dev_mode: false,
            update: false,
            allow_list: Vec::new(),
            manifest_path: None,
            requirements: Vec::new(),
        }
    }

    /// Declare `requirements` in the manifest at `manifest_path` for the
    /// duration of the run.
    #[must_use]
    pub fn with_requirements(
        mut self,
        manifest_path: impl Into<PathBuf>,
        requirements: Vec<BoundRequirement>,
    ) -> Self {
        self.manifest_path = Some(manifest_path.into());
        self.requirements = requirements;
        self
    }

    /// Arguments passed to the program, in order.
    #[must_use]
    pub fn command_args(&self) -> Vec<String> {
        let mut args = self.args.clone();
        if self.update {
            args.extend(self.allow_list.iter().cloned());
        }
        args.push(if self.dev_mode { "--dev" } else { "--no-dev" }.to_string());
        args
    }

    fn announce_installed(&self) -> Result<()> {
        for package in &self.allow_list {
            let event = Event::new(POST_PACKAGE_INSTALL).with_package(package);
            let code = self.dispatcher.dispatch(&event)?;
            if code != 0 {
                tracing::warn!(event = %event, code, "event listener reported failure");
            }
        }

        let code = self.dispatcher.dispatch(&Event::new(POST_UPDATE_CMD))?;
        if code != 0 {
            tracing::warn!(event = POST_UPDATE_CMD, code, "event listener reported failure");
        }
        Ok(())
    }

    /// Write missing or changed requirements into the manifest. Returns the
    /// previous content when the file was changed.
    fn bind_requirements(&self) -> Result<Option<ManifestBackup>> {
        let Some(path) = &self.manifest_path else {
            return Ok(None);
        };
        if self.requirements.is_empty() {
            return Ok(None);
        }

        let store = JsonManifestFile::new(path);
        let mut manifest = store.read()?;
        let mut changed = false;
        for requirement in &self.requirements {
            let current = manifest.requirement(requirement.section, &requirement.name);
            if current != Some(requirement.constraint.as_str()) {
                manifest.set_requirement(requirement.section, &requirement.name, &requirement.constraint);
                changed = true;
            }
        }
        if !changed {
            return Ok(None);
        }

        let original = std::fs::read(path).with_file_context(
            FileOperation::Read,
            path,
            "saving manifest before install",
            "installer::command",
        )?;
        tracing::debug!(path = %path.display(), "binding requirements into manifest");
        store.write(&manifest)?;
        Ok(Some(ManifestBackup {
            path: path.clone(),
            original,
        }))
    }

    fn execute(&self, args: &[String], rendered: &str) -> Result<i32> {
        let status = Command::new(&self.program)
            .args(args)
            .current_dir(&self.working_dir)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|e| SkeletonError::InstallCommandFailed {
                command: rendered.to_string(),
                reason: e.to_string(),
            })?;

        // Killed by a signal: no exit code
        Ok(status.code().unwrap_or(1))
    }
}

impl PackageInstaller for CommandInstaller {
    fn set_dev_mode(&mut self, dev_mode: bool) {
        self.dev_mode = dev_mode;
    }

    fn set_update(&mut self, update: bool) {
        self.update = update;
    }

    fn set_update_allow_list(&mut self, packages: Vec<String>) {
        self.allow_list = packages;
    }

    fn run(&mut self) -> Result<i32> {
        let args = self.command_args();
        let rendered = format!("{} {}", self.program.display(), args.join(" "));
        tracing::debug!("Executing command: {rendered}");

        let backup = self.bind_requirements()?;
        let result = self.execute(&args, &rendered);
        let succeeded = matches!(result, Ok(0));
        if !succeeded {
            if let Some(backup) = backup {
                backup.restore()?;
            }
        }

        let code = result?;
        tracing::debug!(code, "install command finished");

        if succeeded {
            self.announce_installed()?;
        }
        Ok(code)
    }
}

/// Builds [`CommandInstaller`]s from a configured command line.
#[derive(Debug, Clone)]
pub struct CommandInstallerFactory {
    command: Vec<String>,
    working_dir: PathBuf,
    manifest_path: PathBuf,
}

impl CommandInstallerFactory {
    /// Factory running `command` (program followed by arguments) in
    /// `working_dir`, against the manifest at `manifest_path`.
    pub fn new(
        command: Vec<String>,
        working_dir: impl Into<PathBuf>,
        manifest_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            command,
            working_dir: working_dir.into(),
            manifest_path: manifest_path.into(),
        }
    }

    /// Working directory the command runs in.
    #[must_use]
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Manifest the requirements are bound into.
    #[must_use]
    pub fn manifest_path(&self) -> &Path {
        &self.manifest_path
    }
}

impl InstallerFactory for CommandInstallerFactory {
    fn create(
        &self,
        root_package: &RootPackage,
        dispatcher: SharedDispatcher,
    ) -> Result<Box<dyn PackageInstaller>> {
        let (program, args) = self.command.split_first().ok_or_else(|| SkeletonError::ConfigError {
            message: "install-command must name a program".to_string(),
        })?;

        let resolved = which::which(program).map_err(|_| SkeletonError::InstallCommandNotFound {
            program: program.clone(),
        })?;

        let requirements: Vec<BoundRequirement> = root_package
            .requires()
            .iter()
            .chain(root_package.dev_requires().iter())
            .map(|(_, link)| BoundRequirement::from_link(link))
            .collect();

        tracing::debug!(
            root = root_package.name(),
            requires = requirements.len(),
            program = %resolved.display(),
            "creating command installer"
        );

        Ok(Box::new(
            CommandInstaller::new(resolved, args.to_vec(), &self.working_dir, dispatcher)
                .with_requirements(&self.manifest_path, requirements),
        ))
    }
}
