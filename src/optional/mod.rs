//! Optional-package selection and installation.
//!
//! A project skeleton lists optional packages under its manifest's `extra`
//! section. [`OptionalPackagesInstaller`] turns that list into an interactive
//! choice and then into installed, declared requirements.
//!
//! # Workflow
//!
//! 1. **Discover** - read the specs from the root package's extension
//!    metadata (canonical key first, then legacy keys); no list means there
//!    is nothing to do
//! 2. **Validate** - drop specs missing `name`, `constraint` or `prompt`
//! 3. **Minimal install?** - answering yes strips the metadata and stops
//! 4. **Per-package prompts** - in declaration order, keeping accepted packages
//! 5. **Nothing selected** - strip the metadata and stop
//! 6. **Root package** - add a requirement link for every selected package
//! 7. **Restricted install** - a fresh installer, dev mode on, update mode on,
//!    allow-list set to exactly the selected names, reporting to a
//!    [`BroadcastEventDispatcher`]
//! 8. **Persist** - on success write every selected constraint into
//!    `require`/`require-dev` and strip the metadata; on failure leave the
//!    manifest untouched so the selection can be retried
//!
//! Every prompt is answered before the manifest is written, and the manifest
//! is read once and written once per run.
//!
//! # Answers
//!
//! Answers are case-folded and must be exactly `y` or `n`; anything else
//! prints `Invalid answer` and asks again. An empty answer takes the
//! question's default: yes for the minimal install, no for each package.

use anyhow::{Context, Result};
use std::rc::Rc;

use crate::collection::Collection;
use crate::constants::events::POST_PACKAGE_INSTALL;
use crate::constants::messages;
use crate::events::{BroadcastEventDispatcher, SharedDispatcher};
use crate::installer::InstallerFactory;
use crate::io::InteractivePrompt;
use crate::manifest::{ExtensionKeys, ManifestStore};
use crate::package::link::{Link, RootPackage};
use crate::package::{OptionalPackage, is_valid_spec};

/// How a run of [`OptionalPackagesInstaller`] ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionalInstallOutcome {
    /// No valid optional packages were declared; nothing was asked or written.
    NothingToDo,
    /// A minimal install was requested; the declarations were removed.
    MinimalInstall,
    /// Every package was declined; the declarations were removed.
    NoneSelected,
    /// The selected packages were installed and recorded.
    Installed(Vec<String>),
    /// The restricted install failed; the manifest was left untouched.
    InstallFailed {
        /// Installer result code
        code: i32,
        /// Packages that were selected
        packages: Vec<String>,
    },
}

/// Interactive optional-package installer.
pub struct OptionalPackagesInstaller<'a> {
    io: &'a mut dyn InteractivePrompt,
    manifest: &'a dyn ManifestStore,
    installer_factory: &'a dyn InstallerFactory,
    upstream: Option<SharedDispatcher>,
    extension_keys: ExtensionKeys,
    broadcast_events: Vec<String>,
}

impl<'a> OptionalPackagesInstaller<'a> {
    /// Workflow using the default extension keys and broadcasting only
    /// `post-package-install`, with no upstream dispatcher.
    pub fn new(
        io: &'a mut dyn InteractivePrompt,
        manifest: &'a dyn ManifestStore,
        installer_factory: &'a dyn InstallerFactory,
    ) -> Self {
        Self {
            io,
            manifest,
            installer_factory,
            upstream: None,
            extension_keys: ExtensionKeys::default(),
            broadcast_events: vec![POST_PACKAGE_INSTALL.to_string()],
        }
    }

    /// Forward broadcast events raised by the restricted install to `upstream`.
    #[must_use]
    pub fn with_upstream(mut self, upstream: SharedDispatcher) -> Self {
        self.upstream = Some(upstream);
        self
    }

    /// Read declarations from, and remove, these `extra` keys.
    #[must_use]
    pub fn with_extension_keys(mut self, keys: ExtensionKeys) -> Self {
        self.extension_keys = keys;
        self
    }

    /// Event names forwarded upstream during the restricted install.
    #[must_use]
    pub fn with_broadcast_events(mut self, events: Vec<String>) -> Self {
        self.broadcast_events = events;
        self
    }

    /// Run the workflow against `root_package`.
    ///
    /// The root package's requirement set is updated in place before the
    /// restricted install runs.
    pub fn run(&mut self, root_package: &mut RootPackage) -> Result<OptionalInstallOutcome> {
        let specs = self.optional_package_specs(root_package)?;
        if specs.is_empty() {
            tracing::debug!("no optional packages declared");
            return Ok(OptionalInstallOutcome::NothingToDo);
        }

        if self.request_minimal_install()? {
            self.remove_optional_packages()?;
            return Ok(OptionalInstallOutcome::MinimalInstall);
        }

        let selected = specs
            .try_map(OptionalPackage::from_spec)?
            .try_filter(|package| self.prompt_for_package(package))?;

        if selected.is_empty() {
            self.io.write(messages::NO_PACKAGES_SELECTED);
            self.remove_optional_packages()?;
            return Ok(OptionalInstallOutcome::NoneSelected);
        }

        self.update_root_package(root_package, &selected)?;

        let names = selected.map(|package| package.name().to_string()).into_values();
        let code = self.run_installer(root_package, names.clone())?;
        if code != 0 {
            tracing::warn!(code, "restricted install failed");
            self.io.write(messages::INSTALL_FAILED);
            return Ok(OptionalInstallOutcome::InstallFailed {
                code,
                packages: names,
            });
        }

        self.update_manifest(&selected)?;
        Ok(OptionalInstallOutcome::Installed(names))
    }

    fn optional_package_specs(
        &self,
        root_package: &RootPackage,
    ) -> Result<Collection<serde_json::Value>> {
        let Some(specs) = self.extension_keys.find_specs(root_package.extra()) else {
            return Ok(Collection::new());
        };

        let declared = Collection::from_iter(specs.iter().cloned());
        let valid = declared.filter(is_valid_spec);
        if valid.len() != declared.len() {
            tracing::debug!(dropped = declared.len() - valid.len(), "ignoring invalid optional package specs");
        }
        tracing::debug!(count = valid.len(), "discovered optional packages");
        Ok(valid)
    }

    fn request_minimal_install(&mut self) -> Result<bool> {
        let question =
            format!("{} {}", messages::MINIMAL_INSTALL_QUESTION, messages::MINIMAL_INSTALL_HINT);
        self.ask_yes_no(&question, "y")
    }

    fn prompt_for_package(&mut self, package: &OptionalPackage) -> Result<bool> {
        let question = format!("    {} {}", package.prompt(), messages::PACKAGE_HINT);
        if !self.ask_yes_no(&question, "n")? {
            return Ok(false);
        }

        self.io.write(&format!("    Will install {} ({})", package.name(), package.constraint()));
        if package.is_module() {
            self.io.write(if package.is_dev() {
                messages::MODULE_HINT_REQUIRE_DEV
            } else {
                messages::MODULE_HINT_REQUIRE
            });
        }
        Ok(true)
    }

    fn ask_yes_no(&mut self, question: &str, default: &str) -> Result<bool> {
        loop {
            let answer = self.io.ask(question, default)?.to_lowercase();
            match answer.as_str() {
                "y" => return Ok(true),
                "n" => return Ok(false),
                other => {
                    tracing::debug!(answer = other, "unrecognized answer");
                    self.io.write(messages::INVALID_ANSWER);
                }
            }
        }
    }

    fn remove_optional_packages(&mut self) -> Result<()> {
        self.io.write(messages::REMOVING_OPTIONAL_PACKAGES);
        self.update_manifest(&Collection::new())
    }

    fn update_manifest(&mut self, packages: &Collection<OptionalPackage>) -> Result<()> {
        self.io.write(messages::UPDATING_MANIFEST);

        let mut manifest = packages.reduce(self.manifest.read()?, |mut manifest, package| {
            manifest.set_requirement(package.require_section(), package.name(), package.constraint());
            manifest
        });
        manifest.remove_extension_metadata(&self.extension_keys);

        self.manifest.write(&manifest).context("Failed to record optional packages in the manifest")
    }

    fn update_root_package(
        &mut self,
        root_package: &mut RootPackage,
        packages: &Collection<OptionalPackage>,
    ) -> Result<()> {
        self.io.write(messages::UPDATING_ROOT_PACKAGE);

        let requires = packages.try_reduce(root_package.requires().clone(), |mut requires, package| {
            requires.set(package.name(), Link::for_optional_package(package)?);
            Ok::<_, anyhow::Error>(requires)
        })?;
        root_package.set_requires(requires);
        Ok(())
    }

    fn run_installer(&mut self, root_package: &RootPackage, packages: Vec<String>) -> Result<i32> {
        self.io.write(messages::RUNNING_UPDATE);

        let dispatcher =
            BroadcastEventDispatcher::new(self.upstream.clone(), self.broadcast_events.clone());
        let mut installer = self.installer_factory.create(root_package, Rc::new(dispatcher))?;

        installer.set_dev_mode(true);
        installer.set_update(true);
        tracing::debug!(packages = ?packages, "restricting update to selected packages");
        installer.set_update_allow_list(packages);

        installer.run()
    }
}
