//! Test utilities for the skeleton installer
//!
//! In-memory and recording implementations of the host seams, so workflows
//! can be exercised without a terminal, a package manager or a project on
//! disk:
//!
//! - [`ScriptedIo`] - answers questions from a fixed script and records output
//! - [`MemoryManifestStore`] - manifest kept in memory, with a write counter
//! - [`RecordingInstallerFactory`] - installers that record how they were run
//! - [`RecordingLocker`] - lock settings in memory, with the last written data
//! - [`RecordingInstallationManager`] - records uninstalled packages
//!
//! Stores and factories share their state between clones, so a test can keep
//! a handle while the workflow owns another.
//!
//! # Example
//!
//! ```rust,ignore
//! use skeleton_installer::test_utils::{MemoryManifestStore, ScriptedIo};
//! use skeleton_installer::manifest::Manifest;
//!
//! let io = ScriptedIo::new(&["n", "y"]);
//! let store = MemoryManifestStore::new(Manifest::new());
//! assert_eq!(store.writes(), 0);
//! ```

use anyhow::{Result, bail};
use serde_json::{Map, Value};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::constants::events::{POST_PACKAGE_INSTALL, POST_UPDATE_CMD};
use crate::events::{Event, EventDispatcher, SharedDispatcher};
use crate::installer::{InstallationManager, InstallerFactory, PackageInstaller};
use crate::io::InteractivePrompt;
use crate::lockfile::{
    DEFAULT_MINIMUM_STABILITY, InstalledPackage, InstalledRepository, LockData, Locker,
};
use crate::manifest::{Manifest, ManifestStore};
use crate::package::link::RootPackage;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has an effect. With `level` unset, logging is enabled
/// only when `RUST_LOG` is set.
///
/// ```bash
/// RUST_LOG=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_ansi(true)
            .try_init();
    });
}

/// Console answering from a script.
///
/// Once the script runs out every question is an error, so a workflow that
/// keeps re-prompting fails the test instead of hanging.
#[derive(Debug, Default)]
pub struct ScriptedIo {
    answers: VecDeque<String>,
    questions: Vec<String>,
    output: Vec<String>,
}

impl ScriptedIo {
    /// Console that gives `answers` in order.
    pub fn new(answers: &[&str]) -> Self {
        Self {
            answers: answers.iter().map(|answer| (*answer).to_string()).collect(),
            ..Self::default()
        }
    }

    /// Questions asked so far.
    pub fn questions(&self) -> Vec<String> {
        self.questions.clone()
    }

    /// Lines written so far.
    pub fn output(&self) -> Vec<String> {
        self.output.clone()
    }
}

impl InteractivePrompt for ScriptedIo {
    fn ask(&mut self, question: &str, default: &str) -> Result<String> {
        self.questions.push(question.to_string());
        let Some(answer) = self.answers.pop_front() else {
            bail!("No scripted answer left for question: {question}");
        };
        Ok(if answer.is_empty() { default.to_string() } else { answer })
    }

    fn write(&mut self, message: &str) {
        self.output.push(message.to_string());
    }
}

/// Manifest kept in memory.
#[derive(Debug, Clone)]
pub struct MemoryManifestStore {
    manifest: Rc<RefCell<Manifest>>,
    writes: Rc<Cell<usize>>,
}

impl MemoryManifestStore {
    /// Store holding `manifest`.
    pub fn new(manifest: Manifest) -> Self {
        Self {
            manifest: Rc::new(RefCell::new(manifest)),
            writes: Rc::new(Cell::new(0)),
        }
    }

    /// The stored manifest.
    pub fn current(&self) -> Manifest {
        self.manifest.borrow().clone()
    }

    /// Number of writes so far.
    pub fn writes(&self) -> usize {
        self.writes.get()
    }
}

impl ManifestStore for MemoryManifestStore {
    fn read(&self) -> Result<Manifest> {
        Ok(self.current())
    }

    fn write(&self, manifest: &Manifest) -> Result<()> {
        *self.manifest.borrow_mut() = manifest.clone();
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }
}

/// How a recorded installer was configured when it ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRun {
    /// Dev mode
    pub dev_mode: bool,
    /// Update mode
    pub update: bool,
    /// Packages allowed to change
    pub allow_list: Vec<String>,
    /// Root package requirement names at creation time
    pub requires: Vec<String>,
}

#[derive(Debug, Default)]
struct FactoryState {
    created: usize,
    runs: Vec<RecordedRun>,
}

/// Factory for installers that record their runs and return a fixed code.
#[derive(Debug, Clone)]
pub struct RecordingInstallerFactory {
    result_code: i32,
    announce_events: bool,
    state: Rc<RefCell<FactoryState>>,
}

impl RecordingInstallerFactory {
    /// Factory whose installers return `result_code`.
    pub fn new(result_code: i32) -> Self {
        Self {
            result_code,
            announce_events: false,
            state: Rc::new(RefCell::new(FactoryState::default())),
        }
    }

    /// Dispatch `post-package-install` per package and `post-update-cmd`
    /// after a successful run.
    pub fn announce_events(&mut self, announce: bool) {
        self.announce_events = announce;
    }

    /// Number of installers created.
    pub fn created(&self) -> usize {
        self.state.borrow().created
    }

    /// The most recent run.
    pub fn last_run(&self) -> Option<RecordedRun> {
        self.state.borrow().runs.last().cloned()
    }
}

impl InstallerFactory for RecordingInstallerFactory {
    fn create(
        &self,
        root_package: &RootPackage,
        dispatcher: SharedDispatcher,
    ) -> Result<Box<dyn PackageInstaller>> {
        self.state.borrow_mut().created += 1;
        Ok(Box::new(RecordingInstaller {
            result_code: self.result_code,
            announce_events: self.announce_events,
            dispatcher,
            state: Rc::clone(&self.state),
            run: RecordedRun {
                dev_mode: false,
                update: false,
                allow_list: Vec::new(),
                requires: root_package
                    .requires()
                    .iter()
                    .map(|(_, link)| link.target().to_string())
                    .collect(),
            },
        }))
    }
}

struct RecordingInstaller {
    result_code: i32,
    announce_events: bool,
    dispatcher: SharedDispatcher,
    state: Rc<RefCell<FactoryState>>,
    run: RecordedRun,
}

impl PackageInstaller for RecordingInstaller {
    fn set_dev_mode(&mut self, dev_mode: bool) {
        self.run.dev_mode = dev_mode;
    }

    fn set_update(&mut self, update: bool) {
        self.run.update = update;
    }

    fn set_update_allow_list(&mut self, packages: Vec<String>) {
        self.run.allow_list = packages;
    }

    fn run(&mut self) -> Result<i32> {
        self.state.borrow_mut().runs.push(self.run.clone());
        if self.result_code == 0 && self.announce_events {
            for package in &self.run.allow_list {
                self.dispatcher.dispatch(&Event::new(POST_PACKAGE_INSTALL).with_package(package))?;
            }
            self.dispatcher.dispatch(&Event::new(POST_UPDATE_CMD))?;
        }
        Ok(self.result_code)
    }
}

/// Lock settings in memory.
#[derive(Debug, Clone)]
pub struct RecordingLocker {
    minimum_stability: String,
    prefer_stable: bool,
    platform: Map<String, Value>,
    failing: bool,
    written: Option<LockData>,
}

impl Default for RecordingLocker {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingLocker {
    /// Locker with default settings.
    pub fn new() -> Self {
        Self {
            minimum_stability: DEFAULT_MINIMUM_STABILITY.to_string(),
            prefer_stable: false,
            platform: Map::new(),
            failing: false,
            written: None,
        }
    }

    /// Set `minimum-stability`.
    #[must_use]
    pub fn with_minimum_stability(mut self, stability: &str) -> Self {
        self.minimum_stability = stability.to_string();
        self
    }

    /// Set `prefer-stable`.
    #[must_use]
    pub fn with_prefer_stable(mut self, prefer_stable: bool) -> Self {
        self.prefer_stable = prefer_stable;
        self
    }

    /// Add a platform requirement.
    #[must_use]
    pub fn with_platform(mut self, name: &str, constraint: &str) -> Self {
        self.platform.insert(name.to_string(), Value::String(constraint.to_string()));
        self
    }

    /// Make every write fail.
    #[must_use]
    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    /// The last lock data written.
    pub fn last_written(&self) -> Option<LockData> {
        self.written.clone()
    }
}

impl Locker for RecordingLocker {
    fn platform_requirements(&self, dev: bool) -> Map<String, Value> {
        if dev { Map::new() } else { self.platform.clone() }
    }

    fn minimum_stability(&self) -> String {
        self.minimum_stability.clone()
    }

    fn stability_flags(&self) -> Map<String, Value> {
        Map::new()
    }

    fn prefer_stable(&self) -> bool {
        self.prefer_stable
    }

    fn prefer_lowest(&self) -> bool {
        false
    }

    fn platform_overrides(&self) -> Map<String, Value> {
        Map::new()
    }

    fn set_lock_data(&mut self, data: LockData) -> Result<()> {
        if self.failing {
            bail!("Lock file is read-only");
        }
        self.written = Some(data);
        Ok(())
    }
}

/// Installation manager that only records what it uninstalled.
#[derive(Debug, Default)]
pub struct RecordingInstallationManager {
    uninstalled: Vec<String>,
}

impl RecordingInstallationManager {
    /// Names of uninstalled packages, in order.
    pub fn uninstalled(&self) -> Vec<String> {
        self.uninstalled.clone()
    }
}

impl InstallationManager for RecordingInstallationManager {
    fn uninstall(
        &mut self,
        repository: &mut dyn InstalledRepository,
        package: &InstalledPackage,
    ) -> Result<()> {
        self.uninstalled.push(package.name().to_string());
        repository.remove_package(package.name());
        Ok(())
    }
}
