//! Lifecycle integration.
//!
//! [`Plugin`] is what the host loads. It subscribes the optional-package
//! workflow to the host's `post-install-cmd` and `post-update-cmd` events
//! and exposes self-removal as an explicit [`Plugin::uninstall`] operation.
//!
//! The host's services live in a [`Host`]: the console, the manifest, the
//! root package, the installer factory, the lock state, the installation
//! manager and the event bus. The lock state is opened only when
//! [`Plugin::uninstall`] runs, after any optional install has rewritten it.
//!
//! ```rust,ignore
//! let plugin = Plugin::new(host, InstallerConfig::default());
//! plugin.activate();
//!
//! // The host finishes an install...
//! plugin.host().event_dispatcher.dispatch(&Event::new("post-install-cmd"))?;
//!
//! // ...and the project no longer needs the installer.
//! plugin.uninstall()?;
//! ```

use anyhow::{Context, Result, anyhow};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::config::InstallerConfig;
use crate::constants::{OPTIONAL_INSTALL_PRIORITY, events};
use crate::events::{Event, ListenerDispatcher, SharedDispatcher};
use crate::installer::{InstallationManager, InstallerFactory};
use crate::io::InteractivePrompt;
use crate::lockfile::{LockState, LockStateLoader};
use crate::manifest::ManifestStore;
use crate::optional::{OptionalInstallOutcome, OptionalPackagesInstaller};
use crate::package::link::RootPackage;
use crate::uninstaller::{RemovalReport, Uninstaller};

/// Plugin operations that can be bound to an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handler {
    /// Run [`Plugin::install_optional_dependencies`]
    InstallOptionalDependencies,
}

/// One event subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription {
    /// Event name
    pub event: &'static str,
    /// Operation to run
    pub handler: Handler,
    /// Listener priority; higher runs first
    pub priority: i32,
}

/// The events the plugin listens to.
#[must_use]
pub fn subscribed_events() -> [Subscription; 2] {
    [events::POST_INSTALL_CMD, events::POST_UPDATE_CMD].map(|event| Subscription {
        event,
        handler: Handler::InstallOptionalDependencies,
        priority: OPTIONAL_INSTALL_PRIORITY,
    })
}

/// Services provided by the host package manager.
pub struct Host {
    /// Console
    pub io: RefCell<Box<dyn InteractivePrompt>>,
    /// Project manifest
    pub manifest: Box<dyn ManifestStore>,
    /// The project's root package
    pub root_package: RefCell<RootPackage>,
    /// Builds restricted installers
    pub installer_factory: Box<dyn InstallerFactory>,
    /// Opens the installed repository and locker
    pub lock_state: Box<dyn LockStateLoader>,
    /// Uninstalls packages
    pub installation_manager: RefCell<Box<dyn InstallationManager>>,
    /// The host event bus
    pub event_dispatcher: Rc<ListenerDispatcher>,
}

/// The skeleton installer plugin.
pub struct Plugin {
    host: Host,
    config: InstallerConfig,
}

impl Plugin {
    /// Plugin bound to `host`.
    pub fn new(host: Host, config: InstallerConfig) -> Rc<Self> {
        Rc::new(Self {
            host,
            config,
        })
    }

    /// Register the plugin's subscriptions on the host event bus.
    ///
    /// Listeners hold a weak reference; dropping the plugin silences them.
    pub fn activate(self: &Rc<Self>) {
        for subscription in subscribed_events() {
            let plugin: Weak<Self> = Rc::downgrade(self);
            tracing::debug!(
                event = subscription.event,
                priority = subscription.priority,
                "subscribing to lifecycle event"
            );
            self.host.event_dispatcher.add_listener(
                subscription.event,
                subscription.priority,
                move |event: &Event| match plugin.upgrade() {
                    Some(plugin) => plugin.handle(subscription.handler, event),
                    None => Ok(0),
                },
            );
        }
    }

    /// Host services.
    #[must_use]
    pub fn host(&self) -> &Host {
        &self.host
    }

    /// Configuration.
    #[must_use]
    pub fn config(&self) -> &InstallerConfig {
        &self.config
    }

    /// Run `handler` in response to `event`.
    pub fn handle(&self, handler: Handler, event: &Event) -> Result<i32> {
        tracing::debug!(event = %event, ?handler, "handling lifecycle event");
        match handler {
            Handler::InstallOptionalDependencies => {
                self.install_optional_dependencies()?;
                Ok(0)
            }
        }
    }

    /// Prompt for and install optional packages.
    pub fn install_optional_dependencies(&self) -> Result<OptionalInstallOutcome> {
        let mut io = self
            .host
            .io
            .try_borrow_mut()
            .map_err(|_| anyhow!("The console is already in use by another operation"))?;
        let mut root_package = self
            .host
            .root_package
            .try_borrow_mut()
            .map_err(|_| anyhow!("Optional package installation is already running"))?;
        let upstream: SharedDispatcher = Rc::clone(&self.host.event_dispatcher) as SharedDispatcher;

        OptionalPackagesInstaller::new(
            &mut **io,
            &*self.host.manifest,
            &*self.host.installer_factory,
        )
        .with_upstream(upstream)
        .with_extension_keys(self.config.extension_keys())
        .with_broadcast_events(self.config.broadcast_events.clone())
        .run(&mut root_package)
        .context("Failed to install optional packages")
    }

    /// Remove the plugin package from the project.
    pub fn uninstall(&self) -> Result<RemovalReport> {
        let busy = |what: &str| anyhow!("The {what} is already in use by another operation");
        let mut io = self.host.io.try_borrow_mut().map_err(|_| busy("console"))?;
        let LockState {
            mut repository,
            mut locker,
        } = self.host.lock_state.load().context("Failed to read the lock file")?;
        let mut manager = self
            .host
            .installation_manager
            .try_borrow_mut()
            .map_err(|_| busy("installation manager"))?;

        Uninstaller::new(
            &mut **io,
            &*self.host.manifest,
            &mut *repository,
            &mut *locker,
            &mut **manager,
        )
        .with_plugin_name(self.config.plugin_name.clone())
        .run()
        .context("Failed to remove the skeleton installer")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventDispatcher;
    use crate::lockfile::{InstalledPackage, LockedPackage, LockedRepository};
    use std::cell::Cell;
    use crate::manifest::Manifest;
    use crate::test_utils::{
        MemoryManifestStore, RecordingInstallationManager, RecordingInstallerFactory, RecordingLocker,
        ScriptedIo,
    };
    use serde_json::json;

    fn installed(names: &[&str]) -> LockState {
        let packages = names
            .iter()
            .map(|name| InstalledPackage::Package {
                package: LockedPackage::new(*name, "1.0.0"),
                dev: false,
            })
            .collect();
        LockState {
            repository: Box::new(LockedRepository::new(packages)),
            locker: Box::new(RecordingLocker::new()),
        }
    }

    fn host(answers: &[&str], store: MemoryManifestStore, factory: RecordingInstallerFactory) -> Host {
        let manifest = store.current();
        Host {
            io: RefCell::new(Box::new(ScriptedIo::new(answers))),
            manifest: Box::new(store),
            root_package: RefCell::new(RootPackage::from_manifest(&manifest)),
            installer_factory: Box::new(factory),
            lock_state: Box::new(|| -> Result<LockState> { Ok(installed(&["laminas/laminas-skeleton-installer"])) }),
            installation_manager: RefCell::new(Box::new(RecordingInstallationManager::default())),
            event_dispatcher: Rc::new(ListenerDispatcher::new()),
        }
    }

    fn skeleton_store() -> MemoryManifestStore {
        MemoryManifestStore::new(
            Manifest::from_value(json!({
                "name": "acme/skeleton",
                "require": {"laminas/laminas-skeleton-installer": "^1.0"},
                "extra": {
                    "laminas-skeleton-installer": [
                        {"name": "vendor/db", "constraint": "^2.5", "prompt": "Database?"}
                    ]
                }
            }))
            .unwrap(),
        )
    }

    #[test]
    fn test_subscribed_events() {
        let subscriptions = subscribed_events();
        assert_eq!(
            subscriptions.iter().map(|subscription| subscription.event).collect::<Vec<_>>(),
            vec!["post-install-cmd", "post-update-cmd"]
        );
        assert!(subscriptions.iter().all(|subscription| {
            subscription.priority == 1000 && subscription.handler == Handler::InstallOptionalDependencies
        }));
    }

    #[test]
    fn test_activate_registers_subscriptions() {
        let plugin = Plugin::new(
            host(&[], skeleton_store(), RecordingInstallerFactory::new(0)),
            InstallerConfig::default(),
        );
        assert!(!plugin.host().event_dispatcher.has_listeners("post-install-cmd"));

        plugin.activate();
        let bus = &plugin.host().event_dispatcher;
        assert!(bus.has_listeners("post-install-cmd"));
        assert!(bus.has_listeners("post-update-cmd"));
        assert!(!bus.has_listeners("post-package-install"));
    }

    #[test]
    fn test_post_install_event_runs_optional_install() {
        let store = skeleton_store();
        let factory = RecordingInstallerFactory::new(0);
        let plugin = Plugin::new(host(&["n", "y"], store.clone(), factory.clone()), InstallerConfig::default());
        plugin.activate();

        let code = plugin.host().event_dispatcher.dispatch(&Event::new("post-install-cmd")).unwrap();

        assert_eq!(code, 0);
        assert_eq!(factory.created(), 1);
        assert_eq!(store.current().requirement("require", "vendor/db"), Some("^2.5"));
        assert!(plugin.host().root_package.borrow().requires().contains_key("vendor/db"));
    }

    #[test]
    fn test_unrelated_events_are_ignored() {
        let store = skeleton_store();
        let factory = RecordingInstallerFactory::new(0);
        let plugin = Plugin::new(host(&[], store.clone(), factory.clone()), InstallerConfig::default());
        plugin.activate();

        plugin.host().event_dispatcher.dispatch(&Event::new("pre-install-cmd")).unwrap();
        assert_eq!(factory.created(), 0);
        assert_eq!(store.writes(), 0);
    }

    #[test]
    fn test_dropped_plugin_stops_listening() {
        let store = skeleton_store();
        let factory = RecordingInstallerFactory::new(0);
        let plugin = Plugin::new(host(&["y"], store.clone(), factory), InstallerConfig::default());
        plugin.activate();

        let bus = Rc::clone(&plugin.host().event_dispatcher);
        drop(plugin);

        assert_eq!(bus.dispatch(&Event::new("post-update-cmd")).unwrap(), 0);
        assert_eq!(store.writes(), 0);
    }

    #[test]
    fn test_uninstall_uses_configured_plugin_name() {
        let store = skeleton_store();
        let plugin =
            Plugin::new(host(&[], store.clone(), RecordingInstallerFactory::new(0)), InstallerConfig::default());

        let report = plugin.uninstall().unwrap();
        assert!(report.uninstalled);
        assert!(report.lock_updated);
        assert_eq!(store.current().requirement("require", "laminas/laminas-skeleton-installer"), None);
    }

    #[test]
    fn test_uninstall_reads_lock_state_when_it_runs() {
        let store = skeleton_store();
        let loads = Rc::new(Cell::new(0));
        let mut host = host(&[], store, RecordingInstallerFactory::new(0));
        let counter = Rc::clone(&loads);
        host.lock_state = Box::new(move || -> Result<LockState> {
            counter.set(counter.get() + 1);
            Ok(installed(&["laminas/laminas-skeleton-installer", "vendor/db"]))
        });

        let plugin = Plugin::new(host, InstallerConfig::default());
        plugin.activate();
        assert_eq!(loads.get(), 0);

        let report = plugin.uninstall().unwrap();
        assert_eq!(loads.get(), 1);
        assert!(report.uninstalled);
    }
}
