//! Global constants used throughout the skeleton installer.
//!
//! Event names, manifest keys and the console messages the workflows emit.
//! Defining them centrally keeps the workflows and their tests in agreement.

/// Canonical `extra` key holding the optional-package declarations.
pub const EXTENSION_KEY: &str = "laminas-skeleton-installer";

/// Legacy `extra` key, read when the canonical key is absent.
pub const LEGACY_EXTENSION_KEY: &str = "zend-skeleton-installer";

/// Package name of the installer itself, removed by self-removal.
pub const PLUGIN_NAME: &str = "laminas/laminas-skeleton-installer";

/// Source marker used for requirement links owned by the root package.
pub const ROOT_PACKAGE_SOURCE: &str = "__root__";

/// Default manifest file name.
pub const MANIFEST_FILE: &str = "composer.json";

/// Default lock file name.
pub const LOCK_FILE: &str = "composer.lock";

/// Default directory installed packages live in.
pub const VENDOR_DIR: &str = "vendor";

/// Environment variable overriding the manifest file name.
pub const MANIFEST_ENV_VAR: &str = "COMPOSER";

/// Environment variable pointing at an installer configuration file.
pub const CONFIG_ENV_VAR: &str = "SKELETON_INSTALLER_CONFIG";

/// Priority the optional-install handler is registered with.
pub const OPTIONAL_INSTALL_PRIORITY: i32 = 1000;

/// Lifecycle and package event names.
pub mod events {
    /// Fired after `install` finishes.
    pub const POST_INSTALL_CMD: &str = "post-install-cmd";
    /// Fired after `update` finishes.
    pub const POST_UPDATE_CMD: &str = "post-update-cmd";
    /// Fired once for every package the installer puts in place.
    pub const POST_PACKAGE_INSTALL: &str = "post-package-install";
}

/// Console messages.
pub mod messages {
    /// Minimal-install question text.
    pub const MINIMAL_INSTALL_QUESTION: &str =
        "Do you want a minimal install (no optional packages)?";
    /// Answer hint for the minimal-install question (default yes).
    pub const MINIMAL_INSTALL_HINT: &str = "Y/n";
    /// Answer hint for package questions (default no).
    pub const PACKAGE_HINT: &str = "y/N";
    /// Emitted when an answer is neither `y` nor `n`.
    pub const INVALID_ANSWER: &str = "Invalid answer";
    /// Emitted before optional-package metadata is dropped.
    pub const REMOVING_OPTIONAL_PACKAGES: &str =
        "    Removing optional packages from composer.json";
    /// Emitted before every manifest rewrite by the optional workflow.
    pub const UPDATING_MANIFEST: &str = "    Updating composer.json";
    /// Emitted when every package question was declined.
    pub const NO_PACKAGES_SELECTED: &str = "    No optional packages selected to install";
    /// Emitted before requirement links are added to the root package.
    pub const UPDATING_ROOT_PACKAGE: &str = "Updating root package";
    /// Emitted before the restricted install runs.
    pub const RUNNING_UPDATE: &str = "    Running an update to install optional packages";
    /// Emitted when the restricted install reports failure.
    pub const INSTALL_FAILED: &str =
        "Error installing optional packages. Run with verbosity to debug";
    /// Module wiring hint for runtime packages.
    pub const MODULE_HINT_REQUIRE: &str = "    When prompted to install as a module, select application.config.php or modules.config.php";
    /// Module wiring hint for development packages.
    pub const MODULE_HINT_REQUIRE_DEV: &str =
        "    When prompted to install as a module, select development.config.php.dist";
    /// Self-removal: package absent from the local repository.
    pub const NOT_INSTALLED: &str = "    Package not installed; nothing to do.";
    /// Self-removal: manifest edit starting.
    pub const REMOVING_FROM_MANIFEST: &str = "    Removing from composer.json";
    /// Self-removal: finished.
    pub const COMPLETE: &str = "    Complete!";
    /// Self-removal: lock data could not be written.
    pub const LOCK_WRITE_FAILED: &str = "Unable to update the lock file after removing the plugin";
}
