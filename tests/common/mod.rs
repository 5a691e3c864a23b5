//! Common test utilities for skeleton installer integration tests
//!
//! [`TestProject`] lays out a project directory (manifest, lock file, vendor
//! directory, installer configuration) and runs the binary against it with
//! the user's configuration and environment isolated.

// Not every helper is used by every test file
#![allow(dead_code)]

use assert_cmd::Command;
use serde_json::{Value, json};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const PLUGIN: &str = "laminas/laminas-skeleton-installer";

/// A temporary project directory.
pub struct TestProject {
    temp: TempDir,
}

impl TestProject {
    /// Empty project.
    pub fn new() -> Self {
        Self {
            temp: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    /// Project with `manifest` as its `composer.json`.
    pub fn with_manifest(manifest: Value) -> Self {
        let project = Self::new();
        project.write_json("composer.json", &manifest);
        project
    }

    /// Project directory.
    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    /// Absolute path of `relative` inside the project.
    pub fn file(&self, relative: &str) -> PathBuf {
        self.path().join(relative)
    }

    /// Write `value` as pretty JSON.
    pub fn write_json(&self, relative: &str, value: &Value) {
        let path = self.file(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        fs::write(&path, serde_json::to_string_pretty(value).unwrap()).expect("Failed to write JSON");
    }

    /// Parse a JSON file.
    pub fn read_json(&self, relative: &str) -> Value {
        let content = fs::read_to_string(self.file(relative)).expect("Failed to read JSON file");
        serde_json::from_str(&content).expect("Invalid JSON")
    }

    /// Write the installer configuration and return its path.
    pub fn write_config(&self, content: &str) -> PathBuf {
        let path = self.file("installer.toml");
        fs::write(&path, content).expect("Failed to write config");
        path
    }

    /// Create `vendor/<name>` with a placeholder file.
    pub fn install_vendor_package(&self, name: &str) {
        let dir = self.file("vendor").join(name);
        fs::create_dir_all(&dir).expect("Failed to create vendor package");
        fs::write(dir.join("composer.json"), json!({"name": name}).to_string()).unwrap();
    }

    /// The binary, running in the project with an isolated environment.
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("skeleton-installer").unwrap();
        cmd.current_dir(self.path())
            .env_remove("SKELETON_INSTALLER_CONFIG")
            .env_remove("COMPOSER")
            .env_remove("RUST_LOG")
            .env("HOME", self.path())
            .env("XDG_CONFIG_HOME", self.path().join(".config"));
        cmd
    }
}

/// Skeleton manifest requiring the installer and declaring `specs`.
pub fn skeleton_manifest(specs: Value) -> Value {
    json!({
        "name": "acme/skeleton",
        "type": "project",
        "require": {
            "php": "^8.1",
            PLUGIN: "^1.0"
        },
        "extra": {
            "laminas-skeleton-installer": specs
        }
    })
}

/// One runtime optional package declaration.
pub fn db_spec() -> Value {
    json!({
        "name": "vendor/db",
        "constraint": "^2.5",
        "prompt": "Would you like to install the database adapter?",
        "module": true
    })
}

/// Lock file with the installer, one runtime package and one dev package.
pub fn lock_with_plugin() -> Value {
    json!({
        "_readme": ["This file locks the dependencies of your project to a known state"],
        "content-hash": "0123456789abcdef",
        "packages": [
            {"name": PLUGIN, "version": "1.3.0", "type": "composer-plugin"},
            {"name": "vendor/db", "version": "2.5.0", "type": "library"}
        ],
        "packages-dev": [
            {"name": "vendor/debug", "version": "1.0.0", "type": "library"}
        ],
        "aliases": [],
        "minimum-stability": "dev",
        "stability-flags": [],
        "prefer-stable": true,
        "prefer-lowest": false,
        "platform": {"php": "^8.1"},
        "platform-dev": []
    })
}
