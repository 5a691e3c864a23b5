use predicates::prelude::*;
use serde_json::json;
use serial_test::serial;
use skeleton_installer::config::InstallerConfig;
use skeleton_installer::manifest::JsonManifestFile;

use crate::common::{PLUGIN, TestProject, db_spec, skeleton_manifest};

#[test]
fn test_missing_config_file_is_an_error() {
    let project = TestProject::with_manifest(json!({"name": "acme/app"}));

    project
        .command()
        .args(["--config", "does-not-exist.toml", "optional"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_invalid_config_file_is_an_error() {
    let project = TestProject::with_manifest(json!({"name": "acme/app"}));
    let config = project.write_config("plugin-name = \"\"\n");

    project
        .command()
        .arg("--config")
        .arg(&config)
        .arg("remove-self")
        .assert()
        .failure()
        .stderr(predicate::str::contains("plugin-name"));

    assert_eq!(project.read_json("composer.json"), json!({"name": "acme/app"}));
}

#[test]
fn test_config_from_environment() {
    let project = TestProject::with_manifest(skeleton_manifest(json!([db_spec()])));
    let config = project.write_config("extension-key = \"acme-installer\"\nlegacy-extension-keys = []\n");

    // The declarations sit under a key the configuration no longer reads
    project
        .command()
        .env("SKELETON_INSTALLER_CONFIG", &config)
        .arg("optional")
        .assert()
        .success()
        .stdout(predicate::str::contains("minimal install").not());

    assert!(project.read_json("composer.json")["extra"].get("laminas-skeleton-installer").is_some());
}

#[test]
fn test_composer_env_selects_manifest() {
    let project = TestProject::new();
    project.write_json("app.json", &json!({"name": "acme/app", "require": {PLUGIN: "^1.0"}}));

    project
        .command()
        .env("COMPOSER", "app.json")
        .arg("remove-self")
        .assert()
        .success();

    assert!(project.read_json("app.json")["require"].get(PLUGIN).is_none());
    assert!(!project.file("composer.json").exists());
}

#[test]
#[serial]
fn test_discover_honors_composer_env() {
    let project = TestProject::new();

    unsafe {
        std::env::set_var("COMPOSER", "custom.json");
    }
    let discovered = JsonManifestFile::discover(project.path());
    let configured = InstallerConfig::default().lock_path(project.path());
    unsafe {
        std::env::remove_var("COMPOSER");
    }

    assert_eq!(discovered.path(), project.file("custom.json"));
    assert_eq!(configured, project.file("custom.lock"));
    assert_eq!(JsonManifestFile::discover(project.path()).path(), project.file("composer.json"));
}
