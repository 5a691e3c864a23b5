use predicates::prelude::*;
use serde_json::json;

use crate::common::{PLUGIN, TestProject, lock_with_plugin};

fn installed_project() -> TestProject {
    let project = TestProject::with_manifest(json!({
        "name": "acme/app",
        "require": {
            "php": "^8.1",
            "vendor/db": "^2.5",
            PLUGIN: "^1.0"
        },
        "require-dev": {"vendor/debug": "^1.0"}
    }));
    project.write_json("composer.lock", &lock_with_plugin());
    project.install_vendor_package(PLUGIN);
    project.install_vendor_package("vendor/db");
    project.install_vendor_package("vendor/debug");
    project
}

#[test]
fn test_remove_self() {
    let project = installed_project();

    project
        .command()
        .arg("remove-self")
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("Removing {PLUGIN}...")))
        .stdout(predicate::str::contains(format!("Removed plugin {PLUGIN}.")))
        .stdout(predicate::str::contains("Complete!"));

    assert!(!project.file("vendor/laminas").exists());
    assert!(project.file("vendor/vendor/db").exists());
    assert!(project.file("vendor/vendor/debug").exists());

    let manifest = project.read_json("composer.json");
    assert!(manifest["require"].get(PLUGIN).is_none());
    assert_eq!(manifest["require"]["vendor/db"], "^2.5");
    assert_eq!(manifest["require-dev"]["vendor/debug"], "^1.0");

    let lock = project.read_json("composer.lock");
    let names = |key: &str| {
        lock[key]
            .as_array()
            .unwrap()
            .iter()
            .map(|package| package["name"].as_str().unwrap().to_string())
            .collect::<Vec<_>>()
    };
    assert_eq!(names("packages"), vec!["vendor/db"]);
    assert_eq!(names("packages-dev"), vec!["vendor/debug"]);
    assert_eq!(lock["packages"][0]["type"], "library");
    assert_eq!(lock["minimum-stability"], "dev");
    assert_eq!(lock["prefer-stable"], true);
    assert_eq!(lock["platform"]["php"], "^8.1");
    assert_eq!(lock["stability-flags"], json!([]));
    assert_eq!(lock["content-hash"], "0123456789abcdef");
}

#[test]
fn test_remove_self_twice_is_harmless() {
    let project = installed_project();

    project.command().arg("remove-self").assert().success();
    let lock = project.read_json("composer.lock");

    project
        .command()
        .arg("remove-self")
        .assert()
        .success()
        .stdout(predicate::str::contains("Package not installed; nothing to do."));

    assert_eq!(project.read_json("composer.lock"), lock);
}

#[test]
fn test_remove_self_without_lock_file() {
    let project = TestProject::with_manifest(json!({
        "name": "acme/app",
        "require": {PLUGIN: "^1.0"}
    }));

    project
        .command()
        .arg("remove-self")
        .assert()
        .success()
        .stdout(predicate::str::contains("Package not installed; nothing to do."));

    assert!(project.read_json("composer.json")["require"].get(PLUGIN).is_none());
    assert!(!project.file("composer.lock").exists());
}

#[test]
fn test_remove_self_custom_plugin_name() {
    let project = TestProject::with_manifest(json!({
        "name": "acme/app",
        "require": {"acme/installer": "^2.0", PLUGIN: "^1.0"}
    }));
    project.write_json(
        "composer.lock",
        &json!({"packages": [{"name": "acme/installer", "version": "2.0.0"}], "packages-dev": []}),
    );
    project.install_vendor_package("acme/installer");
    let config = project.write_config("plugin-name = \"acme/installer\"\n");

    project.command().arg("--config").arg(&config).arg("remove-self").assert().success();

    let manifest = project.read_json("composer.json");
    assert!(manifest["require"].get("acme/installer").is_none());
    assert_eq!(manifest["require"][PLUGIN], "^1.0");
    assert!(!project.file("vendor/acme").exists());
    assert_eq!(project.read_json("composer.lock")["packages"], json!([]));
}

#[test]
fn test_remove_self_with_branch_and_unmodelled_constraints() {
    let project = TestProject::with_manifest(json!({
        "name": "acme/app",
        "require": {
            "acme/framework": "2.x-dev",
            "acme/legacy": "1.2.3.4",
            "acme/fork": "dev-main as 1.0.x-dev",
            "acme/compat": "!=1.0",
            PLUGIN: "1.0.x-dev"
        }
    }));
    project.write_json("composer.lock", &lock_with_plugin());
    project.install_vendor_package(PLUGIN);

    project.command().arg("remove-self").assert().success().stdout(predicate::str::contains("Complete!"));

    let manifest = project.read_json("composer.json");
    assert!(manifest["require"].get(PLUGIN).is_none());
    assert_eq!(manifest["require"]["acme/framework"], "2.x-dev");
    assert_eq!(manifest["require"]["acme/compat"], "!=1.0");
    assert!(!project.file("vendor/laminas").exists());
}
