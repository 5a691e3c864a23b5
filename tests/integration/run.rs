use predicates::prelude::*;
use serde_json::json;

use crate::common::{PLUGIN, TestProject, db_spec, lock_with_plugin, skeleton_manifest};

#[test]
fn test_run_prompts_then_removes_installer() {
    let project = TestProject::with_manifest(skeleton_manifest(json!([db_spec()])));
    project.write_json("composer.lock", &lock_with_plugin());
    project.install_vendor_package(PLUGIN);

    project
        .command()
        .arg("run")
        .write_stdin("y\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Do you want a minimal install"))
        .stdout(predicate::str::contains(format!("Removing {PLUGIN}...")))
        .stdout(predicate::str::contains("Complete!"));

    let manifest = project.read_json("composer.json");
    assert!(manifest.get("extra").is_none());
    assert!(manifest["require"].get(PLUGIN).is_none());
    assert_eq!(manifest["require"]["php"], "^8.1");
    assert!(!project.file("vendor/laminas").exists());
}

#[cfg(unix)]
#[test]
fn test_run_installs_selection_before_removal() {
    let project = TestProject::with_manifest(skeleton_manifest(json!([db_spec()])));
    project.write_json("composer.lock", &lock_with_plugin());
    let config = project.write_config("install-command = [\"sh\", \"-c\", \"exit 0\"]\n");

    project
        .command()
        .args(["--quiet", "--config"])
        .arg(&config)
        .arg("run")
        .write_stdin("n\ny\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Will install vendor/db (^2.5)"));

    let manifest = project.read_json("composer.json");
    assert_eq!(manifest["require"]["vendor/db"], "^2.5");
    assert!(manifest["require"].get(PLUGIN).is_none());
}

#[cfg(unix)]
#[test]
fn test_run_keeps_lock_written_by_install() {
    let project = TestProject::with_manifest(skeleton_manifest(json!([db_spec()])));
    project.write_json("composer.lock", &lock_with_plugin());
    let mut next = lock_with_plugin();
    next["packages"]
        .as_array_mut()
        .unwrap()
        .push(json!({"name": "vendor/newly", "version": "1.0.0", "type": "library"}));
    project.write_json("next.lock", &next);
    let config = project.write_config("install-command = [\"sh\", \"-c\", \"cp next.lock composer.lock\"]\n");

    project
        .command()
        .arg("--config")
        .arg(&config)
        .arg("run")
        .write_stdin("n\ny\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Complete!"));

    let lock = project.read_json("composer.lock");
    let names: Vec<&str> = lock["packages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|package| package["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["vendor/db", "vendor/newly"]);
    assert_eq!(lock["packages-dev"][0]["name"], "vendor/debug");
}
