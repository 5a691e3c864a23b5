use predicates::prelude::*;
use serde_json::json;

use crate::common::{PLUGIN, TestProject, db_spec, skeleton_manifest};

#[test]
fn test_no_declarations_is_silent() {
    let project = TestProject::with_manifest(json!({"name": "acme/app", "require": {"php": "^8.1"}}));

    project
        .command()
        .arg("optional")
        .assert()
        .success()
        .stdout(predicate::str::contains("minimal install").not());

    assert_eq!(project.read_json("composer.json")["require"]["php"], "^8.1");
}

#[test]
fn test_minimal_install_removes_declarations() {
    let project = TestProject::with_manifest(skeleton_manifest(json!([db_spec()])));

    project
        .command()
        .arg("optional")
        .write_stdin("y\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Do you want a minimal install"))
        .stdout(predicate::str::contains("Removing optional packages from composer.json"));

    let manifest = project.read_json("composer.json");
    assert!(manifest.get("extra").is_none());
    assert!(manifest["require"].get("vendor/db").is_none());
    assert_eq!(manifest["require"][PLUGIN], "^1.0");
}

#[test]
fn test_end_of_input_takes_defaults() {
    let project = TestProject::with_manifest(skeleton_manifest(json!([db_spec()])));

    project.command().arg("optional").write_stdin("").assert().success();

    assert!(project.read_json("composer.json").get("extra").is_none());
}

#[test]
fn test_invalid_answer_reprompts() {
    let project = TestProject::with_manifest(skeleton_manifest(json!([db_spec()])));

    project
        .command()
        .arg("optional")
        .write_stdin("maybe\nn\nn\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Invalid answer"))
        .stdout(predicate::str::contains("No optional packages selected to install"));

    assert!(project.read_json("composer.json").get("extra").is_none());
}

#[cfg(unix)]
#[test]
fn test_selected_package_is_installed_and_recorded() {
    let project = TestProject::with_manifest(skeleton_manifest(json!([
        db_spec(),
        {"name": "vendor/debug", "constraint": "~1.0", "prompt": "Debug tools?", "dev": true}
    ])));
    let config = project.write_config("install-command = [\"sh\", \"-c\", \"exit 0\"]\n");

    project
        .command()
        .arg("--config")
        .arg(&config)
        .arg("optional")
        .write_stdin("n\ny\ny\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Will install vendor/db (^2.5)"))
        .stdout(predicate::str::contains("Will install vendor/debug (~1.0)"))
        .stdout(predicate::str::contains("Running an update to install optional packages"));

    let manifest = project.read_json("composer.json");
    assert_eq!(manifest["require"]["vendor/db"], "^2.5");
    assert_eq!(manifest["require-dev"]["vendor/debug"], "~1.0");
    assert!(manifest.get("extra").is_none());
}

#[cfg(unix)]
#[test]
fn test_install_command_sees_selection() {
    let project = TestProject::with_manifest(skeleton_manifest(json!([
        db_spec(),
        {"name": "vendor/debug", "constraint": "~1.0", "prompt": "Debug tools?", "dev": true}
    ])));
    let config = project.write_config(
        r#"install-command = ["sh", "-c", 'printf "%s\n" "$@" > argv.txt; cp composer.json seen.json', "sh"]
"#,
    );

    project
        .command()
        .arg("--config")
        .arg(&config)
        .arg("optional")
        .write_stdin("n\ny\ny\n")
        .assert()
        .success();

    let argv = std::fs::read_to_string(project.file("argv.txt")).unwrap();
    assert_eq!(argv.lines().collect::<Vec<_>>(), vec!["vendor/db", "vendor/debug", "--dev"]);

    let seen = project.read_json("seen.json");
    assert_eq!(seen["require"]["vendor/db"], "^2.5");
    assert_eq!(seen["require"]["php"], "^8.1");
    assert_eq!(seen["require-dev"]["vendor/debug"], "~1.0");
}

#[cfg(unix)]
#[test]
fn test_install_command_uses_manifest_from_environment() {
    let project = TestProject::new();
    project.write_json("app.json", &skeleton_manifest(json!([db_spec()])));
    let config = project.write_config(
        r#"install-command = ["sh", "-c", 'echo "$COMPOSER" > env.txt; cp "$COMPOSER" seen.json; exit 4', "sh"]
"#,
    );

    project
        .command()
        .env("COMPOSER", "app.json")
        .arg("--config")
        .arg(&config)
        .arg("optional")
        .write_stdin("n\ny\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Error installing optional packages"));

    assert_eq!(std::fs::read_to_string(project.file("env.txt")).unwrap().trim(), "app.json");
    assert_eq!(project.read_json("seen.json")["require"]["vendor/db"], "^2.5");
    assert_eq!(project.read_json("app.json"), skeleton_manifest(json!([db_spec()])));
    assert!(!project.file("composer.json").exists());
}

#[cfg(unix)]
#[test]
fn test_failed_install_leaves_manifest_untouched() {
    let original = skeleton_manifest(json!([db_spec()]));
    let project = TestProject::with_manifest(original.clone());
    let config = project.write_config("install-command = [\"sh\", \"-c\", \"exit 3\"]\n");

    project
        .command()
        .arg("--config")
        .arg(&config)
        .arg("optional")
        .write_stdin("n\ny\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Error installing optional packages"));

    assert_eq!(project.read_json("composer.json"), original);
}

#[test]
fn test_missing_install_program_is_an_error() {
    let original = skeleton_manifest(json!([db_spec()]));
    let project = TestProject::with_manifest(original.clone());
    let config =
        project.write_config("install-command = [\"skeleton-installer-no-such-program\", \"update\"]\n");

    project
        .command()
        .arg("--config")
        .arg(&config)
        .arg("optional")
        .write_stdin("n\ny\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("skeleton-installer-no-such-program"));

    assert_eq!(project.read_json("composer.json"), original);
}

#[test]
fn test_missing_manifest_is_an_error() {
    let project = TestProject::new();

    project.command().arg("optional").assert().failure();
}
