//! Integration tests for the deployer binary.
// The cargo_bin function is marked deprecated in favor of cargo_bin! macro,
// but both work correctly. Suppressing until assert_cmd stabilizes the new API.
#![allow(deprecated)]

use assert_cmd::cargo::cargo_bin;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const TEMPLATE: &str = r#"{
  "name": "{{app}}",
  "steps": [
    {"kind": "mkdir", "path": "{{outDir}}/bin"},
    {"kind": "write", "path": "{{outDir}}/bin/NAME", "content": "{{app}}"}
  ]
}"#;

fn setup_project(data: &str) -> TempDir {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("build.json.tpl"), TEMPLATE).unwrap();
    fs::write(temp.path().join("build.data.json"), data).unwrap();
    temp
}

fn deployer(temp: &TempDir) -> Command {
    let mut cmd = Command::new(cargo_bin("deployer"));
    cmd.current_dir(temp.path())
        .env_remove("DEPLOYER_TEMPLATE")
        .env_remove("DEPLOYER_DATA")
        .env_remove("DEPLOYER_WORKDIR")
        .env_remove("DEPLOYER_STEP_TIMEOUT");
    cmd
}

#[test]
fn cli_shows_version() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin("deployer"));
    cmd.arg("--version");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    Ok(())
}

#[test]
fn cli_shows_help() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin("deployer"));
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("config"));
    Ok(())
}

#[test]
fn cli_no_args_runs_default_files() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_project(r#"{"outDir": "build", "app": "demo"}"#);
    deployer(&temp)
        .assert()
        .success()
        .stdout(predicate::str::contains("mkdir build/bin"))
        .stdout(predicate::str::contains("Time: "));

    assert_eq!(
        fs::read_to_string(temp.path().join("build/bin/NAME"))?,
        "demo"
    );
    Ok(())
}

#[test]
fn cli_missing_key_exits_nonzero() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_project(r#"{"app": "demo"}"#);
    deployer(&temp)
        .arg("run")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("outDir"));

    assert!(!temp.path().join("build").exists());
    Ok(())
}

#[test]
fn cli_failed_step_exits_nonzero() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_project(r#"{"outDir": "build", "app": "demo"}"#);
    fs::write(temp.path().join("build"), "not a directory")?;

    deployer(&temp)
        .arg("run")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("FAILED"))
        .stdout(predicate::str::contains("SKIPPED"));
    Ok(())
}

#[test]
fn cli_cleanup_removes_directory() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_project(r#"{"outDir": "build", "app": "demo"}"#);
    fs::create_dir_all(temp.path().join("temp/repo"))?;

    deployer(&temp)
        .args(["run", "--cleanup", "temp"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removing temp"));

    assert!(!temp.path().join("temp").exists());
    Ok(())
}

#[test]
fn cli_config_lists_steps() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_project(r#"{"outDir": "build", "app": "demo"}"#);
    deployer(&temp)
        .args(["config", "--steps"])
        .assert()
        .success()
        .stdout("#1 mkdir build/bin\n#2 write build/bin/NAME\n");

    assert!(!temp.path().join("build").exists());
    Ok(())
}

#[test]
fn cli_no_args_reads_env_inputs() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    fs::write(
        temp.path().join("custom.tpl"),
        r#"{"steps": [{"kind": "mkdir", "path": "{{outDir}}"}]}"#,
    )?;
    fs::write(temp.path().join("custom.json"), r#"{"outDir": "from-env"}"#)?;
    let target = temp.path().join("target");
    fs::create_dir(&target)?;

    deployer(&temp)
        .env("DEPLOYER_TEMPLATE", "custom.tpl")
        .env("DEPLOYER_DATA", "custom.json")
        .env("DEPLOYER_WORKDIR", &target)
        .assert()
        .success()
        .stdout(predicate::str::contains("mkdir from-env"));

    assert!(target.join("from-env").is_dir());
    assert!(!temp.path().join("from-env").exists());
    Ok(())
}
