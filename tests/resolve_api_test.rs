//! Integration tests for configuration resolution.

use deployer::config::{resolve, resolve_files, DataFile, ExecutionSettings};
use deployer::runner::Executor;
use deployer::steps::StepKind;
use deployer::DeployerError;
use serde_json::json;
use std::fs;
use tempfile::TempDir;

fn data(value: serde_json::Value) -> DataFile {
    DataFile::from_value(value).unwrap()
}

#[test]
fn placeholder_in_step_path_is_substituted() {
    let template = json!({
        "steps": [{"kind": "mkdir", "path": "{{outDir}}/bin"}]
    });

    let config = resolve(&template, &data(json!({"outDir": "build"}))).unwrap();

    assert_eq!(config.steps().len(), 1);
    match &config.steps()[0].kind {
        StepKind::Mkdir(step) => assert_eq!(step.path, "build/bin"),
        other => panic!("expected mkdir step, got {:?}", other),
    }
    assert_eq!(config.document()["steps"][0]["path"], "build/bin");
}

#[test]
fn missing_key_fails_before_any_step_runs() {
    let temp = TempDir::new().unwrap();
    let template = temp.path().join("build.json.tpl");
    let data_file = temp.path().join("build.data.json");
    fs::write(
        &template,
        r#"{"steps": [
            {"kind": "mkdir", "path": "first"},
            {"kind": "mkdir", "path": "{{outDir}}/bin"}
        ]}"#,
    )
    .unwrap();
    fs::write(&data_file, "{}").unwrap();

    let err = resolve_files(&template, &data_file).unwrap_err();

    match err {
        DeployerError::UnresolvedReference { name, location } => {
            assert_eq!(name, "outDir");
            assert_eq!(location, "/steps/1/path");
        }
        other => panic!("expected unresolved reference, got {:?}", other),
    }
    assert!(!temp.path().join("first").exists());
}

#[test]
fn resolution_is_deterministic() {
    let template = json!({
        "name": "{{app.name}}",
        "steps": [
            {"kind": "write", "path": "{{app.name}}.txt", "content": "v{{app.version}}"},
            {"kind": "run", "command": "echo", "args": ["{{app.version}}"]}
        ]
    });
    let values = data(json!({"app": {"name": "demo", "version": 3}}));

    let first = resolve(&template, &values).unwrap();
    let second = resolve(&template, &values).unwrap();

    assert_eq!(first, second);
    assert_eq!(first.document()["steps"][0]["content"], "v3");
}

#[test]
fn yaml_template_with_json_data() {
    let temp = TempDir::new().unwrap();
    let template = temp.path().join("build.yml");
    let data_file = temp.path().join("build.data.json");
    fs::write(
        &template,
        "steps:\n  - kind: write\n    path: \"{{outDir}}/VERSION\"\n    content: \"{{version}}\"\n",
    )
    .unwrap();
    fs::write(&data_file, r#"{"outDir": "dist", "version": "1.2.0"}"#).unwrap();

    let config = resolve_files(&template, &data_file).unwrap();
    let settings = ExecutionSettings::new(temp.path());
    let summary = Executor::new(&settings)
        .execute(config.steps(), &mut Vec::new())
        .unwrap();

    assert!(summary.is_success());
    assert_eq!(
        fs::read_to_string(temp.path().join("dist/VERSION")).unwrap(),
        "1.2.0"
    );
}

#[test]
fn invalid_step_reports_ordinal() {
    let template = json!({"steps": [
        {"kind": "mkdir", "path": "a"},
        {"kind": "teleport"}
    ]});

    let err = resolve(&template, &DataFile::default()).unwrap_err();
    assert!(matches!(err, DeployerError::InvalidStep { ordinal: 2, .. }));
}
