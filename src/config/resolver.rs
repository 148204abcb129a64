//! Template resolution.
//!
//! Merges a template document with a data file into a [`ResolvedConfig`]:
//! every placeholder is substituted, then the `steps` list is extracted and
//! validated in declared order. Resolution is pure; the same inputs always
//! produce the same output, including which error is reported first.

use crate::config::interpolation::{expand_text, substitute, type_name, DataFile, MissingKey};
use crate::config::loader::{load_data, load_template};
use crate::error::{DeployerError, Result};
use crate::steps::Step;
use serde_json::{Map, Value};
use std::path::Path;
use tracing::{debug, info};

/// Key of the step list in the resolved document.
pub const STEPS_KEY: &str = "steps";

/// A template with every placeholder substituted, plus its ordered steps.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    document: Value,
    steps: Vec<Step>,
}

impl ResolvedConfig {
    /// The fully resolved document.
    pub fn document(&self) -> &Value {
        &self.document
    }

    /// Steps in declared order.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }
}

/// Load both documents from disk and resolve them.
///
/// # Errors
///
/// Returns `ParseError` for unreadable or malformed documents, then any
/// error from [`resolve`].
pub fn resolve_files(template_path: &Path, data_path: &Path) -> Result<ResolvedConfig> {
    let template = load_template(template_path)?;
    let data = load_data(data_path)?;
    let config = resolve(&template, &data)?;

    info!(
        "Resolved {} against {}: {} step(s)",
        template_path.display(),
        data_path.display(),
        config.steps.len()
    );
    Ok(config)
}

/// Resolve a template against a data file.
///
/// # Errors
///
/// - `UnresolvedReference` if a placeholder has no data value
/// - `ConfigValidationError` if the document has no `steps` list
/// - `InvalidStep` if a step has an unsupported kind or bad parameters
pub fn resolve(template: &Value, data: &DataFile) -> Result<ResolvedConfig> {
    let document = resolve_value(template, data)?;
    let steps = extract_steps(&document, data)?;
    debug!("Extracted {} step(s)", steps.len());

    Ok(ResolvedConfig { document, steps })
}

/// Substitute every placeholder in a document, without extracting steps.
pub fn resolve_value(template: &Value, data: &DataFile) -> Result<Value> {
    walk(template, data, "")
}

fn walk(value: &Value, data: &DataFile, location: &str) -> Result<Value> {
    match value {
        Value::String(s) => substitute(s, data).map_err(|e| unresolved(e, location)),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| walk(item, data, &format!("{}/{}", location, i)))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        Value::Object(map) => {
            let mut resolved = Map::new();
            for (key, item) in map {
                let item_location = format!("{}/{}", location, escape_pointer(key));
                let new_key =
                    expand_text(key, data).map_err(|e| unresolved(e, &item_location))?;
                let new_item = walk(item, data, &item_location)?;
                if resolved.insert(new_key.clone(), new_item).is_some() {
                    return Err(DeployerError::ConfigValidationError {
                        message: format!(
                            "key '{}' appears twice after substitution at {}",
                            new_key,
                            display_location(location)
                        ),
                    });
                }
            }
            Ok(Value::Object(resolved))
        }
        Value::Null | Value::Bool(_) | Value::Number(_) => Ok(value.clone()),
    }
}

fn extract_steps(document: &Value, data: &DataFile) -> Result<Vec<Step>> {
    let entries = match document.get(STEPS_KEY) {
        Some(Value::Array(entries)) => entries,
        Some(other) => {
            return Err(DeployerError::ConfigValidationError {
                message: format!("`{}` must be a list, found {}", STEPS_KEY, type_name(other)),
            })
        }
        None => {
            return Err(DeployerError::ConfigValidationError {
                message: format!("template has no `{}` list", STEPS_KEY),
            })
        }
    };

    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| Step::from_value(i + 1, entry, data))
        .collect()
}

fn unresolved(MissingKey(name): MissingKey, location: &str) -> DeployerError {
    DeployerError::UnresolvedReference {
        name,
        location: display_location(location),
    }
}

fn display_location(location: &str) -> String {
    if location.is_empty() {
        "/".to_string()
    } else {
        location.to_string()
    }
}

/// Escape a key as a JSON pointer token.
fn escape_pointer(key: &str) -> String {
    key.replace('~', "~0").replace('/', "~1")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::steps::{MkdirStep, StepKind};
    use serde_json::json;

    fn data(value: Value) -> DataFile {
        DataFile::from_value(value).unwrap()
    }

    fn example_template() -> Value {
        json!({"dir": "{{outDir}}", "steps": [{"kind": "mkdir", "path": "{{outDir}}/bin"}]})
    }

    #[test]
    fn resolves_example_template() {
        let config = resolve(&example_template(), &data(json!({"outDir": "build"}))).unwrap();

        assert_eq!(config.document()["dir"], "build");
        assert_eq!(config.steps().len(), 1);
        assert_eq!(
            config.steps()[0].kind,
            StepKind::Mkdir(MkdirStep {
                path: "build/bin".to_string(),
                parents: true,
            })
        );
    }

    #[test]
    fn missing_key_fails_with_location() {
        let err = resolve(&example_template(), &data(json!({}))).unwrap_err();

        match err {
            DeployerError::UnresolvedReference { name, location } => {
                assert_eq!(name, "outDir");
                // Keys are visited in sorted order, so `dir` comes first.
                assert_eq!(location, "/dir");
            }
            other => panic!("expected UnresolvedReference, got {:?}", other),
        }
    }

    #[test]
    fn missing_key_inside_steps_points_at_step() {
        let template = json!({"steps": [
            {"kind": "mkdir", "path": "a"},
            {"kind": "mkdir", "path": "{{second}}"}
        ]});
        let err = resolve(&template, &DataFile::default()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unresolved reference '{{second}}' at /steps/1/path"
        );
    }

    #[test]
    fn native_types_are_preserved() {
        let template = json!({"jobs": "{{jobs}}", "flags": "{{flags}}", "label": "x{{jobs}}", "steps": []});
        let config = resolve(&template, &data(json!({"jobs": 8, "flags": ["-O2"]}))).unwrap();

        assert_eq!(config.document()["jobs"], json!(8));
        assert_eq!(config.document()["flags"], json!(["-O2"]));
        assert_eq!(config.document()["label"], json!("x8"));
    }

    #[test]
    fn literals_pass_through() {
        let template = json!({"n": 1, "b": false, "z": null, "s": "plain", "steps": []});
        let config = resolve(&template, &DataFile::default()).unwrap();
        assert_eq!(config.document(), &template);
    }

    #[test]
    fn keys_are_substituted() {
        let template = json!({"{{env}}_dir": "out", "steps": []});
        let config = resolve(&template, &data(json!({"env": "prod"}))).unwrap();
        assert_eq!(config.document()["prod_dir"], "out");
    }

    #[test]
    fn colliding_keys_are_rejected() {
        let template = json!({"{{a}}": 1, "x": 2, "steps": []});
        let err = resolve(&template, &data(json!({"a": "x"}))).unwrap_err();
        assert!(matches!(err, DeployerError::ConfigValidationError { .. }));
    }

    #[test]
    fn missing_steps_list_is_invalid() {
        let err = resolve(&json!({"dir": "x"}), &DataFile::default()).unwrap_err();
        assert!(err.to_string().contains("no `steps` list"));
    }

    #[test]
    fn steps_must_be_a_list() {
        let err = resolve(&json!({"steps": "mkdir"}), &DataFile::default()).unwrap_err();
        assert!(err.to_string().contains("must be a list"));
    }

    #[test]
    fn invalid_step_reports_ordinal() {
        let template = json!({"steps": [
            {"kind": "mkdir", "path": "a"},
            {"kind": "mkdir", "path": "b"},
            {"kind": "teleport"}
        ]});
        match resolve(&template, &DataFile::default()).unwrap_err() {
            DeployerError::InvalidStep { ordinal, .. } => assert_eq!(ordinal, 3),
            other => panic!("expected InvalidStep, got {:?}", other),
        }
    }

    #[test]
    fn steps_keep_declared_order() {
        let template = json!({"steps": [
            {"kind": "mkdir", "path": "c"},
            {"kind": "mkdir", "path": "a"},
            {"kind": "mkdir", "path": "b"}
        ]});
        let config = resolve(&template, &DataFile::default()).unwrap();
        let labels: Vec<_> = config.steps().iter().map(|s| s.label.as_str()).collect();
        let ordinals: Vec<_> = config.steps().iter().map(|s| s.ordinal).collect();

        assert_eq!(labels, vec!["mkdir c", "mkdir a", "mkdir b"]);
        assert_eq!(ordinals, vec![1, 2, 3]);
    }

    #[test]
    fn resolution_is_deterministic() {
        let template = json!({
            "name": "{{app}}-{{version}}",
            "steps": [
                {"kind": "write", "path": "{{out}}/VERSION", "content": "{{version}}"},
                {"kind": "run", "command": "tar", "args": ["-czf", "{{app}}.tgz", "{{out}}"]}
            ]
        });
        let d = data(json!({"app": "demo", "version": "1.2.3", "out": "dist"}));

        assert_eq!(resolve(&template, &d).unwrap(), resolve(&template, &d).unwrap());
    }

    #[test]
    fn pointer_tokens_are_escaped() {
        let template = json!({"a/b": "{{missing}}", "steps": []});
        match resolve(&template, &DataFile::default()).unwrap_err() {
            DeployerError::UnresolvedReference { location, .. } => assert_eq!(location, "/a~1b"),
            other => panic!("expected UnresolvedReference, got {:?}", other),
        }
    }
}
