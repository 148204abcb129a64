//! Typed step model.
//!
//! A [`Step`] is one executable unit extracted from the resolved
//! configuration. Its [`StepKind`] is a closed set of variants, each carrying
//! fully resolved parameters.

use crate::config::interpolation::{render_text, type_name, DataFile};
use crate::error::{DeployerError, Result};
use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// A fully resolved step ready for execution.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    /// 1-based position in the declared step list.
    pub ordinal: usize,

    /// Human-readable label for reporting.
    pub label: String,

    /// Kind and kind-specific parameters.
    pub kind: StepKind,
}

impl Step {
    /// Build a step from its resolved document entry.
    ///
    /// `data` is attached to steps that expand files at run time.
    ///
    /// # Errors
    ///
    /// Returns `InvalidStep` naming the ordinal if the kind is unsupported or
    /// a parameter is missing, mistyped, or empty.
    pub fn from_value(ordinal: usize, value: &Value, data: &DataFile) -> Result<Self> {
        let invalid = |message: String| DeployerError::InvalidStep { ordinal, message };

        let Value::Object(entry) = value else {
            return Err(invalid(format!(
                "step must be a mapping, found {}",
                type_name(value)
            )));
        };

        let mut fields: Map<String, Value> = entry.clone();
        let label = match fields.remove("label") {
            None | Some(Value::Null) => None,
            Some(v @ (Value::Array(_) | Value::Object(_))) => {
                return Err(invalid(format!(
                    "`label` must be text, found {}",
                    type_name(&v)
                )))
            }
            Some(v) => Some(render_text(&v)),
        };

        match fields.get("kind") {
            None => return Err(invalid("missing `kind`".to_string())),
            Some(Value::String(_)) => {}
            Some(other) => {
                return Err(invalid(format!(
                    "`kind` must be a string, found {}",
                    type_name(other)
                )))
            }
        }

        let mut kind: StepKind =
            serde_json::from_value(Value::Object(fields)).map_err(|e| invalid(e.to_string()))?;
        kind.validate().map_err(invalid)?;

        if let StepKind::Template(ref mut template) = kind {
            template.data = data.clone();
        }

        let label = label
            .filter(|l| !l.trim().is_empty())
            .unwrap_or_else(|| kind.default_label());

        Ok(Self {
            ordinal,
            label,
            kind,
        })
    }
}

/// Supported step kinds.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StepKind {
    /// Create a directory.
    Mkdir(MkdirStep),
    /// Copy a file or directory tree.
    Copy(CopyStep),
    /// Remove a file or directory tree.
    Delete(DeleteStep),
    /// Write text to a file.
    Write(WriteStep),
    /// Expand placeholders in a text file.
    Template(TemplateStep),
    /// Run an external process.
    #[serde(alias = "script")]
    Run(RunStep),
}

impl StepKind {
    /// Kind name as written in the template.
    pub fn name(&self) -> &'static str {
        match self {
            StepKind::Mkdir(_) => "mkdir",
            StepKind::Copy(_) => "copy",
            StepKind::Delete(_) => "delete",
            StepKind::Write(_) => "write",
            StepKind::Template(_) => "template",
            StepKind::Run(_) => "run",
        }
    }

    /// Label used when the template gives none.
    pub fn default_label(&self) -> String {
        let subject = match self {
            StepKind::Mkdir(s) => s.path.clone(),
            StepKind::Copy(s) => format!("{} -> {}", s.from, s.to),
            StepKind::Delete(s) => s.path.clone(),
            StepKind::Write(s) => s.path.clone(),
            StepKind::Template(s) => format!("{} -> {}", s.source, s.target),
            StepKind::Run(s) if s.args.is_empty() => s.command.clone(),
            StepKind::Run(s) => format!("{} {}", s.command, s.args.join(" ")),
        };
        format!("{} {}", self.name(), subject)
    }

    fn validate(&self) -> std::result::Result<(), String> {
        let required: Vec<(&str, &str)> = match self {
            StepKind::Mkdir(s) => vec![("path", s.path.as_str())],
            StepKind::Copy(s) => vec![("from", s.from.as_str()), ("to", s.to.as_str())],
            StepKind::Delete(s) => vec![("path", s.path.as_str())],
            StepKind::Write(s) => vec![("path", s.path.as_str())],
            StepKind::Template(s) => vec![
                ("source", s.source.as_str()),
                ("target", s.target.as_str()),
            ],
            StepKind::Run(s) => vec![("command", s.command.as_str())],
        };

        match required.iter().find(|(_, value)| value.trim().is_empty()) {
            Some((field, _)) => Err(format!("`{}` must not be empty", field)),
            None => Ok(()),
        }
    }
}

fn default_true() -> bool {
    true
}

/// Parameters for `mkdir`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MkdirStep {
    #[serde(deserialize_with = "scalar_string")]
    pub path: String,

    /// Create missing parent directories.
    #[serde(default = "default_true")]
    pub parents: bool,
}

/// Parameters for `copy`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CopyStep {
    #[serde(deserialize_with = "scalar_string")]
    pub from: String,

    #[serde(deserialize_with = "scalar_string")]
    pub to: String,

    /// Replace files that already exist at the destination.
    #[serde(default = "default_true")]
    pub overwrite: bool,
}

/// Parameters for `delete`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeleteStep {
    #[serde(deserialize_with = "scalar_string")]
    pub path: String,

    /// Fail when the path does not exist.
    #[serde(default)]
    pub must_exist: bool,
}

/// Parameters for `write`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WriteStep {
    #[serde(deserialize_with = "scalar_string")]
    pub path: String,

    #[serde(deserialize_with = "scalar_string")]
    pub content: String,
}

/// Parameters for `template`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TemplateStep {
    #[serde(deserialize_with = "scalar_string")]
    pub source: String,

    #[serde(deserialize_with = "scalar_string")]
    pub target: String,

    /// Values the source file is expanded against.
    #[serde(skip)]
    pub data: DataFile,
}

/// Parameters for `run`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunStep {
    #[serde(deserialize_with = "scalar_string")]
    pub command: String,

    /// Arguments; when empty the command line goes through the shell.
    #[serde(default, deserialize_with = "scalar_strings")]
    pub args: Vec<String>,

    /// Working directory, relative to the run's working directory.
    #[serde(default, deserialize_with = "optional_scalar_string")]
    pub cwd: Option<String>,

    #[serde(default, deserialize_with = "scalar_map")]
    pub env: BTreeMap<String, String>,

    /// Timeout in seconds, overriding the run-wide default.
    #[serde(default)]
    pub timeout: Option<u64>,
}

/// Text parameter that also accepts numbers and booleans.
struct Scalar(String);

struct ScalarVisitor;

impl<'de> Visitor<'de> for ScalarVisitor {
    type Value = String;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a string, number, or boolean")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<String, E> {
        Ok(v.to_owned())
    }

    fn visit_string<E: de::Error>(self, v: String) -> std::result::Result<String, E> {
        Ok(v)
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> std::result::Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<String, E> {
        Ok(v.to_string())
    }
}

impl<'de> Deserialize<'de> for Scalar {
    fn deserialize<D: Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        d.deserialize_any(ScalarVisitor).map(Scalar)
    }
}

fn scalar_string<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<String, D::Error> {
    Scalar::deserialize(d).map(|s| s.0)
}

fn optional_scalar_string<'de, D: Deserializer<'de>>(
    d: D,
) -> std::result::Result<Option<String>, D::Error> {
    Ok(Option::<Scalar>::deserialize(d)?.map(|s| s.0))
}

fn scalar_strings<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Vec<String>, D::Error> {
    Ok(Vec::<Scalar>::deserialize(d)?
        .into_iter()
        .map(|s| s.0)
        .collect())
}

fn scalar_map<'de, D: Deserializer<'de>>(
    d: D,
) -> std::result::Result<BTreeMap<String, String>, D::Error> {
    Ok(BTreeMap::<String, Scalar>::deserialize(d)?
        .into_iter()
        .map(|(k, v)| (k, v.0))
        .collect())
}
