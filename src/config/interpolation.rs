//! Placeholder parsing and substitution.
//!
//! Templates reference data values with `{{name}}` placeholders.
//!
//! # Syntax
//!
//! - `{{name}}` or `{{ name }}` - replaced with the data value for `name`
//! - `{{paths.out}}` - dotted paths walk nested mappings
//! - `{{targets.0}}` - numeric segments index lists
//!
//! An unterminated `{{` is kept as literal text.
//!
//! # Coercion
//!
//! A string that is exactly one placeholder takes the data value with its
//! native type. A placeholder embedded in other text is rendered as text.
//!
//! ```
//! use deployer::config::{substitute, DataFile};
//! use serde_json::json;
//!
//! let data = DataFile::from_value(json!({"outDir": "build", "jobs": 4})).unwrap();
//! assert_eq!(substitute("{{outDir}}/bin", &data).unwrap(), json!("build/bin"));
//! assert_eq!(substitute("{{jobs}}", &data).unwrap(), json!(4));
//! ```

use serde_json::{Map, Value};

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// A segment of a placeholder-bearing string.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Literal text
    Literal(String),
    /// Placeholder reference: {{name}}
    Placeholder(String),
}

/// A placeholder name with no value in the data file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingKey(pub String);

/// Parse a string into literal and placeholder segments.
pub fn parse_placeholders(input: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut rest = input;

    while let Some(start) = rest.find(OPEN) {
        let after_open = &rest[start + OPEN.len()..];
        let Some(end) = after_open.find(CLOSE) else {
            break;
        };

        let name = after_open[..end].trim();
        literal.push_str(&rest[..start]);
        if name.is_empty() {
            literal.push_str(&rest[start..start + OPEN.len() + end + CLOSE.len()]);
        } else {
            if !literal.is_empty() {
                segments.push(Segment::Literal(std::mem::take(&mut literal)));
            }
            segments.push(Segment::Placeholder(name.to_string()));
        }
        rest = &after_open[end + CLOSE.len()..];
    }

    literal.push_str(rest);
    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }

    segments
}

/// Values that placeholders resolve against.
///
/// Loaded once per run and never modified afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataFile {
    values: Map<String, Value>,
}

impl DataFile {
    /// Create a data file from a parsed document. The top level must be a mapping.
    pub fn from_value(value: Value) -> std::result::Result<Self, String> {
        match value {
            Value::Object(values) => Ok(Self { values }),
            other => Err(format!(
                "data file must be a mapping at the top level, found {}",
                type_name(&other)
            )),
        }
    }

    /// Look up a placeholder name.
    ///
    /// An exact top-level key wins over a dotted walk, so a key such as
    /// `"build.dir"` can still be addressed directly.
    pub fn lookup(&self, name: &str) -> Option<&Value> {
        if let Some(value) = self.values.get(name) {
            return Some(value);
        }

        let mut parts = name.split('.');
        let mut current = self.values.get(parts.next()?)?;
        for part in parts {
            current = match current {
                Value::Object(map) => map.get(part)?,
                Value::Array(items) => items.get(part.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }
}

/// Render a data value as text for embedding in a string.
pub fn render_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(_) | Value::Number(_) | Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Substitute placeholders in a string value.
///
/// A lone placeholder keeps the native type of its data value; anything
/// else produces a string.
pub fn substitute(input: &str, data: &DataFile) -> std::result::Result<Value, MissingKey> {
    let segments = parse_placeholders(input);

    if let [Segment::Placeholder(name)] = segments.as_slice() {
        return data
            .lookup(name)
            .cloned()
            .ok_or_else(|| MissingKey(name.clone()));
    }

    render_segments(segments, data).map(Value::String)
}

/// Expand every placeholder in free text, always producing text.
pub fn expand_text(input: &str, data: &DataFile) -> std::result::Result<String, MissingKey> {
    render_segments(parse_placeholders(input), data)
}

fn render_segments(
    segments: Vec<Segment>,
    data: &DataFile,
) -> std::result::Result<String, MissingKey> {
    let mut result = String::new();

    for segment in segments {
        match segment {
            Segment::Literal(text) => result.push_str(&text),
            Segment::Placeholder(name) => {
                let value = data.lookup(&name).ok_or(MissingKey(name))?;
                result.push_str(&render_text(value));
            }
        }
    }

    Ok(result)
}

pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}
