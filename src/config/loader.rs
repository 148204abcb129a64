//! Template and data document loading.
//!
//! Both documents are read into a [`serde_json::Value`] tree. Files ending in
//! `.yml` or `.yaml` are parsed as YAML; everything else (including
//! `.json.tpl`) is parsed as JSON. No cross-document validation happens here.

use crate::config::interpolation::DataFile;
use crate::error::{DeployerError, Result};
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Document format, chosen from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    /// Pick the format for a path.
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yml") || ext.eq_ignore_ascii_case("yaml") => {
                DocumentFormat::Yaml
            }
            _ => DocumentFormat::Json,
        }
    }
}

/// Read and parse a document from disk.
///
/// # Errors
///
/// Returns `ParseError` if the file is absent, unreadable, or malformed.
pub fn load_document(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path).map_err(|e| DeployerError::ParseError {
        path: path.to_path_buf(),
        message: if e.kind() == std::io::ErrorKind::NotFound {
            "file not found".to_string()
        } else {
            e.to_string()
        },
    })?;

    debug!("Loaded {} ({} bytes)", path.display(), content.len());
    parse_document(&content, path)
}

/// Parse document content.
///
/// # Arguments
///
/// * `content` - The raw document text
/// * `source_path` - Path used to pick the format and for error reporting
pub fn parse_document(content: &str, source_path: &Path) -> Result<Value> {
    let parsed = match DocumentFormat::for_path(source_path) {
        DocumentFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
        DocumentFormat::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
    };

    parsed.map_err(|message| DeployerError::ParseError {
        path: source_path.to_path_buf(),
        message,
    })
}

/// Load the configuration template.
pub fn load_template(path: &Path) -> Result<Value> {
    load_document(path)
}

/// Load the data file. Its top level must be a mapping.
pub fn load_data(path: &Path) -> Result<DataFile> {
    let value = load_document(path)?;
    DataFile::from_value(value).map_err(|message| DeployerError::ParseError {
        path: path.to_path_buf(),
        message,
    })
}
