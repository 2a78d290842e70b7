//! Serialization module for converting Swagger documents to JSON or YAML format.
//!
//! This module provides functions to serialize assembled documents into standard
//! formats and write them to files or return them as strings.

use crate::document::Document;
use anyhow::{Context, Result};
use log::debug;
use std::fs;
use std::path::Path;

/// Serializes a Swagger document to JSON format with pretty printing.
///
/// The output is formatted with indentation for readability, making it suitable
/// for human review and version control.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn serialize_json(doc: &Document) -> Result<String> {
    debug!("Serializing Swagger document to JSON");
    serde_json::to_string_pretty(doc).context("Failed to serialize Swagger document to JSON")
}

/// Serializes a Swagger document to YAML format.
///
/// The output is plain YAML, suitable for use with Swagger tools and
/// documentation viewers.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn serialize_yaml(doc: &Document) -> Result<String> {
    debug!("Serializing Swagger document to YAML");
    serde_yaml::to_string(doc).context("Failed to serialize Swagger document to YAML")
}

/// Writes string content to a file.
///
/// Creates the file if it doesn't exist, or overwrites it if it does. Parent
/// directories are created as needed.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written to.
pub fn write_to_file(content: &str, path: &Path) -> Result<()> {
    debug!("Writing content to file: {}", path.display());

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    fs::write(path, content)
        .with_context(|| format!("Failed to write to file: {}", path.display()))?;

    debug!(
        "Successfully wrote {} bytes to {}",
        content.len(),
        path.display()
    );
    Ok(())
}
