//! Serialization module for writing OpenAPI documents as YAML or JSON.

use crate::openapi_builder::OpenApiDocument;
use anyhow::{Context, Result};
use log::debug;
use std::fs;
use std::path::Path;

/// Serializes an OpenAPI document to YAML format.
///
/// Keys keep their insertion order, so components and the registration
/// table come out in the order they were declared.
///
/// # Arguments
///
/// * `doc` - The OpenAPI document to serialize
///
/// # Returns
///
/// Returns the YAML string representation of the document.
///
/// # Errors
///
/// Returns an error if serialization fails.
///
/// # Example
///
/// ```ignore
/// use shapedoc::declaration::Declaration;
/// use shapedoc::openapi_builder::OpenApiBuilder;
/// use shapedoc::resolver::ShapeResolver;
/// use shapedoc::schema_mapper::SchemaMapper;
/// use shapedoc::serializer::serialize_yaml;
/// use std::path::Path;
/// use std::sync::Arc;
///
/// let declaration = Declaration::load(Path::new("shapes/cars.yaml"))?;
/// let resolver = ShapeResolver::new(Arc::new(declaration.build_registry()?));
/// let mapper = SchemaMapper::new(&declaration.settings)?;
/// let doc = OpenApiBuilder::new().build(&resolver, &mapper)?;
/// let yaml = serialize_yaml(&doc)?;
/// ```
pub fn serialize_yaml(doc: &OpenApiDocument) -> Result<String> {
    debug!("Serializing OpenAPI document to YAML");
    serde_yaml::to_string(doc).context("Failed to serialize OpenAPI document to YAML")
}

/// Serializes an OpenAPI document to pretty-printed JSON.
///
/// # Arguments
///
/// * `doc` - The OpenAPI document to serialize
///
/// # Returns
///
/// Returns the indented JSON string representation of the document.
///
/// # Errors
///
/// Returns an error if serialization fails.
///
/// # Example
///
/// ```ignore
/// use shapedoc::serializer::serialize_json;
///
/// let json = serialize_json(&doc)?;
/// assert!(json.starts_with('{'));
/// ```
pub fn serialize_json(doc: &OpenApiDocument) -> Result<String> {
    debug!("Serializing OpenAPI document to JSON");
    serde_json::to_string_pretty(doc).context("Failed to serialize OpenAPI document to JSON")
}

/// Writes string content to a file, creating parent directories as needed.
///
/// Overwrites the file if it already exists.
///
/// # Arguments
///
/// * `content` - The text to write
/// * `path` - Destination file
///
/// # Errors
///
/// Returns an error if a parent directory cannot be created or the file cannot be written.
///
/// # Example
///
/// ```no_run
/// use shapedoc::serializer::write_to_file;
/// use std::path::Path;
///
/// write_to_file("openapi: 3.0.3\n", Path::new("out/openapi.yaml")).unwrap();
/// ```
pub fn write_to_file(content: &str, path: &Path) -> Result<()> {
    debug!("Writing content to file: {}", path.display());

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    fs::write(path, content).with_context(|| format!("Failed to write to file: {}", path.display()))?;

    debug!("Successfully wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}
