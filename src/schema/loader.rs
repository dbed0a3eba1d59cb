//! Schema loader for index schema files
//!
//! One JSON file per indexed type. Unreadable or malformed files are errors;
//! nothing is defaulted.

use std::fs;
use std::path::Path;

use super::errors::{SchemaError, SchemaResult};
use super::types::IndexSchema;

/// Reads [`IndexSchema`] definitions from JSON
pub struct SchemaLoader;

impl SchemaLoader {
    /// Loads and validates a schema file.
    pub fn load_file(path: &Path) -> SchemaResult<IndexSchema> {
        let content = fs::read_to_string(path).map_err(|e| SchemaError::Io {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::parse(&path.display().to_string(), &content)
    }

    /// Parses and validates a schema held in memory.
    ///
    /// `origin` names the source in error messages.
    pub fn parse(origin: &str, content: &str) -> SchemaResult<IndexSchema> {
        let schema: IndexSchema = serde_json::from_str(content)
            .map_err(|e| SchemaError::malformed(origin, format!("Invalid JSON: {}", e)))?;

        schema
            .validate_structure()
            .map_err(|e| SchemaError::malformed(origin, e))?;

        Ok(schema)
    }
}
