//! Field metadata types
//!
//! An [`IndexSchema`] is the JSON-loadable form of the metadata a host
//! application's attribute layer would otherwise supply:
//!
//! ```json
//! {
//!   "index_name": "person-idx",
//!   "fields": {
//!     "age":  { "kind": "numeric", "value_type": "int" },
//!     "name": { "kind": "tag" },
//!     "bio":  { "kind": "text", "searchable": true }
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Declared classification of an indexed field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Exact-match tokens (`@field:{value}`)
    Tag,
    /// Full-text field (`@field:"value"`)
    Text,
    /// Numeric ranges (`@field:[lo hi]`)
    Numeric,
    /// Longitude/latitude pairs
    Geo,
    /// Deferred: NUMERIC for numeric value types, TAG otherwise
    Indexed,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Tag => "TAG",
            FieldKind::Text => "TEXT",
            FieldKind::Numeric => "NUMERIC",
            FieldKind::Geo => "GEO",
            FieldKind::Indexed => "INDEXED",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declared host type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    #[default]
    String,
    Int,
    Float,
    Bool,
    Geo,
    Array,
    Object,
}

impl ValueType {
    /// Returns true for int and float
    pub fn is_numeric(&self) -> bool {
        matches!(self, ValueType::Int | ValueType::Float)
    }
}

fn default_searchable() -> bool {
    true
}

/// Metadata of a single field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMetadata {
    /// Declared field kind
    pub kind: FieldKind,
    /// Declared host type (only consulted for INDEXED fields)
    #[serde(default)]
    pub value_type: ValueType,
    /// Whether predicates may reference this field
    #[serde(default = "default_searchable")]
    pub searchable: bool,
}

impl FieldMetadata {
    pub fn new(kind: FieldKind, value_type: ValueType) -> Self {
        Self {
            kind,
            value_type,
            searchable: true,
        }
    }

    pub fn tag() -> Self {
        Self::new(FieldKind::Tag, ValueType::String)
    }

    pub fn text() -> Self {
        Self::new(FieldKind::Text, ValueType::String)
    }

    pub fn numeric() -> Self {
        Self::new(FieldKind::Numeric, ValueType::Float)
    }

    pub fn geo() -> Self {
        Self::new(FieldKind::Geo, ValueType::Geo)
    }

    /// INDEXED field whose concrete kind depends on `value_type`
    pub fn indexed(value_type: ValueType) -> Self {
        Self::new(FieldKind::Indexed, value_type)
    }

    /// Marks the field as stored but not searchable
    pub fn not_searchable(mut self) -> Self {
        self.searchable = false;
        self
    }

    /// Concrete kind with INDEXED resolved
    pub fn resolved_kind(&self) -> FieldKind {
        match self.kind {
            FieldKind::Indexed if self.value_type.is_numeric() => FieldKind::Numeric,
            FieldKind::Indexed => FieldKind::Tag,
            kind => kind,
        }
    }
}

/// Read-only metadata source consulted by the compilers
pub trait FieldMetadataProvider {
    /// Index the compiled query targets, if the type declares one
    fn index_name(&self) -> Option<&str>;

    /// Metadata for `field`, if it is mapped
    fn field(&self, field: &str) -> Option<FieldMetadata>;
}

/// In-memory metadata for one indexed type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexSchema {
    /// Index name; `None` models a type without an index declaration
    #[serde(default)]
    pub index_name: Option<String>,
    /// Field metadata keyed by field name
    #[serde(default)]
    pub fields: BTreeMap<String, FieldMetadata>,
}

impl IndexSchema {
    /// Schema for the named index with no fields yet
    pub fn new(index_name: impl Into<String>) -> Self {
        Self {
            index_name: Some(index_name.into()),
            fields: BTreeMap::new(),
        }
    }

    /// Schema for a type that declares no index
    pub fn undeclared() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a field mapping
    pub fn with_field(mut self, name: impl Into<String>, metadata: FieldMetadata) -> Self {
        self.fields.insert(name.into(), metadata);
        self
    }

    /// Structural checks performed after loading
    pub fn validate_structure(&self) -> Result<(), String> {
        if let Some(name) = &self.index_name {
            if name.trim().is_empty() {
                return Err("index_name must not be empty".into());
            }
        }
        if let Some(field) = self.fields.keys().find(|k| k.trim().is_empty()) {
            return Err(format!("Invalid field name '{}'", field));
        }
        Ok(())
    }
}

impl FieldMetadataProvider for IndexSchema {
    fn index_name(&self) -> Option<&str> {
        self.index_name.as_deref()
    }

    fn field(&self, field: &str) -> Option<FieldMetadata> {
        self.fields.get(field).copied()
    }
}
