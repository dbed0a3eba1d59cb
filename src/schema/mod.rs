//! Field metadata boundary for the compiler
//!
//! The compiler never inspects application types. Everything it knows about a
//! field (its declared kind, its host value type, whether it is searchable) and
//! the name of the index a type is stored in comes through a
//! [`FieldMetadataProvider`].
//!
//! # Rules
//!
//! - A field without metadata cannot appear in a predicate
//! - INDEXED fields resolve to NUMERIC or TAG from their declared value type
//! - A type without an index declaration cannot be compiled at all

mod errors;
mod loader;
mod types;

pub use errors::{SchemaError, SchemaResult};
pub use loader::SchemaLoader;
pub use types::{FieldKind, FieldMetadata, FieldMetadataProvider, IndexSchema, ValueType};
