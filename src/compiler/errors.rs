//! Compile error types
//!
//! Error codes:
//! - RQ_MISSING_INDEX_METADATA
//! - RQ_UNRESOLVABLE_FIELD_REFERENCE
//! - RQ_FIELD_NOT_SEARCHABLE
//! - RQ_UNSUPPORTED_FIELD_KIND_FOR_EQUALITY
//! - RQ_UNSUPPORTED_FIELD_KIND_FOR_RANGE
//! - RQ_INVALID_FILTER_SHAPE
//! - RQ_UNSUPPORTED_OPERATOR
//! - RQ_UNKNOWN_SEPARATOR
//! - RQ_INVALID_ARGUMENT
//!
//! Every compile failure is synchronous and deterministic: the same tree
//! fails the same way on every attempt. No partial descriptor is returned.

use std::fmt;

use crate::schema::FieldKind;

/// Compile error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileErrorCode {
    /// Target type carries no index declaration
    MissingIndexMetadata,
    /// A field-name position holds a shape no resolution rule covers
    UnresolvableFieldReference,
    /// Field has no metadata or is not searchable
    FieldNotSearchable,
    /// Field kind does not support equality-style predicates
    UnsupportedFieldKindForEquality,
    /// Field kind does not support range comparisons
    UnsupportedFieldKindForRange,
    /// Comparison is not rooted at a field reference
    InvalidFilterShape,
    /// Operator, call or stage outside the supported grammar
    UnsupportedOperator,
    /// Binary operator in a logical-combination position
    UnknownSeparator,
    /// Recognised stage or call with an argument of the wrong shape
    InvalidArgument,
}

impl CompileErrorCode {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            CompileErrorCode::MissingIndexMetadata => "RQ_MISSING_INDEX_METADATA",
            CompileErrorCode::UnresolvableFieldReference => "RQ_UNRESOLVABLE_FIELD_REFERENCE",
            CompileErrorCode::FieldNotSearchable => "RQ_FIELD_NOT_SEARCHABLE",
            CompileErrorCode::UnsupportedFieldKindForEquality => {
                "RQ_UNSUPPORTED_FIELD_KIND_FOR_EQUALITY"
            }
            CompileErrorCode::UnsupportedFieldKindForRange => "RQ_UNSUPPORTED_FIELD_KIND_FOR_RANGE",
            CompileErrorCode::InvalidFilterShape => "RQ_INVALID_FILTER_SHAPE",
            CompileErrorCode::UnsupportedOperator => "RQ_UNSUPPORTED_OPERATOR",
            CompileErrorCode::UnknownSeparator => "RQ_UNKNOWN_SEPARATOR",
            CompileErrorCode::InvalidArgument => "RQ_INVALID_ARGUMENT",
        }
    }
}

impl fmt::Display for CompileErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Compile error with full context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileError {
    code: CompileErrorCode,
    message: String,
    field: Option<String>,
}

impl CompileError {
    fn new(code: CompileErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            field: None,
        }
    }

    fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Type has no index declaration
    pub fn missing_index_metadata() -> Self {
        Self::new(
            CompileErrorCode::MissingIndexMetadata,
            "Target type does not declare an index",
        )
    }

    /// Field position holds an unsupported shape
    pub fn unresolvable_field(shape: &str) -> Self {
        Self::new(
            CompileErrorCode::UnresolvableFieldReference,
            format!("Cannot resolve a field name from a {} node", shape),
        )
    }

    /// Field has no metadata or is not searchable
    pub fn field_not_searchable(field: impl Into<String>) -> Self {
        let f = field.into();
        Self::new(
            CompileErrorCode::FieldNotSearchable,
            format!("Field '{}' is not searchable", f),
        )
        .with_field(f)
    }

    /// Field kind forbids an equality-style predicate
    pub fn unsupported_kind_for_equality(
        field: impl Into<String>,
        kind: FieldKind,
        predicate: &str,
    ) -> Self {
        let f = field.into();
        Self::new(
            CompileErrorCode::UnsupportedFieldKindForEquality,
            format!("Field '{}' of kind {} does not support {}", f, kind, predicate),
        )
        .with_field(f)
    }

    /// Field kind forbids a range comparison
    pub fn unsupported_kind_for_range(field: impl Into<String>, kind: FieldKind) -> Self {
        let f = field.into();
        Self::new(
            CompileErrorCode::UnsupportedFieldKindForRange,
            format!("Field '{}' of kind {} does not support range comparisons", f, kind),
        )
        .with_field(f)
    }

    /// Comparison not rooted at a field
    pub fn invalid_filter_shape(reason: impl Into<String>) -> Self {
        Self::new(CompileErrorCode::InvalidFilterShape, reason)
    }

    /// Operator, call or stage outside the grammar
    pub fn unsupported_operator(operator: impl Into<String>) -> Self {
        Self::new(
            CompileErrorCode::UnsupportedOperator,
            format!("Unsupported operator '{}'", operator.into()),
        )
    }

    /// Non-logical operator where AND / OR was expected
    pub fn unknown_separator(operator: impl Into<String>) -> Self {
        Self::new(
            CompileErrorCode::UnknownSeparator,
            format!("Operator '{}' cannot combine predicates", operator.into()),
        )
    }

    /// Argument of the wrong shape
    pub fn invalid_argument(context: &str, reason: impl Into<String>) -> Self {
        Self::new(
            CompileErrorCode::InvalidArgument,
            format!("{}: {}", context, reason.into()),
        )
    }

    /// Returns the error code
    pub fn code(&self) -> CompileErrorCode {
        self.code
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the field name if applicable
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CompileError {}

/// Result type for compile operations
pub type CompileResult<T> = Result<T, CompileError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            CompileErrorCode::MissingIndexMetadata.code(),
            "RQ_MISSING_INDEX_METADATA"
        );
        assert_eq!(
            CompileErrorCode::UnknownSeparator.code(),
            "RQ_UNKNOWN_SEPARATOR"
        );
        assert_eq!(
            CompileErrorCode::UnsupportedFieldKindForEquality.code(),
            "RQ_UNSUPPORTED_FIELD_KIND_FOR_EQUALITY"
        );
    }

    #[test]
    fn test_field_errors_carry_field() {
        let err = CompileError::field_not_searchable("age");
        assert_eq!(err.code(), CompileErrorCode::FieldNotSearchable);
        assert_eq!(err.field(), Some("age"));

        let err = CompileError::unsupported_kind_for_equality("loc", FieldKind::Geo, "equality");
        assert_eq!(err.field(), Some("loc"));
        assert!(err.message().contains("GEO"));
    }

    #[test]
    fn test_error_display() {
        let err = CompileError::unsupported_operator("Frobnicate");
        let display = format!("{}", err);
        assert!(display.starts_with("RQ_UNSUPPORTED_OPERATOR"));
        assert!(display.contains("Frobnicate"));
    }
}
