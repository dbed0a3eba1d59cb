//! Predicate Compilation Tests
//!
//! End-to-end checks of filter compilation through the public API:
//! - Leaf grammar per field kind
//! - Logical grouping and negation
//! - Escaping of tag literals
//! - Failure codes for unsupported shapes

use redquery::compiler::{CompileErrorCode, PredicateCompiler};
use redquery::expr::{BinaryOp, Expr};
use redquery::schema::{FieldMetadata, FieldMetadataProvider, IndexSchema, ValueType};
use serde_json::json;

// =============================================================================
// Helper Functions
// =============================================================================

fn person_schema() -> IndexSchema {
    IndexSchema::new("person-idx")
        .with_field("name", FieldMetadata::tag())
        .with_field("bio", FieldMetadata::text())
        .with_field("age", FieldMetadata::numeric())
        .with_field("home", FieldMetadata::geo())
        .with_field("rank", FieldMetadata::indexed(ValueType::Int))
        .with_field("ssn", FieldMetadata::tag().not_searchable())
}

fn compile(expr: Expr) -> Result<String, redquery::compiler::CompileError> {
    let schema = person_schema();
    PredicateCompiler::new(&schema).compile(&expr)
}

fn age() -> Expr {
    Expr::member("age")
}

/// Provider backed by a fixed list, standing in for an attribute layer
struct StaticProvider;

impl FieldMetadataProvider for StaticProvider {
    fn index_name(&self) -> Option<&str> {
        Some("static-idx")
    }

    fn field(&self, field: &str) -> Option<FieldMetadata> {
        match field {
            "color" => Some(FieldMetadata::tag()),
            _ => None,
        }
    }
}

// =============================================================================
// Leaf Grammar
// =============================================================================

/// The documented range example compiles verbatim.
#[test]
fn test_and_of_ranges_example() {
    let expr = age()
        .gt(Expr::constant(21))
        .and(age().lt(Expr::constant(65)));
    assert_eq!(compile(expr).unwrap(), "(@age:[(21 inf] @age:[-inf (65])");
}

/// Single tag comparisons always take the `(@field:{value})` form.
#[test]
fn test_single_tag_comparison_form() {
    for value in ["steve", "Oslo", "x"] {
        let out = compile(Expr::member("name").eq(Expr::constant(value))).unwrap();
        assert_eq!(out, format!("(@name:{{{}}})", value));
    }
}

/// Every reserved character is preceded by exactly one backslash.
#[test]
fn test_tag_reserved_characters_escaped_once() {
    let out = compile(Expr::member("name").eq(Expr::constant("a-b c.d@e"))).unwrap();
    assert_eq!(out, "(@name:{a\\-b\\ c\\.d\\@e})");
    assert!(!out.contains("\\\\"));
}

/// Text fields quote their literal.
#[test]
fn test_text_equality_quoted() {
    let out = compile(Expr::member("bio").eq(Expr::constant("likes \"rust\""))).unwrap();
    assert_eq!(out, "(@bio:\"likes \\\"rust\\\"\")");
}

/// INDEXED int fields compile as numeric ranges.
#[test]
fn test_indexed_numeric_equality() {
    assert_eq!(
        compile(Expr::member("rank").eq(Expr::constant(4))).unwrap(),
        "(@rank:[4 4])"
    );
}

// =============================================================================
// Grouping and Negation
// =============================================================================

/// AND and OR of two leaves.
#[test]
fn test_logical_pairs() {
    let left = || Expr::member("name").eq(Expr::constant("a"));
    let right = || age().ge(Expr::constant(3));

    assert_eq!(compile(left().and(right())).unwrap(), "(@name:{a} @age:[3 inf])");
    assert_eq!(compile(left().or(right())).unwrap(), "(@name:{a} | @age:[3 inf])");
}

/// Negation adds exactly one `-` in front of the un-negated text.
#[test]
fn test_negation_prefix() {
    let cases = vec![
        Expr::member("name").eq(Expr::constant("a")),
        age().gt(Expr::constant(1)).or(age().lt(Expr::constant(0))),
        Expr::call("StartsWith", vec![Expr::member("bio"), Expr::constant("ru")]),
    ];

    for expr in cases {
        let plain = compile(expr.clone()).unwrap();
        let negated = compile(!expr).unwrap();
        assert_eq!(negated, format!("-{}", plain));
    }
}

/// Deeply nested trees group each combination.
#[test]
fn test_nested_combinations() {
    let either = Expr::member("name")
        .eq(Expr::constant("a"))
        .or(Expr::member("name").eq(Expr::constant("b")));
    let expr = age().gt(Expr::constant(18)).and(either);
    assert_eq!(
        compile(expr).unwrap(),
        "(@age:[(18 inf] (@name:{a} | @name:{b}))"
    );
}

/// Membership lists compile per kind.
#[test]
fn test_membership() {
    let expr = Expr::call(
        "Contains",
        vec![Expr::constant(json!(["red", "blue"])), Expr::member("name")],
    );
    assert_eq!(compile(expr).unwrap(), "@name:{red|blue}");
}

/// Compilation is deterministic.
#[test]
fn test_compile_deterministic() {
    let expr = age().gt(Expr::constant(1)).and(Expr::member("bio").eq(Expr::constant("x")));
    let first = compile(expr.clone()).unwrap();
    for _ in 0..50 {
        assert_eq!(compile(expr.clone()).unwrap(), first);
    }
}

/// Any provider implementation can back the compiler.
#[test]
fn test_custom_provider() {
    let compiler = PredicateCompiler::new(&StaticProvider);
    assert_eq!(
        compiler
            .compile(&Expr::member("color").eq(Expr::constant("red")))
            .unwrap(),
        "(@color:{red})"
    );
    assert!(compiler
        .compile(&Expr::member("size").eq(Expr::constant(1)))
        .is_err());
}

// =============================================================================
// Failures
// =============================================================================

/// Each unsupported shape fails with its own code.
#[test]
fn test_failure_codes() {
    let cases: Vec<(Expr, CompileErrorCode)> = vec![
        (
            Expr::member("ssn").eq(Expr::constant("1")),
            CompileErrorCode::FieldNotSearchable,
        ),
        (
            Expr::member("missing").eq(Expr::constant("1")),
            CompileErrorCode::FieldNotSearchable,
        ),
        (
            Expr::member("home").eq(Expr::constant("1,2")),
            CompileErrorCode::UnsupportedFieldKindForEquality,
        ),
        (
            Expr::member("name").lt(Expr::constant("m")),
            CompileErrorCode::UnsupportedFieldKindForRange,
        ),
        (
            Expr::constant(3).eq(age()),
            CompileErrorCode::InvalidFilterShape,
        ),
        (
            Expr::binary(BinaryOp::Add, age(), Expr::constant(1)),
            CompileErrorCode::UnsupportedOperator,
        ),
        (
            Expr::call("Matches", vec![Expr::member("bio"), Expr::constant("x")]),
            CompileErrorCode::UnsupportedOperator,
        ),
        (
            Expr::binary(
                BinaryOp::Add,
                age().gt(Expr::constant(1)),
                age().lt(Expr::constant(2)),
            ),
            CompileErrorCode::UnknownSeparator,
        ),
    ];

    for (expr, code) in cases {
        assert_eq!(compile(expr.clone()).unwrap_err().code(), code, "{:?}", expr);
    }
}
