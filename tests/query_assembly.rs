//! Query Assembly Tests
//!
//! Search chains compiled through the public API:
//! - Filters, sorts, projections and windows
//! - Limit merging independent of call order
//! - Strict rejection of unknown stages

use redquery::compiler::{
    compile_query, CompileErrorCode, CompilerConfig, GeoUnit, Limit, QueryAssembler, SortBy,
};
use redquery::expr::Expr;
use redquery::schema::{FieldMetadata, IndexSchema};
use serde_json::json;

// =============================================================================
// Helper Functions
// =============================================================================

fn person_schema() -> IndexSchema {
    IndexSchema::new("person-idx")
        .with_field("name", FieldMetadata::text())
        .with_field("city", FieldMetadata::tag())
        .with_field("age", FieldMetadata::numeric())
        .with_field("home", FieldMetadata::geo())
}

fn people() -> Expr {
    Expr::source("people")
}

fn field(name: &str) -> Expr {
    Expr::lambda(Expr::member(name))
}

// =============================================================================
// Descriptor Shape
// =============================================================================

/// A chain without `Where` matches everything.
#[test]
fn test_no_where_is_wildcard() {
    let chain = people().then("OrderBy", vec![field("age")]);
    let descriptor = compile_query(&chain, &person_schema()).unwrap();
    assert_eq!(descriptor.query_text, "*");
    assert_eq!(descriptor.sort_by, Some(SortBy::asc("age")));
}

/// Filter, sort, projection and window together.
#[test]
fn test_full_search_chain() {
    let chain = people()
        .then(
            "Where",
            vec![Expr::lambda(
                Expr::member("age")
                    .ge(Expr::constant(18))
                    .and(Expr::member("city").eq(Expr::constant("Oslo"))),
            )],
        )
        .then("OrderByDescending", vec![field("age")])
        .then("Select", vec![Expr::lambda(Expr::record(["name", "age"]))])
        .then("Skip", vec![Expr::constant(40)])
        .then("Take", vec![Expr::constant(20)]);

    let descriptor = compile_query(&chain, &person_schema()).unwrap();

    assert_eq!(descriptor.index_name, "person-idx");
    assert_eq!(descriptor.query_text, "(@age:[18 inf] @city:{Oslo})");
    assert_eq!(descriptor.sort_by, Some(SortBy::desc("age")));
    assert_eq!(
        descriptor.return_fields,
        Some(vec!["name".to_string(), "age".to_string()])
    );
    assert_eq!(descriptor.limit, Some(Limit { offset: 40, count: 20 }));
    assert!(descriptor.geo_filter.is_none());
}

/// `Take` and `Skip` merge to the same window in either order.
#[test]
fn test_limit_independent_of_order() {
    let skip_then_take = people()
        .then("Skip", vec![Expr::constant(7)])
        .then("Take", vec![Expr::constant(3)]);
    let take_then_skip = people()
        .then("Take", vec![Expr::constant(3)])
        .then("Skip", vec![Expr::constant(7)]);

    let expected = Some(Limit { offset: 7, count: 3 });
    assert_eq!(
        compile_query(&skip_then_take, &person_schema()).unwrap().limit,
        expected
    );
    assert_eq!(
        compile_query(&take_then_skip, &person_schema()).unwrap().limit,
        expected
    );
}

/// Several `Where` calls conjoin in the order they were chained.
#[test]
fn test_where_calls_conjoin() {
    let chain = people()
        .then("Where", vec![Expr::lambda(Expr::member("age").lt(Expr::constant(30)))])
        .then("Where", vec![Expr::lambda(Expr::member("city").ne(Expr::constant("Rome")))]);

    let descriptor = compile_query(&chain, &person_schema()).unwrap();
    assert_eq!(
        descriptor.query_text,
        "((@age:[-inf (30]) (-@city:{Rome}))"
    );
}

/// `FirstOrDefault` with a predicate narrows the query and the window.
#[test]
fn test_first_or_default_with_predicate() {
    let chain = people().then(
        "FirstOrDefault",
        vec![Expr::lambda(Expr::call(
            "StartsWith",
            vec![Expr::member("name"), Expr::constant("Ann")],
        ))],
    );

    let descriptor = compile_query(&chain, &person_schema()).unwrap();
    assert_eq!(descriptor.query_text, "@name:Ann*");
    assert_eq!(descriptor.limit, Some(Limit { offset: 0, count: 1 }));
}

/// Single-row stages cap an earlier `Take` and keep its offset.
#[test]
fn test_single_row_stage_caps_earlier_take() {
    let chain = people()
        .then("Take", vec![Expr::constant(10)])
        .then("First", vec![]);
    assert_eq!(
        compile_query(&chain, &person_schema()).unwrap().limit,
        Some(Limit { offset: 0, count: 1 })
    );

    let chain = people()
        .then("Skip", vec![Expr::constant(5)])
        .then("Take", vec![Expr::constant(10)])
        .then("Any", vec![]);
    assert_eq!(
        compile_query(&chain, &person_schema()).unwrap().limit,
        Some(Limit { offset: 5, count: 1 })
    );
}

/// Geo radius filters land in the descriptor.
#[test]
fn test_geo_filter() {
    let chain = people().then(
        "GeoFilter",
        vec![
            field("home"),
            Expr::constant(10.75),
            Expr::constant(59.91),
            Expr::constant(2),
            Expr::constant("km"),
        ],
    );

    let geo = compile_query(&chain, &person_schema())
        .unwrap()
        .geo_filter
        .unwrap();
    assert_eq!(geo.field, "home");
    assert_eq!(geo.longitude, 10.75);
    assert_eq!(geo.latitude, 59.91);
    assert_eq!(geo.unit, GeoUnit::Kilometers);
}

/// Descriptors serialize without absent options.
#[test]
fn test_descriptor_serialization() {
    let chain = people().then("Take", vec![Expr::constant(5)]);
    let descriptor = compile_query(&chain, &person_schema()).unwrap();

    assert_eq!(
        serde_json::to_value(&descriptor).unwrap(),
        json!({
            "index_name": "person-idx",
            "query_text": "*",
            "limit": {"offset": 0, "count": 5}
        })
    );
}

/// Configured defaults fill in partial windows.
#[test]
fn test_configured_defaults() {
    let schema = person_schema();
    let config = CompilerConfig {
        default_page_size: 50,
        default_offset: 10,
    };
    let assembler = QueryAssembler::new(&schema).with_config(config);

    let take = assembler
        .compile(&people().then("Take", vec![Expr::constant(5)]))
        .unwrap();
    assert_eq!(take.limit, Some(Limit { offset: 10, count: 5 }));

    let skip = assembler
        .compile(&people().then("Skip", vec![Expr::constant(5)]))
        .unwrap();
    assert_eq!(skip.limit, Some(Limit { offset: 5, count: 50 }));
}

// =============================================================================
// Failures
// =============================================================================

/// Unknown query stages fail the compile.
#[test]
fn test_unknown_stage_rejected() {
    let chain = people().then("Distinct", vec![]);
    let err = compile_query(&chain, &person_schema()).unwrap_err();
    assert_eq!(err.code(), CompileErrorCode::UnsupportedOperator);
}

/// A non-integer `Take` is an invalid argument.
#[test]
fn test_take_requires_integer() {
    let chain = people().then("Take", vec![Expr::constant("ten")]);
    let err = compile_query(&chain, &person_schema()).unwrap_err();
    assert_eq!(err.code(), CompileErrorCode::InvalidArgument);
}

/// Sorting by a computed expression cannot be resolved to a field.
#[test]
fn test_unresolvable_sort_key() {
    let chain = people().then(
        "OrderBy",
        vec![Expr::lambda(Expr::member("age").gt(Expr::constant(1)))],
    );
    let err = compile_query(&chain, &person_schema()).unwrap_err();
    assert_eq!(err.code(), CompileErrorCode::UnresolvableFieldReference);
}
