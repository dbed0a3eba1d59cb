//! Query compiler subsystem for redquery
//!
//! Translates expression trees into search-query strings and aggregation
//! pipeline descriptors for a secondary-index search engine.
//!
//! # Design Principles
//!
//! - Deterministic: same tree and metadata produce the same descriptor
//! - Strict: every unsupported shape fails with a coded error, no partial
//!   result
//! - Stateless: each compile owns its working state; compilers can be
//!   shared across threads
//!
//! # Pipeline
//!
//! 1. Field Resolver (`field.rs`): field names from expression positions
//! 2. Predicate Compiler (`predicate.rs`, `calls.rs`): filters to query text
//! 3. Pipeline Compiler (`pipeline.rs`): aggregation chains to stages
//! 4. Query Assembler (`query.rs`): search chains to query descriptors
//!
//! Descriptors serialize to engine arguments (`args.rs`) and explain text
//! (`explain.rs`).

mod args;
mod calls;
mod chain;
mod config;
mod descriptor;
mod errors;
mod escape;
mod explain;
mod field;
mod pipeline;
mod predicate;
mod query;
mod value;

pub use config::CompilerConfig;
pub use descriptor::{
    AggregationDescriptor, GeoFilter, GeoUnit, Limit, PipelineStage, QueryDescriptor,
    ReduceFunction, Reduction, ReductionArgs, SortBy, SortDirection,
};
pub use errors::{CompileError, CompileErrorCode, CompileResult};
pub use escape::{escape_tag, quote_text};
pub use explain::Explain;
pub use field::{resolve_field, resolve_fields};
pub use pipeline::PipelineCompiler;
pub use predicate::PredicateCompiler;
pub use query::QueryAssembler;
pub use value::compile_value;

use crate::expr::Expr;
use crate::schema::FieldMetadataProvider;

/// Compiles a search chain with default configuration.
pub fn compile_query<P>(expr: &Expr, provider: &P) -> CompileResult<QueryDescriptor>
where
    P: FieldMetadataProvider + ?Sized,
{
    QueryAssembler::new(provider).compile(expr)
}

/// Compiles an aggregation chain with default configuration.
pub fn compile_aggregation<P>(expr: &Expr, provider: &P) -> CompileResult<AggregationDescriptor>
where
    P: FieldMetadataProvider + ?Sized,
{
    PipelineCompiler::new(provider).compile(expr)
}
