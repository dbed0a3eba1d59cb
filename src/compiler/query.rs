//! Query assembler
//!
//! Walks a search chain outermost first and fills a `QueryDescriptor`:
//!
//! - every `Where` contributes a predicate; several are conjoined in chain
//!   order
//! - the last-chained `OrderBy` / `Select` wins
//! - `Take` / `Skip` / `First` shape the result window
//!
//! Unlike the pipeline compiler, a stage name outside the table fails the
//! whole compile.

use crate::expr::Expr;
use crate::observability::{CompileMetrics, ObservationScope};
use crate::schema::FieldMetadataProvider;

use super::chain::{apply_skip, apply_take, unwind};
use super::config::CompilerConfig;
use super::descriptor::{QueryDescriptor, SortBy};
use super::errors::{CompileError, CompileResult};
use super::field::resolve_field;
use super::predicate::PredicateCompiler;

/// Assembles search queries
pub struct QueryAssembler<'a, P: FieldMetadataProvider + ?Sized> {
    provider: &'a P,
    config: CompilerConfig,
    metrics: Option<&'a CompileMetrics>,
}

impl<'a, P: FieldMetadataProvider + ?Sized> QueryAssembler<'a, P> {
    pub fn new(provider: &'a P) -> Self {
        Self {
            provider,
            config: CompilerConfig::default(),
            metrics: None,
        }
    }

    pub fn with_config(mut self, config: CompilerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_metrics(mut self, metrics: &'a CompileMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Compiles a search chain, or a bare filter lambda, into a descriptor.
    pub fn compile(&self, expr: &Expr) -> CompileResult<QueryDescriptor> {
        let Some(index_name) = self.provider.index_name() else {
            self.count(CompileMetrics::increment_compile_failures);
            return Err(CompileError::missing_index_metadata());
        };

        let scope = ObservationScope::with_fields("COMPILE_QUERY", &[("index", index_name)]);
        match self.build(index_name, expr) {
            Ok(descriptor) => {
                scope.complete_with_fields(&[("query", &descriptor.query_text)]);
                self.count(CompileMetrics::increment_queries_compiled);
                Ok(descriptor)
            }
            Err(err) => {
                scope.fail(err.code().code(), err.message());
                self.count(CompileMetrics::increment_compile_failures);
                Err(err)
            }
        }
    }

    fn count(&self, counter: fn(&CompileMetrics)) {
        if let Some(metrics) = self.metrics {
            counter(metrics);
        }
    }

    fn build(&self, index_name: &str, expr: &Expr) -> CompileResult<QueryDescriptor> {
        let predicates = PredicateCompiler::new(self.provider);

        let mut descriptor = QueryDescriptor {
            index_name: index_name.to_string(),
            query_text: "*".to_string(),
            sort_by: None,
            return_fields: None,
            limit: None,
            geo_filter: None,
        };

        // Collected outermost first
        let mut filters = Vec::new();
        let mut single = false;

        if let Expr::Lambda { body } = expr {
            filters.push(predicates.compile(body)?);
        }

        for call in unwind(expr) {
            match call.name {
                "Where" => filters.push(predicates.compile(call.arg(0)?)?),
                "OrderBy" => {
                    let sort = SortBy::asc(resolve_field(call.arg(0)?)?);
                    descriptor.sort_by.get_or_insert(sort);
                }
                "OrderByDescending" => {
                    let sort = SortBy::desc(resolve_field(call.arg(0)?)?);
                    descriptor.sort_by.get_or_insert(sort);
                }
                "Select" => {
                    let fields = projection(call.arg(0)?)?;
                    descriptor.return_fields.get_or_insert(fields);
                }
                "Take" => apply_take(&mut descriptor.limit, call.count_arg(0)?, &self.config),
                "Skip" => apply_skip(&mut descriptor.limit, call.count_arg(0)?, &self.config),
                "First" | "FirstOrDefault" | "Any" => {
                    single = true;
                    if let Some(predicate) = call.args.first() {
                        filters.push(predicates.compile(predicate)?);
                    }
                }
                "GeoFilter" => {
                    let filter = predicates.geo_filter(call.args)?;
                    descriptor.geo_filter.get_or_insert(filter);
                }
                other => return Err(CompileError::unsupported_operator(other)),
            }
        }

        // Single-row stages win over any inner `Take`
        if single {
            apply_take(&mut descriptor.limit, 1, &self.config);
        }

        filters.reverse();
        descriptor.query_text = match filters.len() {
            0 => "*".to_string(),
            1 => filters.remove(0),
            _ => format!("({})", filters.join(" ")),
        };

        Ok(descriptor)
    }
}

/// Field names returned by a `Select` projection
fn projection(expr: &Expr) -> CompileResult<Vec<String>> {
    match expr.unwrap_lambda() {
        Expr::New { members } => Ok(members.clone()),
        other => Ok(vec![resolve_field(other)?]),
    }
}
