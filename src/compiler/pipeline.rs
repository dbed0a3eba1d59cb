//! Pipeline compiler
//!
//! Turns a chain of aggregation-stage calls into an ordered stage list.
//!
//! Calls are processed innermost first (the order the engine executes them)
//! and pushed onto a stage stack. Two rules inspect the top of that stack:
//!
//! - GroupBy on top of a GroupBy merges, the new keys first
//! - A reduction not following a GroupBy or a field-only reduction gets an
//!   empty GroupBy pushed right after it (global aggregation)
//!
//! Stage names outside the table are passed over without failing.

use serde_json::Number;

use crate::expr::Expr;
use crate::observability::{CompileMetrics, Logger, ObservationScope};
use crate::schema::FieldMetadataProvider;

use super::chain::{apply_skip, apply_take, unwind, StageCall};
use super::config::CompilerConfig;
use super::descriptor::{
    AggregationDescriptor, PipelineStage, ReduceFunction, Reduction, ReductionArgs, SortBy,
    SortDirection,
};
use super::errors::{CompileError, CompileResult};
use super::field::{resolve_field, resolve_fields};
use super::predicate::{constant_operand, PredicateCompiler};
use super::value::compile_value;

/// Compiles aggregation chains
pub struct PipelineCompiler<'a, P: FieldMetadataProvider + ?Sized> {
    provider: &'a P,
    config: CompilerConfig,
    metrics: Option<&'a CompileMetrics>,
}

impl<'a, P: FieldMetadataProvider + ?Sized> PipelineCompiler<'a, P> {
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

    /// Compiles the chain whose outermost call is `expr`.
    pub fn compile(&self, expr: &Expr) -> CompileResult<AggregationDescriptor> {
        let Some(index_name) = self.provider.index_name() else {
            self.count(CompileMetrics::increment_compile_failures);
            return Err(CompileError::missing_index_metadata());
        };

        let scope = ObservationScope::with_fields("COMPILE_AGGREGATION", &[("index", index_name)]);
        match self.build(index_name, expr) {
            Ok(descriptor) => {
                scope.complete_with_fields(&[("stages", &descriptor.stages.len().to_string())]);
                self.count(CompileMetrics::increment_aggregations_compiled);
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

    fn build(&self, index_name: &str, expr: &Expr) -> CompileResult<AggregationDescriptor> {
        let calls = unwind(expr);
        let predicates = PredicateCompiler::new(self.provider);
        let innermost = calls.len().saturating_sub(1);

        let mut stack = StageStack::default();
        let mut query_predicate = None;
        let mut limit = None;

        for (position, call) in calls.iter().enumerate().rev() {
            match call.name {
                "Where" if position == innermost => {
                    query_predicate = Some(predicates.compile(call.arg(0)?)?);
                }
                "Where" | "Filter" => stack.push(PipelineStage::Filter {
                    expr: compile_value(call.arg(0)?.unwrap_lambda())?,
                }),
                "First" | "FirstOrDefault" => apply_take(&mut limit, 1, &self.config),
                "Take" => apply_take(&mut limit, call.count_arg(0)?, &self.config),
                "Skip" => apply_skip(&mut limit, call.count_arg(0)?, &self.config),
                "Count" | "LongCount" => {
                    stack.push_reduction(Reduction::new(ReduceFunction::Count, ReductionArgs::Zero))
                }
                "Quantile" => stack.push_reduction(two_arg_reduction(call, ReduceFunction::Quantile)?),
                "RandomSample" => {
                    stack.push_reduction(two_arg_reduction(call, ReduceFunction::RandomSample)?)
                }
                "FirstValue" => stack.push_reduction(first_value(call)?),
                "OrderBy" => stack.push(PipelineStage::SortBy(SortBy::asc(resolve_field(
                    call.arg(0)?,
                )?))),
                "OrderByDescending" => stack.push(PipelineStage::SortBy(SortBy::desc(
                    resolve_field(call.arg(0)?)?,
                ))),
                "GroupBy" => stack.push_group_by(resolve_fields(call.arg(0)?)?),
                "Apply" => stack.push(PipelineStage::Apply {
                    expr: compile_value(call.arg(0)?.unwrap_lambda())?,
                    alias: resolve_field(call.arg(1)?)?,
                }),
                name => match single_argument_function(name) {
                    Some(function) => stack.push_reduction(Reduction::new(
                        function,
                        ReductionArgs::One {
                            field: resolve_field(call.arg(0)?)?,
                        },
                    )),
                    None => {
                        Logger::trace("PIPELINE_STAGE_SKIPPED", &[("stage", name)]);
                        self.count(CompileMetrics::increment_stages_skipped);
                    }
                },
            }
        }

        Ok(AggregationDescriptor {
            index_name: index_name.to_string(),
            query_predicate,
            limit,
            stages: stack.into_stages(),
        })
    }
}

fn single_argument_function(name: &str) -> Option<ReduceFunction> {
    match name {
        "Average" => Some(ReduceFunction::Avg),
        "StandardDeviation" => Some(ReduceFunction::Stddev),
        "Sum" => Some(ReduceFunction::Sum),
        "Min" => Some(ReduceFunction::Min),
        "Max" => Some(ReduceFunction::Max),
        "CountDistinct" => Some(ReduceFunction::CountDistinct),
        "CountDistinctish" => Some(ReduceFunction::CountDistinctish),
        "Distinct" => Some(ReduceFunction::Tolist),
        _ => None,
    }
}

/// QUANTILE (field, 0..=1) or RANDOM_SAMPLE (field, size)
fn two_arg_reduction(call: &StageCall<'_>, function: ReduceFunction) -> CompileResult<Reduction> {
    let field = resolve_field(call.arg(0)?)?;
    let parameter = match constant_operand(call.arg(1)?)? {
        serde_json::Value::Number(n) => n.clone(),
        _ => return Err(CompileError::invalid_argument(call.name, "expected a number")),
    };
    check_parameter(call.name, function, &parameter)?;

    Ok(Reduction::new(function, ReductionArgs::Two { field, parameter }))
}

fn check_parameter(stage: &str, function: ReduceFunction, parameter: &Number) -> CompileResult<()> {
    match function {
        ReduceFunction::Quantile => match parameter.as_f64() {
            Some(q) if (0.0..=1.0).contains(&q) => Ok(()),
            _ => Err(CompileError::invalid_argument(stage, "quantile must be within [0, 1]")),
        },
        _ => match parameter.as_u64() {
            Some(n) if n > 0 => Ok(()),
            _ => Err(CompileError::invalid_argument(stage, "sample size must be a positive integer")),
        },
    }
}

/// FIRST_VALUE (field [, sort field [, direction]])
///
/// Direction is `"asc"` / `"desc"` or a boolean meaning descending.
fn first_value(call: &StageCall<'_>) -> CompileResult<Reduction> {
    let field = resolve_field(call.arg(0)?)?;

    let sort_by = match call.args.get(1) {
        None => None,
        Some(sort_field) => {
            let direction = match call.args.get(2).map(constant_operand).transpose()? {
                None => SortDirection::Asc,
                Some(serde_json::Value::Bool(true)) => SortDirection::Desc,
                Some(serde_json::Value::Bool(false)) => SortDirection::Asc,
                Some(serde_json::Value::String(s)) if s.eq_ignore_ascii_case("desc") => {
                    SortDirection::Desc
                }
                Some(serde_json::Value::String(s)) if s.eq_ignore_ascii_case("asc") => {
                    SortDirection::Asc
                }
                Some(other) => {
                    return Err(CompileError::invalid_argument(
                        call.name,
                        format!("unknown sort direction {}", other),
                    ))
                }
            };
            Some(SortBy {
                field: resolve_field(sort_field)?,
                direction,
            })
        }
    };

    Ok(Reduction::new(
        ReduceFunction::FirstValue,
        ReductionArgs::FirstValue { field, sort_by },
    ))
}

/// Stage stack in engine execution order
#[derive(Debug, Default)]
struct StageStack {
    stages: Vec<PipelineStage>,
}

impl StageStack {
    fn peek(&self) -> Option<&PipelineStage> {
        self.stages.last()
    }

    fn pop(&mut self) -> Option<PipelineStage> {
        self.stages.pop()
    }

    fn push(&mut self, stage: PipelineStage) {
        self.stages.push(stage);
    }

    /// Pushes a group, coalescing with a group already on top.
    fn push_group_by(&mut self, fields: Vec<String>) {
        match self.pop() {
            Some(PipelineStage::GroupBy { fields: existing }) => {
                let mut merged = fields;
                merged.extend(existing);
                self.push(PipelineStage::GroupBy { fields: merged });
            }
            Some(other) => {
                self.push(other);
                self.push(PipelineStage::GroupBy { fields });
            }
            None => self.push(PipelineStage::GroupBy { fields }),
        }
    }

    /// Pushes a reduction, adding the implicit global group when needed.
    fn push_reduction(&mut self, reduction: Reduction) {
        let grouped = match self.peek() {
            Some(PipelineStage::GroupBy { .. }) => true,
            Some(PipelineStage::Reduction(previous)) => previous.is_single_argument(),
            _ => false,
        };

        self.push(PipelineStage::Reduction(reduction));
        if !grouped {
            self.push(PipelineStage::GroupBy { fields: Vec::new() });
        }
    }

    fn into_stages(self) -> Vec<PipelineStage> {
        self.stages
    }
}
