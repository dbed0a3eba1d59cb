//! Compiled descriptors
//!
//! Both descriptors are built fresh per compile call and never mutated once
//! returned. They serialize to JSON for the CLI and to engine argument
//! vectors through `to_args` (see `args.rs`).

use std::fmt;

use serde::Serialize;
use serde_json::Number;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Sort key
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortBy {
    pub field: String,
    pub direction: SortDirection,
}

impl SortBy {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// Result window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Limit {
    pub offset: u64,
    pub count: u64,
}

/// Distance unit of a geo radius
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GeoUnit {
    #[serde(rename = "m")]
    Meters,
    #[serde(rename = "km")]
    Kilometers,
    #[serde(rename = "mi")]
    Miles,
    #[serde(rename = "ft")]
    Feet,
}

impl GeoUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            GeoUnit::Meters => "m",
            GeoUnit::Kilometers => "km",
            GeoUnit::Miles => "mi",
            GeoUnit::Feet => "ft",
        }
    }

    /// Parses short (`km`) or long (`kilometers`) unit names
    pub fn parse(unit: &str) -> Option<Self> {
        match unit.to_ascii_lowercase().as_str() {
            "m" | "meter" | "meters" => Some(GeoUnit::Meters),
            "km" | "kilometer" | "kilometers" => Some(GeoUnit::Kilometers),
            "mi" | "mile" | "miles" => Some(GeoUnit::Miles),
            "ft" | "foot" | "feet" => Some(GeoUnit::Feet),
            _ => None,
        }
    }
}

/// Radius filter around a point
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoFilter {
    pub field: String,
    pub longitude: f64,
    pub latitude: f64,
    pub radius: f64,
    pub unit: GeoUnit,
}

/// Compiled search query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryDescriptor {
    pub index_name: String,
    /// Search-grammar query; `*` when no filter stage was present
    pub query_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<SortBy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_fields: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<Limit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geo_filter: Option<GeoFilter>,
}

/// Reduce functions understood by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReduceFunction {
    Count,
    CountDistinct,
    CountDistinctish,
    Sum,
    Min,
    Max,
    Avg,
    Stddev,
    Quantile,
    Tolist,
    FirstValue,
    RandomSample,
}

impl ReduceFunction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReduceFunction::Count => "COUNT",
            ReduceFunction::CountDistinct => "COUNT_DISTINCT",
            ReduceFunction::CountDistinctish => "COUNT_DISTINCTISH",
            ReduceFunction::Sum => "SUM",
            ReduceFunction::Min => "MIN",
            ReduceFunction::Max => "MAX",
            ReduceFunction::Avg => "AVG",
            ReduceFunction::Stddev => "STDDEV",
            ReduceFunction::Quantile => "QUANTILE",
            ReduceFunction::Tolist => "TOLIST",
            ReduceFunction::FirstValue => "FIRST_VALUE",
            ReduceFunction::RandomSample => "RANDOM_SAMPLE",
        }
    }
}

impl fmt::Display for ReduceFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Arguments of a reduction
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "arity", rename_all = "snake_case")]
pub enum ReductionArgs {
    /// COUNT
    Zero,
    /// Field-only reductions (SUM, AVG, ...)
    One { field: String },
    /// Field plus numeric parameter (QUANTILE, RANDOM_SAMPLE)
    Two { field: String, parameter: Number },
    /// FIRST_VALUE with optional BY clause
    FirstValue {
        field: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        sort_by: Option<SortBy>,
    },
}

impl ReductionArgs {
    /// Returns the target field, if any
    pub fn field(&self) -> Option<&str> {
        match self {
            ReductionArgs::Zero => None,
            ReductionArgs::One { field }
            | ReductionArgs::Two { field, .. }
            | ReductionArgs::FirstValue { field, .. } => Some(field),
        }
    }
}

/// A reduce step inside a group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reduction {
    pub function: ReduceFunction,
    pub args: ReductionArgs,
    /// Output property name
    pub alias: String,
}

impl Reduction {
    /// Builds a reduction with the default alias (`<field>_<FUNCTION>`,
    /// or the bare function name when there is no field)
    pub fn new(function: ReduceFunction, args: ReductionArgs) -> Self {
        let alias = match args.field() {
            Some(field) => format!("{}_{}", field, function.as_str()),
            None => function.as_str().to_string(),
        };
        Self {
            function,
            args,
            alias,
        }
    }

    /// Returns true for field-only reductions
    pub fn is_single_argument(&self) -> bool {
        matches!(self.args, ReductionArgs::One { .. })
    }
}

/// One step of an aggregation pipeline
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum PipelineStage {
    GroupBy { fields: Vec<String> },
    Reduction(Reduction),
    SortBy(SortBy),
    Apply { expr: String, alias: String },
    Filter { expr: String },
}

/// Compiled aggregation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregationDescriptor {
    pub index_name: String,
    /// Search-grammar query narrowing the rows entering the pipeline
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_predicate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<Limit>,
    /// Stages in engine execution order
    pub stages: Vec<PipelineStage>,
}
