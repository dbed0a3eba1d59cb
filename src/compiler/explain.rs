//! Explain output
//!
//! Produces deterministic, human-readable summaries of compiled descriptors
//! and compile rejections.

use std::fmt;

use super::descriptor::{AggregationDescriptor, PipelineStage, QueryDescriptor, ReductionArgs};
use super::errors::CompileError;

/// Explain output
#[derive(Debug, Clone)]
pub struct Explain {
    /// Whether compilation succeeded
    pub accepted: bool,
    /// `SEARCH` or `AGGREGATE` (if accepted)
    pub command: Option<&'static str>,
    /// Target index (if accepted)
    pub index: Option<String>,
    /// Compiled query text
    pub query: Option<String>,
    /// Sort description
    pub sort: Option<String>,
    /// Returned fields
    pub return_fields: Vec<String>,
    /// Result window as `offset..offset+count`
    pub limit: Option<String>,
    /// Geo radius description
    pub geo_filter: Option<String>,
    /// Pipeline stages in execution order
    pub stages: Vec<String>,
    /// Engine argument vector
    pub args: Vec<String>,
    /// Rejection reason (if rejected)
    pub rejection_reason: Option<String>,
    /// Rejection error code (if rejected)
    pub rejection_code: Option<String>,
    /// Field the rejection refers to
    pub rejection_field: Option<String>,
}

impl Explain {
    fn accepted(command: &'static str, index: &str) -> Self {
        Self {
            accepted: true,
            command: Some(command),
            index: Some(index.to_string()),
            query: None,
            sort: None,
            return_fields: Vec::new(),
            limit: None,
            geo_filter: None,
            stages: Vec::new(),
            args: Vec::new(),
            rejection_reason: None,
            rejection_code: None,
            rejection_field: None,
        }
    }

    /// Creates an explain from a compiled search query
    pub fn from_query(descriptor: &QueryDescriptor) -> Self {
        let mut explain = Self::accepted("SEARCH", &descriptor.index_name);
        explain.query = Some(descriptor.query_text.clone());
        explain.sort = descriptor
            .sort_by
            .as_ref()
            .map(|s| format!("{} {}", s.field, s.direction.as_str()));
        explain.return_fields = descriptor.return_fields.clone().unwrap_or_default();
        explain.limit = descriptor
            .limit
            .map(|l| format!("offset {} count {}", l.offset, l.count));
        explain.geo_filter = descriptor.geo_filter.as_ref().map(|g| {
            format!(
                "{} within {} {} of ({}, {})",
                g.field,
                g.radius,
                g.unit.as_str(),
                g.longitude,
                g.latitude
            )
        });
        explain.args = descriptor.to_args();
        explain
    }

    /// Creates an explain from a compiled aggregation
    pub fn from_aggregation(descriptor: &AggregationDescriptor) -> Self {
        let mut explain = Self::accepted("AGGREGATE", &descriptor.index_name);
        explain.query = Some(
            descriptor
                .query_predicate
                .clone()
                .unwrap_or_else(|| "*".to_string()),
        );
        explain.limit = descriptor
            .limit
            .map(|l| format!("offset {} count {}", l.offset, l.count));
        explain.stages = descriptor.stages.iter().map(describe_stage).collect();
        explain.args = descriptor.to_args();
        explain
    }

    /// Creates an explain from a compile error
    pub fn from_error(err: &CompileError) -> Self {
        Self {
            accepted: false,
            command: None,
            index: None,
            query: None,
            sort: None,
            return_fields: Vec::new(),
            limit: None,
            geo_filter: None,
            stages: Vec::new(),
            args: Vec::new(),
            rejection_reason: Some(err.message().to_string()),
            rejection_code: Some(err.code().code().to_string()),
            rejection_field: err.field().map(str::to_string),
        }
    }
}

fn describe_stage(stage: &PipelineStage) -> String {
    match stage {
        PipelineStage::GroupBy { fields } if fields.is_empty() => "GROUP BY (all rows)".to_string(),
        PipelineStage::GroupBy { fields } => format!("GROUP BY {}", fields.join(", ")),
        PipelineStage::Reduction(r) => {
            let target = match &r.args {
                ReductionArgs::Zero => String::new(),
                ReductionArgs::One { field } => field.clone(),
                ReductionArgs::Two { field, parameter } => format!("{}, {}", field, parameter),
                ReductionArgs::FirstValue { field, sort_by: None } => field.clone(),
                ReductionArgs::FirstValue {
                    field,
                    sort_by: Some(sort),
                } => format!("{} BY {} {}", field, sort.field, sort.direction.as_str()),
            };
            format!("REDUCE {}({}) AS {}", r.function, target, r.alias)
        }
        PipelineStage::SortBy(sort) => format!("SORT BY {} {}", sort.field, sort.direction.as_str()),
        PipelineStage::Apply { expr, alias } => format!("APPLY {} AS {}", expr, alias),
        PipelineStage::Filter { expr } => format!("FILTER {}", expr),
    }
}

impl fmt::Display for Explain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== EXPLAIN ===")?;

        if self.accepted {
            writeln!(f, "Status: ACCEPTED")?;
            if let Some(command) = self.command {
                writeln!(f, "Command: {}", command)?;
            }
            if let Some(index) = &self.index {
                writeln!(f, "Index: {}", index)?;
            }
            if let Some(query) = &self.query {
                writeln!(f, "Query: {}", query)?;
            }
            if !self.stages.is_empty() {
                writeln!(f, "Stages:")?;
                for (i, stage) in self.stages.iter().enumerate() {
                    writeln!(f, "  {}. {}", i + 1, stage)?;
                }
            }
            if let Some(sort) = &self.sort {
                writeln!(f, "Sort: {}", sort)?;
            }
            if !self.return_fields.is_empty() {
                writeln!(f, "Return: {}", self.return_fields.join(", "))?;
            }
            if let Some(geo) = &self.geo_filter {
                writeln!(f, "Geo: {}", geo)?;
            }
            if let Some(limit) = &self.limit {
                writeln!(f, "Limit: {}", limit)?;
            }
            if !self.args.is_empty() {
                writeln!(f, "Args: {}", self.args.join(" "))?;
            }
        } else {
            writeln!(f, "Status: REJECTED")?;
            if let Some(code) = &self.rejection_code {
                writeln!(f, "Error Code: {}", code)?;
            }
            if let Some(field) = &self.rejection_field {
                writeln!(f, "Field: {}", field)?;
            }
            if let Some(reason) = &self.rejection_reason {
                writeln!(f, "Reason: {}", reason)?;
            }
        }

        Ok(())
    }
}
