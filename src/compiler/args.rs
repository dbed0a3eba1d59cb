//! Engine argument vectors
//!
//! Serializes descriptors into the argument lists of the search and
//! aggregate commands. The index name is always the first argument and the
//! query text the second.

use std::iter::Peekable;
use std::slice::Iter;

use super::descriptor::{
    AggregationDescriptor, Limit, PipelineStage, QueryDescriptor, Reduction, ReductionArgs,
};

impl QueryDescriptor {
    /// `index query [LIMIT o c] [SORTBY f DIR] [RETURN n f..] [GEOFILTER f lon lat r unit]`
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![self.index_name.clone(), self.query_text.clone()];

        if let Some(limit) = &self.limit {
            push_limit(&mut args, limit);
        }

        if let Some(sort) = &self.sort_by {
            args.push("SORTBY".into());
            args.push(sort.field.clone());
            args.push(sort.direction.as_str().into());
        }

        if let Some(fields) = &self.return_fields {
            args.push("RETURN".into());
            args.push(fields.len().to_string());
            args.extend(fields.iter().cloned());
        }

        if let Some(geo) = &self.geo_filter {
            args.push("GEOFILTER".into());
            args.push(geo.field.clone());
            args.push(geo.longitude.to_string());
            args.push(geo.latitude.to_string());
            args.push(geo.radius.to_string());
            args.push(geo.unit.as_str().into());
        }

        args
    }
}

impl AggregationDescriptor {
    /// `index query stage.. [LIMIT o c]`
    ///
    /// Reductions are attached to a group: the one they follow, or the one
    /// directly after them (the implicit group of a global aggregation).
    /// Reductions with neither emit `GROUPBY 0`. An empty group left without
    /// reductions after its neighbour took them is dropped.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![
            self.index_name.clone(),
            self.query_predicate.clone().unwrap_or_else(|| "*".to_string()),
        ];

        // Set while the last emitted group carries reductions
        let mut reduced = false;

        let mut stages = self.stages.iter().peekable();
        while let Some(stage) = stages.next() {
            match stage {
                PipelineStage::GroupBy { fields } => {
                    let reductions = take_reductions(&mut stages);
                    if fields.is_empty() && reductions.is_empty() && reduced {
                        // implicit group whose reductions the previous group took
                        continue;
                    }
                    push_group(&mut args, fields, &reductions);
                    reduced = !reductions.is_empty();
                    continue;
                }
                PipelineStage::Reduction(first) => {
                    let mut reductions = vec![first];
                    reductions.extend(take_reductions(&mut stages));

                    let group = stages.next_if(|s| matches!(s, PipelineStage::GroupBy { .. }));
                    match group {
                        Some(PipelineStage::GroupBy { fields }) => {
                            reductions.extend(take_reductions(&mut stages));
                            push_group(&mut args, fields, &reductions);
                        }
                        _ => push_group(&mut args, &[], &reductions),
                    }
                    reduced = true;
                    continue;
                }
                PipelineStage::SortBy(sort) => {
                    args.push("SORTBY".into());
                    args.push("2".into());
                    args.push(format!("@{}", sort.field));
                    args.push(sort.direction.as_str().into());
                }
                PipelineStage::Apply { expr, alias } => {
                    args.push("APPLY".into());
                    args.push(expr.clone());
                    args.push("AS".into());
                    args.push(alias.clone());
                }
                PipelineStage::Filter { expr } => {
                    args.push("FILTER".into());
                    args.push(expr.clone());
                }
            }
            reduced = false;
        }

        if let Some(limit) = &self.limit {
            push_limit(&mut args, limit);
        }

        args
    }
}

fn take_reductions<'a>(stages: &mut Peekable<Iter<'a, PipelineStage>>) -> Vec<&'a Reduction> {
    let mut reductions = Vec::new();
    while let Some(PipelineStage::Reduction(reduction)) =
        stages.next_if(|s| matches!(s, PipelineStage::Reduction(_)))
    {
        reductions.push(reduction);
    }
    reductions
}

fn push_group(args: &mut Vec<String>, fields: &[String], reductions: &[&Reduction]) {
    args.push("GROUPBY".into());
    args.push(fields.len().to_string());
    args.extend(fields.iter().map(|f| format!("@{}", f)));

    for reduction in reductions {
        let reduce_args = reduction_args(&reduction.args);
        args.push("REDUCE".into());
        args.push(reduction.function.as_str().into());
        args.push(reduce_args.len().to_string());
        args.extend(reduce_args);
        args.push("AS".into());
        args.push(reduction.alias.clone());
    }
}

fn reduction_args(args: &ReductionArgs) -> Vec<String> {
    match args {
        ReductionArgs::Zero => Vec::new(),
        ReductionArgs::One { field } => vec![format!("@{}", field)],
        ReductionArgs::Two { field, parameter } => vec![format!("@{}", field), parameter.to_string()],
        ReductionArgs::FirstValue { field, sort_by } => {
            let mut out = vec![format!("@{}", field)];
            if let Some(sort) = sort_by {
                out.push("BY".into());
                out.push(format!("@{}", sort.field));
                out.push(sort.direction.as_str().into());
            }
            out
        }
    }
}

fn push_limit(args: &mut Vec<String>, limit: &Limit) {
    args.push("LIMIT".into());
    args.push(limit.offset.to_string());
    args.push(limit.count.to_string());
}
