//! Field resolution
//!
//! Extracts stable field names from the expression positions where a field
//! is expected: comparison operands, reduction targets, sort keys and
//! group-by key selectors.

use crate::expr::{stringify, Expr};

use super::errors::{CompileError, CompileResult};

/// Resolves a single field name.
///
/// Constants resolve to their stringified value, members to their name,
/// calls to their first constant argument (indexer-style access). Unary
/// nodes and lambdas resolve through to their operand / body.
pub fn resolve_field(expr: &Expr) -> CompileResult<String> {
    match expr {
        Expr::Constant { value } => Ok(stringify(value)),
        Expr::Member { name } => Ok(name.clone()),
        Expr::Call { args, .. } => args
            .iter()
            .find_map(|arg| match arg {
                Expr::Constant { value } => Some(stringify(value)),
                _ => None,
            })
            .ok_or_else(|| CompileError::unresolvable_field("call without constant argument")),
        Expr::Unary { operand, .. } => resolve_field(operand),
        Expr::Lambda { body } => resolve_field(body),
        other => Err(CompileError::unresolvable_field(other.shape())),
    }
}

/// Resolves a one-or-many field selector (group-by keys).
///
/// Record construction yields its member names in declaration order,
/// duplicates preserved; any other shape resolves to a single field.
pub fn resolve_fields(expr: &Expr) -> CompileResult<Vec<String>> {
    match expr {
        Expr::New { members } => Ok(members.clone()),
        Expr::Lambda { body } => resolve_fields(body),
        Expr::Unary { operand, .. } => resolve_fields(operand),
        other => Ok(vec![resolve_field(other)?]),
    }
}
