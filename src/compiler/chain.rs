//! Stage-chain unwinding shared by both compilers
//!
//! A builder chain `source.Where(..).Take(10)` arrives as nested calls with
//! the last-chained stage outermost:
//!
//! ```text
//! Take(Where(source, ..), 10)
//! ```
//!
//! Unwinding follows each call's first argument while it is itself a call
//! and yields the stages outermost first.

use crate::expr::Expr;

use super::config::CompilerConfig;
use super::descriptor::Limit;
use super::errors::{CompileError, CompileResult};
use super::predicate::constant_operand;

/// One stage call with the previous-stage argument stripped
#[derive(Debug, Clone, Copy)]
pub struct StageCall<'e> {
    pub name: &'e str,
    pub args: &'e [Expr],
}

impl<'e> StageCall<'e> {
    /// The `index`-th stage argument
    pub fn arg(&self, index: usize) -> CompileResult<&'e Expr> {
        self.args.get(index).ok_or_else(|| {
            CompileError::invalid_argument(self.name, format!("missing argument {}", index + 1))
        })
    }

    /// Non-negative integer stage argument (`Take(10)`)
    pub fn count_arg(&self, index: usize) -> CompileResult<u64> {
        constant_operand(self.arg(index)?)?
            .as_u64()
            .ok_or_else(|| CompileError::invalid_argument(self.name, "expected a non-negative integer"))
    }
}

/// Collects the stage calls of a chain, outermost first.
pub fn unwind(expr: &Expr) -> Vec<StageCall<'_>> {
    let mut calls = Vec::new();
    let mut current = expr;

    while let Expr::Call { name, args } = current {
        calls.push(StageCall {
            name: name.as_str(),
            args: args.get(1..).unwrap_or(&[]),
        });
        match args.first() {
            Some(previous @ Expr::Call { .. }) => current = previous,
            _ => break,
        }
    }

    calls
}

/// Sets the count of the limit, creating it on first use.
pub fn apply_take(limit: &mut Option<Limit>, count: u64, config: &CompilerConfig) {
    match limit {
        Some(existing) => existing.count = count,
        None => {
            *limit = Some(Limit {
                offset: config.default_offset,
                count,
            })
        }
    }
}

/// Sets the offset of the limit, creating it on first use.
pub fn apply_skip(limit: &mut Option<Limit>, offset: u64, config: &CompilerConfig) {
    match limit {
        Some(existing) => existing.offset = offset,
        None => {
            *limit = Some(Limit {
                offset,
                count: config.default_page_size,
            })
        }
    }
}
