//! Value expressions for apply and filter stages
//!
//! Aggregation pipelines evaluate their own expression language, distinct
//! from the search grammar: `@field` references, quoted strings, C-style
//! operators and a fixed function library.

use serde_json::Value;

use crate::expr::{BinaryOp, Expr, UnaryOp};

use super::errors::{CompileError, CompileResult};
use super::escape::quote_expression;

/// Compiles a value expression (lambda bodies of `Apply` / `Filter`).
pub fn compile_value(expr: &Expr) -> CompileResult<String> {
    match expr {
        Expr::Member { name } => Ok(format!("@{}", name)),
        Expr::Constant { value } => literal(value),
        Expr::Binary { op, left, right } => Ok(format!(
            "({} {} {})",
            compile_value(left)?,
            operator(*op),
            compile_value(right)?
        )),
        Expr::Unary { op, operand } => match op {
            UnaryOp::Not => Ok(format!("!{}", compile_value(operand)?)),
            UnaryOp::Negate => Ok(format!("-{}", compile_value(operand)?)),
            UnaryOp::Convert => compile_value(operand),
        },
        Expr::Call { name, args } => {
            let function = function_name(name)
                .ok_or_else(|| CompileError::unsupported_operator(name.as_str()))?;
            let args = args
                .iter()
                .map(compile_value)
                .collect::<CompileResult<Vec<_>>>()?;
            Ok(format!("{}({})", function, args.join(",")))
        }
        Expr::Lambda { body } => compile_value(body),
        Expr::New { .. } => Err(CompileError::invalid_filter_shape(
            "Record construction is not a value expression",
        )),
    }
}

fn operator(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::And => "&&",
        BinaryOp::Or => "||",
        other => other.symbol(),
    }
}

fn literal(value: &Value) -> CompileResult<String> {
    match value {
        Value::Number(n) => Ok(n.to_string()),
        Value::String(s) => Ok(quote_expression(s)),
        Value::Bool(true) => Ok("1".to_string()),
        Value::Bool(false) => Ok("0".to_string()),
        other => Err(CompileError::invalid_argument(
            "value expression",
            format!("unsupported literal {}", other),
        )),
    }
}

/// Maps host-style method names and engine names onto engine functions.
fn function_name(name: &str) -> Option<&'static str> {
    let function = match name {
        "ToUpper" | "upper" => "upper",
        "ToLower" | "lower" => "lower",
        "Abs" | "abs" => "abs",
        "Ceiling" | "ceil" => "ceil",
        "Floor" | "floor" => "floor",
        "Sqrt" | "sqrt" => "sqrt",
        "Log" | "log" => "log",
        "Log2" | "log2" => "log2",
        "Exp" | "exp" => "exp",
        "Length" | "strlen" => "strlen",
        "Substring" | "substr" => "substr",
        "Format" | "format" => "format",
        "Contains" | "contains" => "contains",
        "StartsWith" | "startswith" => "startswith",
        "Split" | "split" => "split",
        "FormatTimestamp" | "timefmt" => "timefmt",
        "ParseTime" | "parsetime" => "parsetime",
        "Day" | "day" => "day",
        "Hour" | "hour" => "hour",
        "Minute" | "minute" => "minute",
        "Month" | "month" => "month",
        "DayOfWeek" | "dayofweek" => "dayofweek",
        "DayOfMonth" | "dayofmonth" => "dayofmonth",
        "DayOfYear" | "dayofyear" => "dayofyear",
        "Year" | "year" => "year",
        "MonthOfYear" | "monthofyear" => "monthofyear",
        "GeoDistance" | "geodistance" => "geodistance",
        _ => return None,
    };
    Some(function)
}
