//! Expression node definitions

use std::fmt;
use std::ops::Not;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Binary operators
///
/// Comparison and logical operators form the filter grammar. Arithmetic
/// operators are only meaningful inside value expressions (apply/filter
/// bodies of an aggregation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = "and", alias = "&&", alias = "AND")]
    And,
    #[serde(rename = "or", alias = "||", alias = "OR")]
    Or,
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Sub,
    #[serde(rename = "*")]
    Mul,
    #[serde(rename = "/")]
    Div,
    #[serde(rename = "%")]
    Mod,
    #[serde(rename = "^")]
    Pow,
}

impl BinaryOp {
    /// Returns true for AND / OR
    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }

    /// Returns true for range comparisons (`>`, `<`, `>=`, `<=`)
    pub fn is_range(&self) -> bool {
        matches!(self, BinaryOp::Gt | BinaryOp::Lt | BinaryOp::Ge | BinaryOp::Le)
    }

    /// Returns true for `==` / `!=`
    pub fn is_equality(&self) -> bool {
        matches!(self, BinaryOp::Eq | BinaryOp::Ne)
    }

    /// Returns true for arithmetic operators
    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            BinaryOp::Add
                | BinaryOp::Sub
                | BinaryOp::Mul
                | BinaryOp::Div
                | BinaryOp::Mod
                | BinaryOp::Pow
        )
    }

    /// Source-level symbol, used in error messages
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Gt => ">",
            BinaryOp::Lt => "<",
            BinaryOp::Ge => ">=",
            BinaryOp::Le => "<=",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::And => "AND",
            BinaryOp::Or => "OR",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Pow => "^",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    /// Logical negation
    Not,
    /// Arithmetic negation
    Negate,
    /// Type conversion in the host language; transparent to the compiler
    Convert,
}

/// A node of the query expression tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Expr {
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    /// Reference to a declared field of the indexed type
    Member { name: String },
    Constant { value: Value },
    /// Method call; stage calls carry the previous stage as first argument
    Call {
        name: String,
        #[serde(default)]
        args: Vec<Expr>,
    },
    Lambda { body: Box<Expr> },
    /// Tuple / anonymous record construction, listing its member names
    New {
        #[serde(default)]
        members: Vec<String>,
    },
}

impl Expr {
    /// Member reference
    pub fn member(name: impl Into<String>) -> Self {
        Expr::Member { name: name.into() }
    }

    /// Constant value
    pub fn constant(value: impl Into<Value>) -> Self {
        Expr::Constant {
            value: value.into(),
        }
    }

    /// Root of a stage chain (the queried collection)
    pub fn source(name: impl Into<String>) -> Self {
        Expr::constant(name.into())
    }

    /// Method call
    pub fn call(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Call {
            name: name.into(),
            args,
        }
    }

    /// Lambda wrapping `body`
    pub fn lambda(body: Expr) -> Self {
        Expr::Lambda {
            body: Box::new(body),
        }
    }

    /// Record construction with the given member names
    pub fn record<I, S>(members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Expr::New {
            members: members.into_iter().map(Into::into).collect(),
        }
    }

    /// Binary node
    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Unary node
    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Expr::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn gt(self, rhs: Expr) -> Self {
        Expr::binary(BinaryOp::Gt, self, rhs)
    }

    pub fn lt(self, rhs: Expr) -> Self {
        Expr::binary(BinaryOp::Lt, self, rhs)
    }

    pub fn ge(self, rhs: Expr) -> Self {
        Expr::binary(BinaryOp::Ge, self, rhs)
    }

    pub fn le(self, rhs: Expr) -> Self {
        Expr::binary(BinaryOp::Le, self, rhs)
    }

    pub fn eq(self, rhs: Expr) -> Self {
        Expr::binary(BinaryOp::Eq, self, rhs)
    }

    pub fn ne(self, rhs: Expr) -> Self {
        Expr::binary(BinaryOp::Ne, self, rhs)
    }

    pub fn and(self, rhs: Expr) -> Self {
        Expr::binary(BinaryOp::And, self, rhs)
    }

    pub fn or(self, rhs: Expr) -> Self {
        Expr::binary(BinaryOp::Or, self, rhs)
    }

    /// Wraps this node in a transparent conversion
    pub fn convert(self) -> Self {
        Expr::unary(UnaryOp::Convert, self)
    }

    /// Chains a stage call onto this node.
    ///
    /// The receiver becomes the first argument of the new call, so the last
    /// chained stage is the outermost node.
    pub fn then(self, stage: impl Into<String>, mut args: Vec<Expr>) -> Self {
        args.insert(0, self);
        Expr::call(stage, args)
    }

    /// Returns true for binary nodes
    pub fn is_binary(&self) -> bool {
        matches!(self, Expr::Binary { .. })
    }

    /// Strips any enclosing lambdas and conversions
    pub fn unwrap_lambda(&self) -> &Expr {
        match self {
            Expr::Lambda { body } => body.unwrap_lambda(),
            Expr::Unary {
                op: UnaryOp::Convert,
                operand,
            } => operand.unwrap_lambda(),
            other => other,
        }
    }

    /// Short name of the node shape, used in error messages
    pub fn shape(&self) -> &'static str {
        match self {
            Expr::Binary { .. } => "binary",
            Expr::Unary { .. } => "unary",
            Expr::Member { .. } => "member",
            Expr::Constant { .. } => "constant",
            Expr::Call { .. } => "call",
            Expr::Lambda { .. } => "lambda",
            Expr::New { .. } => "new",
        }
    }
}

impl Not for Expr {
    type Output = Expr;

    fn not(self) -> Expr {
        Expr::unary(UnaryOp::Not, self)
    }
}

/// Renders a constant the way it appears inside query text.
///
/// Strings are taken verbatim (no JSON quoting), arrays are comma-joined.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(items) => items.iter().map(stringify).collect::<Vec<_>>().join(","),
        Value::Object(_) => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_then_nests_previous_stage_first() {
        let chain = Expr::source("people")
            .then("Where", vec![Expr::lambda(Expr::member("age").gt(Expr::constant(21)))])
            .then("Take", vec![Expr::constant(10)]);

        match &chain {
            Expr::Call { name, args } => {
                assert_eq!(name, "Take");
                assert_eq!(args.len(), 2);
                assert!(matches!(&args[0], Expr::Call { name, .. } if name == "Where"));
            }
            other => panic!("unexpected node {:?}", other),
        }
    }

    #[test]
    fn test_unwrap_lambda_strips_conversions() {
        let expr = Expr::lambda(Expr::member("age").convert());
        assert_eq!(expr.unwrap_lambda(), &Expr::member("age"));
    }

    #[test]
    fn test_not_operator_builds_unary() {
        let expr = !Expr::member("active");
        assert!(matches!(expr, Expr::Unary { op: UnaryOp::Not, .. }));
    }

    #[test]
    fn test_decode_from_tagged_json() {
        let expr: Expr = serde_json::from_value(json!({
            "kind": "binary",
            "op": "&&",
            "left": {
                "kind": "binary",
                "op": ">",
                "left": { "kind": "member", "name": "age" },
                "right": { "kind": "constant", "value": 21 }
            },
            "right": {
                "kind": "call",
                "name": "Contains",
                "args": [
                    { "kind": "member", "name": "name" },
                    { "kind": "constant", "value": "ali" }
                ]
            }
        }))
        .unwrap();

        let expected = Expr::member("age").gt(Expr::constant(21)).and(Expr::call(
            "Contains",
            vec![Expr::member("name"), Expr::constant("ali")],
        ));
        assert_eq!(expr, expected);
    }

    #[test]
    fn test_stringify() {
        assert_eq!(stringify(&json!("abc")), "abc");
        assert_eq!(stringify(&json!(42)), "42");
        assert_eq!(stringify(&json!(2.5)), "2.5");
        assert_eq!(stringify(&json!(true)), "true");
        assert_eq!(stringify(&json!(["a", 1])), "a,1");
    }
}
