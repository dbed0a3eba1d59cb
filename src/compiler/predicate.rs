//! Predicate compiler
//!
//! Compiles a boolean expression tree into the search-query grammar:
//!
//! - `(a b)` for AND, `(a | b)` for OR
//! - `-x` for negation
//! - `@f:{tag}`, `@f:"text"`, `@f:[lo hi]` leaves
//!
//! A comparison standing alone is wrapped in parentheses; comparisons that
//! are operands of a logical combination are not, the combination supplies
//! the grouping.

use serde_json::Value;

use crate::expr::{stringify, BinaryOp, Expr, UnaryOp};
use crate::schema::{FieldKind, FieldMetadataProvider};

use super::errors::{CompileError, CompileResult};
use super::escape::{escape_tag, quote_text};
use super::field::resolve_field;

/// Compiles filter trees against field metadata
pub struct PredicateCompiler<'a, P: FieldMetadataProvider + ?Sized> {
    provider: &'a P,
}

impl<'a, P: FieldMetadataProvider + ?Sized> PredicateCompiler<'a, P> {
    pub fn new(provider: &'a P) -> Self {
        Self { provider }
    }

    /// Compiles a filter (optionally wrapped in a lambda) to query text.
    pub fn compile(&self, expr: &Expr) -> CompileResult<String> {
        match expr.unwrap_lambda() {
            Expr::Binary { op, left, right }
                if !op.is_logical() && !left.is_binary() && !right.is_binary() =>
            {
                Ok(format!("({})", self.comparison(*op, left, right)?))
            }
            member @ Expr::Member { .. } => Ok(format!("({})", self.build(member)?)),
            other => self.build(other),
        }
    }

    fn build(&self, expr: &Expr) -> CompileResult<String> {
        match expr {
            Expr::Binary { op, left, right } => {
                if left.is_binary() || right.is_binary() || op.is_logical() {
                    let sep = separator(*op)?;
                    Ok(format!("({}{}{})", self.build(left)?, sep, self.build(right)?))
                } else {
                    self.comparison(*op, left, right)
                }
            }
            Expr::Unary {
                op: UnaryOp::Not,
                operand,
            } => Ok(format!("-{}", self.compile(operand)?)),
            Expr::Unary {
                op: UnaryOp::Convert,
                operand,
            } => self.build(operand),
            Expr::Unary {
                op: UnaryOp::Negate,
                ..
            } => Err(CompileError::unsupported_operator("-")),
            Expr::Call { name, args } => self.translate_call(name, args),
            Expr::Lambda { body } => self.build(body),
            // bare boolean member: `flag` means `flag == true`
            Expr::Member { .. } => {
                self.comparison(BinaryOp::Eq, expr, &Expr::constant(true))
            }
            Expr::Constant { .. } | Expr::New { .. } => Err(CompileError::invalid_filter_shape(
                format!("A {} node is not a predicate", expr.shape()),
            )),
        }
    }

    /// Renders a field-rooted comparison without enclosing parentheses.
    fn comparison(&self, op: BinaryOp, left: &Expr, right: &Expr) -> CompileResult<String> {
        let field = self.field_operand(left)?;
        let value = constant_operand(right)?;
        let kind = self.kind_of(&field)?;

        match op {
            BinaryOp::Gt | BinaryOp::Lt | BinaryOp::Ge | BinaryOp::Le => {
                if kind != FieldKind::Numeric {
                    return Err(CompileError::unsupported_kind_for_range(field, kind));
                }
                let v = numeric_literal(value);
                Ok(match op {
                    BinaryOp::Gt => format!("@{}:[({} inf]", field, v),
                    BinaryOp::Lt => format!("@{}:[-inf ({}]", field, v),
                    BinaryOp::Ge => format!("@{}:[{} inf]", field, v),
                    _ => format!("@{}:[-inf {}]", field, v),
                })
            }
            BinaryOp::Eq | BinaryOp::Ne => {
                let term = self.equality(&field, kind, value)?;
                if op == BinaryOp::Ne {
                    Ok(format!("-{}", term))
                } else {
                    Ok(term)
                }
            }
            other => Err(CompileError::unsupported_operator(other.symbol())),
        }
    }

    /// `@field:...` equality term for the given kind.
    pub(super) fn equality(&self, field: &str, kind: FieldKind, value: &Value) -> CompileResult<String> {
        match kind {
            FieldKind::Tag => Ok(format!("@{}:{{{}}}", field, escape_tag(&stringify(value)))),
            FieldKind::Text => Ok(format!("@{}:{}", field, quote_text(&stringify(value)))),
            FieldKind::Numeric => {
                let v = numeric_literal(value);
                Ok(format!("@{}:[{} {}]", field, v, v))
            }
            other => Err(CompileError::unsupported_kind_for_equality(field, other, "equality")),
        }
    }

    /// Resolves the field on the left of a comparison.
    ///
    /// Constants resolve as field names elsewhere but are never a legal
    /// predicate root.
    pub(super) fn field_operand(&self, expr: &Expr) -> CompileResult<String> {
        match expr {
            Expr::Member { .. } | Expr::Call { .. } => resolve_field(expr),
            Expr::Unary {
                op: UnaryOp::Convert,
                operand,
            } => self.field_operand(operand),
            other => Err(CompileError::invalid_filter_shape(format!(
                "Comparison must be rooted at a field, found a {} node",
                other.shape()
            ))),
        }
    }

    /// Resolved kind of a searchable field.
    pub(super) fn kind_of(&self, field: &str) -> CompileResult<FieldKind> {
        match self.provider.field(field) {
            Some(metadata) if metadata.searchable => Ok(metadata.resolved_kind()),
            _ => Err(CompileError::field_not_searchable(field)),
        }
    }
}

/// Separator joining the two sides of a logical combination.
fn separator(op: BinaryOp) -> CompileResult<&'static str> {
    match op {
        BinaryOp::Or => Ok(" | "),
        BinaryOp::And => Ok(" "),
        other => Err(CompileError::unknown_separator(other.symbol())),
    }
}

/// Constant on the value side of a comparison.
pub(super) fn constant_operand(expr: &Expr) -> CompileResult<&Value> {
    match expr {
        Expr::Constant { value } => Ok(value),
        Expr::Unary {
            op: UnaryOp::Convert,
            operand,
        } => constant_operand(operand),
        other => Err(CompileError::invalid_filter_shape(format!(
            "Comparison value must be a constant, found a {} node",
            other.shape()
        ))),
    }
}

/// Numeric bound text; booleans map to 1 / 0.
pub(super) fn numeric_literal(value: &Value) -> String {
    match value {
        Value::Bool(true) => "1".to_string(),
        Value::Bool(false) => "0".to_string(),
        other => stringify(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::CompileErrorCode;
    use crate::schema::{FieldMetadata, IndexSchema, ValueType};

    fn schema() -> IndexSchema {
        IndexSchema::new("person-idx")
            .with_field("age", FieldMetadata::numeric())
            .with_field("name", FieldMetadata::tag())
            .with_field("bio", FieldMetadata::text())
            .with_field("home", FieldMetadata::geo())
            .with_field("level", FieldMetadata::indexed(ValueType::Int))
            .with_field("team", FieldMetadata::indexed(ValueType::String))
            .with_field("secret", FieldMetadata::tag().not_searchable())
            .with_field("active", FieldMetadata::tag())
    }

    fn compile(expr: Expr) -> CompileResult<String> {
        let schema = schema();
        PredicateCompiler::new(&schema).compile(&expr)
    }

    fn age() -> Expr {
        Expr::member("age")
    }

    #[test]
    fn test_range_operators() {
        assert_eq!(compile(age().gt(Expr::constant(21))).unwrap(), "(@age:[(21 inf])");
        assert_eq!(compile(age().lt(Expr::constant(65))).unwrap(), "(@age:[-inf (65])");
        assert_eq!(compile(age().ge(Expr::constant(21))).unwrap(), "(@age:[21 inf])");
        assert_eq!(compile(age().le(Expr::constant(65))).unwrap(), "(@age:[-inf 65])");
    }

    #[test]
    fn test_and_of_two_ranges() {
        let expr = age()
            .gt(Expr::constant(21))
            .and(age().lt(Expr::constant(65)));
        assert_eq!(compile(expr).unwrap(), "(@age:[(21 inf] @age:[-inf (65])");
    }

    #[test]
    fn test_or_of_two_leaves() {
        let expr = Expr::member("name")
            .eq(Expr::constant("steve"))
            .or(age().ge(Expr::constant(30)));
        assert_eq!(compile(expr).unwrap(), "(@name:{steve} | @age:[30 inf])");
    }

    #[test]
    fn test_nested_groups() {
        let expr = Expr::member("name")
            .eq(Expr::constant("a"))
            .and(Expr::member("name").eq(Expr::constant("b")))
            .or(age().eq(Expr::constant(3)));
        assert_eq!(
            compile(expr).unwrap(),
            "((@name:{a} @name:{b}) | @age:[3 3])"
        );
    }

    #[test]
    fn test_equality_by_kind() {
        assert_eq!(
            compile(Expr::member("name").eq(Expr::constant("steve"))).unwrap(),
            "(@name:{steve})"
        );
        assert_eq!(
            compile(Expr::member("bio").eq(Expr::constant("likes rust"))).unwrap(),
            "(@bio:\"likes rust\")"
        );
        assert_eq!(compile(age().eq(Expr::constant(33))).unwrap(), "(@age:[33 33])");
    }

    #[test]
    fn test_not_equal_prefixes_minus() {
        assert_eq!(
            compile(Expr::member("name").ne(Expr::constant("steve"))).unwrap(),
            "(-@name:{steve})"
        );
        assert_eq!(compile(age().ne(Expr::constant(1))).unwrap(), "(-@age:[1 1])");
    }

    #[test]
    fn test_tag_value_escaped() {
        assert_eq!(
            compile(Expr::member("name").eq(Expr::constant("a.b@c.com"))).unwrap(),
            "(@name:{a\\.b\\@c\\.com})"
        );
    }

    #[test]
    fn test_negation_reproduces_inner_verbatim() {
        let inner = age().gt(Expr::constant(21)).and(age().lt(Expr::constant(65)));
        let plain = compile(inner.clone()).unwrap();
        let negated = compile(!inner).unwrap();
        assert_eq!(negated, format!("-{}", plain));

        let leaf = Expr::member("name").eq(Expr::constant("x"));
        assert_eq!(compile(!leaf).unwrap(), "-(@name:{x})");
    }

    #[test]
    fn test_negated_operand_inside_and() {
        let expr = age()
            .gt(Expr::constant(1))
            .and(!Expr::member("name").eq(Expr::constant("x")));
        assert_eq!(compile(expr).unwrap(), "(@age:[(1 inf] -(@name:{x}))");
    }

    #[test]
    fn test_indexed_kind_resolution() {
        assert_eq!(
            compile(Expr::member("level").eq(Expr::constant(2))).unwrap(),
            "(@level:[2 2])"
        );
        assert_eq!(
            compile(Expr::member("team").eq(Expr::constant("red"))).unwrap(),
            "(@team:{red})"
        );
    }

    #[test]
    fn test_lambda_and_conversion_are_transparent() {
        let expr = Expr::lambda(age().convert().gt(Expr::constant(21).convert()));
        assert_eq!(compile(expr).unwrap(), "(@age:[(21 inf])");
    }

    #[test]
    fn test_bare_boolean_member() {
        let expr = Expr::member("active").and(age().gt(Expr::constant(1)));
        assert_eq!(compile(expr).unwrap(), "(@active:{true} @age:[(1 inf])");
    }

    #[test]
    fn test_standalone_boolean_member_wrapped() {
        assert_eq!(
            compile(Expr::lambda(Expr::member("active"))).unwrap(),
            "(@active:{true})"
        );
        assert_eq!(
            compile(!Expr::member("active")).unwrap(),
            "-(@active:{true})"
        );
    }

    #[test]
    fn test_unknown_field_not_searchable() {
        let err = compile(Expr::member("nope").eq(Expr::constant(1))).unwrap_err();
        assert_eq!(err.code(), CompileErrorCode::FieldNotSearchable);
        assert_eq!(err.field(), Some("nope"));

        let err = compile(Expr::member("secret").eq(Expr::constant("x"))).unwrap_err();
        assert_eq!(err.code(), CompileErrorCode::FieldNotSearchable);
    }

    #[test]
    fn test_geo_equality_rejected() {
        let err = compile(Expr::member("home").eq(Expr::constant("1,2"))).unwrap_err();
        assert_eq!(err.code(), CompileErrorCode::UnsupportedFieldKindForEquality);
    }

    #[test]
    fn test_range_on_tag_rejected() {
        let err = compile(Expr::member("name").gt(Expr::constant("a"))).unwrap_err();
        assert_eq!(err.code(), CompileErrorCode::UnsupportedFieldKindForRange);
    }

    #[test]
    fn test_constant_rooted_comparison_rejected() {
        let err = compile(Expr::constant(21).lt(age())).unwrap_err();
        assert_eq!(err.code(), CompileErrorCode::InvalidFilterShape);
    }

    #[test]
    fn test_member_on_value_side_rejected() {
        let err = compile(age().gt(Expr::member("level"))).unwrap_err();
        assert_eq!(err.code(), CompileErrorCode::InvalidFilterShape);
    }

    #[test]
    fn test_comparison_of_compound_sides_is_unknown_separator() {
        let expr = Expr::binary(
            BinaryOp::Eq,
            age().gt(Expr::constant(1)),
            age().lt(Expr::constant(5)),
        );
        let err = compile(expr).unwrap_err();
        assert_eq!(err.code(), CompileErrorCode::UnknownSeparator);
    }

    #[test]
    fn test_arithmetic_leaf_is_unsupported_operator() {
        let err = compile(Expr::binary(BinaryOp::Add, age(), Expr::constant(1))).unwrap_err();
        assert_eq!(err.code(), CompileErrorCode::UnsupportedOperator);
    }

    #[test]
    fn test_unknown_call_is_unsupported_operator() {
        let err = compile(Expr::call("Frobnicate", vec![age()])).unwrap_err();
        assert_eq!(err.code(), CompileErrorCode::UnsupportedOperator);
    }

    #[test]
    fn test_compile_is_deterministic() {
        let expr = age()
            .gt(Expr::constant(21))
            .and(Expr::member("name").eq(Expr::constant("x y")));
        let first = compile(expr.clone()).unwrap();
        for _ in 0..50 {
            assert_eq!(compile(expr.clone()).unwrap(), first);
        }
    }
}
