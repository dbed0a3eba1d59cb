//! Call translators for predicates
//!
//! The fixed table of method calls allowed inside a filter. Any other name
//! is an unsupported operator.

use serde_json::Value;

use crate::expr::{stringify, Expr};
use crate::schema::{FieldKind, FieldMetadataProvider};

use super::descriptor::{GeoFilter, GeoUnit};
use super::errors::{CompileError, CompileResult};
use super::escape::escape_tag;
use super::predicate::{constant_operand, numeric_literal, PredicateCompiler};

impl<'a, P: FieldMetadataProvider + ?Sized> PredicateCompiler<'a, P> {
    /// Translates a supported call into a predicate term.
    pub(super) fn translate_call(&self, name: &str, args: &[Expr]) -> CompileResult<String> {
        match name {
            "Contains" => self.contains(args),
            "StartsWith" => self.affix(name, args, Affix::Prefix),
            "EndsWith" => self.affix(name, args, Affix::Suffix),
            "Equals" => {
                let [target, value] = two_args(name, args)?;
                let field = self.field_operand(target)?;
                let kind = self.kind_of(&field)?;
                self.equality(&field, kind, constant_operand(value)?)
            }
            "GeoFilter" => {
                let filter = self.geo_filter(args)?;
                Ok(format!(
                    "@{}:[{} {} {} {}]",
                    filter.field,
                    filter.longitude,
                    filter.latitude,
                    filter.radius,
                    filter.unit.as_str()
                ))
            }
            other => Err(CompileError::unsupported_operator(other)),
        }
    }

    /// Builds a radius filter from `[field, longitude, latitude, radius, unit]`.
    pub(super) fn geo_filter(&self, args: &[Expr]) -> CompileResult<GeoFilter> {
        let [field, lon, lat, radius, unit] = args else {
            return Err(CompileError::invalid_argument(
                "GeoFilter",
                format!("expected 5 arguments, found {}", args.len()),
            ));
        };

        let field = self.field_operand(field.unwrap_lambda())?;
        let kind = self.kind_of(&field)?;
        if kind != FieldKind::Geo {
            return Err(CompileError::unsupported_kind_for_equality(
                field,
                kind,
                "geo filters",
            ));
        }

        let unit_name = stringify(constant_operand(unit)?);
        let unit = GeoUnit::parse(&unit_name).ok_or_else(|| {
            CompileError::invalid_argument("GeoFilter", format!("unknown unit '{}'", unit_name))
        })?;

        Ok(GeoFilter {
            field,
            longitude: number_arg("GeoFilter longitude", lon)?,
            latitude: number_arg("GeoFilter latitude", lat)?,
            radius: number_arg("GeoFilter radius", radius)?,
            unit,
        })
    }

    /// Field containment (`field.Contains(value)`) or list membership
    /// (`[a, b].Contains(field)`).
    fn contains(&self, args: &[Expr]) -> CompileResult<String> {
        let [target, item] = two_args("Contains", args)?;

        if let Ok(Value::Array(values)) = constant_operand(target) {
            let field = self.field_operand(item)?;
            return self.membership(&field, values);
        }

        let field = self.field_operand(target)?;
        let value = stringify(constant_operand(item)?);
        match self.kind_of(&field)? {
            FieldKind::Text => Ok(format!("@{}:*{}*", field, value)),
            FieldKind::Tag => Ok(format!("@{}:{{{}}}", field, escape_tag(&value))),
            other => Err(CompileError::unsupported_kind_for_equality(
                field,
                other,
                "containment",
            )),
        }
    }

    fn membership(&self, field: &str, values: &[Value]) -> CompileResult<String> {
        if values.is_empty() {
            return Err(CompileError::invalid_argument(
                "Contains",
                "membership list is empty",
            ));
        }

        match self.kind_of(field)? {
            FieldKind::Tag => {
                let items: Vec<String> = values.iter().map(|v| escape_tag(&stringify(v))).collect();
                Ok(format!("@{}:{{{}}}", field, items.join("|")))
            }
            FieldKind::Text => {
                let items: Vec<String> = values.iter().map(stringify).collect();
                Ok(format!("@{}:({})", field, items.join("|")))
            }
            FieldKind::Numeric => {
                let terms: Vec<String> = values
                    .iter()
                    .map(|v| {
                        let n = numeric_literal(v);
                        format!("@{}:[{} {}]", field, n, n)
                    })
                    .collect();
                if terms.len() == 1 {
                    Ok(terms.concat())
                } else {
                    Ok(format!("({})", terms.join(" | ")))
                }
            }
            other => Err(CompileError::unsupported_kind_for_equality(
                field,
                other,
                "membership",
            )),
        }
    }

    fn affix(&self, name: &str, args: &[Expr], affix: Affix) -> CompileResult<String> {
        let [target, value] = two_args(name, args)?;
        let field = self.field_operand(target)?;
        let value = stringify(constant_operand(value)?);

        match (self.kind_of(&field)?, affix) {
            (FieldKind::Text, Affix::Prefix) => Ok(format!("@{}:{}*", field, value)),
            (FieldKind::Text, Affix::Suffix) => Ok(format!("@{}:*{}", field, value)),
            (FieldKind::Tag, Affix::Prefix) => {
                Ok(format!("@{}:{{{}*}}", field, escape_tag(&value)))
            }
            (FieldKind::Tag, Affix::Suffix) => {
                Ok(format!("@{}:{{*{}}}", field, escape_tag(&value)))
            }
            (other, _) => Err(CompileError::unsupported_kind_for_equality(
                field,
                other,
                name,
            )),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Affix {
    Prefix,
    Suffix,
}

fn two_args<'e>(name: &str, args: &'e [Expr]) -> CompileResult<[&'e Expr; 2]> {
    match args {
        [a, b] => Ok([a, b]),
        _ => Err(CompileError::invalid_argument(
            name,
            format!("expected 2 arguments, found {}", args.len()),
        )),
    }
}

fn number_arg(context: &str, expr: &Expr) -> CompileResult<f64> {
    constant_operand(expr)?
        .as_f64()
        .ok_or_else(|| CompileError::invalid_argument(context, "expected a number"))
}
