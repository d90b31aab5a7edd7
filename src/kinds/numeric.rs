//! Integer, float and decimal fields.
//!
//! Bounds default to `[1, 1000]`. With only one bound declared, the other sits 999 away
//! from it. Decimals are generated as scaled integers so the result never carries more
//! digits than `max_digits` or more fraction digits than `decimal_places`.

use super::{ExampleProducer, MappingContext, SchemaMappable};
use crate::error::{Error, Result};
use crate::examples::ExampleContext;
use crate::field::{FieldDescriptor, FieldKind};
use crate::schema::SchemaNode;
use rand::Rng;
use serde_json::{json, Value};

pub const DEFAULT_MIN_VALUE: f64 = 1.0;
pub const DEFAULT_MAX_VALUE: f64 = 1000.0;
const DEFAULT_SPAN: f64 = 999.0;

pub const DEFAULT_DECIMAL_PLACES: u32 = 2;
const FLOAT_PLACES: u32 = 2;
// Larger precisions do not fit the scaled i128 arithmetic.
const MAX_SCALED_DIGITS: u32 = 30;

pub struct NumericRule;

impl ExampleProducer for NumericRule {
    fn produce(&self, field: &FieldDescriptor, ctx: &mut ExampleContext<'_>) -> Result<Value> {
        match field.kind {
            FieldKind::Integer => {
                let (lo, hi) = bounds(field)?;
                let (lo, hi) = (lo.ceil(), hi.floor());
                if lo > hi {
                    return Err(Error::example(
                        &field.name,
                        format!("no integer lies within [{}, {}]", lo, hi),
                    ));
                }
                // `i64::MAX as f64` rounds up to 2^63, which is itself out of range.
                if lo < i64::MIN as f64 || hi >= i64::MAX as f64 {
                    return Err(Error::example(
                        &field.name,
                        format!("bounds [{}, {}] exceed the 64-bit integer range", lo, hi),
                    ));
                }
                let n = ctx.rng().gen_range(lo as i64..=hi as i64);
                Ok(json!(n))
            }
            FieldKind::Float => {
                let (lo, hi) = bounds(field)?;
                let value = match scaled_range(field, lo, hi, FLOAT_PLACES, None) {
                    Ok((lo_k, hi_k)) => {
                        let k = ctx.rng().gen_range(lo_k..=hi_k);
                        k as f64 / 10f64.powi(FLOAT_PLACES as i32)
                    }
                    // Range narrower than a hundredth
                    Err(_) => lo,
                };
                Ok(json!(value))
            }
            _ => {
                let places = field.constraints.decimal_places.unwrap_or(DEFAULT_DECIMAL_PLACES);
                let (lo, hi) = bounds(field)?;
                let (lo_k, hi_k) = scaled_range(field, lo, hi, places, field.constraints.max_digits)?;
                let k = ctx.rng().gen_range(lo_k..=hi_k);
                let rendered = render_scaled(k, places);
                if ctx.decimal_as_string() {
                    Ok(Value::String(rendered))
                } else {
                    let number: f64 = rendered
                        .parse()
                        .map_err(|e| Error::example(&field.name, format!("{}", e)))?;
                    Ok(json!(number))
                }
            }
        }
    }
}

impl SchemaMappable for NumericRule {
    fn map_schema(&self, field: &FieldDescriptor, ctx: &MappingContext<'_>) -> Result<SchemaNode> {
        let constraints = &field.constraints;
        let mut node = match field.kind {
            FieldKind::Integer => SchemaNode::typed("integer"),
            FieldKind::Float => SchemaNode::typed("number").with_format("double"),
            _ if ctx.decimal_as_string() => {
                let mut node = SchemaNode::typed("string").with_format("decimal");
                if let Some(max_digits) = constraints.max_digits {
                    let places = constraints.decimal_places.unwrap_or(DEFAULT_DECIMAL_PLACES);
                    node.pattern = Some(decimal_pattern(max_digits, places));
                }
                return Ok(node);
            }
            _ => SchemaNode::typed("number").with_format("double"),
        };
        node.minimum = constraints.min_value;
        node.maximum = constraints.max_value;
        Ok(node)
    }
}

/// Effective `[lo, hi]` for a numeric field.
pub fn bounds(field: &FieldDescriptor) -> Result<(f64, f64)> {
    let (lo, hi) = match (field.constraints.min_value, field.constraints.max_value) {
        (Some(lo), Some(hi)) => (lo, hi),
        (Some(lo), None) => (lo, lo + DEFAULT_SPAN),
        (None, Some(hi)) => (hi - DEFAULT_SPAN, hi),
        (None, None) => (DEFAULT_MIN_VALUE, DEFAULT_MAX_VALUE),
    };
    if !lo.is_finite() || !hi.is_finite() || lo > hi {
        return Err(Error::example(
            &field.name,
            format!("minimum {} is greater than maximum {}", lo, hi),
        ));
    }
    Ok((lo, hi))
}

/// Pattern matching a decimal string with the given precision.
pub fn decimal_pattern(max_digits: u32, decimal_places: u32) -> String {
    let whole = max_digits.saturating_sub(decimal_places);
    if decimal_places == 0 {
        format!(r"^-?\d{{0,{}}}$", whole)
    } else {
        format!(r"^-?\d{{0,{}}}(?:\.\d{{0,{}}})?$", whole, decimal_places)
    }
}

fn scaled_range(
    field: &FieldDescriptor,
    lo: f64,
    hi: f64,
    places: u32,
    max_digits: Option<u32>,
) -> Result<(i128, i128)> {
    if places > MAX_SCALED_DIGITS {
        return Err(Error::example(
            &field.name,
            format!("{} decimal places is not supported", places),
        ));
    }
    let scale = 10f64.powi(places as i32);
    let mut lo_k = (lo * scale).ceil() as i128;
    let mut hi_k = (hi * scale).floor() as i128;

    if let Some(max_digits) = max_digits {
        if max_digits < places {
            return Err(Error::example(
                &field.name,
                format!("max_digits {} is smaller than decimal_places {}", max_digits, places),
            ));
        }
        if max_digits <= MAX_SCALED_DIGITS {
            let limit = 10i128.pow(max_digits) - 1;
            lo_k = lo_k.max(-limit);
            hi_k = hi_k.min(limit);
        }
    }

    if lo_k > hi_k {
        return Err(Error::example(
            &field.name,
            format!(
                "no value with {} decimal places{} lies within [{}, {}]",
                places,
                max_digits
                    .map(|d| format!(" and at most {} digits", d))
                    .unwrap_or_default(),
                lo,
                hi
            ),
        ));
    }
    Ok((lo_k, hi_k))
}

/// Renders `k / 10^places` with exactly `places` fraction digits.
fn render_scaled(k: i128, places: u32) -> String {
    let sign = if k < 0 { "-" } else { "" };
    let magnitude = k.unsigned_abs();
    if places == 0 {
        return format!("{}{}", sign, magnitude);
    }
    let scale = 10u128.pow(places);
    format!(
        "{}{}.{:0width$}",
        sign,
        magnitude / scale,
        magnitude % scale,
        width = places as usize
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_scaled() {
        assert_eq!(render_scaled(12345, 2), "123.45");
        assert_eq!(render_scaled(-5, 2), "-0.05");
        assert_eq!(render_scaled(7, 0), "7");
        assert_eq!(render_scaled(0, 3), "0.000");
    }

    #[test]
    fn test_one_sided_bounds() {
        let field = FieldDescriptor::new("n", FieldKind::Integer).min_value(5000.0);
        assert_eq!(bounds(&field).unwrap(), (5000.0, 5999.0));
        let field = FieldDescriptor::new("n", FieldKind::Integer).max_value(0.0);
        assert_eq!(bounds(&field).unwrap(), (-999.0, 0.0));
    }

    #[test]
    fn test_decimal_pattern() {
        assert_eq!(decimal_pattern(5, 2), r"^-?\d{0,3}(?:\.\d{0,2})?$");
        assert_eq!(decimal_pattern(4, 0), r"^-?\d{0,4}$");
    }

    #[test]
    fn test_scaled_range_clamps_to_digits() {
        let field = FieldDescriptor::decimal("d", 3, 1);
        assert_eq!(scaled_range(&field, 1.0, 1000.0, 1, Some(3)).unwrap(), (10, 999));
    }

    #[test]
    fn test_digits_smaller_than_places() {
        let field = FieldDescriptor::decimal("d", 1, 2);
        assert!(scaled_range(&field, 0.0, 1.0, 2, Some(1)).is_err());
    }

    #[test]
    fn test_integer_bounds_beyond_i64_fail() {
        let generator = crate::examples::FieldExampleGenerator::new();
        let field = FieldDescriptor::new("huge", FieldKind::Integer)
            .min_value(1e19)
            .max_value(2e19);
        let err = generator.generate(&field, Some("huge")).unwrap_err();
        assert!(matches!(err, Error::ExampleGeneration { .. }));

        let field = FieldDescriptor::new("wide", FieldKind::Integer)
            .min_value(-1e18)
            .max_value(1e18);
        let value = generator.generate(&field, Some("wide")).unwrap();
        let n = value.primary().unwrap().value.as_i64().unwrap();
        assert!((-1_000_000_000_000_000_000..=1_000_000_000_000_000_000).contains(&n));
    }
}
