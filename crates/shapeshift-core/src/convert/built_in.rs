//! Built-in scalar conversions
//!
//! Each function accepts any runtime value and converts it to one target
//! kind, failing with a conversion error for unsupported inputs and a format
//! error for unparsable text. Null always converts to null.
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use crate::model::{EnumDescriptor, ScalarKind};
use crate::value::{Value, DATETIME_FORMAT};
use crate::{Error, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;
use uuid::Uuid;

/// Accepted text layouts for date/time parsing, after RFC 3339
const DATETIME_LAYOUTS: &[&str] = &[DATETIME_FORMAT, "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"];

/// Convert a value to a built-in scalar kind
pub fn convert_scalar(value: &Value, target: ScalarKind) -> Result<Value> {
    if value.is_null() {
        return Ok(Value::Null);
    }
    if value.scalar_kind() == Some(target) {
        return Ok(value.clone());
    }

    match target {
        ScalarKind::String => to_string(value),
        ScalarKind::Bool => to_bool(value),
        ScalarKind::Char => to_char(value),
        ScalarKind::F32 => to_f64(value, target).map(|v| Value::F32(v as f32)),
        ScalarKind::F64 => to_f64(value, target).map(Value::F64),
        ScalarKind::Decimal => to_decimal(value),
        ScalarKind::DateTime => to_datetime(value),
        ScalarKind::Uuid => to_uuid(value),
        integer => to_integer(value, integer),
    }
}

/// Convert a value to a variant of `descriptor`
///
/// Integers select by code, text by variant name or numeric text, and
/// values of another enum by variant name.
pub fn convert_enum(value: &Value, descriptor: &EnumDescriptor) -> Result<Value> {
    let found = match value {
        Value::Null => return Ok(Value::Null),
        Value::Enum(e) if e.enum_name == descriptor.name() => return Ok(value.clone()),
        Value::Enum(e) => descriptor.by_name(&e.variant),
        Value::String(s) => {
            let text = s.trim();
            match descriptor.by_name(text) {
                Some(found) => Some(found),
                None => {
                    let code = text
                        .parse::<i64>()
                        .map_err(|_| Error::format(s.clone(), descriptor.name()))?;
                    descriptor.by_code(code)
                }
            }
        }
        other => other
            .as_integer()
            .and_then(|code| i64::try_from(code).ok())
            .and_then(|code| descriptor.by_code(code)),
    };

    found
        .map(Value::Enum)
        .ok_or_else(|| unsupported(value, descriptor.name()))
}

fn unsupported(value: &Value, target: &str) -> Error {
    Error::conversion(value.type_name(), target, value.to_string())
}

fn to_string(value: &Value) -> Result<Value> {
    match value {
        Value::Object(_) | Value::Array(_) | Value::List(_) | Value::Bag(_) => {
            Err(unsupported(value, "string"))
        }
        other => Ok(Value::String(other.to_string())),
    }
}

fn to_bool(value: &Value) -> Result<Value> {
    let result = match value {
        Value::Bool(b) => *b,
        Value::F32(v) => *v != 0.0,
        Value::F64(v) => *v != 0.0,
        Value::Decimal(d) => !d.is_zero(),
        Value::String(s) => {
            let text = s.trim();
            if text.eq_ignore_ascii_case("true") {
                true
            } else if text.eq_ignore_ascii_case("false") {
                false
            } else {
                return Err(Error::format(s.clone(), "bool"));
            }
        }
        other => other.as_integer().ok_or_else(|| unsupported(other, "bool"))? != 0,
    };
    Ok(Value::Bool(result))
}

fn to_char(value: &Value) -> Result<Value> {
    match value {
        Value::String(s) => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(Value::Char(c)),
                _ => Err(Error::format(s.clone(), "char")),
            }
        }
        other => other
            .as_integer()
            .and_then(|code| u32::try_from(code).ok())
            .and_then(char::from_u32)
            .map(Value::Char)
            .ok_or_else(|| unsupported(other, "char")),
    }
}

fn to_integer(value: &Value, target: ScalarKind) -> Result<Value> {
    let wide: i128 = match value {
        Value::Bool(b) => i128::from(*b),
        Value::Char(c) => i128::from(u32::from(*c)),
        Value::F32(v) => float_to_integer(f64::from(*v), value, target)?,
        Value::F64(v) => float_to_integer(*v, value, target)?,
        Value::Decimal(d) => d
            .round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven)
            .to_i128()
            .ok_or_else(|| unsupported(value, target.name()))?,
        Value::String(s) => s
            .trim()
            .parse::<i128>()
            .map_err(|_| Error::format(s.clone(), target.name()))?,
        Value::Enum(e) => i128::from(e.discriminant),
        other => other
            .as_integer()
            .ok_or_else(|| unsupported(other, target.name()))?,
    };
    narrow(wide, target).ok_or_else(|| unsupported(value, target.name()))
}

/// Range-checked narrowing of a widened integer
pub(crate) fn narrow(wide: i128, target: ScalarKind) -> Option<Value> {
    let value = match target {
        ScalarKind::I8 => Value::I8(i8::try_from(wide).ok()?),
        ScalarKind::I16 => Value::I16(i16::try_from(wide).ok()?),
        ScalarKind::I32 => Value::I32(i32::try_from(wide).ok()?),
        ScalarKind::I64 => Value::I64(i64::try_from(wide).ok()?),
        ScalarKind::U8 => Value::U8(u8::try_from(wide).ok()?),
        ScalarKind::U16 => Value::U16(u16::try_from(wide).ok()?),
        ScalarKind::U32 => Value::U32(u32::try_from(wide).ok()?),
        ScalarKind::U64 => Value::U64(u64::try_from(wide).ok()?),
        _ => return None,
    };
    Some(value)
}

fn float_to_integer(v: f64, original: &Value, target: ScalarKind) -> Result<i128> {
    let rounded = round_half_even(v);
    if !rounded.is_finite() || rounded < i128::MIN as f64 || rounded > i128::MAX as f64 {
        return Err(unsupported(original, target.name()));
    }
    Ok(rounded as i128)
}

/// Banker's rounding
pub(crate) fn round_half_even(v: f64) -> f64 {
    if (v - v.trunc()).abs() == 0.5 {
        2.0 * (v / 2.0).round()
    } else {
        v.round()
    }
}

fn to_f64(value: &Value, target: ScalarKind) -> Result<f64> {
    match value {
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::Decimal(d) => d.to_f64().ok_or_else(|| unsupported(value, target.name())),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| Error::format(s.clone(), target.name())),
        Value::Enum(e) => Ok(e.discriminant as f64),
        other => other.as_f64().ok_or_else(|| unsupported(other, target.name())),
    }
}

fn to_decimal(value: &Value) -> Result<Value> {
    let result = match value {
        Value::Bool(b) => {
            if *b {
                Decimal::ONE
            } else {
                Decimal::ZERO
            }
        }
        Value::F32(v) => Decimal::from_f32(*v).ok_or_else(|| unsupported(value, "decimal"))?,
        Value::F64(v) => Decimal::from_f64(*v).ok_or_else(|| unsupported(value, "decimal"))?,
        Value::String(s) => {
            let text = s.trim();
            Decimal::from_str(text)
                .or_else(|_| Decimal::from_scientific(text))
                .map_err(|_| Error::format(s.clone(), "decimal"))?
        }
        Value::Enum(e) => Decimal::from(e.discriminant),
        other => {
            let wide = other.as_integer().ok_or_else(|| unsupported(other, "decimal"))?;
            Decimal::from_i128(wide).ok_or_else(|| unsupported(other, "decimal"))?
        }
    };
    Ok(Value::Decimal(result))
}

fn to_datetime(value: &Value) -> Result<Value> {
    match value {
        Value::String(s) => parse_datetime(s.trim())
            .map(Value::DateTime)
            .ok_or_else(|| Error::format(s.clone(), "datetime")),
        other => Err(unsupported(other, "datetime")),
    }
}

pub(crate) fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.naive_utc());
    }
    DATETIME_LAYOUTS
        .iter()
        .find_map(|layout| NaiveDateTime::parse_from_str(text, layout).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

fn to_uuid(value: &Value) -> Result<Value> {
    match value {
        Value::String(s) => Uuid::parse_str(s.trim())
            .map(Value::Uuid)
            .map_err(|_| Error::format(s.clone(), "uuid")),
        other => Err(unsupported(other, "uuid")),
    }
}
