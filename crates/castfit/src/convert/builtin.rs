// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Built-in scalar conversions.

use super::datetime;
use crate::error::BoxError;
use crate::types::TypeKey;
use crate::value::{format_float, Bytes, Value};
use chrono::SecondsFormat;
use std::path::PathBuf;

/// Text accepted as `true` (compared case-insensitively).
pub const TRUE_LITERALS: &[&str] = &["1", "true", "t", "yes", "y", "on"];

/// Text accepted as `false` (compared case-insensitively).
pub const FALSE_LITERALS: &[&str] = &["0", "false", "f", "no", "n", "off", ""];

/// Check whether a built-in conversion exists from `source` to `target`.
pub fn supports(source: TypeKey, target: TypeKey) -> bool {
    let from = |keys: &[TypeKey]| keys.contains(&source);
    if target == TypeKey::int() {
        from(&[TypeKey::str(), TypeKey::float(), TypeKey::bool()])
    } else if target == TypeKey::float() {
        from(&[TypeKey::str(), TypeKey::int(), TypeKey::bool()])
    } else if target == TypeKey::bool() {
        from(&[TypeKey::str(), TypeKey::int(), TypeKey::float(), TypeKey::none()])
    } else if target == TypeKey::str() {
        from(&[
            TypeKey::int(),
            TypeKey::float(),
            TypeKey::bool(),
            TypeKey::path(),
            TypeKey::datetime(),
            TypeKey::bytes(),
        ])
    } else if target == TypeKey::bytes() {
        from(&[TypeKey::str(), TypeKey::list()])
    } else if target == TypeKey::path() {
        from(&[TypeKey::str()])
    } else if target == TypeKey::datetime() {
        from(&[
            TypeKey::str(),
            TypeKey::int(),
            TypeKey::float(),
            TypeKey::list(),
            TypeKey::dict(),
        ])
    } else {
        false
    }
}

/// Run the built-in conversion of `value` to `target`.
pub fn convert(value: Value, target: TypeKey) -> Result<Value, BoxError> {
    if target == TypeKey::int() {
        to_int(value).map(Value::Int)
    } else if target == TypeKey::float() {
        to_float(value).map(Value::Float)
    } else if target == TypeKey::bool() {
        to_bool(value).map(Value::Bool)
    } else if target == TypeKey::str() {
        to_str(value).map(Value::Str)
    } else if target == TypeKey::bytes() {
        to_bytes(value).map(Value::Bytes)
    } else if target == TypeKey::path() {
        match value {
            Value::Str(s) => Ok(Value::Path(PathBuf::from(s))),
            other => Err(unsupported(&other, target)),
        }
    } else if target == TypeKey::datetime() {
        let dt = match &value {
            Value::Str(s) => datetime::parse(s)?,
            Value::Int(secs) => datetime::from_epoch(*secs as f64)?,
            Value::Float(secs) => datetime::from_epoch(*secs)?,
            Value::List(parts) => datetime::from_parts(parts)?,
            Value::Map(map) => datetime::from_map(map)?,
            other => return Err(unsupported(other, target)),
        };
        Ok(Value::DateTime(dt))
    } else {
        Err(unsupported(&value, target))
    }
}

fn unsupported(value: &Value, target: TypeKey) -> BoxError {
    format!("no built-in conversion from {} to {}", value.type_key(), target).into()
}

fn to_int(value: Value) -> Result<i64, BoxError> {
    match value {
        Value::Str(s) => {
            let text = s.trim();
            if let Ok(v) = text.parse::<i64>() {
                return Ok(v);
            }
            match text.parse::<f64>() {
                Ok(v) if looks_decimal(text) => truncate(v),
                _ => Err(format!("invalid integer literal {:?}", s).into()),
            }
        }
        Value::Float(v) => truncate(v),
        Value::Bool(v) => Ok(i64::from(v)),
        other => Err(unsupported(&other, TypeKey::int())),
    }
}

// Plain `[-+]digits[.digits]` only: no exponent, `inf` or `nan`.
fn looks_decimal(text: &str) -> bool {
    let unsigned = text.strip_prefix(['-', '+']).unwrap_or(text);
    let (whole, frac) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    !(whole.is_empty() && frac.is_empty())
        && whole.bytes().all(|b| b.is_ascii_digit())
        && frac.bytes().all(|b| b.is_ascii_digit())
}

/// Truncate toward zero; non-finite and out-of-range values are rejected.
fn truncate(v: f64) -> Result<i64, BoxError> {
    if !v.is_finite() {
        return Err(format!("cannot convert {} to int", v).into());
    }
    let t = v.trunc();
    if t < i64::MIN as f64 || t >= i64::MAX as f64 {
        return Err(format!("{} is out of range for int", v).into());
    }
    Ok(t as i64)
}

fn to_float(value: Value) -> Result<f64, BoxError> {
    match value {
        Value::Str(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("invalid float literal {:?}", s).into()),
        Value::Int(v) => Ok(v as f64),
        Value::Bool(v) => Ok(if v { 1.0 } else { 0.0 }),
        other => Err(unsupported(&other, TypeKey::float())),
    }
}

fn to_bool(value: Value) -> Result<bool, BoxError> {
    match value {
        Value::Str(s) => {
            let text = s.trim().to_ascii_lowercase();
            if TRUE_LITERALS.contains(&text.as_str()) {
                Ok(true)
            } else if FALSE_LITERALS.contains(&text.as_str()) {
                Ok(false)
            } else {
                Err(format!("invalid boolean literal {:?}", s).into())
            }
        }
        Value::Int(v) => Ok(v != 0),
        Value::Float(v) => Ok(v != 0.0),
        Value::Null => Ok(false),
        other => Err(unsupported(&other, TypeKey::bool())),
    }
}

fn to_str(value: Value) -> Result<String, BoxError> {
    match value {
        Value::Int(v) => Ok(v.to_string()),
        Value::Float(v) => Ok(format_float(v)),
        Value::Bool(v) => Ok(v.to_string()),
        Value::Path(p) => Ok(p.to_string_lossy().into_owned()),
        Value::DateTime(dt) => Ok(dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        Value::Bytes(b) => Ok(String::from_utf8(b.into_vec())?),
        other => Err(unsupported(&other, TypeKey::str())),
    }
}

fn to_bytes(value: Value) -> Result<Bytes, BoxError> {
    match value {
        Value::Str(s) => Ok(Bytes(s.into_bytes())),
        Value::List(items) => items
            .iter()
            .map(|item| {
                item.as_i64()
                    .and_then(|v| u8::try_from(v).ok())
                    .ok_or_else(|| format!("{} is not a byte value", item).into())
            })
            .collect::<Result<Vec<u8>, BoxError>>()
            .map(Bytes),
        other => Err(unsupported(&other, TypeKey::bytes())),
    }
}
