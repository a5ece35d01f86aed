// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Datetime coercions. All results are UTC.

use crate::error::BoxError;
use crate::value::{Map, Value};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Naive text formats (version 1), read as UTC, tried in order after RFC 3339.
pub const NAIVE_FORMATS_V1: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Date-only format, read as UTC midnight.
pub const DATE_FORMAT_V1: &str = "%Y-%m-%d";

/// Parse text in one of the supported formats.
pub fn parse(text: &str) -> Result<DateTime<Utc>, BoxError> {
    let text = text.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.with_timezone(&Utc));
    }
    // RFC 3339 allows a space instead of `T`.
    if text.len() > 10 && text.as_bytes()[10] == b' ' {
        let swapped = format!("{}T{}", &text[..10], &text[11..]);
        if let Ok(dt) = DateTime::parse_from_rfc3339(&swapped) {
            return Ok(dt.with_timezone(&Utc));
        }
    }
    for format in NAIVE_FORMATS_V1 {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, DATE_FORMAT_V1) {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(naive.and_utc());
        }
    }
    Err(format!("unrecognized datetime format: {:?}", text).into())
}

/// Seconds since the Unix epoch, rounded to the microsecond.
pub fn from_epoch(seconds: f64) -> Result<DateTime<Utc>, BoxError> {
    if !seconds.is_finite() {
        return Err(format!("timestamp {} is not finite", seconds).into());
    }
    let micros = (seconds * 1_000_000.0).round();
    if micros.abs() >= i64::MAX as f64 {
        return Err(format!("timestamp {} out of range", seconds).into());
    }
    DateTime::from_timestamp_micros(micros as i64)
        .ok_or_else(|| format!("timestamp {} out of range", seconds).into())
}

/// `[year, month, day, hour?, minute?, second?, microsecond?]`
pub fn from_parts(parts: &[Value]) -> Result<DateTime<Utc>, BoxError> {
    if parts.len() < 3 || parts.len() > 7 {
        return Err(format!("expected 3 to 7 datetime parts, got {}", parts.len()).into());
    }
    let mut fields = [0i64; 7];
    for (slot, part) in fields.iter_mut().zip(parts) {
        *slot = part
            .as_i64()
            .ok_or_else(|| format!("datetime part {} is not an int", part))?;
    }
    assemble(fields)
}

/// Map with `year month day` and optional `hour minute second microsecond`.
pub fn from_map(map: &Map) -> Result<DateTime<Utc>, BoxError> {
    const KEYS: [&str; 7] = [
        "year",
        "month",
        "day",
        "hour",
        "minute",
        "second",
        "microsecond",
    ];
    let mut fields = [0i64; 7];
    for (i, key) in KEYS.iter().enumerate() {
        match map.get(*key) {
            Some(value) => {
                fields[i] = value
                    .as_i64()
                    .ok_or_else(|| format!("datetime `{}` is not an int", key))?;
            }
            None if i < 3 => return Err(format!("datetime `{}` is required", key).into()),
            None => {}
        }
    }
    assemble(fields)
}

fn assemble(fields: [i64; 7]) -> Result<DateTime<Utc>, BoxError> {
    let [year, month, day, hour, minute, second, micro] = fields;
    let narrow = |v: i64| u32::try_from(v).ok();
    let year = i32::try_from(year).ok();
    let naive = year
        .zip(narrow(month))
        .zip(narrow(day))
        .and_then(|((y, m), d)| NaiveDate::from_ymd_opt(y, m, d))
        .and_then(|date| {
            date.and_hms_micro_opt(narrow(hour)?, narrow(minute)?, narrow(second)?, narrow(micro)?)
        })
        .ok_or_else(|| format!("invalid datetime fields {:?}", fields))?;
    Ok(naive.and_utc())
}
