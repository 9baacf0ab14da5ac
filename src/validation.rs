//! Input validation shared by vaults, expenses, templates and budgets.

use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use regex::Regex;

use crate::error::{LedgerError, LedgerResult};

pub const MAX_NAME_LEN: usize = 100;
pub const MAX_NOTE_LEN: usize = 500;
pub const MIN_AMOUNT: f64 = 0.01;

/// Trim a required name and check its length.
pub fn name(field: &str, value: &str) -> LedgerResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LedgerError::invalid(format!("{} is required", field)));
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(LedgerError::invalid(format!(
            "{} must be at most {} characters",
            field, MAX_NAME_LEN
        )));
    }
    Ok(trimmed.to_string())
}

/// Normalize an optional free-text field; blank becomes `None`.
pub fn optional_text(field: &str, value: Option<String>) -> LedgerResult<Option<String>> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if v.is_empty() => Ok(None),
        Some(v) if v.chars().count() > MAX_NOTE_LEN => Err(LedgerError::invalid(format!(
            "{} must be at most {} characters",
            field, MAX_NOTE_LEN
        ))),
        other => Ok(other),
    }
}

pub fn amount(field: &str, value: f64) -> LedgerResult<f64> {
    if !value.is_finite() || value < MIN_AMOUNT {
        return Err(LedgerError::invalid(format!(
            "{} must be greater than 0",
            field
        )));
    }
    Ok(value)
}

fn color_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").expect("Invalid color regex"))
}

pub fn color(value: &str) -> LedgerResult<String> {
    if color_pattern().is_match(value) {
        Ok(value.to_string())
    } else {
        Err(LedgerError::invalid(format!(
            "Invalid color format '{}', expected #RRGGBB",
            value
        )))
    }
}

/// Parse an instant given either as RFC 3339 or as a bare `YYYY-MM-DD` day
/// (midnight UTC).
pub fn parse_instant(value: &str) -> LedgerResult<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }
    parse_day(value).map(|day| day.and_time(NaiveTime::default()).and_utc())
}

/// Parse a calendar day, accepting a full timestamp and keeping its UTC date.
pub fn parse_day(value: &str) -> LedgerResult<NaiveDate> {
    let value = value.trim();
    if let Ok(day) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(day);
    }
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc).date_naive())
        .map_err(|_| LedgerError::invalid(format!("Invalid date '{}'", value)))
}

/// Serde helper for patch fields where `null` clears the value and an absent
/// field leaves it alone. Use with `#[serde(default, deserialize_with = ...)]`.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: serde::Deserialize<'de>,
{
    serde::Deserialize::deserialize(deserializer).map(Some)
}
