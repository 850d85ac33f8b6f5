//! Common types and helpers shared across models.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Identifier accepted either as a JSON number or as a numeric string.
///
/// Form widgets post select values as strings while API clients send numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IdInput {
    Number(i64),
    Text(String),
}

impl IdInput {
    /// The id as an integer, if it is one
    pub fn as_id(&self) -> Option<i64> {
        match self {
            IdInput::Number(n) => Some(*n),
            IdInput::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// Amount in currency units, accepted as a JSON number or a numeric string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AmountInput {
    Number(f64),
    Text(String),
}

impl AmountInput {
    /// The amount as a finite number, if it is one
    pub fn as_amount(&self) -> Option<f64> {
        let amount = match self {
            AmountInput::Number(n) => *n,
            AmountInput::Text(s) => s.trim().parse().ok()?,
        };
        amount.is_finite().then_some(amount)
    }
}

/// Format a timestamp the way it is stored: RFC 3339, UTC, millisecond precision
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Current time in storage format
pub fn now_timestamp() -> String {
    format_timestamp(Utc::now())
}

/// Parse an appointment date.
///
/// Accepts RFC 3339 (`2025-03-01T09:30:00Z`, with any offset) or the
/// `datetime-local` form `2025-03-01T09:30[:00]`, which is taken as UTC.
pub fn parse_datetime(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Parse a birth date given as `YYYY-MM-DD` or a full timestamp.
///
/// Returns the normalized storage form (midnight UTC for plain dates).
pub fn parse_birth_date(input: &str) -> Option<String> {
    let input = input.trim();
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|naive| format_timestamp(naive.and_utc()));
    }
    parse_datetime(input).map(format_timestamp)
}
