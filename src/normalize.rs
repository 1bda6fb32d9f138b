//! Converts raw movement rows into canonical [`Movement`]s.
//!
//! Normalization is total: a malformed field falls back to a default and is
//! never reported as an error.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde_json::Value;

use crate::domain::{AccountCode, Direction, Movement, RawMovement};

/// Effective date assigned when neither date field can be parsed.
pub const EPOCH_SENTINEL: DateTime<Utc> = DateTime::<Utc>::UNIX_EPOCH;

const KNOWN_CATEGORIES: &[&str] = &["deposit", "drawing"];

/// Splits a movement payload into rows. Anything but a JSON array yields no rows.
pub fn parse_payload(payload: Value) -> Vec<RawMovement> {
    let Value::Array(items) = payload else {
        tracing::debug!("movement payload is not an array; treating as empty");
        return Vec::new();
    };

    items
        .into_iter()
        .map(|item| serde_json::from_value(item).unwrap_or_default())
        .collect()
}

pub fn normalize_all(rows: &[RawMovement]) -> Vec<Movement> {
    rows.iter().map(normalize).collect()
}

pub fn normalize(row: &RawMovement) -> Movement {
    let account = text(&row.bank_code)
        .map(AccountCode::new)
        .unwrap_or_else(AccountCode::unassigned);

    let category = text(&row.transaction_type);
    if let Some(c) = category.as_deref() {
        if !KNOWN_CATEGORIES.contains(&c) {
            tracing::debug!(category = c, "unrecognized movement category; counted as increase");
        }
    }

    Movement {
        id: integer(&row.id).unwrap_or(0),
        account,
        account_name: text(&row.bank_name),
        effective_at: effective_date(&row.transaction_date, &row.slip_date),
        direction: Direction::from_category(category.as_deref()),
        magnitude: decimal(&row.cash_amount).unwrap_or(Decimal::ZERO),
        entry_no: text(&row.entry_no),
        slip_no: text(&row.slip_no),
    }
}

fn effective_date(primary: &Value, secondary: &Value) -> DateTime<Utc> {
    text(primary)
        .and_then(|s| parse_date(&s))
        .or_else(|| text(secondary).and_then(|s| parse_date(&s)))
        .unwrap_or(EPOCH_SENTINEL)
}

/// Accepts RFC 3339 timestamps, bare dates and naive date-times (read as UTC).
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    Some(Utc.from_utc_datetime(&NaiveDateTime::new(date, NaiveTime::MIN)))
}

fn text(value: &Value) -> Option<String> {
    let s = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    if s.is_empty() { None } else { Some(s) }
}

fn integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub(crate) fn decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => n
            .to_string()
            .parse::<Decimal>()
            .ok()
            .or_else(|| n.as_f64().and_then(Decimal::from_f64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<Decimal>()
                .ok()
                .or_else(|| Decimal::from_scientific(s).ok())
        }
        _ => None,
    }
}
