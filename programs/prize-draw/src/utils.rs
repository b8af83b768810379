use anchor_lang::prelude::*;
use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::CompetitionError;

/// Minor units per whole currency unit.
pub const PENCE_PER_UNIT: u64 = 100;

/// Current wall-clock time in Unix milliseconds.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Converts a decimal amount to pence, rounding half-up on the cent boundary.
pub fn pence_from_decimal(amount: f64) -> Result<u64> {
    require!(
        amount.is_finite() && amount >= 0.0,
        CompetitionError::InvalidAmount
    );
    let pence = (amount * PENCE_PER_UNIT as f64).round();
    require!(pence <= u64::MAX as f64, CompetitionError::Overflow);
    Ok(pence as u64)
}

/// Renders pence as a two-decimal amount, e.g. `1250` -> `"12.50"`.
pub fn format_pence(pence: u64) -> String {
    format!("{}.{:02}", pence / PENCE_PER_UNIT, pence % PENCE_PER_UNIT)
}

/// Parses `"12"`, `"12.5"` or `"12.50"` into pence without going through floats.
pub fn parse_pence(text: &str) -> Result<u64> {
    let text = text.trim();
    let (whole, fraction) = match text.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (text, ""),
    };
    require!(
        !whole.is_empty()
            && fraction.len() <= 2
            && whole.bytes().all(|b| b.is_ascii_digit())
            && fraction.bytes().all(|b| b.is_ascii_digit()),
        CompetitionError::InvalidAmount
    );

    let units: u64 = whole.parse().map_err(|_| CompetitionError::InvalidAmount)?;
    let cents = match fraction.len() {
        0 => 0,
        1 => fraction.parse::<u64>().map_err(|_| CompetitionError::InvalidAmount)? * 10,
        _ => fraction.parse::<u64>().map_err(|_| CompetitionError::InvalidAmount)?,
    };

    units
        .checked_mul(PENCE_PER_UNIT)
        .and_then(|pence| pence.checked_add(cents))
        .ok_or_else(|| CompetitionError::Overflow.into())
}

/// ISO-8601 UTC with millisecond precision, e.g. `2024-05-01T12:00:00.000Z`.
pub fn format_timestamp(millis: i64) -> Result<String> {
    let instant: DateTime<Utc> =
        DateTime::from_timestamp_millis(millis).ok_or(CompetitionError::Overflow)?;
    Ok(instant.to_rfc3339_opts(SecondsFormat::Millis, true))
}

pub fn parse_timestamp(text: &str) -> Result<i64> {
    let instant =
        DateTime::parse_from_rfc3339(text.trim()).map_err(|_| CompetitionError::MalformedCsv)?;
    Ok(instant.timestamp_millis())
}

/// Lowercase base-36 rendering used in ticket references.
pub fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}
