//! Display formatting for dates, numbers and consumption quantities

use crate::i18n::I18n;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use std::fmt::Write;

/// Default display pattern (dd/MM/yyyy)
pub const DATE_PATTERN: &str = "%d/%m/%Y";
/// Display pattern including hour and minute (dd/MM/yyyy HH:mm)
pub const DATE_TIME_PATTERN: &str = "%d/%m/%Y %H:%M";

/// A timestamp to display, either raw text or already parsed
#[derive(Debug, Clone, Copy)]
pub enum DateInput<'a> {
    Text(&'a str),
    Parsed(DateTime<FixedOffset>),
}

impl<'a> From<&'a str> for DateInput<'a> {
    fn from(s: &'a str) -> Self {
        DateInput::Text(s)
    }
}

impl<'a> From<&'a String> for DateInput<'a> {
    fn from(s: &'a String) -> Self {
        DateInput::Text(s.as_str())
    }
}

impl From<DateTime<FixedOffset>> for DateInput<'_> {
    fn from(dt: DateTime<FixedOffset>) -> Self {
        DateInput::Parsed(dt)
    }
}

impl From<DateTime<Utc>> for DateInput<'_> {
    fn from(dt: DateTime<Utc>) -> Self {
        DateInput::Parsed(dt.fixed_offset())
    }
}

/// Parse an ISO-8601 timestamp.
///
/// Accepts RFC 3339 (with offset), naive `YYYY-MM-DDTHH:MM[:SS[.fff]]`
/// (taken as UTC) and plain `YYYY-MM-DD` dates.
pub fn parse_timestamp(s: &str) -> Option<DateTime<FixedOffset>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt);
    }

    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, pattern) {
            return Some(naive.and_utc().fixed_offset());
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().fixed_offset())
}

/// Format a timestamp with a chrono pattern, in the timestamp's own offset.
///
/// Never fails: unparsable input (or an unusable pattern) yields the
/// localized invalid-date indicator.
pub fn format_date<'a>(i18n: &I18n, input: impl Into<DateInput<'a>>, pattern: &str) -> String {
    let parsed = match input.into() {
        DateInput::Text(s) => parse_timestamp(s),
        DateInput::Parsed(dt) => Some(dt),
    };

    let Some(dt) = parsed else {
        return i18n.get("format.invalid_date");
    };

    let mut out = String::new();
    if write!(out, "{}", dt.format(pattern)).is_err() {
        return i18n.get("format.invalid_date");
    }
    out
}

/// Format with the default day/month/year pattern
pub fn format_day<'a>(i18n: &I18n, input: impl Into<DateInput<'a>>) -> String {
    format_date(i18n, input, DATE_PATTERN)
}

/// Format with day/month/year hour:minute
pub fn format_date_time<'a>(i18n: &I18n, input: impl Into<DateInput<'a>>) -> String {
    format_date(i18n, input, DATE_TIME_PATTERN)
}

/// Format a number with exactly `decimals` fractional digits and
/// thousands grouping, using the language's separators.
pub fn format_number(i18n: &I18n, value: f64, decimals: usize) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "\u{221E}".to_string() } else { "-\u{221E}".to_string() };
    }

    let fixed = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };

    let group = i18n.group_separator();
    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(group);
        }
        grouped.push(digit);
    }

    let mut out = String::new();
    // No "-0,00"
    let is_zero = fixed.chars().all(|c| c == '0' || c == '.');
    if value.is_sign_negative() && !is_zero {
        out.push('-');
    }
    out.push_str(&grouped);
    if let Some(frac) = frac_part {
        out.push(i18n.decimal_separator());
        out.push_str(frac);
    }
    out
}

/// Format a consumption quantity with two decimals and the m³ unit
pub fn format_consumption(i18n: &I18n, value: f64) -> String {
    format!("{} {}", format_number(i18n, value, 2), i18n.get("unit.cubic_meters"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt() -> I18n {
        I18n::new("pt")
    }

    #[test]
    fn test_format_iso_date() {
        assert_eq!(format_day(&pt(), "2023-12-25T10:30:00Z"), "25/12/2023");
    }

    #[test]
    fn test_invalid_date_indicator() {
        assert_eq!(format_day(&pt(), "invalid-date"), "Data inv\u{00E1}lida");
        assert_eq!(format_day(&I18n::new("en"), ""), "Invalid date");
    }

    #[test]
    fn test_custom_pattern() {
        assert_eq!(format_date_time(&pt(), "2023-12-25T10:30:00Z"), "25/12/2023 10:30");
    }

    #[test]
    fn test_parsed_and_naive_inputs() {
        let dt = DateTime::parse_from_rfc3339("2024-01-20T10:00:00-03:00").unwrap();
        assert_eq!(format_date_time(&pt(), dt), "20/01/2024 10:00");
        assert_eq!(format_date_time(&pt(), "2024-01-20T08:15"), "20/01/2024 08:15");
        assert_eq!(format_day(&pt(), "2024-02-29"), "29/02/2024");
    }

    #[test]
    fn test_format_consumption() {
        assert_eq!(format_consumption(&pt(), 12.34), "12,34 m\u{00B3}");
        assert_eq!(format_consumption(&pt(), 0.0), "0,00 m\u{00B3}");
        assert_eq!(format_consumption(&pt(), 1000.5), "1.000,50 m\u{00B3}");
    }

    #[test]
    fn test_format_number_english_and_grouping() {
        let en = I18n::new("en");
        assert_eq!(format_number(&en, 1234567.891, 2), "1,234,567.89");
        assert_eq!(format_number(&en, 227.27, 0), "227");
        assert_eq!(format_number(&pt(), -1500.0, 1), "-1.500,0");
        assert_eq!(format_number(&pt(), -0.001, 2), "0,00");
    }
}
