//! Shared utilities for CLI commands.

use std::sync::LazyLock;

use anyhow::Context;
use chrono::{DateTime, Duration, NaiveDate};
use regex::Regex;

/// Pre-compiled regex for relative date parsing.
static RELATIVE_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\s+(day|week)s?\s+ago$").unwrap());

/// Conservative bounds for relative date parsing (~1000 years in days).
const MAX_RELATIVE_DAYS: i64 = 1000 * 365;

/// Parse a date string as a calendar date, an RFC 3339 timestamp, or a
/// relative date counted back from `today`.
///
/// Supports:
/// - Calendar date: "2024-12-31"
/// - RFC 3339: "2024-12-31T10:30:00Z" (the UTC date is used)
/// - Relative: "30 days ago", "2 weeks ago", "1 day ago"
pub fn parse_date(s: &str, today: NaiveDate) -> anyhow::Result<NaiveDate> {
    let s = s.trim();

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.naive_utc().date());
    }

    let Some(caps) = RELATIVE_DATE_RE.captures(s) else {
        anyhow::bail!(
            "Invalid date: {s}. Use YYYY-MM-DD (e.g., 2024-12-31) or relative (e.g., '30 days ago')"
        );
    };

    let n: i64 = caps[1]
        .parse()
        .context("failed to parse number in relative date")?;

    let (max_for_unit, days_per_unit) = match &caps[2] {
        "day" => (MAX_RELATIVE_DAYS, 1),
        "week" => (MAX_RELATIVE_DAYS / 7, 7),
        unit => anyhow::bail!("Unknown date unit: {unit}"),
    };

    if n > max_for_unit {
        anyhow::bail!("Relative date value too large: {n} {}", &caps[2]);
    }

    Ok(today - Duration::days(n * days_per_unit))
}

/// Formats milliseconds as duration string.
/// Returns "Xh Ym" if >= 1 hour, "Xm" if < 1 hour.
pub fn format_duration(ms: u64) -> String {
    let total_minutes = ms / 60_000;
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;

    if hours >= 1 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

/// Formats milliseconds as minutes with two decimals, e.g. "12.50".
#[allow(clippy::cast_precision_loss)]
pub fn format_minutes(ms: u64) -> String {
    format!("{:.2}", ms as f64 / 60_000.0)
}

/// Inserts thousands separators: 1234567 -> "1,234,567".
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 15).unwrap()
    }

    #[test]
    fn test_parse_date_calendar() {
        let date = parse_date("2024-12-31", today()).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 12, 31).unwrap());
    }

    #[test]
    fn test_parse_date_rfc3339_uses_utc_date() {
        let date = parse_date("2024-12-31T23:30:00-02:00", today()).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
    }

    #[test]
    fn test_parse_date_relative_days() {
        let date = parse_date("30 days ago", today()).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2025, 2, 13).unwrap());
    }

    #[test]
    fn test_parse_date_relative_weeks() {
        let date = parse_date("2 weeks ago", today()).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
    }

    #[test]
    fn test_parse_date_singular_form() {
        let date = parse_date("1 day ago", today()).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2025, 3, 14).unwrap());
    }

    #[test]
    fn test_parse_date_invalid() {
        assert!(parse_date("last tuesday", today()).is_err());
        assert!(parse_date("2024-02-30", today()).is_err());
        assert!(parse_date("", today()).is_err());
    }

    #[test]
    fn test_parse_date_too_large() {
        assert!(parse_date("99999999 weeks ago", today()).is_err());
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(9_000_000), "2h 30m");
        assert_eq!(format_duration(3_600_000), "1h 0m");
        assert_eq!(format_duration(2_754_000), "45m");
        assert_eq!(format_duration(0), "0m");
    }

    #[test]
    fn test_format_minutes() {
        assert_eq!(format_minutes(750_000), "12.50");
        assert_eq!(format_minutes(0), "0.00");
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1_000), "1,000");
        assert_eq!(group_thousands(1_234_567), "1,234,567");
    }
}
