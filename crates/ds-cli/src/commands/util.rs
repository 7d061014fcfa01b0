//! Shared helpers for command implementations.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};

/// Parses a user-supplied instant.
///
/// Accepts RFC 3339 (`2024-04-01T09:30:00Z`) or a bare date
/// (`2024-04-01`), taken as midnight UTC.
pub fn parse_instant(value: &str) -> Result<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(value) {
        return Ok(at.with_timezone(&Utc));
    }
    let date: NaiveDate = value.parse().with_context(|| {
        format!("invalid instant: {value} (expected RFC 3339 or YYYY-MM-DD)")
    })?;
    Ok(date.and_hms_opt(0, 0, 0).unwrap().and_utc())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn parses_bare_date_as_midnight_utc() {
        let at = parse_instant("2024-04-01").unwrap();
        assert_eq!(at, Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn parses_rfc3339() {
        let at = parse_instant("2024-04-01T09:30:00+09:00").unwrap();
        assert_eq!(at, Utc.with_ymd_and_hms(2024, 4, 1, 0, 30, 0).unwrap());
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_instant("next tuesday").is_err());
    }
}
