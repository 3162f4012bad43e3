use anyhow::{anyhow, Result};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};

/// Parse a user-supplied instant: RFC 3339, or a bare date taken as
/// midnight UTC.
pub fn parse_instant(value: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        let midnight = date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| anyhow!("invalid date '{value}'"))?;
        return Ok(Utc.from_utc_datetime(&midnight));
    }

    Err(anyhow!(
        "unrecognized instant '{value}', expected RFC 3339 (2024-01-01T09:00:00Z) or YYYY-MM-DD"
    ))
}
