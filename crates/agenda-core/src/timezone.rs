use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Mutex, OnceLock};

use crate::error::CoreError;

/// Validity cache for IANA names; the same handful of zones is checked for
/// every task on every expansion call.
static TIMEZONE_CACHE: OnceLock<Mutex<HashMap<String, bool>>> = OnceLock::new();

/// Validate an IANA timezone name.
pub fn validate_timezone(timezone: &str) -> Result<(), CoreError> {
    let cache = TIMEZONE_CACHE.get_or_init(|| Mutex::new(HashMap::new()));

    let is_valid = if let Ok(mut cache) = cache.lock() {
        match cache.get(timezone) {
            Some(&is_valid) => is_valid,
            None => {
                let is_valid = Tz::from_str(timezone).is_ok();
                cache.insert(timezone.to_string(), is_valid);
                is_valid
            }
        }
    } else {
        // Poisoned lock: validate without caching.
        Tz::from_str(timezone).is_ok()
    };

    if is_valid {
        Ok(())
    } else {
        Err(CoreError::InvalidTimezone(timezone.to_string()))
    }
}

/// Format a UTC instant in the given zone for display.
pub fn format_with_timezone(
    datetime: DateTime<Utc>,
    timezone: &str,
    format: &str,
) -> Result<String, CoreError> {
    let tz: Tz = timezone
        .parse()
        .map_err(|_| CoreError::InvalidTimezone(timezone.to_string()))?;

    let local_dt = datetime.with_timezone(&tz);
    Ok(local_dt.format(format).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_validate_timezone() {
        assert!(validate_timezone("UTC").is_ok());
        assert!(validate_timezone("America/New_York").is_ok());
        assert!(validate_timezone("Invalid/Timezone").is_err());
        // Second lookup hits the cache and must agree.
        assert!(validate_timezone("Invalid/Timezone").is_err());
    }

    #[test]
    fn test_format_with_timezone() {
        let instant = Utc.with_ymd_and_hms(2024, 1, 15, 14, 30, 0).unwrap();
        let formatted = format_with_timezone(instant, "America/New_York", "%H:%M").unwrap();
        assert_eq!(formatted, "09:30");

        assert!(format_with_timezone(instant, "Not/AZone", "%H:%M").is_err());
    }
}
