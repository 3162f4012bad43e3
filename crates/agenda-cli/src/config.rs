use chrono_tz::Tz;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;
use std::str::FromStr;

#[derive(Deserialize, Debug)]
pub struct Config {
    /// User's default timezone (IANA format)
    #[serde(default = "detect_system_timezone")]
    pub default_timezone: String,
    /// Default expansion window in days when --to is omitted
    #[serde(default = "default_lookahead_days")]
    pub lookahead_days: u32,
}

fn default_lookahead_days() -> u32 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_timezone: detect_system_timezone(),
            lookahead_days: default_lookahead_days(),
        }
    }
}

impl Config {
    pub fn new() -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Toml::file("agenda.toml"))
            .merge(Env::prefixed("AGENDA_"))
            .extract()
    }
}

/// Validates that a timezone string is a valid IANA timezone name
pub fn validate_timezone(timezone: &str) -> Result<Tz, String> {
    Tz::from_str(timezone).map_err(|_| {
        format!("Invalid timezone: '{timezone}'. Use IANA timezone names like 'America/New_York'")
    })
}

/// Detects the system timezone, falling back to UTC if detection fails
pub fn detect_system_timezone() -> String {
    // Method 1: Check TZ environment variable
    if let Ok(tz) = std::env::var("TZ") {
        if validate_timezone(&tz).is_ok() {
            return tz;
        }
    }

    // Method 2: Try to read from /etc/timezone (Linux)
    #[cfg(target_os = "linux")]
    {
        if let Ok(tz) = std::fs::read_to_string("/etc/timezone") {
            let tz = tz.trim();
            if validate_timezone(tz).is_ok() {
                return tz.to_string();
            }
        }
    }

    // Method 3: Platform-independent detection
    if let Ok(local_tz) = iana_time_zone::get_timezone() {
        if validate_timezone(&local_tz).is_ok() {
            return local_tz;
        }
    }

    // Fallback to UTC
    "UTC".to_string()
}
