use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use rrule::{RRuleSet, Tz as RRuleTz};
use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

use crate::error::CoreError;
use crate::timezone::validate_timezone;

/// Hard cap on instants produced by a single evaluation. Callers keep the
/// requested window finite (a view is a month or two), so this is never the
/// binding limit for well-formed input.
const MAX_OCCURRENCES: u16 = 1000;

/// Parse-validity cache for rule text, shared across expansion calls.
static RULE_CACHE: OnceLock<Mutex<HashMap<String, bool>>> = OnceLock::new();

/// Prepend a DTSTART header unless the stored rule text already carries one.
fn rule_with_dtstart(rrule: &str, dtstart: DateTime<Utc>) -> String {
    if rrule.contains("DTSTART") {
        rrule.to_string()
    } else {
        format!(
            "DTSTART:{}\nRRULE:{}",
            dtstart.format("%Y%m%dT%H%M%SZ"),
            rrule
        )
    }
}

fn is_rule_valid_cached(rrule: &str) -> bool {
    let cache = RULE_CACHE.get_or_init(|| Mutex::new(HashMap::new()));
    let probe = || {
        rule_with_dtstart(rrule, DateTime::<Utc>::UNIX_EPOCH)
            .parse::<RRuleSet>()
            .is_ok()
    };

    if let Ok(mut cache) = cache.lock() {
        match cache.get(rrule) {
            Some(&is_valid) => is_valid,
            None => {
                let is_valid = probe();
                cache.insert(rrule.to_string(), is_valid);
                is_valid
            }
        }
    } else {
        probe()
    }
}

/// Evaluates an RFC 5545 recurrence rule anchored at a task's start instant.
///
/// Thin wrapper over the `rrule` crate so the rest of the engine only sees
/// UTC instants and a half-open window contract.
#[derive(Debug)]
pub struct RecurrenceEvaluator {
    rule_set: RRuleSet,
}

impl RecurrenceEvaluator {
    /// Parse `rrule` anchored at `dtstart`.
    ///
    /// `dtstart` is an absolute UTC instant; rule text that carries its own
    /// DTSTART line is taken as-is.
    pub fn new(rrule: &str, dtstart: DateTime<Utc>) -> Result<Self, CoreError> {
        let rule_text = rule_with_dtstart(rrule, dtstart);
        let rule_set = rule_text
            .parse::<RRuleSet>()
            .map_err(|e| CoreError::InvalidRule(format!("failed to parse '{rrule}': {e}")))?;

        Ok(Self { rule_set })
    }

    /// Occurrence instants in the half-open window `[start, end)`.
    ///
    /// The window semantics are enforced here, not assumed from the rrule
    /// crate: the query is widened by a second on the lower bound and the
    /// result filtered exactly.
    pub fn occurrences_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Vec<DateTime<Utc>> {
        if end <= start {
            return Vec::new();
        }

        let after = (start - Duration::seconds(1)).with_timezone(&RRuleTz::UTC);
        let before = end.with_timezone(&RRuleTz::UTC);

        let bounded = self.rule_set.clone().after(after).before(before);
        let (instants, _) = bounded.all(MAX_OCCURRENCES);

        instants
            .into_iter()
            .map(|dt| dt.with_timezone(&Utc))
            .filter(|dt| *dt >= start && *dt < end)
            .collect()
    }

    /// The next `count` occurrence instants at or after `from`.
    pub fn preview(&self, from: DateTime<Utc>, count: usize) -> Vec<DateTime<Utc>> {
        let limit = u16::try_from(count.saturating_add(1))
            .unwrap_or(MAX_OCCURRENCES)
            .min(MAX_OCCURRENCES);

        let after = (from - Duration::seconds(1)).with_timezone(&RRuleTz::UTC);
        let bounded = self.rule_set.clone().after(after);
        let (instants, _) = bounded.all(limit);

        instants
            .into_iter()
            .map(|dt| dt.with_timezone(&Utc))
            .filter(|dt| *dt >= from)
            .take(count)
            .collect()
    }

    /// Validate rule text against a timezone without building an evaluator.
    pub fn validate(rrule: &str, timezone: &str) -> Result<(), CoreError> {
        validate_timezone(timezone)?;

        if !is_rule_valid_cached(rrule) {
            return Err(CoreError::InvalidRule(rrule.to_string()));
        }

        Ok(())
    }

    /// Normalize rule text to a canonical form with an explicit zoned DTSTART.
    pub fn normalize(
        rrule: &str,
        dtstart: DateTime<Utc>,
        timezone: &str,
    ) -> Result<String, CoreError> {
        Self::validate(rrule, timezone)?;

        let tz: Tz = timezone
            .parse()
            .map_err(|_| CoreError::InvalidTimezone(timezone.to_string()))?;
        let dtstart_local = dtstart.with_timezone(&tz);

        Ok(format!(
            "DTSTART;TZID={}:{}\nRRULE:{}",
            timezone,
            dtstart_local.format("%Y%m%dT%H%M%S"),
            rrule
        ))
    }
}
