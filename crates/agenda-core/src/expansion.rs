//! Recurrence expansion: turns task definitions plus per-occurrence
//! exceptions into the concrete instances visible in a time window.
//!
//! The pipeline per call is fixed: index exceptions for O(1) lookup, generate
//! candidate instants per task (the bare `dtstart` for single tasks, rule
//! evaluation for recurring ones), merge each candidate with its exception,
//! then sort the combined result. Every per-record failure is contained:
//! a malformed exception or an unparsable rule costs that record or task its
//! place in the output, never the whole call.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::CoreError;
use crate::models::{CalculatedInstance, TaskDefinition, TaskException};
use crate::recurrence::RecurrenceEvaluator;
use crate::timezone::validate_timezone;

/// Canonical UTC key for an instant, at second granularity.
///
/// Exception matching is a plain string-equality join between the key stored
/// with an exception and the key of a regenerated candidate occurrence, so
/// every key in the system must come from this one function. Sub-second
/// precision is dropped on both sides, which is what keeps an exception
/// recorded as `...T09:00:00.250Z` attached to the regenerated
/// `...T09:00:00Z` candidate.
pub fn instant_key(instant: DateTime<Utc>) -> String {
    instant.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Exceptions indexed by task id, then by canonical occurrence key.
///
/// Built once per expansion call and read-only afterwards.
#[derive(Debug, Default)]
pub struct ExceptionIndex {
    by_task: HashMap<Uuid, HashMap<String, TaskException>>,
    skipped: usize,
}

impl ExceptionIndex {
    /// Index a flat exception list.
    ///
    /// Records missing `task_id` or `original_occurrence_time` are counted
    /// and dropped. When two records collide on the same
    /// (task, occurrence) key, the later one in input order wins.
    pub fn build(exceptions: &[TaskException]) -> Self {
        let mut index = Self::default();

        for exception in exceptions {
            let (Some(task_id), Some(original)) =
                (exception.task_id, exception.original_occurrence_time)
            else {
                debug!(
                    exception_id = %exception.id,
                    "exception missing task id or occurrence time, skipping"
                );
                index.skipped += 1;
                continue;
            };

            index
                .by_task
                .entry(task_id)
                .or_default()
                .insert(instant_key(original), exception.clone());
        }

        index
    }

    fn get(&self, task_id: Uuid, key: &str) -> Option<&TaskException> {
        self.by_task.get(&task_id).and_then(|m| m.get(key))
    }

    /// Number of malformed records dropped during construction.
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

/// Diagnostics for one expansion call. Containment made visible: the engine
/// never fails over a single bad record, but callers can see what was
/// dropped.
#[derive(Debug, Clone, Default)]
pub struct ExpansionSummary {
    pub tasks_processed: usize,
    pub instances_emitted: usize,
    pub tasks_skipped: usize,
    pub exceptions_skipped: usize,
    pub errors: Vec<String>,
}

/// Expand `tasks` and `exceptions` into the instances scheduled inside the
/// half-open window `[range_start, range_end)`.
///
/// Output is sorted ascending by `scheduled_time_utc`; ties keep the input
/// task order. Status filtering is the caller's job; whatever list arrives
/// here is expanded.
pub fn expand(
    tasks: &[TaskDefinition],
    exceptions: &[TaskException],
    range_start: DateTime<Utc>,
    range_end: DateTime<Utc>,
) -> Vec<CalculatedInstance> {
    expand_with_summary(tasks, exceptions, range_start, range_end).0
}

/// Like [`expand`], also returning the per-call diagnostics.
pub fn expand_with_summary(
    tasks: &[TaskDefinition],
    exceptions: &[TaskException],
    range_start: DateTime<Utc>,
    range_end: DateTime<Utc>,
) -> (Vec<CalculatedInstance>, ExpansionSummary) {
    let mut summary = ExpansionSummary::default();

    // A caller programming error, but one bad view request must not take
    // down the batch it shares a process with.
    if range_end < range_start {
        warn!(%range_start, %range_end, "expansion range end precedes start");
        summary
            .errors
            .push(format!("invalid range: end {range_end} precedes start {range_start}"));
        return (Vec::new(), summary);
    }

    let index = ExceptionIndex::build(exceptions);
    summary.exceptions_skipped = index.skipped();

    let mut instances = Vec::new();
    for task in tasks {
        summary.tasks_processed += 1;

        let Some(dtstart) = task.dtstart else {
            warn!(task_id = %task.id, "task has no start instant, skipping");
            summary.tasks_skipped += 1;
            continue;
        };
        let Some(timezone) = task.timezone.as_deref() else {
            warn!(task_id = %task.id, "task has no timezone, skipping");
            summary.tasks_skipped += 1;
            continue;
        };
        if let Err(err) = validate_timezone(timezone) {
            warn!(task_id = %task.id, %err, "task timezone is invalid, skipping");
            summary.tasks_skipped += 1;
            summary.errors.push(format!("task {}: {err}", task.id));
            continue;
        }

        match &task.rrule {
            None => {
                if let Some(instance) =
                    expand_single(task, dtstart, timezone, &index, range_start, range_end)
                {
                    instances.push(instance);
                }
            }
            Some(rrule) => {
                match expand_recurring(
                    task,
                    rrule,
                    dtstart,
                    timezone,
                    &index,
                    range_start,
                    range_end,
                ) {
                    Ok(mut generated) => instances.append(&mut generated),
                    Err(err) => {
                        warn!(task_id = %task.id, %err, "recurrence evaluation failed, skipping task");
                        summary.tasks_skipped += 1;
                        summary.errors.push(format!("task {}: {err}", task.id));
                    }
                }
            }
        }
    }

    // Stable sort: tasks emitted in input order, so equal instants keep it.
    instances.sort_by_key(|instance| instance.scheduled_time_utc);
    summary.instances_emitted = instances.len();

    (instances, summary)
}

/// One candidate at `dtstart`, if it falls inside the window.
fn expand_single(
    task: &TaskDefinition,
    dtstart: DateTime<Utc>,
    timezone: &str,
    index: &ExceptionIndex,
    range_start: DateTime<Utc>,
    range_end: DateTime<Utc>,
) -> Option<CalculatedInstance> {
    if dtstart < range_start || dtstart >= range_end {
        return None;
    }

    let exception = index.get(task.id, &instant_key(dtstart));
    merge_instance(task, dtstart, timezone, exception)
}

/// Every rule-generated candidate inside the window.
fn expand_recurring(
    task: &TaskDefinition,
    rrule: &str,
    dtstart: DateTime<Utc>,
    timezone: &str,
    index: &ExceptionIndex,
    range_start: DateTime<Utc>,
    range_end: DateTime<Utc>,
) -> Result<Vec<CalculatedInstance>, CoreError> {
    let evaluator = RecurrenceEvaluator::new(rrule, dtstart)?;

    let mut out = Vec::new();
    for occurrence in evaluator.occurrences_between(range_start, range_end) {
        let exception = index.get(task.id, &instant_key(occurrence));
        if let Some(instance) = merge_instance(task, occurrence, timezone, exception) {
            out.push(instance);
        }
    }

    Ok(out)
}

/// Merge a base occurrence with its exception, or suppress it.
///
/// A cancelled exception suppresses the occurrence outright; its other
/// fields are ignored. Otherwise exception fields override the task's
/// field-by-field, and `original_occurrence_time_utc` always stays the
/// unmodified instant.
fn merge_instance(
    task: &TaskDefinition,
    original: DateTime<Utc>,
    timezone: &str,
    exception: Option<&TaskException>,
) -> Option<CalculatedInstance> {
    if exception.is_some_and(|ex| ex.is_cancelled) {
        return None;
    }

    let id = exception.map_or_else(
        || format!("{}-{}", task.id, instant_key(original)),
        |ex| ex.id.to_string(),
    );

    Some(CalculatedInstance {
        id,
        task_id: task.id,
        original_occurrence_time_utc: original,
        scheduled_time_utc: exception
            .and_then(|ex| ex.new_start_time)
            .unwrap_or(original),
        duration_minutes: exception
            .and_then(|ex| ex.new_duration_minutes)
            .unwrap_or(task.duration_minutes),
        title: exception
            .and_then(|ex| ex.override_title.clone())
            .unwrap_or_else(|| task.title.clone()),
        is_complete: exception.is_some_and(|ex| ex.is_complete),
        completion_time: exception.and_then(|ex| ex.completion_time),
        is_cancelled: false,
        icon_name: exception
            .and_then(|ex| ex.icon_name.clone())
            .or_else(|| task.icon_name.clone()),
        timezone: timezone.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn instant(y: i32, mo: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, 0, 0).unwrap()
    }

    fn test_task(title: &str) -> TaskDefinition {
        TaskDefinition {
            title: title.to_string(),
            dtstart: Some(instant(2024, 1, 1, 9)),
            duration_minutes: 45,
            icon_name: Some("sun".to_string()),
            ..Default::default()
        }
    }

    fn exception_at(task: &TaskDefinition, original: DateTime<Utc>) -> TaskException {
        TaskException {
            task_id: Some(task.id),
            original_occurrence_time: Some(original),
            ..Default::default()
        }
    }

    mod instant_key_tests {
        use super::*;

        #[test]
        fn test_second_granularity() {
            let base = instant(2024, 1, 8, 9);
            assert_eq!(instant_key(base), "2024-01-08T09:00:00Z");
            assert_eq!(
                instant_key(base + Duration::milliseconds(250)),
                instant_key(base)
            );
            assert_eq!(
                instant_key(base + Duration::nanoseconds(999)),
                instant_key(base)
            );
        }
    }

    mod exception_index_tests {
        use super::*;

        #[test]
        fn test_build_and_lookup() {
            let task = test_task("a");
            let at = instant(2024, 1, 8, 9);
            let index = ExceptionIndex::build(&[exception_at(&task, at)]);

            assert!(index.get(task.id, &instant_key(at)).is_some());
            assert!(index.get(task.id, &instant_key(at + Duration::days(1))).is_none());
            assert!(index.get(Uuid::now_v7(), &instant_key(at)).is_none());
            assert_eq!(index.skipped(), 0);
        }

        #[test]
        fn test_malformed_records_are_dropped() {
            let task = test_task("a");
            let at = instant(2024, 1, 8, 9);

            let missing_task = TaskException {
                original_occurrence_time: Some(at),
                ..Default::default()
            };
            let missing_time = TaskException {
                task_id: Some(task.id),
                ..Default::default()
            };

            let index =
                ExceptionIndex::build(&[missing_task, missing_time, exception_at(&task, at)]);
            assert_eq!(index.skipped(), 2);
            assert!(index.get(task.id, &instant_key(at)).is_some());
        }

        #[test]
        fn test_last_record_wins_on_collision() {
            let task = test_task("a");
            let at = instant(2024, 1, 8, 9);

            let first = TaskException {
                is_cancelled: true,
                ..exception_at(&task, at)
            };
            let second = TaskException {
                override_title: Some("rescheduled".to_string()),
                ..exception_at(&task, at)
            };
            let second_id = second.id;

            let index = ExceptionIndex::build(&[first, second]);
            let winner = index.get(task.id, &instant_key(at)).unwrap();
            assert_eq!(winner.id, second_id);
            assert!(!winner.is_cancelled);
        }
    }

    mod merge_tests {
        use super::*;

        #[test]
        fn test_plain_occurrence() {
            let task = test_task("standup");
            let at = instant(2024, 1, 8, 9);

            let instance = merge_instance(&task, at, "UTC", None).unwrap();
            assert_eq!(instance.id, format!("{}-2024-01-08T09:00:00Z", task.id));
            assert_eq!(instance.original_occurrence_time_utc, at);
            assert_eq!(instance.scheduled_time_utc, at);
            assert_eq!(instance.duration_minutes, 45);
            assert_eq!(instance.title, "standup");
            assert!(!instance.is_complete);
            assert!(instance.completion_time.is_none());
            assert!(!instance.is_cancelled);
            assert_eq!(instance.icon_name.as_deref(), Some("sun"));
            assert_eq!(instance.timezone, "UTC");
        }

        #[test]
        fn test_cancellation_suppresses() {
            let task = test_task("standup");
            let at = instant(2024, 1, 8, 9);
            let exception = TaskException {
                is_cancelled: true,
                // Ignored on a cancelled exception.
                override_title: Some("should not matter".to_string()),
                ..exception_at(&task, at)
            };

            assert!(merge_instance(&task, at, "UTC", Some(&exception)).is_none());
        }

        #[test]
        fn test_exception_fields_override() {
            let task = test_task("standup");
            let at = instant(2024, 1, 8, 9);
            let moved_to = instant(2024, 1, 8, 14);
            let done_at = instant(2024, 1, 8, 15);
            let exception = TaskException {
                new_start_time: Some(moved_to),
                new_duration_minutes: Some(15),
                override_title: Some("standup (moved)".to_string()),
                icon_name: Some("moon".to_string()),
                is_complete: true,
                completion_time: Some(done_at),
                ..exception_at(&task, at)
            };

            let instance = merge_instance(&task, at, "UTC", Some(&exception)).unwrap();
            assert_eq!(instance.id, exception.id.to_string());
            assert_eq!(instance.original_occurrence_time_utc, at);
            assert_eq!(instance.scheduled_time_utc, moved_to);
            assert_eq!(instance.duration_minutes, 15);
            assert_eq!(instance.title, "standup (moved)");
            assert!(instance.is_complete);
            assert_eq!(instance.completion_time, Some(done_at));
            assert_eq!(instance.icon_name.as_deref(), Some("moon"));
        }

        #[test]
        fn test_completion_only_keeps_schedule() {
            let task = test_task("standup");
            let at = instant(2024, 1, 8, 9);
            let exception = TaskException {
                is_complete: true,
                ..exception_at(&task, at)
            };

            let instance = merge_instance(&task, at, "UTC", Some(&exception)).unwrap();
            assert_eq!(instance.scheduled_time_utc, at);
            assert_eq!(instance.duration_minutes, 45);
            assert!(instance.is_complete);
        }
    }
}
