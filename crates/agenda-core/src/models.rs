use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DefaultOnError};
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Lifecycle state of a task series.
///
/// The expansion engine expands whatever list it is given; filtering by
/// status is the caller's job.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Active,
    Paused,
    Completed,
    Archived,
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid task status: {0}")]
pub struct ParseTaskStatusError(String);

impl FromStr for TaskStatus {
    type Err = ParseTaskStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(TaskStatus::Active),
            "paused" => Ok(TaskStatus::Paused),
            "completed" => Ok(TaskStatus::Completed),
            "archived" => Ok(TaskStatus::Archived),
            _ => Err(ParseTaskStatusError(s.to_string())),
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Active => write!(f, "active"),
            TaskStatus::Paused => write!(f, "paused"),
            TaskStatus::Completed => write!(f, "completed"),
            TaskStatus::Archived => write!(f, "archived"),
        }
    }
}

/// A recurring or single task series as stored by the caller.
///
/// `dtstart` is an absolute UTC instant; the `timezone` label rides along for
/// display and does not shift it. Both are optional because upstream data may
/// be incomplete, in which case the engine skips the task instead of failing
/// the whole expansion. An instant that fails to parse during
/// deserialization also becomes `None` rather than aborting the batch.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDefinition {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    #[serde(default)]
    #[serde_as(deserialize_as = "DefaultOnError")]
    pub dtstart: Option<DateTime<Utc>>,
    pub duration_minutes: u32,
    /// RFC 5545 recurrence rule; absence means a single occurrence at `dtstart`.
    #[serde(default)]
    pub rrule: Option<String>,
    #[serde(default)]
    pub icon_name: Option<String>,
    /// IANA zone the series is anchored to, copied verbatim to output.
    #[serde(default)]
    pub timezone: Option<String>,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for TaskDefinition {
    fn default() -> Self {
        Self {
            id: Uuid::now_v7(),
            owner_id: Uuid::now_v7(),
            title: String::new(),
            dtstart: None,
            duration_minutes: 30,
            rrule: None,
            icon_name: None,
            timezone: Some("UTC".to_string()),
            status: TaskStatus::Active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}

/// An override or cancellation attached to one occurrence of one task.
///
/// `original_occurrence_time` is the unmodified instant the occurrence would
/// have had; it is the join key back to the generated candidate, never the
/// overridden time. At most one exception exists per
/// (`task_id`, `original_occurrence_time`) pair.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskException {
    pub id: Uuid,
    #[serde(default)]
    pub task_id: Option<Uuid>,
    #[serde(default)]
    #[serde_as(deserialize_as = "DefaultOnError")]
    pub original_occurrence_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub new_start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub new_duration_minutes: Option<u32>,
    #[serde(default)]
    pub override_title: Option<String>,
    #[serde(default)]
    pub icon_name: Option<String>,
    /// Suppresses the occurrence entirely; all other override fields are
    /// ignored when set.
    #[serde(default)]
    pub is_cancelled: bool,
    #[serde(default)]
    pub is_complete: bool,
    #[serde(default)]
    pub completion_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for TaskException {
    fn default() -> Self {
        Self {
            id: Uuid::now_v7(),
            task_id: None,
            original_occurrence_time: None,
            new_start_time: None,
            new_duration_minutes: None,
            override_title: None,
            icon_name: None,
            is_cancelled: false,
            is_complete: false,
            completion_time: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}

/// A concrete occurrence ready for display. Recomputed on every expansion
/// call, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CalculatedInstance {
    /// The exception's id when one applied, otherwise a composite of the
    /// task id and the canonical original instant.
    pub id: String,
    pub task_id: Uuid,
    pub original_occurrence_time_utc: DateTime<Utc>,
    /// Equal to the original instant unless an exception moved it.
    pub scheduled_time_utc: DateTime<Utc>,
    pub duration_minutes: u32,
    pub title: String,
    pub is_complete: bool,
    pub completion_time: Option<DateTime<Utc>>,
    /// Always `false` on emitted records; cancelled occurrences are never
    /// emitted.
    pub is_cancelled: bool,
    pub icon_name: Option<String>,
    /// Copied from the parent definition, not the exception.
    pub timezone: String,
}
