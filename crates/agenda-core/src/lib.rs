//! # Agenda Core Library
//!
//! The recurrence expansion engine behind the Agenda planner: given task
//! definitions (one-off or recurring), per-occurrence exceptions, and a time
//! window, it computes the exact set of concrete instances to display.
//!
//! ## Features
//!
//! - **RFC 5545 recurrence**: rule evaluation via the `rrule` crate, anchored
//!   at each task's start instant
//! - **Per-occurrence exceptions**: move, retitle, re-time, complete, or
//!   cancel a single occurrence without touching the series
//! - **Timezone awareness**: IANA zone validation and display conversion
//! - **Deterministic output**: stable, globally time-sorted instances;
//!   identical inputs always produce identical output
//! - **Containment**: malformed records and unparsable rules cost only
//!   themselves, never the whole expansion call
//!
//! ## Core Modules
//!
//! - [`models`]: task, exception, and instance records
//! - [`expansion`]: exception indexing, merge rules, and the `expand` entry
//!   point
//! - [`recurrence`]: recurrence-rule evaluation
//! - [`timezone`]: timezone utilities and validation
//! - [`error`]: error types
//!
//! ## Example Usage
//!
//! ```rust
//! use agenda_core::expansion::expand;
//! use agenda_core::models::TaskDefinition;
//! use chrono::{Duration, TimeZone, Utc};
//!
//! let dtstart = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
//! let task = TaskDefinition {
//!     title: "Morning review".to_string(),
//!     dtstart: Some(dtstart),
//!     rrule: Some("FREQ=DAILY".to_string()),
//!     timezone: Some("UTC".to_string()),
//!     ..Default::default()
//! };
//!
//! let instances = expand(&[task], &[], dtstart, dtstart + Duration::days(7));
//! assert_eq!(instances.len(), 7);
//! ```

pub mod error;
pub mod expansion;
pub mod models;
pub mod recurrence;
pub mod timezone;
