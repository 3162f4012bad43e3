use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use owo_colors::OwoColorize;

use agenda_core::expansion::expand_with_summary;
use agenda_core::models::{TaskDefinition, TaskException};

use crate::cli::ExpandCommand;
use crate::config::Config;
use crate::util::parse_instant;
use crate::views::table;

pub fn run(command: ExpandCommand, config: &Config) -> Result<()> {
    let tasks: Vec<TaskDefinition> = read_records(&command.tasks)?;
    let exceptions: Vec<TaskException> = match &command.exceptions {
        Some(path) => read_records(path)?,
        None => Vec::new(),
    };

    let range_start = match &command.from {
        Some(value) => parse_instant(value)?,
        None => Utc::now(),
    };
    let range_end = match &command.to {
        Some(value) => parse_instant(value)?,
        None => range_start + Duration::days(i64::from(config.lookahead_days)),
    };

    let (instances, summary) = expand_with_summary(&tasks, &exceptions, range_start, range_end);

    if command.json {
        println!("{}", serde_json::to_string_pretty(&instances)?);
    } else {
        let timezone = command
            .timezone
            .as_deref()
            .unwrap_or(&config.default_timezone);
        table::display_instances(&instances, timezone)?;

        if summary.tasks_skipped > 0 || summary.exceptions_skipped > 0 {
            eprintln!(
                "{} {} of {} tasks and {} exceptions skipped",
                "Note:".yellow(),
                summary.tasks_skipped,
                summary.tasks_processed,
                summary.exceptions_skipped
            );
        }
    }

    for error in &summary.errors {
        eprintln!("{} {}", "Warning:".yellow(), error);
    }

    Ok(())
}

fn read_records<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("cannot parse {}", path.display()))
}
