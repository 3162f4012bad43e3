use anyhow::Result;
use chrono::Utc;

use agenda_core::recurrence::RecurrenceEvaluator;
use agenda_core::timezone::{format_with_timezone, validate_timezone};

use crate::cli::PreviewCommand;
use crate::config::Config;
use crate::util::parse_instant;

pub fn run(command: PreviewCommand, config: &Config) -> Result<()> {
    let dtstart = match &command.dtstart {
        Some(value) => parse_instant(value)?,
        None => Utc::now(),
    };
    let timezone = command
        .timezone
        .as_deref()
        .unwrap_or(&config.default_timezone);
    validate_timezone(timezone)?;

    let evaluator = RecurrenceEvaluator::new(&command.rrule, dtstart)?;
    let occurrences = evaluator.preview(dtstart, command.count);

    if occurrences.is_empty() {
        println!("Rule produces no occurrences at or after the anchor.");
        return Ok(());
    }

    for occurrence in occurrences {
        println!(
            "{}",
            format_with_timezone(occurrence, timezone, "%Y-%m-%d %H:%M %Z")?
        );
    }

    Ok(())
}
