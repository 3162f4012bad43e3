use anyhow::Result;
use owo_colors::OwoColorize;

use agenda_core::recurrence::RecurrenceEvaluator;

use crate::cli::ValidateCommand;
use crate::config::Config;
use crate::util::parse_instant;

pub fn run(command: ValidateCommand, config: &Config) -> Result<()> {
    let timezone = command
        .timezone
        .as_deref()
        .unwrap_or(&config.default_timezone);

    RecurrenceEvaluator::validate(&command.rrule, timezone)?;
    println!("{} rule is valid for {}", "OK".green().bold(), timezone);

    if let Some(dtstart) = &command.dtstart {
        let anchor = parse_instant(dtstart)?;
        let normalized = RecurrenceEvaluator::normalize(&command.rrule, anchor, timezone)?;
        println!("Normalized: {}", normalized.replace('\n', " "));
    }

    Ok(())
}
