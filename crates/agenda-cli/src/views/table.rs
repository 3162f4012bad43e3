use anyhow::Result;
use comfy_table::{Attribute, Cell, Row, Table};

use agenda_core::models::CalculatedInstance;
use agenda_core::timezone::format_with_timezone;

pub fn display_instances(instances: &[CalculatedInstance], timezone: &str) -> Result<()> {
    if instances.is_empty() {
        println!("No instances in this window.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["When", "Duration", "Title", "Done", "Task"]);

    for instance in instances {
        let mut row = Row::new();

        let when = format_with_timezone(instance.scheduled_time_utc, timezone, "%Y-%m-%d %H:%M %Z")?;
        let mut when_cell = Cell::new(when);
        let mut title_cell = Cell::new(&instance.title);

        if instance.is_complete {
            title_cell = title_cell
                .add_attribute(Attribute::CrossedOut)
                .fg(comfy_table::Color::DarkGrey);
            when_cell = when_cell.fg(comfy_table::Color::DarkGrey);
        } else if instance.scheduled_time_utc != instance.original_occurrence_time_utc {
            // Moved via exception.
            title_cell = title_cell.fg(comfy_table::Color::Yellow);
        }

        row.add_cell(when_cell);
        row.add_cell(Cell::new(format!("{} min", instance.duration_minutes)));
        row.add_cell(title_cell);
        row.add_cell(Cell::new(if instance.is_complete { "✓" } else { "" }));
        row.add_cell(Cell::new(&instance.task_id.to_string()[..8]));
        table.add_row(row);
    }

    println!("{table}");
    Ok(())
}
