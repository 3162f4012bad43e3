use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Expand recurring task definitions into concrete calendar instances
#[derive(Parser, Debug)]
#[command(name = "agenda", author, version, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Expand tasks and exceptions into the instances of a time window
    Expand(ExpandCommand),
    /// Preview upcoming occurrences of a recurrence rule
    Preview(PreviewCommand),
    /// Validate a recurrence rule and timezone
    Validate(ValidateCommand),
}

#[derive(Parser, Debug, Clone)]
pub struct ExpandCommand {
    /// JSON file with task definitions
    #[clap(long)]
    pub tasks: PathBuf,

    /// JSON file with per-occurrence exceptions
    #[clap(long)]
    pub exceptions: Option<PathBuf>,

    /// Window start, inclusive (RFC 3339 or YYYY-MM-DD; defaults to now)
    #[clap(long)]
    pub from: Option<String>,

    /// Window end, exclusive (RFC 3339 or YYYY-MM-DD; defaults to the
    /// configured lookahead after the start)
    #[clap(long)]
    pub to: Option<String>,

    /// Timezone for table display (IANA name; defaults to the configured one)
    #[clap(long)]
    pub timezone: Option<String>,

    /// Emit instances as JSON instead of a table
    #[clap(long)]
    pub json: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct PreviewCommand {
    /// Raw RFC 5545 recurrence rule, e.g. 'FREQ=WEEKLY;INTERVAL=2'
    pub rrule: String,

    /// Anchor instant (RFC 3339 or YYYY-MM-DD; defaults to now)
    #[clap(long)]
    pub dtstart: Option<String>,

    /// Number of occurrences to show
    #[clap(long, default_value_t = 10)]
    pub count: usize,

    /// Timezone for display
    #[clap(long)]
    pub timezone: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct ValidateCommand {
    /// Recurrence rule to validate
    pub rrule: String,

    /// Timezone to validate against (defaults to the configured one)
    #[clap(long)]
    pub timezone: Option<String>,

    /// Anchor instant; when given, the normalized rule is printed
    #[clap(long)]
    pub dtstart: Option<String>,
}
