use clap::Parser;
use owo_colors::{OwoColorize, Style};
use tracing_subscriber::EnvFilter;

use agenda_core::error::CoreError;

mod cli;
mod commands;
mod config;
mod util;
mod views;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = config::Config::new().unwrap_or_default();
    let cli = cli::Cli::parse();

    let result = match cli.command {
        cli::Commands::Expand(command) => commands::expand::run(command, &config),
        cli::Commands::Preview(command) => commands::preview::run(command, &config),
        cli::Commands::Validate(command) => commands::validate::run(command, &config),
    };

    if let Err(e) = result {
        handle_error(e);
        std::process::exit(1);
    }
}

fn handle_error(err: anyhow::Error) {
    let error_style = Style::new().red().bold();

    if let Some(core_error) = err.downcast_ref::<CoreError>() {
        match core_error {
            CoreError::InvalidTimezone(tz) => {
                eprintln!(
                    "{} Unknown timezone '{}'. Use IANA names like 'Europe/Berlin'.",
                    "Error:".style(error_style),
                    tz.yellow()
                );
            }
            CoreError::InvalidRule(msg) => {
                eprintln!("{} Invalid recurrence rule: {}", "Error:".style(error_style), msg);
            }
            CoreError::InvalidInput(msg) => {
                eprintln!("{} {}", "Error:".style(error_style), msg);
            }
        }
    } else {
        eprintln!("{} {:#}", "Error:".style(error_style), err);
    }
}
