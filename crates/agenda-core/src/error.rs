use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid recurrence rule: {0}")]
    InvalidRule(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
