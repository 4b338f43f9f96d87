//! Shared error types for the progress watchdog

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SharedError {
    #[error("Invalid configuration: {field} = {value}")]
    InvalidConfig { field: String, value: String },

    #[error("Logging setup failed: {message}")]
    LoggingError { message: String },
}

pub type SharedResult<T> = Result<T, SharedError>;
