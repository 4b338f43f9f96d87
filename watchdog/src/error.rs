//! Watchdog error types

use shared::SharedError;
use thiserror::Error;

/// Result type for watchdog operations
pub type WatchdogResult<T> = Result<T, WatchdogError>;

/// Watchdog error types
///
/// Every variant that reaches the top-level run loop ends the process with a
/// non-zero exit status.
#[derive(Error, Debug)]
pub enum WatchdogError {
    #[error("Listing fleet instances failed for selector '{selector}': {message}")]
    FleetListFailed { selector: String, message: String },

    #[error("Patching annotations of '{record}' failed: {message}")]
    AnnotationPatchFailed { record: String, message: String },

    #[error("Fleet client bootstrap failed: {message}")]
    ClientBootstrap { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Job queue closed")]
    QueueClosed,

    #[error("Worker task failed: {0}")]
    WorkerPanicked(#[from] tokio::task::JoinError),

    #[error("Shared component error: {0}")]
    SharedError(#[from] SharedError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl WatchdogError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    pub fn bootstrap(message: impl Into<String>) -> Self {
        Self::ClientBootstrap {
            message: message.into(),
        }
    }
}

/// Why a call to a single team instance did not produce a usable answer
///
/// These are recoverable: they are logged and the next discovery cycle retries.
#[derive(Error, Debug)]
pub enum InstanceCallFailure {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("unexpected response status {status} from {url}")]
    UnexpectedStatus { url: String, status: u16 },

    #[error("malformed response body from {url}: {message}")]
    MalformedBody { url: String, message: String },

    #[error("invalid instance url '{url}': {message}")]
    InvalidUrl { url: String, message: String },
}
