//! Shared types for the progress watchdog
//!
//! Contains the fleet/continue-code domain types, error types and the
//! tracing setup used by the watchdog binary.

pub mod errors;
pub mod logging;
pub mod types;

pub use errors::*;
pub use types::*;
