//! Progress watchdog library
//!
//! Keeps the continue code reported by each running team instance in sync with
//! the durable copy stored as an annotation on the instance's record. A
//! discovery loop lists ready instances and a fixed pool of workers runs the
//! compare-and-reconcile procedure for each one.

pub mod core;
pub mod error;
pub mod services;
pub mod traits;
pub mod types;
pub mod watchdog_impl;

// Re-export main types
pub use error::{InstanceCallFailure, WatchdogError, WatchdogResult};
pub use traits::*;
pub use types::*;
pub use watchdog_impl::Watchdog;
