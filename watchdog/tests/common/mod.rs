//! Common test utilities and infrastructure
//!
//! Shared fixtures and helpers for the watchdog end-to-end suites.

pub mod fixtures;
pub mod helpers;

pub use fixtures::TestFixtures;
pub use helpers::{PatchLog, TestHelpers};
