//! Tests for watchdog services
//!
//! HTTP-facing services run against wiremock servers; the annotation store
//! runs against a mocked fleet directory.

pub mod fleet_directory;
