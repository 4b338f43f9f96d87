//! Watchdog service implementations

pub mod annotation_store;
pub mod fleet_directory;
pub mod progress_client;

#[cfg(test)]
pub mod tests;

pub use annotation_store::*;
pub use fleet_directory::*;
pub use progress_client::*;
