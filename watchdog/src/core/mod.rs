//! Watchdog core: discovery, decision procedure and worker pool

pub mod discovery;
pub mod reconciler;
pub mod worker_pool;

pub use discovery::{select_ready, DiscoveryLoop};
pub use reconciler::Reconciler;
pub use worker_pool::{SharedJobReceiver, WorkerPool};
