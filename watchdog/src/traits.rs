//! Watchdog trait definitions for dependency injection

use async_trait::async_trait;

use shared::{ContinueCode, Instance, LabelSelector};
use crate::error::WatchdogResult;

/// Control-plane directory of fleet members
#[mockall::automock]
#[async_trait]
pub trait FleetDirectory: Send + Sync {
    /// List every instance matching the selector
    async fn list(&self, selector: &LabelSelector) -> WatchdogResult<Vec<Instance>>;

    /// Apply a JSON merge-patch to the named instance record
    async fn patch(&self, record_name: &str, document: serde_json::Value) -> WatchdogResult<()>;
}

/// Talks to a running team instance
///
/// Both operations are best-effort: failures are logged by the implementation
/// and never surfaced to the caller.
#[mockall::automock]
#[async_trait]
pub trait ProgressClient: Send + Sync {
    /// Current continue code reported by the instance, if it answered sensibly
    async fn fetch_live_code(&self, team_name: &str) -> Option<ContinueCode>;

    /// Push a continue code into the instance
    async fn apply_code(&self, team_name: &str, code: &ContinueCode);
}

/// Durable per-instance memory of the last known continue code
#[mockall::automock]
#[async_trait]
pub trait AnnotationStore: Send + Sync {
    /// Persist `code` as the durable value; failure is fatal to the process
    async fn persist(&self, team_name: &str, code: &ContinueCode) -> WatchdogResult<()>;
}

/// Supplies the solved-challenge count written next to the continue code
#[mockall::automock]
pub trait SolvedCountSource: Send + Sync {
    fn solved_count(&self, team_name: &str, code: &ContinueCode) -> String;
}
