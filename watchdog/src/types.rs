//! Watchdog-specific configuration and value types

use std::path::PathBuf;
use std::time::Duration;

use shared::{AnnotationKeys, ContinueCode, LabelSelector};
use crate::error::{WatchdogError, WatchdogResult};

/// Placeholder substituted with the team name in naming templates
pub const TEAM_PLACEHOLDER: &str = "{team}";

/// Derives per-team network addresses and record names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceNaming {
    /// Base URL of a team instance, e.g. `http://t-{team}-juiceshop:3000`
    pub url_template: String,
    /// Name of the team's control-plane record, e.g. `t-{team}-juiceshop`
    pub record_template: String,
}

impl InstanceNaming {
    pub fn new(url_template: impl Into<String>, record_template: impl Into<String>) -> Self {
        Self {
            url_template: url_template.into(),
            record_template: record_template.into(),
        }
    }

    pub fn base_url(&self, team_name: &str) -> String {
        self.url_template
            .replace(TEAM_PLACEHOLDER, team_name)
            .trim_end_matches('/')
            .to_string()
    }

    pub fn record_name(&self, team_name: &str) -> String {
        self.record_template.replace(TEAM_PLACEHOLDER, team_name)
    }

    pub fn validate(&self) -> WatchdogResult<()> {
        for (field, template) in [
            ("instance url template", &self.url_template),
            ("record template", &self.record_template),
        ] {
            if !template.contains(TEAM_PLACEHOLDER) {
                return Err(WatchdogError::config(format!(
                    "{field} '{template}' must contain {TEAM_PLACEHOLDER}"
                )));
            }
        }
        Ok(())
    }
}

impl Default for InstanceNaming {
    fn default() -> Self {
        Self::new("http://t-{team}-juiceshop:3000", "t-{team}-juiceshop")
    }
}

/// Runtime configuration for the reconciliation engine
#[derive(Debug, Clone)]
pub struct WatchdogConfig {
    pub worker_count: usize,
    pub queue_capacity: usize,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
    pub selector: LabelSelector,
    pub annotation_keys: AnnotationKeys,
    pub naming: InstanceNaming,
}

impl WatchdogConfig {
    pub fn validate(&self) -> WatchdogResult<()> {
        if self.worker_count == 0 {
            return Err(WatchdogError::config("worker count must be at least 1"));
        }
        if self.queue_capacity == 0 {
            return Err(WatchdogError::config("queue capacity must be at least 1"));
        }
        if self.poll_interval.is_zero() {
            return Err(WatchdogError::config("poll interval must be non-zero"));
        }
        if self.request_timeout.is_zero() {
            return Err(WatchdogError::config("request timeout must be non-zero"));
        }
        self.naming.validate()
    }
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            worker_count: 10,
            queue_capacity: 64,
            poll_interval: Duration::from_secs(5),
            request_timeout: Duration::from_secs(5),
            selector: LabelSelector::default(),
            annotation_keys: AnnotationKeys::default(),
            naming: InstanceNaming::default(),
        }
    }
}

/// How to reach the cluster API that backs the fleet directory
#[derive(Debug, Clone)]
pub struct FleetConnection {
    pub api_server: String,
    pub namespace: String,
    /// Bearer token file
    pub token_file: Option<PathBuf>,
    /// PEM bundle used to verify the API server
    pub ca_file: Option<PathBuf>,
    /// Label whose value names the team owning an instance
    pub team_label: String,
    pub request_timeout: Duration,
}

impl Default for FleetConnection {
    fn default() -> Self {
        Self {
            api_server: "https://kubernetes.default.svc".to_string(),
            namespace: "default".to_string(),
            token_file: None,
            ca_file: None,
            team_label: "team".to_string(),
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// Result of running the decision procedure for one job
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Neither a durable nor a live value was available
    BothUnknown,
    /// First live value seen for the team was persisted
    FirstObservation { persisted: ContinueCode },
    /// Live value could not be fetched; nothing changed
    Unreachable,
    /// Durable and live values already match
    InSync,
    /// Durable value was pushed to the instance; `persisted` is the value read back
    Restored {
        applied: ContinueCode,
        persisted: Option<ContinueCode>,
    },
}

impl ReconcileOutcome {
    /// Whether this outcome wrote to the durable store
    pub fn persisted(&self) -> bool {
        matches!(
            self,
            ReconcileOutcome::FirstObservation { .. } | ReconcileOutcome::Restored { persisted: Some(_), .. }
        )
    }
}
