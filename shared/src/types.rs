//! Core shared types for fleet members and continue-code reconciliation

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::errors::{SharedError, SharedResult};

/// Opaque progress checkpoint reported by a team instance
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContinueCode(String);

impl ContinueCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContinueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for ContinueCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ContinueCode {
    fn from(code: &str) -> Self {
        Self(code.to_string())
    }
}

impl From<String> for ContinueCode {
    fn from(code: String) -> Self {
        Self(code)
    }
}

/// A fleet member as seen through the fleet directory
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    /// Name of the control-plane record backing this instance
    pub record_name: String,
    /// Team identity, unique per instance
    pub team_name: String,
    pub ready_replicas: i32,
    pub labels: HashMap<String, String>,
    pub annotations: HashMap<String, String>,
}

impl Instance {
    /// An instance is eligible for reconciliation only when exactly one replica is ready
    pub fn is_ready(&self) -> bool {
        self.ready_replicas == 1
    }

    /// Durable continue code stored under `key`; empty annotations count as absent
    pub fn durable_code(&self, key: &str) -> Option<ContinueCode> {
        self.annotations
            .get(key)
            .filter(|value| !value.is_empty())
            .map(|value| ContinueCode::new(value.as_str()))
    }
}

/// Snapshot of one instance handed from discovery to a worker
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReconciliationJob {
    pub team_name: String,
    pub last_continue_code: Option<ContinueCode>,
}

impl ReconciliationJob {
    pub fn new(team_name: impl Into<String>, last_continue_code: Option<ContinueCode>) -> Self {
        Self {
            team_name: team_name.into(),
            last_continue_code,
        }
    }
}

/// Equality-based label selector identifying fleet membership
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelSelector {
    pub key: String,
    pub value: String,
}

impl LabelSelector {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Parse `key=value`
    pub fn parse(input: &str) -> SharedResult<Self> {
        match input.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() && !value.trim().is_empty() => {
                Ok(Self::new(key.trim(), value.trim()))
            }
            _ => Err(SharedError::InvalidConfig {
                field: "selector".to_string(),
                value: input.to_string(),
            }),
        }
    }

    pub fn matches(&self, labels: &HashMap<String, String>) -> bool {
        labels.get(&self.key).is_some_and(|value| value == &self.value)
    }
}

impl Default for LabelSelector {
    fn default() -> Self {
        Self::new("app", "juice-shop")
    }
}

impl fmt::Display for LabelSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

/// Annotation keys holding the durable state on an instance record
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationKeys {
    pub continue_code: String,
    pub challenges_solved: String,
}

impl Default for AnnotationKeys {
    fn default() -> Self {
        Self {
            continue_code: "multi-juicer.iteratec.dev/continueCode".to_string(),
            challenges_solved: "multi-juicer.iteratec.dev/challengesSolved".to_string(),
        }
    }
}

/// Identifies which part of the watchdog emitted a log line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentId {
    Watchdog,
    Discovery,
    Worker(usize),
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentId::Watchdog => write!(f, "watchdog"),
            ComponentId::Discovery => write!(f, "discovery"),
            ComponentId::Worker(id) => write!(f, "worker_{id}"),
        }
    }
}
