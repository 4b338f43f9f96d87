//! Durable continue-code storage on instance record annotations

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use shared::{component_debug, component_info, AnnotationKeys, ComponentId, ContinueCode};
use crate::error::{WatchdogError, WatchdogResult};
use crate::traits::{AnnotationStore, FleetDirectory, SolvedCountSource};
use crate::types::InstanceNaming;

/// Solved-count source that always reports the same value
#[derive(Debug, Clone)]
pub struct FixedSolvedCount {
    value: String,
}

impl FixedSolvedCount {
    pub fn new(value: impl Into<String>) -> Self {
        Self { value: value.into() }
    }
}

impl Default for FixedSolvedCount {
    fn default() -> Self {
        Self::new("42")
    }
}

impl SolvedCountSource for FixedSolvedCount {
    fn solved_count(&self, _team_name: &str, _code: &ContinueCode) -> String {
        self.value.clone()
    }
}

/// Persists continue codes by merge-patching the team's record through the fleet directory
pub struct FleetAnnotationStore<F, S>
where
    F: FleetDirectory,
    S: SolvedCountSource,
{
    fleet: Arc<F>,
    keys: AnnotationKeys,
    naming: InstanceNaming,
    solved_count: S,
}

impl<F, S> FleetAnnotationStore<F, S>
where
    F: FleetDirectory,
    S: SolvedCountSource,
{
    pub fn new(fleet: Arc<F>, keys: AnnotationKeys, naming: InstanceNaming, solved_count: S) -> Self {
        Self {
            fleet,
            keys,
            naming,
            solved_count,
        }
    }

    /// Merge-patch document setting both annotations
    pub fn merge_patch(&self, team_name: &str, code: &ContinueCode) -> Value {
        let mut annotations = Map::new();
        annotations.insert(self.keys.continue_code.clone(), Value::String(code.to_string()));
        annotations.insert(
            self.keys.challenges_solved.clone(),
            Value::String(self.solved_count.solved_count(team_name, code)),
        );

        json!({ "metadata": { "annotations": annotations } })
    }
}

#[async_trait]
impl<F, S> AnnotationStore for FleetAnnotationStore<F, S>
where
    F: FleetDirectory,
    S: SolvedCountSource,
{
    async fn persist(&self, team_name: &str, code: &ContinueCode) -> WatchdogResult<()> {
        component_info!(
            ComponentId::Watchdog,
            team = %team_name,
            "💾 Updating continue code of team '{}' to '{}'",
            team_name,
            code
        );

        let record = self.naming.record_name(team_name);
        let document = self.merge_patch(team_name, code);
        component_debug!(ComponentId::Watchdog, record = %record, "Merge patch: {}", document);

        self.fleet.patch(&record, document).await.map_err(|e| match e {
            WatchdogError::AnnotationPatchFailed { .. } => e,
            other => WatchdogError::AnnotationPatchFailed {
                record: record.clone(),
                message: other.to_string(),
            },
        })
    }
}
