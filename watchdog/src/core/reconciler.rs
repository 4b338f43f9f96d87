//! Compare-and-reconcile decision procedure for a single job
//!
//! The durable value wins on divergence: it is pushed back into the instance
//! and whatever the instance reports afterwards becomes the new durable value.

use shared::{component_debug, component_info, component_warn, ComponentId, ReconciliationJob};
use crate::error::WatchdogResult;
use crate::traits::{AnnotationStore, ProgressClient};
use crate::types::ReconcileOutcome;

/// Runs the decision procedure against injected remote and durable state
pub struct Reconciler<P, A>
where
    P: ProgressClient,
    A: AnnotationStore,
{
    progress_client: P,
    store: A,
}

impl<P, A> Reconciler<P, A>
where
    P: ProgressClient,
    A: AnnotationStore,
{
    pub fn new(progress_client: P, store: A) -> Self {
        Self { progress_client, store }
    }

    /// Reconcile one team; only a failed persist is returned as an error
    pub async fn reconcile(
        &self,
        component: ComponentId,
        job: &ReconciliationJob,
    ) -> WatchdogResult<ReconcileOutcome> {
        let team = job.team_name.as_str();
        component_debug!(component, team = %team, "Running progress update job");

        let last = job.last_continue_code.as_ref();
        let current = self.progress_client.fetch_live_code(team).await;

        match (last, current) {
            (None, None) => {
                component_warn!(
                    component,
                    team = %team,
                    "⚠️ Failed to fetch both current and cached continue code"
                );
                Ok(ReconcileOutcome::BothUnknown)
            }
            (None, Some(current)) => {
                component_debug!(component, team = %team, "No cached continue code yet, caching current one");
                self.store.persist(team, &current).await?;
                Ok(ReconcileOutcome::FirstObservation { persisted: current })
            }
            (Some(_), None) => {
                component_debug!(
                    component,
                    team = %team,
                    "Could not get current continue code, instance might be down"
                );
                Ok(ReconcileOutcome::Unreachable)
            }
            (Some(last), Some(current)) if *last == current => {
                component_debug!(component, team = %team, "Continue codes are identical");
                Ok(ReconcileOutcome::InSync)
            }
            (Some(last), Some(current)) => {
                component_info!(
                    component,
                    team = %team,
                    "🔄 Continue codes differ (last vs current): ({} vs {}), applying cached code",
                    last,
                    current
                );
                self.progress_client.apply_code(team, last).await;

                let persisted = match self.progress_client.fetch_live_code(team).await {
                    Some(refetched) => {
                        self.store.persist(team, &refetched).await?;
                        Some(refetched)
                    }
                    None => {
                        component_warn!(
                            component,
                            team = %team,
                            "⚠️ Could not re-fetch continue code after applying, retrying next cycle"
                        );
                        None
                    }
                };

                Ok(ReconcileOutcome::Restored {
                    applied: last.clone(),
                    persisted,
                })
            }
        }
    }
}
