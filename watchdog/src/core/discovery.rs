//! Periodic fleet discovery feeding the job queue

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};

use shared::{component_debug, AnnotationKeys, ComponentId, Instance, LabelSelector, ReconciliationJob};
use crate::error::{WatchdogError, WatchdogResult};
use crate::traits::FleetDirectory;
use crate::types::WatchdogConfig;

/// Build one job per fully ready instance, carrying its durable continue code
pub fn select_ready(instances: &[Instance], keys: &AnnotationKeys) -> Vec<ReconciliationJob> {
    instances
        .iter()
        .filter(|instance| instance.is_ready())
        .map(|instance| {
            ReconciliationJob::new(
                instance.team_name.clone(),
                instance.durable_code(&keys.continue_code),
            )
        })
        .collect()
}

/// Lists the fleet at a fixed cadence and enqueues reconciliation jobs
pub struct DiscoveryLoop<F>
where
    F: FleetDirectory,
{
    fleet: Arc<F>,
    selector: LabelSelector,
    keys: AnnotationKeys,
    poll_interval: Duration,
}

impl<F> DiscoveryLoop<F>
where
    F: FleetDirectory,
{
    pub fn new(fleet: Arc<F>, config: &WatchdogConfig) -> Self {
        Self {
            fleet,
            selector: config.selector.clone(),
            keys: config.annotation_keys.clone(),
            poll_interval: config.poll_interval,
        }
    }

    /// One discovery pass; returns how many jobs were enqueued
    ///
    /// Suspends while the queue is full.
    pub async fn run_cycle(&self, job_tx: &mpsc::Sender<ReconciliationJob>) -> WatchdogResult<usize> {
        component_debug!(ComponentId::Discovery, "Looking for instances");
        let instances = self.fleet.list(&self.selector).await?;
        component_debug!(ComponentId::Discovery, "Found {} instances running", instances.len());

        let jobs = select_ready(&instances, &self.keys);
        let count = jobs.len();

        for job in jobs {
            component_debug!(ComponentId::Discovery, team = %job.team_name, "Queueing progress update job");
            job_tx.send(job).await.map_err(|_| WatchdogError::QueueClosed)?;
        }

        Ok(count)
    }

    /// Run forever; returns only on a fatal listing error or a closed queue
    pub async fn run(&self, job_tx: mpsc::Sender<ReconciliationJob>) -> WatchdogResult<()> {
        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            self.run_cycle(&job_tx).await?;
        }
    }
}
