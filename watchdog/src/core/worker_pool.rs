//! Fixed-size pool of reconciliation workers sharing one job queue

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use shared::{component_debug, component_error, ComponentId, ReconciliationJob};
use crate::core::reconciler::Reconciler;
use crate::error::{WatchdogError, WatchdogResult};
use crate::traits::{AnnotationStore, ProgressClient};

/// Receiving half of the job queue, shared by every worker
pub type SharedJobReceiver = Arc<Mutex<mpsc::Receiver<ReconciliationJob>>>;

/// Handle to the running workers
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
    processed: Arc<AtomicU64>,
}

impl WorkerPool {
    /// Spawn `worker_count` workers consuming `job_rx`
    ///
    /// A worker that hits a fatal error reports it on `fatal_tx` and stops.
    /// Workers exit once the queue is closed and drained.
    pub fn spawn<P, A>(
        worker_count: usize,
        reconciler: Arc<Reconciler<P, A>>,
        job_rx: mpsc::Receiver<ReconciliationJob>,
        fatal_tx: mpsc::Sender<WatchdogError>,
    ) -> Self
    where
        P: ProgressClient + 'static,
        A: AnnotationStore + 'static,
    {
        let job_rx: SharedJobReceiver = Arc::new(Mutex::new(job_rx));
        let processed = Arc::new(AtomicU64::new(0));

        let handles = (0..worker_count)
            .map(|id| {
                tokio::spawn(run_worker(
                    ComponentId::Worker(id),
                    reconciler.clone(),
                    job_rx.clone(),
                    processed.clone(),
                    fatal_tx.clone(),
                ))
            })
            .collect();

        Self { handles, processed }
    }

    pub fn worker_count(&self) -> usize {
        self.handles.len()
    }

    /// Number of jobs that reached a decision outcome
    pub fn jobs_processed(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }

    /// Wait for every worker to finish
    pub async fn join(self) -> WatchdogResult<u64> {
        for handle in self.handles {
            handle.await?;
        }
        Ok(self.processed.load(Ordering::Relaxed))
    }

    pub fn abort(&self) {
        for handle in &self.handles {
            handle.abort();
        }
    }
}

async fn run_worker<P, A>(
    component: ComponentId,
    reconciler: Arc<Reconciler<P, A>>,
    job_rx: SharedJobReceiver,
    processed: Arc<AtomicU64>,
    fatal_tx: mpsc::Sender<WatchdogError>,
) where
    P: ProgressClient,
    A: AnnotationStore,
{
    loop {
        let job = {
            let mut job_rx = job_rx.lock().await;
            job_rx.recv().await
        };

        let Some(job) = job else {
            component_debug!(component, "Job queue closed, worker exiting");
            break;
        };

        match reconciler.reconcile(component, &job).await {
            Ok(outcome) => {
                processed.fetch_add(1, Ordering::Relaxed);
                component_debug!(component, team = %job.team_name, "Job finished: {:?}", outcome);
            }
            Err(error) => {
                component_error!(component, team = %job.team_name, "💀 Fatal reconciliation error: {}", error);
                let _ = fatal_tx.send(error).await;
                break;
            }
        }
    }
}
