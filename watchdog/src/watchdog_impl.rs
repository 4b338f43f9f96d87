//! Watchdog implementation with dependency injection

use std::sync::Arc;

use tokio::sync::mpsc;

use shared::logging::{log_shutdown, log_startup};
use shared::{component_error, component_info, ComponentId};
use crate::core::{DiscoveryLoop, Reconciler, WorkerPool};
use crate::error::{WatchdogError, WatchdogResult};
use crate::traits::{AnnotationStore, FleetDirectory, ProgressClient};
use crate::types::WatchdogConfig;

/// Discovery loop plus worker pool, wired to injected capabilities
pub struct Watchdog<F, P, A>
where
    F: FleetDirectory + 'static,
    P: ProgressClient + 'static,
    A: AnnotationStore + 'static,
{
    config: WatchdogConfig,
    fleet: Arc<F>,
    reconciler: Arc<Reconciler<P, A>>,

    shutdown_tx: mpsc::Sender<()>,
    shutdown_rx: Option<mpsc::Receiver<()>>,
}

impl<F, P, A> Watchdog<F, P, A>
where
    F: FleetDirectory + 'static,
    P: ProgressClient + 'static,
    A: AnnotationStore + 'static,
{
    pub fn new(config: WatchdogConfig, fleet: Arc<F>, progress_client: P, store: A) -> WatchdogResult<Self> {
        config.validate()?;
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        Ok(Self {
            config,
            fleet,
            reconciler: Arc::new(Reconciler::new(progress_client, store)),
            shutdown_tx,
            shutdown_rx: Some(shutdown_rx),
        })
    }

    pub fn config(&self) -> &WatchdogConfig {
        &self.config
    }

    /// Sender that requests a graceful shutdown of `run`
    pub fn shutdown_sender(&self) -> mpsc::Sender<()> {
        self.shutdown_tx.clone()
    }

    /// Run until shutdown is requested or a fatal error occurs
    ///
    /// Graceful shutdown stops discovery, lets workers drain the queue and
    /// returns `Ok`. A fatal error from discovery or any worker is returned.
    pub async fn run(&mut self) -> WatchdogResult<()> {
        let mut shutdown_rx = self
            .shutdown_rx
            .take()
            .ok_or_else(|| WatchdogError::config("watchdog is already running"))?;

        log_startup(
            ComponentId::Watchdog,
            &format!(
                "reconciliation with {} workers, selector {}",
                self.config.worker_count, self.config.selector
            ),
        );

        let (job_tx, job_rx) = mpsc::channel(self.config.queue_capacity);
        let (fatal_tx, mut fatal_rx) = mpsc::channel(self.config.worker_count);

        let pool = WorkerPool::spawn(self.config.worker_count, self.reconciler.clone(), job_rx, fatal_tx);

        let discovery = DiscoveryLoop::new(self.fleet.clone(), &self.config);
        let mut discovery_task = tokio::spawn(async move { discovery.run(job_tx).await });

        tokio::select! {
            Some(_) = shutdown_rx.recv() => {
                log_shutdown(ComponentId::Watchdog, "shutdown requested");
                discovery_task.abort();
                let _ = discovery_task.await;
                let processed = pool.join().await?;
                component_info!(ComponentId::Watchdog, "✅ Workers drained after {} jobs", processed);
                Ok(())
            }
            Some(error) = fatal_rx.recv() => {
                component_error!(ComponentId::Watchdog, "💀 Worker reported fatal error: {}", error);
                discovery_task.abort();
                pool.abort();
                Err(error)
            }
            joined = &mut discovery_task => {
                pool.abort();
                match joined {
                    Ok(Ok(())) => Ok(()),
                    Ok(Err(error)) => {
                        component_error!(ComponentId::Watchdog, "💀 Discovery failed: {}", error);
                        Err(error)
                    }
                    Err(join_error) => Err(WatchdogError::WorkerPanicked(join_error)),
                }
            }
        }
    }
}
