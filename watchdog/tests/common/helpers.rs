//! Test helpers for driving the watchdog against mocks
//!
//! The fleet directory is a mockall mock recording every patch; team
//! instances are wiremock servers.

use std::sync::{Arc, Mutex};

use progress_watchdog::core::{DiscoveryLoop, Reconciler, WorkerPool};
use progress_watchdog::services::{FixedSolvedCount, FleetAnnotationStore, HttpProgressClient};
use progress_watchdog::{MockFleetDirectory, WatchdogConfig, WatchdogError};
use serde_json::Value;
use shared::{AnnotationKeys, Instance};
use tokio::sync::mpsc;
use wiremock::MockServer;

/// Every `(record, document)` pair patched through the fleet directory
pub type PatchLog = Arc<Mutex<Vec<(String, Value)>>>;

/// Store type used by the end-to-end suites
pub type TestStore = FleetAnnotationStore<MockFleetDirectory, FixedSolvedCount>;

pub struct TestHelpers;

impl TestHelpers {
    /// Fleet listing `instances` on every call and recording successful patches
    pub fn recording_fleet(instances: Vec<Instance>, patches: PatchLog) -> MockFleetDirectory {
        let mut fleet = MockFleetDirectory::new();

        fleet
            .expect_list()
            .returning(move |_| Ok(instances.clone()))
            .times(0..);

        fleet
            .expect_patch()
            .returning(move |record, document| {
                patches.lock().unwrap().push((record.to_string(), document));
                Ok(())
            })
            .times(0..);

        fleet
    }

    /// Fleet whose listing always fails
    pub fn failing_fleet() -> MockFleetDirectory {
        let mut fleet = MockFleetDirectory::new();
        fleet.expect_list().returning(|selector| {
            Err(WatchdogError::FleetListFailed {
                selector: selector.to_string(),
                message: "connection refused".to_string(),
            })
        });
        fleet
    }

    /// Fleet that lists `instances` but rejects every patch
    pub fn read_only_fleet(instances: Vec<Instance>) -> MockFleetDirectory {
        let mut fleet = MockFleetDirectory::new();
        fleet.expect_list().returning(move |_| Ok(instances.clone()));
        fleet.expect_patch().returning(|record, _| {
            Err(WatchdogError::AnnotationPatchFailed {
                record: record.to_string(),
                message: "forbidden".to_string(),
            })
        });
        fleet
    }

    pub fn store(fleet: Arc<MockFleetDirectory>, config: &WatchdogConfig) -> TestStore {
        FleetAnnotationStore::new(
            fleet,
            config.annotation_keys.clone(),
            config.naming.clone(),
            FixedSolvedCount::default(),
        )
    }

    pub fn progress_client(config: &WatchdogConfig) -> HttpProgressClient {
        HttpProgressClient::new(config.naming.clone(), config.request_timeout).unwrap()
    }

    /// Run exactly one discovery pass through the worker pool and wait for it to drain
    pub async fn run_single_cycle(fleet: Arc<MockFleetDirectory>, config: &WatchdogConfig) -> u64 {
        let reconciler = Arc::new(Reconciler::new(
            Self::progress_client(config),
            Self::store(fleet.clone(), config),
        ));
        let (job_tx, job_rx) = mpsc::channel(config.queue_capacity);
        let (fatal_tx, mut fatal_rx) = mpsc::channel(config.worker_count);
        let pool = WorkerPool::spawn(config.worker_count, reconciler, job_rx, fatal_tx);

        let discovery = DiscoveryLoop::new(fleet, config);
        discovery.run_cycle(&job_tx).await.unwrap();
        drop(job_tx);

        let processed = pool.join().await.unwrap();
        assert!(fatal_rx.try_recv().is_err(), "no fatal error expected");
        processed
    }

    /// Continue codes persisted per record, in patch order
    pub fn persisted_codes(patches: &PatchLog) -> Vec<(String, String)> {
        let key = AnnotationKeys::default().continue_code;
        patches
            .lock()
            .unwrap()
            .iter()
            .map(|(record, document)| {
                let code = document["metadata"]["annotations"][key.as_str()]
                    .as_str()
                    .unwrap_or_default()
                    .to_string();
                (record.clone(), code)
            })
            .collect()
    }

    /// Number of requests the mock server saw for `method` on `path`
    pub async fn request_count(server: &MockServer, method: &str, path: &str) -> usize {
        server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|request| request.method.to_string() == method && request.url.path() == path)
            .count()
    }
}
