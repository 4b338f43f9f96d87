//! Test fixtures for fleet members and instance responses

use std::collections::HashMap;
use std::time::Duration;

use progress_watchdog::{InstanceNaming, WatchdogConfig};
use serde_json::{json, Value};
use shared::{AnnotationKeys, Instance};
use wiremock::MockServer;

pub struct TestFixtures;

impl TestFixtures {
    pub const WORKERS: usize = 4;
    pub const QUEUE_CAPACITY: usize = 8;

    /// Fleet member with an optional durable continue code
    pub fn instance(team: &str, ready_replicas: i32, durable: Option<&str>) -> Instance {
        let mut annotations = HashMap::new();
        if let Some(code) = durable {
            annotations.insert(AnnotationKeys::default().continue_code, code.to_string());
        }

        Instance {
            record_name: format!("t-{team}-juiceshop"),
            team_name: team.to_string(),
            ready_replicas,
            labels: HashMap::from([
                ("app".to_string(), "juice-shop".to_string()),
                ("team".to_string(), team.to_string()),
            ]),
            annotations,
        }
    }

    pub fn continue_code_body(code: &str) -> Value {
        json!({ "continueCode": code })
    }

    /// Team instances are served from `/<team>/...` on the mock server
    pub fn naming_for(server: &MockServer) -> InstanceNaming {
        InstanceNaming::new(format!("{}/{{team}}", server.uri()), "t-{team}-juiceshop")
    }

    pub fn config(naming: InstanceNaming) -> WatchdogConfig {
        WatchdogConfig {
            worker_count: Self::WORKERS,
            queue_capacity: Self::QUEUE_CAPACITY,
            poll_interval: Duration::from_millis(50),
            request_timeout: Duration::from_secs(2),
            naming,
            ..WatchdogConfig::default()
        }
    }
}
