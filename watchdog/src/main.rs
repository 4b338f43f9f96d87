//! Progress watchdog binary entry point

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::signal;

use progress_watchdog::{
    services::{FixedSolvedCount, FleetAnnotationStore, HttpProgressClient, KubeFleetDirectory},
    FleetConnection, InstanceNaming, Watchdog, WatchdogConfig, WatchdogResult,
};
use shared::logging::{self, log_error, log_shutdown};
use shared::{component_debug, AnnotationKeys, ComponentId, LabelSelector};

const SERVICE_ACCOUNT_TOKEN: &str = "/var/run/secrets/kubernetes.io/serviceaccount/token";
const SERVICE_ACCOUNT_CA: &str = "/var/run/secrets/kubernetes.io/serviceaccount/ca.crt";

/// Keeps team instance progress in sync with durable record annotations
#[derive(Parser)]
#[command(name = "progress-watchdog")]
#[command(about = "Reconciles continue codes between team instances and their records")]
struct Args {
    /// Cluster API server URL (defaults to the in-cluster service address)
    #[arg(long, env = "WATCHDOG_API_SERVER")]
    api_server: Option<String>,

    /// Bearer token file used against the API server
    #[arg(long, env = "WATCHDOG_TOKEN_FILE")]
    token_file: Option<PathBuf>,

    /// PEM bundle used to verify the API server
    #[arg(long, env = "WATCHDOG_CA_FILE")]
    ca_file: Option<PathBuf>,

    /// Namespace holding the team instances
    #[arg(long, env = "WATCHDOG_NAMESPACE", default_value = "default")]
    namespace: String,

    /// Fleet membership selector (key=value)
    #[arg(long, env = "WATCHDOG_SELECTOR", default_value = "app=juice-shop")]
    selector: String,

    /// Label naming the team owning an instance
    #[arg(long, env = "WATCHDOG_TEAM_LABEL", default_value = "team")]
    team_label: String,

    /// Number of concurrent reconciliation workers
    #[arg(long, env = "WATCHDOG_WORKERS", default_value = "10")]
    workers: usize,

    /// Capacity of the job queue between discovery and workers
    #[arg(long, env = "WATCHDOG_QUEUE_CAPACITY", default_value = "64")]
    queue_capacity: usize,

    /// Seconds between discovery passes
    #[arg(long, env = "WATCHDOG_POLL_INTERVAL_SECS", default_value = "5")]
    poll_interval_secs: u64,

    /// Deadline in seconds for every call to a team instance
    #[arg(long, env = "WATCHDOG_REQUEST_TIMEOUT_SECS", default_value = "5")]
    request_timeout_secs: u64,

    /// Base URL of a team instance; {team} is replaced with the team name
    #[arg(long, env = "WATCHDOG_INSTANCE_URL", default_value = "http://t-{team}-juiceshop:3000")]
    instance_url_template: String,

    /// Record name of a team instance; {team} is replaced with the team name
    #[arg(long, env = "WATCHDOG_RECORD_NAME", default_value = "t-{team}-juiceshop")]
    record_template: String,

    /// Value written to the solved-challenges annotation
    #[arg(long, env = "WATCHDOG_SOLVED_COUNT", default_value = "42")]
    solved_count: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// Fall back to a service-account file only when it is actually mounted
fn in_cluster_file(explicit: Option<PathBuf>, default: &str) -> Option<PathBuf> {
    explicit.or_else(|| Path::new(default).exists().then(|| PathBuf::from(default)))
}

fn in_cluster_api_server() -> Option<String> {
    let host = std::env::var("KUBERNETES_SERVICE_HOST").ok()?;
    let port = std::env::var("KUBERNETES_SERVICE_PORT").unwrap_or_else(|_| "443".to_string());
    Some(format!("https://{host}:{port}"))
}

#[tokio::main]
async fn main() -> WatchdogResult<()> {
    let args = Args::parse();

    logging::init_tracing(Some(&args.log_level))?;

    let naming = InstanceNaming::new(args.instance_url_template, args.record_template);
    let annotation_keys = AnnotationKeys::default();
    let config = WatchdogConfig {
        worker_count: args.workers,
        queue_capacity: args.queue_capacity,
        poll_interval: Duration::from_secs(args.poll_interval_secs),
        request_timeout: Duration::from_secs(args.request_timeout_secs),
        selector: LabelSelector::parse(&args.selector)?,
        annotation_keys: annotation_keys.clone(),
        naming: naming.clone(),
    };

    let defaults = FleetConnection::default();
    let connection = FleetConnection {
        api_server: args
            .api_server
            .or_else(in_cluster_api_server)
            .unwrap_or(defaults.api_server),
        namespace: args.namespace,
        token_file: in_cluster_file(args.token_file, SERVICE_ACCOUNT_TOKEN),
        ca_file: in_cluster_file(args.ca_file, SERVICE_ACCOUNT_CA),
        team_label: args.team_label,
        request_timeout: defaults.request_timeout,
    };
    component_debug!(
        ComponentId::Watchdog,
        "Fleet directory at {} (namespace {})",
        connection.api_server,
        connection.namespace
    );

    // Create service implementations
    let fleet = Arc::new(KubeFleetDirectory::new(&connection)?);
    let progress_client = HttpProgressClient::new(naming.clone(), config.request_timeout)?;
    let store = FleetAnnotationStore::new(
        fleet.clone(),
        annotation_keys,
        naming,
        FixedSolvedCount::new(args.solved_count),
    );

    // Create watchdog with dependency injection
    let mut watchdog = Watchdog::new(config, fleet, progress_client, store)?;

    // Set up graceful shutdown
    let shutdown_sender = watchdog.shutdown_sender();
    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                log_shutdown(ComponentId::Watchdog, "Received Ctrl+C signal");
                let _ = shutdown_sender.send(()).await;
            }
            Err(err) => {
                log_error(ComponentId::Watchdog, "Signal handling", &err);
            }
        }
    });

    if let Err(error) = watchdog.run().await {
        log_error(ComponentId::Watchdog, "Reconciliation", &error);
        return Err(error);
    }

    Ok(())
}
