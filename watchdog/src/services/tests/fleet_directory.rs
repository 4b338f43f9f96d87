//! Tests for KubeFleetDirectory against a mock API server

use std::io::Write;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shared::LabelSelector;
use crate::error::WatchdogError;
use crate::services::fleet_directory::KubeFleetDirectory;
use crate::traits::FleetDirectory;
use crate::types::FleetConnection;

const DEPLOYMENTS_PATH: &str = "/apis/apps/v1/namespaces/default/deployments";

fn connection(server: &MockServer) -> FleetConnection {
    FleetConnection {
        api_server: server.uri(),
        request_timeout: Duration::from_secs(2),
        ..FleetConnection::default()
    }
}

fn deployment_list() -> serde_json::Value {
    json!({
        "kind": "DeploymentList",
        "items": [
            {
                "metadata": {
                    "name": "t-alpha-juiceshop",
                    "labels": { "app": "juice-shop", "team": "alpha" },
                    "annotations": { "multi-juicer.iteratec.dev/continueCode": "abc123" }
                },
                "status": { "replicas": 1, "readyReplicas": 1 }
            },
            {
                "metadata": {
                    "name": "t-beta-juiceshop",
                    "labels": { "app": "juice-shop", "team": "beta" }
                },
                "status": { "replicas": 1 }
            },
            {
                "metadata": {
                    "name": "orphan",
                    "labels": { "app": "juice-shop" }
                },
                "status": { "readyReplicas": 1 }
            }
        ]
    })
}

#[tokio::test]
async fn test_list_maps_deployments_to_instances() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(DEPLOYMENTS_PATH))
        .and(query_param("labelSelector", "app=juice-shop"))
        .respond_with(ResponseTemplate::new(200).set_body_json(deployment_list()))
        .expect(1)
        .mount(&server)
        .await;

    let directory = KubeFleetDirectory::new(&connection(&server)).unwrap();
    let instances = directory.list(&LabelSelector::default()).await.unwrap();

    assert_eq!(instances.len(), 2);

    let alpha = &instances[0];
    assert_eq!(alpha.record_name, "t-alpha-juiceshop");
    assert_eq!(alpha.team_name, "alpha");
    assert_eq!(alpha.ready_replicas, 1);
    assert_eq!(
        alpha.annotations.get("multi-juicer.iteratec.dev/continueCode").map(String::as_str),
        Some("abc123")
    );

    let beta = &instances[1];
    assert_eq!(beta.team_name, "beta");
    assert_eq!(beta.ready_replicas, 0);
    assert!(beta.annotations.is_empty());
}

#[tokio::test]
async fn test_list_drops_deployments_outside_selector() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(DEPLOYMENTS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {
                    "metadata": { "name": "t-alpha-juiceshop", "labels": { "app": "juice-shop", "team": "alpha" } },
                    "status": { "readyReplicas": 1 }
                },
                {
                    "metadata": { "name": "t-alpha-balancer", "labels": { "app": "balancer", "team": "alpha" } },
                    "status": { "readyReplicas": 1 }
                }
            ]
        })))
        .mount(&server)
        .await;

    let directory = KubeFleetDirectory::new(&connection(&server)).unwrap();
    let instances = directory.list(&LabelSelector::default()).await.unwrap();

    assert_eq!(instances.len(), 1);
    assert_eq!(instances[0].record_name, "t-alpha-juiceshop");
}

#[tokio::test]
async fn test_list_error_status_is_fleet_list_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(DEPLOYMENTS_PATH))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let directory = KubeFleetDirectory::new(&connection(&server)).unwrap();
    let result = directory.list(&LabelSelector::default()).await;

    match result {
        Err(WatchdogError::FleetListFailed { selector, .. }) => assert_eq!(selector, "app=juice-shop"),
        other => panic!("expected FleetListFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_token_file_is_sent_as_bearer() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(DEPLOYMENTS_PATH))
        .and(header("authorization", "Bearer s3cr3t"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let mut token_file = tempfile::NamedTempFile::new().unwrap();
    writeln!(token_file, "s3cr3t").unwrap();

    let connection = FleetConnection {
        token_file: Some(token_file.path().to_path_buf()),
        ..connection(&server)
    };
    let directory = KubeFleetDirectory::new(&connection).unwrap();

    assert!(directory.list(&LabelSelector::default()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_token_file_fails_bootstrap() {
    let connection = FleetConnection {
        token_file: Some("/nonexistent/watchdog/token".into()),
        ..FleetConnection::default()
    };

    assert!(matches!(
        KubeFleetDirectory::new(&connection),
        Err(WatchdogError::ClientBootstrap { .. })
    ));
}

#[tokio::test]
async fn test_patch_sends_merge_patch() {
    let server = MockServer::start().await;
    let document = json!({
        "metadata": { "annotations": { "multi-juicer.iteratec.dev/continueCode": "abc123" } }
    });

    Mock::given(method("PATCH"))
        .and(path(format!("{DEPLOYMENTS_PATH}/t-alpha-juiceshop")))
        .and(header("content-type", "application/merge-patch+json"))
        .and(body_json(&document))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let directory = KubeFleetDirectory::new(&connection(&server)).unwrap();

    directory.patch("t-alpha-juiceshop", document).await.unwrap();
}

#[tokio::test]
async fn test_patch_error_is_annotation_patch_failure() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let directory = KubeFleetDirectory::new(&connection(&server)).unwrap();
    let result = directory.patch("t-missing-juiceshop", json!({})).await;

    match result {
        Err(WatchdogError::AnnotationPatchFailed { record, .. }) => assert_eq!(record, "t-missing-juiceshop"),
        other => panic!("expected AnnotationPatchFailed, got {other:?}"),
    }
}
