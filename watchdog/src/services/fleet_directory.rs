//! Fleet directory backed by the cluster's Deployment API

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;

use shared::{component_debug, component_warn, ComponentId, Instance, LabelSelector};
use crate::error::{WatchdogError, WatchdogResult};
use crate::traits::FleetDirectory;
use crate::types::FleetConnection;

const MERGE_PATCH_CONTENT_TYPE: &str = "application/merge-patch+json";

#[derive(Debug, Deserialize)]
struct DeploymentList {
    #[serde(default)]
    items: Vec<Deployment>,
}

#[derive(Debug, Deserialize)]
struct Deployment {
    metadata: ObjectMeta,
    #[serde(default)]
    status: Option<DeploymentStatus>,
}

#[derive(Debug, Deserialize)]
struct ObjectMeta {
    name: String,
    #[serde(default)]
    labels: Option<HashMap<String, String>>,
    #[serde(default)]
    annotations: Option<HashMap<String, String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeploymentStatus {
    #[serde(default)]
    ready_replicas: Option<i32>,
}

/// Lists and patches Deployments in one namespace over the cluster REST API
pub struct KubeFleetDirectory {
    client: reqwest::Client,
    api_server: String,
    namespace: String,
    token: Option<String>,
    team_label: String,
}

impl KubeFleetDirectory {
    pub fn new(connection: &FleetConnection) -> WatchdogResult<Self> {
        let token = match &connection.token_file {
            Some(path) => Some(read_token(path)?),
            None => None,
        };

        let mut builder = reqwest::Client::builder().timeout(connection.request_timeout);

        if let Some(ca_file) = &connection.ca_file {
            let pem = std::fs::read(ca_file).map_err(|e| {
                WatchdogError::bootstrap(format!("failed to read CA bundle {}: {e}", ca_file.display()))
            })?;
            let certificate = reqwest::Certificate::from_pem(&pem).map_err(|e| {
                WatchdogError::bootstrap(format!("invalid CA bundle {}: {e}", ca_file.display()))
            })?;
            builder = builder.add_root_certificate(certificate);
        }

        let client = builder
            .build()
            .map_err(|e| WatchdogError::bootstrap(format!("failed to build fleet http client: {e}")))?;

        Ok(Self {
            client,
            api_server: connection.api_server.trim_end_matches('/').to_string(),
            namespace: connection.namespace.clone(),
            token,
            team_label: connection.team_label.clone(),
        })
    }

    pub fn deployments_url(&self) -> String {
        format!(
            "{}/apis/apps/v1/namespaces/{}/deployments",
            self.api_server, self.namespace
        )
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn to_instance(&self, deployment: Deployment) -> Option<Instance> {
        let labels = deployment.metadata.labels.unwrap_or_default();
        let Some(team_name) = labels.get(&self.team_label).cloned() else {
            component_warn!(
                ComponentId::Discovery,
                record = %deployment.metadata.name,
                "⚠️ Skipping instance without '{}' label",
                self.team_label
            );
            return None;
        };

        Some(Instance {
            record_name: deployment.metadata.name,
            team_name,
            ready_replicas: deployment
                .status
                .and_then(|status| status.ready_replicas)
                .unwrap_or(0),
            labels,
            annotations: deployment.metadata.annotations.unwrap_or_default(),
        })
    }
}

fn read_token(path: &Path) -> WatchdogResult<String> {
    let token = std::fs::read_to_string(path).map_err(|e| {
        WatchdogError::bootstrap(format!("failed to read token file {}: {e}", path.display()))
    })?;
    let token = token.trim();
    if token.is_empty() {
        return Err(WatchdogError::bootstrap(format!(
            "token file {} is empty",
            path.display()
        )));
    }
    Ok(token.to_string())
}

#[async_trait]
impl FleetDirectory for KubeFleetDirectory {
    async fn list(&self, selector: &LabelSelector) -> WatchdogResult<Vec<Instance>> {
        let list_failed = |message: String| WatchdogError::FleetListFailed {
            selector: selector.to_string(),
            message,
        };

        let request = self
            .client
            .get(self.deployments_url())
            .query(&[("labelSelector", selector.to_string())]);

        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| list_failed(e.to_string()))?
            .error_for_status()
            .map_err(|e| list_failed(e.to_string()))?;

        let deployments: DeploymentList = response.json().await.map_err(|e| list_failed(e.to_string()))?;

        let instances: Vec<Instance> = deployments
            .items
            .into_iter()
            .filter_map(|deployment| self.to_instance(deployment))
            .filter(|instance| selector.matches(&instance.labels))
            .collect();

        component_debug!(ComponentId::Discovery, "Found {} instances matching {}", instances.len(), selector);
        Ok(instances)
    }

    async fn patch(&self, record_name: &str, document: serde_json::Value) -> WatchdogResult<()> {
        let patch_failed = |message: String| WatchdogError::AnnotationPatchFailed {
            record: record_name.to_string(),
            message,
        };

        let body = serde_json::to_vec(&document)?;
        let request = self
            .client
            .patch(format!("{}/{}", self.deployments_url(), record_name))
            .header(CONTENT_TYPE, MERGE_PATCH_CONTENT_TYPE)
            .body(body);

        self.authorize(request)
            .send()
            .await
            .map_err(|e| patch_failed(e.to_string()))?
            .error_for_status()
            .map_err(|e| patch_failed(e.to_string()))?;

        Ok(())
    }
}
