//! HTTP client for the continue-code endpoints of team instances

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use url::Url;

use shared::{component_debug, component_warn, ComponentId, ContinueCode};
use crate::error::{InstanceCallFailure, WatchdogError, WatchdogResult};
use crate::traits::ProgressClient;
use crate::types::InstanceNaming;

/// Body of `GET /rest/continue-code`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContinueCodePayload {
    continue_code: String,
}

/// reqwest-backed progress client with an explicit deadline on every request
#[derive(Clone)]
pub struct HttpProgressClient {
    client: reqwest::Client,
    naming: InstanceNaming,
    request_timeout: Duration,
}

impl HttpProgressClient {
    pub fn new(naming: InstanceNaming, request_timeout: Duration) -> WatchdogResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(request_timeout)
            .timeout(request_timeout)
            .build()
            .map_err(|e| WatchdogError::bootstrap(format!("failed to build instance http client: {e}")))?;

        Ok(Self {
            client,
            naming,
            request_timeout,
        })
    }

    pub fn continue_code_url(&self, team_name: &str) -> String {
        format!("{}/rest/continue-code", self.naming.base_url(team_name))
    }

    /// `PUT` target with the code appended as a single escaped path segment
    pub fn apply_url(&self, team_name: &str, code: &ContinueCode) -> Result<Url, InstanceCallFailure> {
        let raw = format!("{}/rest/continue-code/apply", self.naming.base_url(team_name));
        let mut url = Url::parse(&raw).map_err(|e| InstanceCallFailure::InvalidUrl {
            url: raw.clone(),
            message: e.to_string(),
        })?;

        url.path_segments_mut()
            .map_err(|_| InstanceCallFailure::InvalidUrl {
                url: raw.clone(),
                message: "url cannot carry path segments".to_string(),
            })?
            .push(code.as_str());

        Ok(url)
    }

    /// Fetch the live continue code, reporting why it failed
    pub async fn try_fetch(&self, team_name: &str) -> Result<ContinueCode, InstanceCallFailure> {
        let url = self.continue_code_url(team_name);

        let response = self
            .client
            .get(&url)
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|source| InstanceCallFailure::Transport {
                url: url.clone(),
                source,
            })?;

        if response.status() != StatusCode::OK {
            return Err(InstanceCallFailure::UnexpectedStatus {
                url,
                status: response.status().as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|source| InstanceCallFailure::Transport {
            url: url.clone(),
            source,
        })?;

        let payload: ContinueCodePayload =
            serde_json::from_slice(&body).map_err(|e| InstanceCallFailure::MalformedBody {
                url: url.clone(),
                message: e.to_string(),
            })?;

        Ok(ContinueCode::new(payload.continue_code))
    }

    /// Push a continue code, reporting why it failed
    pub async fn try_apply(&self, team_name: &str, code: &ContinueCode) -> Result<(), InstanceCallFailure> {
        let url = self.apply_url(team_name, code)?;

        let response = self
            .client
            .put(url.clone())
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|source| InstanceCallFailure::Transport {
                url: url.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(InstanceCallFailure::UnexpectedStatus {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        Ok(())
    }
}

#[async_trait]
impl ProgressClient for HttpProgressClient {
    async fn fetch_live_code(&self, team_name: &str) -> Option<ContinueCode> {
        match self.try_fetch(team_name).await {
            Ok(code) => {
                component_debug!(ComponentId::Watchdog, team = %team_name, "Got current continue code '{}'", code);
                Some(code)
            }
            Err(failure) => {
                component_warn!(
                    ComponentId::Watchdog,
                    team = %team_name,
                    "⚠️ Failed to fetch continue code: {}",
                    failure
                );
                None
            }
        }
    }

    async fn apply_code(&self, team_name: &str, code: &ContinueCode) {
        if let Err(failure) = self.try_apply(team_name, code).await {
            component_warn!(
                ComponentId::Watchdog,
                team = %team_name,
                "⚠️ Failed to apply continue code: {}",
                failure
            );
        }
    }
}
