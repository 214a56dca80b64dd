//! Monitoring backend client
//!
//! HTTP client for the external monitoring backend: alert and vulnerability
//! search, agent inventory, the FIM subsystem, and the per-user agent
//! assignment lookup. Only the response shape matters to the core; every
//! payload is narrowed to a typed struct or handed to the normalizer.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum UpstreamError {
    #[error("network error: {0}")]
    Network(String),
    #[error("upstream returned status {0}")]
    Status(u16),
    #[error("decode error: {0}")]
    Decode(String),
}

/// Monitoring backend configuration.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub base_url: String,
    pub api_token: Option<String>,
    pub timeout_seconds: u64,
}

pub struct MonitorClient {
    config: MonitorConfig,
    http_client: reqwest::Client,
}

// Wire types

/// Search envelope: `hits.hits[]._source` holds the raw document.
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    pub hits: SearchHits,
}

#[derive(Debug, Deserialize)]
pub struct SearchHits {
    #[serde(default)]
    pub hits: Vec<RawHit>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawHit {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    #[serde(rename = "_source", default)]
    pub source: Value,
}

#[derive(Debug, Serialize)]
pub struct SearchRequest {
    pub from: usize,
    pub size: usize,
    pub query: Value,
    pub sort: Value,
}

impl SearchRequest {
    /// Most recent events first; the working set for one fetch cycle.
    pub fn recent(size: usize) -> Self {
        Self {
            from: 0,
            size,
            query: json!({ "match_all": {} }),
            sort: json!([{ "timestamp": { "order": "desc" } }]),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AgentsResponse {
    #[serde(default)]
    agents: Vec<crate::models::AgentInfo>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAssignment {
    pub agent_id: String,
    #[serde(default)]
    pub agent_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawFimFinding {
    #[serde(default)]
    pub file: String,
    #[serde(default)]
    pub event: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub sha1_after: Option<String>,
    #[serde(default)]
    pub size_after: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct FimLastScanResponse {
    #[serde(default)]
    end: Option<String>,
}

impl MonitorClient {
    pub fn new(config: MonitorConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            config,
            http_client,
        }
    }

    /// `POST /alerts` — paginated alert search.
    pub async fn search_alerts(&self, request: &SearchRequest) -> Result<Vec<RawHit>, UpstreamError> {
        let url = format!("{}/alerts", self.config.base_url);
        let response: SearchResponse = self.post_json(&url, request).await?;
        Ok(response.hits.hits)
    }

    /// `POST /vulnerabilities` — vulnerability search, same envelope shape.
    pub async fn search_vulnerabilities(
        &self,
        request: &SearchRequest,
    ) -> Result<Vec<RawHit>, UpstreamError> {
        let url = format!("{}/vulnerabilities", self.config.base_url);
        let response: SearchResponse = self.post_json(&url, request).await?;
        Ok(response.hits.hits)
    }

    /// `GET /agents` — agent inventory.
    pub async fn list_agents(&self) -> Result<Vec<crate::models::AgentInfo>, UpstreamError> {
        let url = format!("{}/agents", self.config.base_url);
        let response: AgentsResponse = self.get_json(&url).await?;
        Ok(response.agents)
    }

    /// `GET /assigned-agents?userEmail=` — the viewer's agent assignments.
    pub async fn assigned_agents(
        &self,
        user_email: &str,
    ) -> Result<Vec<RawAssignment>, UpstreamError> {
        let url = format!(
            "{}/assigned-agents?userEmail={}",
            self.config.base_url, user_email
        );
        self.get_json(&url).await
    }

    /// Trigger a FIM scan across agents. No body either way.
    pub async fn run_fim_scan(&self) -> Result<(), UpstreamError> {
        let url = format!("{}/fim/scan", self.config.base_url);
        let response = self
            .request(self.http_client.post(&url))
            .send()
            .await
            .map_err(|e| UpstreamError::Network(e.to_string()))?;
        check_status(&response)?;
        Ok(())
    }

    pub async fn fim_results(&self, agent_id: &str) -> Result<Vec<RawFimFinding>, UpstreamError> {
        let url = format!("{}/fim/{}/results", self.config.base_url, agent_id);
        self.get_json(&url).await
    }

    pub async fn clear_fim_results(&self, agent_id: &str) -> Result<(), UpstreamError> {
        let url = format!("{}/fim/{}/results", self.config.base_url, agent_id);
        let response = self
            .request(self.http_client.delete(&url))
            .send()
            .await
            .map_err(|e| UpstreamError::Network(e.to_string()))?;
        check_status(&response)?;
        Ok(())
    }

    pub async fn fim_last_scan(
        &self,
        agent_id: &str,
    ) -> Result<Option<DateTime<Utc>>, UpstreamError> {
        let url = format!("{}/fim/{}/last-scan", self.config.base_url, agent_id);
        let response: FimLastScanResponse = self.get_json(&url).await?;
        Ok(response
            .end
            .as_deref()
            .and_then(crate::logic::normalize::parse_timestamp))
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.api_token {
            Some(token) => builder.header("Authorization", format!("Bearer {}", token)),
            None => builder,
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, UpstreamError> {
        let response = self
            .request(self.http_client.get(url))
            .send()
            .await
            .map_err(|e| UpstreamError::Network(e.to_string()))?;
        check_status(&response)?;
        response
            .json()
            .await
            .map_err(|e| UpstreamError::Decode(e.to_string()))
    }

    async fn post_json<B: Serialize, T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<T, UpstreamError> {
        let response = self
            .request(self.http_client.post(url))
            .json(body)
            .send()
            .await
            .map_err(|e| UpstreamError::Network(e.to_string()))?;
        check_status(&response)?;
        response
            .json()
            .await
            .map_err(|e| UpstreamError::Decode(e.to_string()))
    }
}

fn check_status(response: &reqwest::Response) -> Result<(), UpstreamError> {
    if response.status().is_success() {
        Ok(())
    } else {
        Err(UpstreamError::Status(response.status().as_u16()))
    }
}
