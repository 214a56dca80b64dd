//! Summarization API client
//!
//! Thin client for the conversational assistant backend: threads, messages,
//! runs, and run-status polling primitives. Bearer-token authenticated with
//! a protocol-version header on every call. The workflow controller in
//! `logic::assistant` owns all state; this client is stateless.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum AssistantError {
    #[error("assistant api error: {0}")]
    Api(String),
    #[error("assistant api returned status {0}")]
    Status(u16),
    #[error("assistant run failed: {0}")]
    RunFailed(String),
    #[error("assistant run timed out")]
    RunTimedOut,
    #[error("summarization cancelled")]
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    Completed,
    Failed,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadMessage {
    pub id: String,
    pub role: MessageRole,
    pub text: String,
    /// Epoch seconds.
    pub created_at: i64,
}

#[derive(Debug, Deserialize)]
struct CreatedThread {
    id: String,
}

#[derive(Debug, Deserialize)]
struct RunResource {
    id: String,
    status: RunStatus,
}

#[derive(Debug, Deserialize)]
struct MessagesPage {
    #[serde(default)]
    data: Vec<ThreadMessage>,
}

/// The slice of the assistant API the workflow controller needs. Split out
/// so workflow tests can drive the state machine with a scripted stub.
#[axum::async_trait]
pub trait SummaryApi: Send + Sync {
    async fn create_thread(&self) -> Result<String, AssistantError>;
    async fn post_message(&self, thread_id: &str, text: &str) -> Result<(), AssistantError>;
    async fn start_run(&self, thread_id: &str) -> Result<String, AssistantError>;
    async fn run_status(&self, thread_id: &str, run_id: &str) -> Result<RunStatus, AssistantError>;
    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>, AssistantError>;
}

#[derive(Debug, Clone)]
pub struct AssistantConfig {
    pub base_url: String,
    pub api_key: String,
    pub api_version: String,
    pub timeout_seconds: u64,
}

pub struct AssistantClient {
    config: AssistantConfig,
    http_client: reqwest::Client,
}

impl AssistantClient {
    pub fn new(config: AssistantConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            config,
            http_client,
        }
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("X-Api-Version", self.config.api_version.as_str())
    }

    async fn send_json<T: serde::de::DeserializeOwned>(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<T, AssistantError> {
        let response = self
            .request(builder)
            .send()
            .await
            .map_err(|e| AssistantError::Api(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AssistantError::Status(response.status().as_u16()));
        }
        response
            .json()
            .await
            .map_err(|e| AssistantError::Api(e.to_string()))
    }
}

#[axum::async_trait]
impl SummaryApi for AssistantClient {
    /// `POST /threads`
    async fn create_thread(&self) -> Result<String, AssistantError> {
        let url = format!("{}/threads", self.config.base_url);
        let thread: CreatedThread = self.send_json(self.http_client.post(&url)).await?;
        Ok(thread.id)
    }

    /// `POST /threads/{id}/messages`
    async fn post_message(&self, thread_id: &str, text: &str) -> Result<(), AssistantError> {
        let url = format!("{}/threads/{}/messages", self.config.base_url, thread_id);
        let body = json!({ "role": "user", "text": text });
        let _: serde_json::Value = self.send_json(self.http_client.post(&url).json(&body)).await?;
        Ok(())
    }

    /// `POST /threads/{id}/runs`
    async fn start_run(&self, thread_id: &str) -> Result<String, AssistantError> {
        let url = format!("{}/threads/{}/runs", self.config.base_url, thread_id);
        let run: RunResource = self.send_json(self.http_client.post(&url)).await?;
        Ok(run.id)
    }

    /// `GET /threads/{id}/runs/{runId}`
    async fn run_status(&self, thread_id: &str, run_id: &str) -> Result<RunStatus, AssistantError> {
        let url = format!(
            "{}/threads/{}/runs/{}",
            self.config.base_url, thread_id, run_id
        );
        let run: RunResource = self.send_json(self.http_client.get(&url)).await?;
        Ok(run.status)
    }

    /// `GET /threads/{id}/messages`
    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>, AssistantError> {
        let url = format!("{}/threads/{}/messages", self.config.base_url, thread_id);
        let page: MessagesPage = self.send_json(self.http_client.get(&url)).await?;
        Ok(page.data)
    }
}
