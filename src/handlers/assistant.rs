//! Assistant summarization handlers
//!
//! Run failures and timeouts surface inline in the conversation payload,
//! not as HTTP errors; only transport-level problems become a 5xx.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use validator::Validate;

use crate::clients::assistant::{AssistantError, ThreadMessage};
use crate::logic::normalize::{normalize_fim_findings, pad_agent_id};
use crate::middleware::auth::ViewerContext;
use crate::{AppError, AppResult, AppState};

#[derive(Debug, Deserialize, Validate)]
pub struct RecordSummaryRequest {
    /// Thread-reuse key; one conversation per subject.
    #[validate(length(min = 1, message = "subject_key must not be empty"))]
    pub subject_key: String,
    /// Already-normalized record payload to narrate.
    pub payload: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub messages: Vec<ThreadMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<SummaryError>,
}

#[derive(Debug, Serialize)]
pub struct SummaryError {
    pub message: String,
    /// Whether a "try again" affordance makes sense.
    pub retryable: bool,
}

/// Narrate a single alert or vulnerability record.
pub async fn summarize_record(
    State(state): State<AppState>,
    _viewer: ViewerContext,
    Json(req): Json<RecordSummaryRequest>,
) -> AppResult<Json<SummaryResponse>> {
    req.validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let result = state
        .assistant
        .summarize(&req.subject_key, &req.payload, state.shutdown.clone())
        .await;

    Ok(Json(into_response(result)))
}

/// Fetch an agent's FIM results and narrate them.
pub async fn summarize_fim(
    State(state): State<AppState>,
    viewer: ViewerContext,
    Path(agent_id): Path<String>,
) -> AppResult<Json<SummaryResponse>> {
    let agent_id = pad_agent_id(&agent_id);
    let scope = state.views.viewer_scope(&viewer).await;
    if !scope.allows(&agent_id) {
        return Err(AppError::Forbidden);
    }

    let findings = normalize_fim_findings(state.monitor.fim_results(&agent_id).await?);
    let payload = json!({
        "agent_id": agent_id,
        "finding_count": findings.len(),
        "findings": findings,
    });

    let subject_key = format!("fim:{agent_id}");
    let result = state
        .assistant
        .summarize(&subject_key, &payload, state.shutdown.clone())
        .await;

    Ok(Json(into_response(result)))
}

fn into_response(result: Result<Vec<ThreadMessage>, AssistantError>) -> SummaryResponse {
    match result {
        Ok(messages) => SummaryResponse {
            messages,
            error: None,
        },
        Err(err) => {
            let (message, retryable) = match &err {
                AssistantError::RunFailed(msg) => (msg.clone(), false),
                AssistantError::RunTimedOut => (
                    "The summary did not complete in time. Try again.".to_string(),
                    true,
                ),
                AssistantError::Cancelled => ("Summarization was cancelled.".to_string(), true),
                AssistantError::Api(_) | AssistantError::Status(_) => (
                    "The summarization service is currently unavailable.".to_string(),
                    true,
                ),
            };
            tracing::warn!(error = %err, "summarization did not produce messages");
            SummaryResponse {
                messages: vec![],
                error: Some(SummaryError { message, retryable }),
            }
        }
    }
}
