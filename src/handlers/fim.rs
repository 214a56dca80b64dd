//! File-integrity-monitoring handlers
//!
//! Thin pass-through to the FIM subsystem with ownership checks on the
//! agent id. Non-admin viewers can only touch agents assigned to them.

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::logic::normalize::{normalize_fim_findings, pad_agent_id};
use crate::middleware::auth::ViewerContext;
use crate::models::FimFinding;
use crate::{AppError, AppResult, AppState};

#[derive(Debug, Serialize)]
pub struct ScanTriggered {
    /// Correlation id for tracing the scan through the logs.
    pub scan_id: Uuid,
    pub triggered: bool,
}

#[derive(Debug, Serialize)]
pub struct LastScanResponse {
    pub agent_id: String,
    pub last_scan: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct ClearedResponse {
    pub agent_id: String,
    pub cleared: bool,
}

/// Trigger a FIM scan across agents.
pub async fn run_scan(
    State(state): State<AppState>,
    _viewer: ViewerContext,
) -> AppResult<Json<ScanTriggered>> {
    let scan_id = Uuid::new_v4();
    state.monitor.run_fim_scan().await?;
    tracing::info!(%scan_id, "FIM scan triggered");
    Ok(Json(ScanTriggered {
        scan_id,
        triggered: true,
    }))
}

/// Latest FIM findings for one agent.
pub async fn results(
    State(state): State<AppState>,
    viewer: ViewerContext,
    Path(agent_id): Path<String>,
) -> AppResult<Json<Vec<FimFinding>>> {
    let agent_id = authorize_agent(&state, &viewer, &agent_id).await?;
    let raw = state.monitor.fim_results(&agent_id).await?;
    Ok(Json(normalize_fim_findings(raw)))
}

/// Clear stored FIM findings for one agent.
pub async fn clear_results(
    State(state): State<AppState>,
    viewer: ViewerContext,
    Path(agent_id): Path<String>,
) -> AppResult<Json<ClearedResponse>> {
    let agent_id = authorize_agent(&state, &viewer, &agent_id).await?;
    state.monitor.clear_fim_results(&agent_id).await?;
    tracing::info!("FIM results cleared for agent {}", agent_id);
    Ok(Json(ClearedResponse {
        agent_id,
        cleared: true,
    }))
}

/// When the agent's last FIM scan finished.
pub async fn last_scan(
    State(state): State<AppState>,
    viewer: ViewerContext,
    Path(agent_id): Path<String>,
) -> AppResult<Json<LastScanResponse>> {
    let agent_id = authorize_agent(&state, &viewer, &agent_id).await?;
    let last_scan = state.monitor.fim_last_scan(&agent_id).await?;
    Ok(Json(LastScanResponse {
        agent_id,
        last_scan,
    }))
}

/// Normalize the path agent id and enforce the viewer's scope on it.
async fn authorize_agent(
    state: &AppState,
    viewer: &ViewerContext,
    agent_id: &str,
) -> Result<String, AppError> {
    let agent_id = pad_agent_id(agent_id);
    let scope = state.views.viewer_scope(viewer).await;
    if !scope.allows(&agent_id) {
        return Err(AppError::Forbidden);
    }
    Ok(agent_id)
}
