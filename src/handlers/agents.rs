//! Agent inventory handlers

use axum::{extract::State, Json};

use crate::logic::normalize::pad_agent_id;
use crate::middleware::auth::ViewerContext;
use crate::models::AgentInfo;
use crate::{AppResult, AppState};

/// List monitored agents, restricted to the viewer's scope.
pub async fn list(
    State(state): State<AppState>,
    viewer: ViewerContext,
) -> AppResult<Json<Vec<AgentInfo>>> {
    let scope = state.views.viewer_scope(&viewer).await;
    let agents = state.monitor.list_agents().await?;

    let visible = agents
        .into_iter()
        .filter(|agent| scope.allows(&pad_agent_id(&agent.id)))
        .collect();

    Ok(Json(visible))
}
