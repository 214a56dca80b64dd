//! Agent-assignment lookup handlers
//!
//! Assignments are created by an external admin action and are read-only
//! here; this endpoint lets an admin inspect what a given user can see.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use validator::Validate;

use crate::logic::normalize::normalize_assignments;
use crate::middleware::auth::{require_admin, ViewerContext};
use crate::models::AgentAssignment;
use crate::{AppError, AppResult, AppState};

#[derive(Debug, Deserialize, Validate)]
pub struct AssignmentQuery {
    #[validate(email(message = "user_email must be a valid email address"))]
    pub user_email: String,
}

/// List a user's agent assignments. Admin only.
pub async fn list(
    State(state): State<AppState>,
    viewer: ViewerContext,
    Query(query): Query<AssignmentQuery>,
) -> AppResult<Json<Vec<AgentAssignment>>> {
    require_admin(&viewer)?;
    query
        .validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let raw = state.monitor.assigned_agents(&query.user_email).await?;
    Ok(Json(normalize_assignments(raw, &query.user_email)))
}
