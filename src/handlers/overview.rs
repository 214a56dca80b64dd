//! Overview handlers
//!
//! Each request runs one full fetch cycle: fetch, normalize, ownership
//! filter, classify, then aggregate/score/cross-reference. Upstream
//! failures degrade to an empty view with the `degraded` flag set.

use axum::{extract::State, Json};

use crate::logic::pipeline::{AlertsOverview, VulnerabilitiesOverview};
use crate::middleware::auth::ViewerContext;
use crate::{AppResult, AppState};

/// Alerts dashboard view
pub async fn alerts(
    State(state): State<AppState>,
    viewer: ViewerContext,
) -> AppResult<Json<AlertsOverview>> {
    let scope = state.views.viewer_scope(&viewer).await;
    Ok(Json(state.views.alerts_overview(&scope).await))
}

/// Vulnerabilities dashboard view
pub async fn vulnerabilities(
    State(state): State<AppState>,
    viewer: ViewerContext,
) -> AppResult<Json<VulnerabilitiesOverview>> {
    let scope = state.views.viewer_scope(&viewer).await;
    Ok(Json(state.views.vulnerabilities_overview(&scope).await))
}
