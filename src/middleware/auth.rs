//! Authentication middleware

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::logic::access::ViewerRole;
use crate::{AppError, AppState};

/// JWT claims for dashboard viewers.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Viewer email; also the key for the agent-assignment lookup.
    pub sub: String,
    pub role: String,
    pub exp: usize,
}

/// Viewer context extracted from the JWT.
#[derive(Debug, Clone)]
pub struct ViewerContext {
    pub email: String,
    pub role: ViewerRole,
}

impl ViewerContext {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// RBAC: Require admin role
/// Use this instead of inline `if !viewer.is_admin()` checks
pub fn require_admin(viewer: &ViewerContext) -> Result<(), AppError> {
    if !viewer.is_admin() {
        tracing::warn!("Admin required but viewer {} is an analyst", viewer.email);
        return Err(AppError::Forbidden);
    }
    Ok(())
}

/// Middleware: Require viewer JWT authentication
pub async fn require_viewer_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_bearer_token(&req)?;

    let token_data = decode::<Claims>(
        &token,
        &DecodingKey::from_secret(state.config.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::TokenInvalid)?;

    let claims = token_data.claims;
    if claims.sub.trim().is_empty() {
        // Unresolved identity fails closed.
        return Err(AppError::Unauthorized);
    }

    let viewer = ViewerContext {
        email: claims.sub,
        role: ViewerRole::from_claim(&claims.role),
    };

    req.extensions_mut().insert(viewer);

    Ok(next.run(req).await)
}

/// Extract bearer token from Authorization header
fn extract_bearer_token(req: &Request) -> Result<String, AppError> {
    let auth_header = req
        .headers()
        .get(AUTHORIZATION)
        .ok_or(AppError::Unauthorized)?
        .to_str()
        .map_err(|_| AppError::Unauthorized)?;

    if !auth_header.starts_with("Bearer ") {
        return Err(AppError::Unauthorized);
    }

    Ok(auth_header[7..].to_string())
}

// Implement FromRequestParts for ViewerContext
#[axum::async_trait]
impl<S> FromRequestParts<S> for ViewerContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<ViewerContext>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}
