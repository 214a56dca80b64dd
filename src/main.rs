//! Argus Console Backend Server
//!
//! Backend-for-frontend for the security-operations dashboard.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       ARGUS CONSOLE                          │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐  ┌────────────────────┐  ┌─────────────────┐  │
//! │  │  API      │  │  Classification &  │  │  Assistant      │  │
//! │  │  Gateway  │  │  Aggregation Core  │  │  Workflow       │  │
//! │  │  (Axum)   │  │  (pure functions)  │  │  (state machine)│  │
//! │  └─────┬─────┘  └─────────┬──────────┘  └────────┬────────┘  │
//! │        └──────────────────┼──────────────────────┘           │
//! │                           ▼                                  │
//! │        ┌──────────────────────────────────────┐              │
//! │        │  Monitoring backend / Assistant API  │              │
//! │        └──────────────────────────────────────┘              │
//! └──────────────────────────────────────────────────────────────┘
//! ```

mod clients;
mod config;
mod error;
mod handlers;
mod logic;
mod middleware;
mod models;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tokio::sync::watch;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use std::net::SocketAddr;

use clients::assistant::{AssistantClient, AssistantConfig};
use clients::monitor::{MonitorClient, MonitorConfig};
use logic::assistant::{SummaryWorkflow, WorkflowConfig};
use logic::pipeline::ViewService;

pub use error::{AppError, AppResult};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "argus_console=debug,tower_http=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env();

    tracing::info!("Argus Console server starting...");
    tracing::info!("Monitoring backend: {}", config.monitor_url);
    if config.is_production() && config.jwt_secret.contains("change-in-production") {
        tracing::warn!("Running in production with the default JWT secret");
    }

    let monitor = Arc::new(MonitorClient::new(MonitorConfig {
        base_url: config.monitor_url.clone(),
        api_token: config.monitor_token.clone(),
        timeout_seconds: config.monitor_timeout_secs,
    }));

    let assistant_client = AssistantClient::new(AssistantConfig {
        base_url: config.assistant_url.clone(),
        api_key: config.assistant_api_key.clone(),
        api_version: config.assistant_api_version.clone(),
        timeout_seconds: config.monitor_timeout_secs,
    });
    let assistant = Arc::new(SummaryWorkflow::new(
        assistant_client,
        WorkflowConfig {
            poll_interval: Duration::from_millis(config.assistant_poll_interval_ms),
            max_poll_attempts: config.assistant_poll_max_attempts,
        },
    ));

    let views = Arc::new(ViewService::new(monitor.clone(), config.search_page_size));

    // Shutdown signal doubles as the cancellation source for assistant polls.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Build application state
    let state = AppState {
        config: config.clone(),
        monitor,
        views,
        assistant,
        shutdown: shutdown_rx,
    };

    // Build router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("🚀 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
            let _ = shutdown_tx.send(true);
        })
        .await?;

    Ok(())
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: config::Config,
    pub monitor: Arc<MonitorClient>,
    pub views: Arc<ViewService>,
    pub assistant: Arc<SummaryWorkflow<AssistantClient>>,
    /// Signaled on teardown; assistant poll loops stop when it fires.
    pub shutdown: watch::Receiver<bool>,
}

/// Create the main router with all routes
fn create_router(state: AppState) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(handlers::health::check));

    // Dashboard routes (viewer JWT auth)
    let dashboard_routes = Router::new()
        // Overviews
        .route("/api/v1/overview/alerts", get(handlers::overview::alerts))
        .route("/api/v1/overview/vulnerabilities", get(handlers::overview::vulnerabilities))

        // Agents
        .route("/api/v1/agents", get(handlers::agents::list))
        .route("/api/v1/assignments", get(handlers::assignments::list))

        // FIM
        .route("/api/v1/fim/scan", post(handlers::fim::run_scan))
        .route(
            "/api/v1/fim/:agent_id/results",
            get(handlers::fim::results).delete(handlers::fim::clear_results),
        )
        .route("/api/v1/fim/:agent_id/last-scan", get(handlers::fim::last_scan))

        // Assistant summaries
        .route("/api/v1/assistant/record", post(handlers::assistant::summarize_record))
        .route("/api/v1/assistant/fim/:agent_id", post(handlers::assistant::summarize_fim))

        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_viewer_auth
        ));

    // Combine all routes
    Router::new()
        .merge(public_routes)
        .merge(dashboard_routes)
        .layer(
            ServiceBuilder::new()
                .layer(CompressionLayer::new())
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any)
                )
        )
        .with_state(state)
}
