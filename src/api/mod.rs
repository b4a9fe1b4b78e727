//! Singularity REST API
//!
//! HTTP API layer for Singularity, built with Axum.
//!
//! # Endpoints
//!
//! ## Lists
//! - `GET /api/v1/lists` - Registered lists
//! - `GET /api/v1/lists/:namespace` - Synchronize and return the view
//! - `GET /api/v1/lists/:namespace/view/latest` - Last published view
//! - `POST /api/v1/lists/:namespace` - Add an identifier
//! - `DELETE /api/v1/lists/:namespace/:id` - Remove an identifier
//!
//! ## Portfolio
//! - `GET /api/v1/portfolio` - Portfolio view with valuation
//! - `PUT /api/v1/portfolio/holdings/:coin` - Set the amount held
//!
//! ## Health
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe
//! - `GET /health` - Full health status
//!
//! # Example
//!
//! ```rust,ignore
//! use singularity::api::{serve, ApiConfig, AppState};
//! use singularity::config::Config;
//! use singularity::services::Services;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_default();
//!     let services = Services::from_config(&config)?;
//!     let api_config = ApiConfig::from(config.api.clone());
//!
//!     serve(AppState::new(services, api_config.clone()), &api_config).await?;
//!     Ok(())
//! }
//! ```

pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::{ApiConfig, AppState};

use axum::{
    routing::{delete, get, put},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Build the API router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // List routes
        .route("/lists", get(routes::lists::list_namespaces))
        .route(
            "/lists/:namespace",
            get(routes::lists::view_list).post(routes::lists::add_identifier),
        )
        .route("/lists/:namespace/view/latest", get(routes::lists::latest_view))
        .route("/lists/:namespace/:id", delete(routes::lists::remove_identifier))
        // Portfolio routes
        .route("/portfolio", get(routes::portfolio::get_portfolio))
        .route(
            "/portfolio/holdings/:coin",
            put(routes::portfolio::set_holding),
        );

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/ready", get(routes::health::readiness))
        .route("/", get(routes::health::full_health));

    // Create shared state
    let shared_state = Arc::new(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .nest("/health", health_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(shared_state)
}

/// Start the API server
pub async fn serve(state: AppState, config: &ApiConfig) -> Result<(), ApiError> {
    let router = build_router(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Singularity API listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("Singularity API shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
