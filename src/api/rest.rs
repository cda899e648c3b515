//! REST API router and server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    http::{header, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::api::handlers::{
    analyze_handler, autocomplete_handler, health_handler, search_handler, stats_handler, ApiState,
};
use crate::error::Result;

/// REST API configuration.
#[derive(Debug, Clone)]
pub struct RestApiConfig {
    /// Enable permissive CORS.
    pub enable_cors: bool,
    /// API prefix.
    pub prefix: String,
}

impl Default for RestApiConfig {
    fn default() -> Self {
        Self {
            enable_cors: true,
            prefix: "/api".to_string(),
        }
    }
}

/// Create the REST API router.
///
/// Endpoints:
/// - GET  /api/drugs/search?name=...      - Resolve a drug by name
/// - GET  /api/drugs/autocomplete?prefix= - Matching drug names
/// - POST /api/interactions/analyze       - Analyze pairs among drug ids
/// - GET  /api/stats                      - Store and service counters
/// - GET  /health                         - Liveness probe
pub fn create_rest_router(state: Arc<ApiState>, config: &RestApiConfig) -> Router {
    let api_routes = Router::new()
        .route("/drugs/search", get(search_handler))
        .route("/drugs/autocomplete", get(autocomplete_handler))
        .route("/interactions/analyze", post(analyze_handler))
        .route("/stats", get(stats_handler))
        .with_state(state);

    let router = Router::new()
        .nest(&config.prefix, api_routes)
        .route("/health", get(health_handler));

    if config.enable_cors {
        let cors = CorsLayer::new()
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            .allow_origin(Any);
        router.layer(cors)
    } else {
        router
    }
}

/// Bind and serve the REST API until the process is stopped.
pub async fn serve(state: Arc<ApiState>, config: &RestApiConfig, port: u16) -> Result<()> {
    let app = create_rest_router(state, config);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("contrarx listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
