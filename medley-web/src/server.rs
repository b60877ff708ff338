//! HTTP server assembly for the Medley JSON API.
//!
//! Builds the axum router with CORS and per-client rate limiting and owns
//! the shared state handed to every request handler.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::{ConnectInfo, Request, State};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use medley_core::{MedleyConfig, MedleyError, RequestLimiter};
use medley_search::MediaSearchService;
use serde_json::json;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};

use crate::handlers::{api_download, api_health, api_search};

/// Shared state available to every API handler.
#[derive(Clone)]
pub struct AppState {
    /// Aggregated search service doing the provider fan-out.
    pub search: Arc<MediaSearchService>,
    /// Client used to proxy asset downloads.
    pub http: reqwest::Client,
    /// Per-client request budget for the API surface.
    pub limiter: Arc<RequestLimiter>,
    /// Settings the server was started with.
    pub config: MedleyConfig,
}

impl AppState {
    /// Assembles request state from configuration and a search service.
    pub fn new(config: MedleyConfig, search: Arc<MediaSearchService>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(config.network.download_timeout)
            .user_agent(config.network.user_agent)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        let limiter = Arc::new(RequestLimiter::new(config.server.rate_limit_per_minute));

        Self {
            search,
            http,
            limiter,
            config,
        }
    }
}

/// Builds the API router with rate limiting and CORS applied.
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.server.cors_origins);

    Router::new()
        // JSON API endpoints
        .route("/api/search", get(api_search))
        .route("/api/download", get(api_download))
        .route("/api/health", get(api_health))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            enforce_rate_limit,
        ))
        .layer(cors)
        .with_state(state)
}

/// Restricts cross-origin access to the configured frontend origins.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET])
        .allow_credentials(true)
}

/// Rejects clients that exhausted their per-minute request budget.
async fn enforce_rate_limit(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Response {
    match state.limiter.check(addr.ip()) {
        Ok(()) => next.run(request).await,
        Err(e) => {
            warn!("Rate limited {}: {e}", addr.ip());
            (
                StatusCode::TOO_MANY_REQUESTS,
                Json(json!({"error": "Too many requests, please try again later."})),
            )
                .into_response()
        }
    }
}

/// Runs the API server on the configured bind address until shutdown.
///
/// # Errors
///
/// - `MedleyError::Server` - If binding or serving on the address fails
pub async fn run_server(config: MedleyConfig) -> medley_core::Result<()> {
    let search = Arc::new(MediaSearchService::from_config(&config));
    let bind_address = config.server.bind_address;
    let state = AppState::new(config, search);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(bind_address)
        .await
        .map_err(|e| MedleyError::Server {
            reason: format!("failed to bind {bind_address}: {e}"),
        })?;
    info!("Medley API server listening on http://{bind_address}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .map_err(|e| MedleyError::Server {
        reason: format!("server error: {e}"),
    })?;

    Ok(())
}
