//! API handlers for aggregated search and service health

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use chrono::{SecondsFormat, Utc};
use medley_search::{DEFAULT_PER_PAGE, MAX_PER_PAGE, MediaType, OrderBy, Orientation, SearchQuery};
use serde::Deserialize;
use serde_json::json;

use crate::server::AppState;

/// Query string accepted by `GET /api/search`.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    /// Search text, the only required parameter.
    pub query: Option<String>,
    /// Media type filter, defaults to `all`.
    #[serde(rename = "type")]
    pub media_type: Option<String>,
    /// Result page, 1-based.
    pub page: Option<String>,
    /// Requested items per provider page.
    #[serde(rename = "perPage")]
    pub per_page: Option<String>,
    /// Image orientation filter.
    pub orientation: Option<String>,
    /// Dominant color filter.
    pub color: Option<String>,
    /// Result ordering hint.
    #[serde(rename = "orderBy")]
    pub order_by: Option<String>,
}

/// Handles `GET /api/search` by fanning out to all configured providers.
pub async fn api_search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Response {
    let Some(raw_query) = params.query.as_deref() else {
        return missing_query();
    };
    if raw_query.is_empty() {
        return missing_query();
    }

    let query = build_query(&params, raw_query);
    let response = state.search.search_all(&query).await;

    Json(response).into_response()
}

/// Handles `GET /api/health` for load balancers and uptime checks.
pub async fn api_health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    }))
}

fn missing_query() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({"error": "Query parameter is required"})),
    )
        .into_response()
}

/// Normalizes raw query string values into a `SearchQuery`.
///
/// Unparseable numbers fall back to their defaults and unknown enum values
/// are dropped rather than rejected, so stale or sloppy clients still get
/// results.
fn build_query(params: &SearchParams, raw_query: &str) -> SearchQuery {
    let mut query = SearchQuery::new(raw_query.trim());

    query.media_type = MediaType::parse_param(params.media_type.as_deref().unwrap_or(""));
    query.page = params
        .page
        .as_deref()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(1)
        .max(1);
    query.per_page = params
        .per_page
        .as_deref()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(DEFAULT_PER_PAGE)
        .clamp(1, MAX_PER_PAGE);
    query.orientation = params
        .orientation
        .as_deref()
        .and_then(Orientation::parse_param);
    query.order_by = params.order_by.as_deref().and_then(OrderBy::parse_param);
    query.color = params.color.clone().filter(|color| !color.is_empty());

    query
}
