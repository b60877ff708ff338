//! Streaming download proxy for provider assets
//!
//! Provider CDNs do not send attachment dispositions, so browsers would
//! navigate to media instead of saving it. The proxy fetches the asset
//! server side and relays the bytes with a safe filename.

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;
use url::Url;

use crate::server::AppState;

/// Query string accepted by `GET /api/download`.
#[derive(Debug, Deserialize)]
pub struct DownloadParams {
    /// Absolute URL of the upstream asset.
    pub url: Option<String>,
    /// Preferred name for the saved file.
    pub filename: Option<String>,
}

/// Handles `GET /api/download` by relaying upstream bytes as an attachment.
pub async fn api_download(
    State(state): State<AppState>,
    Query(params): Query<DownloadParams>,
) -> Response {
    let Some(raw_url) = params.url.as_deref().filter(|url| !url.is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "URL parameter is required"})),
        )
            .into_response();
    };

    let target = match parse_target(raw_url) {
        Ok(url) => url,
        Err(reason) => return download_failed(reason),
    };

    let upstream = match state.http.get(target).send().await {
        Ok(response) => response,
        Err(e) => return download_failed(e.to_string()),
    };
    if !upstream.status().is_success() {
        return download_failed(format!(
            "upstream returned HTTP {}",
            upstream.status().as_u16()
        ));
    }

    let mut headers = HeaderMap::new();
    let content_type = upstream
        .headers()
        .get(header::CONTENT_TYPE)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static("application/octet-stream"));
    headers.insert(header::CONTENT_TYPE, content_type);
    if let Some(length) = upstream.headers().get(header::CONTENT_LENGTH) {
        headers.insert(header::CONTENT_LENGTH, length.clone());
    }

    let filename = sanitize_filename(params.filename.as_deref().unwrap_or(""));
    if let Ok(disposition) = HeaderValue::from_str(&format!("attachment; filename=\"{filename}\""))
    {
        headers.insert(header::CONTENT_DISPOSITION, disposition);
    }

    (headers, Body::from_stream(upstream.bytes_stream())).into_response()
}

/// Validates that the requested URL is an absolute http(s) address.
fn parse_target(raw: &str) -> Result<Url, String> {
    let url = Url::parse(raw).map_err(|e| format!("invalid URL: {e}"))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported URL scheme '{}'", url.scheme()));
    }

    Ok(url)
}

/// Restricts a client supplied filename to a safe character set.
fn sanitize_filename(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() {
        "download".to_string()
    } else {
        cleaned
    }
}

/// Builds the uniform error response for any proxy failure.
fn download_failed(message: impl Into<String>) -> Response {
    let message = message.into();
    warn!("Download proxy failed: {message}");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"error": "Download failed", "message": message})),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_keeps_safe_characters() {
        assert_eq!(sanitize_filename("photo-01_final.jpg"), "photo-01_final.jpg");
    }

    #[test]
    fn test_sanitize_replaces_unsafe_characters() {
        assert_eq!(sanitize_filename("te st.txt"), "te_st.txt");
        assert_eq!(sanitize_filename("a/b\\c:d.png"), "a_b_c_d.png");
        assert_eq!(sanitize_filename("héllo.png"), "h_llo.png");
    }

    #[test]
    fn test_sanitize_defaults_when_empty() {
        assert_eq!(sanitize_filename(""), "download");
    }

    #[test]
    fn test_parse_target_accepts_http_and_https() {
        assert!(parse_target("http://cdn.example.com/a.jpg").is_ok());
        assert!(parse_target("https://cdn.example.com/a.jpg").is_ok());
    }

    #[test]
    fn test_parse_target_rejects_other_schemes() {
        let err = parse_target("ftp://cdn.example.com/a.jpg").unwrap_err();

        assert!(err.contains("scheme"), "unexpected error: {err}");
    }

    #[test]
    fn test_parse_target_rejects_relative_urls() {
        let err = parse_target("/local/path.jpg").unwrap_err();

        assert!(err.contains("invalid URL"), "unexpected error: {err}");
    }
}
