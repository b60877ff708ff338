//! HTTP surface tests against a server bound to an ephemeral port.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::http::header;
use axum::routing::get;
use medley_core::MedleyConfig;
use medley_search::{MediaSearchService, MediaSource};
use medley_web::{AppState, build_router};

use crate::support::{ConstantEmbedder, ScriptedProvider, item, service_with};

/// Binds the API on an ephemeral port and serves it in the background.
async fn spawn_api(state: AppState) -> SocketAddr {
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    addr
}

fn state_with(service: MediaSearchService) -> AppState {
    AppState::new(MedleyConfig::for_testing(), Arc::new(service))
}

fn sample_service() -> MediaSearchService {
    service_with(
        vec![
            Box::new(ScriptedProvider::succeeding(
                MediaSource::Pexels,
                vec![
                    item(MediaSource::Pexels, "pexels-1", "harbor cranes"),
                    item(MediaSource::Pexels, "pexels-2", "container ship"),
                ],
                12,
            )),
            Box::new(ScriptedProvider::succeeding(
                MediaSource::Freesound,
                vec![item(
                    MediaSource::Freesound,
                    "freesound-1",
                    "harbor ambience",
                )],
                3,
            )),
        ],
        Arc::new(ConstantEmbedder),
    )
}

#[tokio::test]
async fn test_search_returns_normalized_json() {
    let addr = spawn_api(state_with(sample_service())).await;

    let response = reqwest::get(format!("http://{addr}/api/search?query=harbor"))
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 3);
    assert_eq!(items[0]["source"], "pexels");
    assert_eq!(items[1]["source"], "freesound");
    assert_eq!(items[2]["source"], "pexels");
    assert_eq!(items[0]["type"], "image");
    assert_eq!(body["totalResults"], 15);
    assert_eq!(body["page"], 1);
    assert_eq!(body["perPage"], 20);

    let sources = body["sources"].as_array().unwrap();
    assert_eq!(sources.len(), 2);
    assert!(
        sources[0].get("error").is_none(),
        "successful sources must not report an error"
    );
}

#[tokio::test]
async fn test_search_without_query_is_rejected() {
    let addr = spawn_api(state_with(sample_service())).await;

    let response = reqwest::get(format!("http://{addr}/api/search"))
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Query parameter is required");

    let response = reqwest::get(format!("http://{addr}/api/search?query="))
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_search_normalizes_sloppy_parameters() {
    let addr = spawn_api(state_with(sample_service())).await;

    let response = reqwest::get(format!(
        "http://{addr}/api/search?query=harbor&type=hologram&page=abc&perPage=9000"
    ))
    .await
    .unwrap();
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["page"], 1);
    assert_eq!(body["perPage"], 50);
}

#[tokio::test]
async fn test_health_reports_ok() {
    let addr = spawn_api(state_with(sample_service())).await;

    let response = reqwest::get(format!("http://{addr}/api/health"))
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert!(body["timestamp"].is_string());
}

/// Serves one fixed text file, standing in for a provider CDN.
async fn spawn_upstream() -> SocketAddr {
    let app = Router::new().route(
        "/sample.txt",
        get(|| async { ([(header::CONTENT_TYPE, "text/plain")], "hello medley") }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    addr
}

#[tokio::test]
async fn test_download_streams_upstream_bytes_as_attachment() {
    let upstream = spawn_upstream().await;
    let addr = spawn_api(state_with(sample_service())).await;

    let client = reqwest::Client::new();
    let response = client
        .get(format!("http://{addr}/api/download"))
        .query(&[
            ("url", format!("http://{upstream}/sample.txt")),
            ("filename", "te st.txt".to_string()),
        ])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(
        response
            .headers()
            .get("content-disposition")
            .and_then(|value| value.to_str().ok()),
        Some("attachment; filename=\"te_st.txt\"")
    );
    assert!(
        response
            .headers()
            .get("content-type")
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("text/plain")),
        "content type must be passed through from upstream"
    );
    assert_eq!(response.text().await.unwrap(), "hello medley");
}

#[tokio::test]
async fn test_download_without_url_is_rejected() {
    let addr = spawn_api(state_with(sample_service())).await;

    let response = reqwest::get(format!("http://{addr}/api/download"))
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "URL parameter is required");
}

#[tokio::test]
async fn test_download_rejects_unsupported_scheme() {
    let addr = spawn_api(state_with(sample_service())).await;

    let response = reqwest::get(format!(
        "http://{addr}/api/download?url=ftp://example.com/a.bin"
    ))
    .await
    .unwrap();
    assert_eq!(response.status(), 500);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Download failed");
    assert!(
        body["message"]
            .as_str()
            .is_some_and(|message| message.contains("scheme"))
    );
}

#[tokio::test]
async fn test_rate_limit_returns_429_when_budget_exhausted() {
    let mut config = MedleyConfig::for_testing();
    config.server.rate_limit_per_minute = 3;
    let state = AppState::new(
        config,
        Arc::new(service_with(vec![], Arc::new(ConstantEmbedder))),
    );
    let addr = spawn_api(state).await;

    let client = reqwest::Client::new();
    for _ in 0..3 {
        let response = client
            .get(format!("http://{addr}/api/health"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
    }

    let response = client
        .get(format!("http://{addr}/api/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 429);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Too many requests, please try again later.");
}
