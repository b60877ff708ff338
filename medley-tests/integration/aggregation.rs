//! End-to-end aggregation pipeline tests.
//!
//! Drive a full service assembled from scripted providers and embedders and
//! assert on the response the HTTP layer would serialize.

use std::sync::Arc;
use std::time::Duration;

use medley_search::{MediaProvider, MediaSearchService, MediaSource, SearchError, SearchQuery};

use crate::support::{
    ConstantEmbedder, FailingEmbedder, KeywordEmbedder, ScriptedProvider, item, service_with,
};

#[tokio::test]
async fn test_partial_failure_keeps_successful_sources() {
    let service = service_with(
        vec![
            Box::new(ScriptedProvider::succeeding(
                MediaSource::Pexels,
                vec![
                    item(MediaSource::Pexels, "pexels-1", "downtown at dusk"),
                    item(MediaSource::Pexels, "pexels-2", "rooftop view"),
                ],
                40,
            )),
            Box::new(ScriptedProvider::failing(
                MediaSource::Pixabay,
                SearchError::Network {
                    provider: MediaSource::Pixabay,
                    reason: "connection refused".to_string(),
                },
            )),
            Box::new(ScriptedProvider::succeeding(
                MediaSource::Giphy,
                vec![item(MediaSource::Giphy, "giphy-1", "city lights loop")],
                7,
            )),
            Box::new(ScriptedProvider::failing(
                MediaSource::Freesound,
                SearchError::MissingCredential {
                    provider: MediaSource::Freesound,
                },
            )),
        ],
        Arc::new(ConstantEmbedder),
    );

    let response = service.search_all(&SearchQuery::new("city skyline")).await;

    assert_eq!(response.sources.len(), 4);
    assert_eq!(response.sources[0].source, MediaSource::Pexels);
    assert_eq!(response.sources[0].count, 2);
    assert_eq!(response.sources[0].error, None);
    assert!(
        response.sources[1]
            .error
            .as_deref()
            .is_some_and(|error| error.contains("request failed")),
        "pixabay failure should be reported"
    );
    assert_eq!(response.sources[1].count, 0);
    assert!(
        response.sources[3]
            .error
            .as_deref()
            .is_some_and(|error| error.contains("not configured")),
        "freesound failure should be reported"
    );

    assert_eq!(response.items.len(), 3);
    assert!(
        response
            .items
            .iter()
            .all(|item| matches!(item.source, MediaSource::Pexels | MediaSource::Giphy)),
        "items must come only from successful sources"
    );
    assert_eq!(response.total_results, 47);
}

#[tokio::test]
async fn test_all_providers_failing_yields_empty_response() {
    let providers: Vec<Box<dyn MediaProvider>> = MediaSource::all()
        .into_iter()
        .map(|source| {
            Box::new(ScriptedProvider::failing(
                source,
                SearchError::UpstreamStatus {
                    provider: source,
                    status: 503,
                },
            )) as Box<dyn MediaProvider>
        })
        .collect();
    let service = service_with(providers, Arc::new(ConstantEmbedder));

    let response = service.search_all(&SearchQuery::new("anything")).await;

    assert!(response.items.is_empty());
    assert_eq!(response.total_results, 0);
    assert_eq!(response.sources.len(), 4);
    assert!(
        response
            .sources
            .iter()
            .all(|summary| summary.error.is_some())
    );
}

#[tokio::test]
async fn test_interleaving_round_robin_across_sources() {
    let service = service_with(
        vec![
            Box::new(ScriptedProvider::succeeding(
                MediaSource::Pexels,
                vec![
                    item(MediaSource::Pexels, "pexels-1", "a"),
                    item(MediaSource::Pexels, "pexels-2", "b"),
                    item(MediaSource::Pexels, "pexels-3", "c"),
                ],
                3,
            )),
            Box::new(ScriptedProvider::succeeding(
                MediaSource::Pixabay,
                vec![item(MediaSource::Pixabay, "pixabay-1", "d")],
                1,
            )),
            Box::new(ScriptedProvider::succeeding(MediaSource::Giphy, vec![], 0)),
            Box::new(ScriptedProvider::succeeding(
                MediaSource::Freesound,
                vec![
                    item(MediaSource::Freesound, "freesound-1", "e"),
                    item(MediaSource::Freesound, "freesound-2", "f"),
                    item(MediaSource::Freesound, "freesound-3", "g"),
                    item(MediaSource::Freesound, "freesound-4", "h"),
                    item(MediaSource::Freesound, "freesound-5", "i"),
                ],
                5,
            )),
        ],
        Arc::new(ConstantEmbedder),
    );

    // Empty text skips re-ranking, leaving the bare interleaved order.
    let response = service.search_all(&SearchQuery::new("")).await;

    let ids: Vec<&str> = response.items.iter().map(|item| item.id.as_str()).collect();
    assert_eq!(
        ids,
        vec![
            "pexels-1",
            "pixabay-1",
            "freesound-1",
            "pexels-2",
            "freesound-2",
            "pexels-3",
            "freesound-3",
            "freesound-4",
            "freesound-5",
        ]
    );
}

#[tokio::test]
async fn test_rerank_orders_semantically_similar_first() {
    let service = service_with(
        vec![Box::new(ScriptedProvider::succeeding(
            MediaSource::Pexels,
            vec![
                item(MediaSource::Pexels, "d1", "muddy dog"),
                item(MediaSource::Pexels, "c1", "cat on a roof"),
                item(MediaSource::Pexels, "d2", "another dog"),
                item(MediaSource::Pexels, "c2", "sleeping cat"),
            ],
            4,
        ))],
        Arc::new(KeywordEmbedder::new("cat")),
    );

    let response = service.search_all(&SearchQuery::new("cat pictures")).await;

    let ids: Vec<&str> = response.items.iter().map(|item| item.id.as_str()).collect();
    assert_eq!(ids, vec!["c1", "c2", "d1", "d2"]);
}

#[tokio::test]
async fn test_embedding_failure_falls_back_to_interleaved_order() {
    let service = service_with(
        vec![
            Box::new(ScriptedProvider::succeeding(
                MediaSource::Pexels,
                vec![
                    item(MediaSource::Pexels, "pexels-1", "first"),
                    item(MediaSource::Pexels, "pexels-2", "second"),
                ],
                2,
            )),
            Box::new(ScriptedProvider::succeeding(
                MediaSource::Giphy,
                vec![item(MediaSource::Giphy, "giphy-1", "third")],
                1,
            )),
        ],
        Arc::new(FailingEmbedder),
    );

    let response = service.search_all(&SearchQuery::new("anything")).await;

    let ids: Vec<&str> = response.items.iter().map(|item| item.id.as_str()).collect();
    assert_eq!(ids, vec!["pexels-1", "giphy-1", "pexels-2"]);
}

#[tokio::test]
async fn test_slow_provider_times_out_and_is_reported() {
    let service = MediaSearchService::with_providers(
        vec![
            Box::new(ScriptedProvider::slow(
                MediaSource::Pexels,
                Duration::from_millis(500),
            )),
            Box::new(ScriptedProvider::succeeding(
                MediaSource::Giphy,
                vec![item(MediaSource::Giphy, "giphy-1", "awkward wave")],
                1,
            )),
        ],
        Arc::new(ConstantEmbedder),
        Duration::from_millis(50),
        Duration::from_secs(1),
    );

    let response = service.search_all(&SearchQuery::new("")).await;

    assert!(
        response.sources[0]
            .error
            .as_deref()
            .is_some_and(|error| error.contains("timed out")),
        "slow provider should be reported as timed out"
    );
    let ids: Vec<&str> = response.items.iter().map(|item| item.id.as_str()).collect();
    assert_eq!(ids, vec!["giphy-1"]);
}
