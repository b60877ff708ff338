//! Search aggregation across all configured providers.
//!
//! Fans a query out to every provider concurrently, folds failures into
//! per-source status instead of propagating them, interleaves the surviving
//! results round-robin, and hands the merged list to the semantic re-ranker.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future;
use tracing::{debug, info, warn};

use medley_core::MedleyConfig;

use crate::embedding::{FastEmbedder, TextEmbedder};
use crate::errors::SearchError;
use crate::providers::{MediaProvider, default_providers};
use crate::rerank::rerank;
use crate::types::{
    MediaItem, MediaSource, SearchQuery, SearchResponse, SourceOutcome, SourceSummary,
};

/// Media search service aggregating every configured provider.
#[derive(Debug)]
pub struct MediaSearchService {
    providers: Vec<Box<dyn MediaProvider>>,
    embedder: Arc<dyn TextEmbedder>,
    provider_timeout: Duration,
    rerank_timeout: Duration,
}

impl MediaSearchService {
    /// Creates the production service: full provider registry plus the
    /// fastembed-backed ranker.
    pub fn from_config(config: &MedleyConfig) -> Self {
        Self::with_providers(
            default_providers(config),
            Arc::new(FastEmbedder::new(config.embedding.cache_dir.clone())),
            config.network.provider_timeout,
            config.embedding.rerank_timeout,
        )
    }

    /// Creates a service over explicit providers and embedder.
    ///
    /// This is the seam used by integration tests to swap in scripted
    /// providers without touching the network.
    pub fn with_providers(
        providers: Vec<Box<dyn MediaProvider>>,
        embedder: Arc<dyn TextEmbedder>,
        provider_timeout: Duration,
        rerank_timeout: Duration,
    ) -> Self {
        Self {
            providers,
            embedder,
            provider_timeout,
            rerank_timeout,
        }
    }

    /// Runs one aggregated search.
    ///
    /// Never fails: provider errors and timeouts degrade into per-source
    /// status entries, and an unavailable embedding model leaves the
    /// interleaved order in place.
    pub async fn search_all(&self, query: &SearchQuery) -> SearchResponse {
        let started = Instant::now();

        let outcomes = self.fan_out(query).await;

        let total_results = outcomes.iter().map(|outcome| outcome.total).sum();
        let sources: Vec<SourceSummary> = outcomes
            .iter()
            .map(|outcome| SourceSummary {
                source: outcome.source,
                count: outcome.items.len(),
                error: outcome.error.clone(),
            })
            .collect();

        let flattened: Vec<MediaItem> = outcomes
            .into_iter()
            .flat_map(|outcome| outcome.items)
            .collect();
        let interleaved = interleave_by_source(flattened);

        let items = if query.text.is_empty() {
            interleaved
        } else {
            rerank(
                self.embedder.as_ref(),
                &query.text,
                interleaved,
                self.rerank_timeout,
            )
            .await
        };

        info!(
            query = %query.text,
            items = items.len(),
            total_results,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Search completed"
        );

        SearchResponse {
            items,
            total_results,
            page: query.page,
            per_page: query.per_page,
            sources,
        }
    }

    async fn fan_out(&self, query: &SearchQuery) -> Vec<SourceOutcome> {
        let searches = self.providers.iter().map(|provider| {
            let source = provider.source();
            async move {
                let started = Instant::now();
                let result =
                    tokio::time::timeout(self.provider_timeout, provider.search(query)).await;
                let elapsed_ms = started.elapsed().as_millis() as u64;

                match result {
                    Ok(Ok(page)) => {
                        debug!(
                            source = %source,
                            items = page.items.len(),
                            total = page.total,
                            elapsed_ms,
                            "Provider responded"
                        );
                        SourceOutcome::success(source, page)
                    }
                    Ok(Err(e)) => {
                        warn!(source = %source, query = %query.text, "Provider failed: {e}");
                        SourceOutcome::failure(source, e.to_string())
                    }
                    Err(_) => {
                        let e = SearchError::Timeout {
                            provider: source,
                            seconds: self.provider_timeout.as_secs(),
                        };
                        warn!(source = %source, query = %query.text, "{e}");
                        SourceOutcome::failure(source, e.to_string())
                    }
                }
            }
        });

        future::join_all(searches).await
    }
}

/// Round-robin interleave by source.
///
/// Groups items by source in first-appearance order, then emits one item per
/// non-exhausted group per round. Per-source order is preserved exactly.
fn interleave_by_source(items: Vec<MediaItem>) -> Vec<MediaItem> {
    let mut groups: Vec<(MediaSource, VecDeque<MediaItem>)> = Vec::new();
    for item in items {
        match groups.iter_mut().find(|(source, _)| *source == item.source) {
            Some((_, group)) => group.push_back(item),
            None => groups.push((item.source, VecDeque::from(vec![item]))),
        }
    }

    let capacity: usize = groups.iter().map(|(_, group)| group.len()).sum();
    let mut interleaved = Vec::with_capacity(capacity);
    while interleaved.len() < capacity {
        for (_, group) in &mut groups {
            if let Some(item) = group.pop_front() {
                interleaved.push(item);
            }
        }
    }
    interleaved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::mock::{MockProvider, test_item};
    use crate::types::{MediaKind, MediaType, ProviderPage};
    use async_trait::async_trait;
    use proptest::prelude::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct ConstantEmbedder;

    #[async_trait]
    impl TextEmbedder for ConstantEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, SearchError> {
            Ok(vec![1.0, 0.0])
        }
    }

    #[derive(Debug)]
    struct CountingEmbedder {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl TextEmbedder for CountingEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, SearchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![1.0, 0.0])
        }
    }

    #[derive(Debug)]
    struct KeywordEmbedder;

    #[async_trait]
    impl TextEmbedder for KeywordEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>, SearchError> {
            let cat = if text.contains("cat") { 1.0 } else { 0.0 };
            Ok(vec![cat, 0.1])
        }
    }

    #[derive(Debug)]
    struct SlowProvider;

    #[async_trait]
    impl MediaProvider for SlowProvider {
        fn source(&self) -> MediaSource {
            MediaSource::Pexels
        }

        async fn search(&self, _query: &SearchQuery) -> Result<ProviderPage, SearchError> {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok(ProviderPage::empty())
        }
    }

    fn service_with(providers: Vec<Box<dyn MediaProvider>>) -> MediaSearchService {
        MediaSearchService::with_providers(
            providers,
            Arc::new(ConstantEmbedder),
            Duration::from_secs(1),
            Duration::from_secs(1),
        )
    }

    fn items_for(source: MediaSource, count: usize) -> Vec<MediaItem> {
        let prefix = source.name().to_lowercase();
        (1..=count)
            .map(|i| test_item(source, &format!("{prefix}-{i}"), "fixture"))
            .collect()
    }

    #[test]
    fn test_interleave_round_robins_uneven_groups() {
        let mut items = Vec::new();
        items.extend(items_for(MediaSource::Pexels, 3));
        items.extend(items_for(MediaSource::Pixabay, 1));
        items.extend(items_for(MediaSource::Freesound, 5));

        let interleaved = interleave_by_source(items);

        let ids: Vec<&str> = interleaved.iter().map(|item| item.id.as_str()).collect();
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

    #[test]
    fn test_interleave_empty_input() {
        assert!(interleave_by_source(Vec::new()).is_empty());
    }

    #[tokio::test]
    async fn test_every_failure_subset_degrades_gracefully() {
        let sources = MediaSource::all();
        for mask in 0u32..16 {
            let mut providers: Vec<Box<dyn MediaProvider>> = Vec::new();
            for (position, source) in sources.into_iter().enumerate() {
                if mask & (1 << position) != 0 {
                    providers.push(Box::new(MockProvider::failing(
                        source,
                        SearchError::UpstreamStatus {
                            provider: source,
                            status: 500,
                        },
                    )));
                } else {
                    providers.push(Box::new(MockProvider::succeeding(
                        source,
                        items_for(source, 1),
                        10,
                    )));
                }
            }

            let service = service_with(providers);
            let response = service.search_all(&SearchQuery::new("")).await;

            let successes = 4 - mask.count_ones() as usize;
            assert_eq!(response.items.len(), successes, "mask {mask}");
            assert_eq!(response.total_results, successes as u64 * 10, "mask {mask}");
            assert_eq!(response.sources.len(), 4, "mask {mask}");

            for (position, summary) in response.sources.iter().enumerate() {
                let failed = mask & (1 << position) != 0;
                assert_eq!(summary.source, sources[position], "mask {mask}");
                assert_eq!(summary.error.is_some(), failed, "mask {mask}");
                assert_eq!(summary.count, usize::from(!failed), "mask {mask}");
            }

            for item in &response.items {
                let position = sources
                    .iter()
                    .position(|source| *source == item.source)
                    .unwrap();
                assert_eq!(mask & (1 << position), 0, "item from failed source");
            }
        }
    }

    #[tokio::test]
    async fn test_slow_provider_becomes_timeout_failure() {
        let service = MediaSearchService::with_providers(
            vec![Box::new(SlowProvider)],
            Arc::new(ConstantEmbedder),
            Duration::from_millis(10),
            Duration::from_secs(1),
        );

        let response = service.search_all(&SearchQuery::new("")).await;

        assert!(response.items.is_empty());
        let error = response.sources[0].error.as_deref().unwrap();
        assert!(error.contains("timed out"), "unexpected error: {error}");
    }

    #[tokio::test]
    async fn test_empty_query_skips_embedding_and_keeps_order() {
        let calls = Arc::new(AtomicUsize::new(0));
        let service = MediaSearchService::with_providers(
            vec![Box::new(MockProvider::succeeding(
                MediaSource::Pixabay,
                items_for(MediaSource::Pixabay, 3),
                3,
            ))],
            Arc::new(CountingEmbedder {
                calls: Arc::clone(&calls),
            }),
            Duration::from_secs(1),
            Duration::from_secs(1),
        );

        let response = service.search_all(&SearchQuery::new("")).await;

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        let ids: Vec<&str> = response.items.iter().map(|item| item.id.as_str()).collect();
        assert_eq!(ids, vec!["pixabay-1", "pixabay-2", "pixabay-3"]);
    }

    #[tokio::test]
    async fn test_query_text_triggers_semantic_ordering() {
        let items = vec![
            test_item(MediaSource::Pexels, "pexels-1", "sleepy dog"),
            test_item(MediaSource::Pexels, "pexels-2", "cat nap"),
        ];
        let service = MediaSearchService::with_providers(
            vec![Box::new(MockProvider::succeeding(
                MediaSource::Pexels,
                items,
                2,
            ))],
            Arc::new(KeywordEmbedder),
            Duration::from_secs(1),
            Duration::from_secs(1),
        );

        let response = service.search_all(&SearchQuery::new("cat")).await;

        assert_eq!(response.items[0].id, "pexels-2");
        assert_eq!(response.items.len(), 2);
    }

    #[tokio::test]
    async fn test_incompatible_type_never_reaches_upstream() {
        let provider = MockProvider::single_type(
            MediaSource::Giphy,
            MediaKind::Gif,
            items_for(MediaSource::Giphy, 1),
            5,
        );
        let counter = provider.call_counter();
        let service = service_with(vec![Box::new(provider)]);

        let mut query = SearchQuery::new("");
        query.media_type = MediaType::Image;
        let response = service.search_all(&query).await;

        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert!(response.items.is_empty());
        // A short-circuited provider is a success with zero items.
        assert!(response.sources[0].error.is_none());
        assert_eq!(response.total_results, 0);

        query.media_type = MediaType::Gif;
        let response = service.search_all(&query).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(response.items.len(), 1);
    }

    #[tokio::test]
    async fn test_from_config_registers_full_registry() {
        let service = MediaSearchService::from_config(&MedleyConfig::for_testing());
        assert_eq!(service.providers.len(), 4);
    }

    proptest! {
        #[test]
        fn prop_interleave_preserves_length_and_per_source_order(
            source_picks in proptest::collection::vec(0usize..4, 0..40)
        ) {
            let sources = MediaSource::all();
            let mut counters = [0usize; 4];
            let items: Vec<MediaItem> = source_picks
                .iter()
                .map(|&pick| {
                    counters[pick] += 1;
                    let prefix = sources[pick].name().to_lowercase();
                    test_item(sources[pick], &format!("{prefix}-{}", counters[pick]), "x")
                })
                .collect();

            let interleaved = interleave_by_source(items.clone());

            prop_assert_eq!(interleaved.len(), items.len());
            for source in sources {
                let before: Vec<&str> = items
                    .iter()
                    .filter(|item| item.source == source)
                    .map(|item| item.id.as_str())
                    .collect();
                let after: Vec<&str> = interleaved
                    .iter()
                    .filter(|item| item.source == source)
                    .map(|item| item.id.as_str())
                    .collect();
                prop_assert_eq!(before, after);
            }
        }
    }
}
