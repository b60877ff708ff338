//! Shared fixtures for integration tests.
//!
//! Scripted providers and embedders give the pipeline deterministic inputs
//! without any network or model downloads.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use medley_search::{
    MediaItem, MediaKind, MediaProvider, MediaSearchService, MediaSource, ProviderPage,
    SearchError, SearchQuery, TextEmbedder,
};

/// Provider that replays a fixed outcome, optionally after a delay.
#[derive(Debug)]
pub struct ScriptedProvider {
    source: MediaSource,
    outcome: Result<ProviderPage, SearchError>,
    delay: Option<Duration>,
}

impl ScriptedProvider {
    pub fn succeeding(source: MediaSource, items: Vec<MediaItem>, total: u64) -> Self {
        Self {
            source,
            outcome: Ok(ProviderPage { items, total }),
            delay: None,
        }
    }

    pub fn failing(source: MediaSource, error: SearchError) -> Self {
        Self {
            source,
            outcome: Err(error),
            delay: None,
        }
    }

    pub fn slow(source: MediaSource, delay: Duration) -> Self {
        Self {
            source,
            outcome: Ok(ProviderPage::empty()),
            delay: Some(delay),
        }
    }
}

#[async_trait]
impl MediaProvider for ScriptedProvider {
    fn source(&self) -> MediaSource {
        self.source
    }

    async fn search(&self, _query: &SearchQuery) -> Result<ProviderPage, SearchError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.outcome.clone()
    }
}

/// Embedder mapping every text to the same vector, so ranking ties.
#[derive(Debug)]
pub struct ConstantEmbedder;

#[async_trait]
impl TextEmbedder for ConstantEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, SearchError> {
        Ok(vec![1.0])
    }
}

/// Embedder placing keyword matches and non-matches on orthogonal axes.
#[derive(Debug)]
pub struct KeywordEmbedder {
    keyword: &'static str,
}

impl KeywordEmbedder {
    pub fn new(keyword: &'static str) -> Self {
        Self { keyword }
    }
}

#[async_trait]
impl TextEmbedder for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, SearchError> {
        if text.to_lowercase().contains(self.keyword) {
            Ok(vec![1.0, 0.0])
        } else {
            Ok(vec![0.0, 1.0])
        }
    }
}

/// Embedder that always fails.
#[derive(Debug)]
pub struct FailingEmbedder;

#[async_trait]
impl TextEmbedder for FailingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, SearchError> {
        Err(SearchError::Embedding {
            reason: "scripted embedder failure".to_string(),
        })
    }
}

/// Builds a minimal normalized item attributed to `source`.
pub fn item(source: MediaSource, id: &str, title: &str) -> MediaItem {
    MediaItem {
        id: id.to_string(),
        kind: MediaKind::Image,
        source,
        title: title.to_string(),
        description: None,
        thumbnail: format!("https://example.com/{id}/thumb.jpg"),
        preview: format!("https://example.com/{id}/preview.jpg"),
        author: "tester".to_string(),
        author_url: None,
        source_url: format!("https://example.com/{id}"),
        downloads: Vec::new(),
        duration: None,
        width: None,
        height: None,
        tags: None,
    }
}

/// Assembles a service with generous timeouts around scripted components.
pub fn service_with(
    providers: Vec<Box<dyn MediaProvider>>,
    embedder: Arc<dyn TextEmbedder>,
) -> MediaSearchService {
    MediaSearchService::with_providers(
        providers,
        embedder,
        Duration::from_secs(2),
        Duration::from_secs(2),
    )
}
