//! Mock provider implementation for testing.

#[cfg(test)]
use std::sync::Arc;
#[cfg(test)]
use std::sync::atomic::{AtomicUsize, Ordering};

#[cfg(test)]
use async_trait::async_trait;

#[cfg(test)]
use super::MediaProvider;
#[cfg(test)]
use crate::errors::SearchError;
#[cfg(test)]
use crate::types::{MediaItem, MediaKind, MediaSource, ProviderPage, SearchQuery};

/// Scriptable provider for aggregator tests.
///
/// Counts upstream calls after the media-type gate, so tests can assert that
/// short-circuited searches never reach the fake upstream.
#[cfg(test)]
#[derive(Debug)]
pub struct MockProvider {
    source: MediaSource,
    serves: Option<MediaKind>,
    items: Vec<MediaItem>,
    total: u64,
    failure: Option<SearchError>,
    upstream_calls: Arc<AtomicUsize>,
}

#[cfg(test)]
impl MockProvider {
    /// A provider that always answers with the given items and total.
    pub fn succeeding(source: MediaSource, items: Vec<MediaItem>, total: u64) -> Self {
        Self {
            source,
            serves: None,
            items,
            total,
            failure: None,
            upstream_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A provider that always fails with the given error.
    pub fn failing(source: MediaSource, failure: SearchError) -> Self {
        Self {
            source,
            serves: None,
            items: Vec::new(),
            total: 0,
            failure: Some(failure),
            upstream_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A provider that only serves one media kind and short-circuits the rest.
    pub fn single_type(
        source: MediaSource,
        serves: MediaKind,
        items: Vec<MediaItem>,
        total: u64,
    ) -> Self {
        Self {
            source,
            serves: Some(serves),
            items,
            total,
            failure: None,
            upstream_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Handle onto the upstream call counter, valid after the provider is
    /// boxed into a service.
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.upstream_calls)
    }
}

#[cfg(test)]
#[async_trait]
impl MediaProvider for MockProvider {
    fn source(&self) -> MediaSource {
        self.source
    }

    async fn search(&self, query: &SearchQuery) -> Result<ProviderPage, SearchError> {
        if let Some(kind) = self.serves {
            if !query.media_type.wants(kind) {
                return Ok(ProviderPage::empty());
            }
        }

        self.upstream_calls.fetch_add(1, Ordering::SeqCst);

        match &self.failure {
            Some(failure) => Err(failure.clone()),
            None => Ok(ProviderPage {
                items: self.items.clone(),
                total: self.total,
            }),
        }
    }
}

/// Minimal item fixture for ranking and aggregation tests.
#[cfg(test)]
pub(crate) fn test_item(source: MediaSource, id: &str, title: &str) -> MediaItem {
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
