//! Semantic re-ranking of aggregated search results.
//!
//! Scores every item against the query with cosine similarity over sentence
//! embeddings. Ranking is strictly best-effort: any embedding failure or an
//! elapsed deadline leaves the incoming order untouched.

use std::cmp::Ordering;
use std::time::Duration;

use futures::future;
use tracing::warn;

use crate::embedding::{TextEmbedder, cosine_similarity};
use crate::errors::SearchError;
use crate::types::MediaItem;

/// Reorders `items` by semantic similarity to `query_text`.
///
/// Items with equal scores keep their relative input order. When embedding
/// fails or `deadline` elapses the input order is returned unchanged.
pub async fn rerank(
    embedder: &dyn TextEmbedder,
    query_text: &str,
    items: Vec<MediaItem>,
    deadline: Duration,
) -> Vec<MediaItem> {
    if items.is_empty() {
        return items;
    }

    match tokio::time::timeout(deadline, ranked_order(embedder, query_text, &items)).await {
        Ok(Ok(order)) => apply_order(items, order),
        Ok(Err(e)) => {
            warn!("Re-ranking failed, returning original order: {e}");
            items
        }
        Err(_) => {
            warn!(
                seconds = deadline.as_secs(),
                "Re-ranking timed out, returning original order"
            );
            items
        }
    }
}

/// Computes the similarity-ranked permutation of `items`.
///
/// The query is embedded first so an unavailable model fails fast before any
/// per-item work starts.
async fn ranked_order(
    embedder: &dyn TextEmbedder,
    query_text: &str,
    items: &[MediaItem],
) -> Result<Vec<usize>, SearchError> {
    let query_embedding = embedder.embed(query_text).await?;

    let item_embeddings = future::try_join_all(items.iter().map(|item| {
        let text = item.embedding_text();
        async move { embedder.embed(&text).await }
    }))
    .await?;

    let scores: Vec<f32> = item_embeddings
        .iter()
        .map(|embedding| cosine_similarity(&query_embedding, embedding))
        .collect();

    let mut order: Vec<usize> = (0..items.len()).collect();
    // Stable sort keeps the interleaved order for tied scores.
    order.sort_by(|&a, &b| scores[b].partial_cmp(&scores[a]).unwrap_or(Ordering::Equal));
    Ok(order)
}

fn apply_order(items: Vec<MediaItem>, order: Vec<usize>) -> Vec<MediaItem> {
    let mut slots: Vec<Option<MediaItem>> = items.into_iter().map(Some).collect();
    order
        .into_iter()
        .filter_map(|index| slots.get_mut(index).and_then(Option::take))
        .collect()
}
