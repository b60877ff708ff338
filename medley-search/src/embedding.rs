//! Sentence embedding support for semantic result ranking.
//!
//! Wraps fastembed's all-MiniLM-L6-v2 model behind an async trait so ranking
//! logic can be exercised in tests without downloading model weights.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use tracing::info;

use crate::errors::SearchError;

/// Produces dense vector representations of short texts.
#[async_trait]
pub trait TextEmbedder: Send + Sync + fmt::Debug {
    /// Embeds a single text into a dense vector.
    ///
    /// # Errors
    /// - `SearchError::Embedding` - Model loading or inference failed
    async fn embed(&self, text: &str) -> Result<Vec<f32>, SearchError>;
}

/// [`TextEmbedder`] backed by a local fastembed model.
///
/// The model is loaded on first use and kept behind a mutex because
/// fastembed's `embed()` requires `&mut self`. Concurrent callers that race
/// the first embed serialize on the lock, so the model is only loaded once.
#[derive(Clone)]
pub struct FastEmbedder {
    model: Arc<Mutex<Option<TextEmbedding>>>,
    cache_dir: PathBuf,
}

impl FastEmbedder {
    /// Creates an embedder that caches model weights under `cache_dir`.
    ///
    /// No model files are touched until the first [`TextEmbedder::embed`] call.
    pub fn new(cache_dir: PathBuf) -> Self {
        Self {
            model: Arc::new(Mutex::new(None)),
            cache_dir,
        }
    }
}

impl fmt::Debug for FastEmbedder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FastEmbedder")
            .field("cache_dir", &self.cache_dir)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl TextEmbedder for FastEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, SearchError> {
        let model = Arc::clone(&self.model);
        let cache_dir = self.cache_dir.clone();
        let text = text.to_string();

        tokio::task::spawn_blocking(move || embed_blocking(&model, &cache_dir, &text))
            .await
            .map_err(|e| SearchError::Embedding {
                reason: format!("embedding task failed: {e}"),
            })?
    }
}

fn embed_blocking(
    model: &Mutex<Option<TextEmbedding>>,
    cache_dir: &Path,
    text: &str,
) -> Result<Vec<f32>, SearchError> {
    let mut guard = model.lock().map_err(|_| SearchError::Embedding {
        reason: "embedding model lock poisoned".to_string(),
    })?;

    let model = match guard.as_mut() {
        Some(model) => model,
        None => {
            info!(cache_dir = %cache_dir.display(), "Loading all-MiniLM-L6-v2 embedding model");
            std::fs::create_dir_all(cache_dir).map_err(|e| SearchError::Embedding {
                reason: format!("failed to create model cache directory: {e}"),
            })?;

            let options = InitOptions::new(EmbeddingModel::AllMiniLML6V2)
                .with_cache_dir(cache_dir.to_path_buf())
                .with_show_download_progress(true);
            let loaded = TextEmbedding::try_new(options).map_err(|e| SearchError::Embedding {
                reason: format!("model initialization failed: {e}"),
            })?;
            guard.insert(loaded)
        }
    };

    let embeddings = model
        .embed(vec![text], None)
        .map_err(|e| SearchError::Embedding {
            reason: format!("inference failed: {e}"),
        })?;

    embeddings
        .into_iter()
        .next()
        .ok_or_else(|| SearchError::Embedding {
            reason: "model returned no embedding".to_string(),
        })
}

/// Cosine similarity between two vectors.
///
/// Returns 0.0 when the vectors differ in length or either has zero norm, so
/// malformed embeddings rank last instead of poisoning the sort with NaN.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}
