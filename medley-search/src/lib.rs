//! Medley Search - Multi-provider media search and ranking

#![deny(missing_docs)]
#![deny(clippy::missing_errors_doc)]
#![deny(clippy::missing_panics_doc)]
#![warn(clippy::too_many_lines)]
//!
//! Queries Pexels, Pixabay, Giphy, and Freesound concurrently, normalizes
//! their payloads into a single item shape, and re-ranks the merged results
//! by semantic similarity to the query.

pub mod embedding;
pub mod errors;
pub mod providers;
pub mod rerank;
pub mod service;
pub mod types;

// Re-export main types
pub use embedding::{FastEmbedder, TextEmbedder, cosine_similarity};
pub use errors::SearchError;
pub use providers::{MediaProvider, default_providers};
pub use rerank::rerank;
pub use service::MediaSearchService;
pub use types::{
    DEFAULT_PER_PAGE, DownloadOption, MAX_PER_PAGE, MediaItem, MediaKind, MediaSource, MediaType,
    OrderBy, Orientation, ProviderPage, SearchQuery, SearchResponse, SourceOutcome, SourceSummary,
};

/// Convenience type alias for Results with SearchError.
pub type Result<T> = std::result::Result<T, SearchError>;
