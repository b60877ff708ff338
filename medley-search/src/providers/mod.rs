//! Provider implementations for stock media search.

use async_trait::async_trait;

use medley_core::MedleyConfig;
use medley_core::config::NetworkConfig;

use crate::errors::SearchError;
use crate::types::{MediaSource, ProviderPage, SearchQuery};

pub mod freesound;
pub mod giphy;
pub mod mock;
pub mod pexels;
pub mod pixabay;

pub use freesound::FreesoundProvider;
pub use giphy::GiphyProvider;
#[cfg(test)]
pub use mock::MockProvider;
pub use pexels::PexelsProvider;
pub use pixabay::PixabayProvider;

/// Trait for stock media search providers.
///
/// Implementations translate a normalized query into one upstream API call
/// (or several, for providers that split media types across endpoints) and
/// map the response into [`ProviderPage`] items.
#[async_trait]
pub trait MediaProvider: Send + Sync + std::fmt::Debug {
    /// Which source this provider queries.
    fn source(&self) -> MediaSource;

    /// Searches the provider, returning one page of normalized results.
    ///
    /// A provider that cannot serve the requested media type returns an empty
    /// page without contacting its upstream API.
    ///
    /// # Errors
    /// - `SearchError::MissingCredential` - Required API key is absent
    /// - `SearchError::Network` - Request could not be completed
    /// - `SearchError::UpstreamStatus` - Provider returned a non-success status
    /// - `SearchError::Parse` - Response body could not be decoded
    async fn search(&self, query: &SearchQuery) -> Result<ProviderPage, SearchError>;
}

/// Builds the full provider registry in query and reporting order.
///
/// Every provider is always registered, including those without credentials.
/// A provider with a missing key fails at query time, so its status stays
/// visible in search responses instead of silently vanishing.
pub fn default_providers(config: &MedleyConfig) -> Vec<Box<dyn MediaProvider>> {
    vec![
        Box::new(PexelsProvider::new(config)),
        Box::new(PixabayProvider::new(config)),
        Box::new(GiphyProvider::new(config)),
        Box::new(FreesoundProvider::new(config)),
    ]
}

/// HTTP client shared by one provider, with the configured timeout applied.
pub(crate) fn build_client(network: &NetworkConfig) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(network.provider_timeout)
        .user_agent(network.user_agent)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}
