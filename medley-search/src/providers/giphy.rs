//! Giphy GIF search provider.

use async_trait::async_trait;
use serde::Deserialize;

use medley_core::MedleyConfig;

use super::{MediaProvider, build_client};
use crate::errors::SearchError;
use crate::types::{
    DownloadOption, MediaItem, MediaKind, MediaSource, ProviderPage, SearchQuery,
};

const GIF_SEARCH_URL: &str = "https://api.giphy.com/v1/gifs/search";

/// Giphy search provider. Serves GIFs only and short-circuits for every
/// other media type filter.
#[derive(Debug)]
pub struct GiphyProvider {
    client: reqwest::Client,
    api_key: Option<String>,
}

/// Response from the Giphy search endpoint.
#[derive(Debug, Deserialize)]
struct GifSearchResponse {
    data: Vec<GiphyGif>,
    pagination: GiphyPagination,
}

#[derive(Debug, Deserialize)]
struct GiphyPagination {
    total_count: u64,
}

#[derive(Debug, Deserialize)]
struct GiphyGif {
    id: String,
    #[serde(default)]
    title: String,
    url: String,
    #[serde(default)]
    username: String,
    #[serde(default)]
    user: Option<GiphyUser>,
    images: GiphyImages,
}

#[derive(Debug, Deserialize)]
struct GiphyUser {
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    profile_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct GiphyImages {
    #[serde(default)]
    original: GiphyRendition,
    #[serde(default)]
    downsized_medium: GiphyRendition,
    #[serde(default)]
    downsized_small: GiphyRendition,
    #[serde(default)]
    preview_gif: GiphyRendition,
    #[serde(default)]
    fixed_height_small: GiphyRendition,
    #[serde(default)]
    fixed_height: GiphyRendition,
}

/// One Giphy rendition. Dimensions and sizes arrive as decimal strings.
#[derive(Debug, Default, Deserialize)]
struct GiphyRendition {
    #[serde(default)]
    url: String,
    #[serde(default)]
    mp4: Option<String>,
    #[serde(default)]
    width: String,
    #[serde(default)]
    height: String,
    #[serde(default)]
    size: String,
}

impl GiphyProvider {
    /// Creates the provider from the shared configuration.
    pub fn new(config: &MedleyConfig) -> Self {
        Self {
            client: build_client(&config.network),
            api_key: config.providers.giphy_api_key.clone(),
        }
    }

    fn parse_dimension(raw: &str) -> Option<u32> {
        raw.parse().ok()
    }

    fn parse_size(raw: &str) -> Option<u64> {
        raw.parse().ok()
    }

    /// Maps one gif payload into the normalized item shape.
    fn map_gif(gif: GiphyGif) -> MediaItem {
        let title = if gif.title.is_empty() {
            format!("GIF {}", gif.id)
        } else {
            gif.title.clone()
        };

        let author = gif
            .user
            .as_ref()
            .map(|user| user.display_name.clone())
            .filter(|name| !name.is_empty())
            .or_else(|| (!gif.username.is_empty()).then(|| gif.username.clone()))
            .unwrap_or_else(|| "Unknown".to_string());
        let author_url = gif.user.as_ref().and_then(|user| user.profile_url.clone());

        let mut downloads = vec![
            DownloadOption {
                label: "Original".to_string(),
                url: gif.images.original.url.clone(),
                format: "gif".to_string(),
                quality: Some("original".to_string()),
                size: Self::parse_size(&gif.images.original.size),
                width: Self::parse_dimension(&gif.images.original.width),
                height: Self::parse_dimension(&gif.images.original.height),
            },
            DownloadOption {
                label: "Medium".to_string(),
                url: gif.images.downsized_medium.url.clone(),
                format: "gif".to_string(),
                quality: Some("medium".to_string()),
                size: None,
                width: Self::parse_dimension(&gif.images.downsized_medium.width),
                height: Self::parse_dimension(&gif.images.downsized_medium.height),
            },
            DownloadOption {
                label: "Small".to_string(),
                url: gif.images.downsized_small.url.clone(),
                format: "gif".to_string(),
                quality: Some("small".to_string()),
                size: None,
                width: None,
                height: None,
            },
        ];
        if let Some(mp4) = gif
            .images
            .original
            .mp4
            .as_deref()
            .filter(|url| !url.is_empty())
        {
            downloads.push(DownloadOption {
                label: "MP4".to_string(),
                url: mp4.to_string(),
                format: "mp4".to_string(),
                quality: Some("original".to_string()),
                size: None,
                width: None,
                height: None,
            });
        }

        let thumbnail = if gif.images.preview_gif.url.is_empty() {
            gif.images.fixed_height_small.url.clone()
        } else {
            gif.images.preview_gif.url.clone()
        };

        MediaItem {
            id: format!("giphy-{}", gif.id),
            kind: MediaKind::Gif,
            source: MediaSource::Giphy,
            title,
            description: None,
            thumbnail,
            preview: gif.images.fixed_height.url.clone(),
            author,
            author_url,
            source_url: gif.url,
            downloads,
            duration: None,
            width: Self::parse_dimension(&gif.images.original.width),
            height: Self::parse_dimension(&gif.images.original.height),
            tags: None,
        }
    }
}

#[async_trait]
impl MediaProvider for GiphyProvider {
    fn source(&self) -> MediaSource {
        MediaSource::Giphy
    }

    async fn search(&self, query: &SearchQuery) -> Result<ProviderPage, SearchError> {
        if !query.media_type.wants(MediaKind::Gif) {
            return Ok(ProviderPage::empty());
        }

        let key = self
            .api_key
            .as_deref()
            .ok_or(SearchError::MissingCredential {
                provider: MediaSource::Giphy,
            })?;

        let limit = query.per_page.to_string();
        let offset = (query.page.saturating_sub(1) * query.per_page).to_string();
        let params = [
            ("api_key", key),
            ("q", query.text.as_str()),
            ("limit", limit.as_str()),
            ("offset", offset.as_str()),
            ("rating", "g"),
            ("lang", "en"),
        ];

        let response = self
            .client
            .get(GIF_SEARCH_URL)
            .query(&params)
            .send()
            .await
            .map_err(|e| SearchError::Network {
                provider: MediaSource::Giphy,
                reason: format!("gif search request failed: {e}"),
            })?;

        if !response.status().is_success() {
            return Err(SearchError::UpstreamStatus {
                provider: MediaSource::Giphy,
                status: response.status().as_u16(),
            });
        }

        let payload: GifSearchResponse =
            response.json().await.map_err(|e| SearchError::Parse {
                provider: MediaSource::Giphy,
                reason: format!("gif payload decoding failed: {e}"),
            })?;

        Ok(ProviderPage {
            items: payload.data.into_iter().map(Self::map_gif).collect(),
            total: payload.pagination.total_count,
        })
    }
}
