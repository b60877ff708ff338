//! Pixabay image and video search provider.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

use medley_core::MedleyConfig;

use super::{MediaProvider, build_client};
use crate::errors::SearchError;
use crate::types::{
    DownloadOption, MediaItem, MediaKind, MediaSource, OrderBy, Orientation, ProviderPage,
    SearchQuery,
};

const IMAGE_SEARCH_URL: &str = "https://pixabay.com/api/";
const VIDEO_SEARCH_URL: &str = "https://pixabay.com/api/videos/";

/// Pixabay search provider covering the image and video APIs.
#[derive(Debug)]
pub struct PixabayProvider {
    client: reqwest::Client,
    api_key: Option<String>,
}

/// Response from either Pixabay search endpoint.
#[derive(Debug, Deserialize)]
struct ImageSearchResponse {
    hits: Vec<PixabayImage>,
    #[serde(rename = "totalHits")]
    total_hits: u64,
}

#[derive(Debug, Deserialize)]
struct PixabayImage {
    id: u64,
    #[serde(default)]
    tags: String,
    #[serde(rename = "previewURL")]
    preview_url: String,
    #[serde(rename = "webformatURL")]
    webformat_url: String,
    #[serde(rename = "largeImageURL")]
    large_image_url: String,
    #[serde(rename = "fullHDURL", default)]
    full_hd_url: Option<String>,
    #[serde(rename = "imageWidth")]
    image_width: u32,
    #[serde(rename = "imageHeight")]
    image_height: u32,
    user: String,
    #[serde(rename = "pageURL")]
    page_url: String,
}

#[derive(Debug, Deserialize)]
struct VideoSearchResponse {
    hits: Vec<PixabayVideo>,
    #[serde(rename = "totalHits")]
    total_hits: u64,
}

#[derive(Debug, Deserialize)]
struct PixabayVideo {
    id: u64,
    #[serde(default)]
    tags: String,
    duration: u64,
    videos: PixabayVideoFiles,
    user: String,
    #[serde(rename = "pageURL")]
    page_url: String,
}

#[derive(Debug, Deserialize, Default)]
struct PixabayVideoFiles {
    #[serde(default)]
    large: Option<PixabayVideoRendition>,
    #[serde(default)]
    medium: Option<PixabayVideoRendition>,
    #[serde(default)]
    small: Option<PixabayVideoRendition>,
    #[serde(default)]
    tiny: Option<PixabayVideoRendition>,
}

#[derive(Debug, Deserialize)]
struct PixabayVideoRendition {
    #[serde(default)]
    url: String,
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
    #[serde(default)]
    size: Option<u64>,
}

impl PixabayProvider {
    /// Creates the provider from the shared configuration.
    pub fn new(config: &MedleyConfig) -> Self {
        Self {
            client: build_client(&config.network),
            api_key: config.providers.pixabay_api_key.clone(),
        }
    }

    async fn search_images(
        &self,
        key: &str,
        query: &SearchQuery,
    ) -> Result<ProviderPage, SearchError> {
        let page = query.page.to_string();
        let per_page = query.per_page.to_string();
        let mut params = vec![
            ("key", key),
            ("q", query.text.as_str()),
            ("page", page.as_str()),
            ("per_page", per_page.as_str()),
        ];
        if let Some(orientation) = query.orientation {
            // Pixabay has no square orientation, "all" is the closest match.
            params.push((
                "orientation",
                if orientation == Orientation::Square {
                    "all"
                } else {
                    orientation.as_str()
                },
            ));
        }
        if let Some(color) = query.color.as_deref() {
            params.push(("colors", color));
        }
        if let Some(order_by) = query.order_by {
            params.push(("order", Self::order_param(order_by)));
        }

        let response = self
            .client
            .get(IMAGE_SEARCH_URL)
            .query(&params)
            .send()
            .await
            .map_err(|e| SearchError::Network {
                provider: MediaSource::Pixabay,
                reason: format!("image search request failed: {e}"),
            })?;

        if !response.status().is_success() {
            return Err(SearchError::UpstreamStatus {
                provider: MediaSource::Pixabay,
                status: response.status().as_u16(),
            });
        }

        let payload: ImageSearchResponse =
            response.json().await.map_err(|e| SearchError::Parse {
                provider: MediaSource::Pixabay,
                reason: format!("image payload decoding failed: {e}"),
            })?;

        Ok(ProviderPage {
            items: payload.hits.into_iter().map(Self::map_image).collect(),
            total: payload.total_hits,
        })
    }

    async fn search_videos(
        &self,
        key: &str,
        query: &SearchQuery,
    ) -> Result<ProviderPage, SearchError> {
        let page = query.page.to_string();
        let per_page = query.per_page.to_string();
        let mut params = vec![
            ("key", key),
            ("q", query.text.as_str()),
            ("page", page.as_str()),
            ("per_page", per_page.as_str()),
        ];
        if let Some(order_by) = query.order_by {
            params.push(("order", Self::order_param(order_by)));
        }

        let response = self
            .client
            .get(VIDEO_SEARCH_URL)
            .query(&params)
            .send()
            .await
            .map_err(|e| SearchError::Network {
                provider: MediaSource::Pixabay,
                reason: format!("video search request failed: {e}"),
            })?;

        if !response.status().is_success() {
            return Err(SearchError::UpstreamStatus {
                provider: MediaSource::Pixabay,
                status: response.status().as_u16(),
            });
        }

        let payload: VideoSearchResponse =
            response.json().await.map_err(|e| SearchError::Parse {
                provider: MediaSource::Pixabay,
                reason: format!("video payload decoding failed: {e}"),
            })?;

        Ok(ProviderPage {
            items: payload.hits.into_iter().map(Self::map_video).collect(),
            total: payload.total_hits,
        })
    }

    /// Pixabay only orders by popularity or recency, relevance maps to popular.
    fn order_param(order_by: OrderBy) -> &'static str {
        match order_by {
            OrderBy::Relevant | OrderBy::Popular => "popular",
            OrderBy::Latest => "latest",
        }
    }

    fn first_tag(tags: &str) -> Option<String> {
        tags.split(',')
            .next()
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(str::to_string)
    }

    fn split_tags(tags: &str) -> Vec<String> {
        tags.split(',')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Maps one image hit into the normalized item shape.
    fn map_image(hit: PixabayImage) -> MediaItem {
        let title =
            Self::first_tag(&hit.tags).unwrap_or_else(|| format!("Pixabay Image {}", hit.id));
        let full_hd_url = hit
            .full_hd_url
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| hit.large_image_url.clone());

        let downloads = vec![
            DownloadOption {
                label: "Full HD".to_string(),
                url: full_hd_url,
                format: "jpg".to_string(),
                quality: Some("fullhd".to_string()),
                size: None,
                width: Some(hit.image_width),
                height: Some(hit.image_height),
            },
            DownloadOption {
                label: "Large".to_string(),
                url: hit.large_image_url,
                format: "jpg".to_string(),
                quality: Some("large".to_string()),
                size: None,
                width: None,
                height: None,
            },
            DownloadOption {
                label: "Web".to_string(),
                url: hit.webformat_url.clone(),
                format: "jpg".to_string(),
                quality: Some("web".to_string()),
                size: None,
                width: None,
                height: None,
            },
        ];

        MediaItem {
            id: format!("pixabay-img-{}", hit.id),
            kind: MediaKind::Image,
            source: MediaSource::Pixabay,
            title,
            description: None,
            thumbnail: hit.preview_url,
            preview: hit.webformat_url,
            author: hit.user,
            author_url: None,
            source_url: hit.page_url,
            downloads,
            duration: None,
            width: Some(hit.image_width),
            height: Some(hit.image_height),
            tags: Some(Self::split_tags(&hit.tags)),
        }
    }

    /// Maps one video hit into the normalized item shape.
    fn map_video(hit: PixabayVideo) -> MediaItem {
        let title =
            Self::first_tag(&hit.tags).unwrap_or_else(|| format!("Pixabay Video {}", hit.id));

        let thumbnail = rendition_url(hit.videos.tiny.as_ref())
            .or_else(|| rendition_url(hit.videos.small.as_ref()))
            .unwrap_or_default();
        let preview = rendition_url(hit.videos.small.as_ref())
            .or_else(|| rendition_url(hit.videos.medium.as_ref()))
            .unwrap_or_default();

        let downloads = [
            ("Large", hit.videos.large.as_ref()),
            ("Medium", hit.videos.medium.as_ref()),
            ("Small", hit.videos.small.as_ref()),
        ]
        .into_iter()
        .filter_map(|(label, rendition)| map_rendition(label, rendition))
        .collect();

        MediaItem {
            id: format!("pixabay-vid-{}", hit.id),
            kind: MediaKind::Video,
            source: MediaSource::Pixabay,
            title,
            description: None,
            thumbnail,
            preview,
            author: hit.user,
            author_url: None,
            source_url: hit.page_url,
            downloads,
            duration: Some(hit.duration),
            width: None,
            height: None,
            tags: Some(Self::split_tags(&hit.tags)),
        }
    }
}

fn rendition_url(rendition: Option<&PixabayVideoRendition>) -> Option<String> {
    rendition
        .map(|rendition| rendition.url.clone())
        .filter(|url| !url.is_empty())
}

fn map_rendition(label: &str, rendition: Option<&PixabayVideoRendition>) -> Option<DownloadOption> {
    let rendition = rendition?;
    if rendition.url.is_empty() {
        return None;
    }
    Some(DownloadOption {
        label: label.to_string(),
        url: rendition.url.clone(),
        format: "mp4".to_string(),
        quality: Some(label.to_lowercase()),
        size: rendition.size,
        width: rendition.width,
        height: rendition.height,
    })
}

#[async_trait]
impl MediaProvider for PixabayProvider {
    fn source(&self) -> MediaSource {
        MediaSource::Pixabay
    }

    async fn search(&self, query: &SearchQuery) -> Result<ProviderPage, SearchError> {
        let wants_images = query.media_type.wants(MediaKind::Image);
        let wants_videos = query.media_type.wants(MediaKind::Video);
        if !wants_images && !wants_videos {
            return Ok(ProviderPage::empty());
        }

        let key = self
            .api_key
            .as_deref()
            .ok_or(SearchError::MissingCredential {
                provider: MediaSource::Pixabay,
            })?;

        match (wants_images, wants_videos) {
            (true, false) => self.search_images(key, query).await,
            (false, true) => self.search_videos(key, query).await,
            _ => {
                let (images, videos) = futures::join!(
                    self.search_images(key, query),
                    self.search_videos(key, query)
                );
                Ok(merge_branches(images, videos))
            }
        }
    }
}

/// Folds the image and video branches of an unfiltered search, tolerating
/// individual branch failures.
fn merge_branches(
    images: Result<ProviderPage, SearchError>,
    videos: Result<ProviderPage, SearchError>,
) -> ProviderPage {
    match (images, videos) {
        (Ok(images), Ok(videos)) => images.merge(videos),
        (Ok(images), Err(e)) => {
            warn!("Pixabay video branch failed: {e}");
            images
        }
        (Err(e), Ok(videos)) => {
            warn!("Pixabay image branch failed: {e}");
            videos
        }
        (Err(image_err), Err(video_err)) => {
            warn!("Pixabay image and video branches failed: {image_err}; {video_err}");
            ProviderPage::empty()
        }
    }
}
