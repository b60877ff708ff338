//! Pexels photo and video search provider.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

use medley_core::MedleyConfig;

use super::{MediaProvider, build_client};
use crate::errors::SearchError;
use crate::types::{
    DownloadOption, MediaItem, MediaKind, MediaSource, ProviderPage, SearchQuery,
};

const PHOTO_SEARCH_URL: &str = "https://api.pexels.com/v1/search";
const VIDEO_SEARCH_URL: &str = "https://api.pexels.com/videos/search";

/// Pexels search provider covering both the photo and the video API.
///
/// An unfiltered search queries the two endpoints concurrently and merges
/// whichever branches succeed.
#[derive(Debug)]
pub struct PexelsProvider {
    client: reqwest::Client,
    api_key: Option<String>,
}

/// Response from the Pexels photo search endpoint.
#[derive(Debug, Deserialize)]
struct PhotoSearchResponse {
    photos: Vec<PexelsPhoto>,
    total_results: u64,
}

#[derive(Debug, Deserialize)]
struct PexelsPhoto {
    id: u64,
    #[serde(default)]
    alt: Option<String>,
    url: String,
    photographer: String,
    #[serde(default)]
    photographer_url: Option<String>,
    width: u32,
    height: u32,
    src: PexelsPhotoSrc,
}

#[derive(Debug, Deserialize)]
struct PexelsPhotoSrc {
    original: String,
    large2x: String,
    medium: String,
    small: String,
    tiny: String,
}

/// Response from the Pexels video search endpoint.
#[derive(Debug, Deserialize)]
struct VideoSearchResponse {
    videos: Vec<PexelsVideo>,
    total_results: u64,
}

#[derive(Debug, Deserialize)]
struct PexelsVideo {
    id: u64,
    url: String,
    duration: u64,
    user: PexelsVideoUser,
    video_files: Vec<PexelsVideoFile>,
    #[serde(default)]
    video_pictures: Vec<PexelsVideoPicture>,
}

#[derive(Debug, Deserialize)]
struct PexelsVideoUser {
    name: String,
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PexelsVideoFile {
    link: String,
    #[serde(default)]
    quality: Option<String>,
    #[serde(default)]
    file_type: Option<String>,
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
    #[serde(default)]
    size: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct PexelsVideoPicture {
    picture: String,
}

impl PexelsProvider {
    /// Creates the provider from the shared configuration.
    pub fn new(config: &MedleyConfig) -> Self {
        Self {
            client: build_client(&config.network),
            api_key: config.providers.pexels_api_key.clone(),
        }
    }

    async fn search_photos(
        &self,
        key: &str,
        query: &SearchQuery,
    ) -> Result<ProviderPage, SearchError> {
        let page = query.page.to_string();
        let per_page = query.per_page.to_string();
        let mut params = vec![
            ("query", query.text.as_str()),
            ("page", page.as_str()),
            ("per_page", per_page.as_str()),
        ];
        if let Some(orientation) = query.orientation {
            params.push(("orientation", orientation.as_str()));
        }
        if let Some(color) = query.color.as_deref() {
            params.push(("color", color));
        }

        let response = self
            .client
            .get(PHOTO_SEARCH_URL)
            .header("Authorization", key)
            .query(&params)
            .send()
            .await
            .map_err(|e| SearchError::Network {
                provider: MediaSource::Pexels,
                reason: format!("photo search request failed: {e}"),
            })?;

        if !response.status().is_success() {
            return Err(SearchError::UpstreamStatus {
                provider: MediaSource::Pexels,
                status: response.status().as_u16(),
            });
        }

        let payload: PhotoSearchResponse =
            response.json().await.map_err(|e| SearchError::Parse {
                provider: MediaSource::Pexels,
                reason: format!("photo payload decoding failed: {e}"),
            })?;

        Ok(ProviderPage {
            items: payload.photos.into_iter().map(Self::map_photo).collect(),
            total: payload.total_results,
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
            ("query", query.text.as_str()),
            ("page", page.as_str()),
            ("per_page", per_page.as_str()),
        ];
        if let Some(orientation) = query.orientation {
            params.push(("orientation", orientation.as_str()));
        }

        let response = self
            .client
            .get(VIDEO_SEARCH_URL)
            .header("Authorization", key)
            .query(&params)
            .send()
            .await
            .map_err(|e| SearchError::Network {
                provider: MediaSource::Pexels,
                reason: format!("video search request failed: {e}"),
            })?;

        if !response.status().is_success() {
            return Err(SearchError::UpstreamStatus {
                provider: MediaSource::Pexels,
                status: response.status().as_u16(),
            });
        }

        let payload: VideoSearchResponse =
            response.json().await.map_err(|e| SearchError::Parse {
                provider: MediaSource::Pexels,
                reason: format!("video payload decoding failed: {e}"),
            })?;

        Ok(ProviderPage {
            items: payload.videos.into_iter().map(Self::map_video).collect(),
            total: payload.total_results,
        })
    }

    /// Maps one photo payload into the normalized item shape.
    fn map_photo(photo: PexelsPhoto) -> MediaItem {
        let title = photo
            .alt
            .as_deref()
            .filter(|alt| !alt.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("Pexels Photo {}", photo.id));

        let downloads = vec![
            DownloadOption {
                label: "Original".to_string(),
                url: photo.src.original,
                format: "jpg".to_string(),
                quality: Some("original".to_string()),
                size: None,
                width: Some(photo.width),
                height: Some(photo.height),
            },
            DownloadOption {
                label: "Large".to_string(),
                url: photo.src.large2x,
                format: "jpg".to_string(),
                quality: Some("large".to_string()),
                size: None,
                width: None,
                height: None,
            },
            DownloadOption {
                label: "Medium".to_string(),
                url: photo.src.medium.clone(),
                format: "jpg".to_string(),
                quality: Some("medium".to_string()),
                size: None,
                width: None,
                height: None,
            },
            DownloadOption {
                label: "Small".to_string(),
                url: photo.src.small,
                format: "jpg".to_string(),
                quality: Some("small".to_string()),
                size: None,
                width: None,
                height: None,
            },
        ];

        MediaItem {
            id: format!("pexels-photo-{}", photo.id),
            kind: MediaKind::Image,
            source: MediaSource::Pexels,
            title,
            description: None,
            thumbnail: photo.src.tiny,
            preview: photo.src.medium,
            author: photo.photographer,
            author_url: photo.photographer_url,
            source_url: photo.url,
            downloads,
            duration: None,
            width: Some(photo.width),
            height: Some(photo.height),
            tags: None,
        }
    }

    /// Maps one video payload into the normalized item shape.
    fn map_video(video: PexelsVideo) -> MediaItem {
        // Preview prefers the sd rendition in upstream order, before sorting.
        let preview = video
            .video_files
            .iter()
            .find(|file| file.quality.as_deref() == Some("sd"))
            .or_else(|| video.video_files.first())
            .map(|file| file.link.clone())
            .unwrap_or_default();

        let thumbnail = video
            .video_pictures
            .first()
            .map(|picture| picture.picture.clone())
            .unwrap_or_default();

        let mut files = video.video_files;
        files.sort_by(|a, b| b.width.unwrap_or(0).cmp(&a.width.unwrap_or(0)));

        let downloads = files
            .into_iter()
            .map(|file| {
                let format = file
                    .file_type
                    .as_deref()
                    .and_then(|file_type| file_type.split('/').nth(1))
                    .unwrap_or("mp4")
                    .to_string();
                DownloadOption {
                    label: format!(
                        "{} ({}x{})",
                        file.quality.as_deref().unwrap_or(""),
                        file.width.unwrap_or(0),
                        file.height.unwrap_or(0)
                    ),
                    url: file.link,
                    format,
                    quality: file.quality,
                    size: file.size,
                    width: file.width,
                    height: file.height,
                }
            })
            .collect();

        MediaItem {
            id: format!("pexels-video-{}", video.id),
            kind: MediaKind::Video,
            source: MediaSource::Pexels,
            title: format!("Pexels Video {}", video.id),
            description: None,
            thumbnail,
            preview,
            author: video.user.name,
            author_url: video.user.url,
            source_url: video.url,
            downloads,
            duration: Some(video.duration),
            width: None,
            height: None,
            tags: None,
        }
    }

    /// Folds the photo and video branches of an unfiltered search.
    ///
    /// A failed branch contributes nothing; both failing still yields an
    /// empty page rather than an error.
    fn merge_branches(
        photos: Result<ProviderPage, SearchError>,
        videos: Result<ProviderPage, SearchError>,
    ) -> ProviderPage {
        match (photos, videos) {
            (Ok(photos), Ok(videos)) => photos.merge(videos),
            (Ok(photos), Err(e)) => {
                warn!("Pexels video branch failed: {e}");
                photos
            }
            (Err(e), Ok(videos)) => {
                warn!("Pexels photo branch failed: {e}");
                videos
            }
            (Err(photo_err), Err(video_err)) => {
                warn!("Pexels photo and video branches failed: {photo_err}; {video_err}");
                ProviderPage::empty()
            }
        }
    }
}

#[async_trait]
impl MediaProvider for PexelsProvider {
    fn source(&self) -> MediaSource {
        MediaSource::Pexels
    }

    async fn search(&self, query: &SearchQuery) -> Result<ProviderPage, SearchError> {
        let wants_photos = query.media_type.wants(MediaKind::Image);
        let wants_videos = query.media_type.wants(MediaKind::Video);
        if !wants_photos && !wants_videos {
            return Ok(ProviderPage::empty());
        }

        let key = self
            .api_key
            .as_deref()
            .ok_or(SearchError::MissingCredential {
                provider: MediaSource::Pexels,
            })?;

        match (wants_photos, wants_videos) {
            (true, false) => self.search_photos(key, query).await,
            (false, true) => self.search_videos(key, query).await,
            _ => {
                let (photos, videos) = futures::join!(
                    self.search_photos(key, query),
                    self.search_videos(key, query)
                );
                Ok(Self::merge_branches(photos, videos))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MediaType;
    use serde_json::json;

    fn photo_payload() -> PexelsPhoto {
        serde_json::from_value(json!({
            "id": 42,
            "alt": "Sunset over water",
            "url": "https://www.pexels.com/photo/42/",
            "photographer": "Ana",
            "photographer_url": "https://www.pexels.com/@ana",
            "width": 4000,
            "height": 3000,
            "src": {
                "original": "https://images.pexels.com/42/original.jpg",
                "large2x": "https://images.pexels.com/42/large2x.jpg",
                "medium": "https://images.pexels.com/42/medium.jpg",
                "small": "https://images.pexels.com/42/small.jpg",
                "tiny": "https://images.pexels.com/42/tiny.jpg"
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_map_photo_builds_four_renditions() {
        let item = PexelsProvider::map_photo(photo_payload());

        assert_eq!(item.id, "pexels-photo-42");
        assert_eq!(item.kind, MediaKind::Image);
        assert_eq!(item.title, "Sunset over water");
        assert_eq!(item.thumbnail, "https://images.pexels.com/42/tiny.jpg");
        assert_eq!(item.preview, "https://images.pexels.com/42/medium.jpg");
        assert_eq!(item.width, Some(4000));

        let labels: Vec<&str> = item
            .downloads
            .iter()
            .map(|option| option.label.as_str())
            .collect();
        assert_eq!(labels, vec!["Original", "Large", "Medium", "Small"]);
        assert_eq!(item.downloads[0].width, Some(4000));
        assert_eq!(item.downloads[1].width, None);
    }

    #[test]
    fn test_map_photo_generates_title_when_alt_empty() {
        let mut photo = photo_payload();
        photo.alt = Some(String::new());
        let item = PexelsProvider::map_photo(photo);
        assert_eq!(item.title, "Pexels Photo 42");
    }

    fn video_payload() -> PexelsVideo {
        serde_json::from_value(json!({
            "id": 7,
            "url": "https://www.pexels.com/video/7/",
            "duration": 14,
            "user": { "name": "Ben", "url": "https://www.pexels.com/@ben" },
            "video_files": [
                {
                    "link": "https://videos.pexels.com/7/sd.mp4",
                    "quality": "sd",
                    "file_type": "video/mp4",
                    "width": 640,
                    "height": 360,
                    "size": 1_000_000
                },
                {
                    "link": "https://videos.pexels.com/7/hd.mp4",
                    "quality": "hd",
                    "file_type": "video/mp4",
                    "width": 1920,
                    "height": 1080,
                    "size": 9_000_000
                }
            ],
            "video_pictures": [
                { "picture": "https://images.pexels.com/7/frame.jpg" }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_map_video_sorts_widest_first_and_prefers_sd_preview() {
        let item = PexelsProvider::map_video(video_payload());

        assert_eq!(item.id, "pexels-video-7");
        assert_eq!(item.title, "Pexels Video 7");
        assert_eq!(item.duration, Some(14));
        assert_eq!(item.thumbnail, "https://images.pexels.com/7/frame.jpg");
        assert_eq!(item.preview, "https://videos.pexels.com/7/sd.mp4");

        assert_eq!(item.downloads[0].label, "hd (1920x1080)");
        assert_eq!(item.downloads[0].format, "mp4");
        assert_eq!(item.downloads[0].size, Some(9_000_000));
        assert_eq!(item.downloads[1].label, "sd (640x360)");
    }

    #[test]
    fn test_map_video_defaults_format_without_file_type() {
        let mut video = video_payload();
        video.video_files[0].file_type = None;
        let item = PexelsProvider::map_video(video);
        assert_eq!(item.downloads[1].format, "mp4");
    }

    #[tokio::test]
    async fn test_search_short_circuits_unsupported_type() {
        let provider = PexelsProvider::new(&MedleyConfig::for_testing());

        let mut query = SearchQuery::new("drum loop");
        query.media_type = MediaType::Audio;

        let page = provider.search(&query).await.unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total, 0);
    }

    #[tokio::test]
    async fn test_search_fails_without_credential() {
        let provider = PexelsProvider::new(&MedleyConfig::for_testing());

        let mut query = SearchQuery::new("sunset");
        query.media_type = MediaType::Image;

        let err = provider.search(&query).await.unwrap_err();
        assert_eq!(
            err,
            SearchError::MissingCredential {
                provider: MediaSource::Pexels
            }
        );
    }
}
