//! Freesound audio search provider.

use async_trait::async_trait;
use serde::Deserialize;

use medley_core::MedleyConfig;

use super::{MediaProvider, build_client};
use crate::errors::SearchError;
use crate::types::{
    DownloadOption, MediaItem, MediaKind, MediaSource, OrderBy, ProviderPage, SearchQuery,
};

const SOUND_SEARCH_URL: &str = "https://freesound.org/apiv2/search/text/";

/// Fields requested from the search endpoint, the rest of the sound object
/// is never used.
const RESULT_FIELDS: &str =
    "id,name,description,tags,duration,username,url,previews,images,download,filesize,type,samplerate,channels";

/// Longest description carried on an item; Freesound descriptions can run to
/// multiple paragraphs.
const DESCRIPTION_LIMIT: usize = 200;

/// Freesound search provider. Serves audio only and short-circuits for every
/// other media type filter.
#[derive(Debug)]
pub struct FreesoundProvider {
    client: reqwest::Client,
    api_key: Option<String>,
}

/// Response from the Freesound text search endpoint.
#[derive(Debug, Deserialize)]
struct SoundSearchResponse {
    count: u64,
    results: Vec<FreesoundSound>,
}

#[derive(Debug, Deserialize)]
struct FreesoundSound {
    id: u64,
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    duration: f64,
    username: String,
    url: String,
    previews: FreesoundPreviews,
    #[serde(default)]
    images: Option<FreesoundImages>,
}

#[derive(Debug, Deserialize)]
struct FreesoundPreviews {
    #[serde(rename = "preview-hq-mp3")]
    preview_hq_mp3: String,
    #[serde(rename = "preview-hq-ogg")]
    preview_hq_ogg: String,
    #[serde(rename = "preview-lq-mp3")]
    preview_lq_mp3: String,
}

#[derive(Debug, Deserialize)]
struct FreesoundImages {
    #[serde(default)]
    waveform_m: Option<String>,
}

impl FreesoundProvider {
    /// Creates the provider from the shared configuration.
    pub fn new(config: &MedleyConfig) -> Self {
        Self {
            client: build_client(&config.network),
            api_key: config.providers.freesound_api_key.clone(),
        }
    }

    /// Freesound sorts by text score unless popularity or recency is asked for.
    fn sort_param(order_by: Option<OrderBy>) -> &'static str {
        match order_by {
            Some(OrderBy::Popular) => "downloads_desc",
            Some(OrderBy::Latest) => "created_desc",
            _ => "score",
        }
    }

    /// Maps one sound payload into the normalized item shape.
    fn map_sound(sound: FreesoundSound) -> MediaItem {
        let description: String = sound.description.chars().take(DESCRIPTION_LIMIT).collect();
        let thumbnail = sound
            .images
            .and_then(|images| images.waveform_m)
            .unwrap_or_default();

        let downloads = vec![
            DownloadOption {
                label: "HQ MP3".to_string(),
                url: sound.previews.preview_hq_mp3.clone(),
                format: "mp3".to_string(),
                quality: Some("high".to_string()),
                size: None,
                width: None,
                height: None,
            },
            DownloadOption {
                label: "HQ OGG".to_string(),
                url: sound.previews.preview_hq_ogg,
                format: "ogg".to_string(),
                quality: Some("high".to_string()),
                size: None,
                width: None,
                height: None,
            },
            DownloadOption {
                label: "LQ MP3".to_string(),
                url: sound.previews.preview_lq_mp3,
                format: "mp3".to_string(),
                quality: Some("low".to_string()),
                size: None,
                width: None,
                height: None,
            },
        ];

        MediaItem {
            id: format!("freesound-{}", sound.id),
            kind: MediaKind::Audio,
            source: MediaSource::Freesound,
            title: sound.name,
            description: Some(description),
            thumbnail,
            preview: sound.previews.preview_hq_mp3,
            author: sound.username,
            author_url: None,
            source_url: sound.url,
            downloads,
            duration: Some(sound.duration.round() as u64),
            width: None,
            height: None,
            tags: Some(sound.tags),
        }
    }
}

#[async_trait]
impl MediaProvider for FreesoundProvider {
    fn source(&self) -> MediaSource {
        MediaSource::Freesound
    }

    async fn search(&self, query: &SearchQuery) -> Result<ProviderPage, SearchError> {
        if !query.media_type.wants(MediaKind::Audio) {
            return Ok(ProviderPage::empty());
        }

        let key = self
            .api_key
            .as_deref()
            .ok_or(SearchError::MissingCredential {
                provider: MediaSource::Freesound,
            })?;

        let page = query.page.to_string();
        let page_size = query.per_page.to_string();
        let params = [
            ("token", key),
            ("query", query.text.as_str()),
            ("page", page.as_str()),
            ("page_size", page_size.as_str()),
            ("sort", Self::sort_param(query.order_by)),
            ("fields", RESULT_FIELDS),
        ];

        let response = self
            .client
            .get(SOUND_SEARCH_URL)
            .query(&params)
            .send()
            .await
            .map_err(|e| SearchError::Network {
                provider: MediaSource::Freesound,
                reason: format!("sound search request failed: {e}"),
            })?;

        if !response.status().is_success() {
            return Err(SearchError::UpstreamStatus {
                provider: MediaSource::Freesound,
                status: response.status().as_u16(),
            });
        }

        let payload: SoundSearchResponse =
            response.json().await.map_err(|e| SearchError::Parse {
                provider: MediaSource::Freesound,
                reason: format!("sound payload decoding failed: {e}"),
            })?;

        Ok(ProviderPage {
            items: payload.results.into_iter().map(Self::map_sound).collect(),
            total: payload.count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MediaType;
    use serde_json::json;

    fn sound_payload() -> FreesoundSound {
        serde_json::from_value(json!({
            "id": 555,
            "name": "Rain on tent",
            "description": "Recorded during a storm in the Alps.",
            "tags": ["rain", "field-recording"],
            "duration": 93.6,
            "username": "foley",
            "url": "https://freesound.org/people/foley/sounds/555/",
            "previews": {
                "preview-hq-mp3": "https://cdn.freesound.org/555-hq.mp3",
                "preview-hq-ogg": "https://cdn.freesound.org/555-hq.ogg",
                "preview-lq-mp3": "https://cdn.freesound.org/555-lq.mp3"
            },
            "images": {
                "waveform_m": "https://cdn.freesound.org/555-wave.png"
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_map_sound_builds_preview_downloads() {
        let item = FreesoundProvider::map_sound(sound_payload());

        assert_eq!(item.id, "freesound-555");
        assert_eq!(item.kind, MediaKind::Audio);
        assert_eq!(item.title, "Rain on tent");
        assert_eq!(item.author, "foley");
        assert_eq!(item.author_url, None);
        assert_eq!(item.duration, Some(94));
        assert_eq!(item.thumbnail, "https://cdn.freesound.org/555-wave.png");
        assert_eq!(item.preview, "https://cdn.freesound.org/555-hq.mp3");
        assert_eq!(
            item.tags,
            Some(vec!["rain".to_string(), "field-recording".to_string()])
        );

        let labels: Vec<&str> = item
            .downloads
            .iter()
            .map(|option| option.label.as_str())
            .collect();
        assert_eq!(labels, vec!["HQ MP3", "HQ OGG", "LQ MP3"]);
        assert_eq!(item.downloads[1].format, "ogg");
        assert_eq!(item.downloads[2].quality.as_deref(), Some("low"));
    }

    #[test]
    fn test_map_sound_truncates_description() {
        let mut sound = sound_payload();
        sound.description = "x".repeat(500);
        let item = FreesoundProvider::map_sound(sound);
        assert_eq!(item.description.map(|d| d.len()), Some(DESCRIPTION_LIMIT));
    }

    #[test]
    fn test_map_sound_missing_waveform_gives_empty_thumbnail() {
        let mut sound = sound_payload();
        sound.images = None;
        let item = FreesoundProvider::map_sound(sound);
        assert_eq!(item.thumbnail, "");
    }

    #[test]
    fn test_sort_param_mapping() {
        assert_eq!(FreesoundProvider::sort_param(None), "score");
        assert_eq!(
            FreesoundProvider::sort_param(Some(OrderBy::Relevant)),
            "score"
        );
        assert_eq!(
            FreesoundProvider::sort_param(Some(OrderBy::Popular)),
            "downloads_desc"
        );
        assert_eq!(
            FreesoundProvider::sort_param(Some(OrderBy::Latest)),
            "created_desc"
        );
    }

    #[tokio::test]
    async fn test_search_short_circuits_unsupported_type() {
        let provider = FreesoundProvider::new(&MedleyConfig::for_testing());

        let mut query = SearchQuery::new("rain");
        query.media_type = MediaType::Video;

        let page = provider.search(&query).await.unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total, 0);
    }

    #[tokio::test]
    async fn test_search_fails_without_credential() {
        let provider = FreesoundProvider::new(&MedleyConfig::for_testing());

        let mut query = SearchQuery::new("rain");
        query.media_type = MediaType::Audio;

        let err = provider.search(&query).await.unwrap_err();
        assert_eq!(
            err,
            SearchError::MissingCredential {
                provider: MediaSource::Freesound
            }
        );
    }
}
