//! Request and result types shared across providers, ranking, and the HTTP layer.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Default number of results requested per source when the caller does not specify one.
pub const DEFAULT_PER_PAGE: u32 = 20;

/// Upper bound on the per-source page size accepted from callers.
pub const MAX_PER_PAGE: u32 = 50;

/// Upstream services that can contribute results to a search.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MediaSource {
    /// Pexels photo and video search.
    Pexels,
    /// Pixabay image and video search.
    Pixabay,
    /// Giphy GIF search.
    Giphy,
    /// Freesound audio search.
    Freesound,
}

impl MediaSource {
    /// Human-readable provider name used in logs and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            MediaSource::Pexels => "Pexels",
            MediaSource::Pixabay => "Pixabay",
            MediaSource::Giphy => "Giphy",
            MediaSource::Freesound => "Freesound",
        }
    }

    /// All sources in the order they are queried and reported.
    pub const fn all() -> [MediaSource; 4] {
        [
            MediaSource::Pexels,
            MediaSource::Pixabay,
            MediaSource::Giphy,
            MediaSource::Freesound,
        ]
    }
}

impl fmt::Display for MediaSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Classification of an individual result item.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Still image.
    Image,
    /// Video clip.
    Video,
    /// Audio sample or recording.
    Audio,
    /// Animated GIF.
    Gif,
}

impl MediaKind {
    /// Lowercase name as it appears on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
            MediaKind::Gif => "gif",
        }
    }
}

/// Media type filter requested by the caller.
///
/// Unlike [`MediaKind`] this includes `All`, which matches every kind and is
/// the fallback for unrecognized filter values.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    /// No filtering, every provider participates.
    All,
    /// Still images only.
    Image,
    /// Video clips only.
    Video,
    /// Audio only.
    Audio,
    /// Animated GIFs only.
    Gif,
}

impl MediaType {
    /// Parses a raw query parameter, falling back to `All` for unknown values.
    pub fn parse_param(raw: &str) -> MediaType {
        match raw {
            "image" => MediaType::Image,
            "video" => MediaType::Video,
            "audio" => MediaType::Audio,
            "gif" => MediaType::Gif,
            _ => MediaType::All,
        }
    }

    /// Whether results of the given kind satisfy this filter.
    pub fn wants(&self, kind: MediaKind) -> bool {
        match self {
            MediaType::All => true,
            MediaType::Image => kind == MediaKind::Image,
            MediaType::Video => kind == MediaKind::Video,
            MediaType::Audio => kind == MediaKind::Audio,
            MediaType::Gif => kind == MediaKind::Gif,
        }
    }

    /// Lowercase name as it appears in query parameters.
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::All => "all",
            MediaType::Image => "image",
            MediaType::Video => "video",
            MediaType::Audio => "audio",
            MediaType::Gif => "gif",
        }
    }
}

/// Requested result orientation for image and video searches.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Wider than tall.
    Landscape,
    /// Taller than wide.
    Portrait,
    /// Equal width and height.
    Square,
}

impl Orientation {
    /// Parses a raw query parameter, returning `None` for unknown values.
    pub fn parse_param(raw: &str) -> Option<Orientation> {
        match raw {
            "landscape" => Some(Orientation::Landscape),
            "portrait" => Some(Orientation::Portrait),
            "square" => Some(Orientation::Square),
            _ => None,
        }
    }

    /// Lowercase name as it appears in query parameters.
    pub fn as_str(&self) -> &'static str {
        match self {
            Orientation::Landscape => "landscape",
            Orientation::Portrait => "portrait",
            Orientation::Square => "square",
        }
    }
}

/// Requested result ordering.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OrderBy {
    /// Best match for the query.
    Relevant,
    /// Most popular first.
    Popular,
    /// Newest first.
    Latest,
}

impl OrderBy {
    /// Parses a raw query parameter, returning `None` for unknown values.
    pub fn parse_param(raw: &str) -> Option<OrderBy> {
        match raw {
            "relevant" => Some(OrderBy::Relevant),
            "popular" => Some(OrderBy::Popular),
            "latest" => Some(OrderBy::Latest),
            _ => None,
        }
    }

    /// Lowercase name as it appears in query parameters.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderBy::Relevant => "relevant",
            OrderBy::Popular => "popular",
            OrderBy::Latest => "latest",
        }
    }
}

/// Normalized search request passed to every provider.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    /// Search text, already trimmed.
    pub text: String,
    /// Media type filter.
    pub media_type: MediaType,
    /// 1-based page number.
    pub page: u32,
    /// Requested results per source.
    pub per_page: u32,
    /// Orientation filter, when the caller supplied a recognized value.
    pub orientation: Option<Orientation>,
    /// Dominant color filter, passed through to providers that support it.
    pub color: Option<String>,
    /// Result ordering, when the caller supplied a recognized value.
    pub order_by: Option<OrderBy>,
}

impl SearchQuery {
    /// Creates a query for the given text with default paging and no filters.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            media_type: MediaType::All,
            page: 1,
            per_page: DEFAULT_PER_PAGE,
            orientation: None,
            color: None,
            order_by: None,
        }
    }
}

/// One downloadable rendition of a media item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DownloadOption {
    /// Display label, e.g. "Original" or "hd (1920x1080)".
    pub label: String,
    /// Direct URL of this rendition.
    pub url: String,
    /// File format such as "jpg" or "mp4".
    pub format: String,
    /// Provider-specific quality tier, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,
    /// File size in bytes, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Width in pixels, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    /// Height in pixels, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

/// A single normalized search result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    /// Globally unique id, prefixed with the source (e.g. "pexels-photo-42").
    pub id: String,
    /// What kind of media this is.
    #[serde(rename = "type")]
    pub kind: MediaKind,
    /// Which provider produced it.
    pub source: MediaSource,
    /// Display title.
    pub title: String,
    /// Longer description, when the provider supplies one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Small preview image URL.
    pub thumbnail: String,
    /// Medium-quality preview URL suitable for inline display.
    pub preview: String,
    /// Creator name.
    pub author: String,
    /// Creator profile URL, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_url: Option<String>,
    /// Canonical page for this item on the provider site.
    pub source_url: String,
    /// Downloadable renditions, best quality first.
    pub downloads: Vec<DownloadOption>,
    /// Playback length in seconds for audio and video.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    /// Width in pixels, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    /// Height in pixels, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    /// Provider-assigned tags, when any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl MediaItem {
    /// Text fed to the embedding model when ranking this item.
    ///
    /// Joins title, description, and tags into one string. Missing parts
    /// contribute nothing beyond their separator and the result is trimmed.
    pub fn embedding_text(&self) -> String {
        let description = self.description.as_deref().unwrap_or("");
        let tags = self
            .tags
            .as_ref()
            .map(|tags| tags.join(" "))
            .unwrap_or_default();
        format!("{} {} {}", self.title, description, tags)
            .trim()
            .to_string()
    }
}

/// One page of results from a single provider.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderPage {
    /// Items on this page.
    pub items: Vec<MediaItem>,
    /// Total matches the provider reports for the whole query.
    pub total: u64,
}

impl ProviderPage {
    /// A successful page with no results.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Combines two pages from the same provider, summing reported totals.
    pub fn merge(mut self, other: ProviderPage) -> ProviderPage {
        self.items.extend(other.items);
        self.total += other.total;
        self
    }
}

/// Result of querying one provider during a fan-out, success or failure.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceOutcome {
    /// The provider that was queried.
    pub source: MediaSource,
    /// Items returned, empty on failure.
    pub items: Vec<MediaItem>,
    /// Total matches reported, zero on failure.
    pub total: u64,
    /// Error message when the provider failed.
    pub error: Option<String>,
}

impl SourceOutcome {
    /// Records a successful provider response.
    pub fn success(source: MediaSource, page: ProviderPage) -> Self {
        Self {
            source,
            items: page.items,
            total: page.total,
            error: None,
        }
    }

    /// Records a failed provider, contributing no items and a zero total.
    pub fn failure(source: MediaSource, error: impl Into<String>) -> Self {
        Self {
            source,
            items: Vec::new(),
            total: 0,
            error: Some(error.into()),
        }
    }
}

/// Per-source status reported alongside search results.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceSummary {
    /// The provider this summary describes.
    pub source: MediaSource,
    /// Number of items this provider contributed.
    pub count: usize,
    /// Error message when the provider failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Aggregated response for one search request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    /// Ranked, interleaved items from all responding providers.
    pub items: Vec<MediaItem>,
    /// Sum of the totals reported by every provider that responded.
    pub total_results: u64,
    /// Echo of the requested page number.
    pub page: u32,
    /// Echo of the requested page size.
    pub per_page: u32,
    /// Status of every configured provider, in query order.
    pub sources: Vec<SourceSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_item() -> MediaItem {
        MediaItem {
            id: "pexels-photo-42".to_string(),
            kind: MediaKind::Image,
            source: MediaSource::Pexels,
            title: "Sunset over water".to_string(),
            description: Some("Golden hour at the coast".to_string()),
            thumbnail: "https://example.com/tiny.jpg".to_string(),
            preview: "https://example.com/medium.jpg".to_string(),
            author: "Ana".to_string(),
            author_url: Some("https://example.com/ana".to_string()),
            source_url: "https://example.com/photo/42".to_string(),
            downloads: vec![DownloadOption {
                label: "Original".to_string(),
                url: "https://example.com/original.jpg".to_string(),
                format: "jpg".to_string(),
                quality: Some("original".to_string()),
                size: None,
                width: Some(4000),
                height: Some(3000),
            }],
            duration: None,
            width: Some(4000),
            height: Some(3000),
            tags: Some(vec!["sunset".to_string(), "ocean".to_string()]),
        }
    }

    #[test]
    fn test_media_item_wire_shape() {
        let value = serde_json::to_value(sample_item()).unwrap();

        assert_eq!(value["type"], "image");
        assert_eq!(value["source"], "pexels");
        assert_eq!(value["authorUrl"], "https://example.com/ana");
        assert_eq!(value["sourceUrl"], "https://example.com/photo/42");
        assert_eq!(value["downloads"][0]["label"], "Original");
        // Absent optional fields are omitted entirely, not serialized as null.
        assert!(value.get("duration").is_none());
    }

    #[test]
    fn test_media_item_omits_unset_optionals() {
        let mut item = sample_item();
        item.description = None;
        item.author_url = None;
        item.width = None;
        item.height = None;
        item.tags = None;

        let value = serde_json::to_value(item).unwrap();
        for key in ["description", "authorUrl", "duration", "width", "height", "tags"] {
            assert!(value.get(key).is_none(), "expected {key} to be omitted");
        }
    }

    #[test]
    fn test_search_response_wire_shape() {
        let response = SearchResponse {
            items: vec![],
            total_results: 123,
            page: 2,
            per_page: 20,
            sources: vec![
                SourceSummary {
                    source: MediaSource::Pexels,
                    count: 0,
                    error: None,
                },
                SourceSummary {
                    source: MediaSource::Giphy,
                    count: 0,
                    error: Some("Giphy API error: HTTP 500".to_string()),
                },
            ],
        };

        let value = serde_json::to_value(response).unwrap();
        assert_eq!(value["totalResults"], 123);
        assert_eq!(value["page"], 2);
        assert_eq!(value["perPage"], 20);
        assert_eq!(value["sources"][0]["source"], "pexels");
        assert!(value["sources"][0].get("error").is_none());
        assert_eq!(value["sources"][1]["error"], "Giphy API error: HTTP 500");
    }

    #[test]
    fn test_embedding_text_joins_parts() {
        let item = sample_item();
        assert_eq!(
            item.embedding_text(),
            "Sunset over water Golden hour at the coast sunset ocean"
        );
    }

    #[test]
    fn test_embedding_text_trims_missing_parts() {
        let mut item = sample_item();
        item.description = None;
        item.tags = None;
        assert_eq!(item.embedding_text(), "Sunset over water");
    }

    #[test]
    fn test_media_type_parse_falls_back_to_all() {
        assert_eq!(MediaType::parse_param("video"), MediaType::Video);
        assert_eq!(MediaType::parse_param("gif"), MediaType::Gif);
        assert_eq!(MediaType::parse_param("bogus"), MediaType::All);
        assert_eq!(MediaType::parse_param("IMAGE"), MediaType::All);
    }

    #[test]
    fn test_media_type_wants() {
        assert!(MediaType::All.wants(MediaKind::Audio));
        assert!(MediaType::Video.wants(MediaKind::Video));
        assert!(!MediaType::Image.wants(MediaKind::Gif));
    }

    #[test]
    fn test_optional_filter_parsing() {
        assert_eq!(
            Orientation::parse_param("portrait"),
            Some(Orientation::Portrait)
        );
        assert_eq!(Orientation::parse_param("diagonal"), None);
        assert_eq!(OrderBy::parse_param("latest"), Some(OrderBy::Latest));
        assert_eq!(OrderBy::parse_param("unknown"), None);
    }

    #[test]
    fn test_provider_page_merge_sums_totals() {
        let photos = ProviderPage {
            items: vec![sample_item()],
            total: 40,
        };
        let mut video_item = sample_item();
        video_item.id = "pexels-video-7".to_string();
        let videos = ProviderPage {
            items: vec![video_item],
            total: 12,
        };

        let merged = photos.merge(videos);
        assert_eq!(merged.items.len(), 2);
        assert_eq!(merged.total, 52);
        assert_eq!(merged.items[0].id, "pexels-photo-42");
        assert_eq!(merged.items[1].id, "pexels-video-7");
    }

    #[test]
    fn test_source_outcome_failure_contributes_nothing() {
        let outcome = SourceOutcome::failure(MediaSource::Freesound, "boom");
        assert!(outcome.items.is_empty());
        assert_eq!(outcome.total, 0);
        assert_eq!(outcome.error.as_deref(), Some("boom"));
    }
}
