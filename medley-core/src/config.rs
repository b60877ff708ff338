//! Centralized configuration for Medley.
//!
//! All tunable parameters and settings are defined here to avoid
//! hard-coded values scattered throughout the codebase.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Central configuration for all Medley components.
///
/// Groups related configuration settings into logical sections.
/// Supports environment variable overrides for runtime customization.
#[derive(Debug, Clone, Default)]
pub struct MedleyConfig {
    pub providers: ProviderConfig,
    pub network: NetworkConfig,
    pub embedding: EmbeddingConfig,
    pub server: ServerConfig,
}

/// API credentials for the upstream media providers.
///
/// Each provider requires exactly one key. A missing key degrades that
/// provider only; searches keep running against the remaining sources.
#[derive(Debug, Clone, Default)]
pub struct ProviderConfig {
    /// Pexels API key (photos and videos)
    pub pexels_api_key: Option<String>,
    /// Pixabay API key (images and videos)
    pub pixabay_api_key: Option<String>,
    /// Giphy API key (GIFs)
    pub giphy_api_key: Option<String>,
    /// Freesound API key (audio)
    pub freesound_api_key: Option<String>,
}

impl ProviderConfig {
    /// Returns the display names of providers that have a key configured.
    pub fn configured(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.pexels_api_key.is_some() {
            names.push("Pexels");
        }
        if self.pixabay_api_key.is_some() {
            names.push("Pixabay");
        }
        if self.giphy_api_key.is_some() {
            names.push("Giphy");
        }
        if self.freesound_api_key.is_some() {
            names.push("Freesound");
        }
        names
    }
}

/// Outbound HTTP configuration.
///
/// Controls timeouts for provider searches and download proxying.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Upper bound for one provider search request
    pub provider_timeout: Duration,
    /// Upper bound for one download-proxy fetch
    pub download_timeout: Duration,
    /// User agent for outbound HTTP requests
    pub user_agent: &'static str,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            provider_timeout: Duration::from_secs(10),
            download_timeout: Duration::from_secs(30),
            user_agent: "medley/0.1.0",
        }
    }
}

/// Embedding model configuration for semantic re-ranking.
#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    /// Directory where downloaded model files are cached
    pub cache_dir: PathBuf,
    /// Upper bound for re-ranking one result batch
    pub rerank_timeout: Duration,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from(".fastembed_cache"),
            rerank_timeout: Duration::from_secs(20),
        }
    }
}

/// HTTP API server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the API server binds to
    pub bind_address: SocketAddr,
    /// Origins allowed by the CORS layer
    pub cors_origins: Vec<String>,
    /// Per-client request budget per minute (0 disables rate limiting)
    pub rate_limit_per_minute: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([127, 0, 0, 1], 4000)),
            cors_origins: vec![
                "http://localhost:5173".to_string(),
                "http://localhost:5174".to_string(),
            ],
            rate_limit_per_minute: 60,
        }
    }
}

impl MedleyConfig {
    /// Creates configuration with environment variable overrides.
    ///
    /// Provider credentials use the upstream services' conventional variable
    /// names; Medley-specific knobs use the `MEDLEY_` prefix.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        // Provider credentials (empty values count as unset)
        config.providers.pexels_api_key = env_nonempty("PEXELS_API_KEY");
        config.providers.pixabay_api_key = env_nonempty("PIXABAY_API_KEY");
        config.providers.giphy_api_key = env_nonempty("GIPHY_API_KEY");
        config.providers.freesound_api_key = env_nonempty("FREESOUND_API_KEY");

        // Network configuration overrides
        if let Ok(timeout) = std::env::var("MEDLEY_PROVIDER_TIMEOUT") {
            if let Ok(seconds) = timeout.parse::<u64>() {
                config.network.provider_timeout = Duration::from_secs(seconds);
            }
        }

        if let Ok(timeout) = std::env::var("MEDLEY_DOWNLOAD_TIMEOUT") {
            if let Ok(seconds) = timeout.parse::<u64>() {
                config.network.download_timeout = Duration::from_secs(seconds);
            }
        }

        // Embedding configuration overrides
        if let Ok(dir) = std::env::var("MEDLEY_EMBED_CACHE_DIR") {
            if !dir.trim().is_empty() {
                config.embedding.cache_dir = PathBuf::from(dir);
            }
        }

        if let Ok(timeout) = std::env::var("MEDLEY_RERANK_TIMEOUT") {
            if let Ok(seconds) = timeout.parse::<u64>() {
                config.embedding.rerank_timeout = Duration::from_secs(seconds);
            }
        }

        // Server configuration overrides
        if let Ok(port) = std::env::var("PORT") {
            if let Ok(port) = port.parse::<u16>() {
                config.server.bind_address.set_port(port);
            }
        }

        if let Ok(origins) = std::env::var("CORS_ORIGINS") {
            let origins: Vec<String> = origins
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(String::from)
                .collect();
            if !origins.is_empty() {
                config.server.cors_origins = origins;
            }
        }

        if let Ok(limit) = std::env::var("MEDLEY_RATE_LIMIT") {
            if let Ok(per_minute) = limit.parse::<u32>() {
                config.server.rate_limit_per_minute = per_minute;
            }
        }

        config
    }

    /// Creates a configuration optimized for testing.
    ///
    /// No credentials, short timeouts, rate limiting disabled, and an
    /// embedding cache under the system temp directory.
    pub fn for_testing() -> Self {
        Self {
            providers: ProviderConfig::default(),
            network: NetworkConfig {
                provider_timeout: Duration::from_secs(1),
                download_timeout: Duration::from_secs(1),
                ..NetworkConfig::default()
            },
            embedding: EmbeddingConfig {
                cache_dir: std::env::temp_dir().join("medley-embed-cache"),
                rerank_timeout: Duration::from_secs(1),
            },
            server: ServerConfig {
                rate_limit_per_minute: 0,
                ..ServerConfig::default()
            },
        }
    }
}

fn env_nonempty(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        let config = MedleyConfig::default();

        assert_eq!(config.network.provider_timeout, Duration::from_secs(10));
        assert_eq!(config.network.download_timeout, Duration::from_secs(30));
        assert_eq!(config.network.user_agent, "medley/0.1.0");
        assert_eq!(config.embedding.cache_dir, PathBuf::from(".fastembed_cache"));
        assert_eq!(config.embedding.rerank_timeout, Duration::from_secs(20));
        assert_eq!(config.server.bind_address.port(), 4000);
        assert_eq!(config.server.cors_origins.len(), 2);
        assert_eq!(config.server.rate_limit_per_minute, 60);
        assert!(config.providers.pexels_api_key.is_none());
        assert!(config.providers.configured().is_empty());
    }

    #[test]
    fn test_configured_provider_names() {
        let providers = ProviderConfig {
            pexels_api_key: Some("key".to_string()),
            freesound_api_key: Some("key".to_string()),
            ..ProviderConfig::default()
        };

        assert_eq!(providers.configured(), vec!["Pexels", "Freesound"]);
    }

    #[test]
    fn test_testing_preset() {
        let config = MedleyConfig::for_testing();

        assert_eq!(config.network.provider_timeout, Duration::from_secs(1));
        assert_eq!(config.embedding.rerank_timeout, Duration::from_secs(1));
        assert_eq!(config.server.rate_limit_per_minute, 0);
        assert!(config.providers.configured().is_empty());
    }

    #[test]
    fn test_env_override() {
        unsafe {
            std::env::set_var("PEXELS_API_KEY", "test-pexels-key");
            std::env::set_var("GIPHY_API_KEY", "   ");
            std::env::set_var("MEDLEY_PROVIDER_TIMEOUT", "3");
            std::env::set_var("PORT", "8123");
            std::env::set_var("CORS_ORIGINS", "http://a.test, http://b.test");
            std::env::set_var("MEDLEY_RATE_LIMIT", "5");
        }

        let config = MedleyConfig::from_env();

        assert_eq!(
            config.providers.pexels_api_key.as_deref(),
            Some("test-pexels-key")
        );
        // Whitespace-only keys count as unset
        assert!(config.providers.giphy_api_key.is_none());
        assert_eq!(config.network.provider_timeout, Duration::from_secs(3));
        assert_eq!(config.server.bind_address.port(), 8123);
        assert_eq!(
            config.server.cors_origins,
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
        assert_eq!(config.server.rate_limit_per_minute, 5);

        // Cleanup
        unsafe {
            std::env::remove_var("PEXELS_API_KEY");
            std::env::remove_var("GIPHY_API_KEY");
            std::env::remove_var("MEDLEY_PROVIDER_TIMEOUT");
            std::env::remove_var("PORT");
            std::env::remove_var("CORS_ORIGINS");
            std::env::remove_var("MEDLEY_RATE_LIMIT");
        }
    }
}
