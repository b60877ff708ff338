//! Error types for media search functionality.

use thiserror::Error;

use crate::types::MediaSource;

/// Errors that can occur during media search operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SearchError {
    /// Provider requires an API key that is not present in the configuration.
    #[error("{provider} API key is not configured")]
    MissingCredential {
        /// The provider whose credential is missing
        provider: MediaSource,
    },

    /// Network communication with the provider failed.
    #[error("{provider} request failed: {reason}")]
    Network {
        /// The provider that was being queried
        provider: MediaSource,
        /// The reason for the network failure
        reason: String,
    },

    /// Provider answered with a non-success HTTP status.
    #[error("{provider} API error: HTTP {status}")]
    UpstreamStatus {
        /// The provider that returned the status
        provider: MediaSource,
        /// The HTTP status code returned
        status: u16,
    },

    /// Failed to parse the provider response body.
    #[error("{provider} response parsing failed: {reason}")]
    Parse {
        /// The provider whose response could not be parsed
        provider: MediaSource,
        /// The reason for the parse failure
        reason: String,
    },

    /// Provider did not answer within the configured deadline.
    #[error("{provider} timed out after {seconds}s")]
    Timeout {
        /// The provider that timed out
        provider: MediaSource,
        /// The deadline that elapsed, in seconds
        seconds: u64,
    },

    /// Embedding model loading or inference failed.
    #[error("Embedding failed: {reason}")]
    Embedding {
        /// The reason for the embedding failure
        reason: String,
    },
}
