//! Medley Core - Shared infrastructure for the media metasearch service
//!
//! This crate provides the fundamental building blocks shared by every Medley
//! component: configuration management, tracing setup, and request rate
//! limiting for the HTTP surface.

pub mod config;
pub mod limiter;
pub mod tracing_setup;

// Re-export main types for convenient access
pub use config::MedleyConfig;
pub use limiter::{LimiterError, RequestLimiter, TokenBucket};

/// Core errors that can bubble up from any Medley subsystem.
///
/// High-level error types representing failures outside the search pipeline
/// itself (which degrades per source instead of erroring).
#[derive(Debug, thiserror::Error)]
pub enum MedleyError {
    #[error("Configuration error: {reason}")]
    Configuration { reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Server error: {reason}")]
    Server { reason: String },
}

impl MedleyError {
    /// Returns a user-friendly error message suitable for display.
    pub fn user_message(&self) -> String {
        match self {
            MedleyError::Configuration { reason } => format!("Configuration error: {reason}"),
            MedleyError::Io(_) => "File system error occurred".to_string(),
            MedleyError::Server { reason } => format!("Server error: {reason}"),
        }
    }
}

pub type Result<T> = std::result::Result<T, MedleyError>;
