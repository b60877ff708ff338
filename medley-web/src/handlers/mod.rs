//! HTTP request handlers organized by functionality

pub mod api;
pub mod download;

// Re-export handler functions
pub use api::{SearchParams, api_health, api_search};
pub use download::{DownloadParams, api_download};
