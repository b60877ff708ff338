//! Integration tests for Medley
//!
//! These tests verify the integration between different components of the
//! system: the provider fan-out with interleaving and re-ranking working as
//! one pipeline, and the HTTP surface exercised over a real socket.

#[path = "integration/support.rs"]
mod support;

#[path = "integration/aggregation.rs"]
mod aggregation;
#[path = "integration/http_api.rs"]
mod http_api;
