/// Emberbin HTTP Server
///
/// This crate exposes the paste lifecycle over a small JSON API: create a
/// paste, fetch it by id (consuming a view), plus health and metrics
/// endpoints.

pub mod handlers;
pub mod metrics;

use ember_api::Pastebin;
use ember_core::clock::Clock;
use std::sync::Arc;

pub use handlers::router;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub bin: Arc<Pastebin>,
    /// Read-side clock; only override-enabled servers honor x-test-now-ms
    pub clock: Clock,
    /// Public base URL for share links; falls back to the request Host header
    pub base_url: Option<String>,
}

impl AppState {
    pub fn new(bin: Pastebin, clock: Clock, base_url: Option<String>) -> Self {
        Self {
            bin: Arc::new(bin),
            clock,
            base_url,
        }
    }
}
