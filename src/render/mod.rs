// src/render/mod.rs
// =============================================================================
// The rendering side of the pipeline.
//
// The orchestrator only talks to a `RenderGateway`: something that can open
// a browser session, turn a URL into fully rendered HTML, and close the
// session again. The real implementation (chrome.rs) drives headless Chrome;
// tests plug in an in-memory fake.
//
// Rust concepts:
// - Traits: a shared interface several types can implement
// - async-trait: lets traits have async methods and still be used as
//   `Box<dyn RenderGateway>`
// - Send + Sync: the gateway is shared by all renders of a batch
// =============================================================================

mod chrome;

pub use chrome::ChromeGateway;

use crate::config::Config;
use crate::error::RenderError;
use async_trait::async_trait;
use std::time::Duration;

/// Wait conditions applied to every render
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    /// Upper bound for navigation and for each selector wait
    pub timeout: Duration,
    /// Wait until the network is quiet instead of the load event
    pub wait_for_network_idle: bool,
    /// Selectors that must be visible before the HTML is captured
    pub wait_for_selectors: Vec<String>,
    /// Extra fixed delay before capture
    pub additional_wait: Option<Duration>,
}

impl RenderOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            timeout: config.timeout,
            wait_for_network_idle: config.wait_for_network_idle,
            wait_for_selectors: config.wait_for_selectors.clone(),
            additional_wait: config.additional_wait,
        }
    }
}

/// A browser session that renders pages
///
/// Lifecycle: `initialize` once, any number of concurrent `render_page`
/// calls, then `close`. Both `initialize` and `close` are idempotent, and
/// `close` is safe to call on a session that was never initialized.
#[async_trait]
pub trait RenderGateway: Send + Sync {
    /// Starts the shared browser session
    async fn initialize(&self) -> Result<(), RenderError>;

    /// Renders one absolute URL and returns its HTML.
    /// Each call gets its own isolated browsing context.
    async fn render_page(&self, url: &str, options: &RenderOptions) -> Result<String, RenderError>;

    /// Releases the browser session
    async fn close(&self) -> Result<(), RenderError>;
}

// Turns a sitemap location into the URL the browser should open
//
// Examples:
//   ("https://example.com", "https://other.com/x") -> "https://other.com/x"
//   ("https://example.com/", "/about")             -> "https://example.com/about"
//   ("https://example.com", "about")               -> "https://example.com/about"
//   ("", "/about")                                 -> Err(MissingBaseUrl)
pub fn resolve_page_url(base_url: &str, loc: &str) -> Result<String, RenderError> {
    if loc.starts_with("http://") || loc.starts_with("https://") {
        return Ok(loc.to_string());
    }

    let base = base_url.trim_end_matches('/');
    if base.is_empty() {
        return Err(RenderError::MissingBaseUrl(loc.to_string()));
    }

    let path = loc.trim_start_matches('/');
    Ok(format!("{base}/{path}"))
}
