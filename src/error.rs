// src/error.rs
// =============================================================================
// Error types for the snapshot pipeline.
//
// There are two very different kinds of failure:
// - Run-level failures (bad config, unusable sitemap, browser won't start).
//   These stop the whole run and travel up through `?` as GenerateError.
// - Per-URL failures (a page times out, a file can't be written).
//   These are caught inside the orchestrator and stored as data on the
//   SnapshotResult for that URL. They never abort the batch.
//
// Rust concepts:
// - thiserror: derive macro that implements std::error::Error and Display
// - #[from]: lets `?` convert one error type into another automatically
// =============================================================================

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while loading or parsing the sitemap. All of them are fatal.
#[derive(Debug, Error)]
pub enum SitemapError {
    /// The remote sitemap could not be downloaded
    #[error("failed to fetch sitemap {url}: {reason}")]
    Fetch { url: String, reason: String },

    /// The local sitemap file could not be read
    #[error("failed to read sitemap file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The content is not a sitemap we understand
    #[error("unrecognized sitemap format: {0}")]
    Format(String),

    /// The content is a sitemap index; the caller must pick a child sitemap
    #[error(
        "sitemap index found, please use one of the child sitemaps instead: {}",
        children.join(", ")
    )]
    IndexNotSupported { children: Vec<String> },
}

/// Errors raised by a RenderGateway.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The browser process could not be started
    #[error("failed to launch browser: {0}")]
    Launch(String),

    /// render_page was called on a closed session
    #[error("browser session is not initialized")]
    NotInitialized,

    /// A site-relative location was given but no base URL is configured
    #[error("cannot resolve relative location '{0}' without a base URL")]
    MissingBaseUrl(String),

    /// Navigation itself failed (DNS, connection refused, bad URL...)
    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    /// The page did not finish loading in time
    #[error("timed out after {}ms loading {url}", timeout.as_millis())]
    Timeout { url: String, timeout: Duration },

    /// A wait-for selector never became visible
    #[error("timed out after {}ms waiting for selector '{selector}' on {url}", timeout.as_millis())]
    SelectorTimeout {
        url: String,
        selector: String,
        timeout: Duration,
    },

    /// The page loaded but its HTML could not be read back
    #[error("failed to capture HTML of {url}: {reason}")]
    Capture { url: String, reason: String },
}

/// Errors raised while writing a snapshot to disk (per URL, recovered).
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to create directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize metadata for {url}: {source}")]
    Serialize {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Why a single URL could not be snapshotted. Recorded on its SnapshotResult.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors raised while building the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("concurrency must be at least 1 (got {0})")]
    InvalidConcurrency(usize),

    #[error("a sitemap path or URL is required")]
    MissingSitemap,

    #[error("viewport dimensions must be non-zero (got {width}x{height})")]
    InvalidViewport { width: u32, height: u32 },

    #[error("invalid viewport '{0}', expected WIDTHxHEIGHT")]
    ViewportSyntax(String),

    #[error("failed to read config file {}: {source}", path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {}: {source}", path.display())]
    ParseFile {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Run-level failure of `Snapshotter::generate`. No RunSummary exists when this is returned.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("sitemap resolution failed: {0}")]
    SitemapResolutionFailed(#[from] SitemapError),

    #[error("renderer could not be initialized: {0}")]
    RendererUnavailable(#[source] RenderError),
}
