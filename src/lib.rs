// src/lib.rs
// =============================================================================
// snpsht: render every page of a sitemap in headless Chrome and save the
// resulting HTML as static snapshot files.
//
// Module layout:
// - config:   run configuration (defaults, TOML file, CLI overrides)
// - error:    typed errors for each stage of the pipeline
// - logging:  tracing subscriber setup
// - sitemap:  load + parse sitemap.xml
// - render:   the RenderGateway trait and its Chrome implementation
// - storage:  URL -> file path mapping and snapshot writing
// - generate: the orchestrator tying everything together
// =============================================================================

//! Static HTML snapshots of JavaScript-rendered sites.
//!
//! ```no_run
//! # async fn demo() -> anyhow::Result<()> {
//! use snpsht::{Config, ConfigOverrides, Snapshotter};
//!
//! let config = Config::from_overrides(ConfigOverrides {
//!     sitemap_url: Some("https://example.com/sitemap.xml".to_string()),
//!     ..Default::default()
//! })?;
//!
//! let mut snapshotter = Snapshotter::with_chrome(config);
//! let result = snapshotter.generate().await;
//! snapshotter.close().await?;
//! let summary = result?;
//! println!("{} of {} pages saved", summary.success, summary.total);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod generate;
pub mod logging;
pub mod render;
pub mod sitemap;
pub mod storage;

pub use config::{Config, ConfigOverrides, Viewport};
pub use error::{ConfigError, GenerateError, RenderError, SitemapError, SnapshotError, StorageError};
pub use generate::{RunPhase, RunSummary, SnapshotResult, Snapshotter};
pub use render::{ChromeGateway, RenderGateway, RenderOptions};
pub use sitemap::{resolve_sitemap, SitemapUrl};
pub use storage::{map_url_to_path, SnapshotMetadata, SnapshotStore};
