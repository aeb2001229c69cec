// src/generate/mod.rs
// =============================================================================
// The generation orchestrator: sitemap in, snapshot files out.
//
// A run walks through four phases:
//
//   Idle -> SitemapResolved -> Rendering -> Closed
//
// 1. Resolve the sitemap. Any failure here ends the run with an error and
//    no summary.
// 2. Start the browser session (once).
// 3. Split the URLs into batches of `concurrency` and, batch by batch,
//    render + store every URL of the batch at the same time. The next batch
//    only starts once every URL of the current one has finished, successfully
//    or not. A failing URL is recorded and the run carries on.
// 4. Close the browser session, whatever happened in step 3.
// =============================================================================

mod summary;

pub use summary::{RunSummary, SnapshotResult};

use crate::config::Config;
use crate::error::{GenerateError, RenderError, SnapshotError};
use crate::render::{resolve_page_url, ChromeGateway, RenderGateway, RenderOptions};
use crate::sitemap::{resolve_sitemap, SitemapUrl};
use crate::storage::{find_path_collisions, SnapshotMetadata, SnapshotStore};
use futures::future::join_all;

/// Where a Snapshotter is in its run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    SitemapResolved,
    Rendering,
    Closed,
}

/// Drives a full snapshot run
pub struct Snapshotter {
    config: Config,
    options: RenderOptions,
    store: SnapshotStore,
    gateway: Box<dyn RenderGateway>,
    phase: RunPhase,
}

impl Snapshotter {
    // Creates a Snapshotter that renders through the given gateway
    pub fn new(config: Config, gateway: Box<dyn RenderGateway>) -> Self {
        Self {
            options: RenderOptions::from_config(&config),
            store: SnapshotStore::from_config(&config),
            config,
            gateway,
            phase: RunPhase::Idle,
        }
    }

    // Creates a Snapshotter backed by headless Chrome
    pub fn with_chrome(config: Config) -> Self {
        let gateway = ChromeGateway::from_config(&config);
        Self::new(config, Box::new(gateway))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    // Snapshots every URL of the sitemap
    //
    // Returns:
    //   Ok(summary) once every batch has settled, even if some URLs failed
    //   Err(GenerateError) if the sitemap can't be resolved or the browser
    //   can't be started; nothing is rendered in that case
    pub async fn generate(&mut self) -> Result<RunSummary, GenerateError> {
        tracing::info!("Starting snapshot generation");

        let urls = resolve_sitemap(&self.config.sitemap_url).await?;
        self.phase = RunPhase::SitemapResolved;
        tracing::info!("Found {} URLs in sitemap", urls.len());

        self.warn_path_collisions(&urls);

        if let Err(e) = self.gateway.initialize().await {
            self.shutdown().await;
            return Err(GenerateError::RendererUnavailable(e));
        }
        self.phase = RunPhase::Rendering;

        let summary = self.render_batches(&urls).await;

        self.shutdown().await;

        tracing::info!("Snapshot generation completed");
        tracing::info!(
            "Results: {} successful, {} failed",
            summary.success,
            summary.failed
        );
        Ok(summary)
    }

    // Releases the browser session. Safe to call any number of times.
    pub async fn close(&mut self) -> Result<(), RenderError> {
        self.gateway.close().await?;
        self.phase = RunPhase::Closed;
        Ok(())
    }

    async fn render_batches(&self, urls: &[SitemapUrl]) -> RunSummary {
        let mut summary = RunSummary::new(urls.len());
        let batch_size = self.config.concurrency.max(1);
        let batch_count = urls.len().div_ceil(batch_size);

        for (index, batch) in urls.chunks(batch_size).enumerate() {
            tracing::debug!(
                "Starting batch {}/{} ({} URL(s))",
                index + 1,
                batch_count,
                batch.len()
            );

            // join_all waits for every URL; one failure doesn't cancel the others
            let results = join_all(batch.iter().map(|entry| self.snapshot_url(&entry.loc))).await;
            for result in results {
                summary.record(result);
            }
        }

        summary
    }

    // Renders and stores one URL; errors become a failed SnapshotResult
    async fn snapshot_url(&self, loc: &str) -> SnapshotResult {
        let file_path = self.store.file_path(loc);
        tracing::info!("Processing {}", loc);

        match self.render_and_store(loc).await {
            Ok(metadata) => {
                tracing::info!("Successfully generated snapshot for {}", loc);
                SnapshotResult::succeeded(loc.to_string(), file_path, metadata)
            }
            Err(e) => {
                tracing::error!("Error generating snapshot for {}: {}", loc, e);
                SnapshotResult::failed(loc.to_string(), file_path, e.to_string())
            }
        }
    }

    async fn render_and_store(&self, loc: &str) -> Result<Option<SnapshotMetadata>, SnapshotError> {
        let page_url = resolve_page_url(&self.config.base_url, loc)?;
        let html = self.gateway.render_page(&page_url, &self.options).await?;

        let metadata = self
            .config
            .include_metadata
            .then(|| SnapshotMetadata::for_html(&html));

        let saved = self
            .store
            .save_snapshot(loc, &html, metadata.as_ref())
            .await?;

        Ok(metadata.map(|metadata| SnapshotMetadata {
            size: saved.size,
            ..metadata
        }))
    }

    // Several URLs mapping to one file overwrite each other (last write wins)
    fn warn_path_collisions(&self, urls: &[SitemapUrl]) {
        let collisions =
            find_path_collisions(urls.iter().map(|u| u.loc.as_str()), self.store.out_dir());
        for (path, colliding) in collisions {
            tracing::warn!(
                "{} URLs map to {}, only one snapshot will survive: {}",
                colliding.len(),
                path.display(),
                colliding.join(", ")
            );
        }
    }

    async fn shutdown(&mut self) {
        if let Err(e) = self.close().await {
            tracing::warn!("Failed to close renderer: {}", e);
            self.phase = RunPhase::Closed;
        }
    }
}
