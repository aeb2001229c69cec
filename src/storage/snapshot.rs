// src/storage/snapshot.rs
// =============================================================================
// Writes rendered pages to disk.
//
// For every URL:
// 1. Work out the target path with map_url_to_path()
// 2. Create the parent directories (no error if they already exist)
// 3. Optionally reflow the markup so each tag starts on its own line
// 4. Write <path>.html
// 5. If metadata is enabled, write <path>.html.meta.json next to it
//
// The store has no shared state besides the filesystem, so many URLs can be
// saved at once as long as they map to different paths.
// =============================================================================

use super::metadata::{MetadataRecord, SnapshotMetadata, METADATA_SUFFIX};
use super::path::map_url_to_path;
use crate::config::Config;
use crate::error::StorageError;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

// Whitespace (or nothing) between the end of one tag and the start of the next
static TAG_BOUNDARY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r">\s*<").expect("tag boundary pattern is valid")
});

/// Where a snapshot ended up
#[derive(Debug, Clone, PartialEq)]
pub struct SavedSnapshot {
    pub path: PathBuf,
    pub metadata_path: Option<PathBuf>,
    /// Bytes of HTML written
    pub size: usize,
}

/// Persists snapshots under one output directory
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    out_dir: PathBuf,
    pretty_html: bool,
    include_metadata: bool,
}

impl SnapshotStore {
    pub fn new(out_dir: impl Into<PathBuf>, pretty_html: bool, include_metadata: bool) -> Self {
        Self {
            out_dir: out_dir.into(),
            pretty_html,
            include_metadata,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.out_dir.clone(),
            config.pretty_html,
            config.include_metadata,
        )
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    // The file a URL's snapshot is written to
    pub fn file_path(&self, url: &str) -> PathBuf {
        map_url_to_path(url, &self.out_dir)
    }

    // Saves one snapshot
    //
    // Parameters:
    //   url: the sitemap location (decides the file path)
    //   html: rendered HTML
    //   metadata: title/timestamp to record; only written when metadata is enabled.
    //             The recorded size is always the length of the written HTML.
    //
    // Returns: the written paths, or a StorageError the caller records as
    // this URL's failure
    pub async fn save_snapshot(
        &self,
        url: &str,
        html: &str,
        metadata: Option<&SnapshotMetadata>,
    ) -> Result<SavedSnapshot, StorageError> {
        let path = self.file_path(url);

        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|source| StorageError::CreateDir {
                    path: dir.to_path_buf(),
                    source,
                })?;
        }

        let output = if self.pretty_html {
            prettify_html(html)
        } else {
            html.to_string()
        };

        tokio::fs::write(&path, output.as_bytes())
            .await
            .map_err(|source| StorageError::Write {
                path: path.clone(),
                source,
            })?;

        let metadata_path = match metadata {
            Some(metadata) if self.include_metadata => {
                let meta_path = metadata_path_for(&path);
                let record = MetadataRecord {
                    url: url.to_string(),
                    metadata: SnapshotMetadata {
                        size: output.len(),
                        ..metadata.clone()
                    },
                };
                let json = serde_json::to_string_pretty(&record).map_err(|source| {
                    StorageError::Serialize {
                        url: url.to_string(),
                        source,
                    }
                })?;
                tokio::fs::write(&meta_path, json)
                    .await
                    .map_err(|source| StorageError::Write {
                        path: meta_path.clone(),
                        source,
                    })?;
                Some(meta_path)
            }
            _ => None,
        };

        tracing::info!("Saved snapshot to {}", path.display());

        Ok(SavedSnapshot {
            path,
            metadata_path,
            size: output.len(),
        })
    }
}

// <page>.html -> <page>.html.meta.json
pub fn metadata_path_for(html_path: &Path) -> PathBuf {
    let mut name = html_path.as_os_str().to_owned();
    name.push(METADATA_SUFFIX);
    PathBuf::from(name)
}

// Puts every tag on its own line.
// A light structural reflow, not a parser: text inside <pre> is reflowed too.
pub fn prettify_html(html: &str) -> String {
    TAG_BOUNDARY.replace_all(html, ">\n<").into_owned()
}
