// src/storage/mod.rs
// =============================================================================
// This module persists snapshots on disk.
//
// Submodules:
// - path: URL -> file path mapping (pure, no I/O)
// - snapshot: the SnapshotStore that writes HTML and metadata files
// - metadata: the metadata record and <title> extraction
// =============================================================================

mod metadata;
mod path;
mod snapshot;

pub use metadata::{extract_title, MetadataRecord, SnapshotMetadata, METADATA_SUFFIX};
pub use path::{find_path_collisions, map_url_to_path};
pub use snapshot::{metadata_path_for, prettify_html, SavedSnapshot, SnapshotStore};
