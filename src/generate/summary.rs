// src/generate/summary.rs
// =============================================================================
// Per-URL outcomes and the run summary.
//
// A SnapshotResult is created for each URL, filled in once, and then
// appended to the RunSummary. Failures are plain data here (the `error`
// string), not Rust errors.
// =============================================================================

use crate::storage::SnapshotMetadata;
use serde::Serialize;
use std::path::PathBuf;

/// Outcome of snapshotting one URL
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotResult {
    /// The sitemap location
    pub url: String,
    /// Where the snapshot is (or would have been) written
    pub file_path: PathBuf,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<SnapshotMetadata>,
}

impl SnapshotResult {
    pub fn succeeded(url: String, file_path: PathBuf, metadata: Option<SnapshotMetadata>) -> Self {
        Self {
            url,
            file_path,
            success: true,
            error: None,
            metadata,
        }
    }

    pub fn failed(url: String, file_path: PathBuf, error: String) -> Self {
        Self {
            url,
            file_path,
            success: false,
            error: Some(error),
            metadata: None,
        }
    }
}

/// Totals and per-URL results of one `generate` call
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    pub results: Vec<SnapshotResult>,
}

impl RunSummary {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            results: Vec::with_capacity(total),
            ..Default::default()
        }
    }

    // Appends a finished result and updates the counters
    pub fn record(&mut self, result: SnapshotResult) {
        if result.success {
            self.success += 1;
        } else {
            self.failed += 1;
        }
        self.results.push(result);
    }

    /// True when every URL was snapshotted
    pub fn is_ok(&self) -> bool {
        self.failed == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_counts_outcomes() {
        let mut summary = RunSummary::new(2);
        summary.record(SnapshotResult::succeeded(
            "https://example.com/".to_string(),
            PathBuf::from("out/index.html"),
            None,
        ));
        summary.record(SnapshotResult::failed(
            "https://example.com/about".to_string(),
            PathBuf::from("out/about.html"),
            "timed out".to_string(),
        ));

        assert_eq!(summary.total, 2);
        assert_eq!(summary.success, 1);
        assert_eq!(summary.failed, 1);
        assert!(!summary.is_ok());
        assert_eq!(summary.results[1].error.as_deref(), Some("timed out"));
    }

    #[test]
    fn test_result_serializes_camel_case() {
        let result = SnapshotResult::failed(
            "/about".to_string(),
            PathBuf::from("out/about.html"),
            "boom".to_string(),
        );
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["filePath"], "out/about.html");
        assert_eq!(json["success"], false);
        assert!(json.get("metadata").is_none());
    }
}
