// src/storage/metadata.rs
// =============================================================================
// Snapshot metadata: what we record next to each saved page.
//
// The sibling file <page>.html.meta.json looks like:
//   {
//     "url": "https://example.com/about",
//     "timestamp": 1718000000000,
//     "title": "About us",
//     "size": 5120
//   }
// =============================================================================

use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};

/// Suffix appended to the HTML file name for the metadata file
pub const METADATA_SUFFIX: &str = ".meta.json";

/// Facts about one rendered page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Unix epoch milliseconds at which the page finished rendering
    pub timestamp: i64,
    /// Byte length of the HTML as written to disk
    pub size: usize,
}

impl SnapshotMetadata {
    // Builds metadata for freshly rendered HTML, stamped with the current time.
    // `size` is provisional until the store reports the written length.
    pub fn for_html(html: &str) -> Self {
        Self {
            title: extract_title(html),
            timestamp: chrono::Utc::now().timestamp_millis(),
            size: html.len(),
        }
    }
}

/// The JSON document written to the metadata file
#[derive(Debug, Serialize, Deserialize)]
pub struct MetadataRecord {
    pub url: String,
    #[serde(flatten)]
    pub metadata: SnapshotMetadata,
}

// Returns the trimmed text of the first <title> element, if any
pub fn extract_title(html: &str) -> Option<String> {
    let selector = Selector::parse("title").ok()?;
    let document = Html::parse_document(html);
    let title = document
        .select(&selector)
        .next()?
        .text()
        .collect::<String>();

    let title = title.split_whitespace().collect::<Vec<_>>().join(" ");
    if title.is_empty() {
        None
    } else {
        Some(title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_title() {
        let html = "<html><head><title>  About\n   us </title></head><body></body></html>";
        assert_eq!(extract_title(html), Some("About us".to_string()));
    }

    #[test]
    fn test_missing_or_empty_title() {
        assert_eq!(extract_title("<html><body><p>hi</p></body></html>"), None);
        assert_eq!(extract_title("<title>   </title>"), None);
    }

    #[test]
    fn test_record_flattens_metadata() {
        let record = MetadataRecord {
            url: "https://example.com/".to_string(),
            metadata: SnapshotMetadata {
                title: None,
                timestamp: 42,
                size: 7,
            },
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"url": "https://example.com/", "timestamp": 42, "size": 7})
        );
    }
}
