// src/storage/path.rs
// =============================================================================
// Maps a sitemap location to the file its snapshot is written to.
//
//   https://example.com/          ->  <out_dir>/index.html
//   https://example.com/about     ->  <out_dir>/about.html
//   https://example.com/blog/     ->  <out_dir>/blog.html
//   /docs/intro?x=1               ->  <out_dir>/docs/intro?x=1.html  (relative: used as-is)
//
// Only the path of an absolute URL is used: host, query and fragment are
// dropped. The mapping is pure (no I/O) and never fails.
// =============================================================================

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use url::Url;

// Computes the snapshot path for a URL
//
// Parameters:
//   url: absolute http(s) URL or site-relative path from the sitemap
//   out_dir: root directory of the snapshots
//
// Returns: a path under out_dir that always ends in ".html"
pub fn map_url_to_path(url: &str, out_dir: &Path) -> PathBuf {
    let url_path = url_path(url);

    // Empty and "." segments vanish, ".." can never climb above out_dir
    let mut segments: Vec<&str> = Vec::new();
    for segment in url_path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    // "/" (and anything that normalizes to it) is the index page
    if segments.is_empty() {
        segments.push("index");
    }

    let mut path = out_dir.to_path_buf();
    let last = segments.len() - 1;
    for (i, segment) in segments.iter().enumerate() {
        if i == last {
            path.push(format!("{segment}.html"));
        } else {
            path.push(segment);
        }
    }
    path
}

// Extracts the path component of a location
fn url_path(url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        // A malformed absolute URL falls back to the raw string
        return match Url::parse(url) {
            Ok(parsed) => parsed.path().to_string(),
            Err(_) => url.to_string(),
        };
    }

    if url.starts_with('/') {
        url.to_string()
    } else {
        format!("/{url}")
    }
}

// Groups URLs that would be written to the same file
//
// Returns: (path, urls) for every path claimed by more than one URL,
// sorted by path; urls keep their sitemap order
pub fn find_path_collisions<'a, I>(urls: I, out_dir: &Path) -> Vec<(PathBuf, Vec<String>)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut by_path: BTreeMap<PathBuf, Vec<String>> = BTreeMap::new();
    for url in urls {
        by_path
            .entry(map_url_to_path(url, out_dir))
            .or_default()
            .push(url.to_string());
    }

    by_path
        .into_iter()
        .filter(|(_, urls)| urls.len() > 1)
        .collect()
}
