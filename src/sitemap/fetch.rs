// src/sitemap/fetch.rs
// =============================================================================
// Loads a sitemap from wherever it lives and parses it.
//
// - "http://..." / "https://..." -> downloaded with reqwest
// - anything else                -> read from disk (relative paths are
//                                   resolved against the current directory)
// =============================================================================

use super::parse::{parse_sitemap, SitemapUrl};
use crate::error::SitemapError;
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Request timeout for remote sitemaps
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

// Resolves a sitemap source into its URL records
//
// Parameters:
//   source: local path or http(s) URL of a sitemap.xml
//
// Returns: every <url> entry in document order, or one of the SitemapError
// variants (all of them are fatal for the run)
pub async fn resolve_sitemap(source: &str) -> Result<Vec<SitemapUrl>, SitemapError> {
    tracing::info!("Parsing sitemap: {}", source);

    let xml = if is_remote(source) {
        fetch_remote(source).await?
    } else {
        read_local(source).await?
    };

    let urls = parse_sitemap(&xml)
        .and_then(|document| document.into_urls())
        .inspect_err(|e| tracing::error!("Error parsing sitemap XML: {}", e))?;

    tracing::debug!("Sitemap {} lists {} URL(s)", source, urls.len());
    Ok(urls)
}

fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

// Downloads a sitemap; any non-2xx status is an error
async fn fetch_remote(url: &str) -> Result<String, SitemapError> {
    let fetch_error = |reason: String| SitemapError::Fetch {
        url: url.to_string(),
        reason,
    };

    let client = Client::builder()
        .timeout(FETCH_TIMEOUT)
        .build()
        .map_err(|e| fetch_error(e.to_string()))?;

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| fetch_error(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        tracing::error!("Error fetching sitemap: HTTP {}", status.as_u16());
        return Err(fetch_error(format!("HTTP {}", status.as_u16())));
    }

    response.text().await.map_err(|e| fetch_error(e.to_string()))
}

async fn read_local(source: &str) -> Result<String, SitemapError> {
    let path = local_path(source);
    tokio::fs::read_to_string(&path)
        .await
        .map_err(|source| SitemapError::Read { path, source })
}

// Absolute paths are used as given, relative ones join the working directory
fn local_path(source: &str) -> PathBuf {
    let path = Path::new(source);
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::GET, MockServer};
    use std::io::Write;

    const TWO_URLS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>https://example.com/</loc></url>
  <url><loc>https://example.com/about</loc></url>
</urlset>"#;

    #[test]
    fn test_is_remote() {
        assert!(is_remote("https://example.com/sitemap.xml"));
        assert!(is_remote("http://localhost:8080/sitemap.xml"));
        assert!(!is_remote("./public/sitemap.xml"));
        assert!(!is_remote("/var/www/sitemap.xml"));
    }

    #[test]
    fn test_relative_path_joins_cwd() {
        let resolved = local_path("public/sitemap.xml");
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("public/sitemap.xml"));
    }

    #[tokio::test]
    async fn test_resolve_local_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(TWO_URLS.as_bytes()).unwrap();

        let urls = resolve_sitemap(file.path().to_str().unwrap()).await.unwrap();
        assert_eq!(urls.len(), 2);
        assert_eq!(urls[1].loc, "https://example.com/about");
    }

    #[tokio::test]
    async fn test_missing_local_file_is_read_error() {
        let err = resolve_sitemap("/definitely/not/here/sitemap.xml")
            .await
            .unwrap_err();
        assert!(matches!(err, SitemapError::Read { .. }));
    }

    #[tokio::test]
    async fn test_resolve_remote_sitemap() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/sitemap.xml");
                then.status(200)
                    .header("content-type", "application/xml")
                    .body(TWO_URLS);
            })
            .await;

        let urls = resolve_sitemap(&server.url("/sitemap.xml")).await.unwrap();
        mock.assert_async().await;
        assert_eq!(urls.len(), 2);
        assert_eq!(urls[0].loc, "https://example.com/");
    }

    #[tokio::test]
    async fn test_remote_error_status_is_fetch_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/sitemap.xml");
                then.status(404);
            })
            .await;

        let err = resolve_sitemap(&server.url("/sitemap.xml")).await.unwrap_err();
        match err {
            SitemapError::Fetch { reason, .. } => assert_eq!(reason, "HTTP 404"),
            other => panic!("expected fetch error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_remote_sitemap_index_is_rejected() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/sitemap_index.xml");
                then.status(200).body(
                    "<sitemapindex><sitemap><loc>https://example.com/a.xml</loc></sitemap></sitemapindex>",
                );
            })
            .await;

        let err = resolve_sitemap(&server.url("/sitemap_index.xml"))
            .await
            .unwrap_err();
        assert!(matches!(err, SitemapError::IndexNotSupported { ref children } if children == &["https://example.com/a.xml"]));
    }
}
