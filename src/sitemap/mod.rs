// src/sitemap/mod.rs
// =============================================================================
// This module turns a sitemap source (file or URL) into the list of pages
// to snapshot.
//
// Submodules:
// - fetch: loads the XML from disk or over HTTP
// - parse: turns the XML into a SitemapDocument (urlset / index / other)
//
// Sitemap indexes are recognized but not followed; resolving one fails with
// an error that lists the child sitemaps so the user can pick one.
// =============================================================================

mod fetch;
mod parse;

pub use fetch::resolve_sitemap;
pub use parse::{parse_sitemap, SitemapDocument, SitemapUrl};
