// src/sitemap/parse.rs
// =============================================================================
// Parses sitemap XML into a SitemapDocument.
//
// Two shapes are recognized, by root element:
//
//   <urlset>                          <sitemapindex>
//     <url>                             <sitemap>
//       <loc>https://...</loc>            <loc>https://.../a.xml</loc>
//       <lastmod>2024-01-15</lastmod>   </sitemap>
//       <changefreq>daily</changefreq> </sitemapindex>
//       <priority>0.8</priority>
//     </url>
//   </urlset>
//
// Anything else becomes SitemapDocument::Unrecognized.
//
// We use quick-xml's streaming reader: it hands us events (start tag, text,
// end tag...) one at a time, and we build the records as we go. Because we
// always push into a Vec, a sitemap with a single <url> naturally gives a
// one-element list.
// =============================================================================

use crate::error::SitemapError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::Serialize;

/// One <url> entry of a urlset
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SitemapUrl {
    /// Absolute URL or site-relative path
    pub loc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lastmod: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changefreq: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<f64>,
}

/// The result of parsing sitemap XML, checked and normalized
#[derive(Debug, Clone, PartialEq)]
pub enum SitemapDocument {
    /// A regular sitemap, entries in document order
    Urlset(Vec<SitemapUrl>),
    /// A sitemap index, child sitemap locations in document order
    SitemapIndex(Vec<String>),
    /// Well-formed XML of some other shape; holds a description of what was found
    Unrecognized(String),
}

impl SitemapDocument {
    // Turns the parsed document into the URL list, or the matching error
    pub fn into_urls(self) -> Result<Vec<SitemapUrl>, SitemapError> {
        match self {
            SitemapDocument::Urlset(urls) => Ok(urls),
            SitemapDocument::SitemapIndex(children) => {
                Err(SitemapError::IndexNotSupported { children })
            }
            SitemapDocument::Unrecognized(what) => Err(SitemapError::Format(what)),
        }
    }
}

// Which entry we are currently inside
#[derive(Debug, Clone, Copy, PartialEq)]
enum Root {
    Urlset,
    SitemapIndex,
}

// Fields collected for the entry being parsed
#[derive(Debug, Default)]
struct EntryFields {
    loc: Option<String>,
    lastmod: Option<String>,
    changefreq: Option<String>,
    priority: Option<String>,
}

// Parses sitemap XML
//
// Returns:
//   Ok(document) for any well-formed XML (shape decided by the root element)
//   Err(SitemapError::Format) for malformed XML or a <url>/<sitemap> without <loc>
pub fn parse_sitemap(xml: &str) -> Result<SitemapDocument, SitemapError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut root: Option<Root> = None;
    let mut entry: Option<EntryFields> = None;
    let mut field: Option<String> = None;
    let mut entry_count = 0usize;

    // Element nesting depth, and the depth of the open <url>/<sitemap>.
    // Only direct children of an entry are its fields, so extension
    // elements like <image:image><image:loc> never overwrite <loc>.
    let mut depth = 0usize;
    let mut entry_depth = 0usize;

    let mut urls = Vec::new();
    let mut children = Vec::new();

    loop {
        let event = reader
            .read_event()
            .map_err(|e| SitemapError::Format(format!("XML parse error: {e}")))?;

        match event {
            Event::Start(tag) => {
                depth += 1;
                let name = local_name(&tag);
                match (root, name.as_str()) {
                    (None, "urlset") => root = Some(Root::Urlset),
                    (None, "sitemapindex") => root = Some(Root::SitemapIndex),
                    (None, other) => {
                        return Ok(SitemapDocument::Unrecognized(format!(
                            "unexpected root element <{other}>"
                        )))
                    }
                    (Some(Root::Urlset), "url") | (Some(Root::SitemapIndex), "sitemap")
                        if entry.is_none() && depth == 2 =>
                    {
                        entry = Some(EntryFields::default());
                        entry_depth = depth;
                    }
                    (Some(_), "loc" | "lastmod" | "changefreq" | "priority")
                        if entry.is_some() && depth == entry_depth + 1 =>
                    {
                        field = Some(name.clone());
                    }
                    _ => field = None,
                }
            }
            // Self-closing tags: <urlset/> or an empty <url/> / <sitemap/>
            Event::Empty(tag) => {
                let name = local_name(&tag);
                match (root, name.as_str()) {
                    (None, "urlset") | (None, "sitemapindex") => {
                        return Ok(SitemapDocument::Unrecognized(format!("empty <{name}>")))
                    }
                    (None, other) => {
                        return Ok(SitemapDocument::Unrecognized(format!(
                            "unexpected root element <{other}>"
                        )))
                    }
                    (Some(Root::Urlset), "url") | (Some(Root::SitemapIndex), "sitemap")
                        if entry.is_none() && depth == 1 =>
                    {
                        entry_count += 1;
                        return Err(missing_loc(&name, entry_count));
                    }
                    _ => {}
                }
            }
            Event::Text(text) => {
                if let (Some(name), Some(fields)) = (&field, entry.as_mut()) {
                    let value = text
                        .unescape()
                        .map_err(|e| SitemapError::Format(format!("XML parse error: {e}")))?;
                    set_field(fields, name, value.trim());
                }
            }
            Event::CData(data) => {
                if let (Some(name), Some(fields)) = (&field, entry.as_mut()) {
                    let value = String::from_utf8_lossy(&data.into_inner()).to_string();
                    set_field(fields, name, value.trim());
                }
            }
            Event::End(_) => {
                let closes_entry = entry.is_some() && depth == entry_depth;
                depth = depth.saturating_sub(1);
                field = None;
                if !closes_entry {
                    continue;
                }

                match (root, entry.take()) {
                    (Some(Root::Urlset), Some(fields)) => {
                        entry_count += 1;
                        urls.push(into_url(fields, entry_count)?);
                    }
                    (Some(Root::SitemapIndex), Some(fields)) => {
                        entry_count += 1;
                        let loc = fields
                            .loc
                            .ok_or_else(|| missing_loc("sitemap", entry_count))?;
                        children.push(loc);
                    }
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    let document = match root {
        Some(Root::Urlset) if !urls.is_empty() => SitemapDocument::Urlset(urls),
        Some(Root::SitemapIndex) if !children.is_empty() => {
            SitemapDocument::SitemapIndex(children)
        }
        Some(Root::Urlset) => SitemapDocument::Unrecognized("<urlset> has no <url> entries".into()),
        Some(Root::SitemapIndex) => {
            SitemapDocument::Unrecognized("<sitemapindex> has no <sitemap> entries".into())
        }
        None => SitemapDocument::Unrecognized("document has no root element".into()),
    };
    Ok(document)
}

fn local_name(tag: &BytesStart) -> String {
    String::from_utf8_lossy(tag.local_name().as_ref()).to_string()
}

fn set_field(fields: &mut EntryFields, name: &str, value: &str) {
    let slot = match name {
        "loc" => &mut fields.loc,
        "lastmod" => &mut fields.lastmod,
        "changefreq" => &mut fields.changefreq,
        "priority" => &mut fields.priority,
        _ => return,
    };
    if !value.is_empty() {
        *slot = Some(value.to_string());
    }
}

fn into_url(fields: EntryFields, position: usize) -> Result<SitemapUrl, SitemapError> {
    let loc = fields.loc.ok_or_else(|| missing_loc("url", position))?;
    Ok(SitemapUrl {
        loc,
        lastmod: fields.lastmod,
        changefreq: fields.changefreq,
        priority: fields.priority.and_then(|p| p.parse().ok()),
    })
}

fn missing_loc(element: &str, position: usize) -> SitemapError {
    SitemapError::Format(format!("<{element}> entry #{position} has no <loc>"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urlset(entries: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">{entries}</urlset>"#
        )
    }

    #[test]
    fn test_single_url_is_a_one_element_list() {
        let xml = urlset("<url><loc>https://example.com/</loc></url>");
        let urls = parse_sitemap(&xml).unwrap().into_urls().unwrap();
        assert_eq!(
            urls,
            vec![SitemapUrl {
                loc: "https://example.com/".to_string(),
                lastmod: None,
                changefreq: None,
                priority: None,
            }]
        );
    }

    #[test]
    fn test_urls_keep_document_order_and_duplicates() {
        let xml = urlset(
            "<url><loc>https://example.com/c</loc></url>
             <url><loc>https://example.com/a</loc></url>
             <url><loc>https://example.com/b</loc></url>
             <url><loc>https://example.com/a</loc></url>",
        );
        let locs: Vec<String> = parse_sitemap(&xml)
            .unwrap()
            .into_urls()
            .unwrap()
            .into_iter()
            .map(|u| u.loc)
            .collect();
        assert_eq!(
            locs,
            vec![
                "https://example.com/c",
                "https://example.com/a",
                "https://example.com/b",
                "https://example.com/a"
            ]
        );
    }

    #[test]
    fn test_optional_fields() {
        let xml = urlset(
            "<url>
               <loc> https://example.com/about </loc>
               <lastmod>2024-01-15</lastmod>
               <changefreq>weekly</changefreq>
               <priority>0.8</priority>
             </url>
             <url><loc>/relative?a=1&amp;b=2</loc><priority>high</priority></url>",
        );
        let urls = parse_sitemap(&xml).unwrap().into_urls().unwrap();
        assert_eq!(urls[0].loc, "https://example.com/about");
        assert_eq!(urls[0].lastmod.as_deref(), Some("2024-01-15"));
        assert_eq!(urls[0].changefreq.as_deref(), Some("weekly"));
        assert_eq!(urls[0].priority, Some(0.8));
        assert_eq!(urls[1].loc, "/relative?a=1&b=2");
        assert_eq!(urls[1].priority, None);
    }

    #[test]
    fn test_cdata_loc() {
        let xml = urlset("<url><loc><![CDATA[https://example.com/x]]></loc></url>");
        let urls = parse_sitemap(&xml).unwrap().into_urls().unwrap();
        assert_eq!(urls[0].loc, "https://example.com/x");
    }

    #[test]
    fn test_sitemap_index_lists_children() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <sitemap><loc>https://example.com/posts.xml</loc><lastmod>2024-01-01</lastmod></sitemap>
  <sitemap><loc>https://example.com/pages.xml</loc></sitemap>
</sitemapindex>"#;
        let document = parse_sitemap(xml).unwrap();
        assert_eq!(
            document,
            SitemapDocument::SitemapIndex(vec![
                "https://example.com/posts.xml".to_string(),
                "https://example.com/pages.xml".to_string(),
            ])
        );

        let err = document.into_urls().unwrap_err();
        let message = err.to_string();
        assert!(matches!(err, SitemapError::IndexNotSupported { .. }));
        assert!(message.contains("https://example.com/posts.xml"));
        assert!(message.contains("https://example.com/pages.xml"));
    }

    #[test]
    fn test_unrecognized_shapes() {
        for xml in [
            "<rss><channel></channel></rss>",
            "<urlset></urlset>",
            "<urlset/>",
            "<sitemapindex></sitemapindex>",
            "",
        ] {
            let result = parse_sitemap(xml).unwrap().into_urls();
            assert!(
                matches!(result, Err(SitemapError::Format(_))),
                "{xml:?} gave {result:?}"
            );
        }
    }

    #[test]
    fn test_url_without_loc_is_format_error() {
        let xml = urlset("<url><lastmod>2024-01-15</lastmod></url>");
        assert!(matches!(parse_sitemap(&xml), Err(SitemapError::Format(_))));
    }

    #[test]
    fn test_empty_sitemap_entry_is_format_error() {
        let xml = "<sitemapindex><sitemap><loc>https://example.com/a.xml</loc></sitemap><sitemap/></sitemapindex>";
        assert!(matches!(parse_sitemap(xml), Err(SitemapError::Format(_))));

        let xml = urlset("<url><loc>https://example.com/</loc></url><url/>");
        assert!(matches!(parse_sitemap(&xml), Err(SitemapError::Format(_))));
    }

    #[test]
    fn test_image_extension_keeps_page_loc() {
        let xml = r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9"
                xmlns:image="http://www.google.com/schemas/sitemap-image/1.1">
            <url>
              <loc>https://example.com/gallery</loc>
              <image:image>
                <image:loc>https://cdn.example.com/photo.jpg</image:loc>
              </image:image>
              <lastmod>2024-03-01</lastmod>
            </url>
            <url>
              <image:image><image:loc>https://cdn.example.com/first.jpg</image:loc></image:image>
              <loc>https://example.com/shop</loc>
            </url>
        </urlset>"#;
        let urls = parse_sitemap(xml).unwrap().into_urls().unwrap();
        assert_eq!(urls.len(), 2);
        assert_eq!(urls[0].loc, "https://example.com/gallery");
        assert_eq!(urls[0].lastmod.as_deref(), Some("2024-03-01"));
        assert_eq!(urls[1].loc, "https://example.com/shop");
    }

    #[test]
    fn test_xhtml_link_sibling_is_ignored() {
        let xml = r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9"
                xmlns:xhtml="http://www.w3.org/1999/xhtml">
            <url>
              <loc>https://example.com/en/</loc>
              <xhtml:link rel="alternate" hreflang="de" href="https://example.com/de/"/>
              <xhtml:link rel="alternate" hreflang="en" href="https://example.com/en/"></xhtml:link>
              <priority>0.5</priority>
            </url>
        </urlset>"#;
        let urls = parse_sitemap(xml).unwrap().into_urls().unwrap();
        assert_eq!(urls.len(), 1);
        assert_eq!(urls[0].loc, "https://example.com/en/");
        assert_eq!(urls[0].priority, Some(0.5));
    }

    #[test]
    fn test_image_only_entry_has_no_loc() {
        let xml = urlset(
            "<url><image:image><image:loc>https://cdn.example.com/a.jpg</image:loc></image:image></url>",
        );
        assert!(matches!(parse_sitemap(&xml), Err(SitemapError::Format(_))));
    }

    #[test]
    fn test_malformed_xml_is_format_error() {
        let xml = "<urlset><url><loc>https://example.com/</loc></urlset>";
        assert!(matches!(parse_sitemap(xml), Err(SitemapError::Format(_))));
    }

    #[test]
    fn test_namespace_prefixes_are_ignored() {
        let xml = r#"<sm:urlset xmlns:sm="http://www.sitemaps.org/schemas/sitemap/0.9">
            <sm:url><sm:loc>https://example.com/ns</sm:loc></sm:url>
        </sm:urlset>"#;
        let urls = parse_sitemap(xml).unwrap().into_urls().unwrap();
        assert_eq!(urls[0].loc, "https://example.com/ns");
    }
}
