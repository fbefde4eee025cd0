//! Link extraction from decoded HTML
//!
//! Anchors are collected with scraper, deduplicated per page by their raw `href`
//! value (the last anchor text wins), then normalized and resolved against the page
//! URL. Malformed markup never fails: html5ever recovers, and anything it cannot
//! make sense of simply yields no links.

use crate::url::{normalize_href, resolve_href};
use scraper::{Html, Selector};
use std::collections::HashMap;
use url::Url;

/// An outbound link found on a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedLink {
    /// Absolute http(s) URL
    pub url: Url,

    /// Text inside the anchor, nested tags stripped and whitespace collapsed
    pub anchor_text: String,
}

/// Collects `(href, anchor text)` pairs from every `<a href>` in the document
///
/// Hrefs are returned verbatim, in order of first appearance. When the same href
/// appears more than once the text of the last occurrence is kept.
pub fn extract_anchors(html: &str) -> Vec<(String, String)> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let mut anchors: Vec<(String, String)> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for element in document.select(&selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let text = element
            .text()
            .flat_map(str::split_whitespace)
            .collect::<Vec<_>>()
            .join(" ");

        match positions.get(href) {
            Some(&index) => anchors[index].1 = text,
            None => {
                positions.insert(href.to_string(), anchors.len());
                anchors.push((href.to_string(), text));
            }
        }
    }

    anchors
}

/// Extracts the crawlable links of a page
///
/// # Arguments
///
/// * `html` - The decoded page content
/// * `base_url` - The URL the page was served from
///
/// # Example
///
/// ```
/// use link_ripple::crawler::extract_links;
/// use url::Url;
///
/// let html = r#"<a href="/a%3fb%3dc">Query</a> <a href="mailto:a@b.com">Mail</a>"#;
/// let base = Url::parse("https://x.test/p").unwrap();
/// let links = extract_links(html, &base);
///
/// assert_eq!(links.len(), 1);
/// assert_eq!(links[0].url.as_str(), "https://x.test/a?b=c");
/// assert_eq!(links[0].anchor_text, "Query");
/// ```
pub fn extract_links(html: &str, base_url: &Url) -> Vec<ExtractedLink> {
    extract_anchors(html)
        .into_iter()
        .filter_map(|(href, anchor_text)| {
            let normalized = normalize_href(&href)?;
            let url = resolve_href(base_url, &normalized)?;
            Some(ExtractedLink { url, anchor_text })
        })
        .collect()
}
