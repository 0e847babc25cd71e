//! HTML link extraction
//!
//! Parses page content and resolves anchors to absolute URLs against the
//! page's own URL. Extraction is deliberately infallible: malformed HTML
//! yields whatever links the parser can salvage, possibly none.

use scraper::{Html, Selector};
use url::Url;

/// Extracts all followable links from an HTML document
///
/// **Included:** `<a href="...">` anchors, resolved against `base_url`.
///
/// **Excluded:**
/// - `javascript:`, `mailto:`, `tel:` and `data:` hrefs
/// - fragment-only anchors (`#section`)
/// - anchors carrying the `download` attribute
/// - anything that does not resolve to an http(s) URL
pub fn extract_links(html: &str, base_url: &Url) -> Vec<Url> {
    let document = Html::parse_document(html);
    let mut links = Vec::new();

    // The selector literal is valid; parse can only fail on a typo here.
    let anchor_selector = match Selector::parse("a[href]") {
        Ok(s) => s,
        Err(_) => return links,
    };

    for element in document.select(&anchor_selector) {
        if element.value().attr("download").is_some() {
            continue;
        }

        if let Some(href) = element.value().attr("href") {
            if let Some(resolved) = resolve_link(href, base_url) {
                links.push(resolved);
            }
        }
    }

    links
}

/// Resolves an href to an absolute http(s) URL, or None if it should be skipped
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute) if absolute.scheme() == "http" || absolute.scheme() == "https" => {
            Some(absolute)
        }
        _ => None,
    }
}
