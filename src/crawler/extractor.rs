//! HTML extraction of SEO-relevant page structure
//!
//! This module turns raw markup into a [`PageData`] record:
//! - Page title and meta description
//! - H1 and H2 headings in document order
//! - Images with their alt text
//! - Links, resolved, deduplicated by normalized form and split internal/external
//!
//! Extraction never fails. Anything missing from the markup shows up as an
//! absent or empty field.

use crate::crawler::types::{ImageInfo, PageData};
use crate::url::{is_same_host, normalize_link};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Parses HTML content and extracts SEO data
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` resolving to an `http`/`https` URL
///
/// **Exclude:**
/// - Fragment-only hrefs (`#top`)
/// - `javascript:`, `mailto:`, `tel:`, `data:` targets
///
/// Relative URLs resolve against `<base href>` when the document has a valid
/// one, otherwise against `base_url`. Links on exactly the host of `base_url`
/// are internal; everything else, subdomains included, is external.
///
/// The returned record has no fetch metrics yet; see
/// [`PageData::with_fetch_metrics`].
///
/// # Example
///
/// ```
/// use site_sage::crawler::extract;
/// use url::Url;
///
/// let html = r#"<html><head><title>Test</title></head><body><a href="/page">Link</a></body></html>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let page = extract(html, &base_url);
/// assert_eq!(page.title, Some("Test".to_string()));
/// assert_eq!(page.internal_links, vec!["https://example.com/page".to_string()]);
/// ```
pub fn extract(html: &str, base_url: &Url) -> PageData {
    let document = Html::parse_document(html);
    let base = document_base(&document, base_url);
    let host = base_url.host_str().unwrap_or_default().to_string();

    let (internal_links, external_links) = extract_links(&document, &base, &host);

    PageData {
        url: base_url.to_string(),
        title: extract_title(&document),
        meta_description: extract_meta_description(&document),
        h1_tags: extract_headings(&document, "h1"),
        h2_tags: extract_headings(&document, "h2"),
        images: extract_images(&document, &base),
        internal_links,
        external_links,
        load_time_seconds: 0.0,
        page_size_bytes: html.len(),
    }
}

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Resolution base: a valid `<base href>` wins over the fetch URL
fn document_base(document: &Html, base_url: &Url) -> Url {
    selector("base[href]")
        .and_then(|sel| {
            document
                .select(&sel)
                .next()
                .and_then(|element| element.value().attr("href"))
                .and_then(|href| base_url.join(href.trim()).ok())
        })
        .filter(|url| matches!(url.scheme(), "http" | "https"))
        .unwrap_or_else(|| base_url.clone())
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> Option<String> {
    let title_selector = selector("title")?;

    document
        .select(&title_selector)
        .next()
        .map(element_text)
        .filter(|s| !s.is_empty())
}

/// Extracts the meta description, falling back to `og:description`
fn extract_meta_description(document: &Html) -> Option<String> {
    let meta_selector = selector("meta")?;

    let content_of = |attr: &str, expected: &str| {
        document
            .select(&meta_selector)
            .find(|element| {
                element
                    .value()
                    .attr(attr)
                    .map(|value| value.trim().eq_ignore_ascii_case(expected))
                    .unwrap_or(false)
            })
            .map(|element| {
                element
                    .value()
                    .attr("content")
                    .unwrap_or_default()
                    .trim()
                    .to_string()
            })
    };

    content_of("name", "description")
        .or_else(|| content_of("property", "og:description"))
        .filter(|s| !s.is_empty())
}

/// Extracts non-empty heading texts for one heading level
fn extract_headings(document: &Html, tag: &str) -> Vec<String> {
    let Some(heading_selector) = selector(tag) else {
        return Vec::new();
    };

    document
        .select(&heading_selector)
        .map(element_text)
        .filter(|text| !text.is_empty())
        .collect()
}

/// Extracts every image that has a `src`
fn extract_images(document: &Html, base: &Url) -> Vec<ImageInfo> {
    let Some(img_selector) = selector("img") else {
        return Vec::new();
    };

    document
        .select(&img_selector)
        .filter_map(|element| {
            let src = element.value().attr("src")?.trim();
            if src.is_empty() {
                return None;
            }

            let src = base
                .join(src)
                .map(|url| url.to_string())
                .unwrap_or_else(|_| src.to_string());
            let alt = element
                .value()
                .attr("alt")
                .map(str::trim)
                .unwrap_or_default()
                .to_string();

            Some(ImageInfo { src, alt })
        })
        .collect()
}

/// Extracts links as `(internal, external)`, each deduplicated in first-seen order
fn extract_links(document: &Html, base: &Url, host: &str) -> (Vec<String>, Vec<String>) {
    let mut internal = Vec::new();
    let mut external = Vec::new();
    let mut seen = HashSet::new();

    let Some(a_selector) = selector("a[href]") else {
        return (internal, external);
    };

    for element in document.select(&a_selector) {
        let Some(mut url) = element
            .value()
            .attr("href")
            .and_then(|href| resolve_link(href, base))
        else {
            continue;
        };

        if !seen.insert(normalize_link(&url)) {
            continue;
        }

        // The first-seen form is what gets probed, so its path stays as written
        url.set_fragment(None);
        if is_same_host(&url, host) {
            internal.push(url.to_string());
        } else {
            external.push(url.to_string());
        }
    }

    (internal, external)
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Fragment-only hrefs
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lowered.starts_with(scheme))
    {
        return None;
    }

    base.join(href)
        .ok()
        .filter(|url| matches!(url.scheme(), "http" | "https"))
}
