use url::Url;

/// Produces the deduplication key for a link
///
/// # Normalization Steps
///
/// 1. Scheme and host are lowercased (done by URL parsing)
/// 2. Default ports are dropped (done by URL parsing)
/// 3. Remove fragment (everything after #)
/// 4. Remove trailing slash from the path, except for the root `/`
///
/// Path case and the query string are preserved as-is.
///
/// # Examples
///
/// ```
/// use site_sage::url::normalize_link;
/// use url::Url;
///
/// let a = normalize_link(&Url::parse("http://Example.com/a").unwrap());
/// let b = normalize_link(&Url::parse("http://example.com/a/").unwrap());
/// assert_eq!(a, b);
/// assert_eq!(a, "http://example.com/a");
/// ```
pub fn normalize_link(url: &Url) -> String {
    let mut url = url.clone();
    url.set_fragment(None);

    let path = url.path();
    if path.len() > 1 && path.ends_with('/') {
        let trimmed = path.trim_end_matches('/');
        let trimmed = if trimmed.is_empty() { "/" } else { trimmed };
        let trimmed = trimmed.to_string();
        url.set_path(&trimmed);
    }

    url.to_string()
}
