use url::Url;

/// Extracts the lowercase host from a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use leadscout::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Returns the key used for per-host bookkeeping (rate limits, robots policy)
///
/// Non-default ports are part of the key: two servers on the same machine are
/// separate hosts for politeness purposes.
pub fn host_key(url: &Url) -> Option<String> {
    let host = extract_domain(url)?;
    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host,
    })
}

/// Returns `scheme://host[:port]` for a URL
///
/// Used as the lead's website and as the base for `/robots.txt`.
pub fn origin_of(url: &Url) -> Option<String> {
    let host = host_key(url)?;
    Some(format!("{}://{}", url.scheme(), host))
}
