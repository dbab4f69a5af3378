use url::Url;

/// Resolves an href found in page markup to an absolute HTTP(S) URL
///
/// Returns None if the link should be ignored:
/// - empty or fragment-only hrefs
/// - javascript:, mailto:, tel: schemes and data: URIs
/// - hrefs that do not resolve to an HTTP(S) URL
///
/// # Examples
///
/// ```
/// use job_trawler::url::resolve_href;
/// use url::Url;
///
/// let base = Url::parse("https://remoteok.com/remote-dev-jobs").unwrap();
/// assert_eq!(
///     resolve_href("/remote-jobs/123", &base).as_deref(),
///     Some("https://remoteok.com/remote-jobs/123")
/// );
/// assert_eq!(resolve_href("mailto:jobs@example.com", &base), None);
/// ```
pub fn resolve_href(href: &str, base_url: &Url) -> Option<String> {
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
        Ok(absolute_url)
            if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" =>
        {
            Some(absolute_url.to_string())
        }
        _ => None,
    }
}
