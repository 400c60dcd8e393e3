use crate::{UrlError, UrlResult};
use std::fmt;
use url::Url;

/// Canonical identity of a crawl unit.
///
/// Two URLs with the same key are the same unit. The key is
/// scheme + lowercased host + path, with the fragment always dropped and the
/// query string either preserved verbatim or dropped per configuration.
/// Differently-ordered query strings are distinct keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UrlKey(String);

impl UrlKey {
    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UrlKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Canonicalizes a URL into its key form.
///
/// Steps:
/// 1. Reject non-HTTP(S) schemes
/// 2. Lowercase the host
/// 3. Drop the fragment
/// 4. Drop the query string when `ignore_query` is set
///
/// Unlike a live-site crawler this deliberately does NOT upgrade http to
/// https or re-order query parameters: the canonical form must round-trip
/// into the archive's capture index, which stores originals verbatim.
pub fn canonicalize(url: &Url, ignore_query: bool) -> UrlResult<(Url, UrlKey)> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    let mut canonical = url.clone();

    let host = url.host_str().ok_or(UrlError::MissingHost)?.to_lowercase();
    canonical
        .set_host(Some(&host))
        .map_err(|e| UrlError::Parse(e.to_string()))?;

    canonical.set_fragment(None);

    if ignore_query {
        canonical.set_query(None);
    }

    let key = UrlKey(canonical.as_str().to_string());
    Ok((canonical, key))
}

/// Resolves a reference found in a document against the page's own URL.
///
/// Returns `None` for references that can never become crawl units:
/// pseudo-scheme links (`javascript:`, `mailto:`, `tel:`, `data:`),
/// fragment-only anchors, empty hrefs, and anything that does not resolve to
/// an HTTP(S) URL.
pub fn resolve_reference(href: &str, base: &Url) -> Option<Url> {
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

    match base.join(href) {
        Ok(resolved) => {
            if resolved.scheme() == "http" || resolved.scheme() == "https" {
                Some(resolved)
            } else {
                None
            }
        }
        Err(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_of(url: &str, ignore_query: bool) -> String {
        let parsed = Url::parse(url).unwrap();
        let (_, key) = canonicalize(&parsed, ignore_query).unwrap();
        key.as_str().to_string()
    }

    #[test]
    fn test_lowercase_host() {
        assert_eq!(
            key_of("https://EXAMPLE.ORG/Page", false),
            "https://example.org/Page"
        );
    }

    #[test]
    fn test_fragment_always_dropped() {
        assert_eq!(
            key_of("https://example.org/page#section", false),
            "https://example.org/page"
        );
    }

    #[test]
    fn test_query_preserved_by_default() {
        assert_eq!(
            key_of("https://example.org/page?b=2&a=1", false),
            "https://example.org/page?b=2&a=1"
        );
    }

    #[test]
    fn test_query_dropped_when_ignored() {
        assert_eq!(
            key_of("https://example.org/page?b=2&a=1", true),
            "https://example.org/page"
        );
    }

    #[test]
    fn test_query_order_distinct_keys() {
        assert_ne!(
            key_of("https://example.org/p?a=1&b=2", false),
            key_of("https://example.org/p?b=2&a=1", false)
        );
    }

    #[test]
    fn test_http_not_upgraded() {
        assert_eq!(
            key_of("http://example.org/", false),
            "http://example.org/"
        );
    }

    #[test]
    fn test_invalid_scheme_rejected() {
        let url = Url::parse("ftp://example.org/file").unwrap();
        let result = canonicalize(&url, false);
        assert!(matches!(result, Err(UrlError::InvalidScheme(_))));
    }

    #[test]
    fn test_resolve_relative_reference() {
        let base = Url::parse("https://example.org/docs/page.html").unwrap();
        let resolved = resolve_reference("../style.css", &base).unwrap();
        assert_eq!(resolved.as_str(), "https://example.org/style.css");
    }

    #[test]
    fn test_resolve_absolute_reference() {
        let base = Url::parse("https://example.org/").unwrap();
        let resolved = resolve_reference("https://other.com/page", &base).unwrap();
        assert_eq!(resolved.as_str(), "https://other.com/page");
    }

    #[test]
    fn test_resolve_skips_pseudo_schemes() {
        let base = Url::parse("https://example.org/").unwrap();
        assert!(resolve_reference("javascript:void(0)", &base).is_none());
        assert!(resolve_reference("mailto:a@b.org", &base).is_none());
        assert!(resolve_reference("tel:+1555", &base).is_none());
        assert!(resolve_reference("data:text/plain,hi", &base).is_none());
    }

    #[test]
    fn test_resolve_skips_fragment_only() {
        let base = Url::parse("https://example.org/page").unwrap();
        assert!(resolve_reference("#top", &base).is_none());
    }

    #[test]
    fn test_resolve_skips_empty() {
        let base = Url::parse("https://example.org/page").unwrap();
        assert!(resolve_reference("   ", &base).is_none());
    }
}
