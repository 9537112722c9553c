//! URL keys for result deduplication.
//!
//! Two results are the same page when their keys are equal. The key folds
//! is scheme, host and path only: `http` and `https` are folded together,
//! letter case, default ports and trailing slashes are ignored, and the
//! query string and fragment never take part.

use url::Url;

/// Deduplication key for `raw`, or `None` for an empty URL.
///
/// Unparseable URLs fall back to their trimmed, lower-cased text.
///
/// ```
/// use polysearch_core::federated::url_normalize::dedup_key;
///
/// assert_eq!(
///     dedup_key("http://Example.com/a/"),
///     dedup_key("https://example.com/a"),
/// );
/// assert_eq!(dedup_key("   "), None);
/// ```
pub fn dedup_key(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let parsed = match Url::parse(trimmed) {
        Ok(url) if url.has_host() => url,
        _ => return Some(trimmed.to_lowercase()),
    };

    let scheme = match parsed.scheme() {
        "http" | "https" => "web",
        other => other,
    };

    let host = parsed.host_str().unwrap_or_default().to_lowercase();
    let port = match (parsed.scheme(), parsed.port()) {
        ("http", Some(80)) | ("https", Some(443)) | (_, None) => String::new(),
        (_, Some(port)) => format!(":{port}"),
    };

    let mut path = parsed.path().to_lowercase();
    while path.ends_with('/') {
        path.pop();
    }

    Some(format!("{scheme}://{host}{port}{path}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn same(a: &str, b: &str) {
        assert_eq!(dedup_key(a), dedup_key(b), "{a} vs {b}");
    }

    fn different(a: &str, b: &str) {
        assert_ne!(dedup_key(a), dedup_key(b), "{a} vs {b}");
    }

    #[test]
    fn scheme_and_case_are_folded() {
        same("http://Example.com/a/", "https://example.com/a");
        same("HTTPS://EXAMPLE.COM/Path", "https://example.com/path");
    }

    #[test]
    fn default_ports_are_ignored() {
        same("http://example.com:80/x", "https://example.com/x");
        same("https://example.com:443/x", "https://example.com/x");
        different("https://example.com:8080/x", "https://example.com/x");
    }

    #[test]
    fn fragment_and_trailing_slash_are_ignored() {
        same("https://example.com/doc#section-2", "https://example.com/doc/");
        same("https://example.com/", "https://example.com");
    }

    #[test]
    fn query_string_is_not_part_of_identity() {
        same("http://Example.com/a/?id=1", "https://example.com/a?id=2");
        same(
            "https://example.com/s?utm_source=x&b=2",
            "https://example.com/s",
        );
        different("https://example.com/s?a=1", "https://example.com/t?a=1");
    }

    #[test]
    fn unparseable_urls_use_raw_text() {
        assert_eq!(dedup_key("  Not A URL "), Some("not a url".to_string()));
        same("example.com/A", "EXAMPLE.COM/a");
    }

    #[test]
    fn empty_urls_have_no_key() {
        assert_eq!(dedup_key(""), None);
        assert_eq!(dedup_key("  \t"), None);
    }

    #[test]
    fn other_schemes_are_kept_apart() {
        different("ftp://example.com/a", "https://example.com/a");
    }
}
