// src/utils/url.rs

//! URL manipulation utilities.

use url::Url;

/// Resolve a potentially relative URL against a base URL.
///
/// Absolute URLs pass through untouched; anything the base cannot join is
/// returned as-is.
///
/// # Examples
/// ```
/// use hn_archiver::utils::url::resolve;
///
/// assert_eq!(
///     resolve("https://news.ycombinator.com/", "item?id=1"),
///     "https://news.ycombinator.com/item?id=1"
/// );
/// ```
pub fn resolve(base: &str, href: &str) -> String {
    if Url::parse(href).is_ok() {
        return href.to_string();
    }

    Url::parse(base)
        .and_then(|base| base.join(href))
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// Whether the URL uses an `http://` or `https://` scheme.
pub fn is_valid_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Whether the URL ends with one of the ignored suffixes.
pub fn is_ignored(url: &str, ignored: &[String]) -> bool {
    ignored
        .iter()
        .any(|suffix| !suffix.is_empty() && url.ends_with(suffix.as_str()))
}

/// Extract the numeric discussion thread id from a URL.
///
/// Looks at the `id` query parameter first, then falls back to the digits
/// of the last path segment.
pub fn extract_thread_id(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;

    for (key, value) in parsed.query_pairs() {
        if key == "id" && !value.is_empty() && value.chars().all(|c| c.is_ascii_digit()) {
            return Some(value.into_owned());
        }
    }

    let last = parsed.path_segments().and_then(|mut segments| segments.next_back())?;
    if !last.is_empty() && last.chars().all(|c| c.is_ascii_digit()) {
        return Some(last.to_string());
    }

    None
}
