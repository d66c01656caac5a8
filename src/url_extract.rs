//! Pull a video URL out of free-form message text
//!
//! This is a heuristic, not a URL grammar: the first whitespace-separated token
//! that looks like a web address wins, and nothing is fetched to confirm it.

use url::{Host, Url};

/// Characters stripped from both ends of each token
const WRAPPING_CHARS: &[char] = &['<', '>', '(', ')', '[', ']'];

/// Scheme added to tokens written without one
const INFERRED_SCHEME: &str = "https://";

/// Return the first plausible URL in `text`, or `None`
///
/// A token qualifies when it either starts with `http://` / `https://` and
/// parses with a non-empty host, or contains a dot and parses with a
/// domain-like host once `https://` is prepended.
///
/// # Examples
///
/// ```
/// use vidgrab::url_extract::extract_url;
///
/// assert_eq!(
///     extract_url("check this out https://example.com/watch?v=abc123").as_deref(),
///     Some("https://example.com/watch?v=abc123")
/// );
/// assert_eq!(
///     extract_url("example.com/x").as_deref(),
///     Some("https://example.com/x")
/// );
/// assert_eq!(extract_url("no links here"), None);
/// ```
#[must_use]
pub fn extract_url(text: &str) -> Option<String> {
    text.split_whitespace()
        .map(|word| word.trim_matches(WRAPPING_CHARS))
        .find_map(candidate)
}

fn candidate(token: &str) -> Option<String> {
    if token.is_empty() {
        return None;
    }

    if has_explicit_scheme(token) {
        return Url::parse(token)
            .ok()
            .filter(|u| u.host_str().is_some_and(|h| !h.is_empty()))
            .map(|_| token.to_string());
    }

    if !token.contains('.') {
        return None;
    }

    let with_scheme = format!("{}{}", INFERRED_SCHEME, token);
    let parsed = Url::parse(&with_scheme).ok()?;
    match parsed.host() {
        Some(Host::Domain(domain)) if looks_like_domain(domain) => Some(with_scheme),
        _ => None,
    }
}

fn has_explicit_scheme(token: &str) -> bool {
    let lower = token.get(..8).unwrap_or(token).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Every label non-empty, at least two labels, and a final label of two or
/// more characters that is not purely numeric. Rejects "e.g.", "1.5", "a..b".
fn looks_like_domain(domain: &str) -> bool {
    let domain = domain.strip_suffix('.').unwrap_or(domain);
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|l| l.is_empty()) {
        return false;
    }
    labels.last().is_some_and(|tld| {
        tld.chars().count() >= 2 && !tld.chars().all(|c| c.is_ascii_digit())
    })
}
