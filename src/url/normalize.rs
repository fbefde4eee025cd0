use regex::Regex;
use std::sync::OnceLock;
use url::Url;

/// Href prefixes that never lead to a crawlable page
const EXCLUDED_PREFIXES: &[&str] = &["mailto:", "tel:", "javascript:"];

/// Escaped sequences decoded in hrefs before resolution
const DECODED_SEQUENCES: &[(&str, &str)] = &[("%3f", "?"), ("%3d", "="), ("%2f", "/"), ("&amp;", "&")];

/// Shape a seed must have to be accepted
const WEB_URL_PATTERN: &str = r"(?i)^(http|https)://([\w-]+\.)+[\w-]+(/[\w\- ./?%&=]*)?";

/// Cleans a raw href before it is resolved against its page
///
/// # Normalization Steps
///
/// 1. Trim surrounding whitespace
/// 2. Decode `%3f`, `%3d`, `%2f` and unescape `&amp;`
/// 3. Reject empty hrefs, fragment-only hrefs, and `mailto:`, `tel:`,
///    `javascript:` hrefs (case-insensitive)
///
/// # Examples
///
/// ```
/// use link_ripple::url::normalize_href;
///
/// assert_eq!(normalize_href("/a%3fb%3dc"), Some("/a?b=c".to_string()));
/// assert_eq!(normalize_href("#top"), None);
/// assert_eq!(normalize_href("MAILTO:a@b.com"), None);
/// ```
pub fn normalize_href(href: &str) -> Option<String> {
    let mut cleaned = href.trim().to_string();
    for (escaped, plain) in DECODED_SEQUENCES {
        if cleaned.contains(escaped) {
            cleaned = cleaned.replace(escaped, plain);
        }
    }

    if cleaned.is_empty() || cleaned.starts_with('#') {
        return None;
    }

    let lowered = cleaned.to_ascii_lowercase();
    if EXCLUDED_PREFIXES
        .iter()
        .any(|prefix| lowered.starts_with(prefix))
    {
        return None;
    }

    Some(cleaned)
}

/// Resolves a cleaned href against the page it was found on
///
/// Returns None if the result is not a valid http(s) URL.
pub fn resolve_href(base: &Url, href: &str) -> Option<Url> {
    let resolved = base.join(href).ok()?;

    match resolved.scheme() {
        "http" | "https" => Some(resolved),
        _ => None,
    }
}

/// Returns true if a seed address looks like an http(s) URL with a dotted host
///
/// # Examples
///
/// ```
/// use link_ripple::url::is_web_url;
///
/// assert!(is_web_url("https://www.example.com/start"));
/// assert!(!is_web_url("ftp://example.com/"));
/// assert!(!is_web_url("example.com"));
/// ```
pub fn is_web_url(seed: &str) -> bool {
    static WEB_URL: OnceLock<Option<Regex>> = OnceLock::new();

    WEB_URL
        .get_or_init(|| Regex::new(WEB_URL_PATTERN).ok())
        .as_ref()
        .is_some_and(|re| re.is_match(seed))
}
