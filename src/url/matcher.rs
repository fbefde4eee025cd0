/// Checks if a URL ends with any of the given suffixes, ignoring ASCII case
///
/// # Examples
///
/// ```
/// use link_ripple::url::ends_with_any;
///
/// let suffixes = vec![".pdf".to_string(), ".jpg".to_string()];
/// assert!(ends_with_any("https://example.com/report.PDF", &suffixes));
/// assert!(!ends_with_any("https://example.com/report.html", &suffixes));
/// ```
pub fn ends_with_any(candidate: &str, suffixes: &[String]) -> bool {
    suffixes.iter().any(|suffix| {
        candidate.len() >= suffix.len()
            && candidate
                .get(candidate.len() - suffix.len()..)
                .is_some_and(|tail| tail.eq_ignore_ascii_case(suffix))
    })
}

/// Checks if a URL contains at least one keyword
///
/// An empty keyword list matches everything. Matching is case-sensitive.
pub fn contains_any(candidate: &str, keywords: &[String]) -> bool {
    keywords.is_empty() || keywords.iter().any(|k| candidate.contains(k.as_str()))
}
