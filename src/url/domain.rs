use std::net::IpAddr;
use url::Url;

/// Returns the registrable part of a host: the host minus its leftmost label
///
/// Hosts with two labels or fewer are returned unchanged, as are IP addresses, so
/// that `example.com` and `other.com` never collapse to the same `com`.
///
/// # Examples
///
/// ```
/// use link_ripple::url::registrable_domain;
///
/// assert_eq!(registrable_domain("www.example.com"), "example.com");
/// assert_eq!(registrable_domain("shop.example.com"), "example.com");
/// assert_eq!(registrable_domain("example.com"), "example.com");
/// ```
pub fn registrable_domain(host: &str) -> String {
    let host = host.trim_end_matches('.').to_lowercase();

    let bare = host.trim_start_matches('[').trim_end_matches(']');
    if bare.parse::<IpAddr>().is_ok() {
        return host;
    }

    match host.split_once('.') {
        Some((_, rest)) if rest.contains('.') => rest.to_string(),
        _ => host,
    }
}

/// Returns true if both URLs share a registrable domain
pub fn same_site(a: &Url, b: &Url) -> bool {
    match (a.host_str(), b.host_str()) {
        (Some(a), Some(b)) => registrable_domain(a) == registrable_domain(b),
        _ => false,
    }
}
