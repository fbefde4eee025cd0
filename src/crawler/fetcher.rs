//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the shared HTTP client (user agent, timeout, cookie jar)
//! - GET requests with gzip negotiation
//! - Inflating gzip bodies
//! - Resolving the text encoding of a response body
//! - Error classification

use crate::config::CrawlSettings;
use encoding_rs::Encoding;
use flate2::read::GzDecoder;
use regex::Regex;
use reqwest::cookie::Jar;
use reqwest::header::{HeaderMap, ACCEPT_ENCODING, CONTENT_ENCODING, CONTENT_TYPE, SET_COOKIE};
use reqwest::{redirect::Policy, Client};
use std::io::Read;
use std::sync::{Arc, OnceLock};
use thiserror::Error;
use url::Url;

/// Redirect hops followed before a fetch is treated as a transport failure
const MAX_REDIRECTS: usize = 10;

/// Matches an embedded charset declaration in the raw markup
const META_CHARSET_PATTERN: &str = r#"(?i)<meta([^<]*)charset=([^<]*)""#;

/// Per-item fetch failures
///
/// None of these abort a crawl: the offending URL is reported and dropped.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request to {url} timed out")]
    Timeout { url: String },

    #[error("Transport failure for {url}: {message}")]
    Transport { url: String, message: String },

    #[error("{url} answered with HTTP {status}")]
    NonSuccessStatus { url: String, status: u16 },

    #[error("Failed to decode body of {url}: {message}")]
    Decode { url: String, message: String },

    #[error("Fetch of {url} was cancelled")]
    Cancelled { url: String },
}

impl FetchError {
    /// The URL the failed request was made for
    pub fn url(&self) -> &str {
        match self {
            Self::Timeout { url }
            | Self::Transport { url, .. }
            | Self::NonSuccessStatus { url, .. }
            | Self::Decode { url, .. }
            | Self::Cancelled { url } => url,
        }
    }

    /// Returns true if the fetch was abandoned because the crawl stopped
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    fn from_reqwest(url: &str, error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout {
                url: url.to_string(),
            }
        } else {
            Self::Transport {
                url: url.to_string(),
                message: error.to_string(),
            }
        }
    }
}

/// A successful response, before the body is turned into text
#[derive(Debug, Clone)]
pub struct FetchedResponse {
    /// Raw body bytes as received
    pub body: Vec<u8>,

    /// Content-Encoding header value, if any
    pub content_encoding: Option<String>,

    /// Charset from the Content-Type header, if any
    pub declared_charset: Option<String>,

    /// Final URL after redirects
    pub response_url: Url,

    /// Every Set-Cookie header on the final response
    pub set_cookies: Vec<String>,
}

impl FetchedResponse {
    /// Returns true if the server declared a gzip content-encoding
    pub fn is_gzip(&self) -> bool {
        self.content_encoding
            .as_deref()
            .is_some_and(|encoding| encoding.to_ascii_lowercase().contains("gzip"))
    }

    /// Inflates the body if needed and decodes it to text
    ///
    /// # Arguments
    ///
    /// * `fallback` - Single-byte codepage used for sniffing and as the last resort
    pub fn into_text(self, fallback: &'static Encoding) -> Result<String, FetchError> {
        let bytes = if self.is_gzip() {
            inflate_gzip(&self.body).map_err(|e| FetchError::Decode {
                url: self.response_url.to_string(),
                message: e.to_string(),
            })?
        } else {
            self.body
        };

        Ok(decode_body(
            &bytes,
            self.declared_charset.as_deref(),
            fallback,
        ))
    }
}

/// Builds the HTTP client shared by every worker of a crawl
///
/// # Arguments
///
/// * `settings` - Crawl settings (user agent and timeout)
/// * `cookie_jar` - Shared jar, attached when cookie retention is on
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use link_ripple::config::CrawlSettings;
/// use link_ripple::crawler::build_http_client;
/// use reqwest::cookie::Jar;
/// use std::sync::Arc;
///
/// let settings = CrawlSettings::default();
/// let client = build_http_client(&settings, Some(Arc::new(Jar::default()))).unwrap();
/// ```
pub fn build_http_client(
    settings: &CrawlSettings,
    cookie_jar: Option<Arc<Jar>>,
) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder()
        .user_agent(settings.user_agent.as_str())
        .redirect(Policy::limited(MAX_REDIRECTS));

    if let Some(timeout) = settings.timeout() {
        builder = builder.timeout(timeout);
    }

    if let Some(jar) = cookie_jar {
        builder = builder.cookie_provider(jar);
    }

    builder.build()
}

/// Fetches a URL with a single GET request
///
/// Redirects are followed by the client. The body is returned untouched; call
/// [`FetchedResponse::into_text`] to inflate and decode it.
///
/// # Errors
///
/// | Condition | Error |
/// |-----------|-------|
/// | Client timeout elapsed | `Timeout` |
/// | DNS, connect, TLS, redirect limit, body read | `Transport` |
/// | Status outside 2xx | `NonSuccessStatus` |
pub async fn fetch_page(client: &Client, url: &str) -> Result<FetchedResponse, FetchError> {
    let response = client
        .get(url)
        .header(ACCEPT_ENCODING, "gzip")
        .send()
        .await
        .map_err(|e| FetchError::from_reqwest(url, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::NonSuccessStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let headers = response.headers();
    let content_encoding = header_string(headers, CONTENT_ENCODING);
    let declared_charset =
        header_string(headers, CONTENT_TYPE).and_then(|ct| charset_from_content_type(&ct));
    let set_cookies = headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .map(str::to_string)
        .collect();
    let response_url = response.url().clone();

    let body = response
        .bytes()
        .await
        .map_err(|e| FetchError::from_reqwest(url, e))?
        .to_vec();

    Ok(FetchedResponse {
        body,
        content_encoding,
        declared_charset,
        response_url,
        set_cookies,
    })
}

fn header_string(headers: &HeaderMap, name: reqwest::header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

/// Inflates a gzip-compressed body
pub fn inflate_gzip(bytes: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(bytes);
    let mut inflated = Vec::new();
    decoder.read_to_end(&mut inflated)?;
    Ok(inflated)
}

/// Extracts the charset parameter from a Content-Type header value
///
/// ```
/// use link_ripple::crawler::charset_from_content_type;
///
/// assert_eq!(
///     charset_from_content_type("text/html; charset=\"UTF-8\""),
///     Some("UTF-8".to_string())
/// );
/// assert_eq!(charset_from_content_type("text/html"), None);
/// ```
pub fn charset_from_content_type(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        if !key.trim().eq_ignore_ascii_case("charset") {
            return None;
        }
        let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
        (!value.is_empty()).then(|| value.to_string())
    })
}

/// Finds a `<meta ... charset=...>` declaration in decoded markup
///
/// The captured value is cut at the first space and stripped of quotes, so both
/// `<meta charset="gbk">` and the http-equiv form yield a bare label.
pub fn sniff_meta_charset(markup: &str) -> Option<String> {
    static META_CHARSET: OnceLock<Option<Regex>> = OnceLock::new();

    let re = META_CHARSET
        .get_or_init(|| Regex::new(META_CHARSET_PATTERN).ok())
        .as_ref()?;
    let captured = re.captures(markup)?.get(2)?.as_str();

    let label: String = captured
        .split(' ')
        .next()
        .unwrap_or_default()
        .chars()
        .filter(|c| *c != '"' && *c != '\'')
        .collect();

    (!label.is_empty()).then_some(label)
}

/// Decodes a response body to text
///
/// Resolution order:
/// 1. A `<meta charset>` found after decoding with the fallback codepage
/// 2. The charset from the Content-Type header
/// 3. The fallback codepage
///
/// Labels unknown to the encoding registry are skipped.
pub fn decode_body(
    bytes: &[u8],
    header_charset: Option<&str>,
    fallback: &'static Encoding,
) -> String {
    let (sniffed, _, _) = fallback.decode(bytes);

    let encoding = sniff_meta_charset(&sniffed)
        .and_then(|label| Encoding::for_label(label.trim().as_bytes()))
        .or_else(|| header_charset.and_then(|label| Encoding::for_label(label.trim().as_bytes())))
        .unwrap_or(fallback);

    if encoding == fallback {
        return sniffed.into_owned();
    }

    tracing::trace!("Decoding body as {}", encoding.name());
    let (text, _, _) = encoding.decode(bytes);
    text.into_owned()
}
