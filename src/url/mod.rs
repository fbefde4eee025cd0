//! URL handling module for Link-Ripple
//!
//! This module provides href normalization, registrable-domain extraction, and the
//! built-in admission policy applied to every discovered link.

mod domain;
mod matcher;
mod normalize;

use crate::config::CrawlSettings;
use crate::ConfigError;
use regex::{RegexSet, RegexSetBuilder};
use url::Url;

// Re-export main functions
pub use domain::{registrable_domain, same_site};
pub use matcher::{contains_any, ends_with_any};
pub use normalize::{is_web_url, normalize_href, resolve_href};

/// Why a discovered link was turned away by the built-in filters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rejection {
    /// URL ends with a configured escape suffix
    EscapedSuffix,
    /// Keyword filters are configured and none matched
    MissingKeyword,
    /// Host locking is on and the URL is on another registrable domain
    ForeignHost,
    /// An allow-list is configured and no pattern matched
    NotAllowed,
}

/// Outcome of running a link through the admission policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Admission {
    /// All built-in filters passed
    Accepted,
    /// A built-in filter rejected the link
    Rejected(Rejection),
}

impl Admission {
    /// Returns true if the link passed every built-in filter
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}

/// Built-in link filters, compiled once per crawler
#[derive(Debug, Clone)]
pub struct LinkPolicy {
    escape_suffixes: Vec<String>,
    href_keywords: Vec<String>,
    lock_host: bool,
    allow_list: Option<RegexSet>,
}

impl LinkPolicy {
    /// Builds the policy from crawl settings
    ///
    /// # Returns
    ///
    /// * `Ok(LinkPolicy)` - Compiled policy
    /// * `Err(ConfigError)` - An allow-list pattern failed to compile
    pub fn from_settings(settings: &CrawlSettings) -> Result<Self, ConfigError> {
        let allow_list = if settings.allow_patterns.is_empty() {
            None
        } else {
            let set = RegexSetBuilder::new(&settings.allow_patterns)
                .case_insensitive(true)
                .build()
                .map_err(|e| ConfigError::InvalidPattern(e.to_string()))?;
            Some(set)
        };

        Ok(Self {
            escape_suffixes: settings.escape_suffixes.clone(),
            href_keywords: settings.href_keywords.clone(),
            lock_host: settings.lock_host,
            allow_list,
        })
    }

    /// Runs a candidate link through the filters, in order
    ///
    /// 1. Escape suffix
    /// 2. Keywords
    /// 3. Host lock (compared against the page the link was found on)
    /// 4. Allow-list
    ///
    /// # Examples
    ///
    /// ```
    /// use link_ripple::config::CrawlSettings;
    /// use link_ripple::url::{Admission, LinkPolicy, Rejection};
    /// use url::Url;
    ///
    /// let settings = CrawlSettings {
    ///     escape_suffixes: vec![".pdf".to_string()],
    ///     ..CrawlSettings::default()
    /// };
    /// let policy = LinkPolicy::from_settings(&settings).unwrap();
    /// let page = Url::parse("https://www.example.com/").unwrap();
    ///
    /// let report = Url::parse("https://www.example.com/report.pdf").unwrap();
    /// assert_eq!(policy.check(&report, &page), Admission::Rejected(Rejection::EscapedSuffix));
    /// ```
    pub fn check(&self, candidate: &Url, page: &Url) -> Admission {
        let candidate_str = candidate.as_str();

        if ends_with_any(candidate_str, &self.escape_suffixes) {
            return Admission::Rejected(Rejection::EscapedSuffix);
        }

        if !contains_any(candidate_str, &self.href_keywords) {
            return Admission::Rejected(Rejection::MissingKeyword);
        }

        if self.lock_host && !same_site(page, candidate) {
            return Admission::Rejected(Rejection::ForeignHost);
        }

        if let Some(allow_list) = &self.allow_list {
            if !allow_list.is_match(candidate_str) {
                return Admission::Rejected(Rejection::NotAllowed);
            }
        }

        Admission::Accepted
    }
}
