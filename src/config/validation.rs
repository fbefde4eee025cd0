use crate::config::types::{Config, CrawlSettings, OutputConfig, SinkKind};
use crate::ConfigError;
use reqwest::header::HeaderValue;

/// Largest supported worker pool
const MAX_THREADS: u16 = 256;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_settings(&config.crawler)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawl settings
///
/// Seeds are deliberately not checked here: malformed seeds are dropped when the
/// crawl starts.
pub fn validate_settings(settings: &CrawlSettings) -> Result<(), ConfigError> {
    if settings.threads < 1 || settings.threads > MAX_THREADS {
        return Err(ConfigError::Validation(format!(
            "threads must be between 1 and {}, got {}",
            MAX_THREADS, settings.threads
        )));
    }

    if settings.user_agent.is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if HeaderValue::from_str(&settings.user_agent).is_err() {
        return Err(ConfigError::Validation(format!(
            "user-agent contains characters not allowed in a header: '{}'",
            settings.user_agent
        )));
    }

    if encoding_rs::Encoding::for_label(settings.fallback_charset.trim().as_bytes()).is_none() {
        return Err(ConfigError::Validation(format!(
            "unknown fallback-charset '{}'",
            settings.fallback_charset
        )));
    }

    if settings.escape_suffixes.iter().any(|s| s.is_empty()) {
        return Err(ConfigError::Validation(
            "escape-suffixes cannot contain empty entries".to_string(),
        ));
    }

    if settings.href_keywords.iter().any(|k| k.is_empty()) {
        return Err(ConfigError::Validation(
            "href-keywords cannot contain empty entries".to_string(),
        ));
    }

    for pattern in &settings.allow_patterns {
        validate_pattern(pattern)?;
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if matches!(config.sink, SinkKind::File | SinkKind::Sqlite)
        && config.path.as_deref().map_or(true, str::is_empty)
    {
        return Err(ConfigError::Validation(format!(
            "output path is required for the {:?} sink",
            config.sink
        )));
    }

    if config.max_links < 1 {
        return Err(ConfigError::Validation(format!(
            "max-links must be >= 1, got {}",
            config.max_links
        )));
    }

    if !(0.0..1.0).contains(&config.error_rate) {
        return Err(ConfigError::Validation(format!(
            "error-rate must be in [0, 1), got {}",
            config.error_rate
        )));
    }

    Ok(())
}

/// Validates an allow-list regular expression
fn validate_pattern(pattern: &str) -> Result<(), ConfigError> {
    if pattern.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "allow pattern cannot be empty".to_string(),
        ));
    }

    regex::Regex::new(pattern)
        .map_err(|e| ConfigError::InvalidPattern(format!("'{}': {}", pattern, e)))?;

    Ok(())
}
