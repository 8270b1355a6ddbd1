use crate::config::types::{CacheConfig, Config, FetcherConfig, JobConfig, PolitenessConfig, RetryConfig};
use crate::ConfigError;
use reqwest::header::HeaderName;
use url::Url;

/// Slowest accepted rate limit (one call per 1000 seconds)
pub const MIN_CALLS_PER_SECOND: f64 = 0.001;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_fetcher_config(&config.fetcher)?;
    validate_politeness_config(&config.politeness)?;
    if let Some(retry) = &config.retry {
        validate_retry_config(retry)?;
    }
    if let Some(cache) = &config.cache {
        validate_cache_config(cache)?;
    }
    validate_job_config(&config.job)?;
    validate_fields(config)?;
    Ok(())
}

/// Validates fetcher configuration
fn validate_fetcher_config(config: &FetcherConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeout-secs must be >= 1".to_string(),
        ));
    }

    for name in config.headers.keys() {
        if HeaderName::from_bytes(name.as_bytes()).is_err() {
            return Err(ConfigError::Validation(format!(
                "invalid header name '{}'",
                name
            )));
        }
    }

    Ok(())
}

/// Validates politeness configuration
fn validate_politeness_config(config: &PolitenessConfig) -> Result<(), ConfigError> {
    if let Some(rate) = config.calls_per_second {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(ConfigError::Validation(format!(
                "calls-per-second must be > 0, got {}",
                rate
            )));
        }
        if rate < MIN_CALLS_PER_SECOND {
            return Err(ConfigError::Validation(format!(
                "calls-per-second must be >= {}, got {}",
                MIN_CALLS_PER_SECOND, rate
            )));
        }
    }

    if let Some(agent) = &config.robots_agent {
        if agent.trim().is_empty() {
            return Err(ConfigError::Validation(
                "robots-agent cannot be empty".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validates retry configuration
fn validate_retry_config(config: &RetryConfig) -> Result<(), ConfigError> {
    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "max-attempts must be >= 1, got {}",
            config.max_attempts
        )));
    }

    if !config.backoff.is_finite() || config.backoff < 1.0 {
        return Err(ConfigError::Validation(format!(
            "backoff must be >= 1.0, got {}",
            config.backoff
        )));
    }

    Ok(())
}

/// Validates cache configuration
fn validate_cache_config(config: &CacheConfig) -> Result<(), ConfigError> {
    if config.capacity < 1 {
        return Err(ConfigError::Validation(
            "cache capacity must be >= 1".to_string(),
        ));
    }

    if config.max_age_secs == 0 {
        return Err(ConfigError::Validation(
            "max-age-secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates the job section
fn validate_job_config(job: &JobConfig) -> Result<(), ConfigError> {
    match job {
        JobConfig::Pages { urls } => {
            if urls.is_empty() {
                return Err(ConfigError::Validation(
                    "pages job must list at least one URL".to_string(),
                ));
            }
        }
        JobConfig::Paginate {
            next_selector,
            max_pages,
            ..
        } => {
            validate_selector("next-selector", next_selector)?;
            if *max_pages < 1 {
                return Err(ConfigError::Validation(
                    "max-pages must be >= 1".to_string(),
                ));
            }
        }
        JobConfig::ListDetail {
            item_selector,
            link_selector,
            max_items,
            ..
        } => {
            validate_selector("item-selector", item_selector)?;
            validate_selector("link-selector", link_selector)?;
            if *max_items < 1 {
                return Err(ConfigError::Validation(
                    "max-items must be >= 1".to_string(),
                ));
            }
        }
    }

    for url in job.seed_urls() {
        validate_http_url(url)?;
    }

    Ok(())
}

/// Validates the `[[field]]` entries
fn validate_fields(config: &Config) -> Result<(), ConfigError> {
    if config.fields.is_empty() {
        return Err(ConfigError::Validation(
            "at least one [[field]] is required".to_string(),
        ));
    }

    config.selector_config().map_err(ConfigError::Validation)?;

    for field in &config.fields {
        if field.name == "url" || field.name == "page" {
            return Err(ConfigError::Validation(format!(
                "field name '{}' is reserved",
                field.name
            )));
        }
    }

    Ok(())
}

fn validate_selector(label: &str, selector: &str) -> Result<(), ConfigError> {
    scraper::Selector::parse(selector)
        .map(|_| ())
        .map_err(|e| ConfigError::Validation(format!("invalid {} '{}': {}", label, selector, e)))
}

fn validate_http_url(url: &str) -> Result<(), ConfigError> {
    let parsed = Url::parse(url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid URL '{}': {}", url, e)))?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "URL '{}' must use HTTP or HTTPS",
            url
        )));
    }

    Ok(())
}
