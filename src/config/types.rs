use crate::crawler::RetryPolicy;
use crate::extract::{FieldSpec, SelectorConfig};
use crate::robots::RobotsPrecedence;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// User agent sent when none is configured
pub const DEFAULT_USER_AGENT: &str = "SumiHarvest/0.1 (+https://github.com/sumi-harvest)";

/// Main configuration structure for Sumi-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub fetcher: FetcherConfig,
    #[serde(default)]
    pub politeness: PolitenessConfig,
    /// Retry is opt-in: absent means every page gets a single attempt
    #[serde(default)]
    pub retry: Option<RetryConfig>,
    /// Caching is opt-in
    #[serde(default)]
    pub cache: Option<CacheConfig>,
    #[serde(default)]
    pub output: OutputConfig,
    pub job: JobConfig,
    #[serde(default, rename = "field")]
    pub fields: Vec<FieldSpec>,
}

impl Config {
    /// Creates a configuration with defaults for everything but the job and fields
    pub fn new(job: JobConfig, fields: Vec<FieldSpec>) -> Self {
        Self {
            fetcher: FetcherConfig::default(),
            politeness: PolitenessConfig::default(),
            retry: None,
            cache: None,
            output: OutputConfig::default(),
            job,
            fields,
        }
    }

    /// Builds the selector configuration from the `[[field]]` entries
    pub fn selector_config(&self) -> Result<SelectorConfig, String> {
        SelectorConfig::from_fields(self.fields.clone())
    }

    /// Agent token used for robots.txt group selection
    ///
    /// Uses `robots-agent` when set, otherwise the product token of the
    /// user agent (`SumiHarvest/0.1 (...)` becomes `SumiHarvest`).
    pub fn robots_agent(&self) -> String {
        if let Some(agent) = &self.politeness.robots_agent {
            return agent.clone();
        }

        self.fetcher
            .user_agent
            .split_whitespace()
            .next()
            .and_then(|token| token.split('/').next())
            .filter(|token| !token.is_empty())
            .unwrap_or("*")
            .to_string()
    }
}

/// HTTP request configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FetcherConfig {
    /// User-Agent header value
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request timeout (seconds)
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Extra headers sent with every request
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            headers: BTreeMap::new(),
        }
    }
}

/// Delays, rate limits and robots.txt handling
#[derive(Debug, Clone, Deserialize)]
pub struct PolitenessConfig {
    /// Fixed delay between consecutive pages of a walk (milliseconds)
    #[serde(rename = "page-delay-ms", default = "default_page_delay_ms")]
    pub page_delay_ms: u64,

    /// Enables the rate limiter when set
    #[serde(rename = "calls-per-second", default)]
    pub calls_per_second: Option<f64>,

    /// Whether to consult robots.txt before each request
    #[serde(rename = "respect-robots", default = "default_true")]
    pub respect_robots: bool,

    /// How allow/disallow rules interact
    #[serde(rename = "robots-precedence", default)]
    pub robots_precedence: RobotsPrecedence,

    /// Agent token matched against `User-agent:` lines; defaults to the
    /// product token of the configured user agent
    #[serde(rename = "robots-agent", default)]
    pub robots_agent: Option<String>,
}

impl PolitenessConfig {
    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }
}

impl Default for PolitenessConfig {
    fn default() -> Self {
        Self {
            page_delay_ms: default_page_delay_ms(),
            calls_per_second: None,
            respect_robots: true,
            robots_precedence: RobotsPrecedence::default(),
            robots_agent: None,
        }
    }
}

/// Exponential backoff retry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    /// Total attempts, including the first
    #[serde(rename = "max-attempts", default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Sleep after the first failure (milliseconds)
    #[serde(rename = "initial-delay-ms", default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Multiplier applied to the delay after each failure
    #[serde(default = "default_backoff")]
    pub backoff: f64,
}

impl RetryConfig {
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_attempts,
            Duration::from_millis(self.initial_delay_ms),
            self.backoff,
        )
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            backoff: default_backoff(),
        }
    }
}

/// Page cache configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Entries older than this are refetched (seconds)
    #[serde(rename = "max-age-secs", default = "default_max_age_secs")]
    pub max_age_secs: u64,

    /// Maximum number of cached pages
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

impl CacheConfig {
    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_age_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_age_secs: default_max_age_secs(),
            capacity: default_capacity(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    /// Path of the pretty-printed JSON export
    #[serde(rename = "json-path", default)]
    pub json_path: Option<String>,

    /// Path of the CSV export
    #[serde(rename = "csv-path", default)]
    pub csv_path: Option<String>,
}

/// What to scrape
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum JobConfig {
    /// Scrape an explicit list of URLs
    Pages { urls: Vec<String> },

    /// Follow "next page" links from a start URL
    Paginate {
        #[serde(rename = "start-url")]
        start_url: String,
        #[serde(rename = "next-selector", default = "default_next_selector")]
        next_selector: String,
        #[serde(rename = "max-pages", default = "default_max_pages")]
        max_pages: usize,
    },

    /// Collect detail links from a listing page, then scrape each detail page
    ListDetail {
        #[serde(rename = "list-url")]
        list_url: String,
        #[serde(rename = "item-selector")]
        item_selector: String,
        #[serde(rename = "link-selector")]
        link_selector: String,
        #[serde(rename = "max-items", default = "default_max_items")]
        max_items: usize,
    },
}

impl JobConfig {
    /// Every URL the job starts from
    pub fn seed_urls(&self) -> Vec<&str> {
        match self {
            Self::Pages { urls } => urls.iter().map(String::as_str).collect(),
            Self::Paginate { start_url, .. } => vec![start_url.as_str()],
            Self::ListDetail { list_url, .. } => vec![list_url.as_str()],
        }
    }

    pub fn mode_name(&self) -> &'static str {
        match self {
            Self::Pages { .. } => "pages",
            Self::Paginate { .. } => "paginate",
            Self::ListDetail { .. } => "list-detail",
        }
    }
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_page_delay_ms() -> u64 {
    1000
}

fn default_true() -> bool {
    true
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay_ms() -> u64 {
    1000
}

fn default_backoff() -> f64 {
    2.0
}

fn default_max_age_secs() -> u64 {
    3600
}

fn default_capacity() -> usize {
    crate::cache::DEFAULT_CAPACITY
}

fn default_next_selector() -> String {
    "a.next".to_string()
}

fn default_max_pages() -> usize {
    5
}

fn default_max_items() -> usize {
    10
}
