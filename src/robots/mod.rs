//! Robots.txt handling module
//!
//! This module provides functionality for fetching, parsing, and caching
//! robots.txt files. Rules are fetched once per site (scheme, host and port)
//! and are read-only afterwards. A site whose robots.txt cannot be fetched is
//! treated as allowing everything.

mod parser;

pub use parser::{RobotsPrecedence, RobotsRules, RuleSet, MAX_CRAWL_DELAY_SECS};

use crate::crawler::Fetcher;
use crate::url::{origin_key, robots_url};
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

/// Fetches robots.txt for the site hosting `url`
///
/// Any failure (network error, non-2xx status) yields permissive rules.
pub async fn fetch_robots(fetcher: &Fetcher, url: &Url) -> RobotsRules {
    let Some(robots) = robots_url(url) else {
        return RobotsRules::allow_all();
    };

    match fetcher.fetch_page(robots.as_str()).await {
        Ok(page) => {
            tracing::debug!("Loaded robots.txt from {}", robots);
            RobotsRules::parse(&page.body)
        }
        Err(e) => {
            tracing::debug!("No usable robots.txt at {} ({}); allowing all", robots, e);
            RobotsRules::allow_all()
        }
    }
}

/// Per-site crawl permission checks for one user agent
#[derive(Debug, Clone)]
pub struct RobotsPolicy {
    user_agent: String,
    precedence: RobotsPrecedence,
    sites: HashMap<String, RobotsRules>,
}

impl RobotsPolicy {
    /// Creates a policy for the given user-agent token
    pub fn new(user_agent: impl Into<String>, precedence: RobotsPrecedence) -> Self {
        Self {
            user_agent: user_agent.into(),
            precedence,
            sites: HashMap::new(),
        }
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn precedence(&self) -> RobotsPrecedence {
        self.precedence
    }

    /// Installs rules for a site without fetching
    pub fn insert_rules(&mut self, url: &Url, rules: RobotsRules) {
        if let Some(key) = origin_key(url) {
            self.sites.insert(key, rules);
        }
    }

    /// Number of sites whose rules are loaded
    pub fn known_sites(&self) -> usize {
        self.sites.len()
    }

    /// Returns the rules for the site hosting `url`, fetching them on first use
    pub async fn rules_for(&mut self, fetcher: &Fetcher, url: &Url) -> Option<&RobotsRules> {
        let key = origin_key(url)?;
        if !self.sites.contains_key(&key) {
            let rules = fetch_robots(fetcher, url).await;
            self.sites.insert(key.clone(), rules);
        }
        self.sites.get(&key)
    }

    /// Checks whether `url` may be fetched
    ///
    /// URLs that cannot be parsed are rejected.
    pub async fn can_fetch(&mut self, fetcher: &Fetcher, url: &str) -> bool {
        let parsed = match Url::parse(url) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Cannot check robots.txt for invalid URL {}: {}", url, e);
                return false;
            }
        };

        let user_agent = self.user_agent.clone();
        let precedence = self.precedence;
        match self.rules_for(fetcher, &parsed).await {
            Some(rules) => {
                let allowed = rules.is_allowed(&parsed, &user_agent, precedence);
                tracing::trace!("robots.txt {} for {}", if allowed { "allows" } else { "denies" }, url);
                allowed
            }
            None => true,
        }
    }

    /// Crawl delay declared for this agent on the site hosting `url`
    pub async fn crawl_delay(&mut self, fetcher: &Fetcher, url: &str) -> Option<Duration> {
        let parsed = Url::parse(url).ok()?;
        let user_agent = self.user_agent.clone();
        let delay = self
            .rules_for(fetcher, &parsed)
            .await?
            .crawl_delay(&user_agent)?;

        if delay.is_nan() || delay <= 0.0 {
            return None;
        }
        match Duration::try_from_secs_f64(delay.min(MAX_CRAWL_DELAY_SECS)) {
            Ok(delay) => Some(delay),
            Err(e) => {
                tracing::warn!("Ignoring Crawl-delay {} for {}: {}", delay, url, e);
                None
            }
        }
    }
}
