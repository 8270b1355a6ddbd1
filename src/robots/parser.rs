//! Robots.txt parser implementation
//!
//! Parsing is line-oriented: `#` starts a comment, `User-agent:` lines open a
//! group (consecutive agent lines share one group), and `Disallow:`, `Allow:`
//! and `Crawl-delay:` lines add to every agent of the current group. Rules that
//! appear before any `User-agent:` line are ignored, as are empty paths.

use robotstxt::DefaultMatcher;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use url::Url;

/// Longest `Crawl-delay` honored, in seconds (one day)
pub const MAX_CRAWL_DELAY_SECS: f64 = 86_400.0;

/// How allow and disallow prefixes interact
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RobotsPrecedence {
    /// The first matching disallow prefix (in file order) rejects the path,
    /// unless the path also matches any allow prefix. Paths matching no
    /// disallow prefix are allowed.
    #[default]
    FirstMatch,

    /// Longest-match resolution as implemented by Google's robots.txt matcher
    LongestMatch,
}

/// Allow/disallow prefixes for one user agent
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleSet {
    /// Allowed path prefixes, in file order
    pub allow: Vec<String>,

    /// Disallowed path prefixes, in file order
    pub disallow: Vec<String>,

    /// Crawl delay in seconds, if specified
    pub crawl_delay: Option<f64>,
}

impl RuleSet {
    /// Applies first-match precedence to a URL path
    pub fn is_path_allowed(&self, path: &str) -> bool {
        for disallowed in &self.disallow {
            if path.starts_with(disallowed.as_str()) {
                return self.allow.iter().any(|a| path.starts_with(a.as_str()));
            }
        }
        true
    }
}

/// Parsed robots.txt data
///
/// Rules are keyed by lowercased user-agent token. A `*` group always exists,
/// possibly empty.
#[derive(Debug, Clone, PartialEq)]
pub struct RobotsRules {
    /// Raw robots.txt content, kept for longest-match evaluation
    content: String,
    groups: HashMap<String, RuleSet>,
}

impl RobotsRules {
    /// Parses raw robots.txt content
    ///
    /// # Example
    ///
    /// ```
    /// use sumi_harvest::robots::RobotsRules;
    ///
    /// let rules = RobotsRules::parse("User-agent: *\nDisallow: /private");
    /// assert!(!rules.is_path_allowed("/private/x", "AnyBot"));
    /// assert!(rules.is_path_allowed("/public", "AnyBot"));
    /// ```
    pub fn parse(content: &str) -> Self {
        let mut groups: HashMap<String, RuleSet> = HashMap::new();
        groups.insert("*".to_string(), RuleSet::default());

        let mut current_agents: Vec<String> = Vec::new();
        let mut last_was_agent = false;

        for line in content.lines() {
            let line = line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }

            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim().to_lowercase();
            let value = value.trim();

            match key.as_str() {
                "user-agent" => {
                    if !last_was_agent {
                        current_agents.clear();
                    }
                    let agent = value.to_lowercase();
                    groups.entry(agent.clone()).or_default();
                    current_agents.push(agent);
                    last_was_agent = true;
                }
                "disallow" | "allow" | "crawl-delay" => {
                    last_was_agent = false;
                    if value.is_empty() {
                        continue;
                    }
                    for agent in &current_agents {
                        let Some(rules) = groups.get_mut(agent) else {
                            continue;
                        };
                        match key.as_str() {
                            "disallow" => rules.disallow.push(value.to_string()),
                            "allow" => rules.allow.push(value.to_string()),
                            _ => match value.parse::<f64>() {
                                Ok(delay)
                                    if delay.is_finite()
                                        && (0.0..=MAX_CRAWL_DELAY_SECS).contains(&delay) =>
                                {
                                    rules.crawl_delay = Some(delay);
                                }
                                _ => {
                                    tracing::debug!("Ignoring out-of-range Crawl-delay '{}'", value);
                                }
                            },
                        }
                    }
                }
                _ => {
                    // Sitemap, Host and unknown directives don't affect access
                    last_was_agent = false;
                }
            }
        }

        Self {
            content: content.to_string(),
            groups,
        }
    }

    /// Creates permissive rules that allow everything
    ///
    /// This is used as the default when robots.txt cannot be fetched.
    pub fn allow_all() -> Self {
        Self::parse("")
    }

    /// Returns the raw robots.txt content
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Selects the rule set for a user agent, falling back to `*`
    pub fn rules_for(&self, user_agent: &str) -> Option<&RuleSet> {
        self.groups
            .get(&user_agent.to_lowercase())
            .or_else(|| self.groups.get("*"))
    }

    /// Checks a URL path against the agent's rules with first-match precedence
    pub fn is_path_allowed(&self, path: &str, user_agent: &str) -> bool {
        self.rules_for(user_agent)
            .map_or(true, |rules| rules.is_path_allowed(path))
    }

    /// Checks a URL under the requested precedence
    pub fn is_allowed(&self, url: &Url, user_agent: &str, precedence: RobotsPrecedence) -> bool {
        match precedence {
            RobotsPrecedence::FirstMatch => self.is_path_allowed(url.path(), user_agent),
            RobotsPrecedence::LongestMatch => {
                if self.content.trim().is_empty() {
                    return true;
                }
                let mut matcher = DefaultMatcher::default();
                matcher.one_agent_allowed_by_robots(&self.content, user_agent, url.as_str())
            }
        }
    }

    /// Gets the crawl delay for a specific user agent
    ///
    /// # Returns
    ///
    /// * `Some(f64)` - The crawl delay in seconds
    /// * `None` - If no crawl delay is specified
    pub fn crawl_delay(&self, user_agent: &str) -> Option<f64> {
        self.rules_for(user_agent).and_then(|rules| rules.crawl_delay)
    }
}

impl Default for RobotsRules {
    fn default() -> Self {
        Self::allow_all()
    }
}
