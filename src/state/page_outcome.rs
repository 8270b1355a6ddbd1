/// Page outcome definitions for tracking scrape progress
///
/// Every page attempt made by an orchestrator ends in exactly one outcome.
use crate::HarvestError;
use std::fmt;

/// How a single page attempt ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PageOutcome {
    // ===== Success States =====
    /// Page was fetched and extracted
    Scraped,

    /// Page was served from the cache
    Cached,

    // ===== Skip States =====
    /// robots.txt disallows the page for our agent
    RobotsDenied,

    // ===== Error States =====
    /// Connection fault, timeout or malformed URL
    NetworkFailure,

    /// Server answered with a non-2xx status
    HttpFailure,
}

impl PageOutcome {
    /// Classifies a fetch error
    pub fn from_error(error: &HarvestError) -> Self {
        match error {
            HarvestError::HttpStatus { .. } => Self::HttpFailure,
            _ => Self::NetworkFailure,
        }
    }

    /// Returns true if the page produced a record
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Scraped | Self::Cached)
    }

    /// Returns true if this represents an error state
    pub fn is_error(&self) -> bool {
        matches!(self, Self::NetworkFailure | Self::HttpFailure)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scraped => "scraped",
            Self::Cached => "cached",
            Self::RobotsDenied => "robots_denied",
            Self::NetworkFailure => "network_failure",
            Self::HttpFailure => "http_failure",
        }
    }

    /// Returns all possible outcomes
    pub fn all() -> [Self; 5] {
        [
            Self::Scraped,
            Self::Cached,
            Self::RobotsDenied,
            Self::NetworkFailure,
            Self::HttpFailure,
        ]
    }
}

impl fmt::Display for PageOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
