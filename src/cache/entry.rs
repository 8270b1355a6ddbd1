//! Cache entries with age tracking

use chrono::{DateTime, Utc};
use std::time::Duration;

/// Cached data for a URL
///
/// This structure stores the cached value along with the timestamp when it was
/// stored, allowing for expiration checks.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    /// The normalized URL this entry was stored under
    pub url: String,

    /// The cached value
    pub data: T,

    /// When the entry was stored
    pub stored_at: DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    /// Creates a new entry stamped with the current time
    pub fn new(url: String, data: T) -> Self {
        Self {
            url,
            data,
            stored_at: Utc::now(),
        }
    }

    /// Returns the age of the entry
    ///
    /// An entry stamped in the future (clock skew) reports zero age.
    pub fn age(&self) -> Duration {
        (Utc::now() - self.stored_at).to_std().unwrap_or(Duration::ZERO)
    }

    /// True while the entry is younger than `max_age`
    pub fn is_fresh(&self, max_age: Duration) -> bool {
        self.age() < max_age
    }
}
