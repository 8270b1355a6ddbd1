use crate::UrlError;
use sha2::{Digest, Sha256};
use url::Url;

/// Normalizes a URL into the form used for cache keys and robots lookups
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Reject anything that is not HTTP or HTTPS
/// 3. Reject URLs without a host
/// 4. Remove the fragment (everything after #)
///
/// Scheme, host, port, path and query are kept as-is. The `url` crate already
/// lowercases the host and turns an empty path into `/`.
///
/// # Arguments
///
/// * `url_str` - The URL string to normalize
///
/// # Returns
///
/// * `Ok(Url)` - Normalized URL
/// * `Err(UrlError)` - Failed to parse or normalize the URL
///
/// # Examples
///
/// ```
/// use sumi_harvest::url::normalize_url;
///
/// let url = normalize_url("https://EXAMPLE.COM/page?id=1#reviews").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/page?id=1");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingHost);
    }

    url.set_fragment(None);

    Ok(url)
}

/// Computes the cache key for a URL
///
/// The key is the hex-encoded SHA-256 of the normalized URL, so URLs that only
/// differ by fragment or host case share one key. Strings that cannot be
/// normalized are hashed verbatim.
pub fn cache_key(url_str: &str) -> String {
    let normalized = match normalize_url(url_str) {
        Ok(url) => url.to_string(),
        Err(_) => url_str.to_string(),
    };

    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    hex::encode(hasher.finalize())
}
