//! URL handling module for Sumi-Harvest
//!
//! This module provides URL normalization, cache-key hashing, domain helpers
//! and link resolution against a page's base URL.

mod domain;
mod normalize;

use url::Url;

// Re-export main functions
pub use domain::{extract_domain, origin_key, robots_url};
pub use normalize::{cache_key, normalize_url};

/// Resolves an `href`/`src` attribute against a base URL
///
/// Any reference the URL parser accepts is resolved, including `mailto:` and
/// other non-HTTP schemes. Returns None for empty or unparseable references.
pub fn resolve_href(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    base_url.join(href).ok().map(|u| u.to_string())
}

/// Resolves a navigation link to an absolute HTTP(S) URL
///
/// Used when following "next page" and detail links. Returns None if the link
/// should not be followed:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - fragment-only references
/// - invalid URLs
/// - non-HTTP(S) URLs after resolution
pub fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) => {
            if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" {
                Some(absolute_url.to_string())
            } else {
                None
            }
        }
        Err(_) => None,
    }
}
