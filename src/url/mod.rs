//! URL handling module for docharvest
//!
//! This module provides URL normalization, domain extraction, allowed-domain
//! matching, crawl-scope filtering and document-link detection.

mod domain;
mod filter;
mod matcher;
mod normalize;

pub use domain::{domain_of, extract_domain};
pub use filter::{
    is_cloud_storage_url, is_document_url, UrlFilter, CLOUD_DOCUMENT_HOSTS, DOCUMENT_EXTENSIONS,
};
pub use matcher::{domain_allowed, domain_allowed_by_any};
pub use normalize::UrlNormalizer;

/// Returns true if the URL contains any of the given patterns (case-insensitive)
///
/// Used to route priority sections (forms, policies, FAQs ...) to the front
/// of the crawl.
pub fn matches_priority_pattern<S: AsRef<str>>(url: &str, patterns: &[S]) -> bool {
    let candidates = pattern_candidates(url);
    patterns.iter().any(|p| {
        let pattern = p.as_ref().to_lowercase();
        candidates.iter().any(|c| c.contains(&pattern))
    })
}

/// Lowercased forms of a URL that section patterns are tested against
///
/// Normalized URLs lose their trailing slash, so the second form puts one
/// back after the path. That lets `/wp-admin/` match `https://site/wp-admin`.
pub(crate) fn pattern_candidates(url: &str) -> [String; 2] {
    let lower = url.to_lowercase();
    let path_end = lower
        .find(|c: char| c == '?' || c == '#')
        .unwrap_or(lower.len());
    let base = &lower[..path_end];
    let slashed = if base.ends_with('/') {
        base.to_string()
    } else {
        format!("{}/", base)
    };
    [lower, slashed]
}
