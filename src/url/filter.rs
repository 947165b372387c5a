//! Crawl-scope filtering and document-link detection

use crate::config::Config;
use crate::url::domain::extract_domain;
use crate::url::matcher::domain_allowed_by_any;
use crate::url::pattern_candidates;
use url::Url;

/// File extensions that mark a link as a downloadable document
pub const DOCUMENT_EXTENSIONS: &[&str] = &[".pdf", ".doc", ".docx", ".xls", ".xlsx", ".ppt", ".pptx"];

/// Hosts whose links are treated as documents regardless of extension
pub const CLOUD_DOCUMENT_HOSTS: &[&str] = &["dropbox.com", "drive.google.com", "sharepoint.com"];

/// Decides which discovered URLs stay out of the crawl
#[derive(Debug, Clone)]
pub struct UrlFilter {
    allowed_domains: Vec<String>,
    skip_patterns: Vec<String>,
    skip_extensions: Vec<String>,
}

impl UrlFilter {
    pub fn new(
        allowed_domains: Vec<String>,
        skip_patterns: Vec<String>,
        skip_extensions: Vec<String>,
    ) -> Self {
        Self {
            allowed_domains: allowed_domains.into_iter().map(|d| d.to_lowercase()).collect(),
            skip_patterns: skip_patterns.into_iter().map(|p| p.to_lowercase()).collect(),
            skip_extensions: skip_extensions.into_iter().map(|e| e.to_lowercase()).collect(),
        }
    }

    /// Builds the filter described by a configuration
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.effective_allowed_domains(),
            config.filter.skip_patterns.clone(),
            config.filter.skip_extensions.clone(),
        )
    }

    /// Returns true if the URL must not be enqueued
    ///
    /// A URL is skipped when it cannot be parsed, when its domain is outside
    /// the allowed set, when it contains a skip pattern, or when its path ends
    /// with a skip extension. Pattern and extension checks are case-insensitive,
    /// and a section root matches its pattern with or without the trailing slash.
    pub fn should_skip(&self, url: &str) -> bool {
        let parsed = match Url::parse(url) {
            Ok(u) => u,
            Err(_) => return true,
        };

        match extract_domain(&parsed) {
            Some(domain) if domain_allowed_by_any(&self.allowed_domains, &domain) => {}
            _ => return true,
        }

        let candidates = pattern_candidates(url);
        if self
            .skip_patterns
            .iter()
            .any(|p| candidates.iter().any(|c| c.contains(p.as_str())))
        {
            return true;
        }

        let path = parsed.path().to_lowercase();
        self.skip_extensions
            .iter()
            .any(|ext| path.ends_with(ext.as_str()))
    }
}

/// Returns true if the URL points at a document rather than a page
///
/// Documents are office/PDF files (judged by path extension) and anything
/// hosted on a known cloud-storage service.
pub fn is_document_url(url: &Url) -> bool {
    let path = url.path().to_lowercase();
    if DOCUMENT_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
        return true;
    }

    is_cloud_storage_url(url)
}

/// Returns true if the URL is hosted on a known cloud-storage service
pub fn is_cloud_storage_url(url: &Url) -> bool {
    match url.host_str() {
        Some(host) => {
            let host = host.to_lowercase();
            CLOUD_DOCUMENT_HOSTS
                .iter()
                .any(|h| host == *h || host.ends_with(&format!(".{}", h)))
        }
        None => false,
    }
}
