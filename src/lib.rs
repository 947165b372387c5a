//! docharvest: a polite, auth-safe documentation harvester
//!
//! This crate crawls documentation sites, converts their pages into markdown
//! records with frontmatter, and cross-references document links against a
//! corpus of previously processed files.

pub mod config;
pub mod crawler;
pub mod events;
pub mod mapping;
pub mod output;
pub mod processors;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for docharvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Extraction error: {0}")]
    Extract(#[from] ExtractError),

    #[error("Sitemap error: {0}")]
    Sitemap(#[from] SitemapError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("Document processing error: {0}")]
    Processor(#[from] processors::ProcessorError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid domain pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Failures of a single guarded fetch
///
/// The auth-related variants (`AuthRedirectBlocked`, `AccessDenied`,
/// `AuthContentDetected`) are the ones that count toward a domain's
/// failure threshold.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {0}")]
    HttpError(u16),

    #[error("Redirect to login page blocked: {location}")]
    AuthRedirectBlocked { location: String },

    #[error("Cross-domain redirect blocked: {location}")]
    CrossDomainRedirectBlocked { location: String },

    #[error("Too many redirects")]
    TooManyRedirects,

    #[error("Access denied (HTTP {0})")]
    AccessDenied(u16),

    #[error("Login form detected in response")]
    AuthContentDetected,

    #[error("Domain blocked after repeated auth failures: {0}")]
    DomainBlocked(String),
}

impl FetchError {
    /// Returns true if this failure signals an authentication problem
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            Self::AuthRedirectBlocked { .. } | Self::AccessDenied(_) | Self::AuthContentDetected
        )
    }
}

/// Reasons a fetched page yields no record
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("No main content region found")]
    NoMainContent,

    #[error("Content too short ({length} < {minimum} chars)")]
    ContentTooShort { length: usize, minimum: usize },
}

/// Sitemap ingestion errors
///
/// These never abort a crawl; the ingester degrades to the base URL.
#[derive(Debug, Error)]
pub enum SitemapError {
    #[error("Failed to fetch sitemap {url}: {source}")]
    Fetch { url: String, source: FetchError },

    #[error("Failed to parse sitemap {url}: {message}")]
    Parse { url: String, message: String },
}

/// Result type alias for docharvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

/// Result type alias for guarded fetches
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Compiles a constant pattern once and hands out the cached regex
pub(crate) fn cached_regex(
    cell: &'static std::sync::OnceLock<regex::Regex>,
    pattern: &str,
) -> &'static regex::Regex {
    cell.get_or_init(|| regex::Regex::new(pattern).expect("constant pattern"))
}

// Re-export commonly used types
pub use config::Config;
pub use crawler::{run_crawl, Coordinator, CrawlOutcome};
pub use mapping::{DocumentMatch, DocumentMatcher, DocumentResolver, MatchType, NoopResolver};
pub use state::DomainAuthState;
pub use url::{extract_domain, UrlFilter, UrlNormalizer};
