use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Main configuration structure for docharvest
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub crawl: CrawlConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub documents: DocumentsConfig,
}

impl Config {
    /// Builds a configuration for `base_url` with every other setting at its default
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            crawl: CrawlConfig::new(base_url),
            http: HttpConfig::default(),
            auth: AuthConfig::default(),
            filter: FilterConfig::default(),
            documents: DocumentsConfig::default(),
        }
    }

    /// Returns the allowed domain patterns in effect
    ///
    /// An empty `allowed-domains` list means "the base URL's domain only".
    pub fn effective_allowed_domains(&self) -> Vec<String> {
        if !self.filter.allowed_domains.is_empty() {
            return self
                .filter
                .allowed_domains
                .iter()
                .map(|d| d.to_lowercase())
                .collect();
        }

        ::url::Url::parse(&self.crawl.base_url)
            .ok()
            .and_then(|u| crate::url::extract_domain(&u))
            .into_iter()
            .collect()
    }

    /// Returns the sitemap location, defaulting to `<base-url>/sitemap.xml`
    pub fn effective_sitemap_url(&self) -> String {
        match &self.crawl.sitemap_url {
            Some(url) => url.clone(),
            None => format!("{}/sitemap.xml", self.crawl.base_url.trim_end_matches('/')),
        }
    }
}

/// How the crawl frontier is seeded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CrawlMode {
    /// Seed from the site's XML sitemap, priority sections first
    Sitemap,
    /// Seed from the base URL alone and follow links
    StartUrl,
}

/// Crawl behavior configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CrawlConfig {
    /// Site root; also the fallback seed
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Directory that receives page files and reports
    #[serde(rename = "output-dir", default = "default_output_dir")]
    pub output_dir: String,

    /// Maximum number of pages saved before the crawl stops
    #[serde(rename = "max-pages", default = "default_max_pages")]
    pub max_pages: usize,

    /// Maximum link depth from the seeds
    #[serde(rename = "max-depth", default = "default_max_depth")]
    pub max_depth: u32,

    /// Pause after every dequeued task (seconds)
    #[serde(rename = "crawl-delay", default = "default_crawl_delay")]
    pub crawl_delay: f64,

    #[serde(default = "default_mode")]
    pub mode: CrawlMode,

    /// Explicit sitemap location (defaults to `<base-url>/sitemap.xml`)
    #[serde(rename = "sitemap-url", default)]
    pub sitemap_url: Option<String>,

    /// Pause between sub-sitemap fetches (milliseconds)
    #[serde(rename = "sitemap-delay-ms", default = "default_sitemap_delay_ms")]
    pub sitemap_delay_ms: u64,

    /// Scheme every URL is rewritten to during normalization
    #[serde(rename = "canonical-scheme", default = "default_canonical_scheme")]
    pub canonical_scheme: String,

    /// Pages whose markdown body is shorter than this are skipped
    #[serde(rename = "min-content-length", default = "default_min_content_length")]
    pub min_content_length: usize,
}

impl CrawlConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            output_dir: default_output_dir(),
            max_pages: default_max_pages(),
            max_depth: default_max_depth(),
            crawl_delay: default_crawl_delay(),
            mode: default_mode(),
            sitemap_url: None,
            sitemap_delay_ms: default_sitemap_delay_ms(),
            canonical_scheme: default_canonical_scheme(),
            min_content_length: default_min_content_length(),
        }
    }
}

/// HTTP client configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpConfig {
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// Whole-request timeout (seconds)
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(rename = "connect-timeout-secs", default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

/// Authentication and lockout-protection configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    /// Name of the header carrying the crawl token
    #[serde(default = "default_auth_header")]
    pub header: String,

    /// Crawl tokens keyed by domain (`host` or `host:port`)
    #[serde(default)]
    pub tokens: BTreeMap<String, String>,

    /// Auth failures after which a domain is blocked for the rest of the run
    #[serde(rename = "max-auth-failures", default = "default_max_auth_failures")]
    pub max_auth_failures: u32,

    /// Maximum redirect hops per logical request
    #[serde(rename = "max-redirects", default = "default_max_redirects")]
    pub max_redirects: u32,

    /// Pause before following a same-domain redirect (milliseconds)
    #[serde(rename = "redirect-delay-ms", default = "default_redirect_delay_ms")]
    pub redirect_delay_ms: u64,

    /// Substrings that mark a redirect target as a login page
    #[serde(rename = "login-indicators", default = "default_login_indicators")]
    pub login_indicators: Vec<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            header: default_auth_header(),
            tokens: BTreeMap::new(),
            max_auth_failures: default_max_auth_failures(),
            max_redirects: default_max_redirects(),
            redirect_delay_ms: default_redirect_delay_ms(),
            login_indicators: default_login_indicators(),
        }
    }
}

/// URL filtering and prioritization
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FilterConfig {
    /// Domain patterns (e.g., "example.com" or "*.example.com")
    #[serde(rename = "allowed-domains", default)]
    pub allowed_domains: Vec<String>,

    /// Substrings that exclude a URL
    #[serde(rename = "skip-patterns", default = "default_skip_patterns")]
    pub skip_patterns: Vec<String>,

    /// Path suffixes that exclude a URL
    #[serde(rename = "skip-extensions", default = "default_skip_extensions")]
    pub skip_extensions: Vec<String>,

    /// Substrings that move a URL to the front of the crawl
    #[serde(rename = "priority-patterns", default = "default_priority_patterns")]
    pub priority_patterns: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            allowed_domains: Vec::new(),
            skip_patterns: default_skip_patterns(),
            skip_extensions: default_skip_extensions(),
            priority_patterns: default_priority_patterns(),
        }
    }
}

/// Document cross-referencing configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DocumentsConfig {
    /// Directories of previously processed markdown documents
    #[serde(rename = "corpus-dirs", default)]
    pub corpus_dirs: Vec<String>,

    /// Download and process document links that match nothing in the corpus
    #[serde(default)]
    pub download: bool,
}

fn default_output_dir() -> String {
    "./crawled".to_string()
}

fn default_max_pages() -> usize {
    500
}

fn default_max_depth() -> u32 {
    4
}

fn default_crawl_delay() -> f64 {
    1.0
}

fn default_mode() -> CrawlMode {
    CrawlMode::Sitemap
}

fn default_sitemap_delay_ms() -> u64 {
    500
}

fn default_canonical_scheme() -> String {
    "https".to_string()
}

fn default_min_content_length() -> usize {
    100
}

fn default_user_agent() -> String {
    "docharvest/1.0 (+documentation indexing)".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_auth_header() -> String {
    "X-Crawl-Token".to_string()
}

fn default_max_auth_failures() -> u32 {
    5
}

fn default_max_redirects() -> u32 {
    3
}

fn default_redirect_delay_ms() -> u64 {
    1000
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_login_indicators() -> Vec<String> {
    to_strings(&["login", "signin", "sso", "auth", "oauth"])
}

fn default_skip_patterns() -> Vec<String> {
    to_strings(&[
        "/wp-admin/",
        "/wp-json/",
        "/feed/",
        "/wp-login",
        "/xmlrpc.php",
        "?replytocom=",
        "/attachment/",
        "/trackback/",
        "/wp-content/uploads/",
        "/tag/",
        "/author/",
        "?print=",
    ])
}

fn default_skip_extensions() -> Vec<String> {
    to_strings(&[
        ".pdf", ".doc", ".docx", ".xls", ".xlsx", ".ppt", ".pptx", ".zip", ".tar", ".gz", ".jpg",
        ".jpeg", ".png", ".gif", ".svg", ".ico", ".css", ".js", ".woff", ".ttf",
    ])
}

fn default_priority_patterns() -> Vec<String> {
    to_strings(&[
        "/forms/",
        "/policies/",
        "/procedures/",
        "/resources/",
        "/help/",
        "/faq/",
        "/guide/",
        "/how-to/",
    ])
}
