//! Crawl strategies
//!
//! A strategy decides where a crawl starts and how discovered links are
//! ranked. Everything else (fetching, extraction, persistence) is shared.

use crate::config::{Config, CrawlMode};
use crate::crawler::fetcher::AuthGuard;
use crate::crawler::sitemap::SitemapIngester;
use crate::events::EventSink;
use crate::url::{matches_priority_pattern, UrlFilter};
use async_trait::async_trait;
use std::sync::Arc;

/// Seeding and link ranking for one kind of crawl
#[async_trait]
pub trait CrawlStrategy: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// URLs the frontier starts from, in the order they should be crawled
    async fn seed_urls(&self, guard: &mut AuthGuard) -> Vec<String>;

    fn filter(&self) -> &UrlFilter;

    fn should_skip_url(&self, url: &str) -> bool {
        self.filter().should_skip(url)
    }

    /// Frontier priority for a URL; 0 is crawled first
    fn link_priority(&self, _url: &str) -> u8 {
        0
    }
}

/// Deep crawl seeded from the site's sitemap
///
/// Priority sections (forms, policies, FAQs ...) go to the front of the
/// frontier whether they come from the sitemap or from page links.
pub struct SitemapStrategy {
    ingester: SitemapIngester,
    sitemap_url: String,
    priority_patterns: Vec<String>,
    filter: UrlFilter,
}

impl SitemapStrategy {
    pub fn from_config(config: &Config, events: Arc<dyn EventSink>) -> Self {
        Self {
            ingester: SitemapIngester::from_config(config, events),
            sitemap_url: config.effective_sitemap_url(),
            priority_patterns: config.filter.priority_patterns.clone(),
            filter: UrlFilter::from_config(config),
        }
    }
}

#[async_trait]
impl CrawlStrategy for SitemapStrategy {
    fn name(&self) -> &'static str {
        "sitemap"
    }

    async fn seed_urls(&self, guard: &mut AuthGuard) -> Vec<String> {
        self.ingester.load_seeds(guard, &self.sitemap_url).await
    }

    fn filter(&self) -> &UrlFilter {
        &self.filter
    }

    fn link_priority(&self, url: &str) -> u8 {
        if matches_priority_pattern(url, &self.priority_patterns) {
            0
        } else {
            1
        }
    }
}

/// Authenticated crawl that starts from the base URL and follows links
pub struct StartUrlStrategy {
    start_url: String,
    filter: UrlFilter,
}

impl StartUrlStrategy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            start_url: config.crawl.base_url.clone(),
            filter: UrlFilter::from_config(config),
        }
    }
}

#[async_trait]
impl CrawlStrategy for StartUrlStrategy {
    fn name(&self) -> &'static str {
        "start-url"
    }

    async fn seed_urls(&self, _guard: &mut AuthGuard) -> Vec<String> {
        vec![self.start_url.clone()]
    }

    fn filter(&self) -> &UrlFilter {
        &self.filter
    }
}

/// Picks the strategy configured by `crawl.mode`
pub fn strategy_for(config: &Config, events: Arc<dyn EventSink>) -> Box<dyn CrawlStrategy> {
    match config.crawl.mode {
        CrawlMode::Sitemap => Box::new(SitemapStrategy::from_config(config, events)),
        CrawlMode::StartUrl => Box::new(StartUrlStrategy::from_config(config)),
    }
}
