//! Crawler module for page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - Auth-safe fetching with bounded redirects
//! - Sitemap ingestion and crawl strategies
//! - Content extraction and link discovery
//! - The priority frontier and overall crawl coordination

mod coordinator;
mod extractor;
mod fetcher;
mod frontier;
mod sitemap;
mod strategy;

pub use coordinator::{check_auth, run_crawl, AuthCheck, Coordinator, CrawlOutcome};
pub use extractor::{ContentExtractor, ExtractedPage};
pub use fetcher::{build_http_client, contains_login_form, AuthGuard};
pub use frontier::{CrawlTask, Frontier};
pub use sitemap::{parse_sitemap, partition_by_priority, SitemapDocument, SitemapIngester};
pub use strategy::{strategy_for, CrawlStrategy, SitemapStrategy, StartUrlStrategy};
