//! Sitemap ingestion
//!
//! Seeds the frontier from an XML sitemap. Both flat `<urlset>` documents and
//! `<sitemapindex>` documents (one level of sub-sitemaps) are understood.
//! Nothing here can abort a crawl: every failure degrades to seeding from the
//! base URL alone.

use crate::config::Config;
use crate::crawler::fetcher::AuthGuard;
use crate::events::{CrawlEvent, EventSink};
use crate::url::matches_priority_pattern;
use crate::SitemapError;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::sync::Arc;
use std::time::Duration;

/// A parsed sitemap document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SitemapDocument {
    /// `<sitemapindex>`: locations of further sitemaps
    Index(Vec<String>),
    /// `<urlset>`: page locations
    UrlSet(Vec<String>),
}

/// Parses a sitemap and returns the `<loc>` entries of its root element
///
/// Namespace prefixes are ignored. Only a `<loc>` directly inside a `<url>`
/// or `<sitemap>` entry counts, so image and video extension locations are
/// left out. A document whose root is neither `urlset` nor `sitemapindex` is
/// a parse error.
pub fn parse_sitemap(url: &str, xml: &[u8]) -> Result<SitemapDocument, SitemapError> {
    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut open_elements: Vec<Vec<u8>> = Vec::new();
    let mut in_loc = false;
    let mut locs = Vec::new();
    let mut saw_urlset = false;
    let mut saw_index = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let local = e.local_name();
                let name = local.as_ref();
                if open_elements.is_empty() {
                    saw_index = name == b"sitemapindex";
                    saw_urlset = name == b"urlset";
                }

                let in_entry = open_elements
                    .last()
                    .map_or(false, |parent| parent == b"url" || parent == b"sitemap");
                in_loc = in_entry && name == b"loc";
                open_elements.push(name.to_vec());
            }
            Ok(Event::End(_)) => {
                open_elements.pop();
                in_loc = false;
            }
            Ok(Event::Text(t)) if in_loc => {
                let text = t.unescape().map_err(|e| SitemapError::Parse {
                    url: url.to_string(),
                    message: e.to_string(),
                })?;
                let loc = text.trim();
                if !loc.is_empty() {
                    locs.push(loc.to_string());
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(SitemapError::Parse {
                    url: url.to_string(),
                    message: e.to_string(),
                })
            }
            _ => {}
        }
        buf.clear();
    }

    if saw_index {
        Ok(SitemapDocument::Index(locs))
    } else if saw_urlset {
        Ok(SitemapDocument::UrlSet(locs))
    } else {
        Err(SitemapError::Parse {
            url: url.to_string(),
            message: "document is neither a urlset nor a sitemapindex".to_string(),
        })
    }
}

/// Moves URLs matching a priority pattern to the front
///
/// Relative order is kept within both groups. Returns the reordered list and
/// the number of priority URLs at its head.
pub fn partition_by_priority<S: AsRef<str>>(
    urls: Vec<String>,
    patterns: &[S],
) -> (Vec<String>, usize) {
    let (mut priority, regular): (Vec<String>, Vec<String>) = urls
        .into_iter()
        .partition(|url| matches_priority_pattern(url, patterns));

    let priority_count = priority.len();
    priority.extend(regular);
    (priority, priority_count)
}

/// Loads crawl seeds from a sitemap
pub struct SitemapIngester {
    base_url: String,
    priority_patterns: Vec<String>,
    delay: Duration,
    events: Arc<dyn EventSink>,
}

impl SitemapIngester {
    pub fn from_config(config: &Config, events: Arc<dyn EventSink>) -> Self {
        Self {
            base_url: config.crawl.base_url.clone(),
            priority_patterns: config.filter.priority_patterns.clone(),
            delay: Duration::from_millis(config.crawl.sitemap_delay_ms),
            events,
        }
    }

    /// Returns the seed URLs for a crawl, priority URLs first
    ///
    /// Falls back to the base URL when the sitemap cannot be fetched or
    /// parsed, or lists no URLs.
    pub async fn load_seeds(&self, guard: &mut AuthGuard, sitemap_url: &str) -> Vec<String> {
        let reason = match self.collect_urls(guard, sitemap_url).await {
            Ok(urls) if !urls.is_empty() => {
                let (seeds, priority) = partition_by_priority(urls, &self.priority_patterns);
                self.events.emit(CrawlEvent::SitemapLoaded {
                    url: sitemap_url.to_string(),
                    urls: seeds.len(),
                    priority,
                });
                return seeds;
            }
            Ok(_) => "sitemap lists no URLs".to_string(),
            Err(e) => e.to_string(),
        };

        self.events.emit(CrawlEvent::SitemapFallback {
            url: sitemap_url.to_string(),
            reason,
        });
        vec![self.base_url.clone()]
    }

    async fn collect_urls(
        &self,
        guard: &mut AuthGuard,
        sitemap_url: &str,
    ) -> Result<Vec<String>, SitemapError> {
        let sub_sitemaps = match self.fetch_sitemap(guard, sitemap_url).await? {
            SitemapDocument::UrlSet(urls) => return Ok(urls),
            SitemapDocument::Index(sub_sitemaps) => sub_sitemaps,
        };

        tracing::info!(
            "Sitemap index {} lists {} sitemaps",
            sitemap_url,
            sub_sitemaps.len()
        );

        let mut urls = Vec::new();
        for (i, sub_url) in sub_sitemaps.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.delay).await;
            }

            match self.fetch_sitemap(guard, sub_url).await {
                Ok(SitemapDocument::UrlSet(sub_urls)) => {
                    tracing::debug!("{} URLs from {}", sub_urls.len(), sub_url);
                    urls.extend(sub_urls);
                }
                Ok(SitemapDocument::Index(_)) => {
                    tracing::warn!("Skipping nested sitemap index {}", sub_url);
                }
                Err(e) => {
                    tracing::warn!("Skipping sub-sitemap: {}", e);
                }
            }
        }

        Ok(urls)
    }

    async fn fetch_sitemap(
        &self,
        guard: &mut AuthGuard,
        url: &str,
    ) -> Result<SitemapDocument, SitemapError> {
        let body = guard.fetch(url).await.map_err(|source| SitemapError::Fetch {
            url: url.to_string(),
            source,
        })?;
        parse_sitemap(url, body.as_bytes())
    }
}
