//! Structured crawl events
//!
//! Progress and failures are reported as `CrawlEvent` values through an
//! `EventSink`. The default sink forwards them to `tracing`; tests use a
//! `RecordingSink` and assert on the events themselves.

use std::sync::Mutex;

/// Something noteworthy that happened during a crawl
#[derive(Debug, Clone, PartialEq)]
pub enum CrawlEvent {
    CrawlStarted {
        base_url: String,
        seeds: usize,
    },
    SitemapLoaded {
        url: String,
        urls: usize,
        priority: usize,
    },
    SitemapFallback {
        url: String,
        reason: String,
    },
    PageStarted {
        url: String,
        depth: u32,
        pages_processed: usize,
        max_pages: usize,
    },
    RedirectFollowed {
        from: String,
        to: String,
    },
    PageSaved {
        url: String,
        path: String,
        links_queued: usize,
        document_links: usize,
    },
    PageSkipped {
        url: String,
        reason: String,
    },
    FetchFailed {
        url: String,
        error: String,
    },
    AuthFailure {
        domain: String,
        failures: u32,
        max_failures: u32,
    },
    DomainBlocked {
        domain: String,
        failures: u32,
    },
    DocumentProcessed {
        url: String,
        status: String,
    },
    Interrupted {
        pages_processed: usize,
    },
    CrawlFinished {
        pages_saved: usize,
        errors: usize,
    },
}

/// Receives crawl events as they happen
pub trait EventSink: Send + Sync {
    fn emit(&self, event: CrawlEvent);
}

/// Forwards events to `tracing` with a level chosen per event kind
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: CrawlEvent) {
        match event {
            CrawlEvent::CrawlStarted { base_url, seeds } => {
                tracing::info!(%base_url, seeds, "Starting crawl");
            }
            CrawlEvent::SitemapLoaded { url, urls, priority } => {
                tracing::info!(%url, urls, priority, "Loaded sitemap");
            }
            CrawlEvent::SitemapFallback { url, reason } => {
                tracing::warn!(%url, %reason, "Sitemap unavailable, seeding from base URL");
            }
            CrawlEvent::PageStarted {
                url,
                depth,
                pages_processed,
                max_pages,
            } => {
                tracing::info!(
                    "[{}/{}] depth {}: {}",
                    pages_processed + 1,
                    max_pages,
                    depth,
                    url
                );
            }
            CrawlEvent::RedirectFollowed { from, to } => {
                tracing::debug!(%from, %to, "Following same-domain redirect");
            }
            CrawlEvent::PageSaved {
                url,
                path,
                links_queued,
                document_links,
            } => {
                tracing::info!(%url, %path, links_queued, document_links, "Saved page");
            }
            CrawlEvent::PageSkipped { url, reason } => {
                tracing::warn!(%url, %reason, "Skipped page");
            }
            CrawlEvent::FetchFailed { url, error } => {
                tracing::warn!(%url, %error, "Fetch failed");
            }
            CrawlEvent::AuthFailure {
                domain,
                failures,
                max_failures,
            } => {
                tracing::warn!(%domain, failures, max_failures, "Authentication failure");
            }
            CrawlEvent::DomainBlocked { domain, failures } => {
                tracing::error!(
                    %domain,
                    failures,
                    "CRITICAL: domain blocked after repeated auth failures; check the crawl token"
                );
            }
            CrawlEvent::DocumentProcessed { url, status } => {
                tracing::info!(%url, %status, "Processed document");
            }
            CrawlEvent::Interrupted { pages_processed } => {
                tracing::warn!(pages_processed, "Crawl interrupted, writing partial summary");
            }
            CrawlEvent::CrawlFinished {
                pages_saved,
                errors,
            } => {
                tracing::info!(pages_saved, errors, "Crawl complete");
            }
        }
    }
}

/// Keeps every event in memory
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<CrawlEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the events received so far
    pub fn events(&self) -> Vec<CrawlEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: CrawlEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}

impl<T: EventSink + ?Sized> EventSink for std::sync::Arc<T> {
    fn emit(&self, event: CrawlEvent) {
        (**self).emit(event)
    }
}
