//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the main crawl loop that coordinates all aspects of
//! the crawling process, including:
//! - Seeding the frontier through the configured strategy
//! - Fetching every page through the auth guard
//! - Extracting content and following links
//! - Downloading and processing unmatched documents
//! - Handling interrupts and writing the final reports

use crate::config::{Config, CrawlMode};
use crate::crawler::extractor::ContentExtractor;
use crate::crawler::fetcher::AuthGuard;
use crate::crawler::frontier::{CrawlTask, Frontier};
use crate::crawler::strategy::{strategy_for, CrawlStrategy};
use crate::events::{CrawlEvent, EventSink, TracingSink};
use crate::mapping::{DocumentLink, DocumentMatcher, DocumentResolver, IndexStats, NoopResolver};
use crate::output::{
    unique_path, CrawlSummary, OutputHandler, OutputWriter, PageError, PageRecord, RunStatus,
};
use crate::processors::{
    dropbox_direct_link, DocumentProcessor, PlainTextProcessor, ProcessedDocument,
};
use crate::url::{extract_domain, UrlNormalizer, DOCUMENT_EXTENSIONS};
use crate::{FetchResult, HarvestError};
use chrono::Utc;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use url::Url;

/// What a finished (or interrupted) crawl produced
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    pub summary: CrawlSummary,
    pub output_dir: PathBuf,
}

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Config,
    config_hash: Option<String>,
    guard: AuthGuard,
    strategy: Box<dyn CrawlStrategy>,
    resolver: Box<dyn DocumentResolver>,
    corpus_stats: Option<IndexStats>,
    extractor: ContentExtractor,
    normalizer: UrlNormalizer,
    frontier: Frontier,
    output: Box<dyn OutputHandler + Send>,
    processor: Option<Box<dyn DocumentProcessor>>,
    events: Arc<dyn EventSink>,

    crawl_delay: Duration,
    downloads_dir: PathBuf,
    errors: Vec<PageError>,
    attempted_downloads: HashSet<String>,
    processed_documents: Vec<ProcessedDocument>,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// Builds the corpus index when `documents.corpus-dirs` is set and the
    /// plain-text processor when `documents.download` is on.
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `events` - Receives progress and failure events
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(HarvestError)` - Failed to initialize
    pub fn new(config: Config, events: Arc<dyn EventSink>) -> Result<Self, HarvestError> {
        let guard = AuthGuard::from_config(&config, Arc::clone(&events))?;
        let strategy = strategy_for(&config, Arc::clone(&events));

        let (resolver, corpus_stats): (Box<dyn DocumentResolver>, Option<IndexStats>) =
            if config.documents.corpus_dirs.is_empty() {
                (Box::new(NoopResolver), None)
            } else {
                let matcher = DocumentMatcher::new(config.documents.corpus_dirs.as_slice());
                let stats = matcher.stats();
                (Box::new(matcher), Some(stats))
            };

        let output_dir = PathBuf::from(&config.crawl.output_dir);
        let output = OutputWriter::new(
            &output_dir,
            config.crawl.base_url.clone(),
            resolver.is_enabled(),
        );
        let downloads_dir = output.downloads_dir();
        let processor: Option<Box<dyn DocumentProcessor>> = if config.documents.download {
            Some(Box::new(PlainTextProcessor::new(output_dir.join("documents"))))
        } else {
            None
        };

        Ok(Self {
            guard,
            strategy,
            resolver,
            corpus_stats,
            extractor: ContentExtractor::new(config.crawl.min_content_length),
            normalizer: UrlNormalizer::new(config.crawl.canonical_scheme.clone()),
            frontier: Frontier::new(config.crawl.max_pages, config.crawl.max_depth),
            output: Box::new(output),
            processor,
            events,
            crawl_delay: Duration::from_secs_f64(config.crawl.crawl_delay),
            downloads_dir,
            errors: Vec::new(),
            attempted_downloads: HashSet::new(),
            processed_documents: Vec::new(),
            config_hash: None,
            config,
        })
    }

    /// Records the configuration file hash in the summary
    pub fn with_config_hash(mut self, hash: impl Into<String>) -> Self {
        self.config_hash = Some(hash.into());
        self
    }

    /// Replaces the corpus resolver
    pub fn with_resolver(mut self, resolver: Box<dyn DocumentResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Replaces the document processor used for unmatched document links
    pub fn with_processor(mut self, processor: Box<dyn DocumentProcessor>) -> Self {
        self.processor = Some(processor);
        self
    }

    /// Replaces the output handler
    pub fn with_output(mut self, output: Box<dyn OutputHandler + Send>) -> Self {
        self.output = output;
        self
    }

    /// Runs the crawl until the frontier drains, the page budget is spent or
    /// `shutdown` turns true
    ///
    /// Reports are written in every case. Only failures to prepare the output
    /// directory or write the final reports are returned as errors; page-level
    /// failures, including a page that cannot be written, end up in the summary.
    pub async fn run(
        mut self,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<CrawlOutcome, HarvestError> {
        self.output.prepare()?;

        tracing::info!("Crawl strategy: {}", self.strategy.name());
        let seeds = self.strategy.seed_urls(&mut self.guard).await;
        let queued = self.enqueue(&seeds, 0);
        self.events.emit(CrawlEvent::CrawlStarted {
            base_url: self.config.crawl.base_url.clone(),
            seeds: queued,
        });

        let mut status = RunStatus::Completed;
        loop {
            if *shutdown.borrow() {
                status = RunStatus::Interrupted;
                break;
            }

            let task = match self.frontier.pop() {
                Some(task) => task,
                None => break,
            };

            self.events.emit(CrawlEvent::PageStarted {
                url: task.url.clone(),
                depth: task.depth,
                pages_processed: self.frontier.pages_processed(),
                max_pages: self.config.crawl.max_pages,
            });

            self.process_task(&task).await;
            self.pause(&mut shutdown).await;
        }

        if status == RunStatus::Interrupted {
            self.events.emit(CrawlEvent::Interrupted {
                pages_processed: self.frontier.pages_processed(),
            });
        }

        let summary = self.build_summary(status);
        self.output.finalize(&summary)?;

        self.events.emit(CrawlEvent::CrawlFinished {
            pages_saved: summary.files_saved,
            errors: summary.errors.len(),
        });

        Ok(CrawlOutcome {
            summary,
            output_dir: PathBuf::from(&self.config.crawl.output_dir),
        })
    }

    /// Fetches, extracts and saves one page, then queues its links
    ///
    /// Every successful fetch counts against the page budget, whether or not
    /// the page is saved afterwards.
    async fn process_task(&mut self, task: &CrawlTask) {
        let html = match self.guard.fetch(&task.url).await {
            Ok(html) => html,
            Err(e) => {
                self.events.emit(CrawlEvent::FetchFailed {
                    url: task.url.clone(),
                    error: e.to_string(),
                });
                self.record_error(&task.url, e.to_string());
                return;
            }
        };
        self.frontier.record_processed();

        let page_url = match Url::parse(&task.url) {
            Ok(url) => url,
            Err(e) => {
                self.record_error(&task.url, e.to_string());
                return;
            }
        };

        let page = match self
            .extractor
            .extract(&html, &page_url, self.resolver.as_ref())
        {
            Ok(page) => page,
            Err(e) => {
                self.events.emit(CrawlEvent::PageSkipped {
                    url: task.url.clone(),
                    reason: e.to_string(),
                });
                self.record_error(&task.url, e.to_string());
                return;
            }
        };

        let record = PageRecord {
            url: task.url.clone(),
            title: page.title,
            markdown: page.markdown,
            depth: task.depth,
            crawled_at: Utc::now(),
            classification: page.classification,
            document_links: page.document_links,
        };
        let path = match self.output.save_page(&record) {
            Ok(path) => path,
            Err(e) => {
                tracing::error!("Failed to save {}: {}", task.url, e);
                self.record_error(&task.url, format!("Failed to save page: {}", e));
                return;
            }
        };

        let links_queued = self.enqueue(&page.links, task.depth + 1);

        self.events.emit(CrawlEvent::PageSaved {
            url: task.url.clone(),
            path: path.display().to_string(),
            links_queued,
            document_links: record.document_links.len(),
        });

        if self.processor.is_some() {
            for link in record.document_links.iter().filter(|l| !l.is_matched()) {
                self.process_document(link).await;
            }
        }
    }

    /// Normalizes, filters and queues URLs; returns how many were queued
    fn enqueue(&mut self, urls: &[String], depth: u32) -> usize {
        let mut queued = 0;

        for url in urls {
            let normalized = match self.normalizer.normalize(url) {
                Ok(normalized) => normalized,
                Err(e) => {
                    tracing::debug!("Ignoring {}: {}", url, e);
                    continue;
                }
            };

            if self.strategy.should_skip_url(&normalized) || self.frontier.is_visited(&normalized) {
                continue;
            }

            let priority = self.strategy.link_priority(&normalized);
            if self.frontier.push(CrawlTask::new(normalized, depth, priority)) {
                queued += 1;
            }
        }

        queued
    }

    /// Downloads an unmatched document once and hands it to the processor
    async fn process_document(&mut self, link: &DocumentLink) {
        if !self.attempted_downloads.insert(link.url.clone()) {
            return;
        }

        let result = match self.download_document(&link.url).await {
            Ok(path) => match &self.processor {
                Some(processor) => processor.process(&path, Some(&link.url)),
                None => return,
            },
            Err(e) => ProcessedDocument::failed(
                &self.downloads_dir.join(document_file_name(&link.url)),
                Some(&link.url),
                e,
            ),
        };

        self.events.emit(CrawlEvent::DocumentProcessed {
            url: link.url.clone(),
            status: match &result.error {
                Some(error) => format!("failed: {}", error),
                None => "success".to_string(),
            },
        });
        self.processed_documents.push(result);
    }

    async fn download_document(&mut self, url: &str) -> Result<PathBuf, HarvestError> {
        let bytes = self.guard.download(&dropbox_direct_link(url)).await?;

        std::fs::create_dir_all(&self.downloads_dir)?;
        let file_name = document_file_name(url);
        let (stem, extension) = split_file_name(&file_name);
        let path = unique_path(&self.downloads_dir, stem, extension);
        std::fs::write(&path, bytes)?;

        Ok(path)
    }

    /// Waits for the crawl delay, returning early on shutdown
    async fn pause(&self, shutdown: &mut watch::Receiver<bool>) {
        let sleep = tokio::time::sleep(self.crawl_delay);
        tokio::pin!(sleep);

        tokio::select! {
            _ = &mut sleep => return,
            changed = shutdown.changed() => {
                if changed.is_ok() {
                    return;
                }
            }
        }

        // Sender gone: nobody can interrupt us any more.
        sleep.await;
    }

    fn record_error(&mut self, url: &str, error: String) {
        self.errors.push(PageError {
            url: url.to_string(),
            error,
        });
    }

    fn build_summary(&self, status: RunStatus) -> CrawlSummary {
        let ledger = self.guard.ledger();
        let files = self.output.saved_files();

        CrawlSummary {
            crawl_date: Utc::now().to_rfc3339(),
            base_url: self.config.crawl.base_url.clone(),
            sitemap_url: match self.config.crawl.mode {
                CrawlMode::Sitemap => Some(self.config.effective_sitemap_url()),
                CrawlMode::StartUrl => None,
            },
            status,
            pages_crawled: self.frontier.pages_processed(),
            files_saved: files.len(),
            urls_visited: self.frontier.visited_count(),
            max_depth: self.config.crawl.max_depth,
            document_links_found: self.output.document_links_found(),
            errors: self.errors.clone(),
            files,
            auth_failures_by_domain: ledger.failures_by_domain(),
            blocked_domains: ledger.blocked_domains(),
            config_hash: self.config_hash.clone(),
            corpus: self.corpus_stats,
            processed_documents: self.processed_documents.clone(),
        }
    }
}

/// Local file name for a downloaded document
///
/// The last path segment, or `document`; names without a known document
/// extension get `.pdf`.
fn document_file_name(url: &str) -> String {
    let segment = Url::parse(url)
        .ok()
        .and_then(|u| {
            u.path_segments()
                .and_then(|segments| segments.last().map(str::to_string))
        })
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "document".to_string());

    let cleaned: String = segment
        .chars()
        .map(|c| if c.is_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect();

    let lower = cleaned.to_lowercase();
    if DOCUMENT_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) || lower.ends_with(".txt") {
        cleaned
    } else {
        format!("{}.pdf", cleaned)
    }
}

fn split_file_name(file_name: &str) -> (&str, &str) {
    match file_name.rsplit_once('.') {
        Some((stem, extension)) if !stem.is_empty() => (stem, extension),
        _ => (file_name, "bin"),
    }
}

/// Result of a one-off authentication check
#[derive(Debug, Clone)]
pub struct AuthCheck {
    pub url: String,
    pub domain: Option<String>,
    pub token_configured: bool,
    pub outcome: FetchResult<usize>,
}

impl AuthCheck {
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Fetches the base URL once through the auth guard
///
/// Tells whether the configured token gets past the site's authentication
/// before a full crawl is started.
pub async fn check_auth(config: &Config) -> Result<AuthCheck, HarvestError> {
    let mut guard = AuthGuard::from_config(config, Arc::new(TracingSink))?;
    let url = config.crawl.base_url.clone();
    let domain = Url::parse(&url).ok().and_then(|u| extract_domain(&u));
    let token_configured = domain
        .as_deref()
        .map_or(false, |d| guard.has_token_for(d));

    let outcome = guard.fetch(&url).await.map(|body| body.len());

    Ok(AuthCheck {
        url,
        domain,
        token_configured,
        outcome,
    })
}

/// Runs a complete crawl with events logged through `tracing`
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `config_hash` - Hash of the configuration file, recorded in the summary
/// * `shutdown` - Turns true when the crawl should stop early
pub async fn run_crawl(
    config: Config,
    config_hash: Option<String>,
    shutdown: watch::Receiver<bool>,
) -> Result<CrawlOutcome, HarvestError> {
    let mut coordinator = Coordinator::new(config, Arc::new(TracingSink))?;
    if let Some(hash) = config_hash {
        coordinator = coordinator.with_config_hash(hash);
    }
    coordinator.run(shutdown).await
}
