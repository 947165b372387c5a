//! Output handler traits and types
//!
//! This module defines the trait interface for output handlers and the
//! records they persist: saved pages and the end-of-run crawl summary.

use crate::mapping::{DocumentLink, IndexStats, PageType};
use crate::processors::ProcessedDocument;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to prepare output directory {path}: {source}")]
    Prepare {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to serialize output: {0}")]
    Format(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// A successfully extracted page, ready to be written
#[derive(Debug, Clone, PartialEq)]
pub struct PageRecord {
    pub url: String,
    pub title: String,
    pub markdown: String,
    pub depth: u32,
    pub crawled_at: DateTime<Utc>,
    pub classification: PageType,
    pub document_links: Vec<DocumentLink>,
}

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Completed,
    Interrupted,
}

/// A page that produced no record, and why
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageError {
    pub url: String,
    pub error: String,
}

/// Contents of `crawl_summary.json`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlSummary {
    pub crawl_date: String,
    pub base_url: String,
    pub sitemap_url: Option<String>,
    pub status: RunStatus,

    /// Pages fetched successfully, whether or not they were saved
    pub pages_crawled: usize,
    pub files_saved: usize,
    pub urls_visited: usize,
    pub max_depth: u32,
    pub document_links_found: usize,

    pub errors: Vec<PageError>,
    pub files: Vec<String>,
    pub auth_failures_by_domain: BTreeMap<String, u32>,
    pub blocked_domains: Vec<String>,

    pub config_hash: Option<String>,
    pub corpus: Option<IndexStats>,
    pub processed_documents: Vec<ProcessedDocument>,
}

/// Trait for output handlers
///
/// Output handlers persist pages as they are extracted and the reports that
/// describe the run once it ends.
pub trait OutputHandler {
    /// Creates whatever the handler writes into
    ///
    /// Failing here is the one error that aborts a crawl.
    fn prepare(&mut self) -> OutputResult<()>;

    /// Persists one page and returns where it was written
    ///
    /// # Arguments
    ///
    /// * `record` - The extracted page
    fn save_page(&mut self, record: &PageRecord) -> OutputResult<PathBuf>;

    /// Paths of every page saved so far, in save order
    fn saved_files(&self) -> Vec<String>;

    /// Number of document links seen across saved pages
    fn document_links_found(&self) -> usize;

    /// Writes the end-of-run reports
    ///
    /// # Arguments
    ///
    /// * `summary` - Run totals assembled by the crawl loop
    fn finalize(&mut self, summary: &CrawlSummary) -> OutputResult<()>;
}
