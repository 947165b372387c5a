//! Output module for persisting crawl results
//!
//! This module handles:
//! - Naming and rendering per-page markdown files
//! - Writing the crawl summary, metadata index and document-link reports
//! - The `OutputHandler` seam the crawl loop writes through

mod markdown;
mod traits;
mod writer;

pub use markdown::{render_page, slugify, unique_path};
pub use traits::{
    CrawlSummary, OutputError, OutputHandler, OutputResult, PageError, PageRecord, RunStatus,
};
pub use writer::{
    DocumentLinkEntry, OutputWriter, SavedPage, DOCUMENT_LINKS_FILE, METADATA_FILE,
    RELATIONSHIPS_FILE, SUMMARY_FILE,
};
