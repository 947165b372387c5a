//! Document processing
//!
//! Downloaded documents are turned into markdown artifacts by a
//! `DocumentProcessor`. Per-format extraction (PDF, Word, PowerPoint, Excel)
//! lives behind that trait; the built-in `PlainTextProcessor` covers text
//! files. Cloud folders are pulled in through the `CloudStorage` trait.

mod cloud;
mod document;

pub use cloud::{
    dropbox_direct_link, ingest_folder, CloudStorage, FileMeta, IngestOptions, IngestReport,
    LocalFolderStorage, MAX_CLOUD_FILE_SIZE, SUPPORTED_CLOUD_EXTENSIONS,
};
pub use document::{
    document_title, DocumentProcessor, PlainTextProcessor, ProcessedDocument, ProcessingStatus,
};

use thiserror::Error;

/// Errors raised while fetching or converting documents
#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("Unsupported file type: {0}")]
    Unsupported(String),

    #[error("Download failed: {0}")]
    Download(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
