use crate::output::unique_path;
use crate::processors::ProcessorError;
use chrono::Utc;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Outcome of processing one document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    Success,
    Failed,
}

/// Result record for one processed document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedDocument {
    pub status: ProcessingStatus,
    pub file_path: PathBuf,
    pub output_path: Option<PathBuf>,
    pub content_length: usize,
    pub title: Option<String>,
    pub source_url: Option<String>,
    pub error: Option<String>,
}

impl ProcessedDocument {
    pub fn failed(file_path: &Path, source_url: Option<&str>, error: impl ToString) -> Self {
        Self {
            status: ProcessingStatus::Failed,
            file_path: file_path.to_path_buf(),
            output_path: None,
            content_length: 0,
            title: None,
            source_url: source_url.map(str::to_string),
            error: Some(error.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ProcessingStatus::Success
    }
}

/// Converts a downloaded document into a markdown artifact
///
/// Implementations never fail outright: problems are reported through a
/// `Failed` record so batch callers can keep going.
pub trait DocumentProcessor: Send + Sync {
    /// Returns true if the processor understands this file type
    fn supports(&self, path: &Path) -> bool;

    fn process(&self, path: &Path, source_url: Option<&str>) -> ProcessedDocument;
}

/// Handles `.txt` and `.md` files by wrapping them in a markdown header
#[derive(Debug, Clone)]
pub struct PlainTextProcessor {
    output_dir: PathBuf,
}

impl PlainTextProcessor {
    pub const EXTENSIONS: &'static [&'static str] = &["txt", "md"];

    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn convert(&self, path: &Path, source_url: Option<&str>) -> Result<ProcessedDocument, ProcessorError> {
        let extension = lowercase_extension(path);
        if !Self::EXTENSIONS.contains(&extension.as_str()) {
            return Err(ProcessorError::Unsupported(format!(".{}", extension)));
        }

        let bytes = std::fs::read(path)?;
        let content = String::from_utf8_lossy(&bytes);

        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("document");
        let title = document_title(stem);

        let markdown = format!(
            "# {}\n\n**Source:** {}\n**Type:** {}\n**Processed:** {}\n\n---\n\n{}\n",
            title,
            source_url.unwrap_or("Local file"),
            extension.to_uppercase(),
            Utc::now().to_rfc3339(),
            content
        );

        std::fs::create_dir_all(&self.output_dir)?;
        let output_path = unique_path(&self.output_dir, stem, "md");
        std::fs::write(&output_path, markdown)?;

        tracing::debug!("Processed {} -> {}", path.display(), output_path.display());

        Ok(ProcessedDocument {
            status: ProcessingStatus::Success,
            file_path: path.to_path_buf(),
            output_path: Some(output_path),
            content_length: content.chars().count(),
            title: Some(title),
            source_url: source_url.map(str::to_string),
            error: None,
        })
    }
}

impl DocumentProcessor for PlainTextProcessor {
    fn supports(&self, path: &Path) -> bool {
        Self::EXTENSIONS.contains(&lowercase_extension(path).as_str())
    }

    fn process(&self, path: &Path, source_url: Option<&str>) -> ProcessedDocument {
        self.convert(path, source_url)
            .unwrap_or_else(|e| ProcessedDocument::failed(path, source_url, e))
    }
}

fn lowercase_extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default()
}

/// Turns a file stem like `leave_request-form` into `Leave Request Form`
pub fn document_title(stem: &str) -> String {
    stem.replace(|c: char| c == '-' || c == '_', " ")
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
