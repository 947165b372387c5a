//! Filesystem output handler
//!
//! Writes one markdown file per page into the output directory and, at the
//! end of the run, the JSON reports consumed by the ingestion pipeline.

use crate::mapping::{generate_relationship_metadata, RelationshipMetadata};
use crate::output::markdown::{render_page, slugify, unique_path};
use crate::output::traits::{CrawlSummary, OutputError, OutputHandler, OutputResult, PageRecord};
use chrono::Utc;
use serde::Serialize;
use std::path::PathBuf;

pub const SUMMARY_FILE: &str = "crawl_summary.json";
pub const METADATA_FILE: &str = "_metadata.json";
pub const DOCUMENT_LINKS_FILE: &str = "pdf_links.json";
pub const RELATIONSHIPS_FILE: &str = "document_relationships.json";

/// One saved page as listed in `_metadata.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavedPage {
    pub filename: String,
    pub url: String,
    pub title: String,
    #[serde(skip)]
    pub path: PathBuf,
}

/// One entry of `pdf_links.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentLinkEntry {
    pub url: String,
    pub text: String,
    pub found_on: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MetadataIndex<'a> {
    crawled_at: String,
    base_url: &'a str,
    files: &'a [SavedPage],
}

/// Writes crawl output to a directory
pub struct OutputWriter {
    output_dir: PathBuf,
    base_url: String,
    saved: Vec<SavedPage>,
    document_links: Vec<DocumentLinkEntry>,

    /// `None` when no corpus is configured
    relationships: Option<Vec<RelationshipMetadata>>,
}

impl OutputWriter {
    /// Creates a writer
    ///
    /// # Arguments
    ///
    /// * `output_dir` - Directory that receives every output file
    /// * `base_url` - Site root recorded in `_metadata.json`
    /// * `track_relationships` - Write `document_relationships.json`
    pub fn new(
        output_dir: impl Into<PathBuf>,
        base_url: impl Into<String>,
        track_relationships: bool,
    ) -> Self {
        Self {
            output_dir: output_dir.into(),
            base_url: base_url.into(),
            saved: Vec::new(),
            document_links: Vec::new(),
            relationships: track_relationships.then(Vec::new),
        }
    }

    /// Where downloaded documents are stored
    pub fn downloads_dir(&self) -> PathBuf {
        self.output_dir.join("downloads")
    }

    fn write_json<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> OutputResult<()> {
        let path = self.output_dir.join(name);
        std::fs::write(&path, serde_json::to_string_pretty(value)?)?;
        tracing::info!("Wrote {}", path.display());
        Ok(())
    }
}

impl OutputHandler for OutputWriter {
    fn prepare(&mut self) -> OutputResult<()> {
        std::fs::create_dir_all(&self.output_dir).map_err(|source| OutputError::Prepare {
            path: self.output_dir.clone(),
            source,
        })
    }

    fn save_page(&mut self, record: &PageRecord) -> OutputResult<PathBuf> {
        let path = unique_path(&self.output_dir, &slugify(&record.url), "md");
        std::fs::write(&path, render_page(record))?;

        self.saved.push(SavedPage {
            filename: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            url: record.url.clone(),
            title: record.title.clone(),
            path: path.clone(),
        });

        self.document_links
            .extend(record.document_links.iter().map(|link| DocumentLinkEntry {
                url: link.url.clone(),
                text: link.text.clone(),
                found_on: record.url.clone(),
            }));

        if let Some(relationships) = self.relationships.as_mut() {
            if record.document_links.iter().any(|l| l.is_matched()) {
                relationships.push(generate_relationship_metadata(
                    &record.url,
                    &record.title,
                    &record.document_links,
                ));
            }
        }

        Ok(path)
    }

    fn saved_files(&self) -> Vec<String> {
        self.saved
            .iter()
            .map(|p| p.path.to_string_lossy().into_owned())
            .collect()
    }

    fn document_links_found(&self) -> usize {
        self.document_links.len()
    }

    fn finalize(&mut self, summary: &CrawlSummary) -> OutputResult<()> {
        self.write_json(SUMMARY_FILE, summary)?;

        self.write_json(
            METADATA_FILE,
            &MetadataIndex {
                crawled_at: Utc::now().to_rfc3339(),
                base_url: &self.base_url,
                files: &self.saved,
            },
        )?;

        if !self.document_links.is_empty() {
            self.write_json(DOCUMENT_LINKS_FILE, &self.document_links)?;
        }

        if let Some(relationships) = &self.relationships {
            self.write_json(RELATIONSHIPS_FILE, relationships)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::{DocumentLink, DocumentMatch, MatchType, PageType};
    use crate::output::traits::RunStatus;
    use std::collections::BTreeMap;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_record(url: &str, links: Vec<DocumentLink>) -> PageRecord {
        PageRecord {
            url: url.to_string(),
            title: "Guide".to_string(),
            markdown: "Body".to_string(),
            depth: 0,
            crawled_at: Utc::now(),
            classification: PageType::Content,
            document_links: links,
        }
    }

    fn create_test_summary(files: Vec<String>) -> CrawlSummary {
        CrawlSummary {
            crawl_date: Utc::now().to_rfc3339(),
            base_url: "https://docs.example.com".to_string(),
            sitemap_url: None,
            status: RunStatus::Completed,
            pages_crawled: files.len(),
            files_saved: files.len(),
            urls_visited: files.len(),
            max_depth: 4,
            document_links_found: 0,
            errors: Vec::new(),
            files,
            auth_failures_by_domain: BTreeMap::new(),
            blocked_domains: Vec::new(),
            config_hash: None,
            corpus: None,
            processed_documents: Vec::new(),
        }
    }

    fn matched_link() -> DocumentLink {
        DocumentLink::new(
            "https://docs.example.com/files/leave.pdf",
            "Leave form",
            DocumentMatch {
                path: Some("/corpus/leave.md".into()),
                confidence: 0.95,
                match_type: MatchType::FilenameExact,
            },
        )
    }

    #[test]
    fn test_prepare_fails_when_path_is_a_file() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("out");
        fs::write(&blocker, "not a directory").unwrap();

        let mut writer = OutputWriter::new(&blocker, "https://docs.example.com", false);
        assert!(matches!(writer.prepare(), Err(OutputError::Prepare { .. })));
    }

    #[test]
    fn test_same_slug_gets_suffix() {
        let dir = TempDir::new().unwrap();
        let mut writer = OutputWriter::new(dir.path(), "https://docs.example.com", false);
        writer.prepare().unwrap();

        let first = writer
            .save_page(&create_test_record("https://docs.example.com/guide", vec![]))
            .unwrap();
        let second = writer
            .save_page(&create_test_record("https://docs.example.com/guide.html", vec![]))
            .unwrap();

        assert_eq!(first, dir.path().join("guide.md"));
        assert_eq!(second, dir.path().join("guide_1.md"));
        assert_eq!(writer.saved_files().len(), 2);
    }

    #[test]
    fn test_finalize_writes_reports() {
        let dir = TempDir::new().unwrap();
        let mut writer = OutputWriter::new(dir.path(), "https://docs.example.com", true);
        writer.prepare().unwrap();

        writer
            .save_page(&create_test_record(
                "https://docs.example.com/forms",
                vec![matched_link()],
            ))
            .unwrap();
        writer
            .save_page(&create_test_record("https://docs.example.com/about", vec![]))
            .unwrap();

        assert_eq!(writer.document_links_found(), 1);
        writer
            .finalize(&create_test_summary(writer.saved_files()))
            .unwrap();

        let summary: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join(SUMMARY_FILE)).unwrap())
                .unwrap();
        assert_eq!(summary["status"], "completed");
        assert_eq!(summary["filesSaved"], 2);
        assert!(summary["authFailuresByDomain"].is_object());

        let metadata: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join(METADATA_FILE)).unwrap())
                .unwrap();
        assert_eq!(metadata["baseUrl"], "https://docs.example.com");
        assert_eq!(metadata["files"][0]["filename"], "forms.md");
        assert_eq!(metadata["files"][1]["url"], "https://docs.example.com/about");

        let links: serde_json::Value = serde_json::from_str(
            &fs::read_to_string(dir.path().join(DOCUMENT_LINKS_FILE)).unwrap(),
        )
        .unwrap();
        assert_eq!(links[0]["foundOn"], "https://docs.example.com/forms");
        assert_eq!(links[0]["text"], "Leave form");

        let relationships: serde_json::Value = serde_json::from_str(
            &fs::read_to_string(dir.path().join(RELATIONSHIPS_FILE)).unwrap(),
        )
        .unwrap();
        assert_eq!(relationships.as_array().unwrap().len(), 1);
        assert_eq!(relationships[0]["pageUrl"], "https://docs.example.com/forms");
    }

    #[test]
    fn test_no_document_links_file_without_links() {
        let dir = TempDir::new().unwrap();
        let mut writer = OutputWriter::new(dir.path(), "https://docs.example.com", false);
        writer.prepare().unwrap();
        writer
            .save_page(&create_test_record("https://docs.example.com/", vec![]))
            .unwrap();
        writer
            .finalize(&create_test_summary(writer.saved_files()))
            .unwrap();

        assert!(dir.path().join(SUMMARY_FILE).exists());
        assert!(dir.path().join("index.md").exists());
        assert!(!dir.path().join(DOCUMENT_LINKS_FILE).exists());
        assert!(!dir.path().join(RELATIONSHIPS_FILE).exists());
    }
}
