use crate::mapping::matcher::{DocumentMatch, MatchType};
use serde::Serialize;
use std::path::PathBuf;

/// Matches at or above this confidence count as high-confidence
pub const HIGH_CONFIDENCE_THRESHOLD: f64 = 0.85;

/// High-confidence matches needed for a page to be a document portal
pub const PORTAL_LINK_THRESHOLD: usize = 3;

/// Classification of an extracted page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PageType {
    Content,
    Navigation,
}

impl PageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Content => "content",
            Self::Navigation => "navigation",
        }
    }
}

/// A document link found on a page, with its corpus match
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentLink {
    pub url: String,
    pub text: String,
    pub matched_local_file: Option<PathBuf>,
    pub confidence: f64,
    pub match_type: MatchType,
}

impl DocumentLink {
    pub fn new(url: impl Into<String>, text: impl Into<String>, found: DocumentMatch) -> Self {
        Self {
            url: url.into(),
            text: text.into(),
            matched_local_file: found.path,
            confidence: found.confidence,
            match_type: found.match_type,
        }
    }

    pub fn is_matched(&self) -> bool {
        self.matched_local_file.is_some()
    }

    pub fn is_high_confidence(&self) -> bool {
        self.is_matched() && self.confidence >= HIGH_CONFIDENCE_THRESHOLD
    }
}

fn high_confidence_count(links: &[DocumentLink]) -> usize {
    links.iter().filter(|l| l.is_high_confidence()).count()
}

/// Pages linking to several confidently matched documents are navigation
/// hubs rather than content.
pub fn classify_links(links: &[DocumentLink]) -> PageType {
    if high_confidence_count(links) >= PORTAL_LINK_THRESHOLD {
        PageType::Navigation
    } else {
        PageType::Content
    }
}

/// Page-to-document relationships for one page
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipMetadata {
    pub page_url: String,
    pub page_title: String,
    pub page_type: PageType,
    pub linked_documents: Vec<DocumentLink>,
    pub linked_document_count: usize,
    pub high_confidence_matches: usize,
    pub is_document_portal: bool,
}

/// Builds relationship metadata from a page's document links
///
/// Only links that resolved to a local file are kept in
/// `linked_documents`.
///
/// # Arguments
///
/// * `page_url` - URL of the page the links were found on
/// * `page_title` - Title of that page
/// * `links` - Every document link on the page, matched or not
pub fn generate_relationship_metadata(
    page_url: &str,
    page_title: &str,
    links: &[DocumentLink],
) -> RelationshipMetadata {
    let linked_documents: Vec<DocumentLink> =
        links.iter().filter(|l| l.is_matched()).cloned().collect();
    let high_confidence_matches = high_confidence_count(&linked_documents);
    let page_type = classify_links(links);

    RelationshipMetadata {
        page_url: page_url.to_string(),
        page_title: page_title.to_string(),
        page_type,
        linked_document_count: linked_documents.len(),
        linked_documents,
        high_confidence_matches,
        is_document_portal: high_confidence_matches >= PORTAL_LINK_THRESHOLD,
    }
}
