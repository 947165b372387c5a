//! Cross-referencing of document links with a local corpus
//!
//! A corpus is a set of directories holding markdown files produced from
//! previously processed documents (PDFs, office files, cloud downloads).
//! The matcher resolves a link found during a crawl to the local file it
//! most likely refers to, with a confidence score.

mod index;
mod matcher;
mod relationship;

pub use index::{extract_source_url, normalize_title, CorpusIndex, IndexStats};
pub use matcher::{
    DocumentMatch, DocumentMatcher, DocumentResolver, MatchType, NoopResolver, FUZZY_MATCH_FLOOR,
};
pub use relationship::{
    classify_links, generate_relationship_metadata, DocumentLink, PageType, RelationshipMetadata,
    HIGH_CONFIDENCE_THRESHOLD, PORTAL_LINK_THRESHOLD,
};
