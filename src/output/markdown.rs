//! Page file naming and rendering
//!
//! Every saved page becomes one markdown file with a small frontmatter
//! block. File names are derived from the URL path so reruns produce the
//! same names.

use crate::cached_regex;
use crate::output::traits::PageRecord;
use regex::Regex;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Slugs are cut to this many characters
const MAX_SLUG_CHARS: usize = 100;

/// Derives a file-name slug from a page URL
///
/// The path is stripped of slashes and page extensions, with `/` turned into
/// `-`. A query string adds the first 8 hex characters of its SHA-256 so that
/// `?page=1` and `?page=2` get different files.
///
/// ```
/// use docharvest::output::slugify;
///
/// assert_eq!(slugify("https://docs.example.com/"), "index");
/// assert_eq!(slugify("https://docs.example.com/guides/setup.html"), "guides-setup");
/// ```
pub fn slugify(url: &str) -> String {
    static PAGE_EXTENSION: OnceLock<Regex> = OnceLock::new();
    static NON_WORD: OnceLock<Regex> = OnceLock::new();
    static DASH_RUNS: OnceLock<Regex> = OnceLock::new();

    let (path, query) = match url::Url::parse(url) {
        Ok(parsed) => (
            parsed.path().to_string(),
            parsed.query().map(str::to_string),
        ),
        Err(_) => (url.to_string(), None),
    };

    let trimmed = match path.trim_matches('/') {
        "" => "index",
        p => p,
    };

    let mut slug = cached_regex(&PAGE_EXTENSION, r"(?i)\.(html?|php|aspx?)$")
        .replace(trimmed, "")
        .replace('/', "-");

    if let Some(query) = query.filter(|q| !q.is_empty()) {
        let digest = hex::encode(Sha256::digest(query.as_bytes()));
        slug.push('-');
        slug.push_str(&digest[..8]);
    }

    let slug = cached_regex(&NON_WORD, r"[^\w-]").replace_all(&slug, "-");
    let slug = cached_regex(&DASH_RUNS, r"-+").replace_all(&slug, "-");
    let slug: String = slug.trim_matches('-').chars().take(MAX_SLUG_CHARS).collect();
    let slug = slug.trim_end_matches('-');

    if slug.is_empty() {
        "index".to_string()
    } else {
        slug.to_string()
    }
}

/// Returns `<dir>/<stem>.<ext>`, or the first free `<stem>_<n>.<ext>`
pub fn unique_path(dir: &Path, stem: &str, extension: &str) -> PathBuf {
    let mut candidate = dir.join(format!("{}.{}", stem, extension));
    let mut counter = 1;
    while candidate.exists() {
        candidate = dir.join(format!("{}_{}.{}", stem, counter, extension));
        counter += 1;
    }
    candidate
}

/// Renders a page record as a markdown file
pub fn render_page(record: &PageRecord) -> String {
    let title = record.title.replace(|c: char| c == '\r' || c == '\n', " ");
    let mut md = String::new();

    md.push_str("---\n");
    md.push_str(&format!("url: {}\n", record.url));
    md.push_str(&format!("title: {}\n", title));
    md.push_str(&format!("crawled: {}\n", record.crawled_at.to_rfc3339()));
    md.push_str(&format!("depth: {}\n", record.depth));
    md.push_str(&format!("page_type: {}\n", record.classification.as_str()));
    md.push_str("---\n\n");

    md.push_str(&format!("# {}\n\n", title));
    md.push_str(record.markdown.trim_end());
    md.push('\n');

    if !record.document_links.is_empty() {
        md.push_str("\n## Related Documents\n\n");
        for link in &record.document_links {
            let text = if link.text.is_empty() {
                link.url.as_str()
            } else {
                link.text.as_str()
            };
            md.push_str(&format!("- [{}]({})", text, link.url));
            if let Some(local) = &link.matched_local_file {
                md.push_str(&format!(
                    " (local: {}, {}, {:.2})",
                    local.display(),
                    link.match_type.as_str(),
                    link.confidence
                ));
            }
            md.push('\n');
        }
    }

    md
}
