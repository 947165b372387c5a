use crate::cached_regex;
use indexmap::IndexMap;
use percent_encoding::percent_decode_str;
use regex::Regex;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Only this many leading characters are searched for a source URL
const SOURCE_URL_SCAN_CHARS: usize = 1000;

/// Lookup tables over a corpus of processed markdown documents
///
/// Built once by a read-only scan and never updated afterwards. When two
/// documents produce the same key the one scanned last wins, but the key
/// keeps its original position in iteration order. Directory entries are
/// visited in sorted order so the result does not depend on the filesystem.
#[derive(Debug, Clone, Default)]
pub struct CorpusIndex {
    filenames: IndexMap<String, PathBuf>,
    titles: IndexMap<String, PathBuf>,
    urls: IndexMap<String, PathBuf>,
    directories_scanned: usize,
    documents: usize,
}

/// Index sizes, as reported in logs and the crawl summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexStats {
    pub total_by_filename: usize,
    pub total_by_title: usize,
    pub total_by_url: usize,
    pub directories_scanned: usize,
    pub documents: usize,
}

impl CorpusIndex {
    /// Scans every root recursively for `.md` files
    ///
    /// Roots that do not exist are skipped. Unreadable files are indexed by
    /// name and title only.
    pub fn build<P: AsRef<Path>>(roots: &[P]) -> Self {
        let mut index = Self::default();

        for root in roots {
            let root = root.as_ref();
            if !root.is_dir() {
                tracing::debug!("Corpus directory {} does not exist, skipping", root.display());
                continue;
            }
            index.directories_scanned += 1;
            index.scan_dir(root);
        }

        tracing::info!(
            "Indexed {} documents ({} by filename, {} by title, {} by URL)",
            index.documents,
            index.filenames.len(),
            index.titles.len(),
            index.urls.len()
        );

        index
    }

    fn scan_dir(&mut self, dir: &Path) {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Cannot read corpus directory {}: {}", dir.display(), e);
                return;
            }
        };

        let mut paths: Vec<PathBuf> = entries.filter_map(|e| e.ok()).map(|e| e.path()).collect();
        paths.sort();

        for path in paths {
            if path.is_dir() {
                self.scan_dir(&path);
            } else if path.extension().map_or(false, |ext| ext == "md") {
                self.index_file(&path);
            }
        }
    }

    fn index_file(&mut self, path: &Path) {
        let file_name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name,
            None => return,
        };
        self.documents += 1;

        self.filenames
            .insert(file_name.to_lowercase(), path.to_path_buf());

        let stem = file_name.strip_suffix(".md").unwrap_or(file_name);
        self.titles.insert(normalize_title(stem), path.to_path_buf());

        if let Ok(bytes) = std::fs::read(path) {
            let content = String::from_utf8_lossy(&bytes);
            let head: String = content.chars().take(SOURCE_URL_SCAN_CHARS).collect();
            if let Some(url) = extract_source_url(&head) {
                self.urls.insert(url, path.to_path_buf());
            }
        }
    }

    pub fn lookup_filename(&self, filename: &str) -> Option<&PathBuf> {
        self.filenames.get(filename)
    }

    pub fn lookup_title(&self, title: &str) -> Option<&PathBuf> {
        self.titles.get(title)
    }

    pub fn lookup_url(&self, url: &str) -> Option<&PathBuf> {
        self.urls.get(url)
    }

    /// Lowercase filenames in scan order
    pub fn filenames(&self) -> impl Iterator<Item = (&String, &PathBuf)> {
        self.filenames.iter()
    }

    /// Normalized titles in scan order
    pub fn titles(&self) -> impl Iterator<Item = (&String, &PathBuf)> {
        self.titles.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.documents == 0
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            total_by_filename: self.filenames.len(),
            total_by_title: self.titles.len(),
            total_by_url: self.urls.len(),
            directories_scanned: self.directories_scanned,
            documents: self.documents,
        }
    }
}

/// Normalizes a title or anchor text for comparison
///
/// Lowercases, drops punctuation other than `-` and `_`, collapses runs of
/// `-`, `_` and whitespace into single spaces, then percent-decodes. The `%`
/// of an escape is stripped before decoding, so `%20` survives as `20`.
///
/// ```
/// use docharvest::mapping::normalize_title;
///
/// assert_eq!(normalize_title("Annual_Leave-Form (2024)"), "annual leave form 2024");
/// assert_eq!(normalize_title("Travel%20Policy"), "travel20policy");
/// ```
pub fn normalize_title(title: &str) -> String {
    static PUNCTUATION: OnceLock<Regex> = OnceLock::new();
    static SEPARATORS: OnceLock<Regex> = OnceLock::new();

    let lowered = title.to_lowercase();
    let stripped = cached_regex(&PUNCTUATION, r"[^\w\s-]").replace_all(&lowered, "");
    let collapsed = cached_regex(&SEPARATORS, r"[-_\s]+").replace_all(&stripped, " ");
    percent_decode_str(&collapsed)
        .decode_utf8_lossy()
        .trim()
        .to_string()
}

/// Recovers the source URL recorded near the top of a processed document
///
/// Looks for a frontmatter `url:` line first, then for a Dropbox or Google
/// Drive link. Cloud links have their query string removed.
pub fn extract_source_url(content: &str) -> Option<String> {
    static FRONTMATTER_URL: OnceLock<Regex> = OnceLock::new();
    static DROPBOX_URL: OnceLock<Regex> = OnceLock::new();
    static DRIVE_URL: OnceLock<Regex> = OnceLock::new();

    if let Some(caps) = cached_regex(&FRONTMATTER_URL, r"(?m)^url:[ \t]*(.+)$").captures(content) {
        let url = caps[1].trim();
        if !url.is_empty() {
            return Some(url.to_string());
        }
    }

    for (cell, pattern) in [
        (&DROPBOX_URL, r"https://[^\s)]*dropbox\.com[^\s)]*"),
        (&DRIVE_URL, r"https://drive\.google\.com[^\s)]*"),
    ] {
        if let Some(m) = cached_regex(cell, pattern).find(content) {
            return Some(strip_query(m.as_str()).to_string());
        }
    }

    None
}

/// Removes everything from the first `?`
pub(crate) fn strip_query(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}
