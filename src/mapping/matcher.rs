use crate::mapping::index::{normalize_title, strip_query, CorpusIndex, IndexStats};
use crate::url::DOCUMENT_EXTENSIONS;
use difflib::sequencematcher::SequenceMatcher;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Minimum similarity a fuzzy title match has to beat
pub const FUZZY_MATCH_FLOOR: f64 = 0.70;

/// Which strategy produced a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    UrlExact,
    FilenameExact,
    FilenamePartial,
    TitleExact,
    TitleFuzzy,
    NoMatch,
}

impl MatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UrlExact => "url_exact",
            Self::FilenameExact => "filename_exact",
            Self::FilenamePartial => "filename_partial",
            Self::TitleExact => "title_exact",
            Self::TitleFuzzy => "title_fuzzy",
            Self::NoMatch => "no_match",
        }
    }
}

/// Result of resolving a document link against the corpus
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMatch {
    pub path: Option<PathBuf>,
    pub confidence: f64,
    pub match_type: MatchType,
}

impl DocumentMatch {
    pub fn none() -> Self {
        Self {
            path: None,
            confidence: 0.0,
            match_type: MatchType::NoMatch,
        }
    }

    fn found(path: &Path, confidence: f64, match_type: MatchType) -> Self {
        Self {
            path: Some(path.to_path_buf()),
            confidence,
            match_type,
        }
    }

    pub fn is_match(&self) -> bool {
        self.path.is_some()
    }
}

/// Resolves document links to local files
pub trait DocumentResolver: Send + Sync {
    /// Finds the local document that a link most likely refers to
    fn find_matching_document(&self, link_url: &str, link_text: &str) -> DocumentMatch;

    /// False for resolvers that can never match anything
    fn is_enabled(&self) -> bool {
        true
    }
}

/// Resolver used when no corpus is configured
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopResolver;

impl DocumentResolver for NoopResolver {
    fn find_matching_document(&self, _link_url: &str, _link_text: &str) -> DocumentMatch {
        DocumentMatch::none()
    }

    fn is_enabled(&self) -> bool {
        false
    }
}

/// Cross-references document links with a corpus index
///
/// # Strategies
///
/// Tried in this order; the first one that succeeds wins.
///
/// | Strategy | Confidence |
/// |----------|------------|
/// | Cloud-storage URL (query stripped) in the URL index | 1.0 |
/// | Link basename with its document extension swapped for `.md` | 0.95 |
/// | First indexed filename that contains, or is contained in, the basename | 0.85 |
/// | Normalized anchor text in the title index | 0.80 |
/// | Best fuzzy title ratio strictly above 0.70 | the ratio |
#[derive(Debug, Clone)]
pub struct DocumentMatcher {
    index: CorpusIndex,
}

impl DocumentMatcher {
    /// Builds the matcher by scanning the corpus directories
    pub fn new<P: AsRef<Path>>(corpus_dirs: &[P]) -> Self {
        Self::from_index(CorpusIndex::build(corpus_dirs))
    }

    pub fn from_index(index: CorpusIndex) -> Self {
        Self { index }
    }

    pub fn stats(&self) -> IndexStats {
        self.index.stats()
    }

    fn match_cloud_url(&self, link_url: &str) -> Option<DocumentMatch> {
        if !link_url.contains("dropbox.com") && !link_url.contains("drive.google.com") {
            return None;
        }

        self.index
            .lookup_url(strip_query(link_url))
            .map(|path| DocumentMatch::found(path, 1.0, MatchType::UrlExact))
    }

    fn match_filename(&self, link_url: &str) -> Option<DocumentMatch> {
        let basename = link_basename(link_url)?.to_lowercase();

        if let Some(stem) = DOCUMENT_EXTENSIONS
            .iter()
            .find_map(|ext| basename.strip_suffix(ext))
        {
            if let Some(path) = self.index.lookup_filename(&format!("{}.md", stem)) {
                return Some(DocumentMatch::found(path, 0.95, MatchType::FilenameExact));
            }
        }

        self.index
            .filenames()
            .find(|(filename, _)| {
                basename.contains(filename.as_str()) || filename.contains(basename.as_str())
            })
            .map(|(_, path)| DocumentMatch::found(path, 0.85, MatchType::FilenamePartial))
    }

    fn match_title(&self, link_text: &str) -> Option<DocumentMatch> {
        let normalized = normalize_title(link_text);
        if normalized.is_empty() {
            return None;
        }

        if let Some(path) = self.index.lookup_title(&normalized) {
            return Some(DocumentMatch::found(path, 0.80, MatchType::TitleExact));
        }

        let mut best_score = FUZZY_MATCH_FLOOR;
        let mut best_path = None;
        for (title, path) in self.index.titles() {
            let score = similarity(&normalized, title);
            if score > best_score {
                best_score = score;
                best_path = Some(path);
            }
        }

        best_path.map(|path| DocumentMatch::found(path, best_score, MatchType::TitleFuzzy))
    }
}

impl DocumentResolver for DocumentMatcher {
    fn find_matching_document(&self, link_url: &str, link_text: &str) -> DocumentMatch {
        self.match_cloud_url(link_url)
            .or_else(|| self.match_filename(link_url))
            .or_else(|| self.match_title(link_text))
            .unwrap_or_else(DocumentMatch::none)
    }
}

/// Ratcliff/Obershelp ratio: twice the matched characters over both lengths
fn similarity(a: &str, b: &str) -> f64 {
    let mut matcher = SequenceMatcher::new(a, b);
    f64::from(matcher.ratio())
}

/// Last path segment of a link, ignoring query and fragment
fn link_basename(link_url: &str) -> Option<String> {
    let path = match url::Url::parse(link_url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => link_url
            .split(|c: char| c == '?' || c == '#')
            .next()
            .unwrap_or_default()
            .to_string(),
    };

    path.rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_corpus(files: &[(&str, &str)]) -> (TempDir, DocumentMatcher) {
        let dir = TempDir::new().unwrap();
        for (name, content) in files {
            let path = dir.path().join(name);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(path, content).unwrap();
        }
        let matcher = DocumentMatcher::new(&[dir.path()]);
        (dir, matcher)
    }

    #[test]
    fn test_url_exact_for_cloud_links() {
        let (dir, matcher) = create_corpus(&[(
            "handbook.md",
            "---\nurl: https://www.dropbox.com/s/abc/Handbook.pdf\n---\n",
        )]);

        let m = matcher.find_matching_document(
            "https://www.dropbox.com/s/abc/Handbook.pdf?dl=0",
            "Staff handbook",
        );
        assert_eq!(m.match_type, MatchType::UrlExact);
        assert_eq!(m.confidence, 1.0);
        assert_eq!(m.path, Some(dir.path().join("handbook.md")));
    }

    #[test]
    fn test_url_index_is_not_used_for_ordinary_links() {
        let (_dir, matcher) = create_corpus(&[(
            "zzz.md",
            "---\nurl: https://docs.example.com/files/report\n---\n",
        )]);

        let m = matcher.find_matching_document("https://docs.example.com/files/report", "");
        assert_eq!(m.match_type, MatchType::NoMatch);
    }

    #[test]
    fn test_filename_exact_swaps_extension() {
        let (_dir, matcher) = create_corpus(&[("leave-form.md", "# Leave form")]);

        let m = matcher.find_matching_document(
            "https://docs.example.com/files/Leave-Form.PDF?v=2",
            "",
        );
        assert_eq!(m.match_type, MatchType::FilenameExact);
        assert_eq!(m.confidence, 0.95);

        let m = matcher.find_matching_document("/files/leave-form.docx", "");
        assert_eq!(m.match_type, MatchType::FilenameExact);
    }

    #[test]
    fn test_filename_partial_takes_first_hit() {
        let (dir, matcher) = create_corpus(&[
            ("a-budget.md", ""),
            ("budget-2024.xlsx.md", ""),
        ]);

        let m = matcher.find_matching_document("https://docs.example.com/budget-2024.xlsx", "");
        assert_eq!(m.match_type, MatchType::FilenamePartial);
        assert_eq!(m.confidence, 0.85);
        assert_eq!(m.path, Some(dir.path().join("budget-2024.xlsx.md")));
    }

    #[test]
    fn test_title_exact() {
        let (_dir, matcher) = create_corpus(&[("Travel_Policy.md", "")]);

        let m = matcher.find_matching_document("https://docs.example.com/download?id=7", "Travel Policy");
        assert_eq!(m.match_type, MatchType::TitleExact);
        assert_eq!(m.confidence, 0.80);
    }

    #[test]
    fn test_fuzzy_below_floor_is_no_match() {
        // 13 of 20 characters in common: 26 / 40
        let (_dir, matcher) = create_corpus(&[("abcdefghijklmnopqrst.md", "")]);

        let m = matcher.find_matching_document(
            "https://docs.example.com/download?id=7",
            "abcdefghijklm1234567",
        );
        assert_eq!(m, DocumentMatch::none());
    }

    #[test]
    fn test_fuzzy_above_floor_matches() {
        // 18 of 25 characters in common: 36 / 50
        let (dir, matcher) = create_corpus(&[("abcdefghijklmnopqrstuvwxy.md", "")]);

        let m = matcher.find_matching_document(
            "https://docs.example.com/download?id=7",
            "abcdefghijklmnopqr1234567",
        );
        assert_eq!(m.match_type, MatchType::TitleFuzzy);
        assert!((m.confidence - 0.72).abs() < 1e-6);
        assert_eq!(m.path, Some(dir.path().join("abcdefghijklmnopqrstuvwxy.md")));
    }

    #[test]
    fn test_fuzzy_rewards_shared_prefix_over_edit_distance() {
        let (dir, matcher) = create_corpus(&[("employee-handbook.md", "")]);

        let m = matcher.find_matching_document(
            "https://docs.example.com/download?id=12",
            "Employee Handbook 2024 Edition",
        );
        assert_eq!(m.match_type, MatchType::TitleFuzzy);
        assert!((m.confidence - 34.0 / 47.0).abs() < 1e-6);
        assert_eq!(m.path, Some(dir.path().join("employee-handbook.md")));
    }

    #[test]
    fn test_similarity_ratio() {
        assert_eq!(similarity("annual report", "annual report"), 1.0);
        assert_eq!(similarity("abc", "xyz"), 0.0);
        let ratio = similarity("employee handbook 2024 edition", "employee handbook");
        assert!((ratio - 0.7234).abs() < 1e-4);
    }

    #[test]
    fn test_fuzzy_tie_keeps_first_seen() {
        // Both titles share 14 of 15 characters with the anchor text.
        let (dir, matcher) = create_corpus(&[
            ("annual report x.md", ""),
            ("annual report y.md", ""),
        ]);

        let m = matcher.find_matching_document("https://docs.example.com/view", "annual report z");
        assert_eq!(m.match_type, MatchType::TitleFuzzy);
        assert_eq!(m.path, Some(dir.path().join("annual report x.md")));
    }

    #[test]
    fn test_noop_resolver() {
        let resolver = NoopResolver;
        assert!(!resolver.is_enabled());
        assert_eq!(
            resolver.find_matching_document("https://docs.example.com/a.pdf", "A"),
            DocumentMatch::none()
        );
    }

    #[test]
    fn test_link_basename() {
        assert_eq!(
            link_basename("https://docs.example.com/files/a.pdf?x=1#p2"),
            Some("a.pdf".to_string())
        );
        assert_eq!(link_basename("../files/b.docx?dl=1"), Some("b.docx".to_string()));
        assert_eq!(link_basename("https://docs.example.com/"), None);
    }

    #[test]
    fn test_match_type_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&MatchType::TitleFuzzy).unwrap(),
            "\"title_fuzzy\""
        );
        assert_eq!(MatchType::NoMatch.as_str(), "no_match");
    }
}
