use crate::processors::{DocumentProcessor, ProcessedDocument, ProcessorError};
use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Extensions worth downloading from a cloud folder
pub const SUPPORTED_CLOUD_EXTENSIONS: &[&str] =
    &[".pdf", ".docx", ".doc", ".pptx", ".ppt", ".xlsx", ".xls", ".txt"];

/// Files larger than this are skipped (50 MB)
pub const MAX_CLOUD_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// A file entry returned by a folder listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileMeta {
    pub name: String,
    /// Path inside the storage, always starting with `/`
    pub path: String,
    pub id: String,
    pub size: u64,
    pub modified: String,
}

/// A cloud file store documents can be pulled from
#[async_trait]
pub trait CloudStorage: Send + Sync {
    async fn list_folder(&self, path: &str, recursive: bool)
        -> Result<Vec<FileMeta>, ProcessorError>;

    /// Short-lived direct download link
    async fn temporary_link(&self, path: &str) -> Result<Option<String>, ProcessorError>;

    /// Existing shared link, or a newly created one
    async fn shared_link(&self, path: &str) -> Result<Option<String>, ProcessorError>;

    async fn download_file(&self, path: &str, dest: &Path) -> Result<(), ProcessorError>;
}

/// Tuning for `ingest_folder`
#[derive(Debug, Clone)]
pub struct IngestOptions {
    pub max_file_size: u64,
    /// Pause between files
    pub pacing: Duration,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            max_file_size: MAX_CLOUD_FILE_SIZE,
            pacing: Duration::from_millis(500),
        }
    }
}

/// What `ingest_folder` did
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReport {
    pub folder_path: String,
    pub files_found: usize,
    pub files_processed: usize,
    pub files_skipped: usize,
    pub files_failed: usize,
    pub bytes_processed: u64,
    pub files_by_folder: BTreeMap<String, usize>,
    pub processed_files: Vec<ProcessedDocument>,
    pub errors: Vec<String>,
}

/// Lists a folder, downloads every supported file and processes it
///
/// Each download lands in `<downloads_dir>/<subfolder>/`, where the subfolder
/// is the second path component below the listed root (`root` for files
/// directly inside it). The file's shared link becomes its source URL.
pub async fn ingest_folder(
    storage: &dyn CloudStorage,
    processor: &dyn DocumentProcessor,
    folder_path: &str,
    downloads_dir: &Path,
    options: &IngestOptions,
) -> Result<IngestReport, ProcessorError> {
    let listing = storage.list_folder(folder_path, true).await?;
    let files: Vec<FileMeta> = listing
        .into_iter()
        .filter(|f| is_supported(&f.name))
        .collect();

    tracing::info!(
        "Found {} supported files in {}",
        files.len(),
        if folder_path.is_empty() { "(root)" } else { folder_path }
    );

    let mut report = IngestReport {
        folder_path: folder_path.to_string(),
        files_found: files.len(),
        ..IngestReport::default()
    };

    for file in &files {
        *report.files_by_folder.entry(subfolder_of(&file.path)).or_insert(0) += 1;
    }

    for (i, file) in files.iter().enumerate() {
        if i > 0 {
            tokio::time::sleep(options.pacing).await;
        }

        if file.size > options.max_file_size {
            let size_mb = file.size as f64 / 1024.0 / 1024.0;
            tracing::warn!("Skipping {} ({:.1} MB, too large)", file.name, size_mb);
            report
                .errors
                .push(format!("{}: Too large ({:.1} MB)", file.name, size_mb));
            report.files_skipped += 1;
            continue;
        }

        let download_dir = downloads_dir.join(subfolder_of(&file.path).replace(' ', "_").to_lowercase());
        let download_path = download_dir.join(&file.name);

        let downloaded = match tokio::fs::create_dir_all(&download_dir).await {
            Ok(()) => storage.download_file(&file.path, &download_path).await,
            Err(e) => Err(e.into()),
        };
        if let Err(e) = downloaded {
            tracing::warn!("Download failed for {}: {}", file.path, e);
            report.errors.push(format!("{}: Download failed", file.name));
            report.files_failed += 1;
            continue;
        }

        let share_url = match storage.shared_link(&file.path).await {
            Ok(Some(url)) => url,
            Ok(None) | Err(_) => {
                tracing::debug!("No shared link for {}, using fallback", file.path);
                format!("dropbox://{}", file.path)
            }
        };

        let result = processor.process(&download_path, Some(&share_url));
        if result.is_success() {
            report.files_processed += 1;
            report.bytes_processed += file.size;
        } else {
            report.errors.push(format!(
                "{}: {}",
                file.name,
                result.error.as_deref().unwrap_or("Processing failed")
            ));
            report.files_failed += 1;
        }
        report.processed_files.push(result);
    }

    tracing::info!(
        "Ingest complete: {} processed, {} skipped, {} failed",
        report.files_processed,
        report.files_skipped,
        report.files_failed
    );

    Ok(report)
}

fn is_supported(name: &str) -> bool {
    let lower = name.to_lowercase();
    SUPPORTED_CLOUD_EXTENSIONS
        .iter()
        .any(|ext| lower.ends_with(ext))
}

fn subfolder_of(path: &str) -> String {
    let parts: Vec<&str> = path.split('/').collect();
    if parts.len() > 3 {
        parts[2].to_string()
    } else {
        "root".to_string()
    }
}

/// Rewrites a Dropbox share link into a direct-download link
///
/// ```
/// use docharvest::processors::dropbox_direct_link;
///
/// assert_eq!(
///     dropbox_direct_link("https://www.dropbox.com/s/abc/form.pdf?dl=0"),
///     "https://dl.dropboxusercontent.com/s/abc/form.pdf?raw=1"
/// );
/// ```
pub fn dropbox_direct_link(url: &str) -> String {
    if !url.contains("dropbox.com") {
        return url.to_string();
    }
    url.replace("www.dropbox.com", "dl.dropboxusercontent.com")
        .replace("dl=0", "raw=1")
}

/// Serves a local directory through the `CloudStorage` interface
///
/// Used to ingest a synced cloud folder from disk.
#[derive(Debug, Clone)]
pub struct LocalFolderStorage {
    root: PathBuf,
}

impl LocalFolderStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }

    fn file_url(&self, path: &str) -> Option<String> {
        let absolute = std::fs::canonicalize(self.resolve(path)).ok()?;
        Url::from_file_path(absolute).ok().map(|u| u.to_string())
    }

    fn walk(&self, dir: &Path, recursive: bool, out: &mut Vec<FileMeta>) -> std::io::Result<()> {
        let mut entries: Vec<_> = std::fs::read_dir(dir)?.filter_map(|e| e.ok()).collect();
        entries.sort_by_key(|e| e.path());

        for entry in entries {
            let path = entry.path();
            let metadata = entry.metadata()?;
            if metadata.is_dir() {
                if recursive {
                    self.walk(&path, recursive, out)?;
                }
                continue;
            }

            let relative = path.strip_prefix(&self.root).unwrap_or(&path);
            let display = format!("/{}", relative.to_string_lossy().replace('\\', "/"));
            let modified = metadata
                .modified()
                .map(|t| chrono::DateTime::<chrono::Utc>::from(t).to_rfc3339())
                .unwrap_or_default();

            out.push(FileMeta {
                name: entry.file_name().to_string_lossy().into_owned(),
                id: display.clone(),
                path: display,
                size: metadata.len(),
                modified,
            });
        }

        Ok(())
    }
}

#[async_trait]
impl CloudStorage for LocalFolderStorage {
    async fn list_folder(
        &self,
        path: &str,
        recursive: bool,
    ) -> Result<Vec<FileMeta>, ProcessorError> {
        let mut files = Vec::new();
        self.walk(&self.resolve(path), recursive, &mut files)?;
        Ok(files)
    }

    async fn temporary_link(&self, path: &str) -> Result<Option<String>, ProcessorError> {
        Ok(self.file_url(path))
    }

    async fn shared_link(&self, path: &str) -> Result<Option<String>, ProcessorError> {
        Ok(self.file_url(path))
    }

    async fn download_file(&self, path: &str, dest: &Path) -> Result<(), ProcessorError> {
        tokio::fs::copy(self.resolve(path), dest).await?;
        Ok(())
    }
}
