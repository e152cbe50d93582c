use crate::postprocess::PostProcessor;
use crate::transfer::DEFAULT_MAX_ATTEMPTS;
use std::path::PathBuf;
use std::sync::Arc;
use url::Url;

/// One download to perform, with its dedup and post-processing directives.
/// Immutable for the lifetime of the pipeline run.
pub struct DownloadRequest {
    /// Human-readable label used for log correlation only.
    pub marker: String,
    pub source_url: Url,
    pub destination: PathBuf,
    /// Cross-run dedup key; `None` disables the archive check for this file.
    pub archive_key: Option<String>,
    pub overwrite: bool,
    pub max_attempts: u32,
    pub hook: Option<Arc<dyn PostProcessor>>,
    /// Run the hook even when an existing local file short-circuits the
    /// download. Does not apply to archive-based skips.
    pub always_run_hook_on_skip: bool,
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// Published, post-processed and recorded in the archive.
    Downloaded,
    /// The destination file already existed locally.
    SkippedExisting,
    /// The archive already contained the key.
    SkippedArchived,
    /// The server sent no content.
    SkippedEmpty,
}

/// One episode to fetch, plus any auxiliary files tied to it.
#[derive(Debug, Clone)]
pub struct BatchItem {
    pub marker: String,
    /// `None` when the feed layer failed to resolve an audio URL.
    pub source_url: Option<Url>,
    pub destination: PathBuf,
    pub archive_key: Option<String>,
    pub extras: Vec<ExtraDownload>,
    /// Sidecar metadata, persisted when metadata writing is enabled.
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone)]
pub struct ExtraDownload {
    /// `None` when the feed layer failed to resolve a URL for this file.
    pub source_url: Option<Url>,
    pub destination: PathBuf,
    pub archive_key: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct BatchOptions {
    /// Maximum item pipelines in flight at once.
    pub threads: usize,
    pub max_attempts: u32,
    pub overwrite: bool,
    pub always_postprocess: bool,
    pub write_metadata: bool,
    pub quiet: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            threads: 1,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            overwrite: false,
            always_postprocess: false,
            write_metadata: false,
            quiet: false,
        }
    }
}

/// Summary of one batch invocation, produced exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchResult {
    /// Number of episodes whose full pipeline completed.
    pub downloaded: usize,
    /// Whether any sub-operation of any item failed.
    pub had_errors: bool,
}
