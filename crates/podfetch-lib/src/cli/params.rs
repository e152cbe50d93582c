use crate::batch::BatchOptions;
use crate::manifest::Manifest;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct FetchParams {
    pub manifest: Manifest,
    pub output_dir: PathBuf,
    /// Archive file for cross-run dedup; `None` disables archive checks.
    pub archive_path: Option<PathBuf>,
    /// External post-processing command, `[program, arg...]`.
    pub postprocess_command: Option<Vec<String>>,
    pub options: BatchOptions,
}
