use super::FetchContext;
use super::types::{DownloadOutcome, DownloadRequest};
use crate::archive::ArchiveError;
use crate::postprocess::PostProcessError;
use crate::transfer::{self, ProgressReporter, TransferError, TransferOutcome};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("No source URL resolved for this file")]
    Resolution,

    #[error(transparent)]
    Transfer(#[from] TransferError),

    #[error("Failed to publish {path}: {reason}")]
    Publish { path: PathBuf, reason: String },

    #[error("Post-processing failed: {0}")]
    PostProcess(#[from] PostProcessError),

    #[error("Failed to record archive key {key}: {source}")]
    ArchiveRecord { key: String, source: ArchiveError },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Staging path for a destination: the destination file name with `.part`
/// appended, so interrupted transfers are identifiable next to their target.
pub(crate) fn staging_path(destination: &Path) -> PathBuf {
    let mut name = destination
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(".part");
    destination.with_file_name(name)
}

/// Run the full pipeline for one file: dedup checks, transfer with retries,
/// atomic publish, post-processing hook, archive record.
///
/// The hook runs on a local-existence skip only when
/// `always_run_hook_on_skip` is set; it never runs on an archive-based skip.
/// A hook or archive failure after publish fails the download even though the
/// file stays on disk.
pub async fn download_one(
    ctx: &FetchContext,
    request: &DownloadRequest,
) -> Result<DownloadOutcome, DownloadError> {
    let destination = &request.destination;

    if !request.overwrite && tokio::fs::try_exists(destination).await? {
        tracing::debug!(
            marker = %request.marker,
            path = %destination.display(),
            "destination already exists, skipping download"
        );
        if request.always_run_hook_on_skip
            && let Some(hook) = &request.hook
        {
            hook.run(destination).await?;
        }
        return Ok(DownloadOutcome::SkippedExisting);
    }

    if let (Some(key), Some(archive)) = (&request.archive_key, &ctx.archive)
        && archive.contains(key).await
    {
        tracing::debug!(
            marker = %request.marker,
            key = %key,
            "already recorded in download archive, skipping download"
        );
        return Ok(DownloadOutcome::SkippedArchived);
    }

    if let Some(parent) = destination.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await?;
    }

    let staging = staging_path(destination);
    let mut progress = ProgressReporter::new(&request.marker, request.quiet);

    match transfer::transfer(
        &ctx.client,
        &request.source_url,
        &staging,
        &mut progress,
        request.max_attempts,
    )
    .await?
    {
        TransferOutcome::Empty => {
            tracing::warn!(
                marker = %request.marker,
                url = %request.source_url,
                "no content written, skipping"
            );
            return Ok(DownloadOutcome::SkippedEmpty);
        }
        TransferOutcome::Complete => {}
    }

    tokio::fs::rename(&staging, destination)
        .await
        .map_err(|e| DownloadError::Publish {
            path: destination.clone(),
            reason: e.to_string(),
        })?;

    if let Some(hook) = &request.hook {
        hook.run(destination).await?;
    }

    if let (Some(key), Some(archive)) = (&request.archive_key, &ctx.archive) {
        archive
            .record(key)
            .await
            .map_err(|source| DownloadError::ArchiveRecord {
                key: key.clone(),
                source,
            })?;
    }

    tracing::info!(
        marker = %request.marker,
        path = %destination.display(),
        "downloaded"
    );
    Ok(DownloadOutcome::Downloaded)
}
