mod progress;

pub use progress::ProgressReporter;

use futures::StreamExt;
use reqwest::Client;
use std::path::Path;
use thiserror::Error;
use tokio::io::{AsyncWriteExt, BufWriter};
use url::Url;

/// Default number of transfer attempts per download.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

#[derive(Error, Debug)]
pub enum TransferError {
    #[error("Metadata probe failed for {url}: {reason}")]
    Probe { url: String, reason: String },

    #[error("Transfer failed for {url} after {attempts} attempts: {reason}")]
    Stream {
        url: String,
        attempts: u32,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOutcome {
    /// The staging file holds the complete body.
    Complete,
    /// The server sent no content; the staging file was removed.
    Empty,
}

enum AttemptFailure {
    Probe(String),
    Stream(String),
}

/// Download one URL into `staging_path`.
///
/// Stream failures are retried immediately, without backoff or error
/// classification, until `max_attempts` total attempts are exhausted. A probe
/// failure is never retried and surfaces as [`TransferError::Probe`] even when
/// it occurs on a retry attempt. A completed but empty body is reported as
/// [`TransferOutcome::Empty`] rather than an error.
pub async fn transfer(
    client: &Client,
    url: &Url,
    staging_path: &Path,
    progress: &mut ProgressReporter,
    max_attempts: u32,
) -> Result<TransferOutcome, TransferError> {
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match run_attempt(client, url, staging_path, progress).await {
            Ok(bytes_written) => {
                if bytes_written == 0 {
                    remove_staging(staging_path).await;
                    return Ok(TransferOutcome::Empty);
                }
                return Ok(TransferOutcome::Complete);
            }
            Err(AttemptFailure::Probe(reason)) => {
                return Err(TransferError::Probe {
                    url: url.to_string(),
                    reason,
                });
            }
            Err(AttemptFailure::Stream(reason)) => {
                remove_staging(staging_path).await;
                if attempt < max_attempts {
                    tracing::warn!(
                        url = %url,
                        attempt,
                        max_attempts,
                        reason = %reason,
                        "transfer attempt failed, retrying"
                    );
                    attempt += 1;
                    continue;
                }
                return Err(TransferError::Stream {
                    url: url.to_string(),
                    attempts: attempt,
                    reason,
                });
            }
        }
    }
}

async fn run_attempt(
    client: &Client,
    url: &Url,
    staging_path: &Path,
    progress: &mut ProgressReporter,
) -> Result<u64, AttemptFailure> {
    let head = client
        .head(url.clone())
        .send()
        .await
        .and_then(|response| response.error_for_status())
        .map_err(|e| AttemptFailure::Probe(e.to_string()))?;

    let bytes_total = head
        .headers()
        .get(reqwest::header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<u64>().ok());

    let response = client
        .get(url.clone())
        .send()
        .await
        .and_then(|response| response.error_for_status())
        .map_err(|e| AttemptFailure::Stream(e.to_string()))?;

    let file = tokio::fs::File::create(staging_path)
        .await
        .map_err(|e| AttemptFailure::Stream(e.to_string()))?;
    let mut writer = BufWriter::new(file);

    let mut stream = response.bytes_stream();
    let mut bytes_written = 0u64;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| AttemptFailure::Stream(e.to_string()))?;
        writer
            .write_all(&chunk)
            .await
            .map_err(|e| AttemptFailure::Stream(e.to_string()))?;
        bytes_written += chunk.len() as u64;
        progress.report(bytes_written, bytes_total);
    }

    writer
        .flush()
        .await
        .map_err(|e| AttemptFailure::Stream(e.to_string()))?;

    Ok(bytes_written)
}

async fn remove_staging(staging_path: &Path) {
    if let Err(e) = tokio::fs::remove_file(staging_path).await
        && e.kind() != std::io::ErrorKind::NotFound
    {
        tracing::warn!(
            path = %staging_path.display(),
            error = %e,
            "failed to remove staging file"
        );
    }
}
