mod item;
mod types;

pub use item::{DownloadError, download_one};
pub use types::{
    BatchItem, BatchOptions, BatchResult, DownloadOutcome, DownloadRequest, ExtraDownload,
};

use crate::archive::DownloadArchive;
use crate::postprocess::{self, PostProcessor};
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::Semaphore;

/// Shared collaborators for all pipelines of one batch.
pub struct FetchContext {
    pub client: reqwest::Client,
    pub archive: Option<Arc<DownloadArchive>>,
}

/// Success counter and failure flag owned by the orchestrator and shared with
/// every item task. The flag is set on the first failure and never cleared.
#[derive(Default)]
struct BatchAccumulator {
    downloaded: AtomicUsize,
    had_errors: AtomicBool,
}

impl BatchAccumulator {
    fn record_download(&self) {
        self.downloaded.fetch_add(1, Ordering::SeqCst);
    }

    fn record_error(&self) {
        self.had_errors.store(true, Ordering::SeqCst);
    }

    fn finish(&self) -> BatchResult {
        BatchResult {
            downloaded: self.downloaded.load(Ordering::SeqCst),
            had_errors: self.had_errors.load(Ordering::SeqCst),
        }
    }
}

/// Fetch every item in the batch under a concurrency limit of
/// `max(options.threads, 1)` item pipelines in flight.
///
/// Never fails as a whole: each per-item error is logged with the item marker
/// and folded into [`BatchResult::had_errors`], and no item's failure stops
/// its siblings. Returns only after every item task, including its extra
/// downloads and metadata sidecar, has settled.
pub async fn run_batch(
    ctx: Arc<FetchContext>,
    items: Vec<BatchItem>,
    hook: Option<Arc<dyn PostProcessor>>,
    options: BatchOptions,
) -> BatchResult {
    let limiter = Arc::new(Semaphore::new(options.threads.max(1)));
    let accumulator = Arc::new(BatchAccumulator::default());

    let mut tasks = FuturesUnordered::new();
    for item in items {
        let ctx = Arc::clone(&ctx);
        let limiter = Arc::clone(&limiter);
        let accumulator = Arc::clone(&accumulator);
        let hook = hook.clone();
        tasks.push(async move {
            let _permit = match limiter.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    // The limiter lives for the whole batch; it cannot close mid-run.
                    tracing::error!(marker = %item.marker, "concurrency limiter closed");
                    accumulator.record_error();
                    return;
                }
            };
            process_item(&ctx, item, hook, options, &accumulator).await;
        });
    }

    while tasks.next().await.is_some() {}
    accumulator.finish()
}

/// One item task: primary download, then extras, then the metadata sidecar,
/// strictly in that order and each independently wrapped.
async fn process_item(
    ctx: &FetchContext,
    item: BatchItem,
    hook: Option<Arc<dyn PostProcessor>>,
    options: BatchOptions,
    accumulator: &BatchAccumulator,
) {
    let marker = item.marker.clone();

    let primary = match &item.source_url {
        Some(url) => {
            let request = DownloadRequest {
                marker: marker.clone(),
                source_url: url.clone(),
                destination: item.destination.clone(),
                archive_key: item.archive_key.clone(),
                overwrite: options.overwrite,
                max_attempts: options.max_attempts,
                hook,
                always_run_hook_on_skip: options.always_postprocess,
                quiet: options.quiet,
            };
            download_one(ctx, &request).await
        }
        None => Err(DownloadError::Resolution),
    };

    match primary {
        Ok(DownloadOutcome::Downloaded) => accumulator.record_download(),
        Ok(_) => {}
        Err(e) => {
            tracing::error!(marker = %marker, error = %e, "episode download failed");
            accumulator.record_error();
        }
    }

    for extra in &item.extras {
        let result = match &extra.source_url {
            Some(url) => {
                let request = DownloadRequest {
                    marker: marker.clone(),
                    source_url: url.clone(),
                    destination: extra.destination.clone(),
                    archive_key: extra.archive_key.clone(),
                    overwrite: options.overwrite,
                    max_attempts: options.max_attempts,
                    hook: None,
                    always_run_hook_on_skip: false,
                    quiet: options.quiet,
                };
                download_one(ctx, &request).await
            }
            None => Err(DownloadError::Resolution),
        };
        if let Err(e) = result {
            tracing::error!(
                marker = %marker,
                path = %extra.destination.display(),
                error = %e,
                "extra download failed"
            );
            accumulator.record_error();
        }
    }

    if options.write_metadata
        && let Some(metadata) = &item.metadata
    {
        match postprocess::write_metadata_sidecar(&item.destination, metadata).await {
            Ok(path) => {
                tracing::debug!(marker = %marker, path = %path.display(), "wrote metadata sidecar");
            }
            Err(e) => {
                tracing::error!(marker = %marker, error = %e, "metadata sidecar write failed");
                accumulator.record_error();
            }
        }
    }
}
