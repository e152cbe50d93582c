use std::time::{Duration, Instant};

/// Minimum spacing between progress events for one transfer.
pub(crate) const PROGRESS_INTERVAL: Duration = Duration::from_secs(3);

/// Throttled progress reporting for a single transfer.
///
/// Events stop once the reported fraction reaches 1.0, and are never emitted
/// in quiet mode.
pub struct ProgressReporter {
    marker: String,
    quiet: bool,
    interval: Duration,
    last_report: Option<Instant>,
    finished: bool,
}

impl ProgressReporter {
    pub fn new(marker: &str, quiet: bool) -> Self {
        Self {
            marker: marker.to_string(),
            quiet,
            interval: PROGRESS_INTERVAL,
            last_report: None,
            finished: false,
        }
    }

    #[cfg(test)]
    fn with_interval(marker: &str, quiet: bool, interval: Duration) -> Self {
        Self {
            interval,
            ..Self::new(marker, quiet)
        }
    }

    pub fn report(&mut self, bytes_transferred: u64, bytes_total: Option<u64>) {
        if self.quiet || self.finished {
            return;
        }

        let fraction = bytes_total
            .filter(|total| *total > 0)
            .map(|total| bytes_transferred as f64 / total as f64);

        if let Some(fraction) = fraction
            && fraction >= 1.0
        {
            self.finished = true;
            return;
        }

        let now = Instant::now();
        if let Some(last) = self.last_report
            && now.duration_since(last) < self.interval
        {
            return;
        }
        self.last_report = Some(now);

        match (bytes_total, fraction) {
            (Some(total), Some(fraction)) => tracing::info!(
                marker = %self.marker,
                bytes = bytes_transferred,
                total,
                percent = (fraction * 100.0) as u64,
                "transfer progress"
            ),
            _ => tracing::info!(
                marker = %self.marker,
                bytes = bytes_transferred,
                "transfer progress"
            ),
        }
    }
}
