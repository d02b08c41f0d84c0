use super::clock::Clock;
use crate::infrastructure::repositories::{ContentStore, StorageError};
use futures::StreamExt;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Retention window for stored audio
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(7 * 24 * 60 * 60);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub scanned: usize,
    pub removed: usize,
    pub failed: usize,
    /// Temp files of writes that never committed
    pub abandoned_removed: usize,
    pub bytes_freed: u64,
}

/// Deletes stored audio older than a retention window
pub struct CacheEvictor {
    store: Arc<dyn ContentStore>,
    clock: Arc<dyn Clock>,
}

impl CacheEvictor {
    pub fn new(store: Arc<dyn ContentStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Remove every entry last modified more than `max_age` ago.
    ///
    /// Per-entry failures are counted in the report. Only a failure to list
    /// the store aborts the sweep.
    pub async fn sweep(&self, max_age: Duration) -> Result<SweepReport, StorageError> {
        let now = self.clock.now();
        let mut report = SweepReport::default();
        let mut entries = self.store.entries();

        while let Some(entry) = entries.next().await {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e @ StorageError::Listing(_)) => return Err(e),
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping unreadable audio entry");
                    report.failed += 1;
                    continue;
                }
            };
            report.scanned += 1;

            // Entries from the future are never expired
            let expired = now
                .signed_duration_since(entry.last_modified)
                .to_std()
                .map(|age| age > max_age)
                .unwrap_or(false);
            if !expired {
                continue;
            }

            match self.store.delete(&entry.key).await {
                Ok(true) => {
                    report.removed += 1;
                    report.bytes_freed += entry.byte_length;
                    tracing::debug!(
                        key = %entry.key,
                        last_modified = %entry.last_modified,
                        "Evicted audio entry"
                    );
                }
                Ok(false) => {}
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!(key = %entry.key, error = %e, "Failed to evict audio entry");
                }
            }
        }

        // An interrupted put leaves its temp file behind
        let cutoff = chrono::Duration::from_std(max_age)
            .ok()
            .and_then(|age| now.checked_sub_signed(age));
        if let Some(cutoff) = cutoff {
            match self.store.purge_abandoned_writes(cutoff).await {
                Ok(purged) => {
                    report.abandoned_removed = purged.removed;
                    report.bytes_freed += purged.bytes_freed;
                }
                Err(e @ StorageError::Listing(_)) => return Err(e),
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!(error = %e, "Failed to purge abandoned audio writes");
                }
            }
        }

        Ok(report)
    }

    /// Sweep on a fixed interval until the task is aborted
    pub fn spawn_periodic(self: Arc<Self>, interval: Duration, max_age: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                match self.sweep(max_age).await {
                    Ok(report) => tracing::info!(
                        scanned = report.scanned,
                        removed = report.removed,
                        failed = report.failed,
                        abandoned_removed = report.abandoned_removed,
                        bytes_freed = report.bytes_freed,
                        "Audio cache sweep finished"
                    ),
                    Err(e) => tracing::error!(error = %e, "Audio cache sweep failed"),
                }
            }
        })
    }
}
