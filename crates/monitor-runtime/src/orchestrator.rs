//! Async monitoring orchestrator.
//!
//! Drives a [`DataManager`] from a tokio task, sending a [`MonitoringData`]
//! snapshot through an `mpsc` channel after every refresh so the TUI event
//! loop never shares mutable state with the fetch path.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use monitor_data::analysis::Ingestion;
use monitor_data::reader::TableSource;
use tokio::sync::{mpsc, Notify};
use tokio::time;

use crate::data_manager::{DataManager, DEFAULT_CACHE_TTL_SECS};

/// Snapshots buffered between the runtime and a slow consumer.
const CHANNEL_CAPACITY: usize = 16;

// ── Public types ──────────────────────────────────────────────────────────────

/// A single monitoring snapshot forwarded to the TUI layer.
#[derive(Debug, Clone)]
pub struct MonitoringData {
    /// Last successful ingestion; `None` until the first one succeeds.
    pub ingestion: Option<Arc<Ingestion>>,
    /// Why the latest refresh failed, if it did.
    pub last_error: Option<String>,
    /// Description of the table source.
    pub source: String,
    /// When this snapshot was produced.
    pub refreshed_at: DateTime<Utc>,
}

impl MonitoringData {
    pub fn has_data(&self) -> bool {
        self.ingestion.is_some()
    }
}

// ── MonitoringOrchestrator ────────────────────────────────────────────────────

/// Background refresh coordinator.
///
/// Call [`MonitoringOrchestrator::start`] to spin up the loop in a dedicated
/// tokio task and receive a channel endpoint for [`MonitoringData`] updates.
pub struct MonitoringOrchestrator {
    update_interval: Duration,
    cache_ttl_secs: u64,
    source: Box<dyn TableSource>,
}

impl MonitoringOrchestrator {
    /// Create a new orchestrator refreshing every `update_interval_secs`.
    pub fn new(update_interval_secs: u64, source: Box<dyn TableSource>) -> Self {
        Self {
            update_interval: Duration::from_secs(update_interval_secs.max(1)),
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            source,
        }
    }

    pub fn with_cache_ttl(mut self, cache_ttl_secs: u64) -> Self {
        self.cache_ttl_secs = cache_ttl_secs;
        self
    }

    /// Start the monitoring loop.
    ///
    /// Returns the snapshot receiver and a [`MonitoringHandle`] for forcing
    /// refreshes and stopping the loop.
    pub fn start(self) -> (mpsc::Receiver<MonitoringData>, MonitoringHandle) {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let refresh = Arc::new(Notify::new());

        let loop_refresh = Arc::clone(&refresh);
        let handle = tokio::spawn(async move {
            self.monitoring_loop(tx, loop_refresh).await;
        });

        (rx, MonitoringHandle { handle, refresh })
    }

    // ── Private implementation ────────────────────────────────────────────

    /// Fetch immediately, then on every tick or refresh request until the
    /// receiver is dropped.
    async fn monitoring_loop(self, tx: mpsc::Sender<MonitoringData>, refresh: Arc<Notify>) {
        let Self {
            update_interval,
            cache_ttl_secs,
            source,
        } = self;
        let mut data_manager = DataManager::new(source, cache_ttl_secs);

        if !fetch_and_send(&mut data_manager, &tx, true).await {
            return;
        }

        let mut interval = time::interval(update_interval);
        // The first tick fires immediately; we already fetched above.
        interval.tick().await;

        loop {
            let force = tokio::select! {
                _ = interval.tick() => false,
                _ = refresh.notified() => {
                    tracing::debug!("manual refresh requested");
                    interval.reset();
                    true
                }
            };

            if tx.is_closed() || !fetch_and_send(&mut data_manager, &tx, force).await {
                tracing::debug!("monitoring channel closed; exiting loop");
                break;
            }
        }
    }
}

/// Refresh and send one snapshot. Returns `false` once the receiver is gone.
async fn fetch_and_send(
    data_manager: &mut DataManager,
    tx: &mpsc::Sender<MonitoringData>,
    force: bool,
) -> bool {
    let ingestion = data_manager.get_data(force);
    let snapshot = MonitoringData {
        ingestion,
        last_error: data_manager.last_error().map(str::to_string),
        source: data_manager.source_description(),
        refreshed_at: Utc::now(),
    };

    if let Err(e) = tx.send(snapshot).await {
        tracing::warn!(error = %e, "failed to send monitoring snapshot; receiver dropped");
        return false;
    }
    true
}

// ── MonitoringHandle ──────────────────────────────────────────────────────────

/// A handle to the background monitoring task.
pub struct MonitoringHandle {
    handle: tokio::task::JoinHandle<()>,
    refresh: Arc<Notify>,
}

impl MonitoringHandle {
    /// Ask the loop for an immediate refresh that bypasses the cache.
    pub fn request_refresh(&self) {
        self.refresh.notify_one();
    }

    /// Immediately abort the monitoring loop.
    pub fn abort(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
