//! TTL-cached data manager for the monitoring runtime.
//!
//! Wraps [`ingest_from`] with a time-to-live cache and retry logic. Callers
//! use [`DataManager::get_data`] to obtain a fresh-or-cached [`Ingestion`];
//! the manager handles staleness checks, up to three fetch attempts with
//! back-off, and falls back to the last good ingestion on failure.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use monitor_core::error::MonitorError;
use monitor_data::analysis::{ingest_from, Ingestion};
use monitor_data::reader::TableSource;

// ── Defaults ──────────────────────────────────────────────────────────────────

/// Default cache TTL in seconds.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 5;

/// Maximum number of fetch attempts per refresh.
const MAX_RETRY_ATTEMPTS: u32 = 3;

// ── DataManager ───────────────────────────────────────────────────────────────

/// TTL-cached wrapper around fetch → normalize → aggregate.
///
/// # Example
/// ```no_run
/// use monitor_data::reader::FileTableSource;
/// use monitor_runtime::data_manager::DataManager;
///
/// let mut mgr = DataManager::new(Box::new(FileTableSource::new("exports")), 5);
/// if let Some(ingestion) = mgr.get_data(false) {
///     println!("detections: {}", ingestion.stats.detected_count);
/// }
/// ```
pub struct DataManager {
    source: Box<dyn TableSource>,
    cache_ttl: Duration,
    /// Most recent successful ingestion.
    cache: Option<Arc<Ingestion>>,
    cache_timestamp: Option<Instant>,
    last_error: Option<String>,
    last_successful_fetch: Option<Instant>,
}

impl DataManager {
    pub fn new(source: Box<dyn TableSource>, cache_ttl_secs: u64) -> Self {
        Self {
            source,
            cache_ttl: Duration::from_secs(cache_ttl_secs),
            cache: None,
            cache_timestamp: None,
            last_error: None,
            last_successful_fetch: None,
        }
    }

    // ── Public API ────────────────────────────────────────────────────────

    /// Return the current ingestion, refreshing it when the cache is stale.
    ///
    /// When `force_refresh` is `true` the cache is bypassed. On failure the
    /// previous ingestion (if any) is returned and the error is kept for
    /// [`last_error`](Self::last_error).
    ///
    /// Fetch errors are retried up to three times (0 ms → 100 ms → 200 ms);
    /// schema errors are returned straight away since the table will not
    /// change shape between attempts.
    pub fn get_data(&mut self, force_refresh: bool) -> Option<Arc<Ingestion>> {
        if !force_refresh && self.is_cache_valid() {
            tracing::debug!("returning cached ingestion");
            return self.cache.clone();
        }

        match self.fetch_with_retry() {
            Ok(ingestion) => {
                tracing::debug!(
                    rows = ingestion.stats.total_count,
                    detected = ingestion.stats.detected_count,
                    warnings = ingestion.warnings.len(),
                    "ingestion cache updated"
                );
                let now = Instant::now();
                self.cache = Some(Arc::new(ingestion));
                self.cache_timestamp = Some(now);
                self.last_successful_fetch = Some(now);
                self.last_error = None;
            }
            Err(e) => {
                tracing::warn!(
                    source = %self.source.describe(),
                    error = %e,
                    "refresh failed; keeping last good data"
                );
                self.last_error = Some(e.to_string());
            }
        }
        self.cache.clone()
    }

    /// Discard the current cache, forcing the next [`get_data`](Self::get_data)
    /// call to fetch.
    pub fn invalidate_cache(&mut self) {
        self.cache = None;
        self.cache_timestamp = None;
        tracing::debug!("cache invalidated");
    }

    /// Age of the current cache entry, or `None` if nothing has been fetched.
    pub fn cache_age(&self) -> Option<Duration> {
        self.cache_timestamp.map(|ts| ts.elapsed())
    }

    /// Time since the last successful refresh.
    pub fn last_success_age(&self) -> Option<Duration> {
        self.last_successful_fetch.map(|ts| ts.elapsed())
    }

    /// Message of the most recent refresh failure; cleared on success.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn source_description(&self) -> String {
        self.source.describe()
    }

    // ── Private helpers ───────────────────────────────────────────────────

    fn is_cache_valid(&self) -> bool {
        match (self.cache.as_ref(), self.cache_timestamp) {
            (Some(_), Some(ts)) => ts.elapsed() < self.cache_ttl,
            _ => false,
        }
    }

    fn fetch_with_retry(&self) -> Result<Ingestion, MonitorError> {
        let mut attempt = 0;
        loop {
            match ingest_from(self.source.as_ref()) {
                Ok(ingestion) => return Ok(ingestion),
                Err(e) if !e.is_retriable() || attempt + 1 >= MAX_RETRY_ATTEMPTS => {
                    return Err(e)
                }
                Err(e) => tracing::warn!(attempt, error = %e, "fetch attempt failed"),
            }

            attempt += 1;
            let sleep_ms = u64::from(attempt) * 100;
            tracing::debug!(attempt, sleep_ms, "retrying fetch after back-off");
            thread::sleep(Duration::from_millis(sleep_ms));
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use monitor_core::models::RawTable;
    use monitor_data::reader::FileTableSource;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const GOOD_CSV: &str = "Date,Time,Detection\n\
                            2024-12-04,08:00:00,1\n\
                            2024-12-04,09:00:00,0\n";

    /// Returns a manager reading `detections.csv` inside a fresh temp dir.
    fn make_manager_with_dir(ttl_secs: u64) -> (DataManager, tempfile::TempDir) {
        let dir = tempfile::TempDir::new().expect("temp dir");
        fs::write(dir.path().join("detections.csv"), GOOD_CSV).unwrap();
        let source = FileTableSource::new(dir.path().join("detections.csv"));
        (DataManager::new(Box::new(source), ttl_secs), dir)
    }

    /// Counts fetches and hands out a fixed outcome.
    struct CountingSource {
        calls: Arc<AtomicUsize>,
        table: Option<RawTable>,
    }

    impl TableSource for CountingSource {
        fn fetch(&self) -> monitor_core::Result<RawTable> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.table
                .clone()
                .ok_or_else(|| MonitorError::TableFormat("export is being rewritten".into()))
        }

        fn describe(&self) -> String {
            "counting".to_string()
        }
    }

    fn counting_manager(table: Option<RawTable>) -> (DataManager, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let source = CountingSource {
            calls: Arc::clone(&calls),
            table,
        };
        (DataManager::new(Box::new(source), 30), calls)
    }

    #[test]
    fn test_cache_miss_on_first_call() {
        let (mgr, _dir) = make_manager_with_dir(30);
        assert!(!mgr.is_cache_valid());
        assert!(mgr.cache_age().is_none());
        assert!(mgr.last_success_age().is_none());
        assert!(mgr.last_error().is_none());
    }

    #[test]
    fn test_cache_valid_within_ttl() {
        let (mut mgr, _dir) = make_manager_with_dir(30);

        let first = mgr.get_data(false).expect("first fetch");
        assert_eq!(first.stats.total_count, 2);

        let second = mgr.get_data(false).expect("cached");
        assert!(Arc::ptr_eq(&first, &second));
        assert!(mgr.cache_age().unwrap() < Duration::from_secs(5));
    }

    #[test]
    fn test_cache_expired() {
        let (mut mgr, _dir) = make_manager_with_dir(0);

        let first = mgr.get_data(false).unwrap();
        assert!(!mgr.is_cache_valid());

        let second = mgr.get_data(false).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_invalidate_cache() {
        let (mut mgr, _dir) = make_manager_with_dir(30);
        mgr.get_data(false);
        assert!(mgr.cache.is_some());

        mgr.invalidate_cache();
        assert!(mgr.cache.is_none());
        assert!(mgr.cache_age().is_none());
        assert!(mgr.last_success_age().is_some());
    }

    #[test]
    fn test_force_refresh_bypasses_cache() {
        let (mut mgr, _dir) = make_manager_with_dir(60);

        mgr.get_data(false);
        let ts1 = mgr.cache_timestamp.unwrap();
        thread::sleep(Duration::from_millis(10));

        mgr.get_data(true);
        let ts2 = mgr.cache_timestamp.unwrap();
        assert!(ts2 > ts1);
    }

    #[test]
    fn test_refresh_picks_up_new_rows() {
        let (mut mgr, dir) = make_manager_with_dir(60);
        assert_eq!(mgr.get_data(false).unwrap().stats.total_count, 2);

        fs::write(
            dir.path().join("detections.csv"),
            format!("{GOOD_CSV}2024-12-04,10:00:00,1\n"),
        )
        .unwrap();

        assert_eq!(mgr.get_data(false).unwrap().stats.total_count, 2);
        assert_eq!(mgr.get_data(true).unwrap().stats.total_count, 3);
    }

    #[test]
    fn test_schema_error_keeps_last_good_data() {
        let (mut mgr, dir) = make_manager_with_dir(30);
        mgr.get_data(false).unwrap();

        fs::write(
            dir.path().join("detections.csv"),
            "A,B,C,D,E\n2024-12-04,08:00:00,1,x.jpg,cam\n",
        )
        .unwrap();

        let kept = mgr.get_data(true).expect("last good ingestion");
        assert_eq!(kept.stats.total_count, 2);
        let err = mgr.last_error().expect("schema error recorded");
        assert!(err.contains('5'));
        assert!(err.contains("{2, 3, 4}"));

        fs::write(dir.path().join("detections.csv"), GOOD_CSV).unwrap();
        mgr.get_data(true);
        assert!(mgr.last_error().is_none());
    }

    #[test]
    fn test_fetch_errors_are_retried() {
        let (mut mgr, calls) = counting_manager(None);
        assert!(mgr.get_data(false).is_none());
        assert_eq!(calls.load(Ordering::SeqCst), MAX_RETRY_ATTEMPTS as usize);
        assert!(mgr
            .last_error()
            .unwrap()
            .contains("export is being rewritten"));
    }

    #[test]
    fn test_schema_errors_are_not_retried() {
        let wide = RawTable::from_rows([["a", "b", "c", "d", "e"]]);
        let (mut mgr, calls) = counting_manager(Some(wide));
        assert!(mgr.get_data(false).is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_missing_source_reports_error() {
        let source = FileTableSource::new("/definitely/not/here");
        let mut mgr = DataManager::new(Box::new(source), 30);
        assert!(mgr.get_data(false).is_none());
        assert!(mgr.last_error().unwrap().contains("not found"));
        assert_eq!(mgr.source_description(), "/definitely/not/here");
    }
}
