//! Ingestion pipeline: fetch → normalize → aggregate.
//!
//! Produces an [`Ingestion`] ready for the runtime and UI layers. Each call
//! is a complete, independent recomputation.

use std::time::Instant;

use chrono::Utc;
use monitor_core::error::Result;
use monitor_core::models::{CellParseWarning, ColumnSchema, Detection, RawTable};
use serde::Serialize;
use tracing::{debug, warn};

use crate::aggregator::{aggregate, time_warnings, AggregateStats};
use crate::normalizer::normalize_with_warnings;
use crate::reader::TableSource;

// ── Public types ──────────────────────────────────────────────────────────────

/// Metadata produced alongside an ingestion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestionMetadata {
    /// RFC 3339 timestamp when this ingestion ran.
    pub generated_at: String,
    /// Data rows received from the source.
    pub rows_received: usize,
    /// Column count reported by the source.
    pub columns_received: usize,
    /// Canonical column names the table was read with.
    pub columns: Vec<&'static str>,
    /// Source columns dropped because they were entirely blank.
    pub dropped_columns: usize,
    /// Source rows dropped because they were entirely blank.
    pub dropped_rows: usize,
    /// Wall-clock seconds spent in normalize + aggregate.
    pub process_time_seconds: f64,
}

/// The complete output of [`ingest`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ingestion {
    /// Normalized detections in source order.
    pub detections: Vec<Detection>,
    /// Derived statistics.
    pub stats: AggregateStats,
    /// Cell-level coercions and exclusions, flag warnings first.
    pub warnings: Vec<CellParseWarning>,
    /// Metadata about this run.
    pub metadata: IngestionMetadata,
}

impl Ingestion {
    /// The `n` most recent detections, newest first.
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &Detection> {
        self.detections.iter().rev().take(n)
    }
}

// ── Public functions ──────────────────────────────────────────────────────────

/// Normalize and aggregate an already fetched table.
///
/// Fails only with a schema error; every cell-level problem is logged at
/// `warn` and kept in [`Ingestion::warnings`].
pub fn ingest(table: &RawTable) -> Result<Ingestion> {
    let started = Instant::now();

    let normalized = normalize_with_warnings(table)?;
    let stats = aggregate(&normalized.detections);

    let mut warnings = normalized.warnings;
    warnings.extend(time_warnings(&normalized.detections));
    for warning in &warnings {
        warn!("{}", warning);
    }

    let metadata = IngestionMetadata {
        generated_at: Utc::now().to_rfc3339(),
        rows_received: table.len(),
        columns_received: table.column_count(),
        columns: normalized
            .schema
            .map(ColumnSchema::column_names)
            .unwrap_or_default()
            .to_vec(),
        dropped_columns: normalized.dropped_columns.len(),
        dropped_rows: normalized.dropped_rows,
        process_time_seconds: started.elapsed().as_secs_f64(),
    };

    debug!(
        rows = stats.total_count,
        detected = stats.detected_count,
        warnings = warnings.len(),
        "ingestion complete"
    );

    Ok(Ingestion {
        detections: normalized.detections,
        stats,
        warnings,
        metadata,
    })
}

/// Fetch the table from `source` and ingest it.
pub fn ingest_from(source: &dyn TableSource) -> Result<Ingestion> {
    let table = source.fetch()?;
    ingest(&table)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use monitor_core::MonitorError;
    use std::io;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl LogBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    struct StaticSource(RawTable);

    impl TableSource for StaticSource {
        fn fetch(&self) -> Result<RawTable> {
            Ok(self.0.clone())
        }

        fn describe(&self) -> String {
            "static".to_string()
        }
    }

    fn sample() -> RawTable {
        RawTable::from_rows([
            ["2024-12-04", "08:00:00", "1"],
            ["2024-12-04", "25:99:00", "x"],
            ["2024-12-04", "10:00:00", "1"],
        ])
    }

    #[test]
    fn test_ingest_collects_flag_then_time_warnings() {
        let ingestion = ingest(&sample()).unwrap();
        assert_eq!(ingestion.warnings.len(), 2);
        assert!(matches!(
            ingestion.warnings[0],
            CellParseWarning::InvalidFlag { row: 1, .. }
        ));
        assert!(matches!(
            ingestion.warnings[1],
            CellParseWarning::InvalidTime { row: 1, .. }
        ));
    }

    #[test]
    fn test_ingest_logs_each_cell_warning() {
        let buffer = LogBuffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            ingest(&sample()).unwrap();
        });

        let logged = buffer.contents();
        assert_eq!(logged.matches("WARN").count(), 2);
        assert!(logged.contains(r#"row 1: invalid detection flag "x", treated as 0"#));
        assert!(logged.contains(r#"row 1: unparseable time "25:99:00""#));
    }

    #[test]
    fn test_ingest_metadata() {
        let ingestion = ingest(&sample()).unwrap();
        assert_eq!(ingestion.metadata.rows_received, 3);
        assert_eq!(ingestion.metadata.columns_received, 3);
        assert_eq!(ingestion.metadata.columns, vec!["Date", "Time", "Detection"]);
        assert_eq!(ingestion.metadata.dropped_rows, 0);
    }

    #[test]
    fn test_ingest_empty_table() {
        let ingestion = ingest(&RawTable::default()).unwrap();
        assert!(ingestion.detections.is_empty());
        assert!(ingestion.metadata.columns.is_empty());
        assert_eq!(ingestion.stats, AggregateStats::empty());
    }

    #[test]
    fn test_ingest_propagates_schema_error() {
        let table = RawTable::from_rows([["a", "b", "c", "d", "e"]]);
        assert!(matches!(ingest(&table), Err(MonitorError::Schema { found: 5 })));
    }

    #[test]
    fn test_ingest_from_source() {
        let ingestion = ingest_from(&StaticSource(sample())).unwrap();
        assert_eq!(ingestion.stats.total_count, 3);
        assert_eq!(ingestion.stats.detected_count, 2);
    }

    #[test]
    fn test_recent_is_newest_first() {
        let ingestion = ingest(&sample()).unwrap();
        let times: Vec<&str> = ingestion.recent(2).map(|d| d.time.as_str()).collect();
        assert_eq!(times, vec!["10:00:00", "25:99:00"]);
    }
}
