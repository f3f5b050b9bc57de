//! Data layer for Parking Monitor.
//!
//! Reads spreadsheet exports of the detection table, normalizes them into a
//! canonical four-field schema and aggregates the statistics the dashboard
//! displays.

pub mod aggregator;
pub mod analysis;
pub mod normalizer;
pub mod reader;

pub use monitor_core as core;

pub use aggregator::{aggregate, AggregateStats, CumulativePoint, HourlyHistogram};
pub use analysis::{ingest, ingest_from, Ingestion};
pub use normalizer::{normalize, normalize_with_warnings, NormalizedTable};
pub use reader::{FileTableSource, TableSource};
