//! Runtime layer for Parking Monitor.
//!
//! Owns the refresh cycle: a TTL-cached [`data_manager::DataManager`] around
//! the ingestion pipeline, driven by a tokio task that streams snapshots to
//! the dashboard.

pub mod data_manager;
pub mod orchestrator;

pub use monitor_core as core;
pub use monitor_data as data;
