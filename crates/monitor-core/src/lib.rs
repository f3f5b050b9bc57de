//! Shared domain types for Parking Monitor.
//!
//! Holds the raw and normalized detection models, aggregate statistics, the
//! workspace error type, CLI settings and the small time/formatting helpers
//! used by both the data pipeline and the dashboard.

pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;
pub mod time_utils;

pub use error::{MonitorError, Result};
