//! Terminal UI layer for Parking Monitor.
//!
//! Provides themes, the header, indicator and split-bar components, the
//! history table, the dashboard view and the application event loop built
//! on [`ratatui`].

pub mod app;
pub mod components;
pub mod dashboard_view;
pub mod table_view;
pub mod themes;

pub use monitor_core as core;
