use std::path::PathBuf;
use thiserror::Error;

/// Column counts a detection table may have after empty columns are dropped.
pub const ACCEPTED_COLUMN_COUNTS: [usize; 3] = [2, 3, 4];

/// All errors produced by the Parking Monitor.
#[derive(Error, Debug)]
pub enum MonitorError {
    /// The table's column count does not map onto a known schema shape.
    ///
    /// Table-wide and non-retriable: every row shares one header, so the
    /// whole ingestion cycle is abandoned.
    #[error("Table has {found} columns, expected one of {{2, 3, 4}}")]
    Schema { found: usize },

    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A JSON document could not be parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// A table export was readable but not shaped like a table.
    #[error("Malformed table export: {0}")]
    TableFormat(String),

    /// The configured table source does not exist.
    #[error("Table source not found: {0}")]
    SourceNotFound(PathBuf),

    /// A source directory holds no `.csv` or `.json` exports.
    #[error("No table exports found in {0}")]
    NoTableFiles(PathBuf),

    /// An error originating from the terminal / TUI layer.
    #[error("Terminal error: {0}")]
    Terminal(String),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MonitorError {
    /// `true` when fetching again may succeed without the data changing shape.
    ///
    /// Schema mismatches are a property of the table itself, so re-reading
    /// the same export within one refresh cycle cannot fix them.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            MonitorError::FileRead { .. }
                | MonitorError::JsonParse(_)
                | MonitorError::TableFormat(_)
                | MonitorError::NoTableFiles(_)
                | MonitorError::Io(_)
        )
    }
}

/// Convenience alias used throughout the monitor crates.
pub type Result<T> = std::result::Result<T, MonitorError>;
