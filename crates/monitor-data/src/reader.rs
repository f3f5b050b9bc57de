//! Spreadsheet export discovery and loading.
//!
//! The dashboard never talks to the spreadsheet service itself; some other
//! process keeps a `.csv` or `.json` export on disk and this module reads it
//! into a [`RawTable`] on every refresh.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use monitor_core::error::{MonitorError, Result};
use monitor_core::models::{RawEventRow, RawTable};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

/// Extensions recognised as table exports.
pub const TABLE_EXTENSIONS: &[&str] = &["csv", "json"];

// ── TableSource ───────────────────────────────────────────────────────────────

/// Anything that can hand over the current detection table.
pub trait TableSource: Send + Sync {
    /// Fetch the whole table, header row included.
    fn fetch(&self) -> Result<RawTable>;

    /// Human-readable description for logs and the dashboard header.
    fn describe(&self) -> String;
}

/// Reads a table export from a file, or the newest export in a directory.
#[derive(Debug, Clone)]
pub struct FileTableSource {
    path: PathBuf,
}

impl FileTableSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The concrete file a fetch would read right now.
    pub fn resolve(&self) -> Result<PathBuf> {
        if !self.path.exists() {
            return Err(MonitorError::SourceNotFound(self.path.clone()));
        }
        if self.path.is_dir() {
            return latest_table_file(&self.path)
                .ok_or_else(|| MonitorError::NoTableFiles(self.path.clone()));
        }
        Ok(self.path.clone())
    }
}

impl TableSource for FileTableSource {
    fn fetch(&self) -> Result<RawTable> {
        let file = self.resolve()?;
        load_table(&file)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

// ── Discovery ─────────────────────────────────────────────────────────────────

/// Find all table exports recursively under `dir`, sorted by path.
pub fn find_table_files(dir: &Path) -> Vec<PathBuf> {
    if !dir.exists() {
        warn!("Source directory does not exist: {}", dir.display());
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file() && is_table_file(entry.path()))
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    files
}

/// Most recently modified export under `dir`; the last path wins ties.
pub fn latest_table_file(dir: &Path) -> Option<PathBuf> {
    find_table_files(dir)
        .into_iter()
        .map(|path| {
            let modified = std::fs::metadata(&path)
                .and_then(|m| m.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            (modified, path)
        })
        .max()
        .map(|(_, path)| path)
}

fn is_table_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| TABLE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

// ── Loading ───────────────────────────────────────────────────────────────────

/// Read and parse a single export, choosing the format by extension.
pub fn load_table(path: &Path) -> Result<RawTable> {
    let content = std::fs::read_to_string(path).map_err(|source| MonitorError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let table = match ext.as_str() {
        "csv" => parse_csv_table(&content),
        "json" => parse_json_table(&content)?,
        other => {
            return Err(MonitorError::TableFormat(format!(
                "unsupported export extension {:?} for {}",
                other,
                path.display()
            )))
        }
    };

    debug!(
        "Loaded {} rows x {} columns from {}",
        table.len(),
        table.column_count(),
        path.display()
    );

    Ok(table)
}

/// Parse CSV text whose first record is the header.
///
/// Fields may be double-quoted; `""` inside quotes is a literal quote and
/// quoted fields may span lines. A `"` only opens quoting at the start of a
/// field; elsewhere in an unquoted field it is kept as text. Empty fields
/// become `None`.
pub fn parse_csv_table(content: &str) -> RawTable {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);

    let mut records: Vec<RawEventRow> = Vec::new();
    let mut record: RawEventRow = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            '"' if in_quotes => in_quotes = false,
            '"' if field.is_empty() => in_quotes = true,
            '"' => field.push('"'),
            ',' if !in_quotes => record.push(take_field(&mut field)),
            '\n' if !in_quotes => {
                record.push(take_field(&mut field));
                push_record(&mut records, std::mem::take(&mut record));
            }
            '\r' if !in_quotes => {}
            _ => field.push(c),
        }
    }
    if !field.is_empty() || !record.is_empty() {
        record.push(take_field(&mut field));
        push_record(&mut records, record);
    }

    split_header(records)
}

/// Parse a JSON export: a bare array of rows or a Sheets `values` payload.
pub fn parse_json_table(content: &str) -> Result<RawTable> {
    let rows = match serde_json::from_str::<JsonTable>(content)? {
        JsonTable::Rows(rows) => rows,
        JsonTable::Sheet { values } => values,
    };

    let records = rows
        .iter()
        .map(|row| row.iter().map(json_cell).collect())
        .collect();

    Ok(split_header(records))
}

// ── Internal helpers ──────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonTable {
    Rows(Vec<Vec<Value>>),
    Sheet {
        #[serde(default)]
        values: Vec<Vec<Value>>,
    },
}

fn json_cell(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

fn take_field(field: &mut String) -> Option<String> {
    let value = std::mem::take(field);
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Skip physically empty lines; keep rows of blank cells for the normalizer.
fn push_record(records: &mut Vec<RawEventRow>, record: RawEventRow) {
    if record.len() == 1 && record[0].is_none() {
        return;
    }
    records.push(record);
}

fn split_header(mut records: Vec<RawEventRow>) -> RawTable {
    if records.is_empty() {
        return RawTable::default();
    }
    let headers = records
        .remove(0)
        .into_iter()
        .map(Option::unwrap_or_default)
        .collect();
    RawTable::new(headers, records)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
