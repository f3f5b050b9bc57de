use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::{Serialize, Serializer};

use crate::error::{MonitorError, Result};
use crate::time_utils::{parse_date, parse_time_of_day};

// ── Raw table ─────────────────────────────────────────────────────────────────

/// One row exactly as the table source delivered it.
///
/// `None` marks a missing cell; blank strings are treated the same way by the
/// normalizer.
pub type RawEventRow = Vec<Option<String>>;

/// A detection table as exported from the spreadsheet, header row included.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    /// Header cells from the first row of the export. Names are not trusted;
    /// only their count matters.
    pub headers: Vec<String>,
    /// Data rows in source (chronological) order.
    pub rows: Vec<RawEventRow>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<RawEventRow>) -> Self {
        Self { headers, rows }
    }

    /// Build a header-less table from string rows. Handy for tests and
    /// sources that carry no header row.
    pub fn from_rows<I, R, S>(rows: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let rows = rows
            .into_iter()
            .map(|row| row.into_iter().map(|cell| Some(cell.into())).collect())
            .collect();
        Self {
            headers: Vec::new(),
            rows,
        }
    }

    /// Column count reported by the source: the wider of the header and the
    /// widest data row.
    pub fn column_count(&self) -> usize {
        let widest_row = self.rows.iter().map(Vec::len).max().unwrap_or(0);
        self.headers.len().max(widest_row)
    }

    /// `true` when the table holds no data rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

/// `true` when a raw cell carries no usable content.
pub fn is_blank(cell: &Option<String>) -> bool {
    cell.as_deref().map(str::trim).map_or(true, str::is_empty)
}

// ── ColumnSchema ──────────────────────────────────────────────────────────────

/// Supported positional layouts of a detection table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnSchema {
    /// `(date, time)` – no detection column; every flag is 0.
    DateTime,
    /// `(date, time, flag)`.
    DateTimeFlag,
    /// `(date, time, flag, image_ref)`.
    DateTimeFlagImage,
}

impl ColumnSchema {
    /// Map a column count onto a schema shape.
    ///
    /// Any count outside `{2, 3, 4}` is a [`MonitorError::Schema`].
    pub fn from_column_count(count: usize) -> Result<Self> {
        match count {
            2 => Ok(ColumnSchema::DateTime),
            3 => Ok(ColumnSchema::DateTimeFlag),
            4 => Ok(ColumnSchema::DateTimeFlagImage),
            found => Err(MonitorError::Schema { found }),
        }
    }

    pub fn column_count(self) -> usize {
        match self {
            ColumnSchema::DateTime => 2,
            ColumnSchema::DateTimeFlag => 3,
            ColumnSchema::DateTimeFlagImage => 4,
        }
    }

    /// Canonical column names for this shape.
    pub fn column_names(self) -> &'static [&'static str] {
        match self {
            ColumnSchema::DateTime => &["Date", "Time"],
            ColumnSchema::DateTimeFlag => &["Date", "Time", "Detection"],
            ColumnSchema::DateTimeFlagImage => &["Date", "Time", "Detection", "Image_URL"],
        }
    }

    pub fn has_flag(self) -> bool {
        !matches!(self, ColumnSchema::DateTime)
    }

    pub fn has_image(self) -> bool {
        matches!(self, ColumnSchema::DateTimeFlagImage)
    }
}

// ── DetectionFlag ─────────────────────────────────────────────────────────────

/// Whether illegal parking was detected in a record. Serialized as `0` / `1`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DetectionFlag {
    #[default]
    NotDetected,
    Detected,
}

impl DetectionFlag {
    /// Interpret a non-blank cell.
    ///
    /// Accepts `0`/`1`, their float renderings (`0.0`, `1.0`), and
    /// `true`/`false`/`yes`/`no` in any case. Returns `None` for anything
    /// else so the caller can decide how to report it.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => return Some(DetectionFlag::Detected),
            "0" | "false" | "no" => return Some(DetectionFlag::NotDetected),
            _ => {}
        }
        match trimmed.parse::<f64>() {
            Ok(v) if v == 1.0 => Some(DetectionFlag::Detected),
            Ok(v) if v == 0.0 => Some(DetectionFlag::NotDetected),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            DetectionFlag::NotDetected => 0,
            DetectionFlag::Detected => 1,
        }
    }

    pub fn is_detected(self) -> bool {
        matches!(self, DetectionFlag::Detected)
    }
}

impl From<bool> for DetectionFlag {
    fn from(detected: bool) -> Self {
        if detected {
            DetectionFlag::Detected
        } else {
            DetectionFlag::NotDetected
        }
    }
}

impl Serialize for DetectionFlag {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.as_u8())
    }
}

// ── Detection ─────────────────────────────────────────────────────────────────

/// A normalized detection record: always exactly four logical fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Detection {
    /// Calendar date as written in the source.
    pub date: String,
    /// Time-of-day as written in the source, expected `HH:MM:SS`.
    pub time: String,
    /// Detection flag; defaults to not detected when the source has none.
    pub flag: DetectionFlag,
    /// Optional reference (usually a URL) to the captured image.
    pub image_ref: Option<String>,
}

impl Detection {
    pub fn new(
        date: impl Into<String>,
        time: impl Into<String>,
        flag: DetectionFlag,
        image_ref: Option<String>,
    ) -> Self {
        Self {
            date: date.into(),
            time: time.into(),
            flag,
            image_ref,
        }
    }

    /// Parsed time-of-day, or `None` when `time` is not a valid `HH:MM:SS`.
    pub fn time_of_day(&self) -> Option<NaiveTime> {
        parse_time_of_day(&self.time)
    }

    /// Hour bucket (0–23) of the parsed time.
    pub fn hour(&self) -> Option<u32> {
        self.time_of_day().map(|t| t.hour())
    }

    /// Best-effort calendar date.
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        parse_date(&self.date)
    }

    pub fn is_detected(&self) -> bool {
        self.flag.is_detected()
    }
}

// ── CellParseWarning ──────────────────────────────────────────────────────────

/// A non-fatal data-quality problem in a single cell.
///
/// `row` is the zero-based index into the normalized detections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
pub enum CellParseWarning {
    /// The time cell is not `HH:MM:SS`; the row is left out of the hourly
    /// histogram and the cumulative-rate series.
    #[error("row {row}: unparseable time {value:?}")]
    InvalidTime { row: usize, value: String },

    /// The flag cell is not a recognised 0/1 value; it was coerced to 0.
    #[error("row {row}: invalid detection flag {value:?}, treated as 0")]
    InvalidFlag { row: usize, value: String },
}

impl CellParseWarning {
    pub fn row(&self) -> usize {
        match self {
            CellParseWarning::InvalidTime { row, .. } | CellParseWarning::InvalidFlag { row, .. } => {
                *row
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
