//! Column-count based normalization of raw detection tables.
//!
//! Spreadsheet exports carry no reliable header names, so the layout is
//! inferred from how many non-empty columns remain: see [`ColumnSchema`].

use monitor_core::error::Result;
use monitor_core::models::{
    is_blank, CellParseWarning, ColumnSchema, Detection, DetectionFlag, RawEventRow, RawTable,
};
use tracing::{debug, warn};

// ── NormalizedTable ───────────────────────────────────────────────────────────

/// Output of [`normalize_with_warnings`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedTable {
    /// Shape the table was read as; `None` when there were no data rows.
    pub schema: Option<ColumnSchema>,
    /// Detections in source order.
    pub detections: Vec<Detection>,
    /// Per-cell coercions applied while normalizing.
    pub warnings: Vec<CellParseWarning>,
    /// Source column indices dropped because every data cell was blank.
    pub dropped_columns: Vec<usize>,
    /// Data rows dropped because every kept cell was blank.
    pub dropped_rows: usize,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Normalize a raw table into detections, logging any cell coercions.
///
/// Fails with [`MonitorError::Schema`](monitor_core::MonitorError::Schema)
/// when the non-empty column count is not 2, 3 or 4.
pub fn normalize(table: &RawTable) -> Result<Vec<Detection>> {
    let normalized = normalize_with_warnings(table)?;
    for warning in &normalized.warnings {
        warn!("{}", warning);
    }
    Ok(normalized.detections)
}

/// Normalize a raw table and report every cell coercion alongside the rows.
///
/// 1. Columns whose data cells are all blank are dropped.
/// 2. The remaining count selects a [`ColumnSchema`].
/// 3. Rows blank in every kept column are dropped.
/// 4. Each remaining row becomes a four-field [`Detection`].
///
/// Columns are matched by position after the blank ones are removed. An
/// entirely blank interior column therefore shifts everything to its right:
/// a four-column sheet whose Detection column was never filled reads as
/// date, time, flag, with the image references landing in the flag slot as
/// invalid flags. Such a drop is logged at `warn`.
///
/// A table without data rows normalizes to nothing; there is no layout to
/// check.
pub fn normalize_with_warnings(table: &RawTable) -> Result<NormalizedTable> {
    if table.is_empty() {
        return Ok(NormalizedTable::default());
    }

    let width = table.column_count();
    let (kept, dropped_columns): (Vec<usize>, Vec<usize>) = (0..width)
        .partition(|&col| table.rows.iter().any(|row| !is_blank(cell(row, col))));

    // Only blank rows: same as no data rows.
    if kept.is_empty() {
        return Ok(NormalizedTable {
            dropped_columns,
            dropped_rows: table.len(),
            ..NormalizedTable::default()
        });
    }

    if let Some(&last_kept) = kept.last() {
        let interior: Vec<usize> = dropped_columns
            .iter()
            .copied()
            .filter(|&col| col < last_kept)
            .collect();
        if !interior.is_empty() {
            warn!(
                columns = ?interior,
                "blank interior column(s) dropped; later columns shift left"
            );
        }
    }

    let schema = match ColumnSchema::from_column_count(kept.len()) {
        Ok(schema) => schema,
        Err(e) => {
            warn!(
                columns = width,
                non_empty = kept.len(),
                "detection table does not match a known layout"
            );
            return Err(e);
        }
    };

    let mut detections = Vec::with_capacity(table.len());
    let mut warnings = Vec::new();
    let mut dropped_rows = 0usize;

    for row in &table.rows {
        let cells: Vec<Option<&str>> = kept.iter().map(|&col| trimmed(cell(row, col))).collect();
        if cells.iter().all(Option::is_none) {
            dropped_rows += 1;
            continue;
        }

        let index = detections.len();
        let flag = if schema.has_flag() {
            coerce_flag(cells[2], index, &mut warnings)
        } else {
            DetectionFlag::NotDetected
        };
        let image_ref = if schema.has_image() {
            cells[3].map(str::to_string)
        } else {
            None
        };

        detections.push(Detection {
            date: cells[0].unwrap_or_default().to_string(),
            time: cells[1].unwrap_or_default().to_string(),
            flag,
            image_ref,
        });
    }

    debug!(
        schema = ?schema,
        rows = detections.len(),
        dropped_rows,
        dropped_columns = dropped_columns.len(),
        warnings = warnings.len(),
        "normalized detection table"
    );

    Ok(NormalizedTable {
        schema: Some(schema),
        detections,
        warnings,
        dropped_columns,
        dropped_rows,
    })
}

// ── Internal helpers ──────────────────────────────────────────────────────────

static MISSING: Option<String> = None;

/// Cell at `col`, treating short rows as padded with blanks.
fn cell(row: &RawEventRow, col: usize) -> &Option<String> {
    row.get(col).unwrap_or(&MISSING)
}

fn trimmed(cell: &Option<String>) -> Option<&str> {
    cell.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Blank → 0 silently; unrecognised → 0 with a warning.
fn coerce_flag(
    raw: Option<&str>,
    row: usize,
    warnings: &mut Vec<CellParseWarning>,
) -> DetectionFlag {
    let Some(value) = raw else {
        return DetectionFlag::NotDetected;
    };
    DetectionFlag::parse(value).unwrap_or_else(|| {
        warnings.push(CellParseWarning::InvalidFlag {
            row,
            value: value.to_string(),
        });
        DetectionFlag::NotDetected
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
