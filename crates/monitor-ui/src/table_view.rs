//! History table for the dashboard.
//!
//! Renders a bordered [`ratatui::widgets::Table`] with the most recent
//! detection rows, newest first.

use ratatui::{
    layout::{Constraint, Rect},
    widgets::{Block, Borders, Cell, Row, Table},
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use monitor_core::models::Detection;

use crate::themes::Theme;

/// Column width reserved for the image reference.
const IMAGE_COLUMN_WIDTH: u16 = 48;

/// One row of the history table.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRow {
    pub date: String,
    pub time: String,
    pub detected: bool,
    pub image_ref: Option<String>,
}

impl From<&Detection> for HistoryRow {
    fn from(d: &Detection) -> Self {
        Self {
            date: d.date.clone(),
            time: d.time.clone(),
            detected: d.is_detected(),
            image_ref: d.image_ref.clone(),
        }
    }
}

/// Cut `s` to at most `max_width` terminal columns, ending in `…` when cut.
pub fn truncate_to_width(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }
    if max_width == 0 {
        return String::new();
    }

    let mut out = String::new();
    let mut used = 0;
    for ch in s.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w + 1 > max_width {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}

/// Render the history table into `area`.
///
/// The image column is only shown when at least one row carries a reference.
pub fn render_history_table(frame: &mut Frame, area: Rect, rows: &[HistoryRow], theme: &Theme) {
    let with_images = rows.iter().any(|r| r.image_ref.is_some());

    let mut header_cells = vec!["Date", "Time", "Detection"];
    if with_images {
        header_cells.push("Image");
    }
    let header = Row::new(
        header_cells
            .into_iter()
            .map(|h| Cell::from(h).style(theme.table_header)),
    )
    .height(1);

    let image_width = IMAGE_COLUMN_WIDTH.min(area.width.saturating_sub(40)) as usize;

    let data_rows: Vec<Row> = rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let style = if i % 2 == 0 {
                theme.table_row
            } else {
                theme.table_row_alt
            };
            let status = if row.detected { "DETECTED" } else { "-" };
            let mut cells = vec![
                Cell::from(row.date.clone()),
                Cell::from(row.time.clone()),
                Cell::from(status).style(theme.detection_style(row.detected)),
            ];
            if with_images {
                let image = row.image_ref.as_deref().unwrap_or("");
                cells.push(Cell::from(truncate_to_width(image, image_width)));
            }
            Row::new(cells).style(style)
        })
        .collect();

    let mut widths = vec![
        Constraint::Length(12),
        Constraint::Length(10),
        Constraint::Length(12),
    ];
    if with_images {
        widths.push(Constraint::Min(10));
    }

    let table = Table::new(data_rows, widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.table_border)
                .title(format!(" History (last {}) ", rows.len())),
        )
        .style(theme.text);

    frame.render_widget(table, area);
}

// ── Tests ──────────────────────────────────────────────────────────────────────
