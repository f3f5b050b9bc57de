//! Real-time detection dashboard.
//!
//! Sections, top to bottom: header, error banner (only while the latest
//! refresh failed), live detection, historical metrics, hourly heatmap,
//! cumulative detection-rate chart, history table and a key hint footer.

use std::sync::Arc;

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::Style,
    symbols,
    text::{Line, Span, Text},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph, Wrap},
    Frame,
};

use monitor_core::formatting::{format_count, format_number, format_percent};
use monitor_core::models::CellParseWarning;
use monitor_core::time_utils::fractional_hour;
use monitor_runtime::data::aggregator::{AggregateStats, HourlyHistogram, HOURS_PER_DAY};
use monitor_runtime::data::analysis::Ingestion;

use crate::components::header::Header;
use crate::components::indicators::{FreshnessIndicator, StatusIndicator};
use crate::components::progress_bar::DetectionSplitBar;
use crate::table_view::{self, truncate_to_width, HistoryRow};
use crate::themes::Theme;

/// Columns taken by one heatmap cell.
const HEAT_CELL_WIDTH: usize = 4;

/// Everything the dashboard needs for one frame.
#[derive(Debug, Clone)]
pub struct DashboardViewData {
    /// Description of the table source.
    pub source: String,
    /// Timezone label for the header clock.
    pub timezone_label: String,
    /// Current time in that timezone.
    pub current_time: String,
    /// Seconds since the runtime produced the shown snapshot.
    pub refreshed_age_secs: i64,
    pub refresh_secs: u64,
    /// Message of the latest refresh failure.
    pub last_error: Option<String>,
    /// Last successful ingestion.
    pub ingestion: Option<Arc<Ingestion>>,
    /// Rows shown in the history table.
    pub history_rows: usize,
}

// ── Top level ─────────────────────────────────────────────────────────────────

/// Render the whole dashboard into `area`.
pub fn render_dashboard(frame: &mut Frame, area: Rect, data: &DashboardViewData, theme: &Theme) {
    let banner_height = if data.last_error.is_some() { 1 } else { 0 };

    let Some(ingestion) = data.ingestion.as_deref() else {
        let [header_area, banner_area, body_area] = Layout::vertical([
            Constraint::Length(4),
            Constraint::Length(banner_height),
            Constraint::Min(0),
        ])
        .areas(area);
        render_header(frame, header_area, data, theme);
        render_banner(frame, banner_area, data, theme);
        render_no_data(frame, body_area, &data.source, theme);
        return;
    };

    let history_len = ingestion.detections.len().min(data.history_rows);
    let [header_area, banner_area, live_area, metrics_area, heat_area, chart_area, history_area, footer_area] =
        Layout::vertical([
            Constraint::Length(4),
            Constraint::Length(banner_height),
            Constraint::Length(6),
            Constraint::Length(6),
            Constraint::Length(6),
            Constraint::Min(8),
            Constraint::Length(history_len as u16 + 3),
            Constraint::Length(1),
        ])
        .areas(area);

    render_header(frame, header_area, data, theme);
    render_banner(frame, banner_area, data, theme);

    let live = Paragraph::new(Text::from(live_lines(data, &ingestion.stats, theme)))
        .block(section_block(" Live Detection ", theme));
    frame.render_widget(live, live_area);

    let bar_width = metrics_area.width.saturating_sub(40).clamp(10, 50);
    let metrics = Paragraph::new(Text::from(metrics_lines(ingestion, bar_width, theme)))
        .block(section_block(" Historical Metrics ", theme));
    frame.render_widget(metrics, metrics_area);

    let cells_per_row = if heat_area.width as usize >= HOURS_PER_DAY * HEAT_CELL_WIDTH + 2 {
        HOURS_PER_DAY
    } else {
        HOURS_PER_DAY / 2
    };
    let heatmap = Paragraph::new(Text::from(heatmap_lines(
        &ingestion.stats.hourly_histogram,
        cells_per_row,
        theme,
    )))
    .block(section_block(" Detections by Hour ", theme));
    frame.render_widget(heatmap, heat_area);

    render_rate_chart(frame, chart_area, &ingestion.stats, theme);

    let rows: Vec<HistoryRow> = ingestion
        .recent(data.history_rows)
        .map(HistoryRow::from)
        .collect();
    table_view::render_history_table(frame, history_area, &rows, theme);

    frame.render_widget(Paragraph::new(footer_line(theme)), footer_area);
}

fn render_header(frame: &mut Frame, area: Rect, data: &DashboardViewData, theme: &Theme) {
    let header = Header::new(&data.source, &data.timezone_label, &data.current_time, theme);
    frame.render_widget(Paragraph::new(Text::from(header.to_lines())), area);
}

fn render_banner(frame: &mut Frame, area: Rect, data: &DashboardViewData, theme: &Theme) {
    if let Some(line) = banner_line(data, theme) {
        frame.render_widget(Paragraph::new(line), area);
    }
}

fn section_block<'a>(title: &'a str, theme: &Theme) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(theme.table_border)
        .title(Span::styled(title, theme.header))
}

// ── Line builders (extracted for testability) ────────────────────────────────

/// The warning banner, when the latest refresh failed.
pub fn banner_line<'a>(data: &DashboardViewData, theme: &'a Theme) -> Option<Line<'a>> {
    let error = data.last_error.as_ref()?;
    let (text, style) = if data.ingestion.is_some() {
        (
            format!(" ⚠ {error} (showing last good data) "),
            theme.banner_warning,
        )
    } else {
        (format!(" ⚠ {error} "), theme.banner_error)
    };
    Some(Line::from(Span::styled(text, style)))
}

/// Last event, its status, image reference and data freshness.
pub fn live_lines<'a>(
    data: &DashboardViewData,
    stats: &AggregateStats,
    theme: &'a Theme,
) -> Vec<Line<'a>> {
    let freshness = FreshnessIndicator::new(data.refreshed_age_secs, data.refresh_secs, theme);

    let Some(last) = stats.last_event.as_ref() else {
        return vec![
            Line::from(Span::styled("No detections recorded yet", theme.dim)),
            Line::from(""),
            Line::from(""),
            freshness.to_line(),
        ];
    };

    let image = match last.image_ref.as_deref() {
        Some(image_ref) => Span::styled(truncate_to_width(image_ref, 72), theme.info),
        None => Span::styled("none", theme.dim),
    };

    vec![
        Line::from(vec![
            Span::styled("🕒 Last event: ", theme.label),
            Span::styled(format!("{} {}", last.date, last.time), theme.value),
        ]),
        StatusIndicator::new(last.is_detected(), theme).to_line(),
        Line::from(vec![Span::styled("🖼  Image: ", theme.label), image]),
        freshness.to_line(),
    ]
}

/// Totals, rate, hourly average, split bar and a data-quality note.
pub fn metrics_lines<'a>(ingestion: &Ingestion, bar_width: u16, theme: &'a Theme) -> Vec<Line<'a>> {
    let stats = &ingestion.stats;

    let mut lines = vec![
        Line::from(vec![
            Span::styled("Total captured: ", theme.label),
            Span::styled(format_count(stats.total_count as u64), theme.value),
            Span::styled("    Total detections: ", theme.label),
            Span::styled(format_count(stats.detected_count), theme.detected),
        ]),
        Line::from(vec![
            Span::styled("Detection rate: ", theme.label),
            Span::styled(format_percent(stats.detection_rate_pct, 2), theme.value),
            Span::styled("    Avg per hour: ", theme.label),
            Span::styled(format_number(stats.avg_per_hour, 2), theme.value),
        ]),
        DetectionSplitBar::new(stats.detected_count, stats.total_count as u64, theme)
            .with_width(bar_width)
            .to_line(),
    ];

    let invalid_flags = ingestion
        .warnings
        .iter()
        .filter(|w| matches!(w, CellParseWarning::InvalidFlag { .. }))
        .count();
    let mut problems = Vec::new();
    if stats.invalid_time_count > 0 {
        problems.push(format!(
            "{} unparseable time(s) left out of the hourly stats",
            stats.invalid_time_count
        ));
    }
    if invalid_flags > 0 {
        problems.push(format!("{} invalid flag(s) read as 0", invalid_flags));
    }
    if !problems.is_empty() {
        let note = format!("⚠ {}, see log", problems.join(", "));
        lines.push(Line::from(Span::styled(note, theme.warning)));
    }

    lines
}

/// Hour labels and coloured counts, `cells_per_row` hours per line pair.
pub fn heatmap_lines<'a>(
    histogram: &HourlyHistogram,
    cells_per_row: usize,
    theme: &'a Theme,
) -> Vec<Line<'a>> {
    let max = histogram.peak().map(|(_, count)| count).unwrap_or(0);
    let hours: Vec<(u32, u64)> = histogram.iter().collect();

    let mut lines = Vec::new();
    for chunk in hours.chunks(cells_per_row.max(1)) {
        let labels: Vec<Span<'a>> = chunk
            .iter()
            .map(|(hour, _)| Span::styled(format!("{hour:^width$}", width = HEAT_CELL_WIDTH), theme.dim))
            .collect();
        let counts: Vec<Span<'a>> = chunk
            .iter()
            .map(|&(_, count)| {
                Span::styled(
                    format!("{count:^width$}", width = HEAT_CELL_WIDTH),
                    theme.heat_style(count, max),
                )
            })
            .collect();
        lines.push(Line::from(labels));
        lines.push(Line::from(counts));
    }
    lines
}

/// Cumulative series as `(fractional hour, percent)` chart points.
pub fn chart_points(stats: &AggregateStats) -> Vec<(f64, f64)> {
    stats
        .cumulative_rate_series
        .iter()
        .map(|p| (fractional_hour(p.time), p.rate_pct))
        .collect()
}

fn footer_line(theme: &Theme) -> Line<'_> {
    Line::from(vec![
        Span::styled(" q", theme.bold),
        Span::styled(" quit  ", theme.dim),
        Span::styled("r", theme.bold),
        Span::styled(" refresh now", theme.dim),
    ])
}

// ── Chart ─────────────────────────────────────────────────────────────────────

fn render_rate_chart(frame: &mut Frame, area: Rect, stats: &AggregateStats, theme: &Theme) {
    let block = section_block(" Cumulative Detection Rate (%) ", theme);
    let points = chart_points(stats);

    if points.is_empty() {
        let placeholder = Paragraph::new(Span::styled("No timed rows to plot yet", theme.dim))
            .block(block)
            .wrap(Wrap { trim: true });
        frame.render_widget(placeholder, area);
        return;
    }

    let dataset = Dataset::default()
        .name("rate")
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(theme.chart_line)
        .data(&points);

    let axis_style: Style = theme.chart_axis;
    let chart = Chart::new(vec![dataset])
        .block(block)
        .x_axis(
            Axis::default()
                .title("hour")
                .style(axis_style)
                .bounds([0.0, HOURS_PER_DAY as f64])
                .labels(["0", "6", "12", "18", "24"]),
        )
        .y_axis(
            Axis::default()
                .style(axis_style)
                .bounds([0.0, 100.0])
                .labels(["0", "50", "100"]),
        );
    frame.render_widget(chart, area);
}

// ── No data ───────────────────────────────────────────────────────────────────

/// Placeholder shown until the first successful ingestion.
pub fn render_no_data(frame: &mut Frame, area: Rect, source: &str, theme: &Theme) {
    let text = vec![
        Line::from(""),
        Line::from(Span::styled("No detection data loaded yet", theme.warning)),
        Line::from(""),
        Line::from(vec![
            Span::styled("Waiting for an export in ", theme.dim),
            Span::styled(source.to_string(), theme.info),
        ]),
        Line::from(Span::styled("Press 'q' or Ctrl+C to exit", theme.dim)),
    ];
    frame.render_widget(
        Paragraph::new(Text::from(text)).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Parking Monitor "),
        ),
        area,
    );
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use monitor_core::models::RawTable;
    use monitor_runtime::data::analysis::ingest;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn sample_ingestion() -> Arc<Ingestion> {
        let table = RawTable::from_rows([
            ["2024-12-04", "08:00:00", "1", "https://img.example.com/08.jpg"],
            ["2024-12-04", "09:00:00", "0", "https://img.example.com/09.jpg"],
            ["2024-12-04", "10:00:00", "1", "https://img.example.com/10.jpg"],
        ]);
        Arc::new(ingest(&table).unwrap())
    }

    fn make_data(ingestion: Option<Arc<Ingestion>>, last_error: Option<&str>) -> DashboardViewData {
        DashboardViewData {
            source: "/data/exports".to_string(),
            timezone_label: "Asia/Jakarta (UTC+07:00)".to_string(),
            current_time: "14:05:09".to_string(),
            refreshed_age_secs: 2,
            refresh_secs: 5,
            last_error: last_error.map(str::to_string),
            ingestion,
            history_rows: 20,
        }
    }

    fn text(lines: &[Line<'_>]) -> String {
        lines
            .iter()
            .flat_map(|l| l.spans.iter().map(|s| s.content.as_ref()))
            .collect()
    }

    fn render(data: &DashboardViewData, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        let theme = Theme::dark();
        terminal
            .draw(|frame| {
                let area = frame.area();
                render_dashboard(frame, area, data, &theme)
            })
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    // ── Line builders ─────────────────────────────────────────────────────────

    #[test]
    fn test_live_lines_show_last_event() {
        let theme = Theme::dark();
        let ingestion = sample_ingestion();
        let data = make_data(Some(Arc::clone(&ingestion)), None);
        let rendered = text(&live_lines(&data, &ingestion.stats, &theme));
        assert!(rendered.contains("2024-12-04 10:00:00"));
        assert!(rendered.contains("DETECTED"));
        assert!(rendered.contains("https://img.example.com/10.jpg"));
        assert!(rendered.contains("Updated 2s ago"));
    }

    #[test]
    fn test_live_lines_without_events() {
        let theme = Theme::dark();
        let data = make_data(None, None);
        let rendered = text(&live_lines(&data, &AggregateStats::empty(), &theme));
        assert!(rendered.contains("No detections recorded yet"));
    }

    #[test]
    fn test_metrics_lines_formatting() {
        let theme = Theme::dark();
        let rendered = text(&metrics_lines(&sample_ingestion(), 20, &theme));
        assert!(rendered.contains("Total captured: 3"));
        assert!(rendered.contains("Total detections: 2"));
        assert!(rendered.contains("Detection rate: 66.67%"));
        assert!(rendered.contains("Avg per hour: 0.08"));
        assert!(rendered.contains("66.7% detected"));
        assert!(rendered.contains("33.3% not detected"));
        assert!(!rendered.contains('⚠'));
    }

    #[test]
    fn test_metrics_lines_note_invalid_times() {
        let theme = Theme::dark();
        let table = RawTable::from_rows([["2024-12-04", "25:99:00", "1"]]);
        let ingestion = ingest(&table).unwrap();
        let lines = metrics_lines(&ingestion, 20, &theme);
        assert_eq!(lines.len(), 4);
        assert!(text(&lines).contains("1 unparseable time(s)"));
        assert!(!text(&lines).contains("invalid flag"));
    }

    #[test]
    fn test_metrics_lines_note_both_warning_kinds() {
        let theme = Theme::dark();
        let table = RawTable::from_rows([
            ["2024-12-04", "25:99:00", "1"],
            ["2024-12-04", "08:00:00", "maybe"],
            ["2024-12-04", "09:00:00", "2"],
        ]);
        let ingestion = ingest(&table).unwrap();
        let note = text(&metrics_lines(&ingestion, 20, &theme));
        assert!(note.contains("1 unparseable time(s)"));
        assert!(note.contains("2 invalid flag(s) read as 0"));
        assert!(note.contains("see log"));
    }

    #[test]
    fn test_metrics_lines_note_invalid_flags_only() {
        let theme = Theme::dark();
        let table = RawTable::from_rows([["2024-12-04", "08:00:00", "x"]]);
        let ingestion = ingest(&table).unwrap();
        let lines = metrics_lines(&ingestion, 20, &theme);
        assert_eq!(lines.len(), 4);
        assert!(text(&lines).contains("⚠ 1 invalid flag(s) read as 0, see log"));
    }

    #[test]
    fn test_heatmap_lines_layout() {
        let theme = Theme::dark();
        let ingestion = sample_ingestion();
        let histogram = &ingestion.stats.hourly_histogram;

        let full = heatmap_lines(histogram, 24, &theme);
        assert_eq!(full.len(), 2);
        assert_eq!(full[0].spans.len(), 24);
        assert_eq!(full[1].spans[8].content, " 1  ");
        assert_eq!(full[1].spans[8].style, theme.heat_high);
        assert_eq!(full[1].spans[9].style, theme.heat_none);

        let split = heatmap_lines(histogram, 12, &theme);
        assert_eq!(split.len(), 4);
        assert_eq!(split[2].spans[0].content, " 12 ");
    }

    #[test]
    fn test_chart_points_use_fractional_hours() {
        let table = RawTable::from_rows([
            ["2024-12-04", "08:30:00", "1"],
            ["2024-12-04", "09:00:00", "0"],
        ]);
        let stats = ingest(&table).unwrap().stats;
        let points = chart_points(&stats);
        assert_eq!(points.len(), 2);
        assert!((points[0].0 - 8.5).abs() < 1e-9);
        assert!((points[0].1 - 100.0).abs() < 1e-9);
        assert!((points[1].1 - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_banner_line_variants() {
        let theme = Theme::dark();
        assert!(banner_line(&make_data(None, None), &theme).is_none());

        let kept = make_data(Some(sample_ingestion()), Some("Table has 5 columns"));
        let line = banner_line(&kept, &theme).unwrap();
        assert!(text(&[line.clone()]).contains("showing last good data"));
        assert_eq!(line.spans[0].style, theme.banner_warning);

        let none = make_data(None, Some("Table source not found"));
        assert_eq!(banner_line(&none, &theme).unwrap().spans[0].style, theme.banner_error);
    }

    // ── Render ────────────────────────────────────────────────────────────────

    #[test]
    fn test_render_dashboard_with_data() {
        let screen = render(&make_data(Some(sample_ingestion()), None), 120, 50);
        assert!(screen.contains("ILLEGAL PARKING MONITOR"));
        assert!(screen.contains("Live Detection"));
        assert!(screen.contains("Historical Metrics"));
        assert!(screen.contains("Detections by Hour"));
        assert!(screen.contains("Cumulative Detection Rate"));
        assert!(screen.contains("History (last 3)"));
    }

    #[test]
    fn test_render_dashboard_no_data() {
        let screen = render(&make_data(None, None), 80, 24);
        assert!(screen.contains("No detection data loaded yet"));
        assert!(screen.contains("/data/exports"));
    }

    #[test]
    fn test_render_dashboard_error_banner_keeps_data() {
        let data = make_data(Some(sample_ingestion()), Some("Table has 5 columns"));
        let screen = render(&data, 120, 50);
        assert!(screen.contains("Table has 5 columns"));
        assert!(screen.contains("Historical Metrics"));
    }

    #[test]
    fn test_render_dashboard_empty_table_does_not_panic() {
        let empty = Arc::new(ingest(&RawTable::default()).unwrap());
        let screen = render(&make_data(Some(empty), None), 100, 40);
        assert!(screen.contains("No timed rows to plot yet"));
    }

    #[test]
    fn test_render_dashboard_small_terminal_does_not_panic() {
        render(&make_data(Some(sample_ingestion()), Some("boom")), 40, 12);
    }
}
