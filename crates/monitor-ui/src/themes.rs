use ratatui::style::{Color, Modifier, Style};

/// Terminal background type detection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BackgroundType {
    Dark,
    Light,
    Unknown,
}

/// Detect terminal background type from the `COLORFGBG` environment variable.
///
/// The variable has the format `"foreground;background"`. Background values
/// 0–6 are dark and 7–15 light; anything else yields `Dark`.
pub fn detect_background() -> BackgroundType {
    if let Ok(val) = std::env::var("COLORFGBG") {
        if let Some(bg) = val.split(';').next_back() {
            if let Ok(bg_num) = bg.parse::<u8>() {
                return if bg_num <= 6 {
                    BackgroundType::Dark
                } else {
                    BackgroundType::Light
                };
            }
        }
    }
    BackgroundType::Dark
}

/// Every style used by the dashboard components.
#[derive(Debug, Clone)]
pub struct Theme {
    // ── Header ───────────────────────────────────────────────────────────────
    pub header: Style,
    pub header_accent: Style,
    pub separator: Style,

    // ── Text ─────────────────────────────────────────────────────────────────
    pub text: Style,
    pub dim: Style,
    pub bold: Style,
    pub label: Style,
    pub value: Style,

    // ── Status ───────────────────────────────────────────────────────────────
    pub info: Style,
    pub warning: Style,
    pub error: Style,

    // ── Detection ────────────────────────────────────────────────────────────
    /// Illegal parking detected.
    pub detected: Style,
    /// No violation in the frame.
    pub not_detected: Style,
    pub bar_label: Style,

    // ── Heatmap ──────────────────────────────────────────────────────────────
    /// Hour with no detections.
    pub heat_none: Style,
    pub heat_low: Style,
    pub heat_medium: Style,
    pub heat_high: Style,

    // ── Chart ────────────────────────────────────────────────────────────────
    pub chart_line: Style,
    pub chart_axis: Style,

    // ── Table ────────────────────────────────────────────────────────────────
    pub table_header: Style,
    pub table_border: Style,
    pub table_row: Style,
    pub table_row_alt: Style,

    // ── Banners ──────────────────────────────────────────────────────────────
    pub banner_warning: Style,
    pub banner_error: Style,
}

impl Theme {
    // ── Constructors ─────────────────────────────────────────────────────────

    /// Dark-background terminal theme (default).
    pub fn dark() -> Self {
        Self {
            header: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            header_accent: Style::default().fg(Color::Yellow),
            separator: Style::default().fg(Color::DarkGray),

            text: Style::default().fg(Color::White),
            dim: Style::default().fg(Color::DarkGray),
            bold: Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
            label: Style::default().fg(Color::Gray),
            value: Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),

            info: Style::default().fg(Color::Cyan),
            warning: Style::default().fg(Color::Yellow),
            error: Style::default().fg(Color::Red),

            detected: Style::default()
                .fg(Color::Red)
                .add_modifier(Modifier::BOLD),
            not_detected: Style::default().fg(Color::Green),
            bar_label: Style::default().fg(Color::Gray),

            heat_none: Style::default().fg(Color::DarkGray),
            heat_low: Style::default().fg(Color::Black).bg(Color::Green),
            heat_medium: Style::default().fg(Color::Black).bg(Color::Yellow),
            heat_high: Style::default()
                .fg(Color::White)
                .bg(Color::Red)
                .add_modifier(Modifier::BOLD),

            chart_line: Style::default().fg(Color::Magenta),
            chart_axis: Style::default().fg(Color::Gray),

            table_header: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            table_border: Style::default().fg(Color::DarkGray),
            table_row: Style::default().fg(Color::White),
            table_row_alt: Style::default().fg(Color::Gray),

            banner_warning: Style::default()
                .fg(Color::Black)
                .bg(Color::Yellow),
            banner_error: Style::default()
                .fg(Color::White)
                .bg(Color::Red)
                .add_modifier(Modifier::BOLD),
        }
    }

    /// Light-background terminal theme.
    ///
    /// Dark text with saturated accents so the dashboard stays legible on a
    /// white canvas.
    pub fn light() -> Self {
        Self {
            header: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            header_accent: Style::default().fg(Color::Magenta),
            separator: Style::default().fg(Color::Gray),

            text: Style::default().fg(Color::Black),
            dim: Style::default().fg(Color::Gray),
            bold: Style::default()
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
            label: Style::default().fg(Color::DarkGray),
            value: Style::default()
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),

            info: Style::default().fg(Color::Blue),
            warning: Style::default().fg(Color::Yellow),
            error: Style::default().fg(Color::Red),

            detected: Style::default()
                .fg(Color::Red)
                .add_modifier(Modifier::BOLD),
            not_detected: Style::default().fg(Color::Green),
            bar_label: Style::default().fg(Color::DarkGray),

            heat_none: Style::default().fg(Color::Gray),
            heat_low: Style::default().fg(Color::Black).bg(Color::LightGreen),
            heat_medium: Style::default().fg(Color::Black).bg(Color::LightYellow),
            heat_high: Style::default()
                .fg(Color::White)
                .bg(Color::Red)
                .add_modifier(Modifier::BOLD),

            chart_line: Style::default().fg(Color::Blue),
            chart_axis: Style::default().fg(Color::DarkGray),

            table_header: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            table_border: Style::default().fg(Color::Gray),
            table_row: Style::default().fg(Color::Black),
            table_row_alt: Style::default().fg(Color::DarkGray),

            banner_warning: Style::default()
                .fg(Color::Black)
                .bg(Color::LightYellow),
            banner_error: Style::default()
                .fg(Color::White)
                .bg(Color::Red)
                .add_modifier(Modifier::BOLD),
        }
    }

    /// Basic 8-colour ANSI palette without bold modifiers.
    pub fn classic() -> Self {
        Self {
            header: Style::default().fg(Color::Cyan),
            header_accent: Style::default().fg(Color::White),
            separator: Style::default().fg(Color::DarkGray),

            text: Style::default().fg(Color::White),
            dim: Style::default().fg(Color::DarkGray),
            bold: Style::default().fg(Color::White),
            label: Style::default().fg(Color::Gray),
            value: Style::default().fg(Color::White),

            info: Style::default().fg(Color::Cyan),
            warning: Style::default().fg(Color::Yellow),
            error: Style::default().fg(Color::Red),

            detected: Style::default().fg(Color::Red),
            not_detected: Style::default().fg(Color::Green),
            bar_label: Style::default().fg(Color::White),

            heat_none: Style::default().fg(Color::DarkGray),
            heat_low: Style::default().fg(Color::Black).bg(Color::Green),
            heat_medium: Style::default().fg(Color::Black).bg(Color::Yellow),
            heat_high: Style::default().fg(Color::White).bg(Color::Red),

            chart_line: Style::default().fg(Color::Cyan),
            chart_axis: Style::default().fg(Color::White),

            table_header: Style::default().fg(Color::Cyan),
            table_border: Style::default().fg(Color::DarkGray),
            table_row: Style::default().fg(Color::White),
            table_row_alt: Style::default().fg(Color::Gray),

            banner_warning: Style::default().fg(Color::Black).bg(Color::Yellow),
            banner_error: Style::default().fg(Color::White).bg(Color::Red),
        }
    }

    /// Choose a theme automatically based on the detected terminal background.
    pub fn auto_detect() -> Self {
        match detect_background() {
            BackgroundType::Light => Self::light(),
            _ => Self::dark(),
        }
    }

    /// Construct a theme by name. Unknown names use `auto_detect`.
    pub fn from_name(name: &str) -> Self {
        match name {
            "light" => Self::light(),
            "dark" => Self::dark(),
            "classic" => Self::classic(),
            _ => Self::auto_detect(),
        }
    }

    // ── Style helpers ────────────────────────────────────────────────────────

    /// Style for a detection status.
    pub fn detection_style(&self, detected: bool) -> Style {
        if detected {
            self.detected
        } else {
            self.not_detected
        }
    }

    /// Heatmap cell style for `count` relative to the busiest hour `max`.
    ///
    /// * `0`               → `heat_none`
    /// * up to a third     → `heat_low`
    /// * up to two thirds  → `heat_medium`
    /// * above             → `heat_high`
    pub fn heat_style(&self, count: u64, max: u64) -> Style {
        if count == 0 || max == 0 {
            return self.heat_none;
        }
        let ratio = count as f64 / max as f64;
        if ratio > 2.0 / 3.0 {
            self.heat_high
        } else if ratio > 1.0 / 3.0 {
            self.heat_medium
        } else {
            self.heat_low
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
