use crate::themes::Theme;
use monitor_core::formatting::{detection_split, format_percent};
use ratatui::text::{Line, Span};

/// Visual configuration of a horizontal bar.
pub struct ProgressBarConfig {
    /// Bar width in terminal columns, excluding the label.
    pub width: u16,
    pub filled_char: char,
    pub empty_char: char,
    /// Append the percentage label after the bar.
    pub show_label: bool,
}

impl Default for ProgressBarConfig {
    fn default() -> Self {
        Self {
            width: 50,
            filled_char: '\u{2588}', // █  FULL BLOCK
            empty_char: '\u{2591}',  // ░  LIGHT SHADE
            show_label: true,
        }
    }
}

// ── DetectionSplitBar ────────────────────────────────────────────────────────

/// Two-segment bar showing the detected / not-detected split of all rows.
///
/// The detected share is drawn with `filled_char` in the detected style, the
/// rest with `empty_char` in the not-detected style. With no rows the whole
/// bar is drawn empty in the dim style.
pub struct DetectionSplitBar<'a> {
    pub detected: u64,
    pub total: u64,
    pub theme: &'a Theme,
    pub config: ProgressBarConfig,
}

impl<'a> DetectionSplitBar<'a> {
    pub fn new(detected: u64, total: u64, theme: &'a Theme) -> Self {
        Self {
            detected: detected.min(total),
            total,
            theme,
            config: ProgressBarConfig::default(),
        }
    }

    pub fn with_width(mut self, width: u16) -> Self {
        self.config.width = width;
        self
    }

    /// `(detected, not_detected)` shares in percent, one decimal place.
    pub fn shares(&self) -> (f64, f64) {
        detection_split(self.detected, self.total)
    }

    /// Columns given to the detected segment.
    pub fn detected_width(&self) -> u16 {
        if self.total == 0 {
            return 0;
        }
        let ratio = self.detected as f64 / self.total as f64;
        (ratio * self.config.width as f64).round() as u16
    }

    /// Render the bar as a [`Line`].
    pub fn to_line(&self) -> Line<'a> {
        let width = self.config.width as usize;

        if self.total == 0 {
            let empty: String = std::iter::repeat_n(self.config.empty_char, width).collect();
            let mut spans = vec![Span::styled(empty, self.theme.dim)];
            if self.config.show_label {
                spans.push(Span::styled(" no rows yet", self.theme.bar_label));
            }
            return Line::from(spans);
        }

        let filled = self.detected_width() as usize;
        let rest = width.saturating_sub(filled);
        let mut spans = vec![
            Span::styled(
                std::iter::repeat_n(self.config.filled_char, filled).collect::<String>(),
                self.theme.detected,
            ),
            Span::styled(
                std::iter::repeat_n(self.config.empty_char, rest).collect::<String>(),
                self.theme.not_detected,
            ),
        ];

        if self.config.show_label {
            let (detected_pct, not_detected_pct) = self.shares();
            spans.push(Span::styled(
                format!(" {} detected", format_percent(detected_pct, 1)),
                self.theme.detected,
            ));
            spans.push(Span::styled(" | ", self.theme.bar_label));
            spans.push(Span::styled(
                format!("{} not detected", format_percent(not_detected_pct, 1)),
                self.theme.not_detected,
            ));
        }

        Line::from(spans)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn text(line: &Line<'_>) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_default_config() {
        let config = ProgressBarConfig::default();
        assert_eq!(config.width, 50);
        assert_eq!(config.filled_char, '█');
        assert_eq!(config.empty_char, '░');
        assert!(config.show_label);
    }

    #[test]
    fn test_split_bar_two_thirds() {
        let theme = Theme::dark();
        let bar = DetectionSplitBar::new(2, 3, &theme).with_width(30);
        assert_eq!(bar.detected_width(), 20);
        assert_eq!(bar.shares(), (66.7, 33.3));

        let line = bar.to_line();
        assert_eq!(line.spans[0].content.chars().count(), 20);
        assert_eq!(line.spans[1].content.chars().count(), 10);
        let rendered = text(&line);
        assert!(rendered.contains("66.7% detected"), "got: {rendered}");
        assert!(rendered.contains("33.3% not detected"), "got: {rendered}");
    }

    #[test]
    fn test_split_bar_uses_detection_styles() {
        let theme = Theme::dark();
        let line = DetectionSplitBar::new(1, 4, &theme).to_line();
        assert_eq!(line.spans[0].style, theme.detected);
        assert_eq!(line.spans[1].style, theme.not_detected);
    }

    #[test]
    fn test_split_bar_empty_table() {
        let theme = Theme::dark();
        let bar = DetectionSplitBar::new(0, 0, &theme).with_width(10);
        assert_eq!(bar.detected_width(), 0);
        assert_eq!(bar.shares(), (0.0, 0.0));
        let rendered = text(&bar.to_line());
        assert!(rendered.starts_with(&"░".repeat(10)));
        assert!(rendered.contains("no rows yet"));
    }

    #[test]
    fn test_split_bar_clamps_detected_to_total() {
        let theme = Theme::dark();
        let bar = DetectionSplitBar::new(9, 3, &theme).with_width(12);
        assert_eq!(bar.detected_width(), 12);
        assert_eq!(bar.to_line().spans[1].content, "");
    }

    #[test]
    fn test_split_bar_without_label() {
        let theme = Theme::dark();
        let mut bar = DetectionSplitBar::new(1, 2, &theme).with_width(8);
        bar.config.show_label = false;
        assert_eq!(bar.to_line().spans.len(), 2);
    }
}
