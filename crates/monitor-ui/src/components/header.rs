use crate::themes::Theme;
use ratatui::text::{Line, Span};

/// Accent markers placed either side of the application title.
pub const MARKERS: &str = "◆ ◇ ◆";

/// Width of the `=` separator under the title.
pub const SEPARATOR_WIDTH: usize = 60;

/// Dashboard header rendering four lines:
///
/// 1. Application title between accent markers.
/// 2. A 60-column `=` separator.
/// 3. `[ source | timezone | clock ]`.
/// 4. An empty line.
pub struct Header<'a> {
    /// Description of the table source.
    pub source: &'a str,
    /// Timezone label, e.g. `"Asia/Jakarta (UTC+07:00)"`.
    pub timezone: &'a str,
    /// Current wall-clock time in that timezone.
    pub clock: &'a str,
    pub theme: &'a Theme,
}

impl<'a> Header<'a> {
    pub fn new(source: &'a str, timezone: &'a str, clock: &'a str, theme: &'a Theme) -> Self {
        Self {
            source,
            timezone,
            clock,
            theme,
        }
    }

    /// Render the header as exactly four lines.
    pub fn to_lines(&self) -> Vec<Line<'a>> {
        vec![
            Line::from(vec![
                Span::styled(MARKERS, self.theme.header_accent),
                Span::styled(" ILLEGAL PARKING MONITOR ", self.theme.header),
                Span::styled(MARKERS, self.theme.header_accent),
            ]),
            Line::from(Span::styled(
                "=".repeat(SEPARATOR_WIDTH),
                self.theme.separator,
            )),
            Line::from(vec![
                Span::styled("[ ", self.theme.label),
                Span::styled(self.source, self.theme.value),
                Span::styled(" | ", self.theme.label),
                Span::styled(self.timezone, self.theme.value),
                Span::styled(" | ", self.theme.label),
                Span::styled(self.clock, self.theme.value),
                Span::styled(" ]", self.theme.label),
            ]),
            Line::from(""),
        ]
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn line_text(line: &Line<'_>) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_header_to_lines_count() {
        let theme = Theme::dark();
        let header = Header::new("exports/", "UTC (UTC+00:00)", "08:00:00", &theme);
        assert_eq!(header.to_lines().len(), 4);
    }

    #[test]
    fn test_header_title_line_content() {
        let theme = Theme::dark();
        let lines = Header::new("exports/", "UTC", "08:00:00", &theme).to_lines();
        let title = line_text(&lines[0]);
        assert!(title.contains("ILLEGAL PARKING MONITOR"), "got: {title}");
        assert!(title.starts_with(MARKERS));
    }

    #[test]
    fn test_header_separator_line() {
        let theme = Theme::dark();
        let lines = Header::new("a.csv", "UTC", "08:00:00", &theme).to_lines();
        let sep = line_text(&lines[1]);
        assert_eq!(sep.chars().count(), SEPARATOR_WIDTH);
        assert!(sep.chars().all(|c| c == '='));
    }

    #[test]
    fn test_header_info_line() {
        let theme = Theme::dark();
        let lines = Header::new(
            "/data/sheet.json",
            "Asia/Jakarta (UTC+07:00)",
            "14:05:09",
            &theme,
        )
        .to_lines();
        let info = line_text(&lines[2]);
        assert_eq!(info, "[ /data/sheet.json | Asia/Jakarta (UTC+07:00) | 14:05:09 ]");
        assert_eq!(lines[2].spans.len(), 7);
    }

    #[test]
    fn test_header_empty_fourth_line() {
        let theme = Theme::dark();
        let lines = Header::new("a.csv", "UTC", "08:00:00", &theme).to_lines();
        assert!(line_text(&lines[3]).is_empty());
    }
}
