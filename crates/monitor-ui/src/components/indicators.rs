use crate::themes::Theme;
use ratatui::text::{Line, Span};

// ── StatusIndicator ──────────────────────────────────────────────────────────

/// Live status of the most recent detection row.
///
/// | Flag | Emoji | Text         |
/// |------|-------|--------------|
/// | 1    | 🚨    | DETECTED     |
/// | 0    | ✅    | NOT DETECTED |
pub struct StatusIndicator<'a> {
    pub detected: bool,
    pub theme: &'a Theme,
}

impl<'a> StatusIndicator<'a> {
    pub fn new(detected: bool, theme: &'a Theme) -> Self {
        Self { detected, theme }
    }

    pub fn emoji(&self) -> &'static str {
        if self.detected {
            "🚨"
        } else {
            "✅"
        }
    }

    pub fn text(&self) -> &'static str {
        if self.detected {
            "DETECTED"
        } else {
            "NOT DETECTED"
        }
    }

    /// Format: `"🚨 Status: DETECTED"`
    pub fn to_line(&self) -> Line<'a> {
        Line::from(vec![
            Span::raw(self.emoji()),
            Span::styled(" Status: ", self.theme.label),
            Span::styled(self.text(), self.theme.detection_style(self.detected)),
        ])
    }
}

// ── FreshnessIndicator ───────────────────────────────────────────────────────

/// How long ago the data was refreshed.
///
/// Turns to the warning style once the snapshot is older than three refresh
/// intervals, which means the runtime has stopped delivering.
pub struct FreshnessIndicator<'a> {
    pub age_secs: i64,
    pub refresh_secs: u64,
    pub theme: &'a Theme,
}

impl<'a> FreshnessIndicator<'a> {
    pub fn new(age_secs: i64, refresh_secs: u64, theme: &'a Theme) -> Self {
        Self {
            age_secs: age_secs.max(0),
            refresh_secs,
            theme,
        }
    }

    pub fn is_stale(&self) -> bool {
        self.age_secs as u64 > self.refresh_secs.saturating_mul(3)
    }

    /// Format: `"⏱ Updated 3s ago (every 5s)"`
    pub fn to_line(&self) -> Line<'a> {
        let style = if self.is_stale() {
            self.theme.warning
        } else {
            self.theme.dim
        };
        Line::from(vec![
            Span::styled("⏱ Updated ", self.theme.label),
            Span::styled(format!("{}s ago", self.age_secs), style),
            Span::styled(format!(" (every {}s)", self.refresh_secs), self.theme.dim),
        ])
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
    fn test_status_detected() {
        let theme = Theme::dark();
        let indicator = StatusIndicator::new(true, &theme);
        assert_eq!(indicator.emoji(), "🚨");
        let line = indicator.to_line();
        assert_eq!(text(&line), "🚨 Status: DETECTED");
        assert_eq!(line.spans[2].style, theme.detected);
    }

    #[test]
    fn test_status_not_detected() {
        let theme = Theme::dark();
        let indicator = StatusIndicator::new(false, &theme);
        assert_eq!(indicator.emoji(), "✅");
        assert_eq!(text(&indicator.to_line()), "✅ Status: NOT DETECTED");
    }

    #[test]
    fn test_freshness_line() {
        let theme = Theme::dark();
        let line = FreshnessIndicator::new(3, 5, &theme).to_line();
        assert_eq!(text(&line), "⏱ Updated 3s ago (every 5s)");
        assert_eq!(line.spans[1].style, theme.dim);
    }

    #[test]
    fn test_freshness_stale_after_three_intervals() {
        let theme = Theme::dark();
        assert!(!FreshnessIndicator::new(15, 5, &theme).is_stale());
        let stale = FreshnessIndicator::new(16, 5, &theme);
        assert!(stale.is_stale());
        assert_eq!(stale.to_line().spans[1].style, theme.warning);
    }

    #[test]
    fn test_freshness_negative_age_clamped() {
        let theme = Theme::dark();
        assert_eq!(FreshnessIndicator::new(-4, 5, &theme).age_secs, 0);
    }
}
