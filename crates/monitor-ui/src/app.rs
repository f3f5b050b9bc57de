//! Main application state and TUI event loop for Parking Monitor.
//!
//! [`App`] owns the theme, the display clock and the last received
//! monitoring snapshot, and drives the real-time dashboard loop.

use std::io;
use std::time::Duration;

use chrono::{DateTime, Utc};
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Frame, Terminal};
use tokio::sync::mpsc;

use monitor_core::time_utils::DisplayClock;
use monitor_runtime::orchestrator::{MonitoringData, MonitoringHandle};

use crate::dashboard_view::{self, DashboardViewData};
use crate::themes::Theme;

/// How long the loop waits for a key before redrawing.
const TICK_RATE: Duration = Duration::from_millis(250);

// ── KeyAction ─────────────────────────────────────────────────────────────────

/// What a key press asks the app to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Quit,
    Refresh,
    None,
}

impl KeyAction {
    pub fn from_key(code: KeyCode, modifiers: KeyModifiers) -> Self {
        match code {
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => KeyAction::Quit,
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => KeyAction::Quit,
            KeyCode::Char('r') | KeyCode::Char('R') => KeyAction::Refresh,
            _ => KeyAction::None,
        }
    }
}

// ── App ───────────────────────────────────────────────────────────────────────

/// Root application state for the dashboard.
pub struct App {
    pub theme: Theme,
    /// Clock for the header, in the configured timezone.
    pub clock: DisplayClock,
    /// Refresh interval the runtime was started with, in seconds.
    pub refresh_secs: u64,
    /// Rows shown in the history table.
    pub history_rows: usize,
    /// Set to `true` to break out of the event loop on the next iteration.
    pub should_quit: bool,
    /// Most recent monitoring snapshot, `None` until the first one arrives.
    pub last_data: Option<MonitoringData>,
}

impl App {
    pub fn new(theme_name: &str, timezone: &str, refresh_secs: u64, history_rows: usize) -> Self {
        Self {
            theme: Theme::from_name(theme_name),
            clock: DisplayClock::new(timezone),
            refresh_secs,
            history_rows,
            should_quit: false,
            last_data: None,
        }
    }

    // ── Event loop ────────────────────────────────────────────────────────────

    /// Run the real-time dashboard, receiving snapshots from `rx`.
    ///
    /// Uses `crossterm::event::poll` with a 250 ms timeout so the terminal
    /// loop stays on the current thread while snapshots arrive on the async
    /// channel via `try_recv`. `r` asks the runtime for an immediate refresh.
    ///
    /// The loop exits on `q`, `Esc`, `Ctrl+C` or when the runtime stops.
    pub async fn run_realtime(
        mut self,
        mut rx: mpsc::Receiver<MonitoringData>,
        monitor: &MonitoringHandle,
    ) -> io::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = loop {
            if let Err(e) = terminal.draw(|frame| self.render(frame)) {
                break Err(e);
            }

            match event::poll(TICK_RATE) {
                Ok(true) => match event::read() {
                    Ok(Event::Key(key)) => match KeyAction::from_key(key.code, key.modifiers) {
                        KeyAction::Quit => self.should_quit = true,
                        KeyAction::Refresh => {
                            tracing::debug!("refresh requested from keyboard");
                            monitor.request_refresh();
                        }
                        KeyAction::None => {}
                    },
                    Ok(_) => {}
                    Err(e) => break Err(e),
                },
                Ok(false) => {}
                Err(e) => break Err(e),
            }

            self.drain(&mut rx);

            if self.should_quit {
                break Ok(());
            }
        };

        // Restore terminal state unconditionally.
        restore_terminal()?;
        terminal.show_cursor()?;

        result
    }

    /// Apply every pending snapshot; the newest wins.
    pub fn drain(&mut self, rx: &mut mpsc::Receiver<MonitoringData>) {
        loop {
            match rx.try_recv() {
                Ok(data) => self.update_from_monitoring(data),
                Err(mpsc::error::TryRecvError::Empty) => break,
                Err(mpsc::error::TryRecvError::Disconnected) => {
                    tracing::warn!("monitoring runtime stopped; exiting dashboard");
                    self.should_quit = true;
                    break;
                }
            }
        }
    }

    /// Store a new snapshot.
    ///
    /// A snapshot without an ingestion keeps the previously shown one, so a
    /// failing source never blanks a dashboard that already had data.
    pub fn update_from_monitoring(&mut self, mut data: MonitoringData) {
        if data.ingestion.is_none() {
            data.ingestion = self
                .last_data
                .as_ref()
                .and_then(|previous| previous.ingestion.clone());
        }
        if let Some(error) = &data.last_error {
            tracing::debug!(error = %error, "snapshot carries a refresh error");
        }
        self.last_data = Some(data);
    }

    /// Assemble the dashboard input for `now`.
    pub fn view_data(&self, now: DateTime<Utc>) -> DashboardViewData {
        let (source, refreshed_age_secs, last_error, ingestion) = match &self.last_data {
            Some(data) => (
                data.source.clone(),
                (now - data.refreshed_at).num_seconds(),
                data.last_error.clone(),
                data.ingestion.clone(),
            ),
            None => ("waiting for first refresh…".to_string(), 0, None, None),
        };

        DashboardViewData {
            source,
            timezone_label: self.clock.label(),
            current_time: self.clock.format(now),
            refreshed_age_secs,
            refresh_secs: self.refresh_secs,
            last_error,
            ingestion,
            history_rows: self.history_rows,
        }
    }

    fn render(&self, frame: &mut Frame) {
        let data = self.view_data(Utc::now());
        let area = frame.area();
        dashboard_view::render_dashboard(frame, area, &data, &self.theme);
    }
}

/// Leave raw mode and the alternate screen.
///
/// Also called from the binary when the loop is cancelled by a signal.
pub fn restore_terminal() -> io::Result<()> {
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen)?;
    Ok(())
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use monitor_core::models::RawTable;
    use monitor_runtime::data::analysis::{ingest, Ingestion};
    use ratatui::backend::TestBackend;
    use std::sync::Arc;

    fn ingestion() -> Arc<Ingestion> {
        let table = RawTable::from_rows([
            ["2024-12-04", "08:00:00", "1"],
            ["2024-12-04", "09:00:00", "0"],
        ]);
        Arc::new(ingest(&table).unwrap())
    }

    fn snapshot(ingestion: Option<Arc<Ingestion>>, error: Option<&str>) -> MonitoringData {
        MonitoringData {
            ingestion,
            last_error: error.map(str::to_string),
            source: "/data/exports".to_string(),
            refreshed_at: Utc::now(),
        }
    }

    // ── KeyAction ─────────────────────────────────────────────────────────────

    #[test]
    fn test_key_actions() {
        let none = KeyModifiers::NONE;
        assert_eq!(KeyAction::from_key(KeyCode::Char('q'), none), KeyAction::Quit);
        assert_eq!(KeyAction::from_key(KeyCode::Char('Q'), none), KeyAction::Quit);
        assert_eq!(KeyAction::from_key(KeyCode::Esc, none), KeyAction::Quit);
        assert_eq!(
            KeyAction::from_key(KeyCode::Char('c'), KeyModifiers::CONTROL),
            KeyAction::Quit
        );
        assert_eq!(KeyAction::from_key(KeyCode::Char('c'), none), KeyAction::None);
        assert_eq!(KeyAction::from_key(KeyCode::Char('r'), none), KeyAction::Refresh);
        assert_eq!(KeyAction::from_key(KeyCode::Enter, none), KeyAction::None);
    }

    // ── App::new ──────────────────────────────────────────────────────────────

    #[test]
    fn test_app_creation_defaults() {
        let app = App::new("dark", "Asia/Jakarta", 5, 20);
        assert_eq!(app.clock.tz(), chrono_tz::Asia::Jakarta);
        assert_eq!(app.refresh_secs, 5);
        assert_eq!(app.history_rows, 20);
        assert!(!app.should_quit);
        assert!(app.last_data.is_none());
    }

    #[test]
    fn test_app_creation_unknown_theme_and_timezone() {
        let app = App::new("neon", "Mars/Olympus", 5, 20);
        assert_eq!(app.clock.tz(), chrono_tz::Tz::UTC);
        assert!(app.theme.header.fg.is_some());
    }

    // ── update_from_monitoring ────────────────────────────────────────────────

    #[test]
    fn test_update_stores_snapshot() {
        let mut app = App::new("dark", "UTC", 5, 20);
        app.update_from_monitoring(snapshot(Some(ingestion()), None));
        let data = app.last_data.as_ref().unwrap();
        assert_eq!(data.ingestion.as_ref().unwrap().stats.total_count, 2);
        assert!(data.last_error.is_none());
    }

    #[test]
    fn test_update_without_ingestion_keeps_previous_data() {
        let mut app = App::new("dark", "UTC", 5, 20);
        let first = ingestion();
        app.update_from_monitoring(snapshot(Some(Arc::clone(&first)), None));
        app.update_from_monitoring(snapshot(None, Some("Table has 5 columns")));

        let data = app.last_data.as_ref().unwrap();
        assert!(Arc::ptr_eq(data.ingestion.as_ref().unwrap(), &first));
        assert_eq!(data.last_error.as_deref(), Some("Table has 5 columns"));
    }

    #[test]
    fn test_update_clears_error_on_success() {
        let mut app = App::new("dark", "UTC", 5, 20);
        app.update_from_monitoring(snapshot(None, Some("not found")));
        app.update_from_monitoring(snapshot(Some(ingestion()), None));
        assert!(app.last_data.as_ref().unwrap().last_error.is_none());
    }

    // ── drain ─────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_drain_keeps_newest_snapshot() {
        let mut app = App::new("dark", "UTC", 5, 20);
        let (tx, mut rx) = mpsc::channel(16);
        tx.send(snapshot(None, Some("first"))).await.unwrap();
        tx.send(snapshot(Some(ingestion()), None)).await.unwrap();

        app.drain(&mut rx);
        assert!(!app.should_quit);
        assert!(app.last_data.as_ref().unwrap().last_error.is_none());

        drop(tx);
        app.drain(&mut rx);
        assert!(app.should_quit);
    }

    // ── view_data / render ────────────────────────────────────────────────────

    #[test]
    fn test_view_data_before_first_snapshot() {
        let app = App::new("dark", "UTC", 5, 20);
        let view = app.view_data(Utc::now());
        assert!(view.ingestion.is_none());
        assert!(view.last_error.is_none());
        assert!(view.timezone_label.starts_with("UTC"));
    }

    #[test]
    fn test_view_data_uses_clock_and_age() {
        let mut app = App::new("dark", "Asia/Jakarta", 5, 7);
        let mut data = snapshot(Some(ingestion()), None);
        data.refreshed_at = "2024-12-04T01:00:00Z".parse().unwrap();
        app.update_from_monitoring(data);

        let now: DateTime<Utc> = "2024-12-04T01:00:04Z".parse().unwrap();
        let view = app.view_data(now);
        assert_eq!(view.current_time, "08:00:04");
        assert_eq!(view.refreshed_age_secs, 4);
        assert_eq!(view.history_rows, 7);
        assert_eq!(view.source, "/data/exports");
    }

    #[test]
    fn test_render_does_not_panic() {
        let mut app = App::new("classic", "UTC", 5, 20);
        app.update_from_monitoring(snapshot(Some(ingestion()), Some("stale")));

        let mut terminal = Terminal::new(TestBackend::new(120, 50)).unwrap();
        terminal.draw(|frame| app.render(frame)).unwrap();
    }
}
