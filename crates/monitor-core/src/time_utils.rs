use chrono::{DateTime, NaiveDate, NaiveTime, Timelike, Utc};
use chrono_tz::Tz;
use tracing::warn;

/// Default display timezone: the monitored site runs on UTC+7.
pub const DEFAULT_TIMEZONE: &str = "Asia/Jakarta";

/// Row-embedded time format.
pub const TIME_FORMAT: &str = "%H:%M:%S";

/// Date layouts seen in spreadsheet exports, tried in order.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y", "%Y/%m/%d", "%d-%m-%Y"];

// ── Row-embedded timestamps ───────────────────────────────────────────────────

/// Parse an `HH:MM:SS` time-of-day cell.
///
/// Returns `None` for blank or out-of-range values such as `"25:99:00"`.
pub fn parse_time_of_day(s: &str) -> Option<NaiveTime> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    NaiveTime::parse_from_str(trimmed, TIME_FORMAT).ok()
}

/// Best-effort parse of a date cell against [`DATE_FORMATS`].
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
}

/// Time-of-day as fractional hours (`08:30:00` → `8.5`), the x-axis unit of
/// the cumulative-rate chart.
pub fn fractional_hour(t: NaiveTime) -> f64 {
    f64::from(t.num_seconds_from_midnight()) / 3600.0
}

// ── System timezone detection ─────────────────────────────────────────────────

/// Detect the IANA timezone name of the running system.
///
/// Uses the `iana-time-zone` crate directly – no subprocess calls.
/// Falls back to `"UTC"` if detection fails.
pub fn get_system_timezone() -> String {
    iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string())
}

// ── DisplayClock ──────────────────────────────────────────────────────────────

/// Wall clock shown in the dashboard header.
///
/// The aggregator never reads the clock; only the presentation layer does.
#[derive(Debug, Clone, Copy)]
pub struct DisplayClock {
    tz: Tz,
}

impl DisplayClock {
    /// Create a clock for the given IANA timezone name.
    ///
    /// Unknown names fall back to UTC and log a warning.
    pub fn new(tz_name: &str) -> Self {
        let tz = tz_name.parse::<Tz>().unwrap_or_else(|_| {
            warn!(
                "DisplayClock: unrecognised timezone \"{}\", falling back to UTC",
                tz_name
            );
            Tz::UTC
        });
        Self { tz }
    }

    /// Validate that `tz_name` is a recognised IANA timezone identifier.
    pub fn validate_timezone(tz_name: &str) -> bool {
        tz_name.parse::<Tz>().is_ok()
    }

    pub fn tz(&self) -> Tz {
        self.tz
    }

    /// Format `dt` as `HH:MM:SS` in this clock's timezone.
    pub fn format(&self, dt: DateTime<Utc>) -> String {
        dt.with_timezone(&self.tz).format(TIME_FORMAT).to_string()
    }

    /// Short label such as `"Asia/Jakarta (UTC+07:00)"`.
    pub fn label(&self) -> String {
        let offset = Utc::now().with_timezone(&self.tz).format("%:z");
        format!("{} (UTC{})", self.tz.name(), offset)
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
