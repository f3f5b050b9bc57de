//! Detection statistics: totals, rate, hourly histogram and the cumulative
//! detection-rate series.
//!
//! Everything here is a pure function of the detection slice. The stats are
//! rebuilt from scratch on every refresh.

use std::ops::Index;

use chrono::{NaiveTime, Timelike};
use monitor_core::models::{CellParseWarning, Detection};
use serde::Serialize;

/// Number of hour-of-day buckets.
pub const HOURS_PER_DAY: usize = 24;

// ── HourlyHistogram ───────────────────────────────────────────────────────────

/// Detections per hour of day. All 24 buckets always exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HourlyHistogram([u64; HOURS_PER_DAY]);

impl Default for HourlyHistogram {
    fn default() -> Self {
        Self([0; HOURS_PER_DAY])
    }
}

impl HourlyHistogram {
    /// Count for `hour`; hours outside 0–23 read as 0.
    pub fn get(&self, hour: u32) -> u64 {
        self.0.get(hour as usize).copied().unwrap_or(0)
    }

    fn add(&mut self, hour: u32, count: u64) {
        if let Some(bucket) = self.0.get_mut(hour as usize) {
            *bucket += count;
        }
    }

    /// `(hour, count)` pairs for hours 0 through 23.
    pub fn iter(&self) -> impl Iterator<Item = (u32, u64)> + '_ {
        self.0.iter().enumerate().map(|(h, &c)| (h as u32, c))
    }

    pub fn total(&self) -> u64 {
        self.0.iter().sum()
    }

    /// Busiest hour, earliest on ties. `None` when every bucket is zero.
    pub fn peak(&self) -> Option<(u32, u64)> {
        self.iter()
            .filter(|&(_, c)| c > 0)
            .fold(None, |best, (h, c)| match best {
                Some((_, bc)) if bc >= c => best,
                _ => Some((h, c)),
            })
    }

    pub fn as_array(&self) -> &[u64; HOURS_PER_DAY] {
        &self.0
    }
}

/// Direct bucket access.
///
/// # Panics
///
/// Panics when `hour >= 24`. Use [`HourlyHistogram::get`] for a checked read.
impl Index<usize> for HourlyHistogram {
    type Output = u64;

    fn index(&self, hour: usize) -> &u64 {
        &self.0[hour]
    }
}

// ── CumulativePoint ───────────────────────────────────────────────────────────

/// One point of the cumulative detection-rate series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CumulativePoint {
    /// Parsed time of the row that produced this point.
    pub time: NaiveTime,
    /// Running detection rate in percent, within `[0, 100]`.
    pub rate_pct: f64,
}

// ── AggregateStats ────────────────────────────────────────────────────────────

/// Derived statistics for one ingestion of the detection table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateStats {
    /// Number of normalized rows.
    pub total_count: usize,
    /// Sum of detection flags over all rows.
    pub detected_count: u64,
    /// `detected / total * 100`; 0 for an empty table.
    pub detection_rate_pct: f64,
    /// `detected / 24`; 0 when nothing was detected.
    pub avg_per_hour: f64,
    /// Detections per hour of day, over rows with a parseable time.
    pub hourly_histogram: HourlyHistogram,
    /// Running detection rate over rows with a parseable time, indexed
    /// within that filtered subsequence.
    pub cumulative_rate_series: Vec<CumulativePoint>,
    /// Final row in source order, regardless of time validity.
    pub last_event: Option<Detection>,
    /// Rows excluded from the time-based statistics.
    pub invalid_time_count: usize,
}

impl Default for AggregateStats {
    fn default() -> Self {
        Self::empty()
    }
}

impl AggregateStats {
    /// Stats of an empty table: zeros, 24 zeroed buckets, no series.
    pub fn empty() -> Self {
        Self {
            total_count: 0,
            detected_count: 0,
            detection_rate_pct: 0.0,
            avg_per_hour: 0.0,
            hourly_histogram: HourlyHistogram::default(),
            cumulative_rate_series: Vec::new(),
            last_event: None,
            invalid_time_count: 0,
        }
    }

    /// Rows whose flag is 0; the second slice of the detection split.
    pub fn not_detected_count(&self) -> u64 {
        (self.total_count as u64).saturating_sub(self.detected_count)
    }

    /// The cumulative series as bare percentages.
    pub fn cumulative_rates(&self) -> Vec<f64> {
        self.cumulative_rate_series
            .iter()
            .map(|p| p.rate_pct)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.total_count == 0
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Compute [`AggregateStats`] for `detections` (in source order).
///
/// Rows with an unparseable time still count towards the totals and rate but
/// are left out of the histogram and the cumulative series; the series index
/// runs over the remaining rows only.
pub fn aggregate(detections: &[Detection]) -> AggregateStats {
    let Some(last) = detections.last() else {
        return AggregateStats::empty();
    };

    let total_count = detections.len();
    let detected_count: u64 = detections.iter().map(flag_value).sum();

    let mut hourly_histogram = HourlyHistogram::default();
    let mut cumulative_rate_series = Vec::with_capacity(total_count);
    let mut running_detected = 0u64;
    let mut invalid_time_count = 0usize;

    for detection in detections {
        let Some(time) = detection.time_of_day() else {
            invalid_time_count += 1;
            continue;
        };
        let flag = flag_value(detection);
        hourly_histogram.add(time.hour(), flag);

        running_detected += flag;
        let seen = cumulative_rate_series.len() as u64 + 1;
        cumulative_rate_series.push(CumulativePoint {
            time,
            rate_pct: rate_pct(running_detected, seen),
        });
    }

    AggregateStats {
        total_count,
        detected_count,
        detection_rate_pct: rate_pct(detected_count, total_count as u64),
        avg_per_hour: if detected_count == 0 {
            0.0
        } else {
            detected_count as f64 / HOURS_PER_DAY as f64
        },
        hourly_histogram,
        cumulative_rate_series,
        last_event: Some(last.clone()),
        invalid_time_count,
    }
}

/// One [`CellParseWarning::InvalidTime`] per row whose time does not parse.
pub fn time_warnings(detections: &[Detection]) -> Vec<CellParseWarning> {
    detections
        .iter()
        .enumerate()
        .filter(|(_, d)| d.time_of_day().is_none())
        .map(|(row, d)| CellParseWarning::InvalidTime {
            row,
            value: d.time.clone(),
        })
        .collect()
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn flag_value(detection: &Detection) -> u64 {
    u64::from(detection.flag.as_u8())
}

/// `part / whole * 100`, clamped to `[0, 100]`; 0 when `whole` is 0.
fn rate_pct(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    (part as f64 / whole as f64 * 100.0).clamp(0.0, 100.0)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
