//! Active/next period resolution and progress through the active period.
//!
//! Resolution is a pure function of the period list and the clock reading, so
//! it is safe to evaluate on every tick.

use crate::period::Period;
use crate::time_of_day::TimeOfDay;
use chrono::{NaiveTime, Timelike};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Resolution<'a> {
    pub active: Option<&'a Period>,
    pub next: Option<&'a Period>,
}

impl<'a> Resolution<'a> {
    pub fn is_idle(&self) -> bool {
        self.active.is_none() && self.next.is_none()
    }
}

/// Periods ordered by start time. The sort is stable, so periods sharing a
/// start time keep their input order.
pub fn sorted_periods(periods: &[Period]) -> Vec<&Period> {
    let mut sorted: Vec<&Period> = periods.iter().collect();
    sorted.sort_by_key(|period| period.start_time);
    sorted
}

/// Determines the active and next period at `now` (minute resolution).
///
/// The first period in start order whose `[start, end)` range holds `now` is
/// active; when periods overlap the earliest-starting match wins. With an
/// active period, next is its successor in start order. Otherwise next is the
/// first period starting after `now`.
pub fn resolve(periods: &[Period], now: NaiveTime) -> Resolution<'_> {
    resolve_at(periods, TimeOfDay::from_naive_time(now))
}

pub fn resolve_at(periods: &[Period], now: TimeOfDay) -> Resolution<'_> {
    let sorted = sorted_periods(periods);

    if let Some(idx) = sorted.iter().position(|period| period.contains(now)) {
        return Resolution {
            active: Some(sorted[idx]),
            next: sorted.get(idx + 1).copied(),
        };
    }

    Resolution {
        active: None,
        next: sorted.into_iter().find(|period| now < period.start_time),
    }
}

/// How far `now` is through a period, at second resolution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PeriodProgress {
    /// Elapsed share of the period, clamped to `0.0..=1.0`.
    pub fraction: f64,
    pub remaining_minutes: u32,
    pub remaining_seconds: u32,
}

impl PeriodProgress {
    pub fn compute(period: &Period, now: NaiveTime) -> Self {
        let start = f64::from(period.start_time.seconds_since_midnight());
        let end = period.end_time.seconds_since_midnight();
        let now_s = now.num_seconds_from_midnight();

        let total = f64::from(end) - start;
        let fraction = if total > 0.0 {
            ((f64::from(now_s) - start) / total).clamp(0.0, 1.0)
        } else {
            1.0
        };
        let remaining = end.saturating_sub(now_s);

        Self {
            fraction,
            remaining_minutes: remaining / 60,
            remaining_seconds: remaining % 60,
        }
    }

    pub fn percent(&self) -> f64 {
        self.fraction * 100.0
    }

    /// `"12m 05s remaining"`
    pub fn remaining_label(&self) -> String {
        format!(
            "{}m {:02}s remaining",
            self.remaining_minutes, self.remaining_seconds
        )
    }

    /// Fixed-width text bar, e.g. `[#####-----]` at 50%.
    pub fn bar(&self, width: usize) -> String {
        let filled = ((self.fraction * width as f64).round() as usize).min(width);
        format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
    }
}
