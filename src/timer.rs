use crate::model::{TimerState, Timestamp};
use chrono::Duration;

const MINUTES_PER_DOSE_UNIT: i64 = 30;
const DEFAULT_INTERVAL_HOURS: i64 = 5;

/// Time until the next dose. A dose of zero counts as no dose and gets the default interval.
/// `None` when the dose is too large to express as a duration.
pub fn dose_interval(dose_amount: Option<f64>) -> Option<Duration> {
    match dose_amount.filter(|d| *d != 0.0) {
        Some(dose) => {
            let ms = (dose * (MINUTES_PER_DOSE_UNIT * 60_000) as f64).round();
            if !ms.is_finite() || ms.abs() >= i64::MAX as f64 {
                return None;
            }
            Duration::try_milliseconds(ms as i64)
        }
        None => Some(Duration::hours(DEFAULT_INTERVAL_HOURS)),
    }
}

/// When the next dose falls due, or `None` if it lies past the representable calendar.
pub fn next_due_time(now: Timestamp, dose_amount: Option<f64>) -> Option<Timestamp> {
    now.checked_add_signed(dose_interval(dose_amount)?)
}

pub fn next_timer(now: Timestamp, dose_amount: Option<f64>) -> TimerState {
    let next_due_time = next_due_time(now, dose_amount);
    if next_due_time.is_none() {
        tracing::warn!(dose = ?dose_amount, "dose interval out of range, timer left unset");
    }
    TimerState {
        next_due_time,
        last_dose_amount: dose_amount,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct TimeLeft {
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
    pub overdue: bool,
}

pub fn time_left(timer: &TimerState, now: Timestamp) -> Option<TimeLeft> {
    let due = timer.next_due_time?;
    let remaining = (due - now).num_seconds();
    if remaining <= 0 {
        return Some(TimeLeft {
            hours: 0,
            minutes: 0,
            seconds: 0,
            overdue: true,
        });
    }

    Some(TimeLeft {
        hours: remaining / 3600,
        minutes: (remaining % 3600) / 60,
        seconds: remaining % 60,
        overdue: false,
    })
}
