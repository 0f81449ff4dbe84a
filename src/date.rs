use crate::error::CliError;
use crate::model::Timestamp;
use chrono::{Datelike, FixedOffset, NaiveDate};

const MILLIS_PER_DAY: i64 = 86_400_000;

/// The local day an instant belongs to, in the offset it was recorded with.
pub fn calendar_day(ts: &Timestamp) -> NaiveDate {
    ts.date_naive()
}

/// The day `ts` falls on as seen from `offset`.
pub fn calendar_day_in(ts: &Timestamp, offset: &FixedOffset) -> NaiveDate {
    ts.with_timezone(offset).date_naive()
}

/// Whole days elapsed from `from` to `to`, rounded down (negative when `to` is earlier).
pub fn whole_days_between(from: &Timestamp, to: &Timestamp) -> i64 {
    let ms = (*to - *from).num_milliseconds();
    ms.div_euclid(MILLIS_PER_DAY)
}

pub fn fmt_date(d: NaiveDate) -> String {
    d.format("%Y-%m-%d").to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Month {
    pub year: i32,
    pub month: u32,
}

impl Month {
    pub fn of(d: NaiveDate) -> Self {
        Self {
            year: d.year(),
            month: d.month(),
        }
    }

    pub fn first_day(&self) -> NaiveDate {
        // Month is validated on construction, day 1 always exists.
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or_default()
    }

    pub fn days_in_month(&self) -> u32 {
        let (ny, nm) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        match NaiveDate::from_ymd_opt(ny, nm, 1) {
            Some(next) => (next - self.first_day()).num_days() as u32,
            None => 31,
        }
    }

    /// Sunday = 0 .. Saturday = 6
    pub fn first_weekday_from_sunday(&self) -> u32 {
        self.first_day().weekday().num_days_from_sunday()
    }

    pub fn label(&self) -> String {
        self.first_day().format("%B %Y").to_string()
    }
}

pub fn parse_month(s: &str, label: &str) -> Result<Month, CliError> {
    let ss = s.trim();
    let invalid = || CliError::usage(format!("Invalid {}: {}", label, s));
    if ss.len() != 7 || ss.as_bytes()[4] != b'-' {
        return Err(invalid());
    }

    let year: i32 = ss[0..4].parse().map_err(|_| invalid())?;
    let month: u32 = ss[5..7].parse().map_err(|_| invalid())?;
    if NaiveDate::from_ymd_opt(year, month, 1).is_none() {
        return Err(invalid());
    }

    Ok(Month { year, month })
}
