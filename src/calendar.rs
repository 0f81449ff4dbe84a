use crate::date::Month;
use chrono::NaiveDate;
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct DayCell {
    pub day: u32,
    pub injected: bool,
    pub today: bool,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct MonthCalendar {
    pub label: String,
    pub injected_days: u32,
    /// Sunday-first rows; `None` pads before day 1 and after the last day.
    pub weeks: Vec<Vec<Option<DayCell>>>,
}

pub fn month_calendar(days: &BTreeSet<NaiveDate>, month: Month, today: NaiveDate) -> MonthCalendar {
    let lead = month.first_weekday_from_sunday() as usize;
    let mut cells: Vec<Option<DayCell>> = vec![None; lead];

    let mut injected_days = 0u32;
    let first = month.first_day();
    for d in 0..month.days_in_month() {
        let date = first + chrono::Duration::days(d as i64);
        let injected = days.contains(&date);
        if injected {
            injected_days += 1;
        }
        cells.push(Some(DayCell {
            day: d + 1,
            injected,
            today: date == today,
        }));
    }

    while cells.len() % 7 != 0 {
        cells.push(None);
    }

    MonthCalendar {
        label: month.label(),
        injected_days,
        weeks: cells.chunks(7).map(|w| w.to_vec()).collect(),
    }
}
