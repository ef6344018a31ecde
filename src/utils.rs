use chrono::{Datelike as _, Days, NaiveDate, Weekday};

/// Inclusive count of weekdays between `start` and `end`
pub fn count_working_days(mut start: NaiveDate, end: NaiveDate) -> i64 {
    let mut working_days = 0;

    while start <= end {
        if start.weekday() != Weekday::Sat && start.weekday() != Weekday::Sun {
            working_days += 1;
        }

        let Some(next) = start.checked_add_days(Days::new(1)) else {
            break;
        };
        start = next;
    }

    working_days
}

/// Sunday on or before `date`
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let offset = date.weekday().num_days_from_sunday() as u64;

    date.checked_sub_days(Days::new(offset)).unwrap_or(date)
}

pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// `2024-01-01 to 2024-01-31`
pub fn range_label(start: NaiveDate, end: NaiveDate) -> String {
    format!("{} to {}", start.format("%Y-%m-%d"), end.format("%Y-%m-%d"))
}
