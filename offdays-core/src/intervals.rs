//! Business-day arithmetic over inclusive calendar-date ranges.

use chrono::{Datelike, NaiveDate, Weekday};

/// Count the dates in `[start, end]` whose weekday is Monday through Friday.
///
/// An inverted range yields 0 rather than an error; callers validate
/// ordering separately.
pub fn business_days(start: NaiveDate, end: NaiveDate) -> u32 {
    if end < start {
        return 0;
    }

    start
        .iter_days()
        .take_while(|day| *day <= end)
        .filter(|day| !matches!(day.weekday(), Weekday::Sat | Weekday::Sun))
        .count() as u32
}

/// Business days in the range minus public holidays, floored at zero.
pub fn deducted_days(start: NaiveDate, end: NaiveDate, holidays: u32) -> u32 {
    business_days(start, end).saturating_sub(holidays)
}
