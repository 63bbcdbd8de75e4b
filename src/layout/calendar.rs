//! Date range planning
//!
//! Produces the ordered, gap-free list of partition dates covering an
//! inclusive window. Planning is pure so the same window always yields the
//! same list, which the ledger diff relies on.

use crate::Granularity;
use chrono::{Datelike, Months, NaiveDate};

/// First day of the month containing `date`
pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Plan partition dates for `[start, end]`
///
/// Monthly plans begin at `first_of_month(start)` and step one calendar
/// month; daily plans step one day. Returns an empty list when `start > end`.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use vision_mirror::layout::plan;
/// use vision_mirror::Granularity;
///
/// let start = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
/// let end = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
/// let months = plan(start, end, Granularity::Monthly);
/// assert_eq!(months.len(), 3);
/// assert_eq!(months[0], NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
/// ```
pub fn plan(start: NaiveDate, end: NaiveDate, granularity: Granularity) -> Vec<NaiveDate> {
    if start > end {
        return Vec::new();
    }

    let mut dates = Vec::new();
    let mut current = match granularity {
        Granularity::Monthly => first_of_month(start),
        Granularity::Daily => start,
    };

    while current <= end {
        dates.push(current);
        let next = match granularity {
            Granularity::Monthly => current.checked_add_months(Months::new(1)),
            Granularity::Daily => current.succ_opt(),
        };
        match next {
            Some(next) => current = next,
            None => break,
        }
    }

    dates
}
