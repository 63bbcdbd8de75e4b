//! Unit tests for date range planning

use chrono::{Datelike, NaiveDate};
use vision_mirror::layout::{first_of_month, plan};
use vision_mirror::Granularity;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn test_daily_plan_is_gap_free_and_inclusive() {
    let start = date(2023, 12, 25);
    let end = date(2024, 3, 2);
    let days = plan(start, end, Granularity::Daily);

    assert_eq!(days.first(), Some(&start));
    assert_eq!(days.last(), Some(&end));
    assert_eq!(days.len() as i64, (end - start).num_days() + 1);
    assert!(days.windows(2).all(|w| w[1] == w[0].succ_opt().unwrap()));
}

#[test]
fn test_monthly_plan_steps_calendar_months() {
    let months = plan(date(2023, 11, 30), date(2024, 2, 1), Granularity::Monthly);
    assert_eq!(
        months,
        vec![date(2023, 11, 1), date(2023, 12, 1), date(2024, 1, 1), date(2024, 2, 1)]
    );
    assert!(months.iter().all(|d| d.day() == 1));
}

#[test]
fn test_inverted_window_is_empty() {
    assert!(plan(date(2024, 2, 1), date(2024, 1, 31), Granularity::Daily).is_empty());
    assert!(plan(date(2024, 2, 1), date(2024, 1, 31), Granularity::Monthly).is_empty());
}

#[test]
fn test_plan_is_repeatable() {
    let a = plan(date(2017, 1, 1), date(2024, 6, 30), Granularity::Monthly);
    let b = plan(date(2017, 1, 1), date(2024, 6, 30), Granularity::Monthly);
    assert_eq!(a, b);
    assert_eq!(a.len(), 90);
    assert_eq!(first_of_month(date(2024, 6, 30)), date(2024, 6, 1));
}
