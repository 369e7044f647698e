//! Calendar rules for due dates.
//!
//! Month-based frequencies keep a target day of month (e.g. "due on the 31st")
//! and clamp it to the last day of short months. Every step re-applies the
//! target day, so a clamped February never shifts the rest of the series.

use chrono::{Datelike, Days, Months, NaiveDate, NaiveDateTime, NaiveTime};
use model::entities::recurring_bill::Frequency;

/// Returns the number of days in the given month using chrono.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first| first.checked_add_months(Months::new(1)))
        .and_then(|first_of_next| first_of_next.pred_opt())
        .map_or(28, |last| last.day())
}

/// The `target_day` of the given month, clamped down to the month's last day.
///
/// `month` is 1-based; values above 12 roll over into the following years.
/// A `target_day` of 0 is treated as 1.
pub fn safe_due_date(year: i32, month: u32, target_day: u32) -> NaiveDate {
    let month_index = month.max(1) - 1;
    let year = year + (month_index / 12) as i32;
    let month = month_index % 12 + 1;

    let day = target_day.clamp(1, days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(NaiveDate::MAX)
}

/// The due date `periods` steps of `frequency` after `from`.
///
/// Day-based frequencies ignore `target_day`. Month-based frequencies land on
/// `safe_due_date(.., target_day)` of the target month.
pub fn advance(from: NaiveDate, frequency: Frequency, target_day: u32, periods: u32) -> NaiveDate {
    match frequency {
        Frequency::Daily => add_days(from, u64::from(periods)),
        Frequency::Weekly => add_days(from, 7 * u64::from(periods)),
        Frequency::Biweekly => add_days(from, 14 * u64::from(periods)),
        Frequency::Monthly => add_months(from, periods, target_day),
        Frequency::Quarterly => add_months(from, periods.saturating_mul(3), target_day),
        Frequency::Yearly => add_months(from, periods.saturating_mul(12), target_day),
    }
}

fn add_days(from: NaiveDate, days: u64) -> NaiveDate {
    from.checked_add_days(Days::new(days)).unwrap_or(NaiveDate::MAX)
}

fn add_months(from: NaiveDate, months: u32, target_day: u32) -> NaiveDate {
    // Months counted from year 0 so the division below handles the year roll.
    let total = i64::from(from.year()) * 12 + i64::from(from.month0()) + i64::from(months);
    let year = (total.div_euclid(12)) as i32;
    let month = (total.rem_euclid(12)) as u32 + 1;
    safe_due_date(year, month, target_day)
}

/// `n` consecutive due dates starting at `start` (included).
pub fn due_dates(start: NaiveDate, frequency: Frequency, target_day: u32, n: u32) -> Vec<NaiveDate> {
    (0..n).map(|i| advance(start, frequency, target_day, i)).collect()
}

/// 00:00:00.000 of the same day.
pub fn start_of_day(at: NaiveDateTime) -> NaiveDateTime {
    at.date().and_time(NaiveTime::MIN)
}

/// 23:59:59.999 of the same day.
pub fn end_of_day(at: NaiveDateTime) -> NaiveDateTime {
    let last_milli = NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN);
    at.date().and_time(last_milli)
}

/// Signed whole days from `b` to `a` after normalizing both to start of day.
/// Positive when `a` is later.
pub fn diff_in_days(a: NaiveDateTime, b: NaiveDateTime) -> i64 {
    (start_of_day(a) - start_of_day(b)).num_days()
}
