use chrono::{Datelike, Duration, NaiveDate};

use crate::entity::PeriodTotals;

/// Monthly targets are set against a 26-working-day month, not calendar days.
pub const WORKING_DAYS_PER_MONTH: f64 = 26.0;

/// Prorate a monthly target into the three reporting sub-targets as of
/// `today`. Pure function of its inputs; callers pass the current date per
/// request because the sub-targets drift daily.
///
/// - yesterday: monthly / 26
/// - week-to-date: daily target x days from Monday through yesterday,
///   inclusive (0 on Mondays - yesterday precedes the week start, and the
///   count is clamped at zero rather than going negative)
/// - month-to-date: (monthly / calendar days in month) x days from the 1st
///   through yesterday, inclusive
///
/// All three are rounded to the nearest whole amount.
pub fn scale_monthly_target(monthly_target: f64, today: NaiveDate) -> PeriodTotals {
    let daily = monthly_target / WORKING_DAYS_PER_MONTH;

    let (_, week_days, month_days) = window_day_counts(today);

    let wtd = daily * week_days as f64;
    let mtd = monthly_target / days_in_month(today) as f64 * month_days as f64;

    PeriodTotals {
        y: daily.round(),
        w: wtd.round(),
        m: mtd.round(),
    }
}

/// Day counts for the three reporting windows as of `today`, measured
/// through the end of yesterday: (1, days since Monday inclusive, days since
/// the 1st inclusive). Week and month counts are clamped at zero for the
/// boundary days (Monday, the 1st).
pub fn window_day_counts(today: NaiveDate) -> (i64, i64, i64) {
    let yesterday = today - Duration::days(1);

    let start_of_week = today - Duration::days(i64::from(today.weekday().num_days_from_monday()));
    let week_days = ((yesterday - start_of_week).num_days() + 1).max(0);

    let start_of_month = first_of_month(today);
    let month_days = ((yesterday - start_of_month).num_days() + 1).max(0);

    (1, week_days, month_days)
}

pub fn days_in_month(date: NaiveDate) -> u32 {
    let first = first_of_month(date);
    let next = if date.month() == 12 {
        NaiveDate::from_ymd_opt(date.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(date.year(), date.month() + 1, 1)
    };
    match next {
        Some(next) => (next - first).num_days() as u32,
        None => 30,
    }
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date)
}
