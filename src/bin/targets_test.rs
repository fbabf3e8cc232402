use chrono::NaiveDate;
use smdash::targets::{days_in_month, scale_monthly_target, window_day_counts};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// Test the 26-working-day daily target convention
fn test_daily_target() {
    println!("\n====== Testing daily target ======");

    // 2,600,000 a month is exactly 100,000 a working day
    let scaled = scale_monthly_target(2_600_000.0, date(2025, 7, 16));
    assert_eq!(scaled.y, 100_000.0);
    println!("✓ 2,600,000 monthly → 100,000 daily");

    // Rounded to the nearest whole amount
    let scaled = scale_monthly_target(1_000.0, date(2025, 7, 16));
    assert_eq!(scaled.y, 38.0); // 1000 / 26 = 38.46...
    println!("✓ Daily target rounds to whole amounts");
}

// Test week-to-date scaling across the week
fn test_week_to_date() {
    println!("\n====== Testing week-to-date target ======");

    // Wednesday July 16th 2025: Monday the 14th through yesterday the 15th
    // is two days
    let scaled = scale_monthly_target(2_600_000.0, date(2025, 7, 16));
    assert_eq!(scaled.w, 200_000.0);
    println!("✓ Wednesday counts 2 days of WTD");

    // Sunday the 20th: Monday the 14th through Saturday the 19th is six days
    let scaled = scale_monthly_target(2_600_000.0, date(2025, 7, 20));
    assert_eq!(scaled.w, 600_000.0);
    println!("✓ Sunday counts 6 days of WTD");

    // Monday: yesterday is Sunday of the previous week, the count clamps to
    // zero and so does the target
    let scaled = scale_monthly_target(2_600_000.0, date(2025, 7, 14));
    assert_eq!(scaled.w, 0.0);
    println!("✓ Monday WTD target is 0, never negative");
}

// Test month-to-date scaling against calendar days
fn test_month_to_date() {
    println!("\n====== Testing month-to-date target ======");

    // July 16th: 15 of 31 days passed
    let scaled = scale_monthly_target(2_600_000.0, date(2025, 7, 16));
    assert_eq!(scaled.m, (2_600_000.0_f64 / 31.0 * 15.0).round());
    assert_eq!(scaled.m, 1_258_065.0);
    println!("✓ Mid-month MTD prorates by calendar days");

    // First of the month: no days passed yet
    let scaled = scale_monthly_target(2_600_000.0, date(2025, 8, 1));
    assert_eq!(scaled.m, 0.0);
    println!("✓ MTD target is 0 on the 1st");
}

fn test_window_day_counts() {
    println!("\n====== Testing window day counts ======");

    assert_eq!(window_day_counts(date(2025, 7, 16)), (1, 2, 15));
    println!("✓ Wednesday July 16th: (1, 2, 15)");

    assert_eq!(window_day_counts(date(2025, 7, 14)), (1, 0, 13));
    println!("✓ Monday: week window is empty");

    assert_eq!(window_day_counts(date(2025, 8, 1)), (1, 4, 0));
    println!("✓ First of month: month window is empty");
}

fn test_days_in_month() {
    println!("\n====== Testing days_in_month ======");

    assert_eq!(days_in_month(date(2025, 7, 10)), 31);
    assert_eq!(days_in_month(date(2024, 2, 5)), 29);
    assert_eq!(days_in_month(date(2025, 2, 5)), 28);
    assert_eq!(days_in_month(date(2025, 12, 31)), 31);
    println!("✓ Calendar month lengths, leap years included");
}

// The scaler is a pure function of (target, today): same inputs, same output
fn test_determinism() {
    println!("\n====== Testing determinism ======");

    let a = scale_monthly_target(1_234_567.0, date(2025, 7, 16));
    let b = scale_monthly_target(1_234_567.0, date(2025, 7, 16));
    assert_eq!(a, b);
    println!("✓ Scaling is deterministic");

    let zero = scale_monthly_target(0.0, date(2025, 7, 16));
    assert_eq!(zero.y, 0.0);
    assert_eq!(zero.w, 0.0);
    assert_eq!(zero.m, 0.0);
    println!("✓ Zero target scales to zero everywhere");
}

fn main() {
    test_daily_target();
    test_week_to_date();
    test_month_to_date();
    test_window_day_counts();
    test_days_in_month();
    test_determinism();

    println!("\nAll target scaling tests passed!");
}
