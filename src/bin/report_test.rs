use chrono::NaiveDate;
use smdash::gaps::GapThresholds;
use smdash::report::{
    customer_rating_report, data_records, funnel_scope_report, gaps_report, hierarchy_report,
    quality_report, revenue_report,
};
use smdash::rows::RawRow;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 7, 16).unwrap()
}

fn sparse_row(width: usize, cells: &[(usize, &str)]) -> RawRow {
    let mut row = vec![String::new(); width];
    for (index, value) in cells {
        row[*index] = value.to_string();
    }
    RawRow::new(row)
}

fn approx(actual: f64, expected: f64) -> bool {
    (actual - expected).abs() < 1e-9
}

// Gaps sheet fixture: one worker per exclusion/threshold rule
fn gaps_rows() -> Vec<RawRow> {
    vec![
        // Included: 4 zero sales days
        sparse_row(
            20,
            &[
                (1, "Priya"),
                (3, "45"),
                (8, "Asha Rao"),
                (9, "90,000"),
                (10, "10,000"),
                (11, "4"),
                (15, "11"),
            ],
        ),
        // Excluded: joined 25 days ago, below the 30-day floor
        sparse_row(20, &[(1, "Arjun"), (3, "25"), (8, "Asha Rao"), (11, "10")]),
        // Included via the commerce stream only
        sparse_row(
            20,
            &[
                (1, "Bina"),
                (3, "60"),
                (8, "Asha Rao"),
                (11, "2"),
                (17, "50,000"),
                (18, "20,000"),
                (19, "5"),
            ],
        ),
        // Excluded by the per-row flag, case-insensitive
        sparse_row(20, &[(1, "Chitra"), (3, "90"), (11, "9"), (12, "yes")]),
        // Excluded by the key-mapping registry
        sparse_row(20, &[(1, "Divya"), (3, "90"), (11, "6")]),
        // Included, with no SM assigned
        sparse_row(20, &[(1, "Anil"), (3, "40"), (11, "5")]),
    ]
}

fn test_gaps_report() {
    println!("\n====== Testing gaps_report ======");

    let key_mapping = vec![sparse_row(1, &[(0, "Divya")])];
    let gaps = gaps_report(&gaps_rows(), &key_mapping, GapThresholds::default(), None);

    let names: Vec<&str> = gaps.iter().map(|g| g.dietitian_name.as_str()).collect();
    assert_eq!(names, vec!["Anil", "Bina", "Priya"]);
    println!("✓ Floor, flag, and registry exclusions hold; sort is worst-first then name");

    assert_eq!(gaps[0].sm_name, "Not Assigned");
    println!("✓ Blank SM reads as Not Assigned");

    let bina = &gaps[1];
    assert_eq!(bina.commerce_consecutive_zero_days, 5.0);
    assert!(approx(bina.commerce_percent_achieved, 40.0));
    println!("✓ Commerce stream carries its own zero-days and pct");

    // A worker below the joining floor never appears, whatever the streak
    assert!(!gaps.iter().any(|g| g.dietitian_name == "Arjun"));
    println!("✓ 25 days since joining is always out");

    let scoped = gaps_report(
        &gaps_rows(),
        &key_mapping,
        GapThresholds::default(),
        Some("asha rao"),
    );
    let scoped_names: Vec<&str> = scoped.iter().map(|g| g.dietitian_name.as_str()).collect();
    assert_eq!(scoped_names, vec!["Bina", "Priya"]);
    println!("✓ SM scoping filters the report");
}

// Quality sheet fixture shared by the quality and rating folds
fn quality_rows() -> Vec<RawRow> {
    vec![
        sparse_row(
            28,
            &[
                (0, "C1"),
                (6, "35"),
                (9, "Kiran Patel"),
                (11, "Asha Rao"),
                (21, "4.5"),
                (22, "4.0"),
                (23, "5"),
                (24, "60"),
                (25, "70"),
                (26, "-0.8"),
                (27, "-1.2"),
            ],
        ),
        sparse_row(
            28,
            &[
                (0, "C2"),
                (6, "40"),
                (9, "Kiran Patel"),
                (21, "3.5"),
                (26, "-0.2"),
            ],
        ),
        // Below the 30-client floor: never contributes
        sparse_row(28, &[(0, "C3"), (6, "29"), (9, "Kiran Patel"), (26, "-2")]),
        // No valid weight loss and no positive rating: skipped by both folds
        sparse_row(28, &[(0, "C4"), (6, "50"), (9, "Kiran Patel")]),
    ]
}

fn test_quality_report() {
    println!("\n====== Testing quality_report ======");

    let quality = quality_report(&quality_rows());

    let kiran = quality.get("am-kiran-patel").unwrap();
    assert!(approx(kiran.avg_weekly_weight_loss, -0.5)); // (-0.8 + -0.2) / 2
    assert!(approx(kiran.weekly_on_track_pct, 50.0)); // 1 of 2 unique customers
    assert!(approx(kiran.monthly_on_track_pct, 50.0));
    println!("✓ Averages and on-track shares over unique customers");

    let asha = quality.get("sm-asha-rao").unwrap();
    assert!(approx(asha.weekly_on_track_pct, 100.0)); // only C1 reached the SM
    println!("✓ Each role column accumulates independently");
}

fn test_customer_rating_report() {
    println!("\n====== Testing customer_rating_report ======");

    let ratings = customer_rating_report(&quality_rows());

    let kiran = ratings.get("am-kiran-patel").unwrap();
    assert!(approx(kiran.ytd_avg_csat, 4.0)); // (4.5 + 3.5) / 2
    assert!(approx(kiran.wtd_avg_csat, 4.0)); // single sample
    assert!(approx(kiran.latest_csat, 5.0));
    assert!(approx(kiran.ytd_avg_nps, 60.0));
    assert!(approx(kiran.mtd_avg_nps, 70.0));
    println!("✓ Means over positive samples only, one-decimal rounding");
}

// Funnel fixture: two workers under one SM, one under another
fn funnel_rows() -> Vec<RawRow> {
    vec![
        sparse_row(
            30,
            &[
                (0, "W1"),
                (5, "Asha Rao"),
                (6, "40"),
                (7, "20"),
                (8, "60"),
                (9, "10"),
                (10, "8"),
                (11, "4"),
                (12, "2"),
                (13, "1"),
                (14, "80"),
                (15, "40"),
                (16, "120"),
                (17, "20"),
                (18, "16"),
                (19, "8"),
                (20, "4"),
                (21, "2"),
            ],
        ),
        sparse_row(
            30,
            &[
                (0, "W2"),
                (5, "Asha Rao"),
                (6, "10"),
                (7, "5"),
                (8, "15"),
                (9, "2"),
                (10, "2"),
                (11, "1"),
                (12, "1"),
            ],
        ),
        sparse_row(30, &[(0, "W3"), (5, "Vikram Shah"), (6, "100")]),
    ]
}

fn test_funnel_report() {
    println!("\n====== Testing funnel_scope_report ======");

    let report = funnel_scope_report(&funnel_rows(), "Asha Rao", "sm", today());

    assert_eq!(report.team_size, 2);
    println!("✓ Team size counts distinct scoped workers");

    assert_eq!(report.raw_tallies.ytd.calls, 50.0);
    assert_eq!(report.raw_tallies.ytd.leads, 12.0);
    assert_eq!(report.raw_tallies.wtd.calls, 80.0);
    println!("✓ Tallies sum component-wise per window");

    let ytd = &report.metrics.ytd;
    assert!(approx(ytd.calls_per_dt_per_day, 25.0)); // 50 calls / (2 workers x 1 day)
    assert!(approx(ytd.connectivity, 0.5));
    assert!(approx(ytd.tt_per_connected_call, 3.0));
    assert!(approx(ytd.leads_per_dt_per_day, 6.0));
    assert!(approx(ytd.lead_vs_connected, 0.48));
    assert!(approx(ytd.might_pay, 10.0 / 12.0));
    assert!(approx(ytd.conv_percent, 0.3));
    assert!(approx(ytd.sales_team_conv, 0.2));
    println!("✓ Derived ratios match the tallies");

    // July 16th 2025 is a Wednesday: the WTD window is 2 days long
    assert!(approx(report.metrics.wtd.calls_per_dt_per_day, 20.0));
    println!("✓ Per-day rates divide by the window's day count");

    let all = funnel_scope_report(&funnel_rows(), "", "admin", today());
    assert_eq!(all.team_size, 3);
    println!("✓ Admin scope covers every row");

    let none = funnel_scope_report(&funnel_rows(), "Nobody", "sm", today());
    assert_eq!(none.team_size, 0);
    assert!(approx(none.metrics.ytd.connectivity, 0.0));
    println!("✓ Empty scope yields zeros, never a division error");
}

fn test_data_records() {
    println!("\n====== Testing data_records ======");

    let rows = vec![
        RawRow::from_strs(&["Name", "Score"]),
        RawRow::from_strs(&["A", "5"]),
        RawRow::from_strs(&["B"]),
    ];
    let records = data_records(&rows);

    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["Name"], "A");
    assert_eq!(records[0]["Score"], "5");
    assert_eq!(records[1]["Score"], "");
    println!("✓ Header-keyed records, short rows read as empty");

    assert!(data_records(&[]).is_empty());
    println!("✓ Empty range yields no records");
}

// End-to-end: targets + revenue rows through the hierarchy and revenue
// reports
fn test_end_to_end() {
    println!("\n====== Testing end-to-end reports ======");

    let targets = vec![
        sparse_row(
            25,
            &[
                (0, "Asha Rao"),
                (2, "2,600,000"),
                (4, "520,000"),
                (6, "Meera Iyer"),
                (7, "1,300,000"),
                (8, "Asha Rao"),
                (10, "260,000"),
                (12, "Kiran Patel"),
                (13, "200,000"),
                (14, "Meera Iyer"),
                (15, "Asha Rao"),
                (19, "50,000"),
            ],
        ),
        sparse_row(
            25,
            &[
                (0, "Vikram Shah"),
                (2, "1,040,000"),
                (12, "Lata Menon"),
                (13, "100,000"),
                (15, "Vikram Shah"),
                (17, "FLAP"),
            ],
        ),
    ];
    let revenue_rows_fixture = vec![sparse_row(
        20,
        &[
            (10, "Kiran Patel"),
            (11, "Meera Iyer"),
            (12, "Asha Rao"),
            (14, "50,000"),
            (15, "150,000"),
            (16, "400,000"),
        ],
    )];

    let hierarchy = hierarchy_report(&targets, &revenue_rows_fixture, today());
    assert_eq!(hierarchy.senior_managers.len(), 2);
    assert_eq!(hierarchy.managers.len(), 1);
    assert_eq!(hierarchy.account_managers.len(), 2);
    assert!(hierarchy.executive_managers.is_empty());
    assert_eq!(
        hierarchy.account_managers[0].achieved.service.y,
        50_000.0
    );
    println!("✓ Hierarchy report resolves all four entity lists");

    let tree = revenue_report(&targets, &revenue_rows_fixture, today(), None);
    assert_eq!(tree.len(), 2);
    // Kiran: 50,000 achieved against a 200,000/26 = 7,692 daily sub-target
    let kiran = &tree[0].children[0].children[0];
    assert_eq!(kiran.name, "Kiran Patel");
    assert_eq!(kiran.service.y.pct, 650);
    println!("✓ Rolled-up tree reaches the leaves with scaled targets");

    let scoped = revenue_report(&targets, &revenue_rows_fixture, today(), Some("vikram shah"));
    assert_eq!(scoped.len(), 1);
    assert!(scoped[0].children[0].is_virtual);
    println!("✓ SM scoping keeps one root; orphan leaves sit under a virtual manager");
}

fn main() {
    test_gaps_report();
    test_quality_report();
    test_customer_rating_report();
    test_funnel_report();
    test_data_records();
    test_end_to_end();

    println!("\nAll report tests passed!");
}
