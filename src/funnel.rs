use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::rows::{RawRow, layout};
use crate::targets::window_day_counts;

/// Raw funnel tallies for one window, summed over the scoped rows.
#[derive(Clone, Copy, Default, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunnelTallies {
    pub calls: f64,
    pub connected: f64,
    pub talktime: f64,
    pub leads: f64,
    pub total_links: f64,
    pub sales_links: f64,
    pub conv: f64,
    pub sales_conv: f64,
}

impl FunnelTallies {
    fn read(row: &RawRow, base: usize) -> Self {
        use layout::funnel::*;
        FunnelTallies {
            calls: row.number(base + CALLS),
            connected: row.number(base + CONNECTED),
            talktime: row.number(base + TALKTIME),
            leads: row.number(base + LEADS),
            total_links: row.number(base + TOTAL_LINKS),
            sales_links: row.number(base + SALES_LINKS),
            conv: row.number(base + CONVERSIONS),
            sales_conv: row.number(base + SALES_CONVERSIONS),
        }
    }

    fn add(&mut self, other: &FunnelTallies) {
        self.calls += other.calls;
        self.connected += other.connected;
        self.talktime += other.talktime;
        self.leads += other.leads;
        self.total_links += other.total_links;
        self.sales_links += other.sales_links;
        self.conv += other.conv;
        self.sales_conv += other.sales_conv;
    }
}

/// Derived funnel ratios for one window. The percentage-shaped ones are
/// fractions; the frontend multiplies by 100.
#[derive(Clone, Copy, Default, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunnelMetrics {
    pub calls_per_dt_per_day: f64,
    pub connectivity: f64,
    pub tt_per_connected_call: f64,
    pub leads_per_dt_per_day: f64,
    pub lead_vs_connected: f64,
    pub might_pay: f64,
    pub conv_percent: f64,
    pub sales_team_conv: f64,
}

/// One value per reporting window, under the frontend's window keys
/// ("ytd" is yesterday).
#[derive(Clone, Copy, Default, PartialEq, Debug, Serialize, Deserialize)]
pub struct FunnelWindows<T> {
    pub ytd: T,
    pub wtd: T,
    pub mtd: T,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunnelReport {
    pub team_size: usize,
    pub raw_tallies: FunnelWindows<FunnelTallies>,
    pub metrics: FunnelWindows<FunnelMetrics>,
}

/// Build the funnel report scoped to `(name, role)`: rows whose attribution
/// column for that role matches the name, case-insensitively. An admin or
/// unrecognized role scopes to every row. Team size counts distinct workers,
/// not rows.
pub fn funnel_report(
    funnel_rows: &[RawRow],
    name: &str,
    role: &str,
    today: NaiveDate,
) -> FunnelReport {
    use layout::funnel::*;

    let scope_column = match role.to_lowercase().as_str() {
        "sm" => Some(SM_NAME),
        "m" | "manager" => Some(M_NAME),
        "am" => Some(AM_NAME),
        "flap" => Some(FLAP_NAME),
        "em" => Some(EM_NAME),
        _ => None,
    };
    let wanted = name.trim().to_lowercase();

    let mut workers: HashSet<String> = HashSet::new();
    let mut tallies = FunnelWindows::<FunnelTallies>::default();

    for row in funnel_rows {
        if let Some(column) = scope_column {
            let matches = row
                .name(column)
                .is_some_and(|cell| cell.to_lowercase() == wanted);
            if !matches {
                continue;
            }
        }

        if let Some(worker) = row.name(WORKER_NAME) {
            workers.insert(worker.to_lowercase());
        }

        tallies.ytd.add(&FunnelTallies::read(row, Y_BASE));
        tallies.wtd.add(&FunnelTallies::read(row, W_BASE));
        tallies.mtd.add(&FunnelTallies::read(row, M_BASE));
    }

    let team_size = workers.len();
    let (y_days, w_days, m_days) = window_day_counts(today);

    FunnelReport {
        team_size,
        metrics: FunnelWindows {
            ytd: derive_metrics(&tallies.ytd, team_size, y_days),
            wtd: derive_metrics(&tallies.wtd, team_size, w_days),
            mtd: derive_metrics(&tallies.mtd, team_size, m_days),
        },
        raw_tallies: tallies,
    }
}

fn derive_metrics(tallies: &FunnelTallies, team_size: usize, days: i64) -> FunnelMetrics {
    let worker_days = team_size as f64 * days as f64;
    FunnelMetrics {
        calls_per_dt_per_day: safe_div(tallies.calls, worker_days),
        connectivity: safe_div(tallies.connected, tallies.calls),
        tt_per_connected_call: safe_div(tallies.talktime, tallies.connected),
        leads_per_dt_per_day: safe_div(tallies.leads, worker_days),
        lead_vs_connected: safe_div(tallies.leads, tallies.connected),
        might_pay: safe_div(tallies.total_links, tallies.leads),
        conv_percent: safe_div(tallies.conv, tallies.total_links),
        sales_team_conv: safe_div(tallies.sales_conv, tallies.sales_links),
    }
}

fn safe_div(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}
