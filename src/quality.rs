use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::entity::{Role, entity_id};
use crate::rows::{RawRow, layout};

/// Rows below this active-client count are out of scope for quality and
/// customer-rating reporting.
pub const MIN_ACTIVE_CLIENTS: f64 = 30.0;

/// Weekly/monthly weight-loss at or below this value counts as on track.
pub const ON_TRACK_CUTOFF: f64 = -0.5;

/// A weight-loss cell is usable only when it parsed to a real, non-zero
/// value; blanks and `#N/A` both parse to 0 and drop out here.
fn valid_weight_loss(value: f64) -> bool {
    value != 0.0
}

/// Weight-loss quality numbers for one entity, keyed by entity id in the
/// report map so callers can join against the hierarchy.
#[derive(Clone, Copy, Default, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityMetrics {
    /// Mean of the valid weekly values; unrounded, the frontend formats.
    pub avg_weekly_weight_loss: f64,
    pub weekly_on_track_pct: f64,
    pub monthly_on_track_pct: f64,
}

/// Accumulator for one entity, folded over rows then finalized. Temporary
/// sums and counts never appear on the public record.
#[derive(Default)]
struct QualityAcc {
    customers: HashSet<String>,
    weekly_sum: f64,
    weekly_count: u64,
    weekly_on_track: u64,
    monthly_on_track: u64,
}

impl QualityAcc {
    fn fold(&mut self, customer: Option<&str>, weekly: f64, monthly: f64) {
        if let Some(customer) = customer {
            self.customers.insert(customer.to_string());
        }
        if valid_weight_loss(weekly) {
            self.weekly_sum += weekly;
            self.weekly_count += 1;
            if weekly <= ON_TRACK_CUTOFF {
                self.weekly_on_track += 1;
            }
        }
        if valid_weight_loss(monthly) && monthly <= ON_TRACK_CUTOFF {
            self.monthly_on_track += 1;
        }
    }

    fn finalize(&self) -> QualityMetrics {
        let unique = self.customers.len() as f64;
        QualityMetrics {
            avg_weekly_weight_loss: if self.weekly_count > 0 {
                self.weekly_sum / self.weekly_count as f64
            } else {
                0.0
            },
            weekly_on_track_pct: on_track_pct(self.weekly_on_track, unique),
            monthly_on_track_pct: on_track_pct(self.monthly_on_track, unique),
        }
    }
}

/// Share of unique customers on track, rounded to one decimal.
fn on_track_pct(on_track: u64, unique_customers: f64) -> f64 {
    if unique_customers > 0.0 {
        (on_track as f64 / unique_customers * 1000.0).round() / 10.0
    } else {
        0.0
    }
}

/// Fold the quality sheet into entity-id-keyed weight-loss metrics.
///
/// A row participates only when its active-client count clears the floor and
/// at least one weight-loss cell is valid; it then credits every role name
/// it carries, each under that role's own entity id.
pub fn quality_metrics(quality_rows: &[RawRow]) -> BTreeMap<String, QualityMetrics> {
    use layout::quality::*;

    let mut accumulators: BTreeMap<String, QualityAcc> = BTreeMap::new();

    for row in quality_rows {
        if row.number(ACTIVE_CLIENTS) < MIN_ACTIVE_CLIENTS {
            continue;
        }

        let weekly = row.number(WEEKLY_WEIGHT_LOSS);
        let monthly = row.number(MONTHLY_WEIGHT_LOSS);
        if !valid_weight_loss(weekly) && !valid_weight_loss(monthly) {
            continue;
        }

        let customer = row.name(CUSTOMER_ID);
        for (column, role) in attribution_columns() {
            if let Some(name) = row.name(column) {
                accumulators
                    .entry(entity_id(role, name))
                    .or_default()
                    .fold(customer, weekly, monthly);
            }
        }
    }

    accumulators
        .iter()
        .map(|(id, acc)| (id.clone(), acc.finalize()))
        .collect()
}

/// CSAT/NPS numbers for one entity. "Y" is yesterday, as everywhere in this
/// domain.
#[derive(Clone, Copy, Default, PartialEq, Debug, Serialize, Deserialize)]
pub struct CustomerRatingMetrics {
    #[serde(rename = "ytdAvgCSAT")]
    pub ytd_avg_csat: f64,
    #[serde(rename = "wtdAvgCSAT")]
    pub wtd_avg_csat: f64,
    #[serde(rename = "latestCSAT")]
    pub latest_csat: f64,
    #[serde(rename = "ytdAvgNPS")]
    pub ytd_avg_nps: f64,
    #[serde(rename = "mtdAvgNPS")]
    pub mtd_avg_nps: f64,
}

/// Mean over positive samples only; zero (blank, `#N/A`, or literal 0 on the
/// sheet) contributes to neither sum nor count.
#[derive(Default, Clone, Copy)]
struct MeanAcc {
    sum: f64,
    count: u64,
}

impl MeanAcc {
    fn fold(&mut self, value: f64) {
        if value > 0.0 {
            self.sum += value;
            self.count += 1;
        }
    }

    /// One-decimal mean; 0 when no samples landed.
    fn finalize(&self) -> f64 {
        if self.count > 0 {
            (self.sum / self.count as f64 * 10.0).round() / 10.0
        } else {
            0.0
        }
    }
}

#[derive(Default)]
struct RatingAcc {
    ytd_csat: MeanAcc,
    wtd_csat: MeanAcc,
    latest_csat: MeanAcc,
    ytd_nps: MeanAcc,
    mtd_nps: MeanAcc,
}

impl RatingAcc {
    fn finalize(&self) -> CustomerRatingMetrics {
        CustomerRatingMetrics {
            ytd_avg_csat: self.ytd_csat.finalize(),
            wtd_avg_csat: self.wtd_csat.finalize(),
            latest_csat: self.latest_csat.finalize(),
            ytd_avg_nps: self.ytd_nps.finalize(),
            mtd_avg_nps: self.mtd_nps.finalize(),
        }
    }
}

/// Fold the quality sheet into entity-id-keyed CSAT/NPS means. Same row
/// scope rules as `quality_metrics`, except the participation test is "any
/// rating cell positive".
pub fn customer_rating_metrics(quality_rows: &[RawRow]) -> BTreeMap<String, CustomerRatingMetrics> {
    use layout::quality::*;

    let mut accumulators: BTreeMap<String, RatingAcc> = BTreeMap::new();

    for row in quality_rows {
        if row.number(ACTIVE_CLIENTS) < MIN_ACTIVE_CLIENTS {
            continue;
        }

        let ytd_csat = row.number(YTD_CSAT);
        let wtd_csat = row.number(WTD_CSAT);
        let latest_csat = row.number(LATEST_CSAT);
        let ytd_nps = row.number(YTD_NPS);
        let mtd_nps = row.number(MTD_NPS);

        let has_any = ytd_csat > 0.0
            || wtd_csat > 0.0
            || latest_csat > 0.0
            || ytd_nps > 0.0
            || mtd_nps > 0.0;
        if !has_any {
            continue;
        }

        for (column, role) in attribution_columns() {
            if let Some(name) = row.name(column) {
                let acc = accumulators.entry(entity_id(role, name)).or_default();
                acc.ytd_csat.fold(ytd_csat);
                acc.wtd_csat.fold(wtd_csat);
                acc.latest_csat.fold(latest_csat);
                acc.ytd_nps.fold(ytd_nps);
                acc.mtd_nps.fold(mtd_nps);
            }
        }
    }

    accumulators
        .iter()
        .map(|(id, acc)| (id.clone(), acc.finalize()))
        .collect()
}

/// Role attribution columns shared by both quality-sheet folds.
fn attribution_columns() -> [(usize, Role); 5] {
    use layout::quality::*;
    [
        (EM_NAME, Role::Em),
        (FLAP_NAME, Role::Flap),
        (AM_NAME, Role::Am),
        (M_NAME, Role::M),
        (SM_NAME, Role::Sm),
    ]
}
