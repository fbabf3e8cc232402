use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::entity::{Entity, accumulate_revenue, build_directory};
use crate::funnel::{FunnelReport, funnel_report};
use crate::gaps::{
    DietitianGap, GapThresholds, Underperformer, excluded_names, find_gaps, find_underperformers,
};
use crate::hierarchy::{SeniorManagerNode, build_hierarchy};
use crate::quality::{
    CustomerRatingMetrics, QualityMetrics, customer_rating_metrics, quality_metrics,
};
use crate::rollup::{RevenueSeniorManager, revenue_tree};
use crate::rows::RawRow;

/// Flat entity lists with computed scaled targets and achieved totals, the
/// join surface for every other report (all of them key by entity id).
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchyReport {
    pub senior_managers: Vec<Entity>,
    pub managers: Vec<Entity>,
    pub executive_managers: Vec<Entity>,
    pub account_managers: Vec<Entity>,
}

/// Resolve entities from the targets and revenue sheets. Everything here is
/// recomputed per call from the rows handed in; the only stateful object is
/// the registry inside, built fresh and discarded.
pub fn hierarchy_report(
    targets_rows: &[RawRow],
    revenue_rows: &[RawRow],
    today: NaiveDate,
) -> HierarchyReport {
    let revenue = accumulate_revenue(revenue_rows);
    let directory = build_directory(targets_rows, &revenue, today);
    HierarchyReport {
        senior_managers: directory.sms,
        managers: directory.managers,
        executive_managers: directory.ems,
        account_managers: directory.ams,
    }
}

/// The assembled reporting tree, optionally scoped to one SM by name
/// (case-insensitive).
pub fn reporting_tree(
    targets_rows: &[RawRow],
    revenue_rows: &[RawRow],
    today: NaiveDate,
    sm_filter: Option<&str>,
) -> Vec<SeniorManagerNode> {
    let revenue = accumulate_revenue(revenue_rows);
    let directory = build_directory(targets_rows, &revenue, today);
    let mut tree = build_hierarchy(&directory);

    if let Some(wanted) = sm_filter {
        let wanted = wanted.to_lowercase();
        tree.retain(|root| root.entity.name.to_lowercase() == wanted);
    }

    tree
}

/// Fully rolled-up revenue tree for the API.
pub fn revenue_report(
    targets_rows: &[RawRow],
    revenue_rows: &[RawRow],
    today: NaiveDate,
    sm_filter: Option<&str>,
) -> Vec<RevenueSeniorManager> {
    revenue_tree(&reporting_tree(targets_rows, revenue_rows, today, sm_filter))
}

pub fn quality_report(quality_rows: &[RawRow]) -> BTreeMap<String, QualityMetrics> {
    quality_metrics(quality_rows)
}

pub fn customer_rating_report(
    quality_rows: &[RawRow],
) -> BTreeMap<String, CustomerRatingMetrics> {
    customer_rating_metrics(quality_rows)
}

pub fn gaps_report(
    gaps_rows: &[RawRow],
    key_mapping_rows: &[RawRow],
    thresholds: GapThresholds,
    sm_filter: Option<&str>,
) -> Vec<DietitianGap> {
    let excluded = excluded_names(key_mapping_rows);
    find_gaps(gaps_rows, &excluded, thresholds, sm_filter)
}

pub fn underperformers_report(
    targets_rows: &[RawRow],
    revenue_rows: &[RawRow],
    today: NaiveDate,
    threshold_pct: f64,
    sm_filter: Option<&str>,
) -> Vec<Underperformer> {
    let tree = reporting_tree(targets_rows, revenue_rows, today, None);
    find_underperformers(&tree, threshold_pct, sm_filter)
}

pub fn funnel_scope_report(
    funnel_rows: &[RawRow],
    name: &str,
    role: &str,
    today: NaiveDate,
) -> FunnelReport {
    funnel_report(funnel_rows, name, role, today)
}

/// Zip a generic range's header row with the remaining rows into
/// header-keyed records. Short rows read as empty cells, like everywhere
/// else.
pub fn data_records(rows: &[RawRow]) -> Vec<Map<String, Value>> {
    let Some((header, body)) = rows.split_first() else {
        return Vec::new();
    };

    body.iter()
        .map(|row| {
            header
                .0
                .iter()
                .enumerate()
                .map(|(i, key)| (key.clone(), Value::String(row.cell(i).to_string())))
                .collect()
        })
        .collect()
}
