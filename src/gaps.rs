use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::entity::{Role, Stream};
use crate::hierarchy::SeniorManagerNode;
use crate::rollup::{MetricBlock, entity_raw};
use crate::rows::{RawRow, layout};

/// Fallback SM label for gap rows with a blank SM column.
pub const UNASSIGNED_SM: &str = "Not Assigned";

/// Thresholds for the gap report. Defaults match the long-standing dashboard
/// rules: three consecutive zero-sales days, 30-day joining floor.
#[derive(Clone, Copy, Debug)]
pub struct GapThresholds {
    pub min_consecutive_zero_days: f64,
    pub min_days_since_joining: f64,
}

impl Default for GapThresholds {
    fn default() -> Self {
        GapThresholds {
            min_consecutive_zero_days: 3.0,
            min_days_since_joining: 30.0,
        }
    }
}

/// One field-worker with a sales drought in either stream.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DietitianGap {
    pub dietitian_name: String,
    pub sm_name: String,
    pub consecutive_zero_days: f64,
    pub sales_target: f64,
    pub sales_achieved: f64,
    pub percent_achieved: f64,
    pub days_since_joining: f64,
    pub commerce_target: f64,
    pub commerce_achieved: f64,
    pub commerce_percent_achieved: f64,
    pub commerce_consecutive_zero_days: f64,
}

/// Lowercased exclusion names from the key-mapping sheet.
pub fn excluded_names(key_mapping_rows: &[RawRow]) -> Vec<String> {
    key_mapping_rows
        .iter()
        .filter_map(|row| row.name(layout::key_mapping::EXCLUDED_NAME))
        .map(|name| name.to_lowercase())
        .collect()
}

/// Filter the gaps sheet down to reportable droughts.
///
/// A worker is included only if they cleared the joining floor, are not
/// excluded (registry membership or a per-row `YES` flag, both
/// case-insensitive), and have a zero-days streak at or past the threshold
/// in either stream. Sorted by the worse streak descending, then worker
/// name, then SM name. An optional SM name scopes the report.
pub fn find_gaps(
    gaps_rows: &[RawRow],
    excluded: &[String],
    thresholds: GapThresholds,
    sm_filter: Option<&str>,
) -> Vec<DietitianGap> {
    use layout::gaps::*;

    let excluded: HashSet<&str> = excluded.iter().map(String::as_str).collect();
    let sm_filter = sm_filter.map(str::to_lowercase);

    let mut gaps: Vec<DietitianGap> = Vec::new();

    for row in gaps_rows {
        let Some(worker) = row.name(WORKER_NAME) else {
            continue;
        };

        let days_since_joining = row.number(DAYS_SINCE_JOINING);
        if days_since_joining < thresholds.min_days_since_joining {
            continue;
        }

        let excluded_by_registry = excluded.contains(worker.to_lowercase().as_str());
        let excluded_by_flag = row.cell(EXCLUDE_FLAG).trim().eq_ignore_ascii_case("YES");
        if excluded_by_registry || excluded_by_flag {
            continue;
        }

        let sales_zero_days = row.number(SALES_ZERO_DAYS);
        let commerce_zero_days = row.number(COMMERCE_ZERO_DAYS);
        if sales_zero_days < thresholds.min_consecutive_zero_days
            && commerce_zero_days < thresholds.min_consecutive_zero_days
        {
            continue;
        }

        let sm_name = row
            .name(SM_NAME)
            .unwrap_or(UNASSIGNED_SM)
            .to_string();
        if let Some(wanted) = &sm_filter {
            if sm_name.to_lowercase() != *wanted {
                continue;
            }
        }

        let commerce_target = row.number(COMMERCE_TARGET);
        let commerce_achieved = row.number(COMMERCE_ACHIEVED);

        gaps.push(DietitianGap {
            dietitian_name: worker.to_string(),
            sm_name,
            consecutive_zero_days: sales_zero_days,
            sales_target: row.number(SALES_TARGET),
            sales_achieved: row.number(SALES_ACHIEVED),
            percent_achieved: row.number(SALES_PCT),
            days_since_joining,
            commerce_target,
            commerce_achieved,
            commerce_percent_achieved: if commerce_target > 0.0 {
                commerce_achieved / commerce_target * 100.0
            } else {
                0.0
            },
            commerce_consecutive_zero_days: commerce_zero_days,
        });
    }

    gaps.sort_by(|a, b| {
        let a_worst = a.consecutive_zero_days.max(a.commerce_consecutive_zero_days);
        let b_worst = b.consecutive_zero_days.max(b.commerce_consecutive_zero_days);
        b_worst
            .total_cmp(&a_worst)
            .then_with(|| a.dietitian_name.cmp(&b.dietitian_name))
            .then_with(|| a.sm_name.cmp(&b.sm_name))
    });

    gaps
}

/// An AM/FLAP leaf below the performance threshold, with its service metric
/// blocks for display.
#[derive(Clone, Debug, Serialize)]
pub struct Underperformer {
    pub id: String,
    pub name: String,
    pub role: Role,
    pub metrics: UnderperformerMetrics,
}

#[derive(Clone, Copy, Debug, Serialize)]
pub struct UnderperformerMetrics {
    pub service: MetricBlock,
}

/// Walk every AM/FLAP leaf reachable in the tree (optionally scoped to one
/// SM by name) and keep those at or below `threshold_pct` of yesterday's
/// service sub-target. A leaf reachable by multiple paths is reported once;
/// results keep tree order (SMs, managers, and leaves are already
/// name-sorted).
pub fn find_underperformers(
    tree: &[SeniorManagerNode],
    threshold_pct: f64,
    sm_filter: Option<&str>,
) -> Vec<Underperformer> {
    let sm_filter = sm_filter.map(str::to_lowercase);

    let mut seen: HashSet<String> = HashSet::new();
    let mut underperformers: Vec<Underperformer> = Vec::new();

    for root in tree {
        if let Some(wanted) = &sm_filter {
            if root.entity.name.to_lowercase() != *wanted {
                continue;
            }
        }

        for manager in &root.managers {
            for leaf in &manager.leaves {
                if !seen.insert(leaf.id.clone()) {
                    continue;
                }

                let raw = entity_raw(leaf, Stream::Service);
                let performance = if raw.target.y > 0.0 {
                    raw.achieved.y / raw.target.y * 100.0
                } else {
                    0.0
                };
                if performance > threshold_pct {
                    continue;
                }

                underperformers.push(Underperformer {
                    id: leaf.id.clone(),
                    name: leaf.name.clone(),
                    role: leaf.role,
                    metrics: UnderperformerMetrics {
                        service: raw.finalize(true),
                    },
                });
            }
        }
    }

    underperformers
}
