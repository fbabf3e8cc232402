use serde::{Deserialize, Serialize};

use crate::entity::{Entity, PeriodTotals, Role, Stream};
use crate::hierarchy::{ManagerNode, SeniorManagerNode};

/// Service-revenue figures are displayed in hundred-thousand (lakh) units.
pub const LAKH: f64 = 100_000.0;

/// Achieved vs. target for one window. For the service stream both amounts
/// are in lakh units; pct is always computed from the raw amounts.
#[derive(Clone, Copy, Default, PartialEq, Debug, Serialize, Deserialize)]
pub struct Metric {
    pub achieved: f64,
    pub target: f64,
    pub pct: i64,
}

/// Percentage achieved, rounded. A zero or absent target yields 0%, never a
/// division error.
pub fn pct(achieved: f64, target: f64) -> i64 {
    if target > 0.0 {
        (achieved / target * 100.0).round() as i64
    } else {
        0
    }
}

/// Build one metric. `currency_scaled` applies the lakh display convention
/// to both amounts at this single layer, so the ratio is unaffected.
pub fn metric(achieved: f64, target: f64, currency_scaled: bool) -> Metric {
    let pct = pct(achieved, target);
    if currency_scaled {
        Metric {
            achieved: achieved / LAKH,
            target: target / LAKH,
            pct,
        }
    } else {
        Metric {
            achieved,
            target,
            pct,
        }
    }
}

/// Metrics for the three reporting windows of one stream.
#[derive(Clone, Copy, Default, PartialEq, Debug, Serialize, Deserialize)]
pub struct MetricBlock {
    pub y: Metric,
    pub w: Metric,
    pub m: Metric,
}

/// Raw (unscaled) achieved/target sums for one stream, the accumulation form
/// of a block. Parent nodes sum these component-wise and recompute pct from
/// the sums; children's pct values are never averaged.
#[derive(Clone, Copy, Default, Debug, PartialEq)]
pub struct RawBlock {
    pub achieved: PeriodTotals,
    pub target: PeriodTotals,
}

impl RawBlock {
    pub fn add(&mut self, other: &RawBlock) {
        self.achieved.add(&other.achieved);
        self.target.add(&other.target);
    }

    pub fn finalize(&self, currency_scaled: bool) -> MetricBlock {
        MetricBlock {
            y: metric(self.achieved.y, self.target.y, currency_scaled),
            w: metric(self.achieved.w, self.target.w, currency_scaled),
            m: metric(self.achieved.m, self.target.m, currency_scaled),
        }
    }
}

/// An entity's raw block for one stream. Each window's target is the scaled
/// sub-target, falling back to the monthly target when the sub-target is
/// zero (Monday WTD, unset targets) - the tie-break the dashboards have
/// always shown.
pub fn entity_raw(entity: &Entity, stream: Stream) -> RawBlock {
    let achieved = *entity.achieved.get(stream);
    let scaled = *entity.scaled_targets.get(stream);
    let monthly = entity.targets.get(stream);

    let fallback = |sub: f64| if sub != 0.0 { sub } else { monthly };

    RawBlock {
        achieved,
        target: PeriodTotals {
            y: fallback(scaled.y),
            w: fallback(scaled.w),
            m: fallback(scaled.m),
        },
    }
}

/// AM/FLAP or EM node in the rolled-up revenue tree.
#[derive(Clone, Debug, Serialize)]
pub struct RevenueLeaf {
    pub id: String,
    pub name: String,
    pub role: Role,
    pub service: MetricBlock,
    pub commerce: MetricBlock,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueManager {
    pub id: String,
    pub name: String,
    pub role: Role,
    pub is_virtual: bool,
    pub service: MetricBlock,
    pub commerce: MetricBlock,
    pub children: Vec<RevenueLeaf>,
}

#[derive(Clone, Debug, Serialize)]
pub struct RevenueSeniorManager {
    pub id: String,
    pub name: String,
    pub role: Role,
    pub service: MetricBlock,
    pub commerce: MetricBlock,
    pub children: Vec<RevenueManager>,
    pub ems: Vec<RevenueLeaf>,
}

/// Roll the reporting tree up into display metrics: leaf blocks from each
/// leaf entity, every parent the component-wise sum of its children, pct
/// recomputed from the sums at each level. EMs get their own blocks but are
/// not summed into the SM (their amounts are attributed to the same revenue
/// rows as the manager subtree).
pub fn revenue_tree(tree: &[SeniorManagerNode]) -> Vec<RevenueSeniorManager> {
    tree.iter().map(rollup_sm).collect()
}

fn rollup_sm(node: &SeniorManagerNode) -> RevenueSeniorManager {
    let mut service_sum = RawBlock::default();
    let mut commerce_sum = RawBlock::default();

    let children: Vec<RevenueManager> = node
        .managers
        .iter()
        .map(|manager| {
            let (child, service, commerce) = rollup_manager(manager);
            service_sum.add(&service);
            commerce_sum.add(&commerce);
            child
        })
        .collect();

    let ems = node.ems.iter().map(leaf_node).collect();

    RevenueSeniorManager {
        id: node.entity.id.clone(),
        name: node.entity.name.clone(),
        role: node.entity.role,
        service: service_sum.finalize(true),
        commerce: commerce_sum.finalize(false),
        children,
        ems,
    }
}

fn rollup_manager(node: &ManagerNode) -> (RevenueManager, RawBlock, RawBlock) {
    let mut service_sum = RawBlock::default();
    let mut commerce_sum = RawBlock::default();

    let children: Vec<RevenueLeaf> = node
        .leaves
        .iter()
        .map(|leaf| {
            service_sum.add(&entity_raw(leaf, Stream::Service));
            commerce_sum.add(&entity_raw(leaf, Stream::Commerce));
            leaf_node(leaf)
        })
        .collect();

    let manager = RevenueManager {
        id: node.entity.id.clone(),
        name: node.entity.name.clone(),
        role: node.entity.role,
        is_virtual: node.is_virtual,
        service: service_sum.finalize(true),
        commerce: commerce_sum.finalize(false),
        children,
    };

    (manager, service_sum, commerce_sum)
}

fn leaf_node(entity: &Entity) -> RevenueLeaf {
    RevenueLeaf {
        id: entity.id.clone(),
        name: entity.name.clone(),
        role: entity.role,
        service: entity_raw(entity, Stream::Service).finalize(true),
        commerce: entity_raw(entity, Stream::Commerce).finalize(false),
    }
}
