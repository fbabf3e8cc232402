use smdash::entity::{
    Entity, EntityDirectory, PeriodTotals, Role, Stream, StreamTargets, StreamTotals, entity_id,
};
use smdash::gaps::find_underperformers;
use smdash::hierarchy::{ManagerNode, SeniorManagerNode, build_hierarchy};
use smdash::rollup::{entity_raw, metric, pct, revenue_tree};

// Synthetic entity with uniform service figures across the three windows
fn entity(
    name: &str,
    role: Role,
    manager_id: Option<&str>,
    sm_id: Option<&str>,
    scaled: f64,
    achieved: f64,
) -> Entity {
    Entity {
        id: entity_id(role, name),
        name: name.to_string(),
        role,
        manager_id: manager_id.map(str::to_string),
        sm_id: sm_id.map(str::to_string),
        targets: StreamTargets::default(),
        scaled_targets: StreamTotals {
            service: PeriodTotals {
                y: scaled,
                w: scaled,
                m: scaled,
            },
            commerce: PeriodTotals::default(),
        },
        achieved: StreamTotals {
            service: PeriodTotals {
                y: achieved,
                w: achieved,
                m: achieved,
            },
            commerce: PeriodTotals::default(),
        },
        acc_active_clients: None,
    }
}

// Test the metric function: safe division, rounding, lakh scaling
fn test_metric() {
    println!("\n====== Testing metric ======");

    let zero = metric(0.0, 0.0, false);
    assert_eq!(zero.pct, 0);
    assert_eq!(zero.achieved, 0.0);
    println!("✓ 0 achieved / 0 target is 0%, not an error");

    let m = metric(80.0, 100.0, false);
    assert_eq!(m.pct, 80);
    assert_eq!(m.achieved, 80.0);
    assert_eq!(m.target, 100.0);
    println!("✓ 80 / 100 = 80%");

    assert_eq!(pct(1.0, 3.0), 33);
    assert_eq!(pct(2.0, 3.0), 67);
    println!("✓ Percentages round to the nearest integer");

    let lakhs = metric(50_000.0, 200_000.0, true);
    assert_eq!(lakhs.achieved, 0.5);
    assert_eq!(lakhs.target, 2.0);
    assert_eq!(lakhs.pct, 25);
    println!("✓ Lakh scaling divides both amounts, pct is unaffected");
}

// Test the zero-sub-target fallback to the monthly target
fn test_target_fallback() {
    println!("\n====== Testing zero-target fallback ======");

    let mut e = entity("Solo", Role::Am, None, None, 5_000.0, 1_000.0);
    e.targets.service = 120_000.0;
    e.scaled_targets.service.w = 0.0; // a Monday

    let raw = entity_raw(&e, Stream::Service);
    assert_eq!(raw.target.y, 5_000.0);
    assert_eq!(raw.target.w, 120_000.0);
    println!("✓ A zero sub-target falls back to the monthly target");
}

// Test bottom-up rollup: sums at every level, pct recomputed from the sums
fn test_rollup_sums() {
    println!("\n====== Testing rollup sums ======");

    let directory = EntityDirectory {
        sms: vec![entity("Carol", Role::Sm, None, None, 0.0, 0.0)],
        managers: vec![entity("Bala", Role::M, None, Some("sm-carol"), 0.0, 0.0)],
        ams: vec![
            entity("Amit", Role::Am, Some("m-bala"), Some("sm-carol"), 200_000.0, 50_000.0),
            entity("Anu", Role::Flap, Some("m-bala"), Some("sm-carol"), 100_000.0, 30_000.0),
        ],
        ems: Vec::new(),
    };

    let tree = revenue_tree(&build_hierarchy(&directory));
    assert_eq!(tree.len(), 1);
    let sm = &tree[0];
    let manager = &sm.children[0];

    // Leaf pcts: 25% and 30%
    assert_eq!(manager.children[0].service.y.pct, 25);
    assert_eq!(manager.children[1].service.y.pct, 30);

    // Parent: 80,000 / 300,000 = 26.67% → 27, at both levels. Averaging the
    // children's pcts would say 28.
    assert_eq!(manager.service.y.achieved, 0.8);
    assert_eq!(manager.service.y.target, 3.0);
    assert_eq!(manager.service.y.pct, 27);
    assert_eq!(sm.service.y.pct, 27);
    println!("✓ Parent pct comes from summed raw totals, never averaged");

    // The leaf's 50,000 / 200,000 shows up additively in both ancestors
    assert_eq!(sm.service.y.achieved, 0.8);
    assert_eq!(sm.service.y.target, 3.0);
    println!("✓ Leaf totals flow additively into manager and SM");
}

// Test that virtual managers roll up and EMs stay out of the SM block
fn test_virtual_and_em_rollup() {
    println!("\n====== Testing virtual manager and EM rollup ======");

    let directory = EntityDirectory {
        sms: vec![entity("Carol", Role::Sm, None, None, 0.0, 0.0)],
        managers: Vec::new(),
        ams: vec![entity(
            "Dina",
            Role::Am,
            None,
            Some("sm-carol"),
            100_000.0,
            40_000.0,
        )],
        ems: vec![entity(
            "Esha",
            Role::Em,
            None,
            Some("sm-carol"),
            50_000.0,
            20_000.0,
        )],
    };

    let tree = revenue_tree(&build_hierarchy(&directory));
    let sm = &tree[0];

    assert_eq!(sm.children.len(), 1);
    assert!(sm.children[0].is_virtual);
    assert_eq!(sm.children[0].service.y.pct, 40);
    println!("✓ Virtual manager is a real rollup node, flagged isVirtual");

    // SM totals come from the manager subtree only
    assert_eq!(sm.service.y.achieved, 0.4);
    assert_eq!(sm.service.y.target, 1.0);
    println!("✓ SM block sums the manager subtree");

    assert_eq!(sm.ems.len(), 1);
    assert_eq!(sm.ems[0].service.y.pct, 40);
    println!("✓ EM keeps its own block outside the SM sum");
}

// Test the underperformer walk: inclusive threshold, zero-target rule, dedup
fn test_underperformers() {
    println!("\n====== Testing find_underperformers ======");

    let directory = EntityDirectory {
        sms: vec![entity("Carol", Role::Sm, None, None, 0.0, 0.0)],
        managers: vec![entity("Bala", Role::M, None, Some("sm-carol"), 0.0, 0.0)],
        ams: vec![
            // exactly 25% - included (inclusive threshold)
            entity("Edge", Role::Am, Some("m-bala"), None, 40_000.0, 10_000.0),
            // 26% - excluded
            entity("Fine", Role::Am, Some("m-bala"), None, 100_000.0, 26_000.0),
            // no target at all - 0%, included
            entity("Zero", Role::Flap, Some("m-bala"), None, 0.0, 0.0),
        ],
        ems: Vec::new(),
    };

    let tree = build_hierarchy(&directory);
    let underperformers = find_underperformers(&tree, 25.0, None);

    let ids: Vec<&str> = underperformers.iter().map(|u| u.id.as_str()).collect();
    assert_eq!(ids, vec!["am-edge", "flap-zero"]);
    println!("✓ 25% is included, 26% is not, zero target counts as 0%");

    // The same leaf reachable through two paths is reported once
    let leaf = entity("Edge", Role::Am, None, None, 40_000.0, 10_000.0);
    let manager = ManagerNode {
        entity: entity("Bala", Role::M, None, None, 0.0, 0.0),
        is_virtual: false,
        leaves: vec![leaf.clone()],
    };
    let duplicated = vec![
        SeniorManagerNode {
            entity: entity("Carol", Role::Sm, None, None, 0.0, 0.0),
            managers: vec![manager.clone()],
            ems: Vec::new(),
        },
        SeniorManagerNode {
            entity: entity("Dara", Role::Sm, None, None, 0.0, 0.0),
            managers: vec![manager],
            ems: Vec::new(),
        },
    ];
    let deduped = find_underperformers(&duplicated, 25.0, None);
    assert_eq!(deduped.len(), 1);
    println!("✓ A leaf reachable via two paths is reported once");

    // SM scoping by name
    let scoped = find_underperformers(&duplicated, 25.0, Some("dara"));
    assert_eq!(scoped.len(), 1);
    let scoped = find_underperformers(&duplicated, 25.0, Some("nobody"));
    assert!(scoped.is_empty());
    println!("✓ SM filter scopes the walk, case-insensitively");
}

fn main() {
    test_metric();
    test_target_fallback();
    test_rollup_sums();
    test_virtual_and_em_rollup();
    test_underperformers();

    println!("\nAll rollup tests passed!");
}
