use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::rows::{RawRow, layout, slugify};
use crate::targets::scale_monthly_target;

/// Closed set of roles in the reporting hierarchy.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "SM")]
    Sm,
    #[serde(rename = "M")]
    M,
    #[serde(rename = "AM")]
    Am,
    #[serde(rename = "FLAP")]
    Flap,
    #[serde(rename = "EM")]
    Em,
}

impl Role {
    /// Lowercase id prefix for the role.
    pub fn key(self) -> &'static str {
        match self {
            Role::Sm => "sm",
            Role::M => "m",
            Role::Am => "am",
            Role::Flap => "flap",
            Role::Em => "em",
        }
    }
}

/// Deterministic entity id from `(role, name)`. Case and whitespace variants
/// of the same name resolve to the same id; the same name under two roles
/// resolves to two distinct ids.
pub fn entity_id(role: Role, name: &str) -> String {
    format!("{}-{}", role.key(), slugify(name))
}

/// Which of the two independent revenue streams a figure belongs to.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Stream {
    Service,
    Commerce,
}

/// One amount per reporting window: yesterday / week-to-date / month-to-date.
#[derive(Clone, Copy, Default, PartialEq, Debug, Serialize, Deserialize)]
pub struct PeriodTotals {
    pub y: f64,
    pub w: f64,
    pub m: f64,
}

impl PeriodTotals {
    pub fn add(&mut self, other: &PeriodTotals) {
        self.y += other.y;
        self.w += other.w;
        self.m += other.m;
    }
}

/// Per-window amounts for both streams.
#[derive(Clone, Copy, Default, PartialEq, Debug, Serialize, Deserialize)]
pub struct StreamTotals {
    pub service: PeriodTotals,
    pub commerce: PeriodTotals,
}

impl StreamTotals {
    pub fn get(&self, stream: Stream) -> &PeriodTotals {
        match stream {
            Stream::Service => &self.service,
            Stream::Commerce => &self.commerce,
        }
    }

    pub fn add(&mut self, other: &StreamTotals) {
        self.service.add(&other.service);
        self.commerce.add(&other.commerce);
    }
}

/// Monthly target amounts per stream.
#[derive(Clone, Copy, Default, PartialEq, Debug, Serialize, Deserialize)]
pub struct StreamTargets {
    pub service: f64,
    pub commerce: f64,
}

impl StreamTargets {
    pub fn get(&self, stream: Stream) -> f64 {
        match stream {
            Stream::Service => self.service,
            Stream::Commerce => self.commerce,
        }
    }
}

/// The unit of aggregation. Rebuilt from scratch on every request; nothing
/// persists across requests.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub id: String,
    /// Display name; first-seen casing wins.
    pub name: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manager_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sm_id: Option<String>,
    pub targets: StreamTargets,
    pub scaled_targets: StreamTotals,
    pub achieved: StreamTotals,
    /// Active-client count, only supplied for EMs. Overwritten (not summed)
    /// whenever a later row carries a non-sentinel value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acc_active_clients: Option<f64>,
}

/// Flat entity lists in sheet order, one per role group.
#[derive(Clone, Debug, Default)]
pub struct EntityDirectory {
    pub sms: Vec<Entity>,
    pub managers: Vec<Entity>,
    pub ams: Vec<Entity>,
    pub ems: Vec<Entity>,
}

/// Sum the revenue sheet into per-entity achieved totals. Every name on a
/// row is credited under its own role: the same amounts count toward the
/// row's EM, FLAP/AM, manager, and SM entities independently.
pub fn accumulate_revenue(revenue_rows: &[RawRow]) -> HashMap<String, StreamTotals> {
    use layout::revenue::*;

    let mut revenue: HashMap<String, StreamTotals> = HashMap::new();

    for row in revenue_rows {
        let amounts = StreamTotals {
            service: PeriodTotals {
                y: row.number(SERVICE_Y),
                w: row.number(SERVICE_W),
                m: row.number(SERVICE_M),
            },
            commerce: PeriodTotals {
                y: row.number(COMMERCE_Y),
                w: row.number(COMMERCE_W),
                m: row.number(COMMERCE_M),
            },
        };

        let mut credit = |name: Option<&str>, role: Role| {
            if let Some(name) = name {
                revenue
                    .entry(entity_id(role, name))
                    .or_default()
                    .add(&amounts);
            }
        };

        credit(row.name(EM_NAME), Role::Em);
        credit(row.name(FLAP_NAME), Role::Flap);
        credit(row.name(AM_NAME), Role::Am);
        credit(row.name(M_NAME), Role::M);
        credit(row.name(SM_NAME), Role::Sm);
    }

    revenue
}

/// Registry of entities for one aggregation pass. Resolution is idempotent:
/// a `(role, name)` pair always lands on the same entity, and repeat
/// resolutions only overwrite the optional active-client attribute.
pub struct EntityRegistry<'a> {
    today: NaiveDate,
    revenue: &'a HashMap<String, StreamTotals>,
    entities: HashMap<String, Entity>,
}

impl<'a> EntityRegistry<'a> {
    pub fn new(today: NaiveDate, revenue: &'a HashMap<String, StreamTotals>) -> Self {
        EntityRegistry {
            today,
            revenue,
            entities: HashMap::new(),
        }
    }

    /// Resolve `(name, role)` to an entity id, creating and registering the
    /// entity on first sight. Targets, parent links, and the active-client
    /// count only take effect at creation time, except the active-client
    /// count, which is overwritten on every later non-sentinel sighting
    /// (last write wins, an accepted source-order dependency).
    #[allow(clippy::too_many_arguments)]
    pub fn resolve(
        &mut self,
        name: &str,
        role: Role,
        service_target: f64,
        commerce_target: f64,
        manager_id: Option<String>,
        sm_id: Option<String>,
        active_clients: Option<f64>,
    ) -> String {
        let id = entity_id(role, name);

        if let Some(existing) = self.entities.get_mut(&id) {
            if active_clients.is_some() {
                existing.acc_active_clients = active_clients;
            }
            return id;
        }

        let entity = Entity {
            id: id.clone(),
            name: name.to_string(),
            role,
            manager_id,
            sm_id,
            targets: StreamTargets {
                service: service_target,
                commerce: commerce_target,
            },
            scaled_targets: StreamTotals {
                service: scale_monthly_target(service_target, self.today),
                commerce: scale_monthly_target(commerce_target, self.today),
            },
            achieved: self.revenue.get(&id).copied().unwrap_or_default(),
            acc_active_clients: active_clients,
        };

        self.entities.insert(id.clone(), entity);
        id
    }

    pub fn get(&self, id: &str) -> Option<&Entity> {
        self.entities.get(id)
    }
}

/// Build the entity directory from the targets sheet, in four passes mirroring
/// the sheet's column groups: SMs, then managers, then AM/FLAP leaves, then
/// EMs. Parent links are matched by name, case-insensitively, against the
/// entities of the earlier passes; a parent that does not resolve leaves the
/// link absent (orphans are dropped later, at tree build).
pub fn build_directory(
    targets_rows: &[RawRow],
    revenue: &HashMap<String, StreamTotals>,
    today: NaiveDate,
) -> EntityDirectory {
    use layout::targets::*;

    let mut registry = EntityRegistry::new(today, revenue);

    let mut sm_ids: Vec<String> = Vec::new();
    let mut manager_ids: Vec<String> = Vec::new();
    let mut am_ids: Vec<String> = Vec::new();
    let mut em_ids: Vec<String> = Vec::new();

    for row in targets_rows {
        if let Some(sm_name) = row.name(SM_NAME) {
            let id = registry.resolve(
                sm_name,
                Role::Sm,
                row.number(SM_SERVICE_TARGET),
                row.number(SM_COMMERCE_TARGET),
                None,
                None,
                None,
            );
            push_unique(&mut sm_ids, id);
        }
    }

    for row in targets_rows {
        if let Some(manager_name) = row.name(M_NAME) {
            let sm_id = find_by_name(&registry, &sm_ids, row.name(M_SM_NAME));
            let id = registry.resolve(
                manager_name,
                Role::M,
                row.number(M_SERVICE_TARGET),
                row.number(M_COMMERCE_TARGET),
                None,
                sm_id,
                None,
            );
            push_unique(&mut manager_ids, id);
        }
    }

    for row in targets_rows {
        if let Some(am_name) = row.name(AM_NAME) {
            let role = if row.name(AM_ROLE) == Some("FLAP") {
                Role::Flap
            } else {
                Role::Am
            };
            let manager_id = find_by_name(&registry, &manager_ids, row.name(AM_MANAGER_NAME));
            let sm_id = find_by_name(&registry, &sm_ids, row.name(AM_SM_NAME));
            let id = registry.resolve(
                am_name,
                role,
                row.number(AM_SERVICE_TARGET),
                row.number(AM_COMMERCE_TARGET),
                manager_id,
                sm_id,
                None,
            );
            push_unique(&mut am_ids, id);
        }
    }

    for row in targets_rows {
        let Some(em_name) = row.name(EM_NAME) else {
            continue;
        };
        // An EM without a resolvable SM is not reportable; skip the row.
        let Some(sm_name) = row.name(EM_SM_NAME) else {
            continue;
        };
        if sm_name == crate::rows::NA_SENTINEL {
            continue;
        }
        let Some(sm_id) = find_by_name(&registry, &sm_ids, Some(sm_name)) else {
            continue;
        };

        // No commerce target column exists for EMs.
        let id = registry.resolve(
            em_name,
            Role::Em,
            row.number(EM_SERVICE_TARGET),
            0.0,
            None,
            Some(sm_id),
            row.optional_count(EM_ACTIVE_CLIENTS),
        );
        push_unique(&mut em_ids, id);
    }

    EntityDirectory {
        sms: collect(&registry, &sm_ids),
        managers: collect(&registry, &manager_ids),
        ams: collect(&registry, &am_ids),
        ems: collect(&registry, &em_ids),
    }
}

fn push_unique(ids: &mut Vec<String>, id: String) {
    if !ids.contains(&id) {
        ids.push(id);
    }
}

/// Case-insensitive name lookup among an id list's entities.
fn find_by_name(registry: &EntityRegistry<'_>, ids: &[String], name: Option<&str>) -> Option<String> {
    let wanted = name?.to_lowercase();
    ids.iter()
        .find(|id| {
            registry
                .get(id)
                .is_some_and(|entity| entity.name.to_lowercase() == wanted)
        })
        .cloned()
}

fn collect(registry: &EntityRegistry<'_>, ids: &[String]) -> Vec<Entity> {
    ids.iter()
        .filter_map(|id| registry.get(id).cloned())
        .collect()
}
