use crate::entity::{Entity, EntityDirectory, Role};

/// Display name reserved for synthetic grouping nodes; UIs filter it out of
/// manager selectors by the `isVirtual` flag, never by this string.
pub const VIRTUAL_MANAGER_NAME: &str = "Direct Reports";

pub fn virtual_manager_id(sm_id: &str) -> String {
    format!("virtual-m-{sm_id}")
}

/// Manager tree node: a manager entity plus its AM/FLAP leaves. Virtual
/// managers group leaves that report straight to an SM; they are real tree
/// nodes (so rollups stay correct) but hold zero own targets.
#[derive(Clone, Debug)]
pub struct ManagerNode {
    pub entity: Entity,
    pub is_virtual: bool,
    pub leaves: Vec<Entity>,
}

/// Root tree node: an SM entity, its manager subtree, and the parallel EM
/// list (EMs report to the SM directly and are never nested under managers).
#[derive(Clone, Debug)]
pub struct SeniorManagerNode {
    pub entity: Entity,
    pub managers: Vec<ManagerNode>,
    pub ems: Vec<Entity>,
}

/// Assemble the reporting tree from the flat entity lists.
///
/// Every SM becomes a root. Managers attach to their SM; AM/FLAP leaves
/// attach to their manager, or to a lazily-created virtual manager under
/// their SM when they carry no manager link; EMs join their SM's parallel
/// list. Entities whose parent reference does not resolve are dropped
/// silently - upstream sheet hygiene is not this system's to enforce, and a
/// missing parent must not crash reporting. Children are name-sorted
/// (case-insensitive) at every level once attachment is complete.
pub fn build_hierarchy(directory: &EntityDirectory) -> Vec<SeniorManagerNode> {
    let mut roots: Vec<SeniorManagerNode> = directory
        .sms
        .iter()
        .map(|sm| SeniorManagerNode {
            entity: sm.clone(),
            managers: Vec::new(),
            ems: Vec::new(),
        })
        .collect();

    for manager in &directory.managers {
        let Some(position) = manager
            .sm_id
            .as_deref()
            .and_then(|id| roots.iter().position(|node| node.entity.id == id))
        else {
            continue;
        };
        roots[position].managers.push(ManagerNode {
            entity: manager.clone(),
            is_virtual: false,
            leaves: Vec::new(),
        });
    }

    for leaf in &directory.ams {
        if let Some(manager_id) = leaf.manager_id.as_deref() {
            if let Some(node) = find_manager(&mut roots, manager_id) {
                node.leaves.push(leaf.clone());
                continue;
            }
        }
        let Some(sm_id) = leaf.sm_id.as_deref() else {
            continue;
        };
        let Some(position) = roots.iter().position(|node| node.entity.id == sm_id) else {
            continue;
        };
        virtual_manager(&mut roots[position]).leaves.push(leaf.clone());
    }

    for em in &directory.ems {
        let Some(position) = em
            .sm_id
            .as_deref()
            .and_then(|id| roots.iter().position(|node| node.entity.id == id))
        else {
            continue;
        };
        roots[position].ems.push(em.clone());
    }

    for root in &mut roots {
        for manager in &mut root.managers {
            sort_by_name(&mut manager.leaves);
        }
        root.managers
            .sort_by_key(|manager| manager.entity.name.to_lowercase());
        sort_by_name(&mut root.ems);
    }
    roots.sort_by_key(|root| root.entity.name.to_lowercase());

    roots
}

fn sort_by_name(entities: &mut [Entity]) {
    entities.sort_by_key(|entity| entity.name.to_lowercase());
}

fn find_manager<'a>(
    roots: &'a mut [SeniorManagerNode],
    manager_id: &str,
) -> Option<&'a mut ManagerNode> {
    roots
        .iter_mut()
        .flat_map(|root| root.managers.iter_mut())
        .find(|node| node.entity.id == manager_id)
}

/// Find or lazily create the SM's virtual manager node.
fn virtual_manager(root: &mut SeniorManagerNode) -> &mut ManagerNode {
    let id = virtual_manager_id(&root.entity.id);
    if let Some(position) = root
        .managers
        .iter()
        .position(|node| node.entity.id == id)
    {
        return &mut root.managers[position];
    }

    root.managers.push(ManagerNode {
        entity: Entity {
            id,
            name: VIRTUAL_MANAGER_NAME.to_string(),
            role: Role::M,
            manager_id: None,
            sm_id: Some(root.entity.id.clone()),
            targets: Default::default(),
            scaled_targets: Default::default(),
            achieved: Default::default(),
            acc_active_clients: None,
        },
        is_virtual: true,
        leaves: Vec::new(),
    });
    let last = root.managers.len() - 1;
    &mut root.managers[last]
}
