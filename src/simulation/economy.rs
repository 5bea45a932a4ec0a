//! Economy - income, recruitment, building and fortifying
//!
//! Income and recruitment run on their own timers. Build and upgrade are
//! player commands that the AI economy also issues.

use tracing::{debug, info};

use crate::core::error::CommandRejected;
use crate::core::types::{FactionId, NodeId, UnitId};
use crate::world::World;

/// Pay every owned node's yield to its owner
pub fn accrue_resources(world: &mut World) {
    let cap = world.config.manpower_cap;
    for node in world.graph.nodes() {
        let Some(owner) = &node.owner_id else {
            continue;
        };
        world
            .players
            .entry(owner.clone())
            .or_default()
            .add_yield(&node.resource_yield, cap);
    }
}

/// Index of a living friendly unit standing within `radius` of `node`
pub fn garrison_at(world: &World, node: &NodeId, owner: &FactionId, radius: f64) -> Option<usize> {
    world.units.iter().position(|u| {
        if !u.is_alive() || &u.owner_id != owner {
            return false;
        }
        let Some(edge) = world.graph.edge(&u.edge_id) else {
            return false;
        };
        (&edge.source_node_id == node && u.distance_on_edge <= radius)
            || (&edge.target_node_id == node && u.distance_on_edge >= edge.length - radius)
    })
}

/// Periodic draft: each owned node turns manpower into soldiers
///
/// An existing garrison is reinforced; otherwise a new stack is raised if the
/// owner is below the unit cap. Manpower is only spent when soldiers appear.
/// Returns how many nodes recruited.
pub fn process_recruitment(world: &mut World) -> usize {
    let owned: Vec<(NodeId, FactionId)> = world
        .graph
        .nodes()
        .iter()
        .filter_map(|n| n.owner_id.clone().map(|owner| (n.id.clone(), owner)))
        .collect();

    let batch = world.config.recruit_batch;
    let cost = world.config.recruit_manpower_cost;
    let mut recruited = 0;

    for (node, owner) in owned {
        if !world.can_afford(&owner, 0.0, cost) {
            continue;
        }

        let garrison = garrison_at(world, &node, &owner, world.config.recruit_garrison_radius);
        let raised = match garrison {
            Some(idx) => {
                let hp_per_soldier = world.config.hp_per_soldier;
                world.units[idx].reinforce(batch, hp_per_soldier);
                true
            }
            None if world.below_unit_cap(&owner) => {
                world.spawn_unit_at_node(&owner, &node, batch).is_some()
            }
            None => false,
        };

        if raised {
            world.resources_mut(&owner).try_spend(0.0, cost);
            recruited += 1;
        }
    }

    if recruited > 0 {
        info!(nodes = recruited, "Reinforcements arrived");
    }
    recruited
}

fn owned_node_level(world: &World, player: &FactionId, node: &NodeId) -> Result<u32, CommandRejected> {
    let found = world
        .graph
        .node(node)
        .ok_or_else(|| CommandRejected::NodeNotFound(node.clone()))?;
    if !found.is_owned_by(player) {
        return Err(CommandRejected::NotNodeOwner {
            node: node.clone(),
            player: player.clone(),
        });
    }
    Ok(found.fortification_level)
}

/// Raise a fresh stack at an owned node
pub fn build_unit(world: &mut World, player: &FactionId, node: &NodeId) -> Result<UnitId, CommandRejected> {
    owned_node_level(world, player, node)?;
    if !world.below_unit_cap(player) {
        return Err(CommandRejected::UnitCapReached(player.clone()));
    }

    let (gold, manpower) = (world.config.build_cost_gold, world.config.build_cost_manpower);
    if !world.can_afford(player, gold, manpower) {
        return Err(CommandRejected::InsufficientResources { gold, manpower });
    }

    let size = world.config.build_unit_size;
    let id = world
        .spawn_unit_at_node(player, node, size)
        .ok_or_else(|| CommandRejected::NodeNotFound(node.clone()))?;
    world.resources_mut(player).try_spend(gold, manpower);
    debug!(faction = %player, node = %node, unit = %id, "Unit built");
    Ok(id)
}

/// Gold needed to take a node from `level` to `level + 1`
pub fn upgrade_cost(world: &World, level: u32) -> f64 {
    world.config.upgrade_cost_gold * (level + 1) as f64
}

/// Add one fortification level to an owned node; returns the new level
pub fn upgrade_node(world: &mut World, player: &FactionId, node: &NodeId) -> Result<u32, CommandRejected> {
    let level = owned_node_level(world, player, node)?;
    if level >= world.config.max_fortification {
        return Err(CommandRejected::MaxFortification(node.clone()));
    }

    let gold = upgrade_cost(world, level);
    if !world.can_afford(player, gold, 0.0) {
        return Err(CommandRejected::InsufficientResources { gold, manpower: 0.0 });
    }
    world.resources_mut(player).try_spend(gold, 0.0);

    let new_level = level + 1;
    if let Some(target) = world.graph.node_mut(node) {
        target.fortification_level = new_level;
    }
    debug!(faction = %player, node = %node, level = new_level, "Node fortified");
    Ok(new_level)
}
