//! AI - per-unit decisions and per-faction spending
//!
//! Each AI unit re-thinks on its own timer. What it goes after depends on its
//! faction's personality; how it gets there is the same routing a human
//! order uses.

use ordered_float::OrderedFloat;
use rand::Rng;
use tracing::debug;

use crate::core::types::{FactionId, NodeId};
use crate::factions::{Personality, TargetKind};
use crate::map::graph::{Node, RoadGraph};
use crate::units::{Unit, UnitState};
use crate::world::World;

use super::economy::{build_unit, upgrade_cost, upgrade_node};
use super::orders::{process_move_order, MoveOrder, MoveTarget};

/// Endpoint of the unit's edge it is closer to
pub fn anchor_node<'g>(graph: &'g RoadGraph, unit: &Unit) -> Option<&'g Node> {
    let edge = graph.edge(&unit.edge_id)?;
    let id = if unit.distance_on_edge <= edge.length / 2.0 {
        &edge.source_node_id
    } else {
        &edge.target_node_id
    };
    graph.node(id)
}

fn classify(node: &Node, faction: &FactionId) -> TargetKind {
    match &node.owner_id {
        None => TargetKind::Unowned,
        Some(owner) if owner == faction => TargetKind::Own,
        Some(_) => TargetKind::Enemy,
    }
}

/// Nodes of the first preferred class that has any, nearest first
pub fn pick_targets(
    graph: &RoadGraph,
    unit: &Unit,
    personality: Personality,
) -> Vec<NodeId> {
    let Some(anchor) = anchor_node(graph, unit) else {
        return Vec::new();
    };
    let origin = anchor.position();

    for kind in personality.target_preferences() {
        let mut matches: Vec<&Node> = graph
            .nodes()
            .iter()
            .filter(|n| n.id != anchor.id && classify(n, &unit.owner_id) == kind)
            .collect();
        if matches.is_empty() {
            continue;
        }
        matches.sort_by_key(|n| OrderedFloat(origin.distance_sq(&n.position())));
        return matches.into_iter().map(|n| n.id.clone()).collect();
    }
    Vec::new()
}

fn order_to(world: &mut World, owner: &FactionId, unit: &Unit, node: &NodeId, split: Option<u32>) {
    let order = MoveOrder {
        unit_id: unit.id,
        target: MoveTarget::Node(node.clone()),
        split_count: split,
    };
    match process_move_order(world, owner, &order) {
        Ok(_) => debug!(unit = %unit.id, target = %node, split = ?split, "AI order"),
        Err(e) => debug!(unit = %unit.id, target = %node, "AI order dropped: {}", e),
    }
}

/// Run the decision step for every AI unit whose timer is due
///
/// Returns the number of units that made a decision.
pub fn process_ai_decisions(world: &mut World) -> usize {
    let now = world.clock_ms;
    let cfg = world.config.clone();
    let mut decided = 0;

    // Units created by splits this tick wait for their own timers
    for idx in 0..world.units.len() {
        let unit = &world.units[idx];
        let Some(personality) = world.factions.personality(&unit.owner_id) else {
            continue;
        };
        if !unit.is_alive() || unit.state == UnitState::Combat {
            continue;
        }
        if unit.next_decision_at.is_some_and(|at| at > now) {
            continue;
        }
        if unit.has_plan() && unit.state == UnitState::Moving {
            continue;
        }

        decided += 1;

        if unit.hp_ratio() < cfg.ai_low_hp_ratio {
            world.units[idx].next_decision_at = Some(now + cfg.ai_rest_ms);
            continue;
        }

        if world.rng.gen_bool(cfg.ai_garrison_chance.clamp(0.0, 1.0)) {
            let wake = world.schedule_after(cfg.ai_garrison_min_ms, cfg.ai_garrison_max_ms);
            world.units[idx].next_decision_at = Some(wake);
            continue;
        }

        let wake = world.schedule_after(cfg.ai_decision_min_ms, cfg.ai_decision_max_ms);
        world.units[idx].next_decision_at = Some(wake);

        let unit = world.units[idx].clone();
        let targets = pick_targets(&world.graph, &unit, personality);
        let Some(first) = targets.first() else {
            continue;
        };

        if personality.splits_large_stacks() && unit.count > cfg.ai_split_threshold {
            order_to(world, &unit.owner_id, &unit, first, Some(unit.count / 2));
            if let Some(second) = targets.get(1) {
                order_to(world, &unit.owner_id, &unit, second, None);
            }
        } else {
            order_to(world, &unit.owner_id, &unit, first, None);
        }
    }

    decided
}

/// One round of AI spending: at most one upgrade and one build per faction
pub fn process_ai_economy(world: &mut World) {
    let factions: Vec<(FactionId, Personality)> = world
        .factions
        .ai_factions()
        .map(|(id, p)| (id.clone(), p))
        .collect();

    for (faction, personality) in factions {
        if personality.prefers_fortification() {
            let weakest = world
                .graph
                .nodes()
                .iter()
                .filter(|n| n.is_owned_by(&faction))
                .filter(|n| n.fortification_level < world.config.max_fortification)
                .min_by_key(|n| n.fortification_level)
                .map(|n| (n.id.clone(), n.fortification_level));

            if let Some((node, level)) = weakest {
                let cost = upgrade_cost(world, level);
                if world.can_afford(&faction, cost, 0.0) {
                    match upgrade_node(world, &faction, &node) {
                        Ok(level) => debug!(faction = %faction, node = %node, level, "AI fortified"),
                        Err(e) => debug!(faction = %faction, "AI upgrade skipped: {}", e),
                    }
                }
            }
        }

        let home = world
            .graph
            .nodes()
            .iter()
            .find(|n| n.is_owned_by(&faction))
            .map(|n| n.id.clone());
        let Some(home) = home else {
            continue;
        };
        let (gold, manpower) = (world.config.build_cost_gold, world.config.build_cost_manpower);
        if world.below_unit_cap(&faction) && world.can_afford(&faction, gold, manpower) {
            match build_unit(world, &faction, &home) {
                Ok(id) => debug!(faction = %faction, node = %home, unit = %id, "AI built unit"),
                Err(e) => debug!(faction = %faction, "AI build skipped: {}", e),
            }
        }
    }
}
