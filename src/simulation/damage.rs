//! Damage - attrition between paired stacks
//!
//! Every soldier deals `base_dps` per second into the enemy's shared HP pool.
//! A defender standing at one of its own fortified nodes takes less.

use ahash::{AHashMap, AHashSet};

use crate::core::config::GameConfig;
use crate::core::types::UnitId;
use crate::map::graph::RoadGraph;
use crate::units::{Unit, UnitState};

use super::combat::CombatPair;

/// Fraction of incoming damage a unit is spared by its own fortifications
pub fn fortification_discount(graph: &RoadGraph, config: &GameConfig, unit: &Unit) -> f64 {
    let Some(edge) = graph.edge(&unit.edge_id) else {
        return 0.0;
    };

    let mut nearby = Vec::with_capacity(2);
    if unit.distance_on_edge <= config.capture_radius {
        nearby.push(&edge.source_node_id);
    }
    if unit.distance_on_edge >= edge.length - config.capture_radius {
        nearby.push(&edge.target_node_id);
    }

    nearby
        .into_iter()
        .filter_map(|id| graph.node(id))
        .filter(|node| node.is_owned_by(&unit.owner_id))
        .map(|node| node.fortification_level)
        .max()
        .map(|level| {
            (level as f64 * config.fortification_discount_per_level)
                .min(config.max_fortification_discount)
        })
        .unwrap_or(0.0)
}

/// Apply one tick of combat damage for `pairs`
///
/// Pairs are resolved in order, so a unit caught in several fights takes
/// damage from each. Fighting units that found no opponent this tick go back
/// to marching or idling.
pub fn process_combat(
    graph: &RoadGraph,
    config: &GameConfig,
    units: &mut [Unit],
    pairs: &[CombatPair],
    dt: f64,
) {
    let index: AHashMap<UnitId, usize> = units.iter().enumerate().map(|(i, u)| (u.id, i)).collect();
    let mut fighting: AHashSet<UnitId> = AHashSet::new();

    for pair in pairs {
        let (Some(&ai), Some(&bi)) = (index.get(&pair.a_id), index.get(&pair.b_id)) else {
            continue;
        };
        if ai == bi || !units[ai].is_alive() || !units[bi].is_alive() {
            continue;
        }

        let damage_to_a = config.base_dps * units[bi].count.max(1) as f64 * dt
            * (1.0 - fortification_discount(graph, config, &units[ai]));
        let damage_to_b = config.base_dps * units[ai].count.max(1) as f64 * dt
            * (1.0 - fortification_discount(graph, config, &units[bi]));

        for (idx, damage) in [(ai, damage_to_a), (bi, damage_to_b)] {
            let unit = &mut units[idx];
            unit.state = UnitState::Combat;
            unit.hp = (unit.hp - damage).max(0.0);
            unit.recount(config.hp_per_soldier);
            fighting.insert(unit.id);
        }
    }

    for unit in units.iter_mut() {
        if unit.state == UnitState::Combat && !fighting.contains(&unit.id) {
            unit.state = if unit.has_plan() {
                UnitState::Moving
            } else {
                UnitState::Idle
            };
        }
    }
}
