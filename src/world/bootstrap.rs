//! Starting a world: fresh game or restored snapshot

use rand::Rng;
use tracing::{info, warn};

use crate::core::config::GameConfig;
use crate::core::types::NodeId;
use crate::factions::FactionRegistry;
use crate::map::graph::{ResourceYield, RoadGraph};
use crate::persistence::PersistedState;

use super::World;

/// Bases used for the starting armies: configured ids, or the first map nodes
fn base_nodes(config: &GameConfig, graph: &RoadGraph) -> Vec<NodeId> {
    let configured: Vec<NodeId> = config
        .base_node_ids
        .iter()
        .filter(|id| {
            let known = graph.node(id).is_some();
            if !known {
                warn!(node = %id, "Configured base node not on map, skipping");
            }
            known
        })
        .cloned()
        .collect();
    if !configured.is_empty() {
        return configured;
    }

    graph
        .nodes()
        .iter()
        .take(1 + config.max_ai_factions)
        .map(|n| n.id.clone())
        .collect()
}

/// A new game: random yields, the human at the first base, one AI faction
/// at each remaining base
///
/// Nodes start unowned; the starting armies take their bases through the
/// normal conquest pass on the first tick.
pub fn new_game(config: GameConfig, graph: RoadGraph) -> World {
    let mut world = World::new(config, graph);

    let node_ids: Vec<NodeId> = world.graph.nodes().iter().map(|n| n.id.clone()).collect();
    for id in &node_ids {
        let gold = world
            .rng
            .gen_range(world.config.yield_gold_min..=world.config.yield_gold_max)
            .round();
        let manpower = world
            .rng
            .gen_range(world.config.yield_manpower_min..=world.config.yield_manpower_max)
            .round();
        if let Some(node) = world.graph.node_mut(id) {
            node.owner_id = None;
            node.fortification_level = 0;
            node.resource_yield = ResourceYield { gold, manpower };
        }
    }

    let bases = base_nodes(&world.config, &world.graph);
    let human = world.config.human_player_id.clone();
    let squad = world.config.starting_squad_size;

    world.factions.register_human(human.clone());
    world.resources_mut(&human);

    for (i, base) in bases.iter().enumerate() {
        let owner = if i == 0 {
            human.clone()
        } else {
            let ai = world.factions.register_ai();
            world.resources_mut(&ai);
            ai
        };
        if world.spawn_unit_at_node(&owner, base, squad).is_none() {
            warn!(node = %base, faction = %owner, "Base node has no roads, no starting army");
        }
    }

    info!(
        nodes = world.graph.nodes().len(),
        edges = world.graph.edges().len(),
        factions = world.factions.len(),
        units = world.units.len(),
        "New game created"
    );
    world
}

/// Rebuild a world from a snapshot taken on the same map
///
/// Units on roads the map no longer has are dropped. Owners missing from the
/// saved faction list are registered, so old saves without one still load.
pub fn restore_game(config: GameConfig, graph: RoadGraph, saved: PersistedState) -> World {
    let mut world = World::new(config, graph);
    let human = world.config.human_player_id.clone();

    let restored_nodes = world.graph.restore_node_state(&saved.nodes);
    world.factions = FactionRegistry::from_records(saved.factions);
    world.factions.ensure_known(&human, &human);

    for (owner, resources) in saved.players {
        world.factions.ensure_known(&owner, &human);
        world.players.insert(owner, resources);
    }

    let owners: Vec<_> = world
        .graph
        .nodes()
        .iter()
        .filter_map(|n| n.owner_id.clone())
        .collect();
    for owner in &owners {
        world.factions.ensure_known(owner, &human);
    }

    let total = saved.units.len();
    for mut unit in saved.units {
        let Some(edge) = world.graph.edge(&unit.edge_id) else {
            warn!(unit = %unit.id, edge = %unit.edge_id, "Saved unit on unknown edge, dropping");
            continue;
        };
        if !unit.is_alive() {
            continue;
        }
        unit.distance_on_edge = unit.distance_on_edge.clamp(0.0, edge.length);
        world.factions.ensure_known(&unit.owner_id, &human);
        if world.factions.is_ai(&unit.owner_id) && unit.next_decision_at.is_none() {
            unit.next_decision_at = Some(saved.clock_ms);
        }
        world.units.push(unit);
    }

    world.clock_ms = saved.clock_ms;

    info!(
        nodes = restored_nodes,
        units = world.units.len(),
        dropped = total - world.units.len(),
        factions = world.factions.len(),
        "Game restored from save"
    );
    world
}
