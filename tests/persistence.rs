//! Save and restore through the state file

use std::path::Path;

use roadwar::core::config::GameConfig;
use roadwar::map::graph::RoadGraph;
use roadwar::persistence::{PersistedState, StateManager};
use roadwar::simulation::{accrue_resources, run_tick, QueuedCommand};
use roadwar::world::{new_game, restore_game};

fn bundled_map() -> RoadGraph {
    let map = Path::new(env!("CARGO_MANIFEST_DIR")).join("data/world_graph.json");
    RoadGraph::load(&map).unwrap()
}

#[test]
fn test_game_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let state = StateManager::new(dir.path().join("savegame.json"));
    let config = GameConfig::default();

    let mut world = new_game(config.clone(), bundled_map());
    for step in 0..50u64 {
        run_tick(&mut world, Vec::<QueuedCommand>::new(), 0.1, step * 100);
    }
    accrue_resources(&mut world);

    assert!(state.save_world(&world, 1_234));
    let saved = state.load().unwrap();
    assert_eq!(saved.timestamp, 1_234);

    let restored = restore_game(config, bundled_map(), saved);

    assert_eq!(restored.clock_ms, world.clock_ms);
    assert_eq!(restored.factions.len(), world.factions.len());
    for (id, personality) in world.factions.ai_factions() {
        assert_eq!(restored.factions.personality(id), Some(personality));
    }

    assert_eq!(restored.units.len(), world.units.len());
    for (before, after) in world.units.iter().zip(&restored.units) {
        assert_eq!(after.id, before.id);
        assert_eq!(after.owner_id, before.owner_id);
        assert_eq!(after.edge_id, before.edge_id);
        assert_eq!(after.count, before.count);
        assert_eq!(after.path_queue, before.path_queue);
        assert!((after.distance_on_edge - before.distance_on_edge).abs() < 1e-9);
        assert!((after.hp - before.hp).abs() < 1e-9);
    }

    for (before, after) in world.graph.nodes().iter().zip(restored.graph.nodes()) {
        assert_eq!(after.id, before.id);
        assert_eq!(after.owner_id, before.owner_id);
        assert_eq!(after.fortification_level, before.fortification_level);
        assert_eq!(after.resource_yield, before.resource_yield);
    }

    assert_eq!(restored.players.len(), world.players.len());
    for (id, res) in &world.players {
        let other = restored.players.get(id).unwrap();
        assert!((other.gold - res.gold).abs() < 1e-9);
        assert!((other.manpower - res.manpower).abs() < 1e-9);
    }
}

#[test]
fn test_save_replaces_previous_file() {
    let dir = tempfile::tempdir().unwrap();
    let state = StateManager::new(dir.path().join("savegame.json"));
    let world = new_game(GameConfig::default(), bundled_map());

    state.save(&PersistedState::capture(&world, 1)).unwrap();
    state.save(&PersistedState::capture(&world, 2)).unwrap();

    assert_eq!(state.load().unwrap().timestamp, 2);
    assert!(!dir.path().join("savegame.json.tmp").exists());
}

#[test]
fn test_corrupt_save_starts_fresh() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("savegame.json");
    std::fs::write(&path, "{ not json").unwrap();

    assert!(StateManager::new(path).load().is_none());
}
