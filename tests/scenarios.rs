//! End-to-end tick scenarios

use std::path::Path;

use roadwar::core::config::GameConfig;
use roadwar::core::types::{EdgeId, FactionId, NodeId, UnitId};
use roadwar::map::graph::{Edge, Node, RoadGraph};
use roadwar::protocol::{ClientMessage, ServerMessage};
use roadwar::simulation::{run_tick, QueuedCommand};
use roadwar::units::{Unit, UnitState};
use roadwar::world::{new_game, World};

fn line_world() -> World {
    let graph = RoadGraph::from_parts(
        vec![Node::new("a", 0.0, 0.0), Node::new("b", 100.0, 0.0)],
        vec![Edge::new("ab", "a", "b", 100.0)],
    )
    .unwrap();
    World::new(GameConfig::default(), graph)
}

fn quiet() -> Vec<QueuedCommand> {
    Vec::new()
}

#[test]
fn test_move_to_adjacent_node() {
    let mut world = line_world();
    let player = FactionId::new("player-1");
    let id = world.spawn_unit_at_node(&player, &NodeId::new("a"), 10).unwrap();

    let json = format!(
        r#"{{"type":"C_MOVE_ORDER","payload":{{"unitId":"{}","destNodeId":"b"}}}}"#,
        id
    );
    let order = ClientMessage::from_json(&json).unwrap();
    let report = run_tick(&mut world, vec![QueuedCommand::new(player.clone(), order)], 0.5, 0);
    assert_eq!(report.commands_applied, 1);
    assert_eq!(world.unit(id).unwrap().state, UnitState::Moving);

    for step in 1..=4 {
        run_tick(&mut world, quiet(), 0.5, step * 500);
    }

    let unit = world.unit(id).unwrap();
    assert_eq!(unit.edge_id, EdgeId::new("ab"));
    assert!((unit.distance_on_edge - 100.0).abs() < 1e-9);
    assert_eq!(unit.state, UnitState::Idle);
    assert!(unit.path_queue.is_empty());

    let b = world.graph.node(&NodeId::new("b")).unwrap();
    assert_eq!(b.owner_id, Some(player));
}

#[test]
fn test_rival_stacks_in_range_fight() {
    let mut world = line_world();
    let config = world.config.clone();
    let red = Unit::spawn(UnitId::new(), FactionId::new("red"), EdgeId::new("ab"), 50.0, 10, &config);
    let blue = Unit::spawn(UnitId::new(), FactionId::new("blue"), EdgeId::new("ab"), 60.0, 4, &config);
    let (red_id, blue_id) = (red.id, blue.id);
    world.units.extend([red, blue]);

    let report = run_tick(&mut world, quiet(), 1.0, 1_000);

    assert_eq!(report.combat_pairs.len(), 1);
    let red = world.unit(red_id).unwrap();
    let blue = world.unit(blue_id).unwrap();
    assert_eq!(red.state, UnitState::Combat);
    assert_eq!(blue.state, UnitState::Combat);
    assert!((red.hp - 900.0).abs() < 1e-9);
    assert!((blue.hp - 150.0).abs() < 1e-9);
    assert_eq!(red.count, 9);
    assert_eq!(blue.count, 2);

    let messages = report.messages(&world);
    assert!(matches!(messages[0], ServerMessage::GameTick(_)));
    assert!(matches!(messages[1], ServerMessage::CombatEvent(_)));
}

#[test]
fn test_losing_stack_is_removed_and_reported() {
    let mut world = line_world();
    let config = world.config.clone();
    let big = Unit::spawn(UnitId::new(), FactionId::new("red"), EdgeId::new("ab"), 50.0, 20, &config);
    let small = Unit::spawn(UnitId::new(), FactionId::new("blue"), EdgeId::new("ab"), 55.0, 1, &config);
    let small_id = small.id;
    world.units.extend([big, small]);

    let report = run_tick(&mut world, quiet(), 1.0, 1_000);

    assert_eq!(report.removed, vec![small_id]);
    assert!(report.combat_pairs.is_empty());
    assert_eq!(world.units.len(), 1);
    assert_eq!(world.units[0].state, UnitState::Combat);

    let deaths = report
        .messages(&world)
        .into_iter()
        .filter(|m| matches!(m, ServerMessage::UnitDeath(_)))
        .count();
    assert_eq!(deaths, 1);
}

#[test]
fn test_bundled_map_runs() {
    let map = Path::new(env!("CARGO_MANIFEST_DIR")).join("data/world_graph.json");
    let graph = RoadGraph::load(&map).unwrap();
    let config = GameConfig::default();
    let mut world = new_game(config.clone(), graph);

    assert_eq!(world.factions.len(), 1 + config.max_ai_factions);
    assert_eq!(world.units.len(), 1 + config.max_ai_factions);
    for unit in &world.units {
        assert_eq!(unit.count, config.starting_squad_size);
        assert!(world.players.contains_key(&unit.owner_id));
    }

    let mut total_hp: f64 = world.units.iter().map(|u| u.hp).sum();
    for step in 0..300u64 {
        let report = run_tick(&mut world, quiet(), 0.1, step * 100);
        assert_eq!(report.segments.len(), world.units.len());

        for unit in &world.units {
            let edge = world.graph.edge(&unit.edge_id).expect("unit on a known edge");
            assert!(unit.distance_on_edge >= 0.0);
            assert!(unit.distance_on_edge <= edge.length + 1e-9);
            assert!(unit.is_alive());
        }

        let hp: f64 = world.units.iter().map(|u| u.hp).sum();
        assert!(hp <= total_hp + 1e-6);
        total_hp = hp;
    }
    assert_eq!(world.clock_ms, 30_000);
}
