//! Movement - advancing units along their planned roads
//!
//! A unit walks its current edge; on reaching the edge's far node it pops that
//! node off the plan and carries any overshoot onto the road to the next
//! planned node. A stop point on the current road ends the walk early.

use crate::map::graph::{Edge, RoadGraph};
use crate::units::{Unit, UnitState};

/// Stop distance on `edge` when the unit's stop point lies on that road,
/// in either direction
pub fn stop_distance(graph: &RoadGraph, unit: &Unit, edge: &Edge) -> Option<f64> {
    let (target_edge_id, percent) = unit.stop_point()?;
    if target_edge_id == &edge.id {
        return Some(edge.length * percent);
    }
    let target = graph.edge(target_edge_id)?;
    if target.same_road(edge) && !target.aligned_with(edge) {
        return Some(edge.length * (1.0 - percent));
    }
    None
}

/// Advance one unit by `dt` seconds
///
/// Keeps `distance_on_edge` inside `[0, length]` of whatever edge the unit
/// ends on. Units in combat hold position.
pub fn update_unit_position(graph: &RoadGraph, unit: &mut Unit, dt: f64) {
    if unit.is_fighting() {
        return;
    }
    let Some(mut edge) = graph.edge(&unit.edge_id) else {
        return;
    };

    if !unit.has_plan() {
        if let Some(stop) = stop_distance(graph, unit, edge) {
            if unit.distance_on_edge > stop {
                unit.distance_on_edge = stop;
            }
        }
        unit.distance_on_edge = unit.distance_on_edge.clamp(0.0, edge.length);
        settle_state(unit);
        return;
    }

    unit.state = UnitState::Moving;
    unit.distance_on_edge += unit.speed * dt;

    if hard_stop(graph, unit, edge) {
        settle_state(unit);
        return;
    }

    while unit.distance_on_edge >= edge.length {
        let overshoot = unit.distance_on_edge - edge.length;
        let at_node = &edge.target_node_id;

        if unit.path_queue.front() == Some(at_node) {
            unit.path_queue.pop_front();
        }

        let Some(next_node) = unit.path_queue.front() else {
            unit.distance_on_edge = edge.length;
            break;
        };

        let Some(next_edge) = graph.edge_for_step(at_node, next_node) else {
            unit.distance_on_edge = edge.length;
            unit.path_queue.clear();
            break;
        };

        unit.edge_id = next_edge.id.clone();
        unit.distance_on_edge = overshoot;
        edge = next_edge;

        if hard_stop(graph, unit, edge) {
            break;
        }
    }

    unit.distance_on_edge = unit.distance_on_edge.clamp(0.0, edge.length);
    settle_state(unit);
}

/// Clamp at the stop point once it has been reached and drop the plan
fn hard_stop(graph: &RoadGraph, unit: &mut Unit, edge: &Edge) -> bool {
    match stop_distance(graph, unit, edge) {
        Some(stop) if unit.distance_on_edge >= stop => {
            unit.distance_on_edge = stop;
            unit.path_queue.clear();
            true
        }
        _ => false,
    }
}

fn settle_state(unit: &mut Unit) {
    if unit.is_fighting() {
        return;
    }
    unit.state = if unit.has_plan() {
        UnitState::Moving
    } else {
        UnitState::Idle
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::GameConfig;
    use crate::core::types::{EdgeId, FactionId, NodeId, UnitId};
    use crate::map::graph::Node;

    fn graph() -> RoadGraph {
        RoadGraph::from_parts(
            vec![
                Node::new("a", 0.0, 0.0),
                Node::new("b", 100.0, 0.0),
                Node::new("c", 200.0, 0.0),
            ],
            vec![Edge::new("ab", "a", "b", 100.0), Edge::new("bc", "b", "c", 100.0)],
        )
        .unwrap()
    }

    fn unit_on(edge: &str, distance: f64) -> Unit {
        Unit::spawn(
            UnitId::new(),
            FactionId::new("p1"),
            EdgeId::new(edge),
            distance,
            1,
            &GameConfig::default(),
        )
    }

    #[test]
    fn test_idle_unit_stays_put() {
        let graph = graph();
        let mut unit = unit_on("ab", 40.0);
        update_unit_position(&graph, &mut unit, 1.0);
        assert_eq!(unit.distance_on_edge, 40.0);
        assert_eq!(unit.state, UnitState::Idle);
    }

    #[test]
    fn test_advances_by_speed() {
        let graph = graph();
        let mut unit = unit_on("ab", 0.0);
        unit.path_queue.push_back(NodeId::new("b"));
        update_unit_position(&graph, &mut unit, 0.5);
        assert_eq!(unit.distance_on_edge, 30.0);
        assert_eq!(unit.state, UnitState::Moving);
    }

    #[test]
    fn test_overshoot_carries_onto_next_edge() {
        let graph = graph();
        let mut unit = unit_on("ab", 90.0);
        unit.path_queue.extend([NodeId::new("b"), NodeId::new("c")]);
        update_unit_position(&graph, &mut unit, 0.5);

        assert_eq!(unit.edge_id, EdgeId::new("bc"));
        assert!((unit.distance_on_edge - 20.0).abs() < 1e-9);
        assert_eq!(unit.path_queue, [NodeId::new("c")]);
    }

    #[test]
    fn test_plan_end_clamps_at_node() {
        let graph = graph();
        let mut unit = unit_on("ab", 90.0);
        unit.path_queue.push_back(NodeId::new("b"));
        update_unit_position(&graph, &mut unit, 1.0);

        assert_eq!(unit.edge_id, EdgeId::new("ab"));
        assert_eq!(unit.distance_on_edge, 100.0);
        assert!(!unit.has_plan());
        assert_eq!(unit.state, UnitState::Idle);
    }

    #[test]
    fn test_stop_point_is_hard_stop() {
        let graph = graph();
        let mut unit = unit_on("ab", 10.0);
        unit.path_queue.push_back(NodeId::new("b"));
        unit.set_stop_point(EdgeId::new("ab"), 0.5);
        update_unit_position(&graph, &mut unit, 1.0);

        assert_eq!(unit.distance_on_edge, 50.0);
        assert!(!unit.has_plan());
    }

    #[test]
    fn test_stop_point_on_reverse_is_mirrored() {
        let graph = graph();
        let mut unit = unit_on("ab__rev", 0.0);
        unit.path_queue.push_back(NodeId::new("a"));
        unit.set_stop_point(EdgeId::new("ab"), 0.75);
        update_unit_position(&graph, &mut unit, 1.0);

        assert_eq!(unit.distance_on_edge, 25.0);
        assert!(!unit.has_plan());
    }

    #[test]
    fn test_stop_point_on_later_edge() {
        let graph = graph();
        let mut unit = unit_on("ab", 90.0);
        unit.path_queue.extend([NodeId::new("b"), NodeId::new("c")]);
        unit.set_stop_point(EdgeId::new("bc"), 0.1);
        update_unit_position(&graph, &mut unit, 1.0);

        assert_eq!(unit.edge_id, EdgeId::new("bc"));
        assert_eq!(unit.distance_on_edge, 10.0);
        assert!(!unit.has_plan());
    }

    #[test]
    fn test_broken_plan_stops_at_node() {
        let graph = graph();
        let mut unit = unit_on("ab", 90.0);
        unit.path_queue.extend([NodeId::new("b"), NodeId::new("a")]);
        unit.path_queue[1] = NodeId::new("nowhere");
        update_unit_position(&graph, &mut unit, 1.0);

        assert_eq!(unit.distance_on_edge, 100.0);
        assert!(!unit.has_plan());
    }

    #[test]
    fn test_combat_holds_position() {
        let graph = graph();
        let mut unit = unit_on("ab", 10.0);
        unit.path_queue.push_back(NodeId::new("b"));
        unit.state = UnitState::Combat;
        update_unit_position(&graph, &mut unit, 1.0);
        assert_eq!(unit.distance_on_edge, 10.0);
        assert_eq!(unit.state, UnitState::Combat);
    }
}
