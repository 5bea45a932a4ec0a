//! Conquest - provinces change hands when a hostile stack reaches them

use tracing::info;

use crate::core::config::{CapturePolicy, GameConfig};
use crate::core::types::{FactionId, NodeId};
use crate::map::graph::RoadGraph;
use crate::units::Unit;

/// A node that changed owner this tick
#[derive(Debug, Clone, PartialEq)]
pub struct Capture {
    pub node_id: NodeId,
    pub previous_owner: Option<FactionId>,
    pub new_owner: FactionId,
}

/// Endpoint nodes `unit` is close enough to claim under `policy`
fn claimable_nodes(graph: &RoadGraph, config: &GameConfig, unit: &Unit) -> Vec<NodeId> {
    let Some(edge) = graph.edge(&unit.edge_id) else {
        return Vec::new();
    };
    let reach = match config.capture_policy {
        CapturePolicy::DriveBy => config.capture_radius,
        CapturePolicy::Arrival => 0.0,
    };

    let mut nodes = Vec::with_capacity(2);
    if unit.distance_on_edge <= reach {
        nodes.push(edge.source_node_id.clone());
    }
    if unit.distance_on_edge >= edge.length - reach {
        nodes.push(edge.target_node_id.clone());
    }
    nodes
}

/// Hand every reached node to the reaching unit's faction
///
/// Later units in the list win when rival stacks reach the same node on the
/// same tick. Reaching an own node changes nothing.
pub fn process_conquest(graph: &mut RoadGraph, config: &GameConfig, units: &[Unit]) -> Vec<Capture> {
    let mut captures = Vec::new();

    for unit in units.iter().filter(|u| u.is_alive()) {
        for node_id in claimable_nodes(graph, config, unit) {
            let Some(node) = graph.node_mut(&node_id) else {
                continue;
            };
            if node.is_owned_by(&unit.owner_id) {
                continue;
            }
            let previous_owner = node.owner_id.replace(unit.owner_id.clone());
            info!(node = %node_id, faction = %unit.owner_id, "Node captured");
            captures.push(Capture {
                node_id,
                previous_owner,
                new_owner: unit.owner_id.clone(),
            });
        }
    }

    captures
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{EdgeId, UnitId};
    use crate::map::graph::{Edge, Node};

    fn graph() -> RoadGraph {
        RoadGraph::from_parts(
            vec![Node::new("a", 0.0, 0.0), Node::new("b", 100.0, 0.0)],
            vec![Edge::new("ab", "a", "b", 100.0)],
        )
        .unwrap()
    }

    fn unit(owner: &str, distance: f64) -> Unit {
        Unit::spawn(
            UnitId::new(),
            FactionId::new(owner),
            EdgeId::new("ab"),
            distance,
            1,
            &GameConfig::default(),
        )
    }

    #[test]
    fn test_drive_by_capture() {
        let mut graph = graph();
        let captures = process_conquest(&mut graph, &GameConfig::default(), &[unit("p1", 90.0)]);

        assert_eq!(captures.len(), 1);
        assert_eq!(captures[0].node_id, NodeId::new("b"));
        assert_eq!(captures[0].previous_owner, None);
        assert!(graph.node(&NodeId::new("b")).unwrap().is_owned_by(&FactionId::new("p1")));
    }

    #[test]
    fn test_capture_is_idempotent() {
        let mut graph = graph();
        let units = [unit("p1", 100.0)];
        let config = GameConfig::default();
        assert_eq!(process_conquest(&mut graph, &config, &units).len(), 1);
        assert!(process_conquest(&mut graph, &config, &units).is_empty());
    }

    #[test]
    fn test_mid_road_captures_nothing() {
        let mut graph = graph();
        assert!(process_conquest(&mut graph, &GameConfig::default(), &[unit("p1", 50.0)]).is_empty());
    }

    #[test]
    fn test_arrival_policy_needs_exact_node() {
        let mut graph = graph();
        let config = GameConfig {
            capture_policy: CapturePolicy::Arrival,
            ..GameConfig::default()
        };
        assert!(process_conquest(&mut graph, &config, &[unit("p1", 95.0)]).is_empty());
        assert_eq!(process_conquest(&mut graph, &config, &[unit("p1", 100.0)]).len(), 1);
    }

    #[test]
    fn test_enemy_node_records_previous_owner() {
        let mut graph = graph();
        graph.node_mut(&NodeId::new("a")).unwrap().owner_id = Some(FactionId::new("ai"));
        let captures = process_conquest(&mut graph, &GameConfig::default(), &[unit("p1", 0.0)]);
        assert_eq!(captures[0].previous_owner, Some(FactionId::new("ai")));
    }
}
