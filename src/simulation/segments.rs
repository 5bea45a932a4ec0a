//! Movement segments - straight-line hints for client interpolation

use serde::{Deserialize, Serialize};

use crate::core::types::{EdgeId, UnitId, Vec2};
use crate::map::graph::RoadGraph;
use crate::units::Unit;

/// Where a unit is drawn from and to over the next `duration_ms`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementSegment {
    pub unit_id: UnitId,
    pub edge_id: EdgeId,
    pub start: Vec2,
    pub end: Vec2,
    pub start_time: u64,
    pub duration_ms: f64,
}

/// Map position of a unit, or `None` if its edge is unknown
pub fn unit_position(graph: &RoadGraph, unit: &Unit) -> Option<Vec2> {
    let edge = graph.edge(&unit.edge_id)?;
    graph.point_on_edge(edge, unit.distance_on_edge)
}

/// Segment for one unit at wall-clock time `now`
///
/// A marching unit heads for the far node of its edge at its own speed;
/// everything else gets a zero-length snapshot.
pub fn build_segment(graph: &RoadGraph, unit: &Unit, now: u64) -> Option<MovementSegment> {
    let edge = graph.edge(&unit.edge_id)?;
    let start = graph.point_on_edge(edge, unit.distance_on_edge)?;

    let (end, duration_ms) = if unit.has_plan() && !unit.is_fighting() {
        let end = graph.node(&edge.target_node_id)?.position();
        let remaining = (edge.length - unit.distance_on_edge).max(0.0);
        let duration = if unit.speed > 0.0 {
            remaining / unit.speed * 1000.0
        } else {
            0.0
        };
        (end, duration)
    } else {
        (start, 0.0)
    };

    Some(MovementSegment {
        unit_id: unit.id,
        edge_id: edge.id.clone(),
        start,
        end,
        start_time: now,
        duration_ms,
    })
}

pub fn build_segments<'a>(
    graph: &RoadGraph,
    units: impl IntoIterator<Item = &'a Unit>,
    now: u64,
) -> Vec<MovementSegment> {
    units
        .into_iter()
        .filter_map(|u| build_segment(graph, u, now))
        .collect()
}
