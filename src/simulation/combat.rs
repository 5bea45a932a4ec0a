//! Combat detection - hostile stacks within striking range
//!
//! Positions go into a sparse hash whose cells are twice the combat radius
//! wide, so any two units in range share a cell or sit in adjacent ones.

use serde::{Deserialize, Serialize};

use crate::core::types::UnitId;
use crate::map::graph::RoadGraph;
use crate::spatial::SparseHashGrid;
use crate::units::Unit;

use super::segments::unit_position;

/// Two hostile units in contact; `a_id < b_id`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombatPair {
    pub a_id: UnitId,
    pub b_id: UnitId,
}

/// Every hostile pair within `radius`, each reported once, sorted by id
pub fn detect_proximity(graph: &RoadGraph, units: &[Unit], radius: f64) -> Vec<CombatPair> {
    let mut grid: SparseHashGrid<usize> = SparseHashGrid::new(radius * 2.0);
    grid.rebuild(
        units
            .iter()
            .enumerate()
            .filter(|(_, u)| u.is_alive())
            .filter_map(|(idx, u)| unit_position(graph, u).map(|pos| (idx, pos))),
    );

    let radius_sq = radius * radius;
    let mut pairs = Vec::new();

    for (coord, members) in grid.occupied() {
        for &(a_idx, a_pos) in members {
            let a = &units[a_idx];
            for (b_idx, b_pos) in grid.neighborhood(coord) {
                let b = &units[b_idx];
                if a.id >= b.id || a.owner_id == b.owner_id {
                    continue;
                }
                if a_pos.distance_sq(&b_pos) <= radius_sq {
                    pairs.push(CombatPair { a_id: a.id, b_id: b.id });
                }
            }
        }
    }

    pairs.sort_unstable();
    pairs
}
