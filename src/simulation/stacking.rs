//! Stacking - friendly stacks standing together become one
//!
//! Marching units never merge. Pass one joins neighbours on the same road,
//! pass two joins everything gathered at the same node.

use std::collections::BTreeMap;

use tracing::debug;

use crate::core::types::{EdgeId, FactionId, NodeId, UnitId};
use crate::map::graph::RoadGraph;
use crate::units::{Unit, UnitState};

fn can_merge(unit: &Unit) -> bool {
    unit.is_alive() && unit.state != UnitState::Moving
}

/// Fold `units[gone]` into `units[keep]`
fn merge_into(units: &mut [Unit], keep: usize, gone: usize) {
    if keep == gone {
        return;
    }
    let (keeper, absorbed) = if keep < gone {
        let (left, right) = units.split_at_mut(gone);
        (&mut left[keep], &mut right[0])
    } else {
        let (left, right) = units.split_at_mut(keep);
        (&mut right[0], &mut left[gone])
    };
    debug!(keeper = %keeper.id, absorbed = %absorbed.id, "Stacks merged");
    keeper.absorb(absorbed);
}

/// Merge co-located friendly stacks; returns the ids of absorbed units
pub fn process_stacking(graph: &RoadGraph, units: &mut [Unit], threshold: f64) -> Vec<UnitId> {
    let mut absorbed = Vec::new();

    let mut by_edge: BTreeMap<EdgeId, Vec<usize>> = BTreeMap::new();
    for (idx, unit) in units.iter().enumerate().filter(|(_, u)| can_merge(u)) {
        by_edge.entry(unit.edge_id.clone()).or_default().push(idx);
    }

    for mut list in by_edge.into_values() {
        if list.len() < 2 {
            continue;
        }
        list.sort_by(|&a, &b| units[a].distance_on_edge.total_cmp(&units[b].distance_on_edge));

        let mut i = 0;
        while i + 1 < list.len() {
            let (first, second) = (list[i], list[i + 1]);
            let close = (units[first].distance_on_edge - units[second].distance_on_edge).abs() <= threshold;
            if close && units[first].owner_id == units[second].owner_id {
                merge_into(units, first, second);
                absorbed.push(units[second].id);
                list.remove(i + 1);
            } else {
                i += 1;
            }
        }
    }

    let mut by_node: BTreeMap<NodeId, Vec<usize>> = BTreeMap::new();
    for (idx, unit) in units.iter().enumerate().filter(|(_, u)| can_merge(u)) {
        let Some(edge) = graph.edge(&unit.edge_id) else {
            continue;
        };
        let node = if unit.distance_on_edge <= threshold {
            &edge.source_node_id
        } else if unit.distance_on_edge >= edge.length - threshold {
            &edge.target_node_id
        } else {
            continue;
        };
        by_node.entry(node.clone()).or_default().push(idx);
    }

    for list in by_node.into_values() {
        let mut primaries: BTreeMap<FactionId, usize> = BTreeMap::new();
        for idx in list {
            if !units[idx].is_alive() {
                continue;
            }
            match primaries.get(&units[idx].owner_id) {
                Some(&keep) => {
                    merge_into(units, keep, idx);
                    absorbed.push(units[idx].id);
                }
                None => {
                    primaries.insert(units[idx].owner_id.clone(), idx);
                }
            }
        }
    }

    absorbed
}
