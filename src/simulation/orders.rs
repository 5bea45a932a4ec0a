//! Move orders - choosing the physically shortest way to a point on the map
//!
//! A destination is always a point on a road. Five routes are costed by
//! distance: straight along the current road, or out through either end of the
//! current road and in through either end of the target road. The cheapest
//! wins; on ties the earlier route in that order is kept.

use std::collections::VecDeque;

use ordered_float::OrderedFloat;
use tracing::debug;

use crate::core::error::CommandRejected;
use crate::core::types::{EdgeId, FactionId, NodeId, UnitId};
use crate::map::graph::{Edge, RoadGraph};
use crate::map::pathing::{find_path, path_length};
use crate::units::{Unit, UnitState};
use crate::world::World;

/// Where a unit was told to go
#[derive(Debug, Clone, PartialEq)]
pub enum MoveTarget {
    Node(NodeId),
    /// A point `percent` of the way along `edge`
    EdgePoint { edge: EdgeId, percent: f64 },
}

/// A move order for one unit, optionally detaching part of the stack
#[derive(Debug, Clone, PartialEq)]
pub struct MoveOrder {
    pub unit_id: UnitId,
    pub target: MoveTarget,
    pub split_count: Option<u32>,
}

/// Clamp to [0, 1] and round to the nearest multiple of `step`
pub fn snap_percent(percent: f64, step: f64) -> f64 {
    let clamped = percent.clamp(0.0, 1.0);
    if step <= 0.0 {
        return clamped;
    }
    let snapped = (clamped / step).round() * step;
    ((snapped * 1e6).round() / 1e6).clamp(0.0, 1.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Entry {
    /// Drive into the target road from its source node
    Source,
    /// Drive into the target road from its target node, on the reverse edge
    Target,
}

#[derive(Debug, Clone)]
enum Route {
    Direct { reverse: bool },
    Graph { path: Vec<NodeId>, entry: Entry },
}

#[derive(Debug, Clone)]
struct Candidate {
    cost: f64,
    route: Route,
}

/// The movement state a unit takes on when it accepts an order
#[derive(Debug, Clone, PartialEq)]
pub struct RoutePlan {
    pub edge_id: EdgeId,
    pub distance_on_edge: f64,
    pub path_queue: VecDeque<NodeId>,
    pub target_edge_id: EdgeId,
    pub target_percent: f64,
    /// Physical distance still to travel
    pub cost: f64,
}

impl RoutePlan {
    pub fn apply(&self, unit: &mut Unit) {
        unit.edge_id = self.edge_id.clone();
        unit.distance_on_edge = self.distance_on_edge;
        unit.path_queue = self.path_queue.clone();
        unit.set_stop_point(self.target_edge_id.clone(), self.target_percent);
        if unit.state != UnitState::Combat {
            unit.state = if unit.has_plan() {
                UnitState::Moving
            } else {
                UnitState::Idle
            };
        }
    }
}

/// Resolve the target road and raw percent for a destination
fn resolve_target<'g>(
    graph: &'g RoadGraph,
    current: &'g Edge,
    target: &MoveTarget,
) -> Result<(&'g Edge, f64), CommandRejected> {
    match target {
        MoveTarget::EdgePoint { edge, percent } => graph
            .edge(edge)
            .map(|e| (e, *percent))
            .ok_or_else(|| CommandRejected::EdgeNotFound(edge.clone())),
        MoveTarget::Node(node) => {
            if &current.source_node_id == node {
                return Ok((current, 0.0));
            }
            if &current.target_node_id == node {
                return Ok((current, 1.0));
            }
            if graph.node(node).is_none() {
                return Err(CommandRejected::NodeNotFound(node.clone()));
            }
            graph
                .outgoing(node)
                .next()
                .map(|e| (e, 0.0))
                .ok_or_else(|| CommandRejected::NodeNotFound(node.clone()))
        }
    }
}

fn graph_route(
    graph: &RoadGraph,
    start: &NodeId,
    start_cost: f64,
    end: &NodeId,
    end_cost: f64,
    entry: Entry,
) -> Candidate {
    if start == end {
        return Candidate {
            cost: start_cost + end_cost,
            route: Route::Graph { path: vec![start.clone()], entry },
        };
    }
    match find_path(graph, start, end) {
        Some(path) => Candidate {
            cost: start_cost + path_length(graph, &path) + end_cost,
            route: Route::Graph { path, entry },
        },
        None => Candidate {
            cost: f64::INFINITY,
            route: Route::Graph { path: Vec::new(), entry },
        },
    }
}

/// Work out how `unit` reaches `target`, without touching the unit
pub fn plan_route(
    graph: &RoadGraph,
    unit: &Unit,
    target: &MoveTarget,
    snap_step: f64,
) -> Result<RoutePlan, CommandRejected> {
    let current = graph
        .edge(&unit.edge_id)
        .ok_or_else(|| CommandRejected::EdgeNotFound(unit.edge_id.clone()))?;
    let (target_edge, raw_percent) = resolve_target(graph, current, target)?;
    let percent = snap_percent(raw_percent, snap_step);

    let here = unit.distance_on_edge.clamp(0.0, current.length);
    let from_source = here;
    let from_target = current.length - here;
    let target_from_source = target_edge.length * percent;
    let target_from_target = target_edge.length * (1.0 - percent);

    // Target as a fraction of the current road in the unit's direction
    let normalized = if current.aligned_with(target_edge) {
        percent
    } else {
        1.0 - percent
    };

    let direct = if current.same_road(target_edge) {
        Candidate {
            cost: (normalized * current.length - here).abs(),
            route: Route::Direct {
                reverse: normalized < here / current.length,
            },
        }
    } else {
        Candidate {
            cost: f64::INFINITY,
            route: Route::Direct { reverse: false },
        }
    };

    let candidates = [
        direct,
        graph_route(
            graph,
            &current.source_node_id,
            from_source,
            &target_edge.source_node_id,
            target_from_source,
            Entry::Source,
        ),
        graph_route(
            graph,
            &current.source_node_id,
            from_source,
            &target_edge.target_node_id,
            target_from_target,
            Entry::Target,
        ),
        graph_route(
            graph,
            &current.target_node_id,
            from_target,
            &target_edge.source_node_id,
            target_from_source,
            Entry::Source,
        ),
        graph_route(
            graph,
            &current.target_node_id,
            from_target,
            &target_edge.target_node_id,
            target_from_target,
            Entry::Target,
        ),
    ];

    let best = candidates
        .into_iter()
        .min_by_key(|c| OrderedFloat(c.cost))
        .filter(|c| c.cost.is_finite())
        .ok_or(CommandRejected::NoRoute(unit.id))?;

    match best.route {
        Route::Direct { reverse: false } => Ok(RoutePlan {
            edge_id: current.id.clone(),
            distance_on_edge: here,
            path_queue: VecDeque::from([current.target_node_id.clone()]),
            target_edge_id: current.id.clone(),
            target_percent: normalized,
            cost: best.cost,
        }),
        Route::Direct { reverse: true } => {
            let reverse = graph
                .reverse_of(current)
                .ok_or(CommandRejected::NoRoute(unit.id))?;
            Ok(RoutePlan {
                edge_id: reverse.id.clone(),
                distance_on_edge: current.length - here,
                path_queue: VecDeque::from([reverse.target_node_id.clone()]),
                target_edge_id: reverse.id.clone(),
                target_percent: 1.0 - normalized,
                cost: best.cost,
            })
        }
        Route::Graph { path, entry } => {
            let leaves_via_source = path.first() == Some(&current.source_node_id);
            let (edge_id, distance_on_edge) = if leaves_via_source {
                let reverse = graph
                    .reverse_of(current)
                    .ok_or(CommandRejected::NoRoute(unit.id))?;
                (reverse.id.clone(), current.length - here)
            } else {
                (current.id.clone(), here)
            };

            let mut path_queue: VecDeque<NodeId> = path.into_iter().skip(1).collect();
            let (target_edge_id, target_percent) = match entry {
                Entry::Source => {
                    path_queue.push_back(target_edge.target_node_id.clone());
                    (target_edge.id.clone(), percent)
                }
                Entry::Target => {
                    let reverse = graph
                        .reverse_of(target_edge)
                        .ok_or(CommandRejected::NoRoute(unit.id))?;
                    path_queue.push_back(reverse.target_node_id.clone());
                    (reverse.id.clone(), 1.0 - percent)
                }
            };

            Ok(RoutePlan {
                edge_id,
                distance_on_edge,
                path_queue,
                target_edge_id,
                target_percent,
                cost: best.cost,
            })
        }
    }
}

/// Apply a move order on behalf of `player`
///
/// Ownership is checked before anything changes. With a valid `split_count`
/// the detached soldiers form a new unit that takes the order while the rest
/// of the stack stays where it is. Returns the new unit's id when a split
/// happened.
pub fn process_move_order(
    world: &mut World,
    player: &FactionId,
    order: &MoveOrder,
) -> Result<Option<UnitId>, CommandRejected> {
    let idx = world
        .units
        .iter()
        .position(|u| u.id == order.unit_id && u.is_alive())
        .ok_or(CommandRejected::UnitNotFound(order.unit_id))?;

    if &world.units[idx].owner_id != player {
        return Err(CommandRejected::NotUnitOwner {
            unit: order.unit_id,
            player: player.clone(),
        });
    }

    let plan = plan_route(
        &world.graph,
        &world.units[idx],
        &order.target,
        world.config.snap_step,
    )?;

    let detached = match order.split_count {
        Some(soldiers) if soldiers > 0 && soldiers < world.units[idx].count => {
            let new_id = world.next_unit_id();
            world.units[idx].split_off(soldiers, new_id)
        }
        _ => None,
    };

    match detached {
        Some(mut child) => {
            plan.apply(&mut child);
            if world.factions.is_ai(player) {
                let (min, max) = (world.config.ai_decision_min_ms, world.config.ai_decision_max_ms);
                child.next_decision_at = Some(world.schedule_after(min, max));
            }
            let child_id = child.id;
            debug!(
                unit = %order.unit_id,
                child = %child_id,
                kept = world.units[idx].count,
                moved = child.count,
                cost = plan.cost,
                "Split order"
            );
            world.units.push(child);
            Ok(Some(child_id))
        }
        None => {
            plan.apply(&mut world.units[idx]);
            debug!(
                unit = %order.unit_id,
                edge = %plan.edge_id,
                cost = plan.cost,
                "Move order"
            );
            Ok(None)
        }
    }
}
