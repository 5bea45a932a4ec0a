//! Tick system - orchestrates one simulation step
//!
//! Order within a tick:
//! commands -> movement -> conquest -> stacking -> AI -> combat -> damage -> purge -> segments
//!
//! Every system works on the same `World`, one after another.

use tracing::debug;

use crate::core::types::UnitId;
use crate::protocol::{CombatEventPayload, GameTickPayload, ServerMessage, UnitDeathPayload};
use crate::world::World;

use super::ai::process_ai_decisions;
use super::combat::{detect_proximity, CombatPair};
use super::commands::{apply_commands, QueuedCommand};
use super::conquest::{process_conquest, Capture};
use super::damage::process_combat;
use super::movement::update_unit_position;
use super::segments::{build_segments, MovementSegment};
use super::stacking::process_stacking;

/// What happened during one tick
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    /// Wall-clock time the tick is stamped with
    pub timestamp: u64,
    pub commands_applied: usize,
    pub captures: Vec<Capture>,
    /// Pairs still fighting after damage, both sides alive
    pub combat_pairs: Vec<CombatPair>,
    /// Units removed this tick, killed or absorbed
    pub removed: Vec<UnitId>,
    pub ai_decisions: usize,
    pub segments: Vec<MovementSegment>,
}

impl TickReport {
    /// Outbound frames for this tick: snapshot, then combat, then deaths
    pub fn messages(&self, world: &World) -> Vec<ServerMessage> {
        let mut messages = Vec::with_capacity(2 + self.removed.len());
        messages.push(ServerMessage::GameTick(GameTickPayload {
            units: world.units.clone(),
            segments: self.segments.clone(),
            timestamp: self.timestamp,
            nodes: world.graph.nodes().to_vec(),
            players: world.players.clone(),
        }));
        if !self.combat_pairs.is_empty() {
            messages.push(ServerMessage::CombatEvent(CombatEventPayload {
                pairs: self.combat_pairs.clone(),
                timestamp: self.timestamp,
            }));
        }
        messages.extend(
            self.removed
                .iter()
                .map(|&unit_id| ServerMessage::UnitDeath(UnitDeathPayload { unit_id })),
        );
        messages
    }
}

/// Advance the world by `dt` seconds, stamped with wall-clock `now`
pub fn run_tick(
    world: &mut World,
    commands: impl IntoIterator<Item = QueuedCommand>,
    dt: f64,
    now: u64,
) -> TickReport {
    let mut report = TickReport {
        timestamp: now,
        ..TickReport::default()
    };

    world.advance_clock(dt);
    report.commands_applied = apply_commands(world, commands);

    for unit in world.units.iter_mut() {
        update_unit_position(&world.graph, unit, dt);
    }

    report.captures = process_conquest(&mut world.graph, &world.config, &world.units);

    let absorbed = process_stacking(&world.graph, &mut world.units, world.config.merge_threshold);
    if !absorbed.is_empty() {
        debug!(count = absorbed.len(), "Stacks absorbed");
    }

    report.ai_decisions = process_ai_decisions(world);

    let pairs = detect_proximity(&world.graph, &world.units, world.config.combat_radius);
    process_combat(&world.graph, &world.config, &mut world.units, &pairs, dt);

    report.combat_pairs = pairs
        .into_iter()
        .filter(|p| {
            let alive = |id| world.unit(id).is_some_and(|u| u.is_alive());
            alive(p.a_id) && alive(p.b_id)
        })
        .collect();

    report.removed = world
        .units
        .iter()
        .filter(|u| !u.is_alive())
        .map(|u| u.id)
        .collect();
    world.units.retain(|u| u.is_alive());

    report.segments = build_segments(&world.graph, &world.units, now);
    report
}
