//! Game loop - the task that owns the world
//!
//! One `select!` multiplexes the tick and the slower periodic jobs. Each arm
//! runs to completion before the next, so the world is never shared.

use std::future::Future;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::sync::broadcast;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::persistence::StateManager;
use crate::simulation::ai::process_ai_economy;
use crate::simulation::economy::{accrue_resources, process_recruitment};
use crate::simulation::tick::{run_tick, TickReport};
use crate::world::World;

use super::command_queue::CommandQueue;

/// Milliseconds since the Unix epoch
pub fn wall_clock_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Periodic timer that first fires one period from now
fn periodic(ms: u64) -> tokio::time::Interval {
    let period = Duration::from_millis(ms.max(1));
    let mut timer = interval_at(Instant::now() + period, period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    timer
}

pub struct GameServer {
    world: World,
    queue: CommandQueue,
    outbound: broadcast::Sender<String>,
    state: StateManager,
}

impl GameServer {
    pub fn new(
        world: World,
        queue: CommandQueue,
        outbound: broadcast::Sender<String>,
        state: StateManager,
    ) -> Self {
        Self {
            world,
            queue,
            outbound,
            state,
        }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    /// Run one tick on the queued commands and broadcast the results
    pub fn tick(&mut self, dt: f64, now: u64) -> TickReport {
        let commands = self.queue.drain();
        let report = run_tick(&mut self.world, commands, dt, now);
        if !report.removed.is_empty() {
            debug!(removed = report.removed.len(), units = self.world.units.len(), "Units removed");
        }
        self.broadcast(&report);
        report
    }

    fn broadcast(&self, report: &TickReport) {
        if self.outbound.receiver_count() == 0 {
            return;
        }
        for message in report.messages(&self.world) {
            match message.to_json() {
                Ok(frame) => {
                    // Only fails when every client has gone
                    let _ = self.outbound.send(frame);
                }
                Err(e) => warn!("Failed to encode outbound message: {}", e),
            }
        }
    }

    pub fn save(&self) -> bool {
        self.state.save_world(&self.world, wall_clock_ms())
    }

    /// Run until `shutdown` resolves, then save once
    pub async fn run(mut self, shutdown: impl Future<Output = ()>) -> World {
        let cfg = self.world.config.clone();
        let mut tick = periodic(cfg.tick_interval_ms);
        let mut resources = periodic(cfg.resource_interval_ms);
        let mut ai_economy = periodic(cfg.ai_economy_interval_ms);
        let mut autosave = periodic(cfg.autosave_interval_ms);
        let mut recruitment = periodic(cfg.recruitment_interval_ms);
        let mut last_tick = Instant::now();

        tokio::pin!(shutdown);
        info!(tick_ms = cfg.tick_interval_ms, "Game loop started");

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    let now = Instant::now();
                    let dt = now.duration_since(last_tick).as_secs_f64();
                    last_tick = now;
                    self.tick(dt, wall_clock_ms());
                }
                _ = resources.tick() => accrue_resources(&mut self.world),
                _ = ai_economy.tick() => process_ai_economy(&mut self.world),
                _ = autosave.tick() => {
                    self.save();
                }
                _ = recruitment.tick() => {
                    process_recruitment(&mut self.world);
                }
                _ = &mut shutdown => {
                    info!("Shutdown requested, saving");
                    self.save();
                    break;
                }
            }
        }

        self.world
    }
}
