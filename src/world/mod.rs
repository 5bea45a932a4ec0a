//! World - the single aggregate every system reads and mutates
//!
//! The tick loop owns one `World` and lends it to each system in turn, so all
//! mutation is serialised through `&mut World`.

pub mod bootstrap;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::core::config::GameConfig;
use crate::core::types::{FactionId, GameMillis, NodeId, UnitId};
use crate::factions::{FactionRegistry, PlayerResources, ResourceLedger};
use crate::map::graph::RoadGraph;
use crate::units::Unit;

pub use bootstrap::{new_game, restore_game};

/// The game world containing the map, all units and all treasuries
#[derive(Debug, Clone)]
pub struct World {
    pub config: GameConfig,
    pub graph: RoadGraph,
    pub units: Vec<Unit>,
    pub players: ResourceLedger,
    pub factions: FactionRegistry,
    /// Game time in milliseconds, advanced by each tick's `dt`
    pub clock_ms: GameMillis,
    pub rng: ChaCha8Rng,
}

impl World {
    /// An empty world on `graph`; see `bootstrap` for a playable one
    pub fn new(config: GameConfig, graph: RoadGraph) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Self {
            config,
            graph,
            units: Vec::new(),
            players: ResourceLedger::new(),
            factions: FactionRegistry::new(),
            clock_ms: 0,
            rng,
        }
    }

    pub fn next_unit_id(&mut self) -> UnitId {
        UnitId::from_rng(&mut self.rng)
    }

    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.iter().find(|u| u.id == id)
    }

    pub fn unit_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.units.iter_mut().find(|u| u.id == id)
    }

    /// Live units owned by `faction`
    pub fn unit_count_for(&self, faction: &FactionId) -> usize {
        self.units
            .iter()
            .filter(|u| u.is_alive() && &u.owner_id == faction)
            .count()
    }

    pub fn below_unit_cap(&self, faction: &FactionId) -> bool {
        self.unit_count_for(faction) < self.config.unit_cap
    }

    pub fn resources(&self, faction: &FactionId) -> Option<&PlayerResources> {
        self.players.get(faction)
    }

    /// True when `faction` holds at least this much; a missing treasury holds nothing
    pub fn can_afford(&self, faction: &FactionId, gold: f64, manpower: f64) -> bool {
        self.resources(faction)
            .is_some_and(|r| r.can_afford(gold, manpower))
    }

    /// Treasury of `faction`, created empty on first use
    pub fn resources_mut(&mut self, faction: &FactionId) -> &mut PlayerResources {
        self.players.entry(faction.clone()).or_default()
    }

    pub fn advance_clock(&mut self, dt_secs: f64) {
        self.clock_ms += (dt_secs * 1000.0).round().max(0.0) as GameMillis;
    }

    /// Decision time for a new AI unit, spread over one full interval so
    /// stacks spawned together do not all move on the same tick
    pub fn staggered_decision_time(&mut self) -> GameMillis {
        self.clock_ms + self.rng.gen_range(0..self.config.ai_decision_max_ms.max(1))
    }

    /// Clock plus a uniform delay in `[min_ms, max_ms]`
    pub fn schedule_after(&mut self, min_ms: u64, max_ms: u64) -> GameMillis {
        self.clock_ms + self.rng.gen_range(min_ms..=max_ms.max(min_ms))
    }

    /// Place a new idle stack of `soldiers` at `node`
    pub fn spawn_unit_at_node(
        &mut self,
        owner: &FactionId,
        node: &NodeId,
        soldiers: u32,
    ) -> Option<UnitId> {
        let (edge_id, distance) = self.graph.spawn_point(node)?;
        let id = self.next_unit_id();
        let mut unit = Unit::spawn(id, owner.clone(), edge_id, distance, soldiers, &self.config);
        if self.factions.is_ai(owner) {
            unit.next_decision_at = Some(self.staggered_decision_time());
        }
        self.units.push(unit);
        Some(id)
    }
}
