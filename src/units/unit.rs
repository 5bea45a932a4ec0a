//! Units - stacks of soldiers sharing one HP pool on one road
//!
//! A unit always occupies exactly one directed edge. `count` follows from
//! `hp`: every `hp_per_soldier` points of HP is one soldier.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::core::config::GameConfig;
use crate::core::types::{EdgeId, FactionId, GameMillis, NodeId, UnitId};

/// What a unit is currently doing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UnitState {
    #[default]
    Idle,
    Moving,
    Combat,
}

/// A stack of soldiers on the road network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Unit {
    pub id: UnitId,
    pub edge_id: EdgeId,
    pub distance_on_edge: f64,
    pub speed: f64,
    /// Nodes still to visit, head first
    #[serde(default)]
    pub path_queue: VecDeque<NodeId>,
    pub hp: f64,
    pub max_hp: f64,
    pub count: u32,
    pub owner_id: FactionId,
    #[serde(default)]
    pub state: UnitState,
    /// Edge carrying the stop point, if the unit should halt mid-road
    #[serde(default)]
    pub target_edge_id: Option<EdgeId>,
    /// Stop point as a fraction of `target_edge_id`
    #[serde(default)]
    pub target_percent: Option<f64>,
    /// Game time of the next AI re-evaluation (AI units only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_decision_at: Option<GameMillis>,
}

impl Unit {
    /// A fresh idle stack of `soldiers` at full health
    pub fn spawn(
        id: UnitId,
        owner: FactionId,
        edge_id: EdgeId,
        distance_on_edge: f64,
        soldiers: u32,
        config: &GameConfig,
    ) -> Self {
        let hp = soldiers as f64 * config.hp_per_soldier;
        Self {
            id,
            edge_id,
            distance_on_edge,
            speed: config.unit_base_speed,
            path_queue: VecDeque::new(),
            hp,
            max_hp: hp,
            count: soldiers,
            owner_id: owner,
            state: UnitState::Idle,
            target_edge_id: None,
            target_percent: None,
            next_decision_at: None,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0.0
    }

    pub fn has_plan(&self) -> bool {
        !self.path_queue.is_empty()
    }

    pub fn is_fighting(&self) -> bool {
        self.state == UnitState::Combat
    }

    pub fn hp_ratio(&self) -> f64 {
        if self.max_hp > 0.0 {
            self.hp / self.max_hp
        } else {
            0.0
        }
    }

    /// Pending stop point as `(edge, fraction)`
    pub fn stop_point(&self) -> Option<(&EdgeId, f64)> {
        match (&self.target_edge_id, self.target_percent) {
            (Some(edge), Some(percent)) => Some((edge, percent)),
            _ => None,
        }
    }

    pub fn set_stop_point(&mut self, edge: EdgeId, percent: f64) {
        self.target_edge_id = Some(edge);
        self.target_percent = Some(percent.clamp(0.0, 1.0));
    }

    /// Recompute soldier count from the HP pool
    pub fn recount(&mut self, hp_per_soldier: f64) {
        self.count = (self.hp / hp_per_soldier).ceil().max(0.0) as u32;
    }

    /// Add fresh soldiers at full health
    pub fn reinforce(&mut self, soldiers: u32, hp_per_soldier: f64) {
        let hp = soldiers as f64 * hp_per_soldier;
        self.count += soldiers;
        self.hp += hp;
        self.max_hp += hp;
    }

    /// Fold `other` into this stack; `other` is left dead
    pub fn absorb(&mut self, other: &mut Unit) {
        self.count += other.count;
        self.hp += other.hp;
        self.max_hp += other.max_hp;
        if other.state == UnitState::Combat {
            self.state = UnitState::Combat;
        }
        other.hp = 0.0;
    }

    /// Detach `soldiers` into a new idle unit at the same spot
    ///
    /// HP and max HP move in proportion to the soldiers taken, so the two
    /// halves together hold exactly what this unit held. Returns `None`
    /// unless `0 < soldiers < count`.
    pub fn split_off(&mut self, soldiers: u32, new_id: UnitId) -> Option<Unit> {
        if soldiers == 0 || soldiers >= self.count {
            return None;
        }

        let share = soldiers as f64 / self.count as f64;
        let moved_hp = self.hp * share;
        let moved_max_hp = self.max_hp * share;

        self.count -= soldiers;
        self.hp -= moved_hp;
        self.max_hp -= moved_max_hp;

        Some(Unit {
            id: new_id,
            edge_id: self.edge_id.clone(),
            distance_on_edge: self.distance_on_edge,
            speed: self.speed,
            path_queue: VecDeque::new(),
            hp: moved_hp,
            max_hp: moved_max_hp,
            count: soldiers,
            owner_id: self.owner_id.clone(),
            state: UnitState::Idle,
            target_edge_id: None,
            target_percent: None,
            next_decision_at: None,
        })
    }
}
