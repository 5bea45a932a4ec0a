//! Game configuration with documented constants
//!
//! All magic numbers are collected here with explanations of their purpose
//! and how they interact with each other. Every field can be overridden from a
//! TOML file; missing keys fall back to the defaults below.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{Result, RoadwarError};
use crate::core::types::{FactionId, NodeId};

/// How a unit takes ownership of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapturePolicy {
    /// Passing within `capture_radius` of a node captures it
    #[default]
    DriveBy,
    /// Only standing exactly on the node captures it
    Arrival,
}

/// Configuration for the server and all simulation systems
///
/// These values are tuned together. A unit moves `unit_base_speed *
/// tick_interval_ms / 1000` pixels per tick (6 px at defaults), which is why
/// `capture_radius` is twice that: a drive-by capture cannot be skipped over.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    // === TIMERS ===
    /// Authoritative tick period (ms)
    pub tick_interval_ms: u64,
    /// Resource accrual period (ms)
    pub resource_interval_ms: u64,
    /// Recruitment period (ms)
    pub recruitment_interval_ms: u64,
    /// AI spending period (ms)
    pub ai_economy_interval_ms: u64,
    /// Autosave period (ms)
    pub autosave_interval_ms: u64,
    /// Commands buffered between two ticks before senders are back-pressured
    pub command_queue_capacity: usize,

    // === FACTIONS & MAP ===
    /// Faction controlled by connected clients
    pub human_player_id: FactionId,
    /// Spawn bases: the first is the human's, the rest go to AI factions.
    /// Empty means "use the first nodes of the map".
    pub base_node_ids: Vec<NodeId>,
    /// Upper bound on AI factions created at bootstrap
    pub max_ai_factions: usize,
    /// Seed for the world RNG (AI timers, yields, unit ids)
    pub seed: u64,

    // === UNITS ===
    /// Pixels per second for a standard unit
    pub unit_base_speed: f64,
    /// HP carried by one soldier; `count = ceil(hp / hp_per_soldier)`
    pub hp_per_soldier: f64,
    /// Soldiers in each starting stack
    pub starting_squad_size: u32,
    /// Maximum live units per faction (build and recruitment spawn only)
    pub unit_cap: usize,

    // === COMBAT ===
    /// Proximity at which hostile units engage (px)
    pub combat_radius: f64,
    /// Damage per second dealt by one soldier
    pub base_dps: f64,
    /// Damage discount per fortification level for a defender on its own node
    pub fortification_discount_per_level: f64,
    /// Cap on the fortification discount
    pub max_fortification_discount: f64,

    // === CONQUEST ===
    pub capture_policy: CapturePolicy,
    /// Drive-by capture tolerance around a node (px)
    pub capture_radius: f64,

    // === STACKING ===
    /// Friendly units closer than this merge into one stack (px)
    pub merge_threshold: f64,

    // === ORDERS ===
    /// Stop points snap to multiples of this fraction of an edge
    pub snap_step: f64,

    // === ECONOMY ===
    /// Manpower ceiling per faction
    pub manpower_cap: f64,
    /// Range for randomised per-node gold yield at bootstrap
    pub yield_gold_min: f64,
    pub yield_gold_max: f64,
    /// Range for randomised per-node manpower yield at bootstrap
    pub yield_manpower_min: f64,
    pub yield_manpower_max: f64,
    /// Soldiers added per recruitment per owned node
    pub recruit_batch: u32,
    /// Manpower spent per recruitment
    pub recruit_manpower_cost: f64,
    /// A friendly unit this close to a node counts as its garrison (px)
    pub recruit_garrison_radius: f64,
    /// Soldiers in a built unit
    pub build_unit_size: u32,
    pub build_cost_gold: f64,
    pub build_cost_manpower: f64,
    /// Gold for the next fortification level is `upgrade_cost_gold * (level + 1)`
    pub upgrade_cost_gold: f64,
    pub max_fortification: u32,

    // === AI ===
    /// Bounds of the randomised delay between two decisions of one unit (ms)
    pub ai_decision_min_ms: u64,
    pub ai_decision_max_ms: u64,
    /// Units below this hp ratio rest instead of moving
    pub ai_low_hp_ratio: f64,
    pub ai_rest_ms: u64,
    /// Chance that a healthy unit stays put on a decision tick
    pub ai_garrison_chance: f64,
    pub ai_garrison_min_ms: u64,
    pub ai_garrison_max_ms: u64,
    /// Expansionist stacks larger than this split in half
    pub ai_split_threshold: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 100,
            resource_interval_ms: 1_000,
            recruitment_interval_ms: 60_000,
            ai_economy_interval_ms: 5_000,
            autosave_interval_ms: 30_000,
            command_queue_capacity: 1024,

            human_player_id: FactionId::new("player-1"),
            base_node_ids: Vec::new(),
            max_ai_factions: 4,
            seed: 0x5EED,

            unit_base_speed: 60.0,
            hp_per_soldier: 100.0,
            starting_squad_size: 10,
            unit_cap: 30,

            combat_radius: 50.0,
            base_dps: 25.0,
            fortification_discount_per_level: 0.10,
            max_fortification_discount: 0.50,

            capture_policy: CapturePolicy::DriveBy,
            capture_radius: 12.0,

            merge_threshold: 20.0,

            snap_step: 0.05,

            manpower_cap: 1_000.0,
            yield_gold_min: 1.0,
            yield_gold_max: 5.0,
            yield_manpower_min: 1.0,
            yield_manpower_max: 3.0,
            recruit_batch: 1,
            recruit_manpower_cost: 10.0,
            recruit_garrison_radius: 5.0,
            build_unit_size: 5,
            build_cost_gold: 50.0,
            build_cost_manpower: 25.0,
            upgrade_cost_gold: 100.0,
            max_fortification: 5,

            ai_decision_min_ms: 8_000,
            ai_decision_max_ms: 12_000,
            ai_low_hp_ratio: 0.5,
            ai_rest_ms: 30_000,
            ai_garrison_chance: 0.2,
            ai_garrison_min_ms: 10_000,
            ai_garrison_max_ms: 30_000,
            ai_split_threshold: 20,
        }
    }
}

impl GameConfig {
    /// Load a config from a TOML file and validate it
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: GameConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        let fail = |msg: String| Err(RoadwarError::InvalidConfig(msg));

        if self.tick_interval_ms == 0 {
            return fail("tick_interval_ms must be positive".into());
        }
        if self.combat_radius <= 0.0 || self.hp_per_soldier <= 0.0 {
            return fail("combat_radius and hp_per_soldier must be positive".into());
        }
        if !(self.snap_step > 0.0 && self.snap_step <= 1.0) {
            return fail(format!("snap_step ({}) must be in (0, 1]", self.snap_step));
        }
        if self.ai_decision_min_ms > self.ai_decision_max_ms {
            return fail(format!(
                "ai_decision_min_ms ({}) should be <= ai_decision_max_ms ({})",
                self.ai_decision_min_ms, self.ai_decision_max_ms
            ));
        }
        if self.ai_garrison_min_ms > self.ai_garrison_max_ms {
            return fail(format!(
                "ai_garrison_min_ms ({}) should be <= ai_garrison_max_ms ({})",
                self.ai_garrison_min_ms, self.ai_garrison_max_ms
            ));
        }
        if self.yield_gold_min > self.yield_gold_max
            || self.yield_manpower_min > self.yield_manpower_max
        {
            return fail("yield minimums must not exceed maximums".into());
        }
        if !(0.0..=1.0).contains(&self.max_fortification_discount)
            || self.fortification_discount_per_level < 0.0
        {
            return fail("fortification discounts must be within [0, 1]".into());
        }
        if !(0.0..=1.0).contains(&self.ai_garrison_chance) {
            return fail("ai_garrison_chance must be a probability".into());
        }
        if self.command_queue_capacity == 0 {
            return fail("command_queue_capacity must be positive".into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(GameConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = GameConfig::from_toml(
            r#"
            base_dps = 10.0
            capture_policy = "arrival"
            base_node_ids = ["a", "b"]
            "#,
        )
        .unwrap();
        assert_eq!(config.base_dps, 10.0);
        assert_eq!(config.capture_policy, CapturePolicy::Arrival);
        assert_eq!(config.base_node_ids, vec![NodeId::new("a"), NodeId::new("b")]);
        assert_eq!(config.hp_per_soldier, 100.0);
    }

    #[test]
    fn test_inverted_decision_window_rejected() {
        let config = GameConfig {
            ai_decision_min_ms: 5_000,
            ai_decision_max_ms: 1_000,
            ..GameConfig::default()
        };
        assert!(matches!(config.validate(), Err(RoadwarError::InvalidConfig(_))));
    }

    #[test]
    fn test_bad_snap_step_rejected() {
        let config = GameConfig { snap_step: 0.0, ..GameConfig::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_sample_config_loads() {
        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("config/roadwar.toml");
        let config = GameConfig::load(&path).unwrap();
        assert_eq!(config.max_ai_factions, 3);
        assert_eq!(config.base_node_ids.len(), 4);
        assert_eq!(config.capture_policy, CapturePolicy::DriveBy);
    }
}
