//! Snapshot save/restore
//!
//! Saves go to `<path>.tmp` first and are renamed over `<path>`, so a crash
//! mid-write leaves the previous save intact.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core::error::Result;
use crate::core::types::{FactionId, GameMillis};
use crate::factions::{FactionRecord, PlayerResources};
use crate::map::graph::Node;
use crate::units::Unit;
use crate::world::World;

/// Everything needed to resume a game on the same map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    /// Wall-clock time of the save (ms since epoch)
    pub timestamp: u64,
    pub units: Vec<Unit>,
    pub nodes: Vec<Node>,
    /// Treasuries as `[ownerId, {gold, manpower}]` pairs
    pub players: Vec<(FactionId, PlayerResources)>,
    #[serde(default)]
    pub factions: Vec<FactionRecord>,
    #[serde(default)]
    pub clock_ms: GameMillis,
}

impl PersistedState {
    pub fn capture(world: &World, timestamp: u64) -> Self {
        Self {
            timestamp,
            units: world.units.clone(),
            nodes: world.graph.nodes().to_vec(),
            players: world
                .players
                .iter()
                .map(|(id, res)| (id.clone(), *res))
                .collect(),
            factions: world.factions.records().cloned().collect(),
            clock_ms: world.clock_ms,
        }
    }
}

/// Reads and writes the save file at one well-known path
#[derive(Debug, Clone)]
pub struct StateManager {
    path: PathBuf,
}

impl StateManager {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".tmp");
        PathBuf::from(name)
    }

    /// Write a snapshot atomically
    pub fn save(&self, state: &PersistedState) -> Result<()> {
        let json = serde_json::to_string_pretty(state)?;
        let temp = self.temp_path();
        fs::write(&temp, json)?;
        fs::rename(&temp, &self.path)?;
        info!(
            path = %self.path.display(),
            units = state.units.len(),
            "Game saved"
        );
        Ok(())
    }

    /// Capture and save `world`, logging instead of failing
    pub fn save_world(&self, world: &World, timestamp: u64) -> bool {
        match self.save(&PersistedState::capture(world, timestamp)) {
            Ok(()) => true,
            Err(e) => {
                warn!(path = %self.path.display(), "Failed to save game state: {}", e);
                false
            }
        }
    }

    /// The saved snapshot, or `None` when there is no usable save
    pub fn load(&self) -> Option<PersistedState> {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(_) => {
                info!(path = %self.path.display(), "No save file found, starting new game");
                return None;
            }
        };

        match serde_json::from_str::<PersistedState>(&data) {
            Ok(state) => {
                info!(
                    path = %self.path.display(),
                    units = state.units.len(),
                    "Game loaded"
                );
                Some(state)
            }
            Err(e) => {
                warn!(path = %self.path.display(), "Save file unreadable ({}), starting new game", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_state() -> PersistedState {
        PersistedState {
            timestamp: 1_700_000_000_000,
            units: Vec::new(),
            nodes: vec![Node::new("a", 1.0, 2.0)],
            players: vec![(FactionId::new("player-1"), PlayerResources::new(12.0, 3.0))],
            factions: Vec::new(),
            clock_ms: 4_200,
        }
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let manager = StateManager::new(dir.path().join("savegame.json"));
        let state = sample_state();

        manager.save(&state).unwrap();
        assert!(!manager.temp_path().exists());
        assert_eq!(manager.load(), Some(state));
    }

    #[test]
    fn test_players_written_as_pairs() {
        let json = serde_json::to_value(sample_state()).unwrap();
        assert_eq!(json["players"][0][0], "player-1");
        assert_eq!(json["players"][0][1]["gold"], 12.0);
    }

    #[test]
    fn test_missing_file_is_no_save() {
        let dir = tempfile::tempdir().unwrap();
        let manager = StateManager::new(dir.path().join("absent.json"));
        assert_eq!(manager.load(), None);
    }

    #[test]
    fn test_corrupt_file_is_no_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("savegame.json");
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(StateManager::new(path).load(), None);
    }

    #[test]
    fn test_failed_save_reports_error() {
        let dir = tempfile::tempdir().unwrap();
        let manager = StateManager::new(dir.path().join("missing-dir").join("save.json"));
        assert!(manager.save(&sample_state()).is_err());
    }
}
