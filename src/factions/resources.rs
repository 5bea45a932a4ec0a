//! Per-faction treasury

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::types::FactionId;
use crate::map::graph::ResourceYield;

/// Gold and manpower held by one faction
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerResources {
    pub gold: f64,
    pub manpower: f64,
}

impl PlayerResources {
    pub fn new(gold: f64, manpower: f64) -> Self {
        Self { gold, manpower }
    }

    /// Add one payout; manpower stops at `manpower_cap`
    pub fn add_yield(&mut self, income: &ResourceYield, manpower_cap: f64) {
        self.gold += income.gold;
        self.manpower = (self.manpower + income.manpower).min(manpower_cap);
    }

    pub fn can_afford(&self, gold: f64, manpower: f64) -> bool {
        self.gold >= gold && self.manpower >= manpower
    }

    /// Deduct a cost if affordable
    pub fn try_spend(&mut self, gold: f64, manpower: f64) -> bool {
        if !self.can_afford(gold, manpower) {
            return false;
        }
        self.gold -= gold;
        self.manpower -= manpower;
        true
    }
}

/// Treasuries keyed by faction, in stable id order
pub type ResourceLedger = BTreeMap<FactionId, PlayerResources>;
