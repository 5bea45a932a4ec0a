//! Factions and AI personalities
//!
//! Every ownership tag is registered here with its kind. AI factions receive a
//! personality when they are registered; nothing is inferred from the id text.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::types::FactionId;

/// Who drives a faction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FactionKind {
    Human,
    Ai,
}

/// Which nodes an AI unit looks at when picking a destination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    /// Nobody owns it
    Unowned,
    /// Another faction owns it
    Enemy,
    /// Own node other than the one the unit stands at
    Own,
}

/// Strategic temperament of an AI faction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Personality {
    /// Hunts enemy provinces
    Aggressive,
    /// Grabs neutral land and spreads out
    Expansionist,
    /// Reinforces and fortifies what it holds
    Defensive,
}

impl Personality {
    const ROTATION: [Personality; 3] = [
        Personality::Aggressive,
        Personality::Expansionist,
        Personality::Defensive,
    ];

    /// Personality of the n-th AI faction
    pub fn for_index(index: usize) -> Self {
        Self::ROTATION[index % Self::ROTATION.len()]
    }

    /// Target classes in order of preference
    pub fn target_preferences(&self) -> [TargetKind; 2] {
        match self {
            Self::Expansionist => [TargetKind::Unowned, TargetKind::Enemy],
            Self::Aggressive => [TargetKind::Enemy, TargetKind::Unowned],
            Self::Defensive => [TargetKind::Own, TargetKind::Unowned],
        }
    }

    /// Spends on walls before soldiers
    pub fn prefers_fortification(&self) -> bool {
        matches!(self, Self::Defensive | Self::Expansionist)
    }

    /// Splits big stacks to cover two targets at once
    pub fn splits_large_stacks(&self) -> bool {
        matches!(self, Self::Expansionist)
    }
}

/// Registry entry for one faction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactionRecord {
    pub id: FactionId,
    pub kind: FactionKind,
    #[serde(default)]
    pub personality: Option<Personality>,
}

/// All factions known to the world
#[derive(Debug, Clone, Default)]
pub struct FactionRegistry {
    factions: BTreeMap<FactionId, FactionRecord>,
    ai_count: usize,
}

impl FactionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from saved records
    pub fn from_records(records: impl IntoIterator<Item = FactionRecord>) -> Self {
        let mut registry = Self::new();
        for record in records {
            if record.kind == FactionKind::Ai {
                registry.ai_count += 1;
            }
            registry.factions.insert(record.id.clone(), record);
        }
        registry
    }

    pub fn register_human(&mut self, id: FactionId) {
        self.factions.insert(
            id.clone(),
            FactionRecord {
                id,
                kind: FactionKind::Human,
                personality: None,
            },
        );
    }

    /// Register the next AI faction and return its id
    pub fn register_ai(&mut self) -> FactionId {
        let index = self.ai_count;
        let id = FactionId::ai(index);
        self.register_ai_as(id.clone(), Personality::for_index(index));
        id
    }

    pub fn register_ai_as(&mut self, id: FactionId, personality: Personality) {
        self.ai_count += 1;
        self.factions.insert(
            id.clone(),
            FactionRecord {
                id,
                kind: FactionKind::Ai,
                personality: Some(personality),
            },
        );
    }

    /// Make sure an owner seen in restored data is registered; unknown
    /// owners other than `human` become AI factions
    pub fn ensure_known(&mut self, id: &FactionId, human: &FactionId) {
        if self.factions.contains_key(id) {
            return;
        }
        if id == human {
            self.register_human(id.clone());
        } else {
            let personality = Personality::for_index(self.ai_count);
            self.register_ai_as(id.clone(), personality);
        }
    }

    pub fn get(&self, id: &FactionId) -> Option<&FactionRecord> {
        self.factions.get(id)
    }

    pub fn personality(&self, id: &FactionId) -> Option<Personality> {
        self.factions.get(id).and_then(|f| f.personality)
    }

    pub fn is_ai(&self, id: &FactionId) -> bool {
        self.factions
            .get(id)
            .is_some_and(|f| f.kind == FactionKind::Ai)
    }

    /// AI factions with their personality, in id order
    pub fn ai_factions(&self) -> impl Iterator<Item = (&FactionId, Personality)> + '_ {
        self.factions
            .values()
            .filter(|f| f.kind == FactionKind::Ai)
            .filter_map(|f| f.personality.map(|p| (&f.id, p)))
    }

    pub fn records(&self) -> impl Iterator<Item = &FactionRecord> + '_ {
        self.factions.values()
    }

    pub fn len(&self) -> usize {
        self.factions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factions.is_empty()
    }
}
