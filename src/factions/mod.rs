//! Factions, personalities and treasuries

pub mod faction;
pub mod resources;

pub use faction::{FactionKind, FactionRecord, FactionRegistry, Personality, TargetKind};
pub use resources::{PlayerResources, ResourceLedger};
