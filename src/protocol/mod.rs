//! Wire protocol

pub mod messages;

pub use messages::{
    BuildUnitPayload, ClientMessage, CombatEventPayload, GameTickPayload, MoveOrderPayload,
    ServerMessage, UnitDeathPayload, UpgradeNodePayload, INFANTRY,
};
