//! Persistence - JSON snapshots of the mutable world state

pub mod state_manager;

pub use state_manager::{PersistedState, StateManager};
