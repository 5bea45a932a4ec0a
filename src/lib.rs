//! Roadwar - authoritative server for a road-graph conquest wargame

pub mod core;
pub mod factions;
pub mod map;
pub mod persistence;
pub mod protocol;
pub mod server;
pub mod simulation;
pub mod spatial;
pub mod units;
pub mod world;
