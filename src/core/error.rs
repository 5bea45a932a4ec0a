use thiserror::Error;

use crate::core::types::{EdgeId, FactionId, NodeId, UnitId};

#[derive(Error, Debug)]
pub enum RoadwarError {
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Invalid map: {0}")]
    InvalidMap(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    TomlError(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, RoadwarError>;

/// Why a client or AI command was refused; logged, never fatal
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommandRejected {
    #[error("unit {0} not found")]
    UnitNotFound(UnitId),

    #[error("{player} does not own unit {unit}")]
    NotUnitOwner { unit: UnitId, player: FactionId },

    #[error("{player} does not own node {node}")]
    NotNodeOwner { node: NodeId, player: FactionId },

    #[error("node {0} not found")]
    NodeNotFound(NodeId),

    #[error("edge {0} not found")]
    EdgeNotFound(EdgeId),

    #[error("move order has no destination")]
    MissingDestination,

    #[error("no route for unit {0}")]
    NoRoute(UnitId),

    #[error("not enough resources: need {gold} gold and {manpower} manpower")]
    InsufficientResources { gold: f64, manpower: f64 },

    #[error("{0} has reached the unit cap")]
    UnitCapReached(FactionId),

    #[error("node {0} is already fully fortified")]
    MaxFortification(NodeId),

    #[error("unknown unit type {0:?}")]
    UnknownUnitType(String),
}
