//! JSON messages exchanged with clients
//!
//! Every frame is `{"type": <NAME>, "payload": {...}}` with camelCase fields.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::error::{CommandRejected, Result};
use crate::core::types::{EdgeId, FactionId, NodeId, UnitId};
use crate::factions::PlayerResources;
use crate::map::graph::Node;
use crate::simulation::combat::CombatPair;
use crate::simulation::orders::{MoveOrder, MoveTarget};
use crate::simulation::segments::MovementSegment;
use crate::units::Unit;

/// The only buildable unit type
pub const INFANTRY: &str = "infantry";

fn default_unit_type() -> String {
    INFANTRY.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveOrderPayload {
    pub unit_id: UnitId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dest_node_id: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_edge_id: Option<EdgeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub split_count: Option<u32>,
}

impl MoveOrderPayload {
    /// An edge point wins over a node when both are given
    pub fn to_order(&self) -> std::result::Result<MoveOrder, CommandRejected> {
        let target = match (&self.target_edge_id, self.target_percent, &self.dest_node_id) {
            (Some(edge), Some(percent), _) => MoveTarget::EdgePoint {
                edge: edge.clone(),
                percent,
            },
            (_, _, Some(node)) => MoveTarget::Node(node.clone()),
            _ => return Err(CommandRejected::MissingDestination),
        };
        Ok(MoveOrder {
            unit_id: self.unit_id,
            target,
            split_count: self.split_count,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildUnitPayload {
    pub node_id: NodeId,
    #[serde(default = "default_unit_type")]
    pub unit_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeNodePayload {
    pub node_id: NodeId,
}

/// Commands a client may send
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ClientMessage {
    #[serde(rename = "C_MOVE_ORDER")]
    MoveOrder(MoveOrderPayload),
    #[serde(rename = "C_BUILD_UNIT")]
    BuildUnit(BuildUnitPayload),
    #[serde(rename = "C_UPGRADE_NODE")]
    UpgradeNode(UpgradeNodePayload),
}

impl ClientMessage {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Full world snapshot sent every tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameTickPayload {
    pub units: Vec<Unit>,
    pub segments: Vec<MovementSegment>,
    pub timestamp: u64,
    pub nodes: Vec<Node>,
    pub players: BTreeMap<FactionId, PlayerResources>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombatEventPayload {
    pub pairs: Vec<CombatPair>,
    pub timestamp: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitDeathPayload {
    pub unit_id: UnitId,
}

/// Messages broadcast to every client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ServerMessage {
    #[serde(rename = "S_GAME_TICK")]
    GameTick(GameTickPayload),
    #[serde(rename = "COMBAT_EVENT")]
    CombatEvent(CombatEventPayload),
    #[serde(rename = "S_UNIT_DEATH")]
    UnitDeath(UnitDeathPayload),
}

impl ServerMessage {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
