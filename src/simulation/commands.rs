//! Client commands - applying queued player input to the world

use tracing::warn;

use crate::core::error::CommandRejected;
use crate::core::types::FactionId;
use crate::protocol::{ClientMessage, INFANTRY};
use crate::world::World;

use super::economy::{build_unit, upgrade_node};
use super::orders::process_move_order;

/// A command waiting for the next tick, tagged with who sent it
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedCommand {
    pub player: FactionId,
    pub message: ClientMessage,
}

impl QueuedCommand {
    pub fn new(player: FactionId, message: ClientMessage) -> Self {
        Self { player, message }
    }
}

/// Apply one command on behalf of `player`
pub fn apply_command(
    world: &mut World,
    player: &FactionId,
    message: &ClientMessage,
) -> Result<(), CommandRejected> {
    match message {
        ClientMessage::MoveOrder(payload) => {
            let order = payload.to_order()?;
            process_move_order(world, player, &order)?;
        }
        ClientMessage::BuildUnit(payload) => {
            if payload.unit_type != INFANTRY {
                return Err(CommandRejected::UnknownUnitType(payload.unit_type.clone()));
            }
            build_unit(world, player, &payload.node_id)?;
        }
        ClientMessage::UpgradeNode(payload) => {
            upgrade_node(world, player, &payload.node_id)?;
        }
    }
    Ok(())
}

/// Apply queued commands in arrival order; rejections are logged and dropped
pub fn apply_commands(world: &mut World, commands: impl IntoIterator<Item = QueuedCommand>) -> usize {
    let mut applied = 0;
    for command in commands {
        match apply_command(world, &command.player, &command.message) {
            Ok(()) => applied += 1,
            Err(reason) => warn!(player = %command.player, "Command rejected: {}", reason),
        }
    }
    applied
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::GameConfig;
    use crate::core::types::NodeId;
    use crate::factions::PlayerResources;
    use crate::map::graph::{Edge, Node, RoadGraph};
    use crate::protocol::{BuildUnitPayload, UpgradeNodePayload};

    fn world() -> World {
        let mut graph = RoadGraph::from_parts(
            vec![Node::new("a", 0.0, 0.0), Node::new("b", 100.0, 0.0)],
            vec![Edge::new("ab", "a", "b", 100.0)],
        )
        .unwrap();
        graph.node_mut(&NodeId::new("a")).unwrap().owner_id = Some(FactionId::new("p1"));
        let mut world = World::new(GameConfig::default(), graph);
        world
            .players
            .insert(FactionId::new("p1"), PlayerResources::new(500.0, 500.0));
        world
    }

    #[test]
    fn test_unknown_unit_type_rejected() {
        let mut world = world();
        let msg = ClientMessage::BuildUnit(BuildUnitPayload {
            node_id: NodeId::new("a"),
            unit_type: "cavalry".into(),
        });
        assert_eq!(
            apply_command(&mut world, &FactionId::new("p1"), &msg),
            Err(CommandRejected::UnknownUnitType("cavalry".into()))
        );
        assert!(world.units.is_empty());
    }

    #[test]
    fn test_commands_apply_in_order_and_skip_rejections() {
        let mut world = world();
        let p1 = FactionId::new("p1");
        let commands = vec![
            QueuedCommand::new(
                p1.clone(),
                ClientMessage::UpgradeNode(UpgradeNodePayload { node_id: NodeId::new("b") }),
            ),
            QueuedCommand::new(
                p1.clone(),
                ClientMessage::BuildUnit(BuildUnitPayload {
                    node_id: NodeId::new("a"),
                    unit_type: INFANTRY.into(),
                }),
            ),
            QueuedCommand::new(
                p1.clone(),
                ClientMessage::UpgradeNode(UpgradeNodePayload { node_id: NodeId::new("a") }),
            ),
        ];

        assert_eq!(apply_commands(&mut world, commands), 2);
        assert_eq!(world.units.len(), 1);
        assert_eq!(world.graph.node(&NodeId::new("a")).unwrap().fortification_level, 1);
        assert_eq!(world.players[&p1].gold, 500.0 - 50.0 - 100.0);
    }
}
