//! Bounded queue between connection tasks and the tick loop

use tokio::sync::mpsc::{self, error::TryRecvError, error::TrySendError};
use tracing::warn;

use crate::simulation::commands::QueuedCommand;

/// Producer half, cloned into every connection task
#[derive(Debug, Clone)]
pub struct CommandSender {
    tx: mpsc::Sender<QueuedCommand>,
}

impl CommandSender {
    /// Queue a command without waiting; a full or closed queue drops it
    pub fn submit(&self, command: QueuedCommand) -> bool {
        match self.tx.try_send(command) {
            Ok(()) => true,
            Err(TrySendError::Full(dropped)) => {
                warn!(player = %dropped.player, "Command queue full, dropping command");
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }
}

/// Consumer half, owned by the game loop
#[derive(Debug)]
pub struct CommandQueue {
    rx: mpsc::Receiver<QueuedCommand>,
}

impl CommandQueue {
    /// Everything queued so far, oldest first
    pub fn drain(&mut self) -> Vec<QueuedCommand> {
        let mut commands = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(command) => commands.push(command),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        commands
    }
}

pub fn command_channel(capacity: usize) -> (CommandSender, CommandQueue) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (CommandSender { tx }, CommandQueue { rx })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{FactionId, NodeId};
    use crate::protocol::{ClientMessage, UpgradeNodePayload};

    fn command(node: &str) -> QueuedCommand {
        QueuedCommand::new(
            FactionId::new("player-1"),
            ClientMessage::UpgradeNode(UpgradeNodePayload { node_id: NodeId::new(node) }),
        )
    }

    #[test]
    fn test_drain_keeps_arrival_order() {
        let (tx, mut queue) = command_channel(8);
        assert!(tx.submit(command("a")));
        assert!(tx.submit(command("b")));

        let drained = queue.drain();
        assert_eq!(drained, vec![command("a"), command("b")]);
        assert!(queue.drain().is_empty());
    }

    #[test]
    fn test_full_queue_drops() {
        let (tx, mut queue) = command_channel(1);
        assert!(tx.submit(command("a")));
        assert!(!tx.submit(command("b")));
        assert_eq!(queue.drain().len(), 1);
    }
}
