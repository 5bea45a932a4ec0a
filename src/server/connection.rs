//! WebSocket transport
//!
//! Each client gets its own task: text frames in become queued commands,
//! broadcast frames out are forwarded as they come.

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

use crate::core::types::FactionId;
use crate::protocol::ClientMessage;
use crate::simulation::commands::QueuedCommand;

use super::command_queue::CommandSender;

/// Accept clients forever; every client commands `player`
pub async fn accept_loop(
    listener: TcpListener,
    player: FactionId,
    commands: CommandSender,
    outbound: broadcast::Sender<String>,
) {
    loop {
        let (stream, addr) = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                warn!("Failed to accept connection: {}", e);
                continue;
            }
        };
        info!(%addr, "Client connected");
        let player = player.clone();
        let commands = commands.clone();
        let updates = outbound.subscribe();
        tokio::spawn(async move {
            handle_connection(stream, player, commands, updates).await;
            info!(%addr, "Client disconnected");
        });
    }
}

async fn handle_connection(
    stream: TcpStream,
    player: FactionId,
    commands: CommandSender,
    mut updates: broadcast::Receiver<String>,
) {
    let ws_stream = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            error!("WebSocket handshake failed: {}", e);
            return;
        }
    };
    let (mut write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            incoming = read.next() => {
                let text = match incoming {
                    Some(Ok(Message::Text(text))) => text,
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        debug!("WebSocket read error: {}", e);
                        break;
                    }
                };
                match ClientMessage::from_json(&text) {
                    Ok(message) => {
                        commands.submit(QueuedCommand::new(player.clone(), message));
                    }
                    Err(e) => warn!(player = %player, "Unreadable client message: {}", e),
                }
            }
            update = updates.recv() => {
                match update {
                    Ok(frame) => {
                        if write.send(Message::Text(frame)).await.is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(skipped, "Client fell behind, skipping frames");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }
    }
}
