//! Server runtime: command intake, transport and the timed game loop

pub mod command_queue;
pub mod connection;
pub mod game_loop;

pub use command_queue::{command_channel, CommandQueue, CommandSender};
pub use connection::accept_loop;
pub use game_loop::{wall_clock_ms, GameServer};
