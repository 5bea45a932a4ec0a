//! Simulation systems, run in a fixed order by `tick`

pub mod ai;
pub mod combat;
pub mod commands;
pub mod conquest;
pub mod damage;
pub mod economy;
pub mod movement;
pub mod orders;
pub mod segments;
pub mod stacking;
pub mod tick;

pub use combat::CombatPair;
pub use commands::{apply_command, QueuedCommand};
pub use conquest::Capture;
pub use economy::{accrue_resources, build_unit, process_recruitment, upgrade_node};
pub use orders::{process_move_order, MoveOrder, MoveTarget};
pub use segments::MovementSegment;
pub use tick::{run_tick, TickReport};
