pub mod config;
pub mod error;
pub mod types;

pub use config::{CapturePolicy, GameConfig};
pub use error::{CommandRejected, Result, RoadwarError};
