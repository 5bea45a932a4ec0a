pub mod unit;

pub use unit::{Unit, UnitState};
