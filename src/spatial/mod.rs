//! Spatial indexing

pub mod sparse_hash;

pub use sparse_hash::{CellCoord, SparseHashGrid};
