//! Road map - province graph and route search

pub mod graph;
pub mod pathing;

pub use graph::{Edge, Node, ResourceYield, RoadGraph};
pub use pathing::{edge_for_step, find_path, path_length};
