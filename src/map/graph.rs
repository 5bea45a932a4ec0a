//! Road graph - province nodes joined by directed roads
//!
//! Topology is fixed once the map is loaded. Every one-way road in the map
//! file receives a reverse counterpart, so any road can be walked both ways.
//! Node ownership, fortification and yield are the only mutable parts.

use std::fs;
use std::path::Path;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::error::{Result, RoadwarError};
use crate::core::types::{EdgeId, FactionId, NodeId, Vec2};

/// Per-tick income a node pays to its owner
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceYield {
    #[serde(default)]
    pub gold: f64,
    #[serde(default)]
    pub manpower: f64,
}

/// A province on the map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub owner_id: Option<FactionId>,
    #[serde(default)]
    pub fortification_level: u32,
    #[serde(default)]
    pub resource_yield: ResourceYield,
}

impl Node {
    pub fn new(id: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            id: NodeId::new(id),
            x,
            y,
            owner_id: None,
            fortification_level: 0,
            resource_yield: ResourceYield::default(),
        }
    }

    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn is_owned_by(&self, faction: &FactionId) -> bool {
        self.owner_id.as_ref() == Some(faction)
    }
}

/// A directed road between two nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: EdgeId,
    pub source_node_id: NodeId,
    pub target_node_id: NodeId,
    pub length: f64,
}

impl Edge {
    pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>, length: f64) -> Self {
        Self {
            id: EdgeId::new(id),
            source_node_id: NodeId::new(source),
            target_node_id: NodeId::new(target),
            length,
        }
    }

    /// True when both edges lie on the same physical road, in either direction
    pub fn same_road(&self, other: &Edge) -> bool {
        (self.source_node_id == other.source_node_id && self.target_node_id == other.target_node_id)
            || (self.source_node_id == other.target_node_id
                && self.target_node_id == other.source_node_id)
    }

    /// True when `other` runs in the same direction as this edge
    pub fn aligned_with(&self, other: &Edge) -> bool {
        self.source_node_id == other.source_node_id
    }
}

/// Edge as written in the map file; length may be left to the loader
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MapEdge {
    id: EdgeId,
    source_node_id: NodeId,
    target_node_id: NodeId,
    #[serde(default)]
    length: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct MapFile {
    nodes: Vec<Node>,
    edges: Vec<MapEdge>,
}

/// The road network with id-indexed lookups
#[derive(Debug, Clone)]
pub struct RoadGraph {
    nodes: Vec<Node>,
    node_index: AHashMap<NodeId, usize>,
    edges: Vec<Edge>,
    edge_index: AHashMap<EdgeId, usize>,
    step_index: AHashMap<(NodeId, NodeId), usize>,
    outgoing: AHashMap<NodeId, Vec<usize>>,
    incoming: AHashMap<NodeId, Vec<usize>>,
}

impl RoadGraph {
    /// Build a graph, adding the reverse of every one-way edge
    pub fn from_parts(nodes: Vec<Node>, edges: Vec<Edge>) -> Result<Self> {
        let mut node_index = AHashMap::with_capacity(nodes.len());
        for (idx, node) in nodes.iter().enumerate() {
            if node_index.insert(node.id.clone(), idx).is_some() {
                return Err(RoadwarError::InvalidMap(format!("duplicate node id {}", node.id)));
            }
        }

        for edge in &edges {
            for end in [&edge.source_node_id, &edge.target_node_id] {
                if !node_index.contains_key(end) {
                    return Err(RoadwarError::NodeNotFound(end.clone()));
                }
            }
            if !is_usable_length(edge.length) {
                return Err(RoadwarError::InvalidMap(format!(
                    "edge {} has unusable length {}",
                    edge.id, edge.length
                )));
            }
        }

        let edges = bidirectionalize(edges);

        let mut edge_index = AHashMap::with_capacity(edges.len());
        let mut step_index = AHashMap::with_capacity(edges.len());
        let mut outgoing: AHashMap<NodeId, Vec<usize>> = AHashMap::new();
        let mut incoming: AHashMap<NodeId, Vec<usize>> = AHashMap::new();
        for (idx, edge) in edges.iter().enumerate() {
            if edge_index.insert(edge.id.clone(), idx).is_some() {
                return Err(RoadwarError::InvalidMap(format!("duplicate edge id {}", edge.id)));
            }
            step_index
                .entry((edge.source_node_id.clone(), edge.target_node_id.clone()))
                .or_insert(idx);
            outgoing.entry(edge.source_node_id.clone()).or_default().push(idx);
            incoming.entry(edge.target_node_id.clone()).or_default().push(idx);
        }

        Ok(Self {
            nodes,
            node_index,
            edges,
            edge_index,
            step_index,
            outgoing,
            incoming,
        })
    }

    /// Parse a map file; missing edge lengths become the node distance
    pub fn from_json(json: &str) -> Result<Self> {
        let file: MapFile = serde_json::from_str(json)?;
        let positions: AHashMap<&NodeId, Vec2> =
            file.nodes.iter().map(|n| (&n.id, n.position())).collect();

        let mut edges = Vec::with_capacity(file.edges.len());
        for raw in &file.edges {
            let length = match raw.length {
                Some(length) => length,
                None => {
                    let a = positions
                        .get(&raw.source_node_id)
                        .ok_or_else(|| RoadwarError::NodeNotFound(raw.source_node_id.clone()))?;
                    let b = positions
                        .get(&raw.target_node_id)
                        .ok_or_else(|| RoadwarError::NodeNotFound(raw.target_node_id.clone()))?;
                    a.distance(b)
                }
            };
            edges.push(Edge {
                id: raw.id.clone(),
                source_node_id: raw.source_node_id.clone(),
                target_node_id: raw.target_node_id.clone(),
                length,
            });
        }

        Self::from_parts(file.nodes, edges)
    }

    /// Load a map file from disk
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.node_index.get(id).map(|&idx| &self.nodes[idx])
    }

    pub fn node_mut(&mut self, id: &NodeId) -> Option<&mut Node> {
        self.node_index.get(id).map(|&idx| &mut self.nodes[idx])
    }

    pub fn edge(&self, id: &EdgeId) -> Option<&Edge> {
        self.edge_index.get(id).map(|&idx| &self.edges[idx])
    }

    /// The concrete edge for a consecutive `(from, to)` pair of a path
    pub fn edge_for_step(&self, from: &NodeId, to: &NodeId) -> Option<&Edge> {
        self.step_index
            .get(&(from.clone(), to.clone()))
            .map(|&idx| &self.edges[idx])
    }

    /// The counterpart of `edge` running the other way
    pub fn reverse_of(&self, edge: &Edge) -> Option<&Edge> {
        self.edge_for_step(&edge.target_node_id, &edge.source_node_id)
    }

    pub fn outgoing(&self, node: &NodeId) -> impl Iterator<Item = &Edge> + '_ {
        self.outgoing
            .get(node)
            .into_iter()
            .flatten()
            .map(move |&idx| &self.edges[idx])
    }

    pub fn incoming(&self, node: &NodeId) -> impl Iterator<Item = &Edge> + '_ {
        self.incoming
            .get(node)
            .into_iter()
            .flatten()
            .map(move |&idx| &self.edges[idx])
    }

    /// Nodes reachable in one hop, in map order
    pub fn neighbors(&self, node: &NodeId) -> impl Iterator<Item = &NodeId> + '_ {
        self.outgoing(node).map(|e| &e.target_node_id)
    }

    /// World position of a point `distance` along `edge`
    pub fn point_on_edge(&self, edge: &Edge, distance: f64) -> Option<Vec2> {
        let start = self.node(&edge.source_node_id)?.position();
        let end = self.node(&edge.target_node_id)?.position();
        Some(start.lerp(&end, distance / edge.length))
    }

    /// Where a fresh unit stands at `node`: start of a leaving road, or the
    /// end of an arriving one for dead-end nodes
    pub fn spawn_point(&self, node: &NodeId) -> Option<(EdgeId, f64)> {
        if let Some(edge) = self.outgoing(node).next() {
            return Some((edge.id.clone(), 0.0));
        }
        self.incoming(node)
            .next()
            .map(|edge| (edge.id.clone(), edge.length))
    }

    /// Overwrite mutable node state from a snapshot; unknown ids are ignored
    pub fn restore_node_state(&mut self, saved: &[Node]) -> usize {
        let mut restored = 0;
        for snapshot in saved {
            if let Some(node) = self.node_mut(&snapshot.id) {
                node.owner_id = snapshot.owner_id.clone();
                node.fortification_level = snapshot.fortification_level;
                node.resource_yield = snapshot.resource_yield;
                restored += 1;
            }
        }
        restored
    }
}

/// Add the reverse of every edge whose counterpart is missing
/// Finite and strictly positive; rejects NaN too
fn is_usable_length(length: f64) -> bool {
    length.is_finite() && length > 0.0
}

fn bidirectionalize(mut edges: Vec<Edge>) -> Vec<Edge> {
    let mut seen: ahash::AHashSet<(NodeId, NodeId)> = edges
        .iter()
        .map(|e| (e.source_node_id.clone(), e.target_node_id.clone()))
        .collect();

    let mut reversed = Vec::new();
    for edge in &edges {
        let key = (edge.target_node_id.clone(), edge.source_node_id.clone());
        if seen.insert(key) {
            reversed.push(Edge {
                id: edge.id.reversed(),
                source_node_id: edge.target_node_id.clone(),
                target_node_id: edge.source_node_id.clone(),
                length: edge.length,
            });
        }
    }
    edges.extend(reversed);
    edges
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_graph() -> RoadGraph {
        RoadGraph::from_parts(
            vec![Node::new("a", 0.0, 0.0), Node::new("b", 100.0, 0.0), Node::new("c", 100.0, 50.0)],
            vec![Edge::new("ab", "a", "b", 100.0), Edge::new("bc", "b", "c", 50.0)],
        )
        .unwrap()
    }

    #[test]
    fn test_edges_are_bidirectionalized() {
        let graph = line_graph();
        assert_eq!(graph.edges().len(), 4);

        let rev = graph.edge(&EdgeId::new("ab__rev")).unwrap();
        assert_eq!(rev.source_node_id, NodeId::new("b"));
        assert_eq!(rev.target_node_id, NodeId::new("a"));
        assert_eq!(rev.length, 100.0);
    }

    #[test]
    fn test_existing_reverse_is_not_duplicated() {
        let graph = RoadGraph::from_parts(
            vec![Node::new("a", 0.0, 0.0), Node::new("b", 10.0, 0.0)],
            vec![Edge::new("ab", "a", "b", 10.0), Edge::new("ba", "b", "a", 10.0)],
        )
        .unwrap();
        assert_eq!(graph.edges().len(), 2);
        let ab = graph.edge(&EdgeId::new("ab")).unwrap();
        assert_eq!(graph.reverse_of(ab).unwrap().id, EdgeId::new("ba"));
    }

    #[test]
    fn test_unknown_endpoint_rejected() {
        let result = RoadGraph::from_parts(
            vec![Node::new("a", 0.0, 0.0)],
            vec![Edge::new("ax", "a", "x", 10.0)],
        );
        assert!(matches!(result, Err(RoadwarError::NodeNotFound(_))));
    }

    #[test]
    fn test_unusable_lengths_rejected() {
        for length in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            let result = RoadGraph::from_parts(
                vec![Node::new("a", 0.0, 0.0), Node::new("b", 10.0, 0.0)],
                vec![Edge::new("ab", "a", "b", length)],
            );
            assert!(matches!(result, Err(RoadwarError::InvalidMap(_))), "length {}", length);
        }
    }

    #[test]
    fn test_json_length_defaults_to_distance() {
        let graph = RoadGraph::from_json(
            r##"{
                "nodes": [{"id": "#a", "x": 0, "y": 0}, {"id": "#b", "x": 30, "y": 40}],
                "edges": [{"id": "e", "sourceNodeId": "#a", "targetNodeId": "#b"}]
            }"##,
        )
        .unwrap();
        assert_eq!(graph.edge(&EdgeId::new("e")).unwrap().length, 50.0);
    }

    #[test]
    fn test_point_on_edge_and_spawn_point() {
        let graph = line_graph();
        let ab = graph.edge(&EdgeId::new("ab")).unwrap();
        assert_eq!(graph.point_on_edge(ab, 25.0), Some(Vec2::new(25.0, 0.0)));

        assert_eq!(graph.spawn_point(&NodeId::new("a")), Some((EdgeId::new("ab"), 0.0)));
    }

    #[test]
    fn test_same_road_and_neighbors() {
        let graph = line_graph();
        let ab = graph.edge(&EdgeId::new("ab")).unwrap();
        let ba = graph.reverse_of(ab).unwrap();
        let bc = graph.edge(&EdgeId::new("bc")).unwrap();
        assert!(ab.same_road(ba));
        assert!(!ab.aligned_with(ba));
        assert!(!ab.same_road(bc));

        let around_b: Vec<_> = graph.neighbors(&NodeId::new("b")).cloned().collect();
        assert_eq!(around_b, vec![NodeId::new("c"), NodeId::new("a")]);
    }

    #[test]
    fn test_restore_node_state() {
        let mut graph = line_graph();
        let mut saved = graph.node(&NodeId::new("b")).unwrap().clone();
        saved.owner_id = Some(FactionId::new("p1"));
        saved.fortification_level = 2;

        assert_eq!(graph.restore_node_state(&[saved]), 1);
        let b = graph.node(&NodeId::new("b")).unwrap();
        assert!(b.is_owned_by(&FactionId::new("p1")));
        assert_eq!(b.fortification_level, 2);
    }
}
