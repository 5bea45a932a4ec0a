//! Breadth-first route search over the road graph
//!
//! Routes are minimal in hop count, not in distance. Callers that care about
//! physical distance (order routing) cost candidate routes with `path_length`.

use std::collections::VecDeque;

use ahash::{AHashMap, AHashSet};

use crate::core::types::NodeId;
use crate::map::graph::{Edge, RoadGraph};

/// Shortest node sequence from `start` to `goal`, both inclusive
pub fn find_path(graph: &RoadGraph, start: &NodeId, goal: &NodeId) -> Option<Vec<NodeId>> {
    if start == goal {
        return Some(vec![start.clone()]);
    }

    let mut queue = VecDeque::from([start]);
    let mut visited: AHashSet<&NodeId> = AHashSet::new();
    visited.insert(start);
    let mut came_from: AHashMap<&NodeId, &NodeId> = AHashMap::new();

    while let Some(current) = queue.pop_front() {
        for next in graph.neighbors(current) {
            if !visited.insert(next) {
                continue;
            }
            came_from.insert(next, current);

            if next == goal {
                // Reconstruct path
                let mut path = vec![goal.clone()];
                let mut cursor = goal;
                while let Some(&prev) = came_from.get(cursor) {
                    path.push(prev.clone());
                    cursor = prev;
                }
                path.reverse();
                return Some(path);
            }

            queue.push_back(next);
        }
    }

    None
}

/// The concrete edge for a consecutive pair of a resolved path
pub fn edge_for_step<'g>(graph: &'g RoadGraph, from: &NodeId, to: &NodeId) -> Option<&'g Edge> {
    graph.edge_for_step(from, to)
}

/// Physical length of a path; infinite when a step has no edge
pub fn path_length(graph: &RoadGraph, path: &[NodeId]) -> f64 {
    path.windows(2)
        .map(|step| {
            edge_for_step(graph, &step[0], &step[1])
                .map(|e| e.length)
                .unwrap_or(f64::INFINITY)
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::graph::Node;

    /// a - b - c - d in a line, plus a long shortcut a - d and an island e
    fn test_graph() -> RoadGraph {
        RoadGraph::from_parts(
            vec![
                Node::new("a", 0.0, 0.0),
                Node::new("b", 10.0, 0.0),
                Node::new("c", 20.0, 0.0),
                Node::new("d", 30.0, 0.0),
                Node::new("e", 99.0, 99.0),
            ],
            vec![
                Edge::new("ab", "a", "b", 10.0),
                Edge::new("bc", "b", "c", 10.0),
                Edge::new("cd", "c", "d", 10.0),
                Edge::new("ad", "a", "d", 500.0),
            ],
        )
        .unwrap()
    }

    fn ids(path: &[&str]) -> Vec<NodeId> {
        path.iter().map(|s| NodeId::new(*s)).collect()
    }

    #[test]
    fn test_path_to_self() {
        let graph = test_graph();
        let a = NodeId::new("a");
        assert_eq!(find_path(&graph, &a, &a), Some(vec![a.clone()]));
    }

    #[test]
    fn test_path_minimises_hops_not_distance() {
        let graph = test_graph();
        let path = find_path(&graph, &NodeId::new("a"), &NodeId::new("d")).unwrap();
        assert_eq!(path, ids(&["a", "d"]));
        assert_eq!(path_length(&graph, &path), 500.0);
    }

    #[test]
    fn test_reverse_direction_is_walkable() {
        let graph = test_graph();
        let (c, a) = (NodeId::new("c"), NodeId::new("a"));
        let path = find_path(&graph, &c, &a).unwrap();

        // c-b-a and c-d-a are both two hops; either is a valid answer
        assert_eq!(path.len(), 3);
        assert_eq!(path.first(), Some(&c));
        assert_eq!(path.last(), Some(&a));
        assert!(path.windows(2).all(|s| graph.edge_for_step(&s[0], &s[1]).is_some()));
        assert!(path_length(&graph, &path).is_finite());
    }

    #[test]
    fn test_reverse_walk_along_a_line() {
        let graph = RoadGraph::from_parts(
            vec![Node::new("a", 0.0, 0.0), Node::new("b", 10.0, 0.0), Node::new("c", 20.0, 0.0)],
            vec![Edge::new("ab", "a", "b", 10.0), Edge::new("bc", "b", "c", 10.0)],
        )
        .unwrap();
        let path = find_path(&graph, &NodeId::new("c"), &NodeId::new("a")).unwrap();
        assert_eq!(path, ids(&["c", "b", "a"]));
        assert_eq!(path_length(&graph, &path), 20.0);
    }

    #[test]
    fn test_disconnected_nodes() {
        let graph = test_graph();
        assert_eq!(find_path(&graph, &NodeId::new("a"), &NodeId::new("e")), None);
    }

    #[test]
    fn test_broken_path_has_infinite_length() {
        let graph = test_graph();
        assert!(path_length(&graph, &ids(&["a", "c"])).is_infinite());
        assert_eq!(path_length(&graph, &ids(&["a"])), 0.0);
    }
}
