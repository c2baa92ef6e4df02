//! Aggregate graph metrics.

use serde::Serialize;

use crate::graph::DependencyGraph;

/// Summary metrics for one graph state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphStats {
    pub total_nodes: usize,
    pub total_edges: usize,
    pub max_depth: usize,
    pub average_depth: f64,
    pub cyclic_nodes: usize,
    pub critical_nodes: usize,
    pub orphan_nodes: usize,
    pub leaf_nodes: usize,
    /// `edges / (n * (n - 1))`, within `[0, 1]`
    pub density: f64,
    pub complexity: f64,
}

/// Computes [`GraphStats`] from the graph's current nodes, edges and
/// `depth`/`cyclic` annotations.
///
/// The result is a snapshot; call again after mutating the graph.
///
/// ```
/// use depscope::analysis::calculate_stats;
/// use depscope::graph::{DependencyGraph, DependencyNode};
///
/// let mut graph = DependencyGraph::new();
/// graph.add_node(DependencyNode::package("lodash", "4.17.21"));
/// graph.add_node(DependencyNode::package("left-pad", "1.3.0"));
///
/// let stats = calculate_stats(&graph);
/// assert_eq!(stats.orphan_nodes, 2);
/// assert_eq!(stats.density, 0.0);
/// ```
pub fn calculate_stats(graph: &DependencyGraph) -> GraphStats {
    let total_nodes = graph.node_count();
    let total_edges = graph.edge_count();

    let mut max_depth = 0;
    let mut depth_sum = 0;
    let mut cyclic_nodes = 0;
    let mut critical_nodes = 0;
    let mut orphan_nodes = 0;
    let mut leaf_nodes = 0;
    for node in graph.nodes() {
        max_depth = max_depth.max(node.depth);
        depth_sum += node.depth;
        if node.cyclic {
            cyclic_nodes += 1;
        }
        if node.critical {
            critical_nodes += 1;
        }
        if node.is_orphan() {
            orphan_nodes += 1;
        }
        if node.is_leaf() {
            leaf_nodes += 1;
        }
    }

    let average_depth = if total_nodes == 0 {
        0.0
    } else {
        depth_sum as f64 / total_nodes as f64
    };
    let density = density(total_nodes, total_edges);
    let edges_per_node = if total_nodes == 0 {
        0.0
    } else {
        total_edges as f64 / total_nodes as f64
    };
    let complexity = 0.3 * max_depth as f64
        + 0.3 * edges_per_node
        + 0.2 * cyclic_nodes as f64
        + 0.2 * (density * 100.0);

    GraphStats {
        total_nodes,
        total_edges,
        max_depth,
        average_depth,
        cyclic_nodes,
        critical_nodes,
        orphan_nodes,
        leaf_nodes,
        density,
        complexity,
    }
}

/// Self-loops and parallel edges of different kinds can push the raw ratio
/// above 1, hence the clamp.
fn density(nodes: usize, edges: usize) -> f64 {
    if nodes <= 1 {
        return 0.0;
    }
    let possible = nodes as f64 * (nodes as f64 - 1.0);
    (edges as f64 / possible).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{DependencyEdge, DependencyNode, EdgeKind, NodeKind};

    fn node(id: &str) -> DependencyNode {
        DependencyNode::new(id, id, NodeKind::Module)
    }

    #[test]
    fn test_empty_graph() {
        let stats = calculate_stats(&DependencyGraph::new());
        assert_eq!(stats.total_nodes, 0);
        assert_eq!(stats.density, 0.0);
        assert_eq!(stats.average_depth, 0.0);
        assert_eq!(stats.complexity, 0.0);
    }

    #[test]
    fn test_weighted_complexity() {
        let mut graph = DependencyGraph::new();
        for id in ["a", "b", "c"] {
            graph.add_node(node(id));
        }
        graph.add_edge(DependencyEdge::new("a", "b", EdgeKind::Imports));
        graph.add_edge(DependencyEdge::new("b", "c", EdgeKind::Imports));
        graph.get_node_mut("a").unwrap().depth = 2;
        graph.get_node_mut("b").unwrap().depth = 1;

        let stats = calculate_stats(&graph);
        assert_eq!(stats.max_depth, 2);
        assert!((stats.average_depth - 1.0).abs() < 1e-9);
        assert_eq!(stats.leaf_nodes, 1);
        assert_eq!(stats.orphan_nodes, 0);

        // density = 2 / 6
        let expected = 0.3 * 2.0 + 0.3 * (2.0 / 3.0) + 0.2 * 0.0 + 0.2 * (100.0 / 3.0);
        assert!((stats.density - 1.0 / 3.0).abs() < 1e-9);
        assert!((stats.complexity - expected).abs() < 1e-9);
    }

    #[test]
    fn test_density_stays_within_bounds() {
        let mut graph = DependencyGraph::new();
        graph.add_node(node("a"));
        graph.add_node(node("b"));
        for kind in [EdgeKind::Imports, EdgeKind::Calls, EdgeKind::Uses] {
            graph.add_edge(DependencyEdge::new("a", "b", kind));
            graph.add_edge(DependencyEdge::new("b", "a", kind));
        }
        graph.add_edge(DependencyEdge::new("a", "a", EdgeKind::Imports));

        let stats = calculate_stats(&graph);
        assert!(stats.density <= 1.0);
        assert!(stats.density >= 0.0);
    }

    #[test]
    fn test_single_node_density_is_zero() {
        let mut graph = DependencyGraph::new();
        graph.add_node(node("a"));
        graph.add_edge(DependencyEdge::new("a", "a", EdgeKind::Imports));
        assert_eq!(calculate_stats(&graph).density, 0.0);
    }

    #[test]
    fn test_flag_counts() {
        let mut graph = DependencyGraph::new();
        graph.add_node(node("a"));
        graph.add_node(node("b"));
        graph.get_node_mut("a").unwrap().cyclic = true;
        graph.get_node_mut("b").unwrap().critical = true;

        let stats = calculate_stats(&graph);
        assert_eq!(stats.cyclic_nodes, 1);
        assert_eq!(stats.critical_nodes, 1);
        assert_eq!(stats.orphan_nodes, 2);
    }
}
