//! Cycle detection and classification.
//!
//! The search is a depth-first traversal with an explicit frame stack, so
//! deep or densely connected graphs cannot overflow the native call stack.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::graph::DependencyGraph;

/// Cycles longer than this are critical.
const CRITICAL_LENGTH: usize = 5;
/// Cycles longer than this (or touching a critical node) are high.
const HIGH_LENGTH: usize = 3;

/// Issue severity, shared by cycles and vulnerabilities.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        };
        f.write_str(label)
    }
}

/// A closed dependency path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CyclicDependency {
    /// Node ids in traversal order. The edge from the last node back to the
    /// first closes the cycle; the start is not repeated.
    pub nodes: Vec<String>,
    /// Number of distinct nodes (1 for a self-loop)
    pub length: usize,
    pub severity: Severity,
    pub suggestions: Vec<String>,
}

impl CyclicDependency {
    /// Formats the cycle as `a -> b -> c -> a`.
    pub fn path(&self) -> String {
        let mut parts: Vec<&str> = self.nodes.iter().map(String::as_str).collect();
        if let Some(first) = self.nodes.first() {
            parts.push(first);
        }
        parts.join(" -> ")
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.iter().any(|n| n == id)
    }
}

/// Finds every cycle closed by a back edge of the depth-first search.
///
/// Roots are visited in id order and dependencies in first-observed order,
/// so the output is deterministic for a given graph.
///
/// ```
/// use depscope::analysis::{find_cycles, Severity};
/// use depscope::graph::{DependencyEdge, DependencyGraph, DependencyNode, EdgeKind, NodeKind};
///
/// let mut graph = DependencyGraph::new();
/// for id in ["a", "b", "c"] {
///     graph.add_node(DependencyNode::new(id, id, NodeKind::File));
/// }
/// graph.add_edge(DependencyEdge::new("a", "b", EdgeKind::Imports));
/// graph.add_edge(DependencyEdge::new("b", "c", EdgeKind::Imports));
/// graph.add_edge(DependencyEdge::new("c", "a", EdgeKind::Imports));
///
/// let cycles = find_cycles(&graph);
/// assert_eq!(cycles.len(), 1);
/// assert_eq!(cycles[0].path(), "a -> b -> c -> a");
/// assert_eq!(cycles[0].severity, Severity::Medium);
/// ```
pub fn find_cycles(graph: &DependencyGraph) -> Vec<CyclicDependency> {
    let mut cycles = Vec::new();
    let mut visited: HashSet<&str> = HashSet::new();

    for start in graph.node_ids() {
        if !visited.insert(start) {
            continue;
        }

        // (node id, index of the next dependency to explore)
        let mut frames: Vec<(&str, usize)> = vec![(start, 0)];
        let mut path: Vec<&str> = vec![start];
        let mut on_stack: HashMap<&str, usize> = HashMap::from([(start, 0)]);

        while let Some(frame) = frames.last_mut() {
            let (id, next) = *frame;
            let deps = graph
                .get_node(id)
                .map(|n| n.dependencies.as_slice())
                .unwrap_or_default();

            if next >= deps.len() {
                frames.pop();
                path.pop();
                on_stack.remove(id);
                continue;
            }
            frame.1 += 1;

            let dep = deps[next].as_str();
            if let Some(&pos) = on_stack.get(dep) {
                let members: Vec<String> = path[pos..].iter().map(|s| s.to_string()).collect();
                cycles.push(classify(graph, members));
            } else if visited.insert(dep) {
                on_stack.insert(dep, path.len());
                path.push(dep);
                frames.push((dep, 0));
            }
        }
    }

    cycles
}

fn classify(graph: &DependencyGraph, nodes: Vec<String>) -> CyclicDependency {
    let length = nodes.len();
    let touches_critical = nodes
        .iter()
        .any(|id| graph.get_node(id).is_some_and(|n| n.critical));

    let severity = if length > CRITICAL_LENGTH {
        Severity::Critical
    } else if length > HIGH_LENGTH || touches_critical {
        Severity::High
    } else {
        Severity::Medium
    };

    let mut suggestions = Vec::with_capacity(3);
    if let Some((from, to)) = weakest_edge(graph, &nodes) {
        suggestions.push(format!(
            "Remove the optional dependency from {} to {}",
            from, to
        ));
    }
    suggestions.push("Use dependency injection to break the cycle".to_string());
    suggestions.push("Extract a shared interface to remove the direct edge".to_string());

    CyclicDependency {
        nodes,
        length,
        severity,
        suggestions,
    }
}

/// First optional edge walking the cycle from its start.
fn weakest_edge<'a>(graph: &DependencyGraph, nodes: &'a [String]) -> Option<(&'a str, &'a str)> {
    (0..nodes.len()).find_map(|i| {
        let from = nodes[i].as_str();
        let to = nodes[(i + 1) % nodes.len()].as_str();
        graph
            .edges_from(from)
            .iter()
            .any(|e| e.to == to && e.optional)
            .then_some((from, to))
    })
}

/// Sets `cyclic` on every node that appears in one of `cycles`.
pub fn mark_cyclic(graph: &mut DependencyGraph, cycles: &[CyclicDependency]) {
    for id in cycles.iter().flat_map(|c| c.nodes.iter()) {
        if let Some(node) = graph.get_node_mut(id) {
            node.cyclic = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{DependencyEdge, DependencyNode, EdgeKind, NodeKind};

    fn graph(ids: &[&str], edges: &[(&str, &str)]) -> DependencyGraph {
        let mut graph = DependencyGraph::new();
        for id in ids {
            graph.add_node(DependencyNode::new(*id, *id, NodeKind::Module));
        }
        for (from, to) in edges {
            graph.add_edge(DependencyEdge::new(*from, *to, EdgeKind::Imports));
        }
        graph
    }

    fn ring(n: usize) -> DependencyGraph {
        let ids: Vec<String> = (0..n).map(|i| format!("n{}", i)).collect();
        let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
        let edges: Vec<(&str, &str)> = (0..n).map(|i| (refs[i], refs[(i + 1) % n])).collect();
        graph(&refs, &edges)
    }

    #[test]
    fn test_acyclic_graph() {
        let g = graph(&["a", "b", "c"], &[("a", "b"), ("b", "c"), ("a", "c")]);
        assert!(find_cycles(&g).is_empty());
    }

    #[test]
    fn test_three_node_cycle() {
        let g = graph(&["a", "b", "c"], &[("a", "b"), ("b", "c"), ("c", "a")]);
        let cycles = find_cycles(&g);

        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].nodes, vec!["a", "b", "c"]);
        assert_eq!(cycles[0].length, 3);
        assert_eq!(cycles[0].severity, Severity::Medium);
        assert_eq!(cycles[0].suggestions.len(), 2);
    }

    #[test]
    fn test_self_loop() {
        let g = graph(&["a"], &[("a", "a")]);
        let cycles = find_cycles(&g);

        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].nodes, vec!["a"]);
        assert_eq!(cycles[0].length, 1);
        assert_eq!(cycles[0].path(), "a -> a");
    }

    #[test]
    fn test_severity_thresholds() {
        assert_eq!(find_cycles(&ring(4))[0].severity, Severity::High);
        assert_eq!(find_cycles(&ring(5))[0].severity, Severity::High);
        assert_eq!(find_cycles(&ring(6))[0].severity, Severity::Critical);
    }

    #[test]
    fn test_critical_member_raises_severity() {
        let mut g = graph(&["a", "b"], &[("a", "b"), ("b", "a")]);
        assert_eq!(find_cycles(&g)[0].severity, Severity::Medium);

        g.get_node_mut("b").unwrap().critical = true;
        assert_eq!(find_cycles(&g)[0].severity, Severity::High);
    }

    #[test]
    fn test_optional_edge_suggestion() {
        let mut g = graph(&["a", "b", "c"], &[("a", "b"), ("b", "c")]);
        g.add_edge(DependencyEdge::new("c", "a", EdgeKind::Imports).with_optional(true));

        let cycle = &find_cycles(&g)[0];
        assert_eq!(cycle.suggestions.len(), 3);
        assert_eq!(cycle.suggestions[0], "Remove the optional dependency from c to a");
    }

    #[test]
    fn test_complete_graph_terminates() {
        let ids: Vec<String> = (0..30).map(|i| format!("n{:02}", i)).collect();
        let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
        let mut edges = Vec::new();
        for a in &refs {
            for b in &refs {
                edges.push((*a, *b));
            }
        }
        let g = graph(&refs, &edges);
        let cycles = find_cycles(&g);
        assert!(!cycles.is_empty());
        assert!(cycles.iter().all(|c| c.length >= 1 && c.length <= 30));
    }

    #[test]
    fn test_deep_chain_does_not_overflow() {
        let g = ring(50_000);
        let cycles = find_cycles(&g);
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].length, 50_000);
    }

    #[test]
    fn test_mark_cyclic() {
        let mut g = graph(&["a", "b", "c"], &[("a", "b"), ("b", "a"), ("b", "c")]);
        let cycles = find_cycles(&g);
        mark_cyclic(&mut g, &cycles);

        assert!(g.get_node("a").unwrap().cyclic);
        assert!(g.get_node("b").unwrap().cyclic);
        assert!(!g.get_node("c").unwrap().cyclic);
    }

    #[test]
    fn test_cross_edge_cycle_members_stay_unmarked() {
        // r -> v -> w -> r exists, but w is finished before v reaches it
        let mut g = graph(&["r", "v", "w"], &[("r", "w"), ("w", "r"), ("r", "v"), ("v", "w")]);
        let cycles = find_cycles(&g);
        mark_cyclic(&mut g, &cycles);

        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].nodes, vec!["r", "w"]);
        assert!(!g.get_node("v").unwrap().cyclic);
    }
}
