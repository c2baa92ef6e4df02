//! Per-node depth and the longest dependency chain.
//!
//! `depth(n)` is 0 when `n` has no dependencies, otherwise
//! `1 + max(depth(dep))`. A dependency still in progress on the DFS stack (a
//! back edge) counts as depth 0 and is never recorded as a chain parent, so
//! cycles neither recurse forever nor lengthen the chain.

use std::collections::HashMap;

use crate::graph::DependencyGraph;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    InProgress,
    Done,
}

/// Depths and chain parents for every node of a graph.
#[derive(Debug, Clone, Default)]
pub struct DepthAnalysis {
    /// Node ids in post-order (dependencies before dependents)
    order: Vec<String>,
    depths: HashMap<String, usize>,
    /// Dependency that produced each node's depth
    parents: HashMap<String, String>,
}

impl DepthAnalysis {
    /// Runs the post-order pass over `graph`.
    pub fn compute(graph: &DependencyGraph) -> Self {
        let mut analysis = Self::default();
        let mut state: HashMap<&str, Visit> = HashMap::with_capacity(graph.node_count());

        for root in graph.node_ids() {
            if state.contains_key(root) {
                continue;
            }
            state.insert(root, Visit::InProgress);
            let mut frames: Vec<(&str, Vec<&str>, usize)> = vec![(root, sorted_deps(graph, root), 0)];

            while let Some(frame) = frames.last_mut() {
                if let Some(&dep) = frame.1.get(frame.2) {
                    frame.2 += 1;
                    if !state.contains_key(dep) {
                        state.insert(dep, Visit::InProgress);
                        frames.push((dep, sorted_deps(graph, dep), 0));
                    }
                    continue;
                }

                let Some((id, deps, _)) = frames.pop() else {
                    break;
                };
                analysis.complete(id, &deps, &state);
                state.insert(id, Visit::Done);
            }
        }
        analysis
    }

    fn complete(&mut self, id: &str, deps: &[&str], state: &HashMap<&str, Visit>) {
        let mut depth = 0;
        let mut parent = None;
        for &dep in deps {
            let candidate = match state.get(dep) {
                Some(Visit::Done) => 1 + self.depths.get(dep).copied().unwrap_or(0),
                _ => 1,
            };
            let completed = state.get(dep) == Some(&Visit::Done);
            if candidate > depth || (completed && parent.is_none() && candidate == depth) {
                depth = candidate;
                parent = completed.then_some(dep);
            }
        }

        self.depths.insert(id.to_string(), depth);
        if let Some(parent) = parent {
            self.parents.insert(id.to_string(), parent.to_string());
        }
        self.order.push(id.to_string());
    }

    pub fn depth(&self, id: &str) -> usize {
        self.depths.get(id).copied().unwrap_or(0)
    }

    pub fn max_depth(&self) -> usize {
        self.depths.values().copied().max().unwrap_or(0)
    }

    /// Node ids in completion order: every dependency precedes its
    /// dependents, cycles aside.
    pub fn completion_order(&self) -> &[String] {
        &self.order
    }

    /// The longest chain, from its deepest node down to a node of depth 0.
    ///
    /// The tail is the node with the greatest depth; ties go to the smallest id.
    pub fn critical_path(&self) -> Vec<String> {
        let mut tail: Option<(&str, usize)> = None;
        for (id, &depth) in &self.depths {
            let better = match tail {
                None => true,
                Some((best_id, best)) => depth > best || (depth == best && id.as_str() < best_id),
            };
            if better {
                tail = Some((id.as_str(), depth));
            }
        }

        let mut path = Vec::new();
        let mut current = tail.map(|(id, _)| id);
        while let Some(id) = current {
            path.push(id.to_string());
            current = self.parents.get(id).map(String::as_str);
        }
        path
    }

    /// Writes `depth` onto every node.
    pub fn apply(&self, graph: &mut DependencyGraph) {
        for (id, &depth) in &self.depths {
            if let Some(node) = graph.get_node_mut(id) {
                node.depth = depth;
            }
        }
    }
}

fn sorted_deps<'g>(graph: &'g DependencyGraph, id: &str) -> Vec<&'g str> {
    let mut deps: Vec<&str> = graph
        .get_node(id)
        .map(|n| n.dependencies.iter().map(String::as_str).collect())
        .unwrap_or_default();
    deps.sort_unstable();
    deps
}

/// The longest dependency chain in `graph`, deepest node first.
///
/// ```
/// use depscope::analysis::find_critical_path;
/// use depscope::graph::{DependencyEdge, DependencyGraph, DependencyNode, EdgeKind, NodeKind};
///
/// let mut graph = DependencyGraph::new();
/// for id in ["a", "b", "c", "d"] {
///     graph.add_node(DependencyNode::new(id, id, NodeKind::Module));
/// }
/// for (from, to) in [("a", "b"), ("b", "c"), ("c", "d")] {
///     graph.add_edge(DependencyEdge::new(from, to, EdgeKind::Imports));
/// }
///
/// assert_eq!(find_critical_path(&graph), vec!["a", "b", "c", "d"]);
/// ```
pub fn find_critical_path(graph: &DependencyGraph) -> Vec<String> {
    DepthAnalysis::compute(graph).critical_path()
}
