//! Optimization suggestions derived from cycles, usage and node metadata.

use std::fmt;

use serde::Serialize;

use super::cycles::{CyclicDependency, Severity};
use super::similarity::{group_similar, SimilarityStrategy};
use crate::graph::{DependencyGraph, DependencyNode, NodeKind};

const LAZY_LOAD_BYTES: u64 = 500 * 1024;
const LAZY_LOAD_DEPENDENCIES: usize = 10;
const LAZY_LOAD_DEPTH: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OptimizationKind {
    Remove,
    Replace,
    Update,
    Bundle,
    LazyLoad,
    Cache,
}

impl fmt::Display for OptimizationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            OptimizationKind::Remove => "remove",
            OptimizationKind::Replace => "replace",
            OptimizationKind::Update => "update",
            OptimizationKind::Bundle => "bundle",
            OptimizationKind::LazyLoad => "lazy-load",
            OptimizationKind::Cache => "cache",
        };
        f.write_str(label)
    }
}

/// Qualitative effort/benefit rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Optimization {
    pub kind: OptimizationKind,
    /// Node ids the suggestion applies to
    pub targets: Vec<String>,
    pub impact: String,
    pub effort: Level,
    pub benefit: Level,
    pub steps: Vec<String>,
}

/// Produces suggestions in a fixed order: cycle breaks, unused packages,
/// consolidation groups, then lazy-load candidates by descending size.
pub fn suggest_optimizations(
    graph: &DependencyGraph,
    cycles: &[CyclicDependency],
    similarity: &dyn SimilarityStrategy,
) -> Vec<Optimization> {
    let mut suggestions = Vec::new();
    suggestions.extend(cycles.iter().filter_map(break_cycle));
    suggestions.extend(
        graph
            .nodes()
            .filter(|n| n.kind == NodeKind::Package && n.dependents.is_empty())
            .map(remove_unused),
    );
    suggestions.extend(consolidate(graph, similarity));
    suggestions.extend(lazy_load(graph));
    suggestions
}

fn break_cycle(cycle: &CyclicDependency) -> Option<Optimization> {
    if cycle.severity < Severity::High {
        return None;
    }
    let target = if cycle.nodes.len() >= 2 {
        cycle.nodes[cycle.nodes.len() - 2].clone()
    } else {
        cycle.nodes.first()?.clone()
    };
    Some(Optimization {
        kind: OptimizationKind::Remove,
        impact: format!("Breaks the {} cycle {}", cycle.severity, cycle.path()),
        effort: Level::Medium,
        benefit: Level::High,
        steps: vec![
            format!("Remove or invert the dependency held by {}", target),
            "Move shared code into a module both sides can import".to_string(),
            "Re-run the analysis to confirm the cycle is gone".to_string(),
        ],
        targets: vec![target],
    })
}

fn remove_unused(node: &DependencyNode) -> Optimization {
    Optimization {
        kind: OptimizationKind::Remove,
        targets: vec![node.id.clone()],
        impact: format!("Drops unused dependency {}", node.name),
        effort: Level::Low,
        benefit: Level::Medium,
        steps: vec![
            format!("Confirm nothing imports {}", node.name),
            format!("Remove {} from the manifest", node.name),
        ],
    }
}

fn consolidate(graph: &DependencyGraph, similarity: &dyn SimilarityStrategy) -> Vec<Optimization> {
    let packages: Vec<&DependencyNode> = graph.get_nodes_by_kind(NodeKind::Package);
    let groups = group_similar(similarity, packages.iter().map(|n| n.name.as_str()));

    groups
        .into_iter()
        .map(|(key, names)| {
            let targets: Vec<String> = packages
                .iter()
                .filter(|n| names.contains(&n.name))
                .map(|n| n.id.clone())
                .collect();
            Optimization {
                kind: OptimizationKind::Replace,
                impact: format!("Consolidates {} related '{}' packages", names.len(), key),
                effort: Level::Medium,
                benefit: Level::Medium,
                steps: vec![
                    format!("Review overlap between {}", names.join(", ")),
                    "Keep the smallest set that covers current usage".to_string(),
                ],
                targets,
            }
        })
        .collect()
}

fn lazy_load(graph: &DependencyGraph) -> Vec<Optimization> {
    let mut candidates: Vec<&DependencyNode> = graph
        .nodes()
        .filter(|n| {
            n.size.is_some_and(|s| s > LAZY_LOAD_BYTES)
                || n.dependencies.len() > LAZY_LOAD_DEPENDENCIES
                || n.depth > LAZY_LOAD_DEPTH
        })
        .collect();
    // Stable: equal sizes keep id order
    candidates.sort_by(|a, b| b.size.unwrap_or(0).cmp(&a.size.unwrap_or(0)));

    candidates
        .into_iter()
        .map(|node| Optimization {
            kind: OptimizationKind::LazyLoad,
            targets: vec![node.id.clone()],
            impact: match node.size {
                Some(size) => format!("Defers loading {} ({} bytes)", node.name, size),
                None => format!("Defers loading {}", node.name),
            },
            effort: Level::Medium,
            benefit: if node.size.is_some_and(|s| s > LAZY_LOAD_BYTES) {
                Level::High
            } else {
                Level::Medium
            },
            steps: vec![
                format!("Load {} through a dynamic import", node.name),
                "Keep it off the startup path".to_string(),
            ],
        })
        .collect()
}
