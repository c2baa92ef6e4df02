//! Dependency graph implementation using petgraph.
//!
//! Provides a directed graph for modeling dependency relationships between
//! packages, files and other units. Edges point from the dependent node to
//! its dependency. Every node also keeps ordered `dependencies`/`dependents`
//! id lists so analysis passes and exporters can work in id space.

use chrono::{DateTime, Utc};
use petgraph::algo::is_cyclic_directed;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::analysis::stats::{calculate_stats, GraphStats};
use crate::parser::DependencyType;

/// What a node in the graph stands for.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// An installable package (manifest entry)
    #[default]
    Package,
    Module,
    /// A source file discovered in a scanned tree
    File,
    Function,
    Service,
    Resource,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Package => "package",
            Self::Module => "module",
            Self::File => "file",
            Self::Function => "function",
            Self::Service => "service",
            Self::Resource => "resource",
        };
        write!(f, "{}", s)
    }
}

/// The relationship an edge records.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    #[default]
    Imports,
    Requires,
    Uses,
    Extends,
    Implements,
    Calls,
    Depends,
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Imports => "imports",
            Self::Requires => "requires",
            Self::Uses => "uses",
            Self::Extends => "extends",
            Self::Implements => "implements",
            Self::Calls => "calls",
            Self::Depends => "depends",
        };
        write!(f, "{}", s)
    }
}

/// Represents a node in the dependency graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyNode {
    /// Unique id within a graph (`name@version` for packages, root-relative path for files)
    pub id: String,
    /// Display name
    pub name: String,
    /// Version, when known
    pub version: Option<String>,
    pub kind: NodeKind,
    /// Origin path or package locator
    pub source: String,
    /// Ids this node depends on, in first-observed order
    pub dependencies: Vec<String>,
    /// Ids that depend on this node, in first-observed order
    pub dependents: Vec<String>,
    /// Size in bytes
    pub size: Option<u64>,
    pub last_modified: Option<DateTime<Utc>>,
    /// Manifest class for package nodes
    pub dep_type: Option<DependencyType>,
    /// Set by analysis when the node sits on a detected cycle
    pub cyclic: bool,
    /// Externally annotated (configuration) criticality
    pub critical: bool,
    /// Longest dependency chain ending at this node, set by analysis
    pub depth: usize,
}

impl DependencyNode {
    /// Creates a bare node.
    ///
    /// # Example
    ///
    /// ```rust
    /// use depscope::graph::{DependencyNode, NodeKind};
    ///
    /// let node = DependencyNode::new("src/a.ts", "a.ts", NodeKind::File);
    /// assert_eq!(node.id, "src/a.ts");
    /// assert_eq!(node.depth, 0);
    /// assert!(!node.cyclic);
    /// ```
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: NodeKind) -> Self {
        let id = id.into();
        Self {
            source: id.clone(),
            id,
            name: name.into(),
            version: None,
            kind,
            dependencies: Vec::new(),
            dependents: Vec::new(),
            size: None,
            last_modified: None,
            dep_type: None,
            cyclic: false,
            critical: false,
            depth: 0,
        }
    }

    /// Creates a package node with id `name@version`.
    pub fn package(name: &str, version: &str) -> Self {
        let mut node = Self::new(format!("{}@{}", name, version), name, NodeKind::Package);
        node.version = Some(version.to_string());
        node.source = format!("npm:{}@{}", name, version);
        node
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_last_modified(mut self, at: DateTime<Utc>) -> Self {
        self.last_modified = Some(at);
        self
    }

    pub fn with_dep_type(mut self, dep_type: DependencyType) -> Self {
        self.dep_type = Some(dep_type);
        self
    }

    /// Neither dependencies nor dependents.
    pub fn is_orphan(&self) -> bool {
        self.dependencies.is_empty() && self.dependents.is_empty()
    }

    /// Has dependents but no dependencies of its own.
    pub fn is_leaf(&self) -> bool {
        self.dependencies.is_empty() && !self.dependents.is_empty()
    }
}

/// Represents an edge in the dependency graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub from: String,
    pub to: String,
    pub kind: EdgeKind,
    /// The dependency can be absent without breaking the dependent
    pub optional: bool,
    /// Resolved at runtime (e.g. `import()`)
    pub dynamic: bool,
    pub weight: f64,
}

impl DependencyEdge {
    /// Creates a new required, static edge with weight 1.
    pub fn new(from: impl Into<String>, to: impl Into<String>, kind: EdgeKind) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            kind,
            optional: false,
            dynamic: false,
            weight: 1.0,
        }
    }

    pub fn with_optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    pub fn with_dynamic(mut self, dynamic: bool) -> Self {
        self.dynamic = dynamic;
        self
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    /// Identity used for idempotent insertion.
    pub fn key(&self) -> (String, String, EdgeKind) {
        (self.from.clone(), self.to.clone(), self.kind)
    }
}

/// A directed graph of dependency relationships.
///
/// Nodes are addressed by string id. Edge insertion is idempotent per
/// `(from, to, kind)`, and both endpoints must exist, so the graph never holds
/// dangling references.
///
/// # Example
///
/// ```rust
/// use depscope::graph::{DependencyEdge, DependencyGraph, DependencyNode, EdgeKind, NodeKind};
///
/// let mut graph = DependencyGraph::new();
/// graph.add_node(DependencyNode::new("app", "app", NodeKind::Module));
/// graph.add_node(DependencyNode::package("react", "18.2.0"));
///
/// assert!(graph.add_edge(DependencyEdge::new("app", "react@18.2.0", EdgeKind::Imports)));
/// // Same (from, to, kind) again is a no-op
/// assert!(!graph.add_edge(DependencyEdge::new("app", "react@18.2.0", EdgeKind::Imports)));
///
/// assert_eq!(graph.node_count(), 2);
/// assert_eq!(graph.edge_count(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    graph: DiGraph<DependencyNode, DependencyEdge>,
    /// Maps node ids to their indices, ordered by id
    node_indices: BTreeMap<String, NodeIndex>,
    created_at: DateTime<Utc>,
    analyzed_at: Option<DateTime<Utc>>,
    stats: Option<GraphStats>,
}

impl Default for DependencyGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl DependencyGraph {
    /// Creates a new empty dependency graph.
    pub fn new() -> Self {
        Self::with_capacity(0, 0)
    }

    /// Creates a new graph with pre-allocated capacity.
    pub fn with_capacity(nodes: usize, edges: usize) -> Self {
        Self {
            graph: DiGraph::with_capacity(nodes, edges),
            node_indices: BTreeMap::new(),
            created_at: Utc::now(),
            analyzed_at: None,
            stats: None,
        }
    }

    /// Adds a node to the graph.
    ///
    /// If a node with the same id already exists it is left untouched and
    /// its existing index is returned.
    pub fn add_node(&mut self, node: DependencyNode) -> NodeIndex {
        if let Some(&idx) = self.node_indices.get(&node.id) {
            return idx;
        }

        let id = node.id.clone();
        let idx = self.graph.add_node(node);
        self.node_indices.insert(id, idx);
        idx
    }

    /// Adds an edge between two existing nodes.
    ///
    /// Returns `true` if the edge was inserted, `false` if either endpoint is
    /// missing or an edge with the same `(from, to, kind)` already exists.
    pub fn add_edge(&mut self, edge: DependencyEdge) -> bool {
        let Some(&from_idx) = self.node_indices.get(&edge.from) else {
            return false;
        };
        let Some(&to_idx) = self.node_indices.get(&edge.to) else {
            return false;
        };
        if self.contains_edge(&edge.from, &edge.to, edge.kind) {
            return false;
        }

        let (from, to) = (edge.from.clone(), edge.to.clone());
        self.graph.add_edge(from_idx, to_idx, edge);

        if let Some(node) = self.graph.node_weight_mut(from_idx) {
            if !node.dependencies.contains(&to) {
                node.dependencies.push(to);
            }
        }
        if let Some(node) = self.graph.node_weight_mut(to_idx) {
            if !node.dependents.contains(&from) {
                node.dependents.push(from);
            }
        }
        true
    }

    /// Checks for an edge with the given identity.
    pub fn contains_edge(&self, from: &str, to: &str, kind: EdgeKind) -> bool {
        let (Some(&from_idx), Some(&to_idx)) = (self.node_indices.get(from), self.node_indices.get(to))
        else {
            return false;
        };
        self.graph
            .edges_connecting(from_idx, to_idx)
            .any(|e| e.weight().kind == kind)
    }

    /// Unions `other` into this graph.
    ///
    /// Nodes already present here keep their data; new nodes are copied in.
    /// Edges from `other` are appended with the usual idempotent insertion.
    /// Returns the number of edges added.
    pub fn merge(&mut self, other: &DependencyGraph) -> usize {
        for node in other.nodes() {
            if self.contains(&node.id) {
                continue;
            }
            let mut copy = node.clone();
            copy.dependencies.clear();
            copy.dependents.clear();
            self.add_node(copy);
        }

        let mut added = 0;
        for edge in other.edges() {
            if self.add_edge(edge.clone()) {
                added += 1;
            }
        }
        self.stats = None;
        added
    }

    /// Gets a reference to a node by id.
    pub fn get_node(&self, id: &str) -> Option<&DependencyNode> {
        self.node_indices
            .get(id)
            .and_then(|&idx| self.graph.node_weight(idx))
    }

    /// Gets a mutable reference to a node by id.
    pub fn get_node_mut(&mut self, id: &str) -> Option<&mut DependencyNode> {
        self.node_indices
            .get(id)
            .and_then(|&idx| self.graph.node_weight_mut(idx))
    }

    /// All nodes, ordered by id.
    pub fn nodes(&self) -> impl Iterator<Item = &DependencyNode> + '_ {
        self.node_indices
            .values()
            .filter_map(|&idx| self.graph.node_weight(idx))
    }

    /// All node ids, in sorted order.
    pub fn node_ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.node_indices.keys().map(String::as_str)
    }

    /// All edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = &DependencyEdge> + '_ {
        self.graph.edge_weights()
    }

    /// Outgoing edges of a node, in insertion order.
    pub fn edges_from(&self, id: &str) -> Vec<&DependencyEdge> {
        let Some(&idx) = self.node_indices.get(id) else {
            return Vec::new();
        };
        let mut edges: Vec<_> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .collect();
        edges.sort_by_key(|e| e.id());
        edges.into_iter().map(|e| e.weight()).collect()
    }

    /// The set of edge identities; two graphs with equal sets have the same edges.
    pub fn edge_keys(&self) -> BTreeSet<(String, String, EdgeKind)> {
        self.edges().map(DependencyEdge::key).collect()
    }

    /// Same node ids and same edge set.
    pub fn structurally_eq(&self, other: &DependencyGraph) -> bool {
        self.node_ids().eq(other.node_ids()) && self.edge_keys() == other.edge_keys()
    }

    /// Nodes this node depends on.
    pub fn get_dependencies(&self, id: &str) -> Vec<&DependencyNode> {
        self.get_node(id)
            .map(|node| {
                node.dependencies
                    .iter()
                    .filter_map(|dep| self.get_node(dep))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Nodes that depend on this node.
    pub fn get_dependents(&self, id: &str) -> Vec<&DependencyNode> {
        self.get_node(id)
            .map(|node| {
                node.dependents
                    .iter()
                    .filter_map(|dep| self.get_node(dep))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Checks if the graph contains any cycle, self-loops included.
    pub fn has_cycles(&self) -> bool {
        is_cyclic_directed(&self.graph)
    }

    /// Returns `(node, missing id)` pairs for references that point nowhere.
    ///
    /// Always empty for graphs built through [`add_edge`](Self::add_edge).
    pub fn find_dangling_references(&self) -> Vec<(String, String)> {
        let mut dangling = Vec::new();
        for node in self.nodes() {
            for id in node.dependencies.iter().chain(node.dependents.iter()) {
                if !self.contains(id) {
                    dangling.push((node.id.clone(), id.clone()));
                }
            }
        }
        dangling
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn contains(&self, id: &str) -> bool {
        self.node_indices.contains_key(id)
    }

    /// Gets nodes filtered by kind.
    pub fn get_nodes_by_kind(&self, kind: NodeKind) -> Vec<&DependencyNode> {
        self.nodes().filter(|node| node.kind == kind).collect()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn analyzed_at(&self) -> Option<DateTime<Utc>> {
        self.analyzed_at
    }

    /// Records the completion time of an analysis pass.
    pub fn mark_analyzed(&mut self) {
        self.analyzed_at = Some(Utc::now());
    }

    /// The cached statistics from the last [`refresh_stats`](Self::refresh_stats).
    pub fn stats(&self) -> Option<&GraphStats> {
        self.stats.as_ref()
    }

    /// Recomputes and caches statistics for the current node/edge state.
    pub fn refresh_stats(&mut self) -> GraphStats {
        let stats = calculate_stats(self);
        self.stats = Some(stats.clone());
        stats
    }

    /// Rough heap footprint of the graph in bytes.
    pub fn approximate_memory(&self) -> usize {
        let node_bytes: usize = self
            .nodes()
            .map(|n| {
                std::mem::size_of::<DependencyNode>()
                    + n.id.len() * 2
                    + n.name.len()
                    + n.source.len()
                    + n.version.as_ref().map_or(0, String::len)
                    + n.dependencies.iter().map(String::len).sum::<usize>()
                    + n.dependents.iter().map(String::len).sum::<usize>()
            })
            .sum();
        let edge_bytes: usize = self
            .edges()
            .map(|e| std::mem::size_of::<DependencyEdge>() + e.from.len() + e.to.len())
            .sum();
        node_bytes + edge_bytes
    }
}
