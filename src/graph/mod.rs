//! Dependency graph model and construction.
//!
//! [`DependencyGraph`] stores nodes and edges; [`GraphBuilder`] fills one
//! from a manifest or a source tree.
//!
//! # Example
//!
//! ```rust
//! use depscope::graph::{DependencyEdge, DependencyGraph, DependencyNode, EdgeKind};
//!
//! let mut graph = DependencyGraph::new();
//! graph.add_node(DependencyNode::package("react", "18.2.0"));
//! graph.add_node(DependencyNode::package("react-dom", "18.2.0"));
//! graph.add_edge(DependencyEdge::new("react-dom@18.2.0", "react@18.2.0", EdgeKind::Depends));
//!
//! assert_eq!(graph.node_count(), 2);
//! assert_eq!(graph.edge_count(), 1);
//! ```

mod builder;
mod dependency_graph;

pub use builder::{read_source, BuildOutput, FileContent, GraphBuilder, SourceFile};
pub use dependency_graph::{DependencyEdge, DependencyGraph, DependencyNode, EdgeKind, NodeKind};
