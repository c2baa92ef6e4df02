//! JSON export implementation.
//!
//! Exports the graph in JSON format for machine-readable output.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::{self, Write};

use super::{sorted_edges, Exporter};
use crate::analysis::GraphStats;
use crate::graph::{DependencyEdge, DependencyGraph, DependencyNode};

/// JSON exporter implementation.
pub struct JsonExporter;

/// Serializable view of a graph.
#[derive(Debug, Serialize)]
pub struct GraphDocument<'a> {
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analyzed_at: Option<DateTime<Utc>>,
    pub nodes: Vec<&'a DependencyNode>,
    pub edges: Vec<&'a DependencyEdge>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<&'a GraphStats>,
}

impl<'a> GraphDocument<'a> {
    pub fn new(graph: &'a DependencyGraph) -> Self {
        Self {
            created_at: graph.created_at(),
            analyzed_at: graph.analyzed_at(),
            nodes: graph.nodes().collect(),
            edges: sorted_edges(graph),
            stats: graph.stats(),
        }
    }
}

impl Exporter for JsonExporter {
    fn export<W: Write>(&self, graph: &DependencyGraph, writer: &mut W) -> io::Result<()> {
        let json = serde_json::to_string_pretty(&GraphDocument::new(graph))
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        writeln!(writer, "{}", json)
    }
}
