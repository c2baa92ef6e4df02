//! Graph export in JSON, DOT, Mermaid and CSV.
//!
//! Every exporter is a pure function of the graph: nodes are written in id
//! order and edges in `(from, to, kind)` order, so exporting the same graph
//! twice produces identical bytes.

pub mod csv;
pub mod dot;
pub mod json;
pub mod mermaid;

pub use json::GraphDocument;

use std::io::{self, Write};

use crate::error::{Error, Result};
use crate::graph::{DependencyEdge, DependencyGraph};

/// Export format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// JSON format - nodes, edges and cached stats
    Json,
    /// Graphviz digraph
    Dot,
    /// Mermaid flowchart
    Mermaid,
    /// One row per edge
    Csv,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 4] = [
        ExportFormat::Json,
        ExportFormat::Dot,
        ExportFormat::Mermaid,
        ExportFormat::Csv,
    ];
}

impl std::str::FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "dot" | "graphviz" => Ok(ExportFormat::Dot),
            "mermaid" | "mmd" => Ok(ExportFormat::Mermaid),
            "csv" => Ok(ExportFormat::Csv),
            _ => Err(Error::UnsupportedFormat(s.to_string())),
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportFormat::Json => write!(f, "json"),
            ExportFormat::Dot => write!(f, "dot"),
            ExportFormat::Mermaid => write!(f, "mermaid"),
            ExportFormat::Csv => write!(f, "csv"),
        }
    }
}

/// Trait for exporters.
pub trait Exporter {
    /// Export the graph to the given writer.
    fn export<W: Write>(&self, graph: &DependencyGraph, writer: &mut W) -> io::Result<()>;
}

/// Export a graph in the specified format to a writer.
pub fn export_to<W: Write>(graph: &DependencyGraph, format: ExportFormat, writer: &mut W) -> io::Result<()> {
    match format {
        ExportFormat::Json => json::JsonExporter.export(graph, writer),
        ExportFormat::Dot => dot::DotExporter.export(graph, writer),
        ExportFormat::Mermaid => mermaid::MermaidExporter.export(graph, writer),
        ExportFormat::Csv => csv::CsvExporter.export(graph, writer),
    }
}

/// Export a graph to a string.
///
/// ```
/// use depscope::export::{export, ExportFormat};
/// use depscope::graph::DependencyGraph;
///
/// let csv = export(&DependencyGraph::new(), ExportFormat::Csv).unwrap();
/// assert_eq!(csv, "from,to,type,optional,weight\n");
/// ```
pub fn export(graph: &DependencyGraph, format: ExportFormat) -> Result<String> {
    let mut buffer = Vec::new();
    export_to(graph, format, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| Error::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
}

/// Parses `format` and exports; unknown names fail before any output is produced.
pub fn export_named(graph: &DependencyGraph, format: &str) -> Result<String> {
    export(graph, format.parse()?)
}

/// Edges ordered by `(from, to, kind)`.
pub(crate) fn sorted_edges(graph: &DependencyGraph) -> Vec<&DependencyEdge> {
    let mut edges: Vec<&DependencyEdge> = graph.edges().collect();
    edges.sort_by(|a, b| (&a.from, &a.to, a.kind).cmp(&(&b.from, &b.to, b.kind)));
    edges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{DependencyNode, EdgeKind, NodeKind};

    pub(crate) fn sample_graph() -> DependencyGraph {
        let mut graph = DependencyGraph::new();
        for id in ["src/c.ts", "src/a.ts", "src/b.ts"] {
            graph.add_node(DependencyNode::new(id, id, NodeKind::File));
        }
        graph.add_edge(DependencyEdge::new("src/b.ts", "src/c.ts", EdgeKind::Imports));
        graph.add_edge(DependencyEdge::new("src/a.ts", "src/b.ts", EdgeKind::Imports).with_optional(true));
        graph.add_edge(DependencyEdge::new("src/a.ts", "src/b.ts", EdgeKind::Calls).with_weight(2.5));
        graph
    }

    #[test]
    fn test_export_format_from_str() {
        assert_eq!("json".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert_eq!("JSON".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert_eq!("dot".parse::<ExportFormat>().unwrap(), ExportFormat::Dot);
        assert_eq!("mermaid".parse::<ExportFormat>().unwrap(), ExportFormat::Mermaid);
        assert_eq!("csv".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert!(matches!(
            "markdown".parse::<ExportFormat>(),
            Err(Error::UnsupportedFormat(name)) if name == "markdown"
        ));
    }

    #[test]
    fn test_export_format_display_round_trips() {
        for format in ExportFormat::ALL {
            assert_eq!(format.to_string().parse::<ExportFormat>().unwrap(), format);
        }
    }

    #[test]
    fn test_unsupported_format_produces_no_output() {
        let result = export_named(&sample_graph(), "xml");
        assert!(matches!(result, Err(Error::UnsupportedFormat(_))));
    }

    #[test]
    fn test_edges_sorted_by_identity() {
        let graph = sample_graph();
        let keys: Vec<(&str, &str, EdgeKind)> = sorted_edges(&graph)
            .into_iter()
            .map(|e| (e.from.as_str(), e.to.as_str(), e.kind))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("src/a.ts", "src/b.ts", EdgeKind::Imports),
                ("src/a.ts", "src/b.ts", EdgeKind::Calls),
                ("src/b.ts", "src/c.ts", EdgeKind::Imports),
            ]
        );
    }

    #[test]
    fn test_every_format_is_deterministic() {
        let graph = sample_graph();
        for format in ExportFormat::ALL {
            assert_eq!(export(&graph, format).unwrap(), export(&graph, format).unwrap());
        }
    }
}
