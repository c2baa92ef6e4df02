//! Graphviz DOT export.

use super::{sorted_edges, Exporter};
use crate::graph::DependencyGraph;
use std::io::{self, Write};

/// DOT exporter. Cyclic nodes are filled red; optional edges are dashed and
/// dynamic ones dotted.
pub struct DotExporter;

impl DotExporter {
    /// Quotes an identifier, escaping backslashes and double quotes.
    fn quote(value: &str) -> String {
        format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
    }
}

impl Exporter for DotExporter {
    fn export<W: Write>(&self, graph: &DependencyGraph, writer: &mut W) -> io::Result<()> {
        writeln!(writer, "digraph dependencies {{")?;
        writeln!(writer, "  rankdir=LR;")?;

        for node in graph.nodes() {
            let mut attrs = vec![format!("label={}", Self::quote(&node.name)), "shape=box".to_string()];
            if node.cyclic {
                attrs.push("style=filled".to_string());
                attrs.push("fillcolor=\"#f8d7da\"".to_string());
                attrs.push("color=red".to_string());
            }
            if node.critical {
                attrs.push("penwidth=2".to_string());
            }
            writeln!(writer, "  {} [{}];", Self::quote(&node.id), attrs.join(", "))?;
        }

        for edge in sorted_edges(graph) {
            let mut attrs = vec![format!("label={}", Self::quote(&edge.kind.to_string()))];
            if edge.optional {
                attrs.push("style=dashed".to_string());
            } else if edge.dynamic {
                attrs.push("style=dotted".to_string());
            }
            writeln!(
                writer,
                "  {} -> {} [{}];",
                Self::quote(&edge.from),
                Self::quote(&edge.to),
                attrs.join(", ")
            )?;
        }

        writeln!(writer, "}}")
    }
}
