//! Mermaid flowchart export.

use std::collections::BTreeMap;
use std::io::{self, Write};

use super::{sorted_edges, Exporter};
use crate::graph::DependencyGraph;

/// Mermaid exporter. Node ids are replaced by positional aliases (`n0`,
/// `n1`, ...) because Mermaid ids cannot contain `/`, `@` or `.`.
pub struct MermaidExporter;

impl MermaidExporter {
    fn label(value: &str) -> String {
        value.replace('"', "#quot;")
    }
}

impl Exporter for MermaidExporter {
    fn export<W: Write>(&self, graph: &DependencyGraph, writer: &mut W) -> io::Result<()> {
        writeln!(writer, "graph LR")?;

        let mut aliases: BTreeMap<&str, String> = BTreeMap::new();
        let mut cyclic = Vec::new();
        for (i, node) in graph.nodes().enumerate() {
            let alias = format!("n{}", i);
            writeln!(writer, "  {}[\"{}\"]", alias, Self::label(&node.id))?;
            if node.cyclic {
                cyclic.push(alias.clone());
            }
            aliases.insert(node.id.as_str(), alias);
        }

        for edge in sorted_edges(graph) {
            let (Some(from), Some(to)) = (aliases.get(edge.from.as_str()), aliases.get(edge.to.as_str())) else {
                continue;
            };
            let arrow = if edge.optional || edge.dynamic { "-.->" } else { "-->" };
            writeln!(writer, "  {} {}|{}| {}", from, arrow, edge.kind, to)?;
        }

        if !cyclic.is_empty() {
            writeln!(writer, "  classDef cyclic fill:#f8d7da,stroke:#c00")?;
            writeln!(writer, "  class {} cyclic", cyclic.join(","))?;
        }
        Ok(())
    }
}
