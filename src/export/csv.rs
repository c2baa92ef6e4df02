//! CSV export implementation.
//!
//! One row per edge, for spreadsheet use.

use super::{sorted_edges, Exporter};
use crate::graph::DependencyGraph;
use std::io::{self, Write};

/// CSV exporter implementation.
pub struct CsvExporter;

impl CsvExporter {
    /// Escape a field value for CSV format.
    ///
    /// Wraps the value in quotes if it contains commas, quotes, or newlines.
    fn escape_field(value: &str) -> String {
        if value.contains(',') || value.contains('"') || value.contains('\n') {
            format!("\"{}\"", value.replace('"', "\"\""))
        } else {
            value.to_string()
        }
    }
}

impl Exporter for CsvExporter {
    fn export<W: Write>(&self, graph: &DependencyGraph, writer: &mut W) -> io::Result<()> {
        writeln!(writer, "from,to,type,optional,weight")?;

        for edge in sorted_edges(graph) {
            writeln!(
                writer,
                "{},{},{},{},{}",
                Self::escape_field(&edge.from),
                Self::escape_field(&edge.to),
                edge.kind,
                edge.optional,
                edge.weight
            )?;
        }

        Ok(())
    }
}
