//! DepScope - dependency graph analysis for JavaScript, TypeScript and Python projects
//!
//! This crate builds a directed dependency graph from a package manifest, a
//! source tree, or both, and analyzes it: cycles with severity and remediation
//! hints, per-node depth and the critical path, heuristic vulnerability and
//! optimization advice, summary statistics, and JSON/DOT/Mermaid/CSV exports.
//!
//! ```no_run
//! use std::path::Path;
//! use depscope::export::ExportFormat;
//! use depscope::Analyzer;
//!
//! # fn main() -> depscope::Result<()> {
//! let analysis = Analyzer::new()?.analyze_directory(Path::new("."))?;
//! for cycle in &analysis.cycles {
//!     println!("{} ({})", cycle.path(), cycle.severity);
//! }
//! println!("{}", analysis.export(ExportFormat::Dot)?);
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod config;
pub mod error;
pub mod export;
pub mod graph;
pub mod parser;
pub mod progress;
pub mod resolver;

pub use analysis::{Analysis, AnalysisMetrics, Analyzer};
pub use config::AnalysisConfig;
pub use error::{Error, FileError, FileErrorKind, Result};
pub use export::ExportFormat;
pub use graph::{DependencyEdge, DependencyGraph, DependencyNode, EdgeKind, NodeKind};
pub use progress::{CancellationToken, ProgressEvent, ProgressObserver};
