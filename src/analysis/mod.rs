//! Graph analysis passes and the pipeline that runs them.
//!
//! Each pass is a plain function over a [`DependencyGraph`](crate::graph::DependencyGraph)
//! and can be used on its own; [`Analyzer`] chains them for a full run.

pub mod critical_path;
pub mod cycles;
pub mod engine;
pub mod optimizations;
pub mod similarity;
pub mod stats;
pub mod vulnerabilities;

pub use critical_path::{find_critical_path, DepthAnalysis};
pub use cycles::{find_cycles, mark_cyclic, CyclicDependency, Severity};
pub use engine::{Analysis, AnalysisMetrics, Analyzer};
pub use optimizations::{suggest_optimizations, Level, Optimization, OptimizationKind};
pub use similarity::{group_similar, AffixSimilarity, SimilarityStrategy};
pub use stats::{calculate_stats, GraphStats};
pub use vulnerabilities::{detect_vulnerabilities, Vulnerability, VulnerabilityKind};
