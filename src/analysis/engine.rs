//! The analysis pipeline.
//!
//! An [`Analyzer`] owns everything a run needs (configuration, parser and
//! resolver registries, similarity strategy, observer, cancellation token),
//! so independent analyzers never share state. Every entry point builds a
//! graph and then runs the same pipeline:
//!
//! 1. annotate critical nodes
//! 2. detect cycles and mark their members `cyclic`
//! 3. compute depths and the critical path
//! 4. vulnerabilities and optimizations, when enabled
//! 5. statistics
//!
//! Annotation (steps 1 to 3) completes before anything reads `cyclic` or
//! `depth`.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde::{Serialize, Serializer};
use tracing::{debug, info};

use super::critical_path::DepthAnalysis;
use super::cycles::{find_cycles, mark_cyclic, CyclicDependency};
use super::optimizations::{suggest_optimizations, Optimization};
use super::similarity::{AffixSimilarity, SimilarityStrategy};
use super::stats::GraphStats;
use super::vulnerabilities::{detect_vulnerabilities, Vulnerability};
use crate::config::AnalysisConfig;
use crate::error::{Error, FileError, Result};
use crate::export::{self, ExportFormat, GraphDocument};
use crate::graph::{BuildOutput, DependencyGraph, GraphBuilder};
use crate::parser::{load_manifest, Manifest, ParserRegistry};
use crate::progress::{CancellationToken, NoopObserver, Phase, ProgressEvent, ProgressObserver};
use crate::resolver::{PackageResolver, ResolverRegistry};

/// Run metrics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisMetrics {
    /// Wall-clock time in milliseconds
    pub analysis_time: u64,
    /// Estimated heap footprint of the graph in bytes
    pub memory_usage: usize,
    pub files_analyzed: usize,
    /// Edge count
    pub dependencies_found: usize,
    /// Cycles plus vulnerabilities
    pub issues_identified: usize,
    pub optimizations_proposed: usize,
}

/// Everything one run produced.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    #[serde(serialize_with = "serialize_graph")]
    pub graph: DependencyGraph,
    pub cycles: Vec<CyclicDependency>,
    pub critical_path: Vec<String>,
    pub vulnerabilities: Vec<Vulnerability>,
    pub optimizations: Vec<Optimization>,
    pub stats: GraphStats,
    pub metrics: AnalysisMetrics,
    pub file_errors: Vec<FileError>,
}

fn serialize_graph<S: Serializer>(graph: &DependencyGraph, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    GraphDocument::new(graph).serialize(serializer)
}

impl Analysis {
    /// Exports the analyzed graph.
    pub fn export(&self, format: ExportFormat) -> Result<String> {
        export::export(&self.graph, format)
    }
}

/// Runs analyses.
///
/// ```no_run
/// use std::path::Path;
/// use depscope::{AnalysisConfig, Analyzer};
///
/// # fn main() -> depscope::Result<()> {
/// let analyzer = Analyzer::new()?.with_config(AnalysisConfig::default());
/// let analysis = analyzer.analyze_directory(Path::new("./src"))?;
/// println!("{} cycles", analysis.cycles.len());
/// # Ok(())
/// # }
/// ```
pub struct Analyzer {
    config: AnalysisConfig,
    parsers: ParserRegistry,
    resolvers: ResolverRegistry,
    similarity: Option<Arc<dyn SimilarityStrategy>>,
    observer: Arc<dyn ProgressObserver>,
    cancel: CancellationToken,
}

impl Analyzer {
    /// An analyzer with the default configuration and built-in parsers and resolvers.
    pub fn new() -> Result<Self> {
        Ok(Self::with_registries(
            ParserRegistry::with_defaults()?,
            ResolverRegistry::with_defaults(),
        ))
    }

    /// An analyzer using exactly the given registries.
    pub fn with_registries(parsers: ParserRegistry, resolvers: ResolverRegistry) -> Self {
        Self {
            config: AnalysisConfig::default(),
            parsers,
            resolvers,
            similarity: None,
            observer: Arc::new(NoopObserver),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_config(mut self, config: AnalysisConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_parsers(mut self, parsers: ParserRegistry) -> Self {
        self.parsers = parsers;
        self
    }

    pub fn with_resolvers(mut self, resolvers: ResolverRegistry) -> Self {
        self.resolvers = resolvers;
        self
    }

    pub fn with_observer<O: ProgressObserver + 'static>(mut self, observer: O) -> Self {
        self.observer = Arc::new(observer);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Replaces the default [`AffixSimilarity`] grouping.
    pub fn with_similarity<S: SimilarityStrategy + 'static>(mut self, strategy: S) -> Self {
        self.similarity = Some(Arc::new(strategy));
        self
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Registry handle for adding parsers before a run.
    pub fn parsers_mut(&mut self) -> &mut ParserRegistry {
        &mut self.parsers
    }

    /// Registry handle for adding resolvers before a run.
    pub fn resolvers_mut(&mut self) -> &mut ResolverRegistry {
        &mut self.resolvers
    }

    /// Analyzes a manifest. Produces package nodes only.
    pub fn analyze_manifest(&self, manifest: &Manifest) -> Result<Analysis> {
        let started = Instant::now();
        self.config.validate()?;
        let graph = self.phase(Phase::Build, || {
            self.builder(&self.resolvers).build_from_manifest(manifest)
        })?;
        self.finish(graph, 0, Vec::new(), started)
    }

    /// Loads a `package.json` and analyzes it.
    pub fn analyze_manifest_file(&self, path: &Path) -> Result<Analysis> {
        let manifest = load_manifest(path).map_err(|e| Error::from_manifest(path, e))?;
        self.analyze_manifest(&manifest)
    }

    /// Analyzes the source tree under `root`.
    pub fn analyze_directory(&self, root: &Path) -> Result<Analysis> {
        let started = Instant::now();
        self.config.validate()?;
        let output = self.build_directory(root, &self.resolvers)?;
        self.finish(output.graph, output.files_analyzed, output.file_errors, started)
    }

    /// Manifest and source tree together. Bare imports resolve to the
    /// manifest's packages, and both graphs are merged.
    pub fn analyze_project(&self, root: &Path, manifest: &Manifest) -> Result<Analysis> {
        let started = Instant::now();
        self.config.validate()?;

        let (graph, output) = self.phase(Phase::Build, || -> Result<_> {
            let mut graph = self.builder(&self.resolvers).build_from_manifest(manifest);
            let resolvers = self.project_resolvers(manifest);
            let output = self.builder(&resolvers).build_from_directory(root)?;
            let added = graph.merge(&output.graph);
            debug!(edges = added, nodes = graph.node_count(), "Merged source graph into manifest graph");
            Ok((graph, output))
        })??;

        self.finish(graph, output.files_analyzed, output.file_errors, started)
    }

    /// [`analyze_directory`](Self::analyze_directory) with concurrent file reads.
    #[cfg(feature = "concurrent-io")]
    pub async fn analyze_directory_async(&self, root: &Path) -> Result<Analysis> {
        let started = Instant::now();
        self.config.validate()?;
        self.cancel.check()?;
        self.observer.on_event(&ProgressEvent::PhaseStarted(Phase::Build));
        let output = self
            .builder(&self.resolvers)
            .build_from_directory_async(root)
            .await?;
        self.observer.on_event(&ProgressEvent::PhaseCompleted(Phase::Build));
        self.finish(output.graph, output.files_analyzed, output.file_errors, started)
    }

    fn builder<'a>(&'a self, resolvers: &'a ResolverRegistry) -> GraphBuilder<'a> {
        GraphBuilder::new(&self.config, &self.parsers, resolvers)
            .with_observer(&*self.observer)
            .with_cancellation(&self.cancel)
    }

    fn build_directory(&self, root: &Path, resolvers: &ResolverRegistry) -> Result<BuildOutput> {
        self.phase(Phase::Build, || self.builder(resolvers).build_from_directory(root))?
    }

    fn project_resolvers(&self, manifest: &Manifest) -> ResolverRegistry {
        let deps = self.builder(&self.resolvers).select_dependencies(manifest);
        let mut resolvers = self.resolvers.clone();
        resolvers.register(PackageResolver::from_dependencies(&deps));
        resolvers
    }

    fn phase<T>(&self, phase: Phase, run: impl FnOnce() -> T) -> Result<T> {
        self.cancel.check()?;
        self.observer.on_event(&ProgressEvent::PhaseStarted(phase));
        let value = run();
        self.observer.on_event(&ProgressEvent::PhaseCompleted(phase));
        debug!(?phase, "Phase completed");
        Ok(value)
    }

    fn finish(
        &self,
        mut graph: DependencyGraph,
        files_analyzed: usize,
        file_errors: Vec<FileError>,
        started: Instant,
    ) -> Result<Analysis> {
        self.phase(Phase::Annotate, || mark_critical(&mut graph, &self.config.critical_nodes))?;

        let cycles = self.phase(Phase::Cycles, || {
            let cycles = find_cycles(&graph);
            mark_cyclic(&mut graph, &cycles);
            cycles
        })?;

        let critical_path = self.phase(Phase::CriticalPath, || {
            let depths = DepthAnalysis::compute(&graph);
            depths.apply(&mut graph);
            depths.critical_path()
        })?;

        let vulnerabilities = self.phase(Phase::Vulnerabilities, || {
            if self.config.detect_vulnerabilities {
                detect_vulnerabilities(&graph, &self.config, Utc::now())
            } else {
                Vec::new()
            }
        })?;

        let optimizations = self.phase(Phase::Optimizations, || {
            if !self.config.suggest_optimizations {
                return Vec::new();
            }
            match &self.similarity {
                Some(strategy) => suggest_optimizations(&graph, &cycles, strategy.as_ref()),
                None => suggest_optimizations(&graph, &cycles, &AffixSimilarity::from_config(&self.config)),
            }
        })?;

        let stats = self.phase(Phase::Stats, || graph.refresh_stats())?;
        graph.mark_analyzed();

        let metrics = AnalysisMetrics {
            analysis_time: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            memory_usage: graph.approximate_memory(),
            files_analyzed,
            dependencies_found: graph.edge_count(),
            issues_identified: cycles.len() + vulnerabilities.len(),
            optimizations_proposed: optimizations.len(),
        };
        info!(
            nodes = stats.total_nodes,
            edges = stats.total_edges,
            cycles = cycles.len(),
            vulnerabilities = vulnerabilities.len(),
            optimizations = optimizations.len(),
            file_errors = file_errors.len(),
            elapsed_ms = metrics.analysis_time,
            "Analysis complete"
        );

        Ok(Analysis {
            graph,
            cycles,
            critical_path,
            vulnerabilities,
            optimizations,
            stats,
            metrics,
            file_errors,
        })
    }
}

/// Flags nodes whose id or name is listed as critical.
fn mark_critical(graph: &mut DependencyGraph, critical: &[String]) {
    if critical.is_empty() {
        return;
    }
    let ids: Vec<String> = graph
        .nodes()
        .filter(|n| critical.iter().any(|c| *c == n.id || *c == n.name))
        .map(|n| n.id.clone())
        .collect();
    for id in ids {
        if let Some(node) = graph.get_node_mut(&id) {
            node.critical = true;
        }
    }
}
