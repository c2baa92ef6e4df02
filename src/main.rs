use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use depscope::parser::load_manifest;
use depscope::{AnalysisConfig, Analyzer, CancellationToken, Error, ExportFormat};

#[derive(Parser)]
#[command(name = "depscope")]
#[command(author = "Zachary Woods <143150513+zach-fau@users.noreply.github.com>")]
#[command(version)]
#[command(about = "Dependency graph analyzer: cycles, critical paths and exports", long_about = None)]
struct Cli {
    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a source tree, a manifest, or both
    Analyze {
        /// Path to analyze (defaults to current directory)
        #[arg(short, long, default_value = ".")]
        path: PathBuf,

        /// package.json to analyze; with --manifest-only the source tree is skipped
        #[arg(short, long)]
        manifest: Option<PathBuf>,

        /// Analyze the manifest alone
        #[arg(long, requires = "manifest")]
        manifest_only: bool,

        /// JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Export format: json, dot, mermaid or csv (summary report when omitted)
        #[arg(short, long)]
        format: Option<String>,

        /// Include devDependencies
        #[arg(long)]
        include_dev: bool,

        /// Include peerDependencies
        #[arg(long)]
        include_peer: bool,

        /// Abort after this many seconds
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
    /// Show version information
    Version,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "depscope=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Some(Commands::Analyze {
            path,
            manifest,
            manifest_only,
            config,
            format,
            include_dev,
            include_peer,
            timeout_secs,
        }) => {
            let mut config = match config {
                Some(file) => AnalysisConfig::from_file(&file)
                    .with_context(|| format!("loading config {}", file.display()))?,
                None => AnalysisConfig::default(),
            };
            config.include_dev_dependencies |= include_dev;
            config.include_peer_dependencies |= include_peer;

            let format: Option<ExportFormat> = format.map(|f| f.parse()).transpose()?;
            let token = match timeout_secs {
                Some(secs) => CancellationToken::with_timeout(Duration::from_secs(secs)),
                None => CancellationToken::new(),
            };
            let analyzer = Analyzer::new()?.with_config(config).with_cancellation(token);

            let analysis = match (manifest, manifest_only) {
                (Some(file), true) => analyzer.analyze_manifest_file(&file)?,
                (Some(file), false) => {
                    let manifest = load_manifest(&file).map_err(|e| Error::from_manifest(&file, e))?;
                    analyzer.analyze_project(&path, &manifest)?
                }
                (None, _) => analyze_path(&analyzer, &path)?,
            };

            match format {
                Some(format) => print!("{}", analysis.export(format)?),
                None => print_summary(&analysis),
            }
        }
        Some(Commands::Version) => {
            println!("depscope v{}", env!("CARGO_PKG_VERSION"));
        }
        None => {
            println!("DepScope - Dependency Graph Analyzer");
            println!("Run 'depscope analyze' to analyze a project");
            println!("Run 'depscope --help' for more information");
        }
    }
    Ok(())
}

/// Picks up `<path>/package.json` when present.
fn analyze_path(analyzer: &Analyzer, path: &Path) -> Result<depscope::Analysis> {
    let manifest_path = path.join("package.json");
    if manifest_path.is_file() {
        let manifest =
            load_manifest(&manifest_path).map_err(|e| Error::from_manifest(&manifest_path, e))?;
        return Ok(analyzer.analyze_project(path, &manifest)?);
    }
    Ok(analyzer.analyze_directory(path)?)
}

fn print_summary(analysis: &depscope::Analysis) {
    let stats = &analysis.stats;
    let metrics = &analysis.metrics;
    println!("Nodes: {}  Edges: {}", stats.total_nodes, stats.total_edges);
    println!(
        "Max depth: {}  Density: {:.4}  Complexity: {:.2}",
        stats.max_depth, stats.density, stats.complexity
    );
    println!(
        "Files analyzed: {}  Time: {} ms",
        metrics.files_analyzed, metrics.analysis_time
    );

    if !analysis.critical_path.is_empty() {
        println!("\nCritical path: {}", analysis.critical_path.join(" -> "));
    }
    if !analysis.cycles.is_empty() {
        println!("\nCycles ({}):", analysis.cycles.len());
        for cycle in &analysis.cycles {
            println!("  [{}] {}", cycle.severity, cycle.path());
        }
    }
    if !analysis.vulnerabilities.is_empty() {
        println!("\nVulnerabilities ({}):", analysis.vulnerabilities.len());
        for v in &analysis.vulnerabilities {
            println!("  [{}] {}: {}", v.severity, v.node_id, v.description);
        }
    }
    if !analysis.optimizations.is_empty() {
        println!("\nOptimizations ({}):", analysis.optimizations.len());
        for o in &analysis.optimizations {
            println!("  [{}] {}: {}", o.kind, o.targets.join(", "), o.impact);
        }
    }
    if !analysis.file_errors.is_empty() {
        println!("\nSkipped files ({}):", analysis.file_errors.len());
        for e in &analysis.file_errors {
            println!("  {}", e);
        }
    }
}
