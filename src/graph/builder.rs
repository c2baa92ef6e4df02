//! Graph construction from manifests and source trees.
//!
//! Source-tree mode walks the root (sorted, so the result is deterministic),
//! keeps files that match the include globs and none of the exclude globs,
//! parses each one with the registered parser for its extension and turns
//! every import that a resolver can map into an `imports` edge. Per-file
//! read and parse failures are collected, never fatal.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use globset::GlobSet;
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

use super::dependency_graph::{DependencyEdge, DependencyGraph, DependencyNode, EdgeKind, NodeKind};
use crate::config::AnalysisConfig;
use crate::error::{Error, FileError, FileErrorKind, Result};
use crate::parser::{Dependency, Manifest, ParserRegistry};
use crate::progress::{CancellationToken, NoopObserver, ProgressEvent, ProgressObserver};
use crate::resolver::{relative_id, ResolveContext, ResolverRegistry};

/// A file selected for processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Absolute path on disk
    pub path: PathBuf,
    /// Root-relative node id
    pub id: String,
}

/// Raw file content plus the metadata recorded on its node.
#[derive(Debug, Clone)]
pub struct FileContent {
    pub text: String,
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
}

/// Result of a source-tree build.
#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub graph: DependencyGraph,
    /// Files read and handed to a parser (or recorded without one)
    pub files_analyzed: usize,
    pub file_errors: Vec<FileError>,
}

/// Builds [`DependencyGraph`]s. Borrowed registries and configuration are
/// read-only for the duration of a build.
pub struct GraphBuilder<'a> {
    config: &'a AnalysisConfig,
    parsers: &'a ParserRegistry,
    resolvers: &'a ResolverRegistry,
    observer: &'a dyn ProgressObserver,
    cancel: Option<&'a CancellationToken>,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(
        config: &'a AnalysisConfig,
        parsers: &'a ParserRegistry,
        resolvers: &'a ResolverRegistry,
    ) -> Self {
        Self {
            config,
            parsers,
            resolvers,
            observer: &NoopObserver,
            cancel: None,
        }
    }

    pub fn with_observer(mut self, observer: &'a dyn ProgressObserver) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_cancellation(mut self, token: &'a CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// The dependencies of `manifest` selected by the configuration flags.
    pub fn select_dependencies(&self, manifest: &Manifest) -> Vec<Dependency> {
        manifest.select(
            self.config.include_dev_dependencies,
            self.config.include_peer_dependencies,
            self.config.include_optional_dependencies,
        )
    }

    /// One `package` node per selected dependency, no edges.
    ///
    /// A manifest alone says nothing about dependency-of-dependency
    /// relationships, so none are inferred.
    pub fn build_from_manifest(&self, manifest: &Manifest) -> DependencyGraph {
        let deps = self.select_dependencies(manifest);
        let mut graph = DependencyGraph::with_capacity(deps.len(), 0);
        for dep in &deps {
            graph.add_node(DependencyNode::package(&dep.name, &dep.version).with_dep_type(dep.dep_type));
        }
        debug!(
            declared = manifest.len(),
            selected = deps.len(),
            "Built manifest graph"
        );
        graph
    }

    /// Walks `root` and builds the file graph.
    pub fn build_from_directory(&self, root: &Path) -> Result<BuildOutput> {
        let root = canonical_root(root)?;
        let files = self.discover_files(&root)?;
        self.observer
            .on_event(&ProgressEvent::FilesDiscovered { count: files.len() });

        let mut output = BuildOutput {
            graph: DependencyGraph::with_capacity(files.len(), files.len() * 2),
            files_analyzed: 0,
            file_errors: Vec::new(),
        };
        for file in &files {
            self.check_cancelled()?;
            let content = read_source(&file.path);
            self.process_file(&root, file, content, &mut output);
        }

        info!(
            root = %root.display(),
            files = output.files_analyzed,
            nodes = output.graph.node_count(),
            edges = output.graph.edge_count(),
            errors = output.file_errors.len(),
            "Built source graph"
        );
        Ok(output)
    }

    /// Same graph as [`build_from_directory`](Self::build_from_directory),
    /// with file reads issued concurrently up to `max_concurrent_reads`.
    #[cfg(feature = "concurrent-io")]
    pub async fn build_from_directory_async(&self, root: &Path) -> Result<BuildOutput> {
        use std::sync::Arc;
        use tokio::sync::Semaphore;
        use tokio::task::JoinSet;

        let root = canonical_root(root)?;
        let files = self.discover_files(&root)?;
        self.observer
            .on_event(&ProgressEvent::FilesDiscovered { count: files.len() });

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_reads.max(1)));
        let mut reads = JoinSet::new();
        for (idx, file) in files.iter().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            let path = file.path.clone();
            reads.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                (idx, read_source_async(&path).await)
            });
        }

        let mut contents: Vec<Option<std::result::Result<FileContent, FileError>>> =
            files.iter().map(|_| None).collect();
        while let Some(joined) = reads.join_next().await {
            self.check_cancelled()?;
            let (idx, content) = joined
                .map_err(|e| Error::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?;
            contents[idx] = Some(content);
        }

        let mut output = BuildOutput {
            graph: DependencyGraph::with_capacity(files.len(), files.len() * 2),
            files_analyzed: 0,
            file_errors: Vec::new(),
        };
        for (file, content) in files.iter().zip(contents) {
            self.check_cancelled()?;
            let content = content.unwrap_or_else(|| {
                Err(FileError::new(&file.path, FileErrorKind::ReadFailed, "read task did not complete"))
            });
            self.process_file(&root, file, content, &mut output);
        }
        Ok(output)
    }

    /// Lists matching files under `root` in sorted path order.
    pub fn discover_files(&self, root: &Path) -> Result<Vec<SourceFile>> {
        let include = self.config.include_set()?;
        let exclude = self.config.exclude_set()?;

        let mut walker = WalkDir::new(root).sort_by_file_name();
        if let Some(depth) = self.config.max_depth {
            walker = walker.max_depth(depth);
        }

        let mut files = Vec::new();
        for entry in walker
            .into_iter()
            .filter_entry(|e| !self.is_pruned(e, root, &exclude))
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "Failed to read directory entry, skipping");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(id) = relative_id(root, entry.path()) else {
                continue;
            };
            if include.is_match(&id) && !exclude.is_match(&id) {
                files.push(SourceFile {
                    path: entry.path().to_path_buf(),
                    id,
                });
            }
        }
        Ok(files)
    }

    /// Directories named in `ignored_dirs`, or matched by an exclude glob, are not descended into.
    fn is_pruned(&self, entry: &DirEntry, root: &Path, exclude: &GlobSet) -> bool {
        if entry.depth() == 0 || !entry.file_type().is_dir() {
            return false;
        }
        let name = entry.file_name().to_string_lossy();
        if self.config.ignored_dirs.iter().any(|d| d.as_str() == name.as_ref()) {
            return true;
        }
        relative_id(root, entry.path()).is_some_and(|rel| exclude.is_match(rel))
    }

    fn check_cancelled(&self) -> Result<()> {
        match self.cancel {
            Some(token) => token.check(),
            None => Ok(()),
        }
    }

    fn process_file(
        &self,
        root: &Path,
        file: &SourceFile,
        content: std::result::Result<FileContent, FileError>,
        output: &mut BuildOutput,
    ) {
        let graph = &mut output.graph;
        if !graph.contains(&file.id) {
            let name = file
                .path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| file.id.clone());
            graph.add_node(
                DependencyNode::new(&file.id, name, NodeKind::File)
                    .with_source(file.path.display().to_string()),
            );
        }

        let content = match content {
            Ok(content) => content,
            Err(err) => {
                self.record_failure(err, output);
                return;
            }
        };

        if let Some(node) = graph.get_node_mut(&file.id) {
            node.size = Some(content.size);
            node.last_modified = content.modified;
        }
        output.files_analyzed += 1;

        let Some(parser) = self.parsers.for_path(&file.path) else {
            debug!(file = %file.id, "No parser registered, recording node only");
            self.observer.on_event(&ProgressEvent::FileProcessed {
                path: file.path.clone(),
                edges: 0,
            });
            return;
        };

        let parsed = match parser.parse(&content.text, &file.path) {
            Ok(parsed) => parsed,
            Err(e) => {
                let err = FileError::new(&file.path, FileErrorKind::ParseFailed, e.to_string());
                self.record_failure(err, output);
                return;
            }
        };

        let ctx = ResolveContext { root };
        let graph = &mut output.graph;
        let mut added = 0;
        for import in &parsed.imports {
            let Some(target) = self.resolvers.resolve(import, &file.path, &ctx) else {
                continue;
            };
            if !graph.contains(&target.id) {
                graph.add_node(target.to_node());
            }
            let edge = DependencyEdge::new(&file.id, &target.id, EdgeKind::Imports)
                .with_dynamic(import.kind.is_dynamic());
            if graph.add_edge(edge) {
                added += 1;
            }
        }

        debug!(
            file = %file.id,
            parser = parser.name(),
            imports = parsed.imports.len(),
            edges = added,
            "Processed file"
        );
        self.observer.on_event(&ProgressEvent::FileProcessed {
            path: file.path.clone(),
            edges: added,
        });
    }

    fn record_failure(&self, err: FileError, output: &mut BuildOutput) {
        warn!(file = %err.path.display(), kind = %err.kind, error = %err.message, "Skipping file");
        self.observer.on_event(&ProgressEvent::FileFailed {
            path: err.path.clone(),
            message: err.message.clone(),
        });
        output.file_errors.push(err);
    }
}

fn canonical_root(root: &Path) -> Result<PathBuf> {
    root.canonicalize().map_err(|e| {
        Error::Io(std::io::Error::new(
            e.kind(),
            format!("scan root not found: {}", root.display()),
        ))
    })
}

/// Reads a file and its metadata.
pub fn read_source(path: &Path) -> std::result::Result<FileContent, FileError> {
    let bytes = fs::read(path)
        .map_err(|e| FileError::new(path, FileErrorKind::ReadFailed, e.to_string()))?;
    let modified = fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .map(DateTime::<Utc>::from);
    decode(path, bytes, modified)
}

#[cfg(feature = "concurrent-io")]
async fn read_source_async(path: &Path) -> std::result::Result<FileContent, FileError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| FileError::new(path, FileErrorKind::ReadFailed, e.to_string()))?;
    let modified = tokio::fs::metadata(path)
        .await
        .and_then(|m| m.modified())
        .ok()
        .map(DateTime::<Utc>::from);
    decode(path, bytes, modified)
}

fn decode(
    path: &Path,
    bytes: Vec<u8>,
    modified: Option<DateTime<Utc>>,
) -> std::result::Result<FileContent, FileError> {
    let size = bytes.len() as u64;
    let text = String::from_utf8(bytes)
        .map_err(|e| FileError::new(path, FileErrorKind::Encoding, e.to_string()))?;
    Ok(FileContent {
        text,
        size,
        modified,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::DependencyType;
    use std::sync::Mutex;
    use tempfile::TempDir;

    fn write(dir: &TempDir, rel: &str, content: &[u8]) {
        let path = dir.path().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn build(dir: &TempDir, config: &AnalysisConfig) -> BuildOutput {
        let parsers = ParserRegistry::with_defaults().unwrap();
        let resolvers = ResolverRegistry::with_defaults();
        GraphBuilder::new(config, &parsers, &resolvers)
            .build_from_directory(dir.path())
            .unwrap()
    }

    #[test]
    fn test_manifest_graph_has_package_nodes_only() {
        let config = AnalysisConfig::default();
        let parsers = ParserRegistry::new();
        let resolvers = ResolverRegistry::new();
        let builder = GraphBuilder::new(&config, &parsers, &resolvers);

        let mut manifest = Manifest::from_pairs([("lodash", "4.17.21"), ("left-pad", "1.3.0")]);
        manifest
            .dev_dependencies
            .insert("jest".to_string(), "29.0.0".to_string());

        let graph = builder.build_from_manifest(&manifest);
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 0);
        let lodash = graph.get_node("lodash@4.17.21").unwrap();
        assert_eq!(lodash.kind, NodeKind::Package);
        assert_eq!(lodash.dep_type, Some(DependencyType::Production));
    }

    #[test]
    fn test_manifest_dev_dependencies_when_enabled() {
        let config = AnalysisConfig {
            include_dev_dependencies: true,
            ..AnalysisConfig::default()
        };
        let parsers = ParserRegistry::new();
        let resolvers = ResolverRegistry::new();
        let mut manifest = Manifest::default();
        manifest
            .dev_dependencies
            .insert("jest".to_string(), "29.0.0".to_string());

        let graph = GraphBuilder::new(&config, &parsers, &resolvers).build_from_manifest(&manifest);
        assert!(graph.contains("jest@29.0.0"));
    }

    #[test]
    fn test_source_tree_edges() {
        let dir = TempDir::new().unwrap();
        write(&dir, "src/a.ts", b"import { b } from './b';\nimport React from 'react';\n");
        write(&dir, "src/b.ts", b"export const b = () => import('./c');\n");
        write(&dir, "src/c.ts", b"export const c = 1;\n");

        let output = build(&dir, &AnalysisConfig::default());
        let graph = &output.graph;

        assert_eq!(output.files_analyzed, 3);
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 2);
        assert!(graph.contains_edge("src/a.ts", "src/b.ts", EdgeKind::Imports));
        let dynamic = graph.edges_from("src/b.ts");
        assert_eq!(dynamic.len(), 1);
        assert!(dynamic[0].dynamic);

        let a = graph.get_node("src/a.ts").unwrap();
        assert_eq!(a.kind, NodeKind::File);
        assert_eq!(a.name, "a.ts");
        let on_disk = fs::metadata(dir.path().join("src/a.ts")).unwrap().len();
        assert_eq!(a.size, Some(on_disk));
        assert!(a.last_modified.is_some());
        assert!(graph.find_dangling_references().is_empty());
    }

    #[test]
    fn test_duplicate_imports_create_one_edge() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.js", b"import './b';\nrequire('./b');\nimport x from './b.js';\n");
        write(&dir, "b.js", b"");

        let output = build(&dir, &AnalysisConfig::default());
        assert_eq!(output.graph.edge_count(), 1);
    }

    #[test]
    fn test_exclude_and_ignored_dirs() {
        let dir = TempDir::new().unwrap();
        write(&dir, "src/a.ts", b"import './gen/x';\n");
        write(&dir, "src/types.d.ts", b"");
        write(&dir, "node_modules/pkg/index.js", b"");
        write(&dir, "generated/out.ts", b"");
        write(&dir, "README.md", b"# hi");

        let config = AnalysisConfig {
            exclude_patterns: vec!["**/*.d.ts".to_string(), "generated".to_string()],
            ..AnalysisConfig::default()
        };
        let ids: Vec<String> = build(&dir, &config)
            .graph
            .node_ids()
            .map(String::from)
            .collect();
        assert_eq!(ids, vec!["src/a.ts"]);
    }

    #[test]
    fn test_single_star_include_skips_nested_files() {
        let dir = TempDir::new().unwrap();
        write(&dir, "src/a.ts", b"");
        write(&dir, "src/nested/b.ts", b"");

        let config = AnalysisConfig {
            include_patterns: vec!["src/*.ts".to_string()],
            ..AnalysisConfig::default()
        };
        let output = build(&dir, &config);
        assert_eq!(output.graph.node_ids().collect::<Vec<_>>(), vec!["src/a.ts"]);
    }

    #[test]
    fn test_directory_index_imports_create_edges() {
        let dir = TempDir::new().unwrap();
        write(&dir, "src/index.ts", b"export const x = 1;\n");
        write(&dir, "src/a.ts", b"import { x } from '.';\n");
        write(&dir, "src/sub/b.ts", b"const root = require('..');\n");

        let graph = build(&dir, &AnalysisConfig::default()).graph;
        assert!(graph.contains_edge("src/a.ts", "src/index.ts", EdgeKind::Imports));
        assert!(graph.contains_edge("src/sub/b.ts", "src/index.ts", EdgeKind::Imports));
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn test_max_depth_limits_traversal() {
        let dir = TempDir::new().unwrap();
        write(&dir, "top.ts", b"");
        write(&dir, "one/two/deep.ts", b"");

        let config = AnalysisConfig {
            max_depth: Some(1),
            ..AnalysisConfig::default()
        };
        let output = build(&dir, &config);
        assert_eq!(output.graph.node_ids().collect::<Vec<_>>(), vec!["top.ts"]);
    }

    #[test]
    fn test_unreadable_file_is_recorded_not_fatal() {
        let dir = TempDir::new().unwrap();
        write(&dir, "bad.ts", &[0xff, 0xfe, 0x00, 0x41]);
        write(&dir, "good.ts", b"import './bad';\n");

        let events = Mutex::new(Vec::new());
        let observer = |e: &ProgressEvent| events.lock().unwrap().push(e.clone());
        let config = AnalysisConfig::default();
        let parsers = ParserRegistry::with_defaults().unwrap();
        let resolvers = ResolverRegistry::with_defaults();
        let output = GraphBuilder::new(&config, &parsers, &resolvers)
            .with_observer(&observer)
            .build_from_directory(dir.path())
            .unwrap();

        assert_eq!(output.file_errors.len(), 1);
        assert_eq!(output.file_errors[0].kind, FileErrorKind::Encoding);
        assert_eq!(output.files_analyzed, 1);
        // bad.ts is still a node; good.ts still points at it
        assert!(output.graph.contains("bad.ts"));
        assert_eq!(output.graph.edge_count(), 1);

        let events = events.lock().unwrap();
        assert_eq!(events[0], ProgressEvent::FilesDiscovered { count: 2 });
        assert!(events
            .iter()
            .any(|e| matches!(e, ProgressEvent::FileFailed { .. })));
    }

    #[test]
    fn test_cancelled_build_stops() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.ts", b"");

        let config = AnalysisConfig::default();
        let parsers = ParserRegistry::with_defaults().unwrap();
        let resolvers = ResolverRegistry::with_defaults();
        let token = CancellationToken::new();
        token.cancel();

        let result = GraphBuilder::new(&config, &parsers, &resolvers)
            .with_cancellation(&token)
            .build_from_directory(dir.path());
        assert!(matches!(result, Err(Error::Cancelled)));
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let config = AnalysisConfig::default();
        let parsers = ParserRegistry::new();
        let resolvers = ResolverRegistry::new();
        let result = GraphBuilder::new(&config, &parsers, &resolvers)
            .build_from_directory(Path::new("/definitely/not/a/dir"));
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn test_rebuild_is_deterministic() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.ts", b"import './b';\nimport './c';\n");
        write(&dir, "b.ts", b"import './c';\n");
        write(&dir, "c.ts", b"import './a';\n");

        let first = build(&dir, &AnalysisConfig::default());
        let second = build(&dir, &AnalysisConfig::default());
        assert!(first.graph.structurally_eq(&second.graph));
        assert_eq!(
            first.graph.nodes().cloned().collect::<Vec<_>>(),
            second.graph.nodes().cloned().collect::<Vec<_>>()
        );
    }

    #[cfg(feature = "concurrent-io")]
    #[tokio::test]
    async fn test_async_build_matches_sync() {
        let dir = TempDir::new().unwrap();
        for i in 0..20 {
            write(&dir, &format!("m{}.ts", i), format!("import './m{}';\n", (i + 1) % 20).as_bytes());
        }
        let config = AnalysisConfig {
            max_concurrent_reads: 3,
            ..AnalysisConfig::default()
        };
        let parsers = ParserRegistry::with_defaults().unwrap();
        let resolvers = ResolverRegistry::with_defaults();
        let builder = GraphBuilder::new(&config, &parsers, &resolvers);

        let sync = builder.build_from_directory(dir.path()).unwrap();
        let concurrent = builder.build_from_directory_async(dir.path()).await.unwrap();
        assert_eq!(concurrent.graph.edge_count(), 20);
        assert!(sync.graph.structurally_eq(&concurrent.graph));
    }
}
