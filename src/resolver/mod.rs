//! Import resolution: maps an import specifier plus its originating file to
//! a concrete graph node.
//!
//! Resolvers are registered by name on a [`ResolverRegistry`] owned by the
//! analysis engine. They are tried in registration order and the first one
//! that answers wins. An import no resolver can map is dropped: it simply
//! does not appear in the graph.
//!
//! Built-in resolvers:
//!
//! - [`RelativeResolver`] (`relative`): JS/TS `./` and `../` specifiers
//! - [`PythonResolver`] (`python`): dotted and relative Python modules
//! - [`PackageResolver`] (`package`): bare npm specifiers to manifest packages

mod package;
mod python;
mod relative;

pub use package::PackageResolver;
pub use python::PythonResolver;
pub use relative::RelativeResolver;

use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use tracing::trace;

use crate::graph::{DependencyNode, NodeKind};
use crate::parser::Import;

/// Where an import points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Graph node id of the target
    pub id: String,
    pub name: String,
    pub version: Option<String>,
    pub kind: NodeKind,
    /// Origin path or package locator
    pub source: String,
    /// Absolute path for file targets
    pub path: Option<PathBuf>,
}

impl Resolution {
    /// A file inside the scan root.
    pub fn file(root: &Path, path: PathBuf) -> Option<Self> {
        let id = relative_id(root, &path)?;
        let name = path.file_name()?.to_string_lossy().into_owned();
        Some(Self {
            id,
            name,
            version: None,
            kind: NodeKind::File,
            source: path.display().to_string(),
            path: Some(path),
        })
    }

    /// The node to create when the target is first referenced.
    pub fn to_node(&self) -> DependencyNode {
        let mut node = DependencyNode::new(&self.id, &self.name, self.kind).with_source(&self.source);
        node.version = self.version.clone();
        node
    }
}

/// Context shared by all resolvers during one build.
#[derive(Debug, Clone, Copy)]
pub struct ResolveContext<'a> {
    /// Scan root; file resolutions must stay inside it
    pub root: &'a Path,
}

/// Maps an import to a graph node.
pub trait ImportResolver: Send + Sync {
    /// Registry key.
    fn name(&self) -> &str;

    /// Resolves `import`, found in `from_file`, or returns `None`.
    fn resolve(&self, import: &Import, from_file: &Path, ctx: &ResolveContext<'_>) -> Option<Resolution>;
}

/// Named resolvers, tried in registration order.
///
/// # Example
///
/// ```
/// use depscope::resolver::ResolverRegistry;
///
/// let registry = ResolverRegistry::with_defaults();
/// let names: Vec<&str> = registry.names().collect();
/// assert_eq!(names, vec!["relative", "python"]);
/// ```
#[derive(Default, Clone)]
pub struct ResolverRegistry {
    resolvers: Vec<(String, Arc<dyn ImportResolver>)>,
}

impl ResolverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The `relative` and `python` resolvers.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(RelativeResolver::new());
        registry.register(PythonResolver::new());
        registry
    }

    /// Registers a resolver under its name. Re-registering a name replaces
    /// the resolver but keeps its position.
    pub fn register<R: ImportResolver + 'static>(&mut self, resolver: R) {
        self.register_shared(Arc::new(resolver));
    }

    pub fn register_shared(&mut self, resolver: Arc<dyn ImportResolver>) {
        let name = resolver.name().to_string();
        match self.resolvers.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = resolver,
            None => self.resolvers.push((name, resolver)),
        }
    }

    /// Removes a resolver by name; returns whether one was registered.
    pub fn unregister(&mut self, name: &str) -> bool {
        let before = self.resolvers.len();
        self.resolvers.retain(|(n, _)| n != name);
        self.resolvers.len() != before
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn ImportResolver>> {
        self.resolvers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, r)| r)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.resolvers.iter().map(|(n, _)| n.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }

    /// Asks each resolver in turn; the first answer wins.
    pub fn resolve(&self, import: &Import, from_file: &Path, ctx: &ResolveContext<'_>) -> Option<Resolution> {
        self.resolvers.iter().find_map(|(name, resolver)| {
            let resolution = resolver.resolve(import, from_file, ctx)?;
            trace!(resolver = %name, specifier = %import.specifier, target = %resolution.id, "Resolved import");
            Some(resolution)
        })
    }
}

impl fmt::Debug for ResolverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// Root-relative id with `/` separators, or `None` outside the root.
pub fn relative_id(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        return None;
    }
    Some(parts.join("/"))
}

/// Lexically resolves `.` and `..` components.
pub(crate) fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// True for the JavaScript family of extensions.
pub(crate) fn is_js_family(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref(),
        Some("js" | "jsx" | "mjs" | "cjs" | "ts" | "tsx" | "mts" | "cts")
    )
}
