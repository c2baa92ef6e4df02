//! Shared types for manifest and source parsing.
//!
//! This module defines the package manifest model used for manifest-mode
//! analysis, and the import/export records produced by source parsers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Represents the structure of a package.json file.
///
/// Only the fields needed for dependency analysis are captured; everything
/// else in the file is ignored.
///
/// # Example
///
/// ```
/// use depscope::parser::types::PackageJson;
///
/// let json = r#"{"name": "my-app", "version": "1.0.0"}"#;
/// let pkg: PackageJson = serde_json::from_str(json).unwrap();
/// assert_eq!(pkg.name, Some("my-app".to_string()));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PackageJson {
    /// The name of the package.
    pub name: Option<String>,

    /// The version of the package (semver format).
    pub version: Option<String>,

    /// A brief description of the package.
    pub description: Option<String>,

    /// Production dependencies required at runtime.
    pub dependencies: Option<BTreeMap<String, String>>,

    /// Development-only dependencies (testing, building, etc.).
    #[serde(rename = "devDependencies")]
    pub dev_dependencies: Option<BTreeMap<String, String>>,

    /// Peer dependencies that the host package must provide.
    #[serde(rename = "peerDependencies")]
    pub peer_dependencies: Option<BTreeMap<String, String>>,

    /// Optional dependencies that enhance functionality if available.
    #[serde(rename = "optionalDependencies")]
    pub optional_dependencies: Option<BTreeMap<String, String>>,
}

impl PackageJson {
    /// Returns true if the package has any dependencies defined.
    pub fn has_dependencies(&self) -> bool {
        self.dependency_count() > 0
    }

    /// Returns the total count of all dependencies.
    pub fn dependency_count(&self) -> usize {
        self.dependencies.as_ref().map_or(0, |d| d.len())
            + self.dev_dependencies.as_ref().map_or(0, |d| d.len())
            + self.peer_dependencies.as_ref().map_or(0, |d| d.len())
            + self.optional_dependencies.as_ref().map_or(0, |d| d.len())
    }
}

/// Categorizes the type of dependency relationship declared in a manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyType {
    /// Production dependencies - required at runtime.
    Production,

    /// Development dependencies - only needed during development.
    Development,

    /// Peer dependencies - expected to be provided by the consumer.
    Peer,

    /// Optional dependencies - installation continues even if they fail.
    Optional,
}

impl fmt::Display for DependencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DependencyType::Production => "production",
            DependencyType::Development => "development",
            DependencyType::Peer => "peer",
            DependencyType::Optional => "optional",
        };
        write!(f, "{}", s)
    }
}

/// Represents a single declared dependency with its metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    /// The package name (e.g., "react", "lodash").
    pub name: String,

    /// The version specifier (e.g., "^18.0.0", "~1.2.3").
    pub version: String,

    /// The category of this dependency.
    pub dep_type: DependencyType,
}

impl Dependency {
    /// Creates a new Dependency instance.
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        dep_type: DependencyType,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            dep_type,
        }
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{} ({})", self.name, self.version, self.dep_type)
    }
}

/// A resolved dependency manifest: name -> version maps per dependency class.
///
/// This is the input to manifest-mode analysis. It can be built from a flat
/// mapping or from a parsed package.json.
///
/// # Example
///
/// ```
/// use depscope::parser::Manifest;
///
/// let manifest = Manifest::from_pairs([("lodash", "4.17.21"), ("left-pad", "1.3.0")]);
/// assert_eq!(manifest.dependencies.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Runtime dependencies.
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
    /// Development-only dependencies.
    #[serde(default)]
    pub dev_dependencies: BTreeMap<String, String>,
    /// Peer dependencies.
    #[serde(default)]
    pub peer_dependencies: BTreeMap<String, String>,
    /// Optional dependencies.
    #[serde(default)]
    pub optional_dependencies: BTreeMap<String, String>,
}

impl Manifest {
    /// Builds a manifest holding only runtime dependencies.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            dependencies: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            ..Self::default()
        }
    }

    /// Selects the dependencies to include, in class order then name order.
    pub fn select(&self, include_dev: bool, include_peer: bool, include_optional: bool) -> Vec<Dependency> {
        let mut deps = Vec::new();
        let classes = [
            (&self.dependencies, DependencyType::Production, true),
            (&self.dev_dependencies, DependencyType::Development, include_dev),
            (&self.peer_dependencies, DependencyType::Peer, include_peer),
            (&self.optional_dependencies, DependencyType::Optional, include_optional),
        ];
        for (map, dep_type, included) in classes {
            if !included {
                continue;
            }
            for (name, version) in map {
                deps.push(Dependency::new(name, version, dep_type));
            }
        }
        deps
    }

    /// Total number of declared dependencies across all classes.
    pub fn len(&self) -> usize {
        self.dependencies.len()
            + self.dev_dependencies.len()
            + self.peer_dependencies.len()
            + self.optional_dependencies.len()
    }

    /// Returns true if nothing is declared.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<PackageJson> for Manifest {
    fn from(pkg: PackageJson) -> Self {
        Self {
            dependencies: pkg.dependencies.unwrap_or_default(),
            dev_dependencies: pkg.dev_dependencies.unwrap_or_default(),
            peer_dependencies: pkg.peer_dependencies.unwrap_or_default(),
            optional_dependencies: pkg.optional_dependencies.unwrap_or_default(),
        }
    }
}

/// The kind of import statement found in a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImportKind {
    /// Static import: `import ... from 'module'`, `import a.b`
    Static,
    /// CommonJS require: `const x = require('module')`
    Require,
    /// Dynamic import: `import('module')`
    Dynamic,
    /// Re-export: `export { x } from 'module'`
    ReExport,
}

impl ImportKind {
    /// Returns true for imports that are only resolved at runtime.
    pub fn is_dynamic(&self) -> bool {
        matches!(self, ImportKind::Dynamic)
    }
}

/// A single import reference extracted from a source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Import {
    /// The module specifier as written (e.g., "./utils", "react", ".models").
    pub specifier: String,
    /// The kind of import.
    pub kind: ImportKind,
    /// Line number in the source file (1-indexed).
    pub line: usize,
}

impl Import {
    pub fn new(specifier: impl Into<String>, kind: ImportKind, line: usize) -> Self {
        Self {
            specifier: specifier.into(),
            kind,
            line,
        }
    }

    /// Returns true if the specifier is a relative path, including the bare
    /// directory forms `.` and `..`.
    pub fn is_relative(&self) -> bool {
        matches!(self.specifier.as_str(), "." | "..")
            || self.specifier.starts_with("./")
            || self.specifier.starts_with("../")
    }

    /// Returns the npm package name for bare specifiers.
    ///
    /// Handles scoped packages: `@scope/pkg/sub` -> `@scope/pkg`.
    pub fn package_name(&self) -> Option<&str> {
        let source = self.specifier.as_str();
        if source.is_empty() || source.starts_with('.') || source.starts_with('/') {
            return None;
        }

        if source.starts_with('@') {
            let mut parts = source.splitn(3, '/');
            let scope = parts.next()?;
            let name = parts.next()?;
            return Some(&source[..scope.len() + 1 + name.len()]);
        }

        match source.find('/') {
            Some(idx) => Some(&source[..idx]),
            None => Some(source),
        }
    }
}

/// Everything a source parser extracts from one file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedFile {
    /// Imports in source order.
    pub imports: Vec<Import>,
    /// Exported identifiers in source order.
    pub exports: Vec<String>,
}
