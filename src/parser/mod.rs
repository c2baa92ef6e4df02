//! Parsers for manifests and source files.
//!
//! - [`package_json`] reads npm manifests for manifest-mode analysis.
//! - [`registry`] holds the per-extension source parsers used by the graph
//!   builder; [`javascript`] (tree-sitter) and [`python`] (line scanner) are
//!   the built-ins.
//!
//! # Example
//!
//! ```
//! use depscope::parser::{ParserRegistry, ImportKind};
//! use std::path::Path;
//!
//! let registry = ParserRegistry::with_defaults().unwrap();
//! let parser = registry.for_path(Path::new("index.js")).unwrap();
//! let parsed = parser.parse("const b = require('./b');", Path::new("index.js")).unwrap();
//!
//! assert_eq!(parsed.imports[0].specifier, "./b");
//! assert_eq!(parsed.imports[0].kind, ImportKind::Require);
//! ```

pub mod javascript;
pub mod package_json;
pub mod python;
pub mod registry;
pub mod types;

pub use package_json::{load_manifest, parse_file, parse_str, validate, ParseError, ParseResult};
pub use registry::{ParserRegistry, SourceError, SourceParser, SourceResult};
pub use types::{Dependency, DependencyType, Import, ImportKind, Manifest, PackageJson, ParsedFile};
