//! Source parser registry keyed by file extension.
//!
//! Each analysis engine owns its own registry, so concurrent analyses with
//! different parser sets never interfere. Registration must happen before
//! an analysis run starts.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

use super::javascript::JavaScriptParser;
use super::python::PythonParser;
use super::types::ParsedFile;

/// Errors a source parser can report for a single file.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The parser could not produce a syntax tree.
    #[error("failed to parse {path}")]
    Syntax { path: String },

    /// Grammar or parser setup failed.
    #[error("parser initialization failed: {0}")]
    Init(String),

    /// A previous panic left the parser state unusable.
    #[error("parser state poisoned")]
    Poisoned,
}

/// Result type for source parsing.
pub type SourceResult<T> = Result<T, SourceError>;

/// Extracts import and export identifiers from raw file text.
pub trait SourceParser: Send + Sync {
    /// Short identifier, used in logs.
    fn name(&self) -> &str;

    /// Lower-case file extensions (without the dot) this parser handles.
    fn extensions(&self) -> &[&'static str];

    /// Parses one file's content.
    fn parse(&self, source: &str, path: &Path) -> SourceResult<ParsedFile>;
}

/// Parsers keyed by file extension.
///
/// # Example
///
/// ```
/// use depscope::parser::ParserRegistry;
/// use std::path::Path;
///
/// let registry = ParserRegistry::with_defaults().unwrap();
/// assert!(registry.for_path(Path::new("src/app.tsx")).is_some());
/// assert!(registry.for_path(Path::new("README.md")).is_none());
/// ```
#[derive(Default, Clone)]
pub struct ParserRegistry {
    parsers: BTreeMap<String, Arc<dyn SourceParser>>,
}

impl ParserRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the built-in JavaScript/TypeScript and Python parsers.
    pub fn with_defaults() -> crate::Result<Self> {
        let mut registry = Self::new();
        let js = JavaScriptParser::new().map_err(|e| crate::Error::Parser(e.to_string()))?;
        registry.register(js);
        registry.register(PythonParser::new());
        Ok(registry)
    }

    /// Registers a parser for every extension it declares.
    ///
    /// A later registration for the same extension replaces the earlier one.
    pub fn register<P: SourceParser + 'static>(&mut self, parser: P) {
        self.register_shared(Arc::new(parser));
    }

    /// Registers an already shared parser.
    pub fn register_shared(&mut self, parser: Arc<dyn SourceParser>) {
        for ext in parser.extensions() {
            self.parsers.insert(ext.to_ascii_lowercase(), Arc::clone(&parser));
        }
    }

    /// Looks up a parser by extension (case-insensitive).
    pub fn for_extension(&self, ext: &str) -> Option<&Arc<dyn SourceParser>> {
        self.parsers.get(&ext.to_ascii_lowercase())
    }

    /// Looks up a parser for a path by its extension.
    pub fn for_path(&self, path: &Path) -> Option<&Arc<dyn SourceParser>> {
        let ext = path.extension().and_then(|e| e.to_str())?;
        self.for_extension(ext)
    }

    /// Registered extensions in sorted order.
    pub fn extensions(&self) -> impl Iterator<Item = &str> {
        self.parsers.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.parsers.is_empty()
    }
}

impl fmt::Debug for ParserRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.parsers.iter().map(|(ext, p)| (ext, p.name())))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::types::{Import, ImportKind};

    struct LineParser;

    impl SourceParser for LineParser {
        fn name(&self) -> &str {
            "lines"
        }

        fn extensions(&self) -> &[&'static str] {
            &["deps", "PY"]
        }

        fn parse(&self, source: &str, _path: &Path) -> SourceResult<ParsedFile> {
            Ok(ParsedFile {
                imports: source
                    .lines()
                    .enumerate()
                    .map(|(i, l)| Import::new(l.trim(), ImportKind::Static, i + 1))
                    .collect(),
                exports: Vec::new(),
            })
        }
    }

    #[test]
    fn test_empty_registry() {
        let registry = ParserRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.for_path(Path::new("a.ts")).is_none());
    }

    #[test]
    fn test_defaults_cover_js_ts_python() {
        let registry = ParserRegistry::with_defaults().unwrap();
        for file in ["a.js", "a.mjs", "a.jsx", "a.ts", "a.TSX", "a.py"] {
            assert!(registry.for_path(Path::new(file)).is_some(), "{}", file);
        }
    }

    #[test]
    fn test_later_registration_replaces_extension() {
        let mut registry = ParserRegistry::with_defaults().unwrap();
        registry.register(LineParser);

        let parser = registry.for_path(Path::new("x.py")).unwrap();
        assert_eq!(parser.name(), "lines");
        assert_eq!(registry.for_extension("deps").unwrap().name(), "lines");
        assert_eq!(registry.for_extension("ts").unwrap().name(), "javascript");
    }

    #[test]
    fn test_custom_parser_output() {
        let mut registry = ParserRegistry::new();
        registry.register(LineParser);

        let parsed = registry
            .for_extension("deps")
            .unwrap()
            .parse("a\nb\n", Path::new("x.deps"))
            .unwrap();
        assert_eq!(parsed.imports.len(), 2);
        assert_eq!(parsed.imports[1].line, 2);
    }
}
