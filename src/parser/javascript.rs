//! JavaScript/TypeScript import and export extraction using tree-sitter.
//!
//! Recognized forms:
//!
//! - ES imports: `import x from 'm'`, `import 'm'`, `import type { T } from 'm'`
//! - CommonJS: `require('m')`
//! - Dynamic imports: `import('m')`
//! - Re-exports: `export { a } from 'm'`, `export * from 'm'`
//! - Exports: declarations, export clauses and `export default`

use std::path::Path;
use std::sync::Mutex;

use tree_sitter::{Language, Node, Parser};

use super::registry::{SourceError, SourceParser, SourceResult};
use super::types::{Import, ImportKind, ParsedFile};

/// Grammar flavor for a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceLanguage {
    JavaScript,
    TypeScript,
    Tsx,
}

impl SourceLanguage {
    /// Determine language from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "js" | "mjs" | "cjs" | "jsx" => Some(SourceLanguage::JavaScript),
            "ts" | "mts" | "cts" => Some(SourceLanguage::TypeScript),
            "tsx" => Some(SourceLanguage::Tsx),
            _ => None,
        }
    }

    fn tree_sitter_language(&self) -> Language {
        match self {
            SourceLanguage::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
            SourceLanguage::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            SourceLanguage::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
        }
    }
}

/// Parser for `.js`, `.jsx`, `.mjs`, `.cjs`, `.ts`, `.mts`, `.cts` and `.tsx` files.
///
/// Holds one tree-sitter parser per grammar; each is locked for the duration
/// of a single parse so the parser can be shared across threads.
pub struct JavaScriptParser {
    js_parser: Mutex<Parser>,
    ts_parser: Mutex<Parser>,
    tsx_parser: Mutex<Parser>,
}

impl JavaScriptParser {
    pub fn new() -> SourceResult<Self> {
        Ok(Self {
            js_parser: Mutex::new(Self::build(SourceLanguage::JavaScript)?),
            ts_parser: Mutex::new(Self::build(SourceLanguage::TypeScript)?),
            tsx_parser: Mutex::new(Self::build(SourceLanguage::Tsx)?),
        })
    }

    fn build(language: SourceLanguage) -> SourceResult<Parser> {
        let mut parser = Parser::new();
        parser
            .set_language(&language.tree_sitter_language())
            .map_err(|e| SourceError::Init(e.to_string()))?;
        Ok(parser)
    }

    /// Parse source text with an explicit grammar.
    pub fn parse_source(
        &self,
        source: &str,
        language: SourceLanguage,
        path: &Path,
    ) -> SourceResult<ParsedFile> {
        let lock = match language {
            SourceLanguage::JavaScript => &self.js_parser,
            SourceLanguage::TypeScript => &self.ts_parser,
            SourceLanguage::Tsx => &self.tsx_parser,
        };
        let tree = {
            let mut parser = lock.lock().map_err(|_| SourceError::Poisoned)?;
            parser.parse(source, None)
        }
        .ok_or_else(|| SourceError::Syntax {
            path: path.display().to_string(),
        })?;

        let mut parsed = ParsedFile::default();
        let mut cursor = tree.walk();

        // Pre-order walk without native recursion.
        loop {
            self.visit_node(&cursor.node(), source, &mut parsed);

            if cursor.goto_first_child() {
                continue;
            }
            loop {
                if cursor.goto_next_sibling() {
                    break;
                }
                if !cursor.goto_parent() {
                    return Ok(parsed);
                }
            }
        }
    }

    fn visit_node(&self, node: &Node, source: &str, parsed: &mut ParsedFile) {
        match node.kind() {
            "import_statement" => {
                if let Some(specifier) = self.find_string_child(node, source) {
                    parsed.imports.push(Import::new(
                        specifier,
                        ImportKind::Static,
                        node.start_position().row + 1,
                    ));
                }
            }
            "export_statement" => self.parse_export(node, source, parsed),
            "call_expression" => {
                if let Some(import) = self.parse_require_or_dynamic_import(node, source) {
                    parsed.imports.push(import);
                }
            }
            _ => {}
        }
    }

    fn parse_export(&self, node: &Node, source: &str, parsed: &mut ParsedFile) {
        if let Some(src) = node.child_by_field_name("source") {
            if let Some(specifier) = self.extract_string_value(&src, source) {
                parsed.imports.push(Import::new(
                    specifier,
                    ImportKind::ReExport,
                    node.start_position().row + 1,
                ));
            }
        }

        let mut cursor = node.walk();
        let mut is_default = false;
        for child in node.children(&mut cursor) {
            match child.kind() {
                "default" => is_default = true,
                "export_clause" => self.parse_export_clause(&child, source, &mut parsed.exports),
                _ => {}
            }
        }

        if is_default {
            parsed.exports.push("default".to_string());
            return;
        }

        if let Some(decl) = node.child_by_field_name("declaration") {
            if let Some(name) = decl.child_by_field_name("name") {
                if let Some(text) = self.node_text(&name, source) {
                    parsed.exports.push(text.to_string());
                }
                return;
            }

            // `export const a = 1, b = 2;`
            let mut decl_cursor = decl.walk();
            for declarator in decl.named_children(&mut decl_cursor) {
                if declarator.kind() != "variable_declarator" {
                    continue;
                }
                if let Some(name) = declarator.child_by_field_name("name") {
                    if name.kind() == "identifier" {
                        if let Some(text) = self.node_text(&name, source) {
                            parsed.exports.push(text.to_string());
                        }
                    }
                }
            }
        }
    }

    /// `{ a, b as c }` exports `a` and `c`.
    fn parse_export_clause(&self, node: &Node, source: &str, exports: &mut Vec<String>) {
        let mut cursor = node.walk();
        for spec in node.named_children(&mut cursor) {
            if spec.kind() != "export_specifier" {
                continue;
            }
            let exported = spec
                .child_by_field_name("alias")
                .or_else(|| spec.child_by_field_name("name"));
            if let Some(text) = exported.and_then(|n| self.node_text(&n, source)) {
                exports.push(text.to_string());
            }
        }
    }

    /// Parse `require('m')` or `import('m')`.
    fn parse_require_or_dynamic_import(&self, node: &Node, source: &str) -> Option<Import> {
        let func_node = node.child_by_field_name("function")?;
        let kind = match self.node_text(&func_node, source)? {
            "require" => ImportKind::Require,
            "import" => ImportKind::Dynamic,
            _ => return None,
        };

        let args_node = node.child_by_field_name("arguments")?;
        let specifier = self.find_string_child(&args_node, source)?;
        Some(Import::new(specifier, kind, node.start_position().row + 1))
    }

    fn find_string_child(&self, node: &Node, source: &str) -> Option<String> {
        let mut cursor = node.walk();
        let found = node
            .children(&mut cursor)
            .find(|child| child.kind() == "string")?;
        self.extract_string_value(&found, source)
    }

    fn node_text<'a>(&self, node: &Node, source: &'a str) -> Option<&'a str> {
        source.get(node.start_byte()..node.end_byte())
    }

    /// Extract string value (removes quotes).
    fn extract_string_value(&self, node: &Node, source: &str) -> Option<String> {
        let text = self.node_text(node, source)?;
        let trimmed = text
            .trim_start_matches(['"', '\'', '`'])
            .trim_end_matches(['"', '\'', '`']);
        if trimmed.is_empty() {
            return None;
        }
        Some(trimmed.to_string())
    }
}

impl SourceParser for JavaScriptParser {
    fn name(&self) -> &str {
        "javascript"
    }

    fn extensions(&self) -> &[&'static str] {
        &["js", "jsx", "mjs", "cjs", "ts", "mts", "cts", "tsx"]
    }

    fn parse(&self, source: &str, path: &Path) -> SourceResult<ParsedFile> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("js");
        let language = SourceLanguage::from_extension(ext).unwrap_or(SourceLanguage::JavaScript);
        self.parse_source(source, language, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_js(source: &str) -> ParsedFile {
        JavaScriptParser::new()
            .unwrap()
            .parse(source, Path::new("test.js"))
            .unwrap()
    }

    fn parse_ts(source: &str) -> ParsedFile {
        JavaScriptParser::new()
            .unwrap()
            .parse(source, Path::new("test.ts"))
            .unwrap()
    }

    fn specifiers(parsed: &ParsedFile) -> Vec<&str> {
        parsed.imports.iter().map(|i| i.specifier.as_str()).collect()
    }

    // ===== Imports =====

    #[test]
    fn test_default_import() {
        let parsed = parse_js(r#"import React from 'react';"#);

        assert_eq!(parsed.imports.len(), 1);
        assert_eq!(parsed.imports[0].specifier, "react");
        assert_eq!(parsed.imports[0].kind, ImportKind::Static);
        assert_eq!(parsed.imports[0].line, 1);
    }

    #[test]
    fn test_side_effect_import() {
        let parsed = parse_js(r#"import './styles.css';"#);
        assert_eq!(specifiers(&parsed), vec!["./styles.css"]);
    }

    #[test]
    fn test_require_and_dynamic_import() {
        let parsed = parse_js(
            r#"
const fs = require('fs');
require('./polyfills');
const lazy = await import("./lazy");
"#,
        );

        assert_eq!(specifiers(&parsed), vec!["fs", "./polyfills", "./lazy"]);
        assert_eq!(parsed.imports[0].kind, ImportKind::Require);
        assert_eq!(parsed.imports[2].kind, ImportKind::Dynamic);
        assert_eq!(parsed.imports[2].line, 4);
    }

    #[test]
    fn test_other_calls_are_ignored() {
        let parsed = parse_js("console.log('./not-an-import');");
        assert!(parsed.imports.is_empty());
    }

    #[test]
    fn test_multiple_imports_keep_source_order() {
        let parsed = parse_js(
            r#"
import React from 'react';
import { useQuery } from '@tanstack/react-query';
import axios from 'axios';
import './styles.css';
"#,
        );

        assert_eq!(
            specifiers(&parsed),
            vec!["react", "@tanstack/react-query", "axios", "./styles.css"]
        );
    }

    #[test]
    fn test_typescript_type_import() {
        let parsed = parse_ts(r#"import type { FC } from 'react';"#);
        assert_eq!(specifiers(&parsed), vec!["react"]);
    }

    #[test]
    fn test_tsx_file() {
        let parser = JavaScriptParser::new().unwrap();
        let parsed = parser
            .parse(
                "import { b } from './b';\nexport const App = () => <div>{b}</div>;\n",
                Path::new("app.tsx"),
            )
            .unwrap();
        assert_eq!(specifiers(&parsed), vec!["./b"]);
        assert_eq!(parsed.exports, vec!["App"]);
    }

    // ===== Exports =====

    #[test]
    fn test_re_exports_count_as_imports() {
        let parsed = parse_js(
            r#"
export { helper } from './helpers';
export * from './all';
"#,
        );

        assert_eq!(specifiers(&parsed), vec!["./helpers", "./all"]);
        assert!(parsed.imports.iter().all(|i| i.kind == ImportKind::ReExport));
        assert_eq!(parsed.exports, vec!["helper"]);
    }

    #[test]
    fn test_declaration_exports() {
        let parsed = parse_js(
            r#"
export function build() {}
export class Graph {}
export const a = 1, b = 2;
"#,
        );

        assert_eq!(parsed.exports, vec!["build", "Graph", "a", "b"]);
        assert!(parsed.imports.is_empty());
    }

    #[test]
    fn test_export_clause_with_alias_and_default() {
        let parsed = parse_js(
            r#"
const x = 1;
export { x as y };
export default x;
"#,
        );

        assert_eq!(parsed.exports, vec!["y", "default"]);
    }

    #[test]
    fn test_source_language_from_extension() {
        assert_eq!(
            SourceLanguage::from_extension("MJS"),
            Some(SourceLanguage::JavaScript)
        );
        assert_eq!(
            SourceLanguage::from_extension("cts"),
            Some(SourceLanguage::TypeScript)
        );
        assert_eq!(SourceLanguage::from_extension("tsx"), Some(SourceLanguage::Tsx));
        assert_eq!(SourceLanguage::from_extension("py"), None);
    }
}
