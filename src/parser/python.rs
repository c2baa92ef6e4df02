//! Line-based import scanner for Python sources.
//!
//! Handles `import a.b`, `import a as b, c`, `from .x import y`,
//! `from . import (a, b)` with parenthesized continuation lines, and skips
//! triple-quoted blocks and comments. Top-level `def`/`class` names that do
//! not start with an underscore are reported as exports.

use std::path::Path;

use super::registry::{SourceParser, SourceResult};
use super::types::{Import, ImportKind, ParsedFile};

#[derive(Debug, Default, Clone, Copy)]
pub struct PythonParser;

impl PythonParser {
    pub fn new() -> Self {
        Self
    }

    /// Scans Python source text. Never fails: unrecognized lines are skipped.
    pub fn scan(&self, source: &str) -> ParsedFile {
        let mut parsed = ParsedFile::default();
        let mut in_docstring: Option<&'static str> = None;
        // (statement so far, starting line) while inside `from x import (...)`
        let mut pending: Option<(String, usize)> = None;

        for (idx, raw) in source.lines().enumerate() {
            let line_no = idx + 1;

            if let Some(delim) = in_docstring {
                if raw.contains(delim) {
                    in_docstring = None;
                }
                continue;
            }

            let line = strip_comment(raw);
            let trimmed = line.trim();

            if let Some((mut stmt, start)) = pending.take() {
                stmt.push(' ');
                stmt.push_str(trimmed);
                if trimmed.contains(')') {
                    self.parse_statement(&stmt, start, &mut parsed.imports);
                } else {
                    pending = Some((stmt, start));
                }
                continue;
            }

            if let Some(delim) = opens_docstring(trimmed) {
                in_docstring = Some(delim);
                continue;
            }

            let top_level = !raw.starts_with(char::is_whitespace);
            if top_level {
                if let Some(name) = definition_name(trimmed) {
                    if !name.starts_with('_') {
                        parsed.exports.push(name.to_string());
                    }
                    continue;
                }
            }

            if trimmed.starts_with("from ") && trimmed.contains('(') && !trimmed.contains(')') {
                pending = Some((trimmed.to_string(), line_no));
                continue;
            }

            self.parse_statement(trimmed, line_no, &mut parsed.imports);
        }

        parsed
    }

    fn parse_statement(&self, stmt: &str, line: usize, imports: &mut Vec<Import>) {
        if let Some(rest) = stmt.strip_prefix("import ") {
            for part in rest.split(',') {
                let module = part.split(" as ").next().unwrap_or("").trim();
                if is_module_path(module) {
                    imports.push(Import::new(module, ImportKind::Static, line));
                }
            }
            return;
        }

        let Some(rest) = stmt.strip_prefix("from ") else {
            return;
        };
        let Some((module, names)) = rest.split_once(" import ") else {
            return;
        };
        let module = module.trim();

        // `from . import a, b` imports sibling modules `.a` and `.b`
        if !module.is_empty() && module.chars().all(|c| c == '.') {
            let names = names.replace(['(', ')'], "");
            for name in names.split(',') {
                let name = name.split(" as ").next().unwrap_or("").trim();
                if is_identifier(name) {
                    imports.push(Import::new(format!("{}{}", module, name), ImportKind::Static, line));
                }
            }
            return;
        }

        if is_module_path(module) {
            imports.push(Import::new(module, ImportKind::Static, line));
        }
    }
}

impl SourceParser for PythonParser {
    fn name(&self) -> &str {
        "python"
    }

    fn extensions(&self) -> &[&'static str] {
        &["py", "pyi"]
    }

    fn parse(&self, source: &str, _path: &Path) -> SourceResult<ParsedFile> {
        Ok(self.scan(source))
    }
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(idx) => &line[..idx],
        None => line,
    }
}

/// Returns the delimiter if the line opens a triple-quoted block that it doesn't close.
fn opens_docstring(line: &str) -> Option<&'static str> {
    for delim in ["\"\"\"", "'''"] {
        if line.matches(delim).count() % 2 == 1 {
            return Some(delim);
        }
    }
    None
}

fn definition_name(line: &str) -> Option<&str> {
    let rest = line
        .strip_prefix("def ")
        .or_else(|| line.strip_prefix("async def "))
        .or_else(|| line.strip_prefix("class "))?;
    let end = rest
        .find(|c: char| !(c.is_alphanumeric() || c == '_'))
        .unwrap_or(rest.len());
    let name = &rest[..end];
    (!name.is_empty()).then_some(name)
}

fn is_identifier(s: &str) -> bool {
    !s.is_empty()
        && !s.starts_with(|c: char| c.is_ascii_digit())
        && s.chars().all(|c| c.is_alphanumeric() || c == '_')
}

/// `a.b.c` or `..a.b`
fn is_module_path(s: &str) -> bool {
    let body = s.trim_start_matches('.');
    if body.is_empty() {
        return false;
    }
    body.split('.').all(is_identifier)
}
