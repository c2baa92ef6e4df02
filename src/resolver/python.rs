//! Resolution of Python module paths to `.py` files or packages.

use std::path::{Path, PathBuf};

use super::{normalize, ImportResolver, ResolveContext, Resolution};
use crate::parser::Import;

/// Resolves `a.b` (from the scan root) and `.a.b` / `..a` (from the importing
/// file's package) to `a/b.py` or `a/b/__init__.py`.
///
/// Standard library and third-party modules do not exist under the root and
/// therefore never resolve.
#[derive(Debug, Default, Clone, Copy)]
pub struct PythonResolver;

impl PythonResolver {
    pub fn new() -> Self {
        Self
    }

    fn base_dir(specifier: &str, from_file: &Path, root: &Path) -> Option<PathBuf> {
        let dots = specifier.chars().take_while(|c| *c == '.').count();
        if dots == 0 {
            return Some(root.to_path_buf());
        }
        let mut base = from_file.parent()?.to_path_buf();
        for _ in 1..dots {
            base = base.parent()?.to_path_buf();
        }
        Some(base)
    }
}

impl ImportResolver for PythonResolver {
    fn name(&self) -> &str {
        "python"
    }

    fn resolve(&self, import: &Import, from_file: &Path, ctx: &ResolveContext<'_>) -> Option<Resolution> {
        let is_python = matches!(
            from_file.extension().and_then(|e| e.to_str()),
            Some("py" | "pyi")
        );
        if !is_python {
            return None;
        }

        let module = import.specifier.trim_start_matches('.');
        if module.is_empty() {
            return None;
        }

        let mut target = Self::base_dir(&import.specifier, from_file, ctx.root)?;
        for segment in module.split('.') {
            target.push(segment);
        }
        let target = normalize(&target);
        if !target.starts_with(ctx.root) {
            return None;
        }

        [target.with_extension("py"), target.join("__init__.py")]
            .into_iter()
            .find(|candidate| candidate.is_file())
            .and_then(|found| Resolution::file(ctx.root, found))
    }
}
