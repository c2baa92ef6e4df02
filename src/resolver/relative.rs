//! Resolution of `.`, `..`, `./` and `../` specifiers in JavaScript/TypeScript files.

use std::path::{Path, PathBuf};

use super::{is_js_family, normalize, ImportResolver, ResolveContext, Resolution};
use crate::parser::Import;

/// Extensions probed for extensionless specifiers, in priority order.
const PROBE_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx", "mjs", "cjs"];

/// Resolves relative specifiers to files inside the scan root.
///
/// Probing order for `./b`:
/// 1. `b` as written
/// 2. `b.ts`, `b.tsx`, `b.js`, `b.jsx`, `b.mjs`, `b.cjs`
/// 3. `b.js` written for a TypeScript source (`b.ts` / `b.tsx` on disk)
/// 4. `b/index.ts`, `b/index.tsx`, ...
#[derive(Debug, Default, Clone, Copy)]
pub struct RelativeResolver;

impl RelativeResolver {
    pub fn new() -> Self {
        Self
    }

    fn candidates(base: &Path) -> Vec<PathBuf> {
        let mut candidates = vec![base.to_path_buf()];

        let as_str = base.as_os_str().to_string_lossy();
        for ext in PROBE_EXTENSIONS {
            candidates.push(PathBuf::from(format!("{}.{}", as_str, ext)));
        }

        let rewrites: &[&str] = match base.extension().and_then(|e| e.to_str()) {
            Some("js") => &["ts", "tsx"],
            Some("jsx") => &["tsx"],
            Some("mjs") => &["mts"],
            Some("cjs") => &["cts"],
            _ => &[],
        };
        for ext in rewrites {
            candidates.push(base.with_extension(ext));
        }

        for ext in PROBE_EXTENSIONS {
            candidates.push(base.join(format!("index.{}", ext)));
        }
        candidates
    }
}

impl ImportResolver for RelativeResolver {
    fn name(&self) -> &str {
        "relative"
    }

    fn resolve(&self, import: &Import, from_file: &Path, ctx: &ResolveContext<'_>) -> Option<Resolution> {
        if !import.is_relative() || !is_js_family(from_file) {
            return None;
        }

        let base = normalize(&from_file.parent()?.join(&import.specifier));
        if !base.starts_with(ctx.root) {
            return None;
        }

        Self::candidates(&base)
            .into_iter()
            .find(|candidate| candidate.is_file())
            .and_then(|found| Resolution::file(ctx.root, found))
    }
}
