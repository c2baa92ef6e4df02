//! Resolution of bare npm specifiers to manifest packages.

use std::collections::BTreeMap;
use std::path::Path;

use super::{is_js_family, ImportResolver, ResolveContext, Resolution};
use crate::graph::NodeKind;
use crate::parser::{Dependency, Import};

/// Maps `react`, `lodash/debounce` or `@scope/pkg/sub` to the `name@version`
/// node of a declared package. Packages that are not declared (including
/// Node built-ins) stay unresolved.
#[derive(Debug, Default, Clone)]
pub struct PackageResolver {
    versions: BTreeMap<String, String>,
}

impl PackageResolver {
    /// Builds a resolver from the dependencies selected for analysis.
    pub fn from_dependencies<'a>(deps: impl IntoIterator<Item = &'a Dependency>) -> Self {
        let mut versions = BTreeMap::new();
        for dep in deps {
            versions
                .entry(dep.name.clone())
                .or_insert_with(|| dep.version.clone());
        }
        Self { versions }
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }
}

impl ImportResolver for PackageResolver {
    fn name(&self) -> &str {
        "package"
    }

    fn resolve(&self, import: &Import, from_file: &Path, _ctx: &ResolveContext<'_>) -> Option<Resolution> {
        if !is_js_family(from_file) {
            return None;
        }
        let name = import.package_name()?;
        let version = self.versions.get(name)?;
        Some(Resolution {
            id: format!("{}@{}", name, version),
            name: name.to_string(),
            version: Some(version.clone()),
            kind: NodeKind::Package,
            source: format!("npm:{}@{}", name, version),
            path: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{DependencyType, ImportKind};

    fn resolver() -> PackageResolver {
        let deps = vec![
            Dependency::new("react", "18.2.0", DependencyType::Production),
            Dependency::new("@tanstack/react-query", "5.0.0", DependencyType::Production),
            Dependency::new("lodash", "4.17.21", DependencyType::Development),
        ];
        PackageResolver::from_dependencies(&deps)
    }

    fn resolve(specifier: &str, from: &str) -> Option<String> {
        resolver()
            .resolve(
                &Import::new(specifier, ImportKind::Static, 1),
                Path::new(from),
                &ResolveContext { root: Path::new("/repo") },
            )
            .map(|r| r.id)
    }

    #[test]
    fn test_bare_and_subpath_specifiers() {
        assert_eq!(resolve("react", "/repo/a.ts"), Some("react@18.2.0".to_string()));
        assert_eq!(
            resolve("lodash/debounce", "/repo/a.js"),
            Some("lodash@4.17.21".to_string())
        );
        assert_eq!(
            resolve("@tanstack/react-query/devtools", "/repo/a.tsx"),
            Some("@tanstack/react-query@5.0.0".to_string())
        );
    }

    #[test]
    fn test_undeclared_relative_and_python() {
        assert_eq!(resolve("fs", "/repo/a.ts"), None);
        assert_eq!(resolve("./react", "/repo/a.ts"), None);
        assert_eq!(resolve("react", "/repo/a.py"), None);
        assert_eq!(resolver().len(), 3);
    }
}
