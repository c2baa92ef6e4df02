//! Analysis configuration.
//!
//! Every field has a default, so a partial JSON file (or none at all) is a
//! valid configuration:
//!
//! ```
//! use depscope::AnalysisConfig;
//!
//! let config: AnalysisConfig = serde_json::from_str(r#"{"include_dev_dependencies": true}"#).unwrap();
//! assert!(config.include_dev_dependencies);
//! assert!(config.detect_vulnerabilities);
//! assert!(config.validate().is_ok());
//! ```

use std::fs;
use std::path::Path;

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Toggles and thresholds for one analysis run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Include `devDependencies` in manifest analysis.
    pub include_dev_dependencies: bool,
    /// Include `peerDependencies` in manifest analysis.
    pub include_peer_dependencies: bool,
    /// Include `optionalDependencies` in manifest analysis.
    pub include_optional_dependencies: bool,
    /// Maximum directory depth below the scan root (`None` = unbounded).
    /// Files directly inside the root are at depth 1.
    pub max_depth: Option<usize>,
    /// Root-relative globs a file must match to be scanned.
    pub include_patterns: Vec<String>,
    /// Root-relative globs that exclude files and prune directories.
    pub exclude_patterns: Vec<String>,
    /// Directory names that are never descended into.
    pub ignored_dirs: Vec<String>,
    pub detect_vulnerabilities: bool,
    pub suggest_optimizations: bool,
    /// Package-name substrings flagged as security risks.
    pub risky_name_patterns: Vec<String>,
    /// Node ids or names annotated as critical.
    pub critical_nodes: Vec<String>,
    /// Upper bound on concurrent file reads.
    pub max_concurrent_reads: usize,
    /// Name prefixes that group related packages.
    pub similar_prefixes: Vec<String>,
    /// Name suffixes that group related packages.
    pub similar_suffixes: Vec<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            include_dev_dependencies: false,
            include_peer_dependencies: false,
            include_optional_dependencies: true,
            max_depth: None,
            include_patterns: strings(&[
                "**/*.js", "**/*.jsx", "**/*.mjs", "**/*.cjs", "**/*.ts", "**/*.tsx", "**/*.mts",
                "**/*.cts", "**/*.py",
            ]),
            exclude_patterns: strings(&[
                "**/*.d.ts",
                "**/*.min.js",
                "**/*.test.*",
                "**/*.spec.*",
            ]),
            ignored_dirs: strings(&[
                "node_modules",
                ".git",
                "dist",
                "build",
                ".next",
                "coverage",
                ".turbo",
                "__pycache__",
            ]),
            detect_vulnerabilities: true,
            suggest_optimizations: true,
            risky_name_patterns: strings(&["eval", "exec", "shell", "unsafe"]),
            critical_nodes: Vec::new(),
            max_concurrent_reads: 16,
            similar_prefixes: strings(&[
                "@babel/",
                "@types/",
                "babel-plugin-",
                "eslint-plugin-",
                "eslint-config-",
                "webpack-",
            ]),
            similar_suffixes: strings(&["-loader", "-plugin", "-preset"]),
        }
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

impl AnalysisConfig {
    /// Loads a configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks limits and compiles every glob.
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrent_reads == 0 {
            return Err(Error::Config(
                "max_concurrent_reads must be at least 1".to_string(),
            ));
        }
        if self.max_depth == Some(0) {
            return Err(Error::Config("max_depth must be at least 1".to_string()));
        }
        self.include_set()?;
        self.exclude_set()?;
        Ok(())
    }

    pub fn include_set(&self) -> Result<GlobSet> {
        build_glob_set(&self.include_patterns)
    }

    pub fn exclude_set(&self) -> Result<GlobSet> {
        build_glob_set(&self.exclude_patterns)
    }
}

/// Compiles `*`/`?`/`**` patterns into one matcher. `*` and `?` never
/// match a path separator; only `**` crosses directories.
pub fn build_glob_set(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .map_err(|source| Error::InvalidPattern {
                pattern: pattern.clone(),
                source,
            })?;
        builder.add(glob);
    }
    builder.build().map_err(|source| Error::InvalidPattern {
        pattern: patterns.join(", "),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = AnalysisConfig::default();
        assert!(!config.include_dev_dependencies);
        assert!(config.include_optional_dependencies);
        assert!(config.ignored_dirs.iter().any(|d| d == "node_modules"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_globs_match_sources() {
        let config = AnalysisConfig::default();
        let include = config.include_set().unwrap();
        let exclude = config.exclude_set().unwrap();

        assert!(include.is_match("a.ts"));
        assert!(include.is_match("src/deep/b.tsx"));
        assert!(include.is_match("pkg/mod.py"));
        assert!(!include.is_match("README.md"));
        assert!(exclude.is_match("types/index.d.ts"));
        assert!(exclude.is_match("src/app.test.ts"));
        assert!(!exclude.is_match("src/app.ts"));
    }

    #[test]
    fn test_single_char_wildcard() {
        let set = build_glob_set(&["src/?.ts".to_string()]).unwrap();
        assert!(set.is_match("src/a.ts"));
        assert!(!set.is_match("src/ab.ts"));
    }

    #[test]
    fn test_star_stays_within_one_directory() {
        let set = build_glob_set(&["src/*.ts".to_string()]).unwrap();
        assert!(set.is_match("src/a.ts"));
        assert!(!set.is_match("src/nested/b.ts"));

        let deep = build_glob_set(&["src/**/*.ts".to_string()]).unwrap();
        assert!(deep.is_match("src/a.ts"));
        assert!(deep.is_match("src/nested/b.ts"));
    }

    #[test]
    fn test_invalid_pattern_is_reported() {
        let config = AnalysisConfig {
            include_patterns: vec!["src/[".to_string()],
            ..AnalysisConfig::default()
        };
        assert!(matches!(
            config.validate().unwrap_err(),
            Error::InvalidPattern { .. }
        ));
    }

    #[test]
    fn test_zero_limits_rejected() {
        let config = AnalysisConfig {
            max_concurrent_reads: 0,
            ..AnalysisConfig::default()
        };
        assert!(matches!(config.validate().unwrap_err(), Error::Config(_)));
    }

    #[test]
    fn test_from_file_partial() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"max_depth": 3, "critical_nodes": ["core"]}}"#).unwrap();

        let config = AnalysisConfig::from_file(file.path()).unwrap();
        assert_eq!(config.max_depth, Some(3));
        assert_eq!(config.critical_nodes, vec!["core"]);
        assert!(config.suggest_optimizations);
    }

    #[test]
    fn test_from_file_malformed() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(
            AnalysisConfig::from_file(file.path()).unwrap_err(),
            Error::Config(_)
        ));
    }
}
