//! Parser for npm package.json manifests.
//!
//! Manifest-mode analysis starts here: the file is parsed into a
//! [`PackageJson`], validated, and flattened into a [`Manifest`].

use std::fs;
use std::path::Path;

use super::types::{Dependency, Manifest, PackageJson};

/// Errors that can occur during package.json parsing.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// Failed to read the file from disk.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse JSON content.
    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    /// The package.json structure is invalid or missing required fields.
    #[error("Invalid package.json: {0}")]
    InvalidPackage(String),
}

/// Result type alias for manifest parsing.
pub type ParseResult<T> = Result<T, ParseError>;

/// Parses a package.json file from a file path.
pub fn parse_file(path: &Path) -> ParseResult<PackageJson> {
    let content = fs::read_to_string(path)?;
    parse_str(&content)
}

/// Parses a package.json from a string.
///
/// # Example
///
/// ```
/// use depscope::parser::package_json::parse_str;
///
/// let json = r#"{"name": "my-app", "version": "1.0.0"}"#;
/// let pkg = parse_str(json).unwrap();
/// assert_eq!(pkg.name, Some("my-app".to_string()));
/// ```
pub fn parse_str(content: &str) -> ParseResult<PackageJson> {
    let pkg: PackageJson = serde_json::from_str(content)?;
    Ok(pkg)
}

/// Validates a parsed PackageJson structure.
///
/// A manifest must carry at least a name or some dependencies, and every
/// declared version must be non-empty.
pub fn validate(pkg: &PackageJson) -> ParseResult<()> {
    if pkg.name.is_none() && !pkg.has_dependencies() {
        return Err(ParseError::InvalidPackage(
            "package.json has no name and no dependencies".to_string(),
        ));
    }

    let declared = [
        &pkg.dependencies,
        &pkg.dev_dependencies,
        &pkg.peer_dependencies,
        &pkg.optional_dependencies,
    ];
    for map in declared.into_iter().flatten() {
        if let Some((name, _)) = map.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(ParseError::InvalidPackage(format!(
                "dependency '{}' has an empty version",
                name
            )));
        }
    }
    Ok(())
}

/// Parses, validates and flattens a package.json into a [`Manifest`].
pub fn load_manifest(path: &Path) -> ParseResult<Manifest> {
    let pkg = parse_file(path)?;
    validate(&pkg)?;
    Ok(Manifest::from(pkg))
}

/// Extracts all dependencies from a PackageJson into a normalized list.
///
/// # Example
///
/// ```
/// use depscope::parser::package_json::{parse_str, extract_dependencies};
/// use depscope::parser::types::DependencyType;
///
/// let json = r#"{
///     "name": "my-app",
///     "dependencies": {"react": "^18.0.0"},
///     "devDependencies": {"typescript": "^5.0.0"}
/// }"#;
///
/// let pkg = parse_str(json).unwrap();
/// let deps = extract_dependencies(&pkg);
///
/// assert_eq!(deps.len(), 2);
/// assert!(deps.iter().any(|d| d.name == "typescript" && d.dep_type == DependencyType::Development));
/// ```
pub fn extract_dependencies(pkg: &PackageJson) -> Vec<Dependency> {
    Manifest::from(pkg.clone()).select(true, true, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::types::DependencyType;
    use std::io::Write;

    const SAMPLE_PACKAGE_JSON: &str = r#"{
        "name": "test-app",
        "version": "1.0.0",
        "description": "A test application",
        "dependencies": {
            "react": "^18.2.0",
            "react-dom": "^18.2.0",
            "lodash": "^4.17.21"
        },
        "devDependencies": {
            "typescript": "^5.0.0",
            "jest": "^29.0.0"
        },
        "peerDependencies": {
            "react": ">=16.8.0"
        },
        "optionalDependencies": {
            "fsevents": "^2.3.0"
        }
    }"#;

    #[test]
    fn test_parse_str_valid() {
        let pkg = parse_str(SAMPLE_PACKAGE_JSON).unwrap();

        assert_eq!(pkg.name, Some("test-app".to_string()));
        assert_eq!(pkg.version, Some("1.0.0".to_string()));
        assert_eq!(pkg.dependency_count(), 7);
    }

    #[test]
    fn test_parse_str_invalid_json() {
        let result = parse_str("{ invalid json }");
        assert!(matches!(result.unwrap_err(), ParseError::JsonError(_)));
    }

    #[test]
    fn test_validate_empty_invalid() {
        let pkg = parse_str("{}").unwrap();
        assert!(matches!(
            validate(&pkg).unwrap_err(),
            ParseError::InvalidPackage(_)
        ));
    }

    #[test]
    fn test_validate_rejects_empty_version() {
        let pkg = parse_str(r#"{"dependencies": {"react": "  "}}"#).unwrap();
        assert!(validate(&pkg).is_err());
    }

    #[test]
    fn test_extract_dependencies_all_types() {
        let pkg = parse_str(SAMPLE_PACKAGE_JSON).unwrap();
        let deps = extract_dependencies(&pkg);

        assert_eq!(deps.len(), 7);
        let count = |t: DependencyType| deps.iter().filter(|d| d.dep_type == t).count();
        assert_eq!(count(DependencyType::Production), 3);
        assert_eq!(count(DependencyType::Development), 2);
        assert_eq!(count(DependencyType::Peer), 1);
        assert_eq!(count(DependencyType::Optional), 1);
    }

    #[test]
    fn test_parse_str_with_extra_fields() {
        let json = r#"{
            "name": "with-extras",
            "scripts": {"build": "tsc"},
            "repository": {"type": "git", "url": "https://example.com"},
            "dependencies": {"express": "^4.18.0"}
        }"#;

        let pkg = parse_str(json).unwrap();
        assert_eq!(pkg.dependencies.as_ref().map(|d| d.len()), Some(1));
    }

    #[test]
    fn test_load_manifest_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE_PACKAGE_JSON.as_bytes()).unwrap();

        let manifest = load_manifest(file.path()).unwrap();
        assert_eq!(manifest.dependencies.len(), 3);
        assert_eq!(manifest.dev_dependencies.len(), 2);
    }

    #[test]
    fn test_load_manifest_missing_file() {
        let result = load_manifest(Path::new("/definitely/not/here/package.json"));
        assert!(matches!(result.unwrap_err(), ParseError::IoError(_)));
    }
}
