//! Grouping of related packages by naming convention.

use std::collections::BTreeMap;

use crate::config::AnalysisConfig;

/// Assigns package names to groups. Names that share a key are considered
/// candidates for consolidation.
pub trait SimilarityStrategy: Send + Sync {
    fn name(&self) -> &str;

    /// The group key for `package`, or `None` when it belongs to no group.
    fn group_key(&self, package: &str) -> Option<String>;
}

/// Groups by the first matching prefix (`@babel/`, `eslint-plugin-`) or,
/// failing that, the first matching suffix (`-loader`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AffixSimilarity {
    prefixes: Vec<String>,
    suffixes: Vec<String>,
}

impl AffixSimilarity {
    pub fn new(prefixes: Vec<String>, suffixes: Vec<String>) -> Self {
        Self { prefixes, suffixes }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(config.similar_prefixes.clone(), config.similar_suffixes.clone())
    }
}

impl SimilarityStrategy for AffixSimilarity {
    fn name(&self) -> &str {
        "affix"
    }

    fn group_key(&self, package: &str) -> Option<String> {
        self.prefixes
            .iter()
            .find(|p| !p.is_empty() && package.starts_with(p.as_str()) && package.len() > p.len())
            .or_else(|| {
                self.suffixes.iter().find(|s| {
                    !s.is_empty() && package.ends_with(s.as_str()) && package.len() > s.len()
                })
            })
            .cloned()
    }
}

/// Buckets `names` by key, keeping only groups with more than one member.
pub fn group_similar<'a>(
    strategy: &dyn SimilarityStrategy,
    names: impl IntoIterator<Item = &'a str>,
) -> BTreeMap<String, Vec<String>> {
    let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for name in names {
        if let Some(key) = strategy.group_key(name) {
            let members = groups.entry(key).or_default();
            if !members.iter().any(|m| m == name) {
                members.push(name.to_string());
            }
        }
    }
    groups.retain(|_, members| members.len() > 1);
    groups
}
