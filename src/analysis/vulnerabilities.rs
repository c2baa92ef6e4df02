//! Heuristic risk scanning over node metadata.
//!
//! Each heuristic runs over every node independently and the results are
//! concatenated per category: security, then performance, then maintenance.
//! Nothing here is authoritative; the only guarantee is that identical
//! graphs and configuration yield identical findings.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::cycles::Severity;
use crate::config::AnalysisConfig;
use crate::graph::{DependencyGraph, DependencyNode, NodeKind};

const LARGE_NODE_BYTES: u64 = 1024 * 1024;
const MAX_DEPENDENCIES: usize = 20;
const STALE_AFTER_DAYS: i64 = 365;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VulnerabilityKind {
    Security,
    Performance,
    Maintenance,
    Compatibility,
}

/// One finding against a node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Vulnerability {
    pub node_id: String,
    pub kind: VulnerabilityKind,
    pub severity: Severity,
    pub description: String,
    pub recommendation: String,
}

/// Scans `graph`; `now` anchors the staleness check.
pub fn detect_vulnerabilities(
    graph: &DependencyGraph,
    config: &AnalysisConfig,
    now: DateTime<Utc>,
) -> Vec<Vulnerability> {
    let mut found = Vec::new();
    found.extend(graph.nodes().filter_map(|n| risky_name(n, &config.risky_name_patterns)));
    for node in graph.nodes() {
        found.extend(performance(node));
    }
    found.extend(graph.nodes().filter_map(|n| stale(n, now)));
    found
}

fn risky_name(node: &DependencyNode, patterns: &[String]) -> Option<Vulnerability> {
    if node.kind != NodeKind::Package {
        return None;
    }
    let name = node.name.to_lowercase();
    let pattern = patterns
        .iter()
        .find(|p| !p.is_empty() && name.contains(&p.to_lowercase()))?;
    Some(Vulnerability {
        node_id: node.id.clone(),
        kind: VulnerabilityKind::Security,
        severity: Severity::Medium,
        description: format!("Package name '{}' matches risky pattern '{}'", node.name, pattern),
        recommendation: "Audit the package source and prefer a vetted alternative".to_string(),
    })
}

fn performance(node: &DependencyNode) -> Vec<Vulnerability> {
    let mut found = Vec::new();
    if let Some(size) = node.size.filter(|s| *s > LARGE_NODE_BYTES) {
        found.push(Vulnerability {
            node_id: node.id.clone(),
            kind: VulnerabilityKind::Performance,
            severity: Severity::Medium,
            description: format!("Large dependency: {} bytes", size),
            recommendation: "Split the module or load it lazily".to_string(),
        });
    }
    if node.dependencies.len() > MAX_DEPENDENCIES {
        found.push(Vulnerability {
            node_id: node.id.clone(),
            kind: VulnerabilityKind::Performance,
            severity: Severity::Low,
            description: format!("Excessive dependencies: {}", node.dependencies.len()),
            recommendation: "Reduce direct dependencies or split responsibilities".to_string(),
        });
    }
    found
}

fn stale(node: &DependencyNode, now: DateTime<Utc>) -> Option<Vulnerability> {
    let modified = node.last_modified?;
    let age = now.signed_duration_since(modified);
    if age <= Duration::days(STALE_AFTER_DAYS) {
        return None;
    }
    Some(Vulnerability {
        node_id: node.id.clone(),
        kind: VulnerabilityKind::Maintenance,
        severity: Severity::Low,
        description: format!("Not modified for {} days", age.num_days()),
        recommendation: "Review whether the code is still maintained".to_string(),
    })
}
