//! Consensus building over disagreeing capability results
//!
//! Map-shaped results are decomposed into aspects (top-level keys). Aspects
//! on which every contributor agrees pass through; disputed aspects are
//! settled by a designated expert, a strict majority, or quality weighting,
//! in that order.

use conductor_domain::{
    AspectConflict, CapabilityOutcome, ConsensusResult, ToolCapability, Value,
    outcome::AspectResolution,
};
use std::collections::BTreeMap;

/// Authoritative capability per well-known aspect
fn expert_for(aspect: &str) -> Option<&'static str> {
    match aspect {
        "security" => Some("security-scanner"),
        "quality" => Some("code-reviewer"),
        "metrics" => Some("metrics-analyzer"),
        "tests" => Some("test-generator"),
        "coverage" => Some("coverage-analyzer"),
        "refactoring" => Some("refactor-assistant"),
        "architecture" => Some("architecture-analyzer"),
        "dependencies" => Some("dependency-auditor"),
        "documentation" => Some("doc-writer"),
        "api" => Some("api-designer"),
        "schema" => Some("schema-designer"),
        _ => None,
    }
}

/// Reconcile successful results into one consensus view
///
/// Agreement is the fraction of aspects that needed no resolution.
/// Confidence blends agreement (70%) with contributor count saturating
/// at five (30%).
pub fn build_consensus(
    results: &BTreeMap<String, CapabilityOutcome>,
    registry: &BTreeMap<String, ToolCapability>,
) -> ConsensusResult {
    // aspect -> contributions as (capability id, value)
    let mut aspects: BTreeMap<String, Vec<(String, Value)>> = BTreeMap::new();
    let mut contributors = 0usize;
    for (capability, outcome) in results {
        let Some(value) = outcome.value() else {
            continue;
        };
        contributors += 1;
        if let Some(map) = value.as_map() {
            for (aspect, value) in map {
                aspects
                    .entry(aspect.clone())
                    .or_default()
                    .push((capability.clone(), value.clone()));
            }
        } else {
            // scalar results contribute under the capability's own name
            aspects
                .entry(capability.clone())
                .or_default()
                .push((capability.clone(), value.clone()));
        }
    }

    let total = aspects.len();
    let mut outcome = BTreeMap::new();
    let mut conflicts = Vec::new();
    for (aspect, contributions) in aspects {
        if is_unanimous(&contributions) {
            outcome.insert(aspect, contributions[0].1.clone());
            continue;
        }

        let (value, resolved_by) = settle(&aspect, &contributions, registry);
        conflicts.push(AspectConflict {
            aspect: aspect.clone(),
            contributors: contributions.iter().map(|(c, _)| c.clone()).collect(),
            resolved_by,
        });
        outcome.insert(aspect, value);
    }

    let agreement_level = if total == 0 {
        1.0
    } else {
        (total - conflicts.len()) as f64 / total as f64
    };
    let confidence = agreement_level * 0.7 + (contributors as f64 / 5.0).min(1.0) * 0.3;

    ConsensusResult {
        outcome,
        agreement_level,
        confidence,
        conflicts,
    }
}

fn is_unanimous(contributions: &[(String, Value)]) -> bool {
    let first = contributions[0].1.canonical();
    contributions.iter().all(|(_, v)| v.canonical() == first)
}

/// Settle one disputed aspect
fn settle(
    aspect: &str,
    contributions: &[(String, Value)],
    registry: &BTreeMap<String, ToolCapability>,
) -> (Value, AspectResolution) {
    if let Some(expert) = expert_for(aspect) {
        if let Some((capability, value)) = contributions.iter().find(|(c, _)| c == expert) {
            return (
                value.clone(),
                AspectResolution::Expert {
                    capability: capability.clone(),
                },
            );
        }
    }

    // strict majority over canonical forms
    let mut tallies: BTreeMap<String, (usize, Value)> = BTreeMap::new();
    for (_, value) in contributions {
        let entry = tallies
            .entry(value.canonical())
            .or_insert_with(|| (0, value.clone()));
        entry.0 += 1;
    }
    if let Some((count, value)) = tallies.values().max_by_key(|(count, _)| *count) {
        if *count * 2 > contributions.len() {
            return (value.clone(), AspectResolution::Majority);
        }
    }

    // weight each candidate value by its contributors' quality scores
    let mut weighted: BTreeMap<String, (f64, Value)> = BTreeMap::new();
    for (capability, value) in contributions {
        let quality = registry
            .get(capability)
            .map(|c| c.performance.quality_score)
            .unwrap_or(50.0);
        let entry = weighted
            .entry(value.canonical())
            .or_insert_with(|| (0.0, value.clone()));
        entry.0 += quality;
    }
    let best = weighted
        .values()
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, v)| v.clone())
        .unwrap_or_else(|| contributions[0].1.clone());
    (best, AspectResolution::QualityWeighted)
}
