//! Pure scoring functions over positions and evidence
//!
//! These are the measurement primitives every resolution method builds on:
//! evidence strength, agreement between positions, and middle-ground
//! computation.

use super::entities::{Evidence, Position};
use crate::core::value::Value;
use std::collections::BTreeMap;

/// Score a list of evidence items
///
/// Each item contributes `strength x kind weight`, with a 1.1 bonus when the
/// item is verifiable; the result is the mean over all items. An empty list
/// scores 0.
pub fn score_evidence(evidence: &[Evidence]) -> f64 {
    if evidence.is_empty() {
        return 0.0;
    }
    let total: f64 = evidence
        .iter()
        .map(|e| {
            let verifiability = if e.verifiable { 1.1 } else { 1.0 };
            e.strength * e.kind.weight() * verifiability
        })
        .sum();
    total / evidence.len() as f64
}

/// Agreement level across positions, in [0, 1]
///
/// Positions are grouped by identical serialized stance; the agreement level
/// is the summed confidence of the largest group over total confidence.
/// Returns 1.0 only when every stance serializes identically.
pub fn calculate_agreement(positions: &[Position]) -> f64 {
    if positions.is_empty() {
        return 0.0;
    }
    let total: f64 = positions.iter().map(|p| p.confidence).sum();
    if total <= 0.0 {
        return 0.0;
    }

    let mut groups: BTreeMap<String, f64> = BTreeMap::new();
    for position in positions {
        *groups.entry(position.stance.canonical()).or_insert(0.0) += position.confidence;
    }
    let largest = groups.values().cloned().fold(0.0, f64::max);
    largest / total
}

/// Compute a middle-ground value across stances
///
/// - All-numeric stances: confidence-weighted average.
/// - All-map stances: key-wise most common value across the maps.
/// - Anything else: the most common whole stance.
///
/// Returns `None` for an empty position list.
pub fn find_middle_ground(positions: &[Position]) -> Option<Value> {
    if positions.is_empty() {
        return None;
    }

    let numbers: Vec<(f64, f64)> = positions
        .iter()
        .filter_map(|p| p.stance.as_number().map(|n| (n, p.confidence)))
        .collect();
    if numbers.len() == positions.len() {
        let weight: f64 = numbers.iter().map(|(_, c)| c).sum();
        if weight <= 0.0 {
            let mean = numbers.iter().map(|(n, _)| n).sum::<f64>() / numbers.len() as f64;
            return Some(Value::number(mean));
        }
        let weighted: f64 = numbers.iter().map(|(n, c)| n * c).sum();
        return Some(Value::number(weighted / weight));
    }

    let maps: Vec<&BTreeMap<String, Value>> = positions
        .iter()
        .filter_map(|p| p.stance.as_map())
        .collect();
    if maps.len() == positions.len() {
        let mut keys: Vec<&String> = maps.iter().flat_map(|m| m.keys()).collect();
        keys.sort();
        keys.dedup();

        let mut merged = BTreeMap::new();
        for key in keys {
            let values: Vec<&Value> = maps.iter().filter_map(|m| m.get(key)).collect();
            if let Some(value) = most_common(&values) {
                merged.insert(key.clone(), value.clone());
            }
        }
        return Some(Value::Map(merged));
    }

    let stances: Vec<&Value> = positions.iter().map(|p| &p.stance).collect();
    most_common(&stances).cloned()
}

/// Most common value by canonical form; ties resolve to the first seen
fn most_common<'a>(values: &[&'a Value]) -> Option<&'a Value> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for value in values {
        *counts.entry(value.canonical()).or_insert(0) += 1;
    }
    values
        .iter()
        .max_by_key(|v| counts.get(&v.canonical()).copied().unwrap_or(0))
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conflict::entities::EvidenceKind;

    fn position(participant: &str, stance: Value, confidence: f64) -> Position {
        Position::new(participant, stance, confidence)
    }

    #[test]
    fn test_score_evidence_empty_is_zero() {
        assert_eq!(score_evidence(&[]), 0.0);
    }

    #[test]
    fn test_score_evidence_monotonic_in_strength() {
        let weak = vec![Evidence::new("a", EvidenceKind::Logical, 0.3)];
        let strong = vec![Evidence::new("a", EvidenceKind::Logical, 0.9)];
        assert!(score_evidence(&strong) > score_evidence(&weak));
    }

    #[test]
    fn test_score_evidence_verifiable_scores_higher() {
        let plain = vec![Evidence::new("a", EvidenceKind::Empirical, 0.8)];
        let verified = vec![Evidence::new("a", EvidenceKind::Empirical, 0.8).verifiable()];
        assert!(score_evidence(&verified) > score_evidence(&plain));
        assert!((score_evidence(&verified) - 0.8 * 1.2 * 1.1).abs() < 1e-9);
    }

    #[test]
    fn test_agreement_identical_stances_is_one() {
        let positions = vec![
            position("a", Value::number(10.0), 0.6),
            position("b", Value::number(10.0), 0.9),
        ];
        assert_eq!(calculate_agreement(&positions), 1.0);
    }

    #[test]
    fn test_agreement_split_stances_below_one() {
        let positions = vec![
            position("a", Value::number(10.0), 0.3),
            position("b", Value::number(20.0), 0.7),
        ];
        let agreement = calculate_agreement(&positions);
        assert!((agreement - 0.7).abs() < 1e-9);
        assert!(agreement < 1.0);
    }

    #[test]
    fn test_agreement_empty_is_zero() {
        assert_eq!(calculate_agreement(&[]), 0.0);
    }

    #[test]
    fn test_middle_ground_numeric_weighted_average() {
        let positions = vec![
            position("a", Value::number(10.0), 1.0),
            position("b", Value::number(20.0), 1.0),
        ];
        assert_eq!(find_middle_ground(&positions), Some(Value::number(15.0)));
    }

    #[test]
    fn test_middle_ground_numeric_respects_confidence() {
        let positions = vec![
            position("a", Value::number(10.0), 1.0),
            position("b", Value::number(20.0), 0.0),
        ];
        // all weight on the first stance
        assert_eq!(find_middle_ground(&positions), Some(Value::number(10.0)));
    }

    #[test]
    fn test_middle_ground_maps_pick_most_common_per_key() {
        let positions = vec![
            position("a", Value::map([("risk", Value::text("low"))]), 0.5),
            position("b", Value::map([("risk", Value::text("low"))]), 0.5),
            position("c", Value::map([("risk", Value::text("high"))]), 0.5),
        ];
        let merged = find_middle_ground(&positions).unwrap();
        assert_eq!(merged.get("risk"), Some(&Value::text("low")));
    }

    #[test]
    fn test_middle_ground_mixed_shapes_most_common_whole_stance() {
        let positions = vec![
            position("a", Value::text("rewrite"), 0.5),
            position("b", Value::text("rewrite"), 0.5),
            position("c", Value::number(3.0), 0.5),
        ];
        assert_eq!(find_middle_ground(&positions), Some(Value::text("rewrite")));
    }

    #[test]
    fn test_middle_ground_empty_is_none() {
        assert_eq!(find_middle_ground(&[]), None);
    }
}
