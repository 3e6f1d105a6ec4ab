//! Mastery estimation primitives.
//!
//! Pure, stateless functions over per-concept mastery scores in `[0, 1]`.
//! Nothing else in the engine is allowed to write mastery values; the
//! orchestrator routes every proposed update through [`update`] so the
//! asymmetric reinforcement rule is applied uniformly.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Coarse mastery bucket for a single concept.
///
/// Boundaries are inclusive on the lower bound of each bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MasteryLevel {
    Mastered,
    Strong,
    Adequate,
    Developing,
    NeedsWork,
}

/// Applies one observation to a mastery score.
///
/// Exponential-moving-average style: a correct answer moves the score
/// toward 1.0 by `learning_rate * confidence` of the remaining gap; an
/// incorrect answer decays the score at half that rate (the
/// `incorrect_penalty` asymmetry is deliberate - one slip should not
/// erase hard-won mastery). The result is clamped to `[0, 1]`, and a
/// confidence or learning rate of zero is a no-op.
pub fn update(
    current: f64,
    is_correct: bool,
    confidence: f64,
    learning_rate: f64,
    incorrect_penalty: f64,
) -> f64 {
    let next = if is_correct {
        current + (1.0 - current) * learning_rate * confidence
    } else {
        current - current * learning_rate * confidence * incorrect_penalty
    };
    next.clamp(0.0, 1.0)
}

/// Weighted mean over a mastery map.
///
/// Missing weights default to 1.0. An empty map, or a weight set summing
/// to zero, yields 0.0 rather than dividing by zero.
pub fn aggregate(estimates: &HashMap<String, f64>, weights: Option<&HashMap<String, f64>>) -> f64 {
    let mut total = 0.0;
    let mut weight_sum = 0.0;
    for (concept, score) in estimates {
        let weight = weights
            .and_then(|w| w.get(concept))
            .copied()
            .unwrap_or(1.0);
        total += score * weight;
        weight_sum += weight;
    }
    if weight_sum == 0.0 {
        0.0
    } else {
        total / weight_sum
    }
}

/// Buckets a score into a [`MasteryLevel`].
pub fn level(score: f64) -> MasteryLevel {
    if score >= 0.9 {
        MasteryLevel::Mastered
    } else if score >= 0.7 {
        MasteryLevel::Strong
    } else if score >= 0.5 {
        MasteryLevel::Adequate
    } else if score >= 0.3 {
        MasteryLevel::Developing
    } else {
        MasteryLevel::NeedsWork
    }
}

/// Whether the student is ready to advance past `concept`.
///
/// A concept absent from the map reads as mastery 0.0, so an unknown
/// concept fails closed.
pub fn should_advance(estimates: &HashMap<String, f64>, concept: &str, threshold: f64) -> bool {
    estimates.get(concept).copied().unwrap_or(0.0) >= threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upd(current: f64, is_correct: bool, confidence: f64, rate: f64) -> f64 {
        update(current, is_correct, confidence, rate, 0.5)
    }

    #[test]
    fn update_stays_clamped() {
        for &current in &[0.0, 0.25, 0.5, 0.75, 1.0] {
            for &is_correct in &[true, false] {
                for &confidence in &[0.0, 0.3, 1.0] {
                    for &rate in &[0.0, 0.2, 1.0] {
                        let next = upd(current, is_correct, confidence, rate);
                        assert!((0.0..=1.0).contains(&next), "out of range: {next}");
                    }
                }
            }
        }
    }

    #[test]
    fn correct_never_decreases_incorrect_never_increases() {
        for &current in &[0.0, 0.4, 0.9, 1.0] {
            assert!(upd(current, true, 0.7, 0.2) >= current);
            assert!(upd(current, false, 0.7, 0.2) <= current);
        }
    }

    #[test]
    fn zero_confidence_or_rate_is_a_noop() {
        assert_eq!(upd(0.6, true, 0.0, 0.2), 0.6);
        assert_eq!(upd(0.6, true, 1.0, 0.0), 0.6);
        assert_eq!(upd(0.6, false, 1.0, 0.0), 0.6);
    }

    #[test]
    fn incorrect_penalized_at_half_rate() {
        let gain = upd(0.5, true, 1.0, 0.2) - 0.5;
        let loss = 0.5 - upd(0.5, false, 1.0, 0.2);
        // At score 0.5 the remaining gap equals the current score, so the
        // asymmetry factor is directly observable.
        assert!((loss - gain * 0.5).abs() < 1e-12);
    }

    #[test]
    fn aggregate_empty_map_is_zero() {
        assert_eq!(aggregate(&HashMap::new(), None), 0.0);
    }

    #[test]
    fn aggregate_zero_total_weight_is_zero() {
        let estimates = HashMap::from([("fractions".to_string(), 0.8)]);
        let weights = HashMap::from([("fractions".to_string(), 0.0)]);
        assert_eq!(aggregate(&estimates, Some(&weights)), 0.0);
    }

    #[test]
    fn aggregate_defaults_missing_weights() {
        let estimates = HashMap::from([
            ("fractions".to_string(), 0.8),
            ("decimals".to_string(), 0.4),
        ]);
        let weights = HashMap::from([("fractions".to_string(), 3.0)]);
        let overall = aggregate(&estimates, Some(&weights));
        assert!((overall - (0.8 * 3.0 + 0.4) / 4.0).abs() < 1e-12);
    }

    #[test]
    fn level_boundaries_are_inclusive_on_lower_bound() {
        assert_eq!(level(0.9), MasteryLevel::Mastered);
        assert_eq!(level(0.8999), MasteryLevel::Strong);
        assert_eq!(level(0.7), MasteryLevel::Strong);
        assert_eq!(level(0.6999), MasteryLevel::Adequate);
        assert_eq!(level(0.5), MasteryLevel::Adequate);
        assert_eq!(level(0.3), MasteryLevel::Developing);
        assert_eq!(level(0.0), MasteryLevel::NeedsWork);
    }

    #[test]
    fn missing_concept_fails_closed() {
        let estimates = HashMap::from([("fractions".to_string(), 0.95)]);
        assert!(should_advance(&estimates, "fractions", 0.7));
        assert!(!should_advance(&estimates, "decimals", 0.7));
    }

    #[test]
    fn level_displays_snake_case() {
        assert_eq!(MasteryLevel::NeedsWork.to_string(), "needs_work");
        assert_eq!(MasteryLevel::Mastered.to_string(), "mastered");
    }
}
