//! Tunable pedagogy constants.
//!
//! Every threshold in the turn engine encodes a product decision rather
//! than an algorithmic necessity, so all of them live here and can be
//! overridden from a TOML document instead of being hard-coded at the
//! call sites.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Configuration for the tutoring turn engine.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct TutorConfig {
    /// EMA learning rate for mastery reinforcement.
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    /// Incorrect answers are penalized at this fraction of the
    /// reinforcement rate.
    #[serde(default = "default_incorrect_penalty")]
    pub incorrect_penalty: f64,
    /// Mastery score at which a concept is considered ready to advance.
    #[serde(default = "default_advance_threshold")]
    pub advance_threshold: f64,
    /// Number of recent messages kept in the live prompting window.
    #[serde(default = "default_history_window")]
    pub history_window: usize,
    /// Number of turn summaries kept in the rolling session summary.
    #[serde(default = "default_timeline_window")]
    pub timeline_window: usize,
    /// Average mastery at/above which a correct answer reads as "improving".
    #[serde(default = "default_trend_improving")]
    pub trend_improving_mastery: f64,
    /// Average mastery below which an incorrect answer reads as "struggling".
    #[serde(default = "default_trend_struggling")]
    pub trend_struggling_mastery: f64,
    /// Wrong attempts (after increment) at which the question escalates
    /// to a guided hint.
    #[serde(default = "default_hint_after")]
    pub hint_after: u32,
    /// Wrong attempts (after increment) at which the question escalates
    /// to a full explanation.
    #[serde(default = "default_explain_after")]
    pub explain_after: u32,
}

fn default_learning_rate() -> f64 {
    0.2
}

fn default_incorrect_penalty() -> f64 {
    0.5
}

fn default_advance_threshold() -> f64 {
    0.7
}

fn default_history_window() -> usize {
    10
}

fn default_timeline_window() -> usize {
    12
}

fn default_trend_improving() -> f64 {
    0.6
}

fn default_trend_struggling() -> f64 {
    0.4
}

fn default_hint_after() -> u32 {
    2
}

fn default_explain_after() -> u32 {
    3
}

impl Default for TutorConfig {
    fn default() -> Self {
        Self {
            learning_rate: default_learning_rate(),
            incorrect_penalty: default_incorrect_penalty(),
            advance_threshold: default_advance_threshold(),
            history_window: default_history_window(),
            timeline_window: default_timeline_window(),
            trend_improving_mastery: default_trend_improving(),
            trend_struggling_mastery: default_trend_struggling(),
            hint_after: default_hint_after(),
            explain_after: default_explain_after(),
        }
    }
}

impl TutorConfig {
    /// Parses a configuration from a TOML document.
    ///
    /// Missing keys fall back to the defaults, so a partial override file
    /// is valid.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_tuned_constants() {
        let config = TutorConfig::default();
        assert_eq!(config.learning_rate, 0.2);
        assert_eq!(config.incorrect_penalty, 0.5);
        assert_eq!(config.advance_threshold, 0.7);
        assert_eq!(config.history_window, 10);
    }

    #[test]
    fn partial_toml_overrides_only_named_keys() {
        let config = TutorConfig::from_toml_str("learning_rate = 0.3\nhint_after = 3\n")
            .expect("valid toml");
        assert_eq!(config.learning_rate, 0.3);
        assert_eq!(config.hint_after, 3);
        // Untouched keys keep their defaults.
        assert_eq!(config.advance_threshold, 0.7);
    }

    #[test]
    fn malformed_toml_is_a_serialization_error() {
        let err = TutorConfig::from_toml_str("learning_rate = ").unwrap_err();
        assert!(matches!(
            err,
            crate::error::MentorError::Serialization { .. }
        ));
    }
}
