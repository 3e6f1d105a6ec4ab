//! Rolling session summary.
//!
//! A bounded memory of how the session has gone so far: the last N turn
//! summaries, what has been taught, which examples were already used
//! (so the tutor does not repeat itself), and a coarse trend.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::config::TutorConfig;

/// Coarse direction of the student's recent performance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Improving,
    Steady,
    Struggling,
}

/// Bounded rolling memory of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Last N one-line turn summaries, oldest first.
    pub timeline: Vec<String>,
    /// Concepts covered so far (deduplicated, in first-taught order).
    pub concepts_taught: Vec<String>,
    /// Examples and analogies already used, to avoid repetition.
    pub examples_used: Vec<String>,
    /// Current performance trend.
    pub trend: Trend,
}

impl Default for SessionSummary {
    fn default() -> Self {
        Self {
            timeline: Vec::new(),
            concepts_taught: Vec::new(),
            examples_used: Vec::new(),
            trend: Trend::Steady,
        }
    }
}

impl SessionSummary {
    /// Appends a turn summary, dropping the oldest entry past the window.
    pub fn record_turn(&mut self, entry: impl Into<String>, config: &TutorConfig) {
        self.timeline.push(entry.into());
        while self.timeline.len() > config.timeline_window {
            self.timeline.remove(0);
        }
    }

    /// Records that a concept was taught this turn.
    pub fn record_concept(&mut self, concept: impl Into<String>) {
        let concept = concept.into();
        if !concept.is_empty() && !self.concepts_taught.contains(&concept) {
            self.concepts_taught.push(concept);
        }
    }

    /// Records an example or analogy the tutor used.
    pub fn record_example(&mut self, example: impl Into<String>) {
        let example = example.into();
        if !example.is_empty() && !self.examples_used.contains(&example) {
            self.examples_used.push(example);
        }
    }

    /// Reclassifies the trend from the latest verdict and average mastery.
    ///
    /// Correct with healthy mastery reads as improving, incorrect with low
    /// mastery as struggling, everything else as steady. A turn without a
    /// verdict leaves the trend alone.
    pub fn update_trend(
        &mut self,
        answer_correct: Option<bool>,
        average_mastery: f64,
        config: &TutorConfig,
    ) {
        let Some(correct) = answer_correct else {
            return;
        };
        self.trend = if correct && average_mastery >= config.trend_improving_mastery {
            Trend::Improving
        } else if !correct && average_mastery < config.trend_struggling_mastery {
            Trend::Struggling
        } else {
            Trend::Steady
        };
    }
}
