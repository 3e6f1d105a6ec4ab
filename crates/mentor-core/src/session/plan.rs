//! Curriculum plan types.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// The pedagogical function of a single plan step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    /// Introduce or explain a concept.
    Explain,
    /// Check the student's understanding with a question.
    Check,
    /// Apply the concept through exercises.
    Practice,
}

/// One unit of the curriculum sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanStep {
    /// What kind of step this is.
    pub kind: StepKind,
    /// The concept the step covers.
    pub concept: String,
    /// Optional content hint for the tutor (an angle, example, or scope note).
    #[serde(default)]
    pub hint: Option<String>,
}

impl PlanStep {
    /// Creates a step without a content hint.
    pub fn new(kind: StepKind, concept: impl Into<String>) -> Self {
        Self {
            kind,
            concept: concept.into(),
            hint: None,
        }
    }

    /// Attaches a content hint.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// An assigned topic: a title plus its ordered list of plan steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    /// Human-readable topic title.
    pub title: String,
    /// The ordered curriculum steps.
    pub steps: Vec<PlanStep>,
}

impl Topic {
    /// Creates a topic from a title and steps.
    pub fn new(title: impl Into<String>, steps: Vec<PlanStep>) -> Self {
        Self {
            title: title.into(),
            steps,
        }
    }

    /// Number of steps in the plan.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the plan has no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// The step at a 1-indexed position, if any.
    pub fn step(&self, index: usize) -> Option<&PlanStep> {
        index.checked_sub(1).and_then(|i| self.steps.get(i))
    }

    /// Distinct concept names in plan order.
    pub fn concepts(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for step in &self.steps {
            if !seen.contains(&step.concept) {
                seen.push(step.concept.clone());
            }
        }
        seen
    }
}
