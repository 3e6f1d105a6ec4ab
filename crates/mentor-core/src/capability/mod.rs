//! External capability contracts.
//!
//! The turn engine delegates all language understanding and generation to
//! two external capabilities: a safety pre-check and the tutoring turn
//! decision. Both are non-deterministic network services; their output is
//! untrusted until it passes the validation gate in [`validation`].
//!
//! Capability handles are constructed explicitly and injected into the
//! orchestrator - there is no ambient or global client state.

pub mod validation;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CapabilityError;
use crate::session::{ConversationMessage, Misconception, Question, SessionSummary, Topic};

/// Minimal per-turn context handed to the safety gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnContext {
    /// Owning session id.
    pub session_id: String,
    /// Turn number within the session.
    pub turn: u32,
    /// The student's message this turn.
    pub message: String,
    /// Current plan step pointer (1-indexed).
    pub current_step: usize,
    /// Concept of the current plan step, if the pointer is in range.
    pub concept: Option<String>,
    /// Student grade level, if known.
    pub grade_level: Option<String>,
    /// Student language level, if known.
    pub language_level: Option<String>,
}

/// Verdict returned by the safety capability.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyVerdict {
    /// Whether the message is safe to tutor on.
    pub is_safe: bool,
    /// Category of the violation, when unsafe.
    #[serde(default)]
    pub violation_type: Option<String>,
    /// Redirect text to show the student, when unsafe.
    #[serde(default)]
    pub guidance: Option<String>,
    /// Whether the session's warning counter should be incremented.
    pub should_warn: bool,
}

/// One proposed mastery observation for a concept.
///
/// `score` is an assessment in [0, 1]; the orchestrator feeds it through
/// the mastery estimator rather than writing it into the map directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasteryUpdate {
    pub concept: String,
    pub score: f64,
}

/// The structured payload one turn-decision call must return.
///
/// `reasoning` is internal-only diagnostic text and must never be
/// surfaced to the student.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnDirective {
    /// The tutor's response text for this turn.
    pub response: String,
    /// Classified intent of the student's message (e.g. "answer",
    /// "question", "off_topic").
    pub intent: String,
    /// Correctness verdict for the live question, when one was evaluated.
    #[serde(default)]
    pub answer_correct: Option<bool>,
    /// Misconceptions detected this turn.
    #[serde(default)]
    pub misconceptions_detected: Vec<String>,
    /// Proposed mastery observations.
    #[serde(default)]
    pub mastery_updates: Vec<MasteryUpdate>,
    /// Proposed step to advance to (1-indexed, forward only).
    #[serde(default)]
    pub advance_to_step: Option<usize>,
    /// A question the tutor proposes to ask.
    #[serde(default)]
    pub question_asked: Option<String>,
    /// Expected answer for the proposed question.
    #[serde(default)]
    pub expected_answer: Option<String>,
    /// Concept the proposed question probes.
    #[serde(default)]
    pub question_concept: Option<String>,
    /// The capability believes the session should end.
    #[serde(default)]
    pub session_complete: bool,
    /// One-line summary of this turn for the rolling timeline.
    #[serde(default)]
    pub turn_summary: String,
    /// Internal rationale; never shown to the student.
    #[serde(default)]
    pub reasoning: String,
}

/// The full session snapshot handed to the turn-decision capability.
#[derive(Debug, Clone, Serialize)]
pub struct DecisionContext {
    /// Owning session id.
    pub session_id: String,
    /// Turn number within the session.
    pub turn: u32,
    /// The student's message this turn.
    pub message: String,
    /// The assigned topic and plan.
    pub topic: Topic,
    /// Current plan step pointer (1-indexed).
    pub current_step: usize,
    /// Mastery snapshot (concept -> score).
    pub mastery: std::collections::HashMap<String, f64>,
    /// Recorded misconceptions.
    pub misconceptions: Vec<Misconception>,
    /// Rolling session summary.
    pub summary: SessionSummary,
    /// The live question, if any.
    pub question: Option<Question>,
    /// Bounded recent conversation window.
    pub history: Vec<ConversationMessage>,
    /// Student grade level, if known.
    pub grade_level: Option<String>,
    /// Student language level, if known.
    pub language_level: Option<String>,
}

/// The safety pre-check capability.
///
/// Returns an allow/deny verdict for a student message before any
/// tutoring decision is made. The engine does not implement safety logic
/// itself; it only defines this contract and the state consequences of a
/// negative verdict.
#[async_trait]
pub trait SafetyGate: Send + Sync {
    /// Checks one student message in its lesson context.
    async fn check(&self, context: &TurnContext) -> Result<SafetyVerdict, CapabilityError>;
}

/// The tutoring turn-decision capability.
///
/// Produces one validated [`TurnDirective`] per turn: the response text
/// plus every proposed state delta.
#[async_trait]
pub trait TurnDecider: Send + Sync {
    /// Decides the tutor's next move from the full session snapshot.
    async fn decide(&self, context: &DecisionContext) -> Result<TurnDirective, CapabilityError>;
}
