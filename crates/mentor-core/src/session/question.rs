//! Outstanding-question lifecycle.
//!
//! At most one question is live per session. Repeated wrong answers walk
//! the question through an escalation ladder (probe, hint, explain)
//! instead of replacing it, so the retry count survives every rephrasing
//! the tutor produces. The concept-identity check is the load-bearing
//! rule: a follow-up on the same concept continues the existing question,
//! a question on a different concept replaces it.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::config::TutorConfig;

/// Escalation phase of a live question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum QuestionPhase {
    /// Just asked; no wrong attempt yet.
    Asked,
    /// First wrong attempt; probe the student's reasoning.
    Probe,
    /// Second wrong attempt; give a guided hint.
    Hint,
    /// Terminal phase; explain the answer. Further wrong attempts stay here.
    Explain,
}

/// The one outstanding question of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// The question as asked.
    pub text: String,
    /// The answer the tutor expects.
    pub expected_answer: String,
    /// The concept the question probes.
    pub concept: String,
    /// Current escalation phase.
    pub phase: QuestionPhase,
    /// Number of wrong attempts so far.
    pub wrong_attempts: u32,
    /// The student's wrong answers, verbatim, in order.
    pub wrong_answers: Vec<String>,
}

impl Question {
    /// Creates a freshly asked question.
    pub fn asked(
        text: impl Into<String>,
        expected_answer: impl Into<String>,
        concept: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            expected_answer: expected_answer.into(),
            concept: concept.into(),
            phase: QuestionPhase::Asked,
            wrong_attempts: 0,
            wrong_answers: Vec::new(),
        }
    }
}

/// Phase as a function of the wrong-attempt count.
///
/// The phase is recomputed from the counter on every transition rather
/// than incremented independently, so the two can never drift apart.
pub fn phase_for_attempts(wrong_attempts: u32, config: &TutorConfig) -> QuestionPhase {
    if wrong_attempts == 0 {
        QuestionPhase::Asked
    } else if wrong_attempts < config.hint_after {
        QuestionPhase::Probe
    } else if wrong_attempts < config.explain_after {
        QuestionPhase::Hint
    } else {
        QuestionPhase::Explain
    }
}

/// The per-turn input driving a lifecycle transition.
///
/// Extracted from the decision payload by the orchestrator.
#[derive(Debug, Clone, Default)]
pub struct QuestionSignal<'a> {
    /// Correctness verdict for the live question, if the payload gave one.
    pub answer_correct: Option<bool>,
    /// A question the payload proposes to ask.
    pub question_asked: Option<&'a str>,
    /// Expected answer for the proposed question.
    pub expected_answer: Option<&'a str>,
    /// Concept of the proposed question.
    pub question_concept: Option<&'a str>,
    /// The student's message this turn, recorded verbatim on a wrong answer.
    pub student_answer: &'a str,
}

/// What a lifecycle transition did, for logging and summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionChange {
    /// A new question was created.
    Created,
    /// The live question was answered and cleared.
    Cleared,
    /// The live question was preserved and its escalation advanced.
    Escalated,
    /// The live question was replaced by a different-concept question.
    Replaced,
    /// Nothing changed.
    Unchanged,
}

/// Runs one lifecycle transition against the session's question slot.
///
/// Rules, evaluated in precedence order (first match wins):
/// 1. no live question + proposed question -> create as `asked`
/// 2. live question + correct verdict -> clear (wins over any proposal)
/// 3. live question + wrong verdict -> preserve; bump the counter, record
///    the answer, recompute the phase
/// 4. live question + same-concept proposal, no verdict -> no-op
/// 5. live question + different-concept proposal, no verdict -> replace
pub fn transition(
    slot: &mut Option<Question>,
    signal: &QuestionSignal<'_>,
    config: &TutorConfig,
) -> QuestionChange {
    let Some(live) = slot.as_mut() else {
        if let Some(text) = signal.question_asked {
            let concept = signal.question_concept.unwrap_or_default();
            let expected = signal.expected_answer.unwrap_or_default();
            *slot = Some(Question::asked(text, expected, concept));
            return QuestionChange::Created;
        }
        return QuestionChange::Unchanged;
    };

    match signal.answer_correct {
        Some(true) => {
            *slot = None;
            QuestionChange::Cleared
        }
        Some(false) => {
            live.wrong_attempts += 1;
            live.wrong_answers.push(signal.student_answer.to_string());
            live.phase = phase_for_attempts(live.wrong_attempts, config);
            QuestionChange::Escalated
        }
        None => match (signal.question_asked, signal.question_concept) {
            (Some(text), Some(concept)) if concept != live.concept => {
                let expected = signal.expected_answer.unwrap_or_default();
                *slot = Some(Question::asked(text, expected, concept));
                QuestionChange::Replaced
            }
            // Same-concept follow-up: continued probing of the existing
            // question, counters untouched.
            _ => QuestionChange::Unchanged,
        },
    }
}
