//! Turn orchestrator.
//!
//! Single entry point for processing one student message against one
//! session: safety check, decision call, validated state application,
//! bookkeeping. The pipeline is strictly sequential and mutates session
//! state only after a fully validated directive is in hand, so a failed
//! capability call can never leave the session half-updated.

use std::sync::Arc;

use crate::capability::{DecisionContext, SafetyGate, TurnContext, TurnDecider, TurnDirective};
use crate::config::TutorConfig;
use crate::error::Result;
use crate::mastery;
use crate::session::exam::ExamQuestion;
use crate::session::message::ConversationMessage;
use crate::session::misconception::Misconception;
use crate::session::model::{Session, SessionMode};
use crate::session::question::{self, QuestionChange, QuestionSignal};

/// Response shown when a turn arrives after the session has ended.
const SESSION_ENDED_RESPONSE: &str =
    "This session has already ended. Start a new session to keep learning!";

/// Response shown when the safety gate rejects a message and supplies no
/// guidance of its own.
const SAFETY_REDIRECT_RESPONSE: &str =
    "Let's keep our focus on the lesson - what would you like to know about the topic?";

/// In-character response for any internal failure.
const ERROR_RESPONSE: &str =
    "I'm sorry, I had trouble with that one. Could you say it again in different words?";

/// What one processed turn returns to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    /// The tutor's student-facing response.
    pub response: String,
    /// Classified intent of the turn.
    pub intent: String,
    /// Whether session state was mutated beyond the audit trail.
    pub state_changed: bool,
}

impl TurnOutcome {
    fn new(response: impl Into<String>, intent: impl Into<String>, state_changed: bool) -> Self {
        Self {
            response: response.into(),
            intent: intent.into(),
            state_changed,
        }
    }
}

/// Drives one session through one turn at a time.
///
/// Capability handles are injected at construction; the orchestrator
/// holds no other state. A given session must not be processed by two
/// concurrent turns - the caller serializes per session id.
pub struct TurnOrchestrator {
    safety: Arc<dyn SafetyGate>,
    decider: Arc<dyn TurnDecider>,
    config: TutorConfig,
}

impl TurnOrchestrator {
    /// Creates an orchestrator over the two capability handles.
    pub fn new(
        safety: Arc<dyn SafetyGate>,
        decider: Arc<dyn TurnDecider>,
        config: TutorConfig,
    ) -> Self {
        Self {
            safety,
            decider,
            config,
        }
    }

    /// The engine's tunable constants.
    pub fn config(&self) -> &TutorConfig {
        &self.config
    }

    /// Processes one student message.
    ///
    /// Never returns an error to the caller: any capability or validation
    /// failure inside the pipeline collapses to a polite fallback outcome
    /// with `state_changed = false` and the failure logged.
    pub async fn process_turn(&self, session: &mut Session, message: &str) -> TurnOutcome {
        // A finished session records the message for audit and refuses
        // further processing.
        if session.is_complete() {
            session.push_audit_only(ConversationMessage::student(message));
            return TurnOutcome::new(SESSION_ENDED_RESPONSE, "session_complete", false);
        }

        session.turn_count += 1;
        session.touch();
        session.push_message(
            ConversationMessage::student(message),
            self.config.history_window,
        );

        match self.run_turn(session, message).await {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::warn!(
                    session_id = %session.id,
                    turn = session.turn_count,
                    error = %err,
                    "turn failed; returning safe fallback"
                );
                session.push_audit_only(ConversationMessage::system(format!(
                    "turn_failed: {err}"
                )));
                TurnOutcome::new(ERROR_RESPONSE, "error", false)
            }
        }
    }

    async fn run_turn(&self, session: &mut Session, message: &str) -> Result<TurnOutcome> {
        let context = TurnContext {
            session_id: session.id.clone(),
            turn: session.turn_count,
            message: message.to_string(),
            current_step: session.current_step,
            concept: session.current_concept().map(str::to_string),
            grade_level: session.grade_level.clone(),
            language_level: session.language_level.clone(),
        };

        let verdict = self.safety.check(&context).await?;
        if !verdict.is_safe {
            // No tutoring decision is made for an unsafe turn.
            let violation = verdict.violation_type.as_deref().unwrap_or("unspecified");
            tracing::debug!(
                session_id = %session.id,
                violation,
                "safety gate rejected message"
            );
            session.push_audit_only(ConversationMessage::system(format!(
                "safety_flag: {violation}"
            )));
            if verdict.should_warn {
                session.warning_count += 1;
            }
            let response = verdict
                .guidance
                .unwrap_or_else(|| SAFETY_REDIRECT_RESPONSE.to_string());
            session.push_message(
                ConversationMessage::tutor(&response),
                self.config.history_window,
            );
            return Ok(TurnOutcome::new(response, "safety_redirect", true));
        }

        let decision_context = DecisionContext {
            session_id: session.id.clone(),
            turn: session.turn_count,
            message: message.to_string(),
            topic: session.topic.clone(),
            current_step: session.current_step,
            mastery: session.mastery.clone(),
            misconceptions: session.misconceptions.clone(),
            summary: session.summary.clone(),
            question: session.question.clone(),
            history: session.history.clone(),
            grade_level: session.grade_level.clone(),
            language_level: session.language_level.clone(),
        };

        let directive = self.decider.decide(&decision_context).await?;
        let state_changed = self.apply_directive(session, &directive, message)?;

        session.push_message(
            ConversationMessage::tutor(&directive.response),
            self.config.history_window,
        );
        if !directive.turn_summary.is_empty() {
            session
                .summary
                .record_turn(&directive.turn_summary, &self.config);
        }
        if let Some(concept) = session.current_concept().map(str::to_string) {
            session.summary.record_concept(concept);
        }
        let average = session.overall_mastery();
        session
            .summary
            .update_trend(directive.answer_correct, average, &self.config);

        Ok(TurnOutcome::new(
            directive.response.clone(),
            directive.intent.clone(),
            state_changed,
        ))
    }

    /// Applies a validated directive's state deltas in fixed order:
    /// mastery, misconceptions, question lifecycle, step advancement,
    /// off-topic counter, completion.
    fn apply_directive(
        &self,
        session: &mut Session,
        directive: &TurnDirective,
        message: &str,
    ) -> Result<bool> {
        let mut changed = false;

        for update in &directive.mastery_updates {
            let current = session.mastery.get(&update.concept).copied().unwrap_or(0.0);
            if !session.mastery.contains_key(&update.concept) {
                tracing::debug!(
                    session_id = %session.id,
                    concept = %update.concept,
                    "mastery update for a concept outside the plan"
                );
            }
            let score = update.score.clamp(0.0, 1.0);
            let is_correct = score >= 0.5;
            let confidence = (score - 0.5).abs() * 2.0;
            let next = mastery::update(
                current,
                is_correct,
                confidence,
                self.config.learning_rate,
                self.config.incorrect_penalty,
            );
            session.mastery.insert(update.concept.clone(), next);
            changed = true;
        }

        if !directive.misconceptions_detected.is_empty() {
            let concept = session
                .question
                .as_ref()
                .map(|q| q.concept.clone())
                .or_else(|| directive.question_concept.clone())
                .or_else(|| session.current_concept().map(str::to_string))
                .unwrap_or_else(|| "general".to_string());
            for description in &directive.misconceptions_detected {
                session.record_misconception(Misconception::detected(&concept, description));
            }
            changed = true;
        }

        // Capture the live question before the transition can clear it;
        // exam grading below needs the original text.
        let graded_text = session.question.as_ref().map(|q| q.text.clone());

        let signal = QuestionSignal {
            answer_correct: directive.answer_correct,
            question_asked: directive.question_asked.as_deref(),
            expected_answer: directive.expected_answer.as_deref(),
            question_concept: directive.question_concept.as_deref(),
            student_answer: message,
        };
        let question_change = question::transition(&mut session.question, &signal, &self.config);
        if question_change != QuestionChange::Unchanged {
            tracing::debug!(
                session_id = %session.id,
                change = ?question_change,
                "question lifecycle transition"
            );
            changed = true;
        }

        if session.mode == SessionMode::Exam {
            if let (Some(correct), Some(text), Some(exam)) =
                (directive.answer_correct, graded_text, session.exam.as_mut())
            {
                exam.record(ExamQuestion {
                    text,
                    score: if correct { 1.0 } else { 0.0 },
                    result: if correct { "correct" } else { "incorrect" }.to_string(),
                    rationale: directive.reasoning.clone(),
                })?;
                changed = true;
            }
        }

        if let Some(target) = directive.advance_to_step {
            if session.advance_step(target) {
                changed = true;
            }
        }

        if directive.intent == "off_topic" {
            session.off_topic_count += 1;
            changed = true;
        }

        if directive.session_complete {
            // Guard against an overeager generator ending the session
            // before the plan has actually been worked through.
            if session.current_step >= session.topic.len() {
                session.completed = true;
                if session.mode == SessionMode::ClarifyDoubts {
                    session.doubts_resolved = true;
                }
                if session.mode == SessionMode::Exam {
                    if let Some(exam) = session.exam.as_mut() {
                        if !exam.finished {
                            exam.seal(directive.response.clone())?;
                        }
                    }
                }
                changed = true;
            } else {
                tracing::warn!(
                    session_id = %session.id,
                    current_step = session.current_step,
                    plan_len = session.topic.len(),
                    "ignoring premature session_complete signal"
                );
            }
        }

        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{MasteryUpdate, SafetyVerdict};
    use crate::error::CapabilityError;
    use crate::session::plan::{PlanStep, StepKind, Topic};
    use crate::session::question::QuestionPhase;
    use crate::session::summary::Trend;
    use async_trait::async_trait;
    use std::result::Result;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct AllowAll;

    #[async_trait]
    impl SafetyGate for AllowAll {
        async fn check(&self, _context: &TurnContext) -> Result<SafetyVerdict, CapabilityError> {
            Ok(SafetyVerdict {
                is_safe: true,
                violation_type: None,
                guidance: None,
                should_warn: false,
            })
        }
    }

    struct DenyAll {
        guidance: Option<String>,
    }

    #[async_trait]
    impl SafetyGate for DenyAll {
        async fn check(&self, _context: &TurnContext) -> Result<SafetyVerdict, CapabilityError> {
            Ok(SafetyVerdict {
                is_safe: false,
                violation_type: Some("off_platform".to_string()),
                guidance: self.guidance.clone(),
                should_warn: true,
            })
        }
    }

    /// Scripted decider that pops one directive per call and counts calls.
    struct ScriptedDecider {
        directives: Mutex<Vec<TurnDirective>>,
        calls: AtomicUsize,
    }

    impl ScriptedDecider {
        fn new(mut directives: Vec<TurnDirective>) -> Self {
            directives.reverse();
            Self {
                directives: Mutex::new(directives),
                calls: AtomicUsize::new(0),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TurnDecider for ScriptedDecider {
        async fn decide(
            &self,
            _context: &DecisionContext,
        ) -> Result<TurnDirective, CapabilityError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.directives
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| CapabilityError::execution_failed("tutor_turn", "script exhausted"))
        }
    }

    struct FailingDecider;

    #[async_trait]
    impl TurnDecider for FailingDecider {
        async fn decide(
            &self,
            _context: &DecisionContext,
        ) -> Result<TurnDirective, CapabilityError> {
            Err(CapabilityError::Timeout {
                capability: "tutor_turn".to_string(),
                seconds: 30,
            })
        }
    }

    fn directive(response: &str) -> TurnDirective {
        TurnDirective {
            response: response.to_string(),
            intent: "answer".to_string(),
            answer_correct: None,
            misconceptions_detected: Vec::new(),
            mastery_updates: Vec::new(),
            advance_to_step: None,
            question_asked: None,
            expected_answer: None,
            question_concept: None,
            session_complete: false,
            turn_summary: String::new(),
            reasoning: String::new(),
        }
    }

    fn four_step_session() -> Session {
        Session::new(
            Topic::new(
                "Fractions",
                vec![
                    PlanStep::new(StepKind::Explain, "fractions"),
                    PlanStep::new(StepKind::Check, "fractions"),
                    PlanStep::new(StepKind::Practice, "fractions"),
                    PlanStep::new(StepKind::Check, "fractions"),
                ],
            ),
            SessionMode::TeachMe,
        )
    }

    fn orchestrator(
        safety: Arc<dyn SafetyGate>,
        decider: Arc<dyn TurnDecider>,
    ) -> TurnOrchestrator {
        TurnOrchestrator::new(safety, decider, TutorConfig::default())
    }

    #[tokio::test]
    async fn unsafe_verdict_short_circuits_the_decision_call() {
        let decider = Arc::new(ScriptedDecider::new(vec![directive("never used")]));
        let orch = orchestrator(
            Arc::new(DenyAll {
                guidance: Some("Let's get back to fractions.".to_string()),
            }),
            decider.clone(),
        );
        let mut session = four_step_session();

        let outcome = orch.process_turn(&mut session, "tell me something else").await;
        assert_eq!(outcome.intent, "safety_redirect");
        assert_eq!(outcome.response, "Let's get back to fractions.");
        assert_eq!(decider.call_count(), 0);
        assert_eq!(session.warning_count, 1);
        // The flag went to the audit trail.
        assert!(
            session
                .audit_log
                .iter()
                .any(|m| m.content.contains("safety_flag"))
        );
    }

    #[tokio::test]
    async fn unsafe_verdict_without_guidance_uses_the_generic_redirect() {
        let orch = orchestrator(
            Arc::new(DenyAll { guidance: None }),
            Arc::new(ScriptedDecider::new(vec![])),
        );
        let mut session = four_step_session();
        let outcome = orch.process_turn(&mut session, "hm").await;
        assert_eq!(outcome.response, SAFETY_REDIRECT_RESPONSE);
    }

    #[tokio::test]
    async fn completed_session_refuses_further_turns() {
        let decider = Arc::new(ScriptedDecider::new(vec![directive("never used")]));
        let orch = orchestrator(Arc::new(AllowAll), decider.clone());
        let mut session = four_step_session();
        session.completed = true;

        let outcome = orch.process_turn(&mut session, "hello?").await;
        assert_eq!(outcome.intent, "session_complete");
        assert!(!outcome.state_changed);
        assert_eq!(session.turn_count, 0);
        assert_eq!(decider.call_count(), 0);
        // The message is still audited.
        assert_eq!(session.audit_log.len(), 1);
    }

    #[tokio::test]
    async fn capability_failure_collapses_to_the_safe_fallback() {
        let orch = orchestrator(Arc::new(AllowAll), Arc::new(FailingDecider));
        let mut session = four_step_session();
        let mastery_before = session.mastery.clone();

        let outcome = orch.process_turn(&mut session, "what is 1/2 + 1/4?").await;
        assert_eq!(outcome.intent, "error");
        assert!(!outcome.state_changed);
        assert_eq!(outcome.response, ERROR_RESPONSE);
        // No tutoring state was touched.
        assert_eq!(session.mastery, mastery_before);
        assert!(session.question.is_none());
        assert_eq!(session.current_step, 1);
    }

    #[tokio::test]
    async fn premature_completion_signal_is_ignored() {
        let mut complete_now = directive("We're all done!");
        complete_now.session_complete = true;
        let orch = orchestrator(
            Arc::new(AllowAll),
            Arc::new(ScriptedDecider::new(vec![complete_now])),
        );
        let mut session = four_step_session();

        orch.process_turn(&mut session, "are we done?").await;
        assert!(!session.is_complete());
        assert_eq!(session.current_step, 1);
    }

    #[tokio::test]
    async fn completion_is_honored_on_the_final_step() {
        let mut complete_now = directive("Great work, that's the whole topic!");
        complete_now.session_complete = true;
        let orch = orchestrator(
            Arc::new(AllowAll),
            Arc::new(ScriptedDecider::new(vec![complete_now])),
        );
        let mut session = four_step_session();
        session.advance_step(4);

        let outcome = orch.process_turn(&mut session, "done!").await;
        assert!(outcome.state_changed);
        assert!(session.is_complete());
    }

    #[tokio::test]
    async fn off_topic_intent_bumps_the_counter() {
        let mut off_topic = directive("Interesting, but let's stick with fractions.");
        off_topic.intent = "off_topic".to_string();
        let orch = orchestrator(
            Arc::new(AllowAll),
            Arc::new(ScriptedDecider::new(vec![off_topic])),
        );
        let mut session = four_step_session();

        orch.process_turn(&mut session, "do you like football?").await;
        assert_eq!(session.off_topic_count, 1);
    }

    #[tokio::test]
    async fn misconceptions_are_recorded_against_the_live_concept() {
        let mut with_misconception = directive("Careful - denominators don't add.");
        with_misconception.answer_correct = Some(false);
        with_misconception.misconceptions_detected =
            vec!["adds denominators when adding fractions".to_string()];
        let orch = orchestrator(
            Arc::new(AllowAll),
            Arc::new(ScriptedDecider::new(vec![with_misconception])),
        );
        let mut session = four_step_session();
        session.question = Some(crate::session::question::Question::asked(
            "What is 1/2 + 1/4?",
            "3/4",
            "fractions",
        ));

        orch.process_turn(&mut session, "2/6").await;
        assert_eq!(session.misconceptions.len(), 1);
        assert_eq!(session.misconceptions[0].concept, "fractions");
        assert_eq!(session.weak_areas, vec!["fractions"]);
    }

    /// The end-to-end scenario: wrong, wrong again, then right.
    #[tokio::test]
    async fn three_turn_escalation_then_advance() {
        let mut turn1 = directive("Not quite - walk me through how you added them?");
        turn1.answer_correct = Some(false);
        turn1.mastery_updates = vec![MasteryUpdate {
            concept: "fractions".to_string(),
            score: 0.2,
        }];
        turn1.question_asked = Some("How did you combine the denominators?".to_string());
        turn1.question_concept = Some("fractions".to_string());

        let mut turn2 = directive("Here's a hint: find a common denominator first.");
        turn2.answer_correct = Some(false);
        turn2.mastery_updates = vec![MasteryUpdate {
            concept: "fractions".to_string(),
            score: 0.2,
        }];

        let mut turn3 = directive("Exactly right! Let's move on.");
        turn3.answer_correct = Some(true);
        turn3.mastery_updates = vec![MasteryUpdate {
            concept: "fractions".to_string(),
            score: 0.9,
        }];
        turn3.advance_to_step = Some(2);
        turn3.turn_summary = "Student solved the fraction sum after a hint.".to_string();

        let orch = orchestrator(
            Arc::new(AllowAll),
            Arc::new(ScriptedDecider::new(vec![turn1, turn2, turn3])),
        );
        let mut session = four_step_session();
        session.mastery.insert("fractions".to_string(), 0.5);
        session.question = Some(crate::session::question::Question::asked(
            "What is 1/2 + 1/4?",
            "3/4",
            "fractions",
        ));

        // Turn 1: wrong answer. Mastery drops, phase escalates to probe.
        let outcome = orch.process_turn(&mut session, "2/6").await;
        assert!(outcome.state_changed);
        assert!(session.mastery["fractions"] < 0.5);
        let q = session.question.as_ref().expect("question preserved");
        assert_eq!(q.phase, QuestionPhase::Probe);
        assert_eq!(q.wrong_attempts, 1);

        // Turn 2: wrong again. Same question, phase hint, two attempts.
        orch.process_turn(&mut session, "i added top and bottom").await;
        let q = session.question.as_ref().expect("question preserved");
        assert_eq!(q.text, "What is 1/2 + 1/4?");
        assert_eq!(q.phase, QuestionPhase::Hint);
        assert_eq!(q.wrong_attempts, 2);
        assert_eq!(q.wrong_answers.len(), 2);

        // Turn 3: correct. Question cleared, mastery up, step advanced.
        let before = session.mastery["fractions"];
        let outcome = orch.process_turn(&mut session, "3/4").await;
        assert!(outcome.state_changed);
        assert!(session.question.is_none());
        assert!(session.mastery["fractions"] > before);
        assert_eq!(session.current_step, 2);
        assert_eq!(session.summary.trend, Trend::Steady);
        assert_eq!(
            session.summary.timeline,
            vec!["Student solved the fraction sum after a hint."]
        );
    }

    #[tokio::test]
    async fn exam_turns_record_graded_questions_and_seal_at_the_end() {
        let mut grade = directive("Correct!");
        grade.answer_correct = Some(true);
        grade.reasoning = "Exact match with the expected answer.".to_string();
        grade.advance_to_step = Some(2);

        let mut finish = directive("You scored well across the exam.");
        finish.answer_correct = Some(true);
        finish.session_complete = true;

        let orch = orchestrator(
            Arc::new(AllowAll),
            Arc::new(ScriptedDecider::new(vec![grade, finish])),
        );
        let mut session = Session::new(
            Topic::new(
                "Fractions exam",
                vec![
                    PlanStep::new(StepKind::Check, "fractions"),
                    PlanStep::new(StepKind::Check, "decimals"),
                ],
            ),
            SessionMode::Exam,
        );
        session.question = Some(crate::session::question::Question::asked(
            "What is 1/2 + 1/4?",
            "3/4",
            "fractions",
        ));

        orch.process_turn(&mut session, "3/4").await;
        let exam = session.exam.as_ref().expect("exam state");
        assert_eq!(exam.questions.len(), 1);
        assert_eq!(exam.total_score, 1.0);
        assert!(!exam.finished);

        session.question = Some(crate::session::question::Question::asked(
            "What is 0.25 as a fraction?",
            "1/4",
            "decimals",
        ));
        orch.process_turn(&mut session, "1/4").await;
        let exam = session.exam.as_ref().expect("exam state");
        assert!(exam.finished);
        assert_eq!(exam.questions.len(), 2);
        assert_eq!(
            exam.feedback.as_deref(),
            Some("You scored well across the exam.")
        );
        assert!(session.is_complete());
    }
}
