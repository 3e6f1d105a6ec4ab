//! Session domain model.
//!
//! This module contains the core Session entity: the authoritative
//! per-conversation record that the turn engine mutates. A session
//! exclusively owns its mastery map, misconception list, live question,
//! rolling summary, and conversation history; none of these exist
//! outside their owning session.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use super::exam::ExamState;
use super::message::ConversationMessage;
use super::misconception::Misconception;
use super::plan::Topic;
use super::question::Question;
use super::summary::SessionSummary;
use crate::mastery;

/// The tutoring mode a session runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    /// Work through the topic plan step by step.
    TeachMe,
    /// Answer the student's own questions; ends when doubts are resolved.
    ClarifyDoubts,
    /// Graded exam over the topic.
    Exam,
}

/// One tutoring conversation instance.
///
/// `current_step` is 1-indexed and monotonic non-decreasing; the only
/// mutators are [`Session::advance_step`] and the completion rules, so a
/// backward move is unrepresentable through the public surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Unique session identifier (UUID format)
    pub id: String,
    /// Timestamp when the session was created (ISO 8601 format)
    pub created_at: String,
    /// Timestamp when the session was last updated (ISO 8601 format)
    pub updated_at: String,
    /// Number of turns processed so far
    pub turn_count: u32,
    /// The assigned topic and its curriculum plan
    pub topic: Topic,
    /// Current plan step pointer (1-indexed, never decreases)
    pub current_step: usize,
    /// Tutoring mode
    pub mode: SessionMode,
    /// Whether the session is paused
    pub paused: bool,
    /// Clarify mode only: the student declared their doubts resolved
    pub doubts_resolved: bool,
    /// Set by the guarded completion rule once the plan is exhausted
    pub completed: bool,
    /// Student grade level, if known (e.g. "grade 5")
    #[serde(default)]
    pub grade_level: Option<String>,
    /// Student language level, if known (e.g. "beginner")
    #[serde(default)]
    pub language_level: Option<String>,
    /// Mastery score per concept, each in [0, 1]
    pub mastery: HashMap<String, f64>,
    /// Detected misconceptions (append-only)
    pub misconceptions: Vec<Misconception>,
    /// Concepts with recorded misconceptions (deduplicated)
    pub weak_areas: Vec<String>,
    /// The at-most-one live question
    pub question: Option<Question>,
    /// Rolling bounded summary of the session
    pub summary: SessionSummary,
    /// Recent conversation window used for prompting (bounded)
    pub history: Vec<ConversationMessage>,
    /// Full conversation log for audit/debugging (unbounded)
    pub audit_log: Vec<ConversationMessage>,
    /// Number of off-topic student turns
    pub off_topic_count: u32,
    /// Number of safety warnings issued
    pub warning_count: u32,
    /// Exam sub-state (exam mode only)
    #[serde(default)]
    pub exam: Option<ExamState>,
}

impl Session {
    /// Creates a new session on a topic.
    ///
    /// In teach-me mode the mastery map is seeded with one 0.0 entry per
    /// distinct plan concept; exam mode starts its exam sub-state.
    pub fn new(topic: Topic, mode: SessionMode) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        let mastery = match mode {
            SessionMode::TeachMe => topic
                .concepts()
                .into_iter()
                .map(|concept| (concept, 0.0))
                .collect(),
            _ => HashMap::new(),
        };
        let exam = matches!(mode, SessionMode::Exam).then(ExamState::default);
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: now.clone(),
            updated_at: now,
            turn_count: 0,
            topic,
            current_step: 1,
            mode,
            paused: false,
            doubts_resolved: false,
            completed: false,
            grade_level: None,
            language_level: None,
            mastery,
            misconceptions: Vec::new(),
            weak_areas: Vec::new(),
            question: None,
            summary: SessionSummary::default(),
            history: Vec::new(),
            audit_log: Vec::new(),
            off_topic_count: 0,
            warning_count: 0,
            exam,
        }
    }

    /// Sets the student's grade level.
    pub fn with_grade_level(mut self, grade_level: impl Into<String>) -> Self {
        self.grade_level = Some(grade_level.into());
        self
    }

    /// Sets the student's language level.
    pub fn with_language_level(mut self, language_level: impl Into<String>) -> Self {
        self.language_level = Some(language_level.into());
        self
    }

    /// Whether the session has ended.
    ///
    /// Teach-me and exam sessions end when the step pointer has moved past
    /// the plan (or the guarded completion rule fired); clarify sessions
    /// end when the student's doubts are resolved.
    pub fn is_complete(&self) -> bool {
        if self.completed {
            return true;
        }
        match self.mode {
            SessionMode::TeachMe | SessionMode::Exam => self.current_step > self.topic.len(),
            SessionMode::ClarifyDoubts => self.doubts_resolved,
        }
    }

    /// Unweighted average mastery across all tracked concepts.
    pub fn overall_mastery(&self) -> f64 {
        mastery::aggregate(&self.mastery, None)
    }

    /// Share of the plan completed, in [0, 100].
    pub fn progress_percentage(&self) -> f64 {
        if self.topic.is_empty() || self.is_complete() {
            return 100.0;
        }
        ((self.current_step - 1) as f64 / self.topic.len() as f64) * 100.0
    }

    /// Share of plan concepts at or above `threshold` mastery, in [0, 100].
    pub fn coverage_percentage(&self, threshold: f64) -> f64 {
        let concepts = self.topic.concepts();
        if concepts.is_empty() {
            return 0.0;
        }
        let covered = concepts
            .iter()
            .filter(|concept| mastery::should_advance(&self.mastery, concept, threshold))
            .count();
        (covered as f64 / concepts.len() as f64) * 100.0
    }

    /// The concept of the current plan step, if the pointer is in range.
    pub fn current_concept(&self) -> Option<&str> {
        self.topic
            .step(self.current_step)
            .map(|step| step.concept.as_str())
    }

    /// Appends a message to the bounded window and the full audit log.
    pub fn push_message(&mut self, message: ConversationMessage, window: usize) {
        self.audit_log.push(message.clone());
        self.history.push(message);
        while self.history.len() > window {
            self.history.remove(0);
        }
    }

    /// Appends a message to the audit log only (no prompting window entry).
    pub fn push_audit_only(&mut self, message: ConversationMessage) {
        self.audit_log.push(message);
    }

    /// Moves the step pointer forward to `target`, clamped to the plan
    /// length. Targets at or behind the current step are ignored.
    ///
    /// Returns whether the pointer moved.
    pub fn advance_step(&mut self, target: usize) -> bool {
        let clamped = target.min(self.topic.len());
        if clamped <= self.current_step {
            return false;
        }
        self.current_step = clamped;
        true
    }

    /// Records a misconception and folds its concept into the weak areas.
    pub fn record_misconception(&mut self, misconception: Misconception) {
        if !self.weak_areas.contains(&misconception.concept) {
            self.weak_areas.push(misconception.concept.clone());
        }
        self.misconceptions.push(misconception);
    }

    /// Refreshes the updated-at timestamp.
    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().to_rfc3339();
    }
}
