//! Session domain module.
//!
//! This module contains all session-related domain models and the turn
//! orchestrator that mutates them.
//!
//! # Module Structure
//!
//! - `model`: Core session domain model (`Session`)
//! - `message`: Conversation message types (`MessageRole`, `ConversationMessage`)
//! - `plan`: Curriculum plan types (`Topic`, `PlanStep`, `StepKind`)
//! - `question`: Outstanding-question lifecycle state machine
//! - `misconception`: Concept-tagged error records
//! - `summary`: Bounded rolling session memory
//! - `exam`: Exam-mode sub-state
//! - `orchestrator`: The per-turn processing pipeline

mod exam;
mod message;
mod misconception;
mod model;
mod orchestrator;
mod plan;
mod question;
mod summary;

// Re-export public API
pub use exam::{ExamQuestion, ExamState};
pub use message::{ConversationMessage, MessageRole};
pub use misconception::Misconception;
pub use model::{Session, SessionMode};
pub use orchestrator::{TurnOrchestrator, TurnOutcome};
pub use plan::{PlanStep, StepKind, Topic};
pub use question::{Question, QuestionChange, QuestionPhase, QuestionSignal, phase_for_attempts, transition};
pub use summary::{SessionSummary, Trend};
