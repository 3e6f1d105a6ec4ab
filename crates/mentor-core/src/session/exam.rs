//! Exam-mode sub-state.
//!
//! Created at exam start, mutated one graded question at a time, and
//! sealed once the final question is graded. A sealed exam rejects
//! further writes.

use serde::{Deserialize, Serialize};

use crate::error::{MentorError, Result};

/// One graded exam question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamQuestion {
    /// The question as asked.
    pub text: String,
    /// Score awarded, in [0, 1].
    pub score: f64,
    /// Short result label ("correct", "partial", "incorrect").
    pub result: String,
    /// Grading rationale, kept for the terminal feedback record.
    pub rationale: String,
}

/// The exam's running state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ExamState {
    /// Graded questions, in the order they were asked.
    pub questions: Vec<ExamQuestion>,
    /// Sum of awarded scores.
    pub total_score: f64,
    /// Set once the final question is graded; the state is immutable after.
    pub finished: bool,
    /// Terminal feedback, produced exactly once at sealing time.
    pub feedback: Option<String>,
}

impl ExamState {
    /// Records one graded question.
    ///
    /// # Errors
    ///
    /// Returns an invariant error if the exam is already sealed.
    pub fn record(&mut self, question: ExamQuestion) -> Result<()> {
        if self.finished {
            return Err(MentorError::invariant(
                "cannot record an exam question after the exam is sealed",
            ));
        }
        self.total_score += question.score;
        self.questions.push(question);
        Ok(())
    }

    /// Seals the exam with its terminal feedback.
    ///
    /// # Errors
    ///
    /// Returns an invariant error if the exam is already sealed.
    pub fn seal(&mut self, feedback: impl Into<String>) -> Result<()> {
        if self.finished {
            return Err(MentorError::invariant("exam is already sealed"));
        }
        self.finished = true;
        self.feedback = Some(feedback.into());
        Ok(())
    }

    /// Average score across graded questions, 0.0 when none were graded.
    pub fn average_score(&self) -> f64 {
        if self.questions.is_empty() {
            0.0
        } else {
            self.total_score / self.questions.len() as f64
        }
    }
}
