//! Misconception records.

use serde::{Deserialize, Serialize};

/// A recorded, concept-tagged error pattern.
///
/// Misconceptions are append-only; resolving one flips `resolved` rather
/// than removing the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Misconception {
    /// The concept the misconception concerns.
    pub concept: String,
    /// Free-text description of the error pattern.
    pub description: String,
    /// Timestamp when the misconception was detected (ISO 8601 format).
    pub detected_at: String,
    /// Whether later turns showed the misconception resolved.
    pub resolved: bool,
}

impl Misconception {
    /// Creates an unresolved misconception detected now.
    pub fn detected(concept: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            concept: concept.into(),
            description: description.into(),
            detected_at: chrono::Utc::now().to_rfc3339(),
            resolved: false,
        }
    }
}
