//! Conversation message types.
//!
//! This module contains types for representing messages in a tutoring
//! conversation, including roles and message content.

use serde::{Deserialize, Serialize};

/// Represents the role of a message in a tutoring conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    /// Message from the student.
    Student,
    /// Message from the automated tutor.
    Tutor,
    /// System-generated message (safety flags, lifecycle notices).
    System,
}

/// A single message in a conversation history.
///
/// Each message has a role (student, tutor, or system), content,
/// and a timestamp indicating when it was created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMessage {
    /// The role of the message sender.
    pub role: MessageRole,
    /// The content of the message.
    pub content: String,
    /// Timestamp when the message was created (ISO 8601 format).
    pub timestamp: String,
}

impl ConversationMessage {
    fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Creates a student message timestamped now.
    pub fn student(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Student, content)
    }

    /// Creates a tutor message timestamped now.
    pub fn tutor(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Tutor, content)
    }

    /// Creates a system message timestamped now.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }
}
