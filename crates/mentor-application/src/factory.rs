//! Session factory.

use mentor_core::session::{Session, SessionMode, Topic};

/// Options for creating a session.
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    /// Student grade level, if known.
    pub grade_level: Option<String>,
    /// Student language level, if known.
    pub language_level: Option<String>,
}

/// Creates sessions with their initial state seeded.
pub struct SessionFactory;

impl SessionFactory {
    /// Creates a session on a topic, applying the student options.
    pub fn create(topic: Topic, mode: SessionMode, options: SessionOptions) -> Session {
        let mut session = Session::new(topic, mode);
        session.grade_level = options.grade_level;
        session.language_level = options.language_level;
        session
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mentor_core::session::{PlanStep, StepKind};

    #[test]
    fn options_are_applied() {
        let session = SessionFactory::create(
            Topic::new(
                "Fractions",
                vec![PlanStep::new(StepKind::Explain, "fractions")],
            ),
            SessionMode::TeachMe,
            SessionOptions {
                grade_level: Some("grade 5".to_string()),
                language_level: None,
            },
        );
        assert_eq!(session.grade_level.as_deref(), Some("grade 5"));
        assert_eq!(session.mastery.get("fractions"), Some(&0.0));
    }
}
