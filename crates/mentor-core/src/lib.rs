pub mod capability;
pub mod config;
pub mod error;
pub mod mastery;
pub mod session;

// Re-export common error type
pub use error::{CapabilityError, MentorError};

pub use config::TutorConfig;
