//! Concrete capability clients for the Mentor turn engine.
//!
//! Implements the `SafetyGate` and `TurnDecider` contracts from
//! `mentor-core` over the Claude REST API, with prompt rendering and
//! schema-gated response parsing.

pub mod client;
pub mod prompts;
pub mod safety;
pub mod tutor;

pub use client::ClaudeApiClient;
pub use safety::ClaudeSafetyGate;
pub use tutor::ClaudeTurnDecider;
