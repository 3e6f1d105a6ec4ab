//! Claude-backed safety gate.

use async_trait::async_trait;

use mentor_core::capability::validation::{SAFETY_SCHEMA, parse_validated};
use mentor_core::capability::{SafetyGate, SafetyVerdict, TurnContext};
use mentor_core::error::CapabilityError;

use crate::client::ClaudeApiClient;
use crate::prompts;

const CAPABILITY: &str = "safety_check";

/// [`SafetyGate`] implementation over the Claude messages API.
pub struct ClaudeSafetyGate {
    client: ClaudeApiClient,
}

impl ClaudeSafetyGate {
    /// Wraps a configured client.
    pub fn new(client: ClaudeApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SafetyGate for ClaudeSafetyGate {
    async fn check(&self, context: &TurnContext) -> Result<SafetyVerdict, CapabilityError> {
        let prompt = prompts::render_safety(context)?;
        let raw = self.client.complete(CAPABILITY, &prompt).await?;
        parse_validated(CAPABILITY, &SAFETY_SCHEMA, &raw)
    }
}
