//! Claude-backed turn decider.

use async_trait::async_trait;

use mentor_core::capability::validation::{TURN_SCHEMA, parse_validated};
use mentor_core::capability::{DecisionContext, TurnDecider, TurnDirective};
use mentor_core::error::CapabilityError;

use crate::client::ClaudeApiClient;
use crate::prompts;

const CAPABILITY: &str = "tutor_turn";

/// [`TurnDecider`] implementation over the Claude messages API.
///
/// Retries once, inside the capability, when the model's output fails
/// schema validation; execution failures and timeouts propagate to the
/// orchestrator, which never retries inline.
pub struct ClaudeTurnDecider {
    client: ClaudeApiClient,
}

impl ClaudeTurnDecider {
    /// Wraps a configured client.
    pub fn new(client: ClaudeApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TurnDecider for ClaudeTurnDecider {
    async fn decide(&self, context: &DecisionContext) -> Result<TurnDirective, CapabilityError> {
        let prompt = prompts::render_turn(context)?;
        let raw = self.client.complete(CAPABILITY, &prompt).await?;
        match parse_validated(CAPABILITY, &TURN_SCHEMA, &raw) {
            Ok(directive) => Ok(directive),
            Err(first @ CapabilityError::InvalidOutput { .. }) => {
                tracing::warn!(error = %first, "turn directive failed validation; retrying once");
                let raw = self.client.complete(CAPABILITY, &prompt).await?;
                parse_validated(CAPABILITY, &TURN_SCHEMA, &raw)
            }
            Err(other) => Err(other),
        }
    }
}
