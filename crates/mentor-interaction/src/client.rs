//! ClaudeApiClient - direct REST API client for Claude.
//!
//! This client calls the Claude REST API directly without CLI dependency.
//! Configuration comes from environment variables; the handle is
//! constructed explicitly and injected into the capability gates - there
//! is no process-global client.

use std::env;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use mentor_core::error::CapabilityError;

const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
const BASE_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Client that talks to the Claude HTTP API.
#[derive(Clone)]
pub struct ClaudeApiClient {
    client: Client,
    api_key: String,
    model: String,
    system: Option<String>,
    max_tokens: u32,
    timeout: Duration,
}

impl ClaudeApiClient {
    /// Creates a new client with the provided API key and model.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            system: None,
            max_tokens: 4096,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Loads configuration from environment variables.
    ///
    /// `ANTHROPIC_API_KEY` is required; `MENTOR_MODEL_NAME` defaults to
    /// `claude-sonnet-4-20250514` if not specified.
    pub fn try_from_env() -> Result<Self, CapabilityError> {
        let api_key = env::var("ANTHROPIC_API_KEY").map_err(|_| {
            CapabilityError::execution_failed(
                "claude_api",
                "ANTHROPIC_API_KEY not found in environment variables",
            )
        })?;
        let model = env::var("MENTOR_MODEL_NAME").unwrap_or_else(|_| DEFAULT_MODEL.into());
        Ok(Self::new(api_key, model))
    }

    /// Overrides the model after construction.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Adds a system prompt that will be sent alongside every request.
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Sets the maximum number of tokens to generate.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Sets the per-call deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sends one prompt and returns the raw text of the model's reply.
    ///
    /// `capability` names the calling capability for error diagnostics.
    pub async fn complete(
        &self,
        capability: &str,
        prompt: &str,
    ) -> Result<String, CapabilityError> {
        let request = CreateMessageRequest {
            model: self.model.clone(),
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            max_tokens: self.max_tokens,
            system: self.system.clone(),
        };

        let response = self
            .client
            .post(BASE_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    CapabilityError::Timeout {
                        capability: capability.to_string(),
                        seconds: self.timeout.as_secs(),
                    }
                } else {
                    CapabilityError::execution_failed(
                        capability,
                        format!("Claude API request failed: {err}"),
                    )
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read Claude error body".to_string());
            return Err(map_http_error(capability, status, body));
        }

        let parsed: CreateMessageResponse = response.json().await.map_err(|err| {
            CapabilityError::execution_failed(
                capability,
                format!("Failed to parse Claude response: {err}"),
            )
        })?;

        extract_text_response(capability, parsed)
    }
}

#[derive(Serialize)]
struct CreateMessageRequest {
    model: String,
    messages: Vec<Message>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
}

#[derive(Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct CreateMessageResponse {
    content: Vec<ContentBlockResponse>,
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum ContentBlockResponse {
    #[serde(rename = "text")]
    Text { text: String },
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[allow(dead_code)]
    r#type: String,
    message: String,
}

fn extract_text_response(
    capability: &str,
    response: CreateMessageResponse,
) -> Result<String, CapabilityError> {
    response
        .content
        .into_iter()
        .find_map(|block| match block {
            ContentBlockResponse::Text { text } => Some(text),
        })
        .ok_or_else(|| {
            CapabilityError::execution_failed(
                capability,
                "Claude API returned no text in the response content",
            )
        })
}

fn map_http_error(capability: &str, status: StatusCode, body: String) -> CapabilityError {
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .map(|wrapper| wrapper.error.message)
        .unwrap_or(body);
    CapabilityError::execution_failed(capability, format!("Claude API error ({status}): {message}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_unwraps_the_api_error_body() {
        let body = r#"{"error": {"type": "overloaded_error", "message": "Overloaded"}}"#;
        let err = map_http_error("tutor_turn", StatusCode::SERVICE_UNAVAILABLE, body.into());
        match err {
            CapabilityError::ExecutionFailed {
                capability,
                message,
            } => {
                assert_eq!(capability, "tutor_turn");
                assert!(message.contains("Overloaded"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn missing_text_block_is_an_execution_failure() {
        let response = CreateMessageResponse { content: vec![] };
        assert!(extract_text_response("safety_check", response).is_err());
    }
}
