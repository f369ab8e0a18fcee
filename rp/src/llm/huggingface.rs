//! Hugging Face Inference API client implementation
//!
//! Text-generation models take a single input string, so the prompt blocks
//! are sent as a role-tagged transcript.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::{CompletionRequest, CompletionResponse, LlmClient, LlmError, StopReason, TokenUsage, retry_after, send_error};
use crate::config::LlmConfig;

/// Hugging Face text-generation client
pub struct HuggingFaceClient {
    model: String,
    api_key: String,
    base_url: String,
    http: Client,
    timeout: Duration,
}

impl HuggingFaceClient {
    /// Create a new client from configuration
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        debug!(?config, "from_config: called");
        let api_key = config.get_api_key().map_err(|e| LlmError::Config(e.to_string()))?;

        let timeout = Duration::from_millis(config.timeout_ms);

        let http = Client::builder().timeout(timeout).build().map_err(LlmError::Network)?;

        Ok(Self {
            model: config.model.clone(),
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
            timeout,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}", self.base_url, self.model)
    }

    /// Build the request body for the text-generation task
    fn build_request_body(&self, request: &CompletionRequest) -> serde_json::Value {
        debug!(%self.model, %request.max_tokens, "build_request_body: called");
        serde_json::json!({
            "inputs": request.transcript(),
            "parameters": {
                "max_new_tokens": request.max_tokens,
                "return_full_text": false,
            },
        })
    }

    /// Parse the text-generation response
    ///
    /// The API answers with a list of generations; some deployments return a
    /// single object instead.
    fn parse_response(&self, body: &str) -> Result<CompletionResponse, LlmError> {
        debug!(body_len = %body.len(), "parse_response: called");
        let parsed: GenerationPayload = serde_json::from_str(body)?;
        let generated = match parsed {
            GenerationPayload::Many(items) => items.into_iter().next().map(|g| g.generated_text),
            GenerationPayload::One(item) => Some(item.generated_text),
        };

        match generated {
            Some(text) => Ok(CompletionResponse {
                content: Some(text),
                stop_reason: StopReason::EndTurn,
                usage: TokenUsage::default(),
            }),
            None => {
                debug!("parse_response: empty generation list");
                Err(LlmError::InvalidResponse("No generations returned".to_string()))
            }
        }
    }
}

#[async_trait]
impl LlmClient for HuggingFaceClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        debug!(%self.model, %request.max_tokens, "complete: called");
        let body = self.build_request_body(&request);

        let response = self
            .http
            .post(self.endpoint())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| send_error(e, self.timeout))?;

        let status = response.status().as_u16();

        if status == 429 {
            debug!("complete: rate limited (429)");
            return Err(LlmError::RateLimited {
                retry_after: retry_after(response.headers()),
            });
        }

        if !response.status().is_success() {
            debug!(%status, "complete: API error");
            let text = response.text().await.unwrap_or_default();
            return Err(LlmError::from_status(status, &text));
        }

        let text = response.text().await.map_err(|e| send_error(e, self.timeout))?;
        debug!("complete: success");
        self.parse_response(&text)
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GenerationPayload {
    Many(Vec<Generation>),
    One(Generation),
}

#[derive(Debug, Deserialize)]
struct Generation {
    generated_text: String,
}
