//! LLM client module for romplan
//!
//! Provides the `LlmClient` abstraction and the text-generation backends the
//! pipeline can talk to.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

pub mod client;
mod error;
mod huggingface;
mod openai;
mod types;

pub use client::LlmClient;
pub use error::LlmError;
pub use huggingface::HuggingFaceClient;
pub use openai::OpenAIClient;
pub use types::{CompletionRequest, CompletionResponse, Message, Role, StopReason, TokenUsage};

use crate::config::LlmConfig;

/// Create an LLM client based on the provider specified in config
///
/// Supports "huggingface" and "openai" providers.
pub fn create_client(config: &LlmConfig) -> Result<Arc<dyn LlmClient>, LlmError> {
    debug!(provider = %config.provider, model = %config.model, "create_client: called");
    match config.provider.as_str() {
        "huggingface" => {
            debug!("create_client: creating Hugging Face client");
            Ok(Arc::new(HuggingFaceClient::from_config(config)?))
        }
        "openai" => {
            debug!("create_client: creating OpenAI client");
            Ok(Arc::new(OpenAIClient::from_config(config)?))
        }
        other => {
            debug!(provider = %other, "create_client: unknown provider");
            Err(LlmError::Config(format!(
                "Unknown LLM provider: '{}'. Supported: huggingface, openai",
                other
            )))
        }
    }
}

/// Classify a reqwest failure, keeping timeouts distinct from other network errors
pub(crate) fn send_error(e: reqwest::Error, timeout: Duration) -> LlmError {
    if e.is_timeout() {
        debug!(?timeout, "send_error: request timed out");
        LlmError::Timeout(timeout)
    } else {
        LlmError::Network(e)
    }
}

/// Seconds from a `Retry-After` header, when present and numeric
pub(crate) fn retry_after(headers: &reqwest::header::HeaderMap) -> Option<Duration> {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}
