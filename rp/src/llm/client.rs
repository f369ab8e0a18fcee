//! LlmClient trait definition

use async_trait::async_trait;

use super::{CompletionRequest, CompletionResponse, LlmError};

/// Stateless LLM client - each call is independent
///
/// Implementations perform exactly one backend call per `complete` and never
/// retry on their own; retry decisions belong to the caller.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send a single completion request (suspends until the response arrives)
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;
}
