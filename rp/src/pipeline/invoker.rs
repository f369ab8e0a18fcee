//! Model Invoker
//!
//! One backend call per `invoke`, bounded by a deadline. Retry decisions are
//! left to the orchestrator.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use super::error::PipelineError;
use crate::llm::{CompletionRequest, LlmClient, LlmError, Message};

pub struct ModelInvoker {
    client: Arc<dyn LlmClient>,
    deadline: Duration,
}

impl ModelInvoker {
    pub fn new(client: Arc<dyn LlmClient>, deadline: Duration) -> Self {
        Self { client, deadline }
    }

    /// Send the prompt blocks and return the generated text
    pub async fn invoke(&self, blocks: &[Message], max_tokens: u32) -> Result<String, PipelineError> {
        debug!(block_count = %blocks.len(), %max_tokens, deadline = ?self.deadline, "invoke: called");
        let request = CompletionRequest::new(blocks.to_vec(), max_tokens);

        let response = match tokio::time::timeout(self.deadline, self.client.complete(request)).await {
            Err(_) => {
                warn!(deadline = ?self.deadline, "invoke: deadline elapsed");
                return Err(PipelineError::BackendTimeout(self.deadline));
            }
            Ok(Err(LlmError::Timeout(after))) => {
                warn!(?after, "invoke: backend timed out");
                return Err(PipelineError::BackendTimeout(after));
            }
            Ok(Err(e)) => {
                warn!(error = %e, "invoke: backend call failed");
                return Err(PipelineError::BackendUnavailable {
                    message: e.to_string(),
                    transient: e.is_transient(),
                    retry_after: e.retry_after(),
                });
            }
            Ok(Ok(response)) => response,
        };

        match response.content {
            Some(text) if !text.trim().is_empty() => {
                debug!(text_len = %text.len(), stop_reason = ?response.stop_reason, "invoke: got text");
                Ok(text)
            }
            _ => {
                warn!("invoke: backend returned no text");
                // Sampling may produce text on a second try
                Err(PipelineError::BackendUnavailable {
                    message: "empty model output".to_string(),
                    transient: true,
                    retry_after: None,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::client::mock::{MockLlmClient, MockReply};
    use crate::pipeline::error::ErrorKind;

    fn invoker(client: MockLlmClient, deadline_ms: u64) -> (Arc<MockLlmClient>, ModelInvoker) {
        let client = Arc::new(client);
        let invoker = ModelInvoker::new(client.clone(), Duration::from_millis(deadline_ms));
        (client, invoker)
    }

    #[tokio::test]
    async fn test_invoke_returns_text() {
        let (client, invoker) = invoker(MockLlmClient::new(vec![MockReply::text("hello")]), 1_000);
        let text = invoker.invoke(&[Message::user("hi")], 50).await.unwrap();
        assert_eq!(text, "hello");

        let requests = client.requests();
        assert_eq!(requests[0].max_tokens, 50);
        assert_eq!(requests[0].messages, vec![Message::user("hi")]);
    }

    #[tokio::test]
    async fn test_invoke_maps_status_to_unavailable() {
        let (_, invoker) = invoker(MockLlmClient::new(vec![MockReply::Status(503)]), 1_000);
        let err = invoker.invoke(&[], 10).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BackendUnavailable);
    }

    #[tokio::test]
    async fn test_invoke_keeps_transient_flag() {
        let (_, invoker) = invoker(MockLlmClient::new(vec![MockReply::Status(503), MockReply::Status(401)]), 1_000);
        assert!(invoker.invoke(&[], 10).await.unwrap_err().is_retryable());
        assert!(!invoker.invoke(&[], 10).await.unwrap_err().is_retryable());
    }

    #[tokio::test]
    async fn test_invoke_carries_rate_limit_hint() {
        let hint = Some(Duration::from_secs(3));
        let (_, invoker) = invoker(MockLlmClient::new(vec![MockReply::RateLimited(hint)]), 1_000);
        let err = invoker.invoke(&[], 10).await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(err.retry_after(), hint);
    }

    #[tokio::test]
    async fn test_invoke_empty_output_is_unavailable() {
        let (_, invoker) = invoker(MockLlmClient::new(vec![MockReply::text("   ")]), 1_000);
        let err = invoker.invoke(&[], 10).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BackendUnavailable);
    }

    #[tokio::test]
    async fn test_invoke_deadline() {
        let slow = MockReply::Delayed(Duration::from_secs(5), "too late".to_string());
        let (_, invoker) = invoker(MockLlmClient::new(vec![slow]), 20);
        let err = invoker.invoke(&[], 10).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BackendTimeout);
    }
}
