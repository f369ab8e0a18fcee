//! Shared helpers for integration tests

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use romplan::llm::{CompletionRequest, CompletionResponse, LlmClient, LlmError};

/// Client that answers from a fixed script and records every request
pub struct ScriptedClient {
    replies: Mutex<VecDeque<Result<String, u16>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedClient {
    /// `Ok(text)` answers with text, `Err(status)` fails with that HTTP status
    pub fn new(replies: Vec<Result<&str, u16>>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().map(|r| r.map(str::to_string)).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for ScriptedClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.requests.lock().unwrap().push(request);
        match self.replies.lock().unwrap().pop_front() {
            Some(Ok(text)) => Ok(CompletionResponse::text(text)),
            Some(Err(status)) => Err(LlmError::from_status(status, "scripted failure")),
            None => Err(LlmError::InvalidResponse("script exhausted".to_string())),
        }
    }
}
