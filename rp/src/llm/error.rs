//! LLM error types

use std::time::Duration;
use thiserror::Error;

/// Longest backend error body kept in a message
const MAX_BODY_CHARS: usize = 200;

/// Errors from a single backend call
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("rate limited by backend{}", retry_hint(.retry_after))]
    RateLimited { retry_after: Option<Duration> },

    #[error("backend returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("backend timed out after {0:?}")]
    Timeout(Duration),

    #[error("unexpected response: {0}")]
    InvalidResponse(String),

    #[error("malformed response JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("backend misconfigured: {0}")]
    Config(String),
}

fn retry_hint(retry_after: &Option<Duration>) -> String {
    retry_after
        .map(|d| format!(", retry after {}s", d.as_secs()))
        .unwrap_or_default()
}

impl LlmError {
    /// Build a status error from a non-success response body
    ///
    /// Both backends wrap the reason in an `error` field: a string for Hugging
    /// Face (`{"error": "Model ... is currently loading"}`), an object with a
    /// `message` for OpenAI. Other bodies are kept as text, truncated.
    pub fn from_status(status: u16, body: &str) -> Self {
        let reason = serde_json::from_str::<serde_json::Value>(body).ok().and_then(|v| {
            let error = v.get("error")?;
            error
                .as_str()
                .or_else(|| error.get("message").and_then(|m| m.as_str()))
                .map(str::to_string)
        });

        let message = reason.unwrap_or_else(|| body.trim().chars().take(MAX_BODY_CHARS).collect());
        LlmError::Status { status, message }
    }

    /// Whether the same call could succeed if made again
    ///
    /// Rate limits, server errors (Hugging Face answers 503 while a model
    /// loads), request timeouts and network failures are transient. Client
    /// errors and unusable payloads are not.
    pub fn is_transient(&self) -> bool {
        match self {
            LlmError::RateLimited { .. } => true,
            LlmError::Status { status, .. } => *status >= 500 || *status == 408,
            LlmError::Network(_) => true,
            LlmError::Timeout(_) => true,
            LlmError::InvalidResponse(_) => false,
            LlmError::Json(_) => false,
            LlmError::Config(_) => false,
        }
    }

    /// How long the backend asked callers to wait, if it said
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            LlmError::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(LlmError::RateLimited { retry_after: None }.is_transient());
        assert!(LlmError::from_status(503, "").is_transient());
        assert!(LlmError::from_status(408, "").is_transient());
        assert!(LlmError::Timeout(Duration::from_secs(30)).is_transient());

        assert!(!LlmError::from_status(401, "").is_transient());
        assert!(!LlmError::from_status(422, "").is_transient());
        assert!(!LlmError::InvalidResponse("no generations".to_string()).is_transient());
        assert!(!LlmError::Config("missing key".to_string()).is_transient());
    }

    #[test]
    fn test_from_status_huggingface_body() {
        let err = LlmError::from_status(
            503,
            r#"{"error":"Model microsoft/DialoGPT-medium is currently loading","estimated_time":20.0}"#,
        );
        assert_eq!(
            err.to_string(),
            "backend returned HTTP 503: Model microsoft/DialoGPT-medium is currently loading"
        );
    }

    #[test]
    fn test_from_status_openai_body() {
        let err = LlmError::from_status(401, r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#);
        assert!(matches!(err, LlmError::Status { status: 401, ref message } if message == "Incorrect API key provided"));
    }

    #[test]
    fn test_from_status_plain_body_is_truncated() {
        let body = format!("<html>{}</html>", "x".repeat(500));
        match LlmError::from_status(502, &body) {
            LlmError::Status { message, .. } => assert_eq!(message.chars().count(), MAX_BODY_CHARS),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_rate_limit_message() {
        let err = LlmError::RateLimited {
            retry_after: Some(Duration::from_secs(42)),
        };
        assert_eq!(err.to_string(), "rate limited by backend, retry after 42s");
        assert_eq!(LlmError::RateLimited { retry_after: None }.to_string(), "rate limited by backend");
        assert_eq!(err.retry_after(), Some(Duration::from_secs(42)));
        assert_eq!(LlmError::from_status(503, "").retry_after(), None);
    }
}
