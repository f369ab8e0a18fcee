//! Pipeline error taxonomy and diagnostics

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use super::extract::ExtractError;
use super::schema::SchemaViolation;

/// Failure classes reported to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    InputInvalid,
    BackendUnavailable,
    BackendTimeout,
    NoJsonFound,
    MalformedJson,
    SchemaViolation,
    PromptRender,
    PersistenceFailure,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::InputInvalid => "InputInvalid",
            Self::BackendUnavailable => "BackendUnavailable",
            Self::BackendTimeout => "BackendTimeout",
            Self::NoJsonFound => "NoJsonFound",
            Self::MalformedJson => "MalformedJson",
            Self::SchemaViolation => "SchemaViolation",
            Self::PromptRender => "PromptRender",
            Self::PersistenceFailure => "PersistenceFailure",
        };
        write!(f, "{}", name)
    }
}

/// Errors raised inside the generation chain
///
/// None of these escape the orchestrator; they become a fallback plan plus a
/// [`Diagnostic`].
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("need text is empty")]
    InputInvalid,

    #[error("backend unavailable: {message}")]
    BackendUnavailable {
        message: String,
        transient: bool,
        retry_after: Option<Duration>,
    },

    #[error("backend timed out after {0:?}")]
    BackendTimeout(Duration),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Schema(#[from] SchemaViolation),

    #[error("prompt render failed: {0}")]
    PromptRender(String),
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InputInvalid => ErrorKind::InputInvalid,
            Self::BackendUnavailable { .. } => ErrorKind::BackendUnavailable,
            Self::BackendTimeout(_) => ErrorKind::BackendTimeout,
            Self::Extract(ExtractError::NoJsonFound { .. }) => ErrorKind::NoJsonFound,
            Self::Extract(ExtractError::MalformedJson(_)) => ErrorKind::MalformedJson,
            Self::Schema(_) => ErrorKind::SchemaViolation,
            Self::PromptRender(_) => ErrorKind::PromptRender,
        }
    }

    /// Transient backend failures are worth another attempt
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::BackendUnavailable { transient, .. } => *transient,
            Self::BackendTimeout(_) => true,
            _ => false,
        }
    }

    /// Minimum wait the backend asked for before another attempt
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::BackendUnavailable { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

/// What went wrong in a run that ended in the fallback plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&PipelineError> for Diagnostic {
    fn from(err: &PipelineError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}
