//! PlanRequest domain type
//!
//! A PlanRequest is the persisted row for one user need. The request store owns
//! it; the pipeline only reads the need text and the lifecycle driver writes the
//! status, phases and result.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::plan::Plan;

/// Request status in the lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    /// Pipeline is running
    #[default]
    Generating,
    /// Model-generated plan stored in `result`
    Complete,
    /// Generation failed; `result` holds the error and the fallback plan
    Failed,
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Generating => write!(f, "generating"),
            Self::Complete => write!(f, "complete"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for RequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "generating" => Ok(Self::Generating),
            "complete" => Ok(Self::Complete),
            "failed" => Ok(Self::Failed),
            other => Err(format!("Unknown request status: {}", other)),
        }
    }
}

/// A user's request for a plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanRequest {
    /// Unique identifier (UUIDv7, time ordered)
    pub id: String,

    /// Opaque identifier supplied by the identity provider
    pub user_id: String,

    /// Raw need text as typed by the user
    pub need: String,

    /// Reference to an uploaded file, if any
    pub file_ref: Option<String>,

    pub status: RequestStatus,

    /// `Plan.phases` on success, `[]` while generating, `null` on failure
    pub phases: Value,

    /// Full Plan on success, `{error, fallback}` on failure, `{}` while generating
    pub result: Value,

    pub created_at: DateTime<Utc>,
}

impl PlanRequest {
    /// Create a new request in the `generating` state
    pub fn new(user_id: impl Into<String>, need: impl Into<String>, file_ref: Option<String>) -> Self {
        Self {
            id: uuid::Uuid::now_v7().to_string(),
            user_id: user_id.into(),
            need: need.into(),
            file_ref,
            status: RequestStatus::Generating,
            phases: Value::Array(vec![]),
            result: Value::Object(Default::default()),
            // Microsecond precision survives a round trip through the store
            created_at: Utc::now().trunc_subsecs(6),
        }
    }

    /// Apply a lifecycle update to this row
    pub fn apply(&mut self, update: &RequestUpdate) {
        self.status = update.status;
        self.phases = update.phases.clone();
        self.result = update.result.clone();
    }

    /// The plan to present for this request
    ///
    /// The generated plan when complete, the stored fallback when failed.
    pub fn plan(&self) -> Option<Plan> {
        match self.status {
            RequestStatus::Complete => serde_json::from_value(self.result.clone()).ok(),
            RequestStatus::Failed => self
                .result
                .get("fallback")
                .and_then(|v| serde_json::from_value(v.clone()).ok()),
            RequestStatus::Generating => None,
        }
    }

    /// The recorded failure reason, if the request failed
    pub fn error(&self) -> Option<&str> {
        match self.status {
            RequestStatus::Failed => self.result.get("error").and_then(Value::as_str),
            _ => None,
        }
    }
}

/// The fields the lifecycle driver writes when a run finishes
#[derive(Debug, Clone, PartialEq)]
pub struct RequestUpdate {
    pub status: RequestStatus,
    pub phases: Value,
    pub result: Value,
}

impl RequestUpdate {
    /// Successful generation: store the plan and its phases
    pub fn complete(plan: &Plan) -> Self {
        let result = serde_json::to_value(plan).unwrap_or(Value::Null);
        let phases = result.get("phases").cloned().unwrap_or(Value::Array(vec![]));
        Self {
            status: RequestStatus::Complete,
            phases,
            result,
        }
    }

    /// Failed generation: store the error next to the fallback plan
    pub fn failed(error: impl Into<String>, fallback: &Plan) -> Self {
        Self {
            status: RequestStatus::Failed,
            phases: Value::Null,
            result: serde_json::json!({
                "error": error.into(),
                "fallback": fallback,
            }),
        }
    }
}
