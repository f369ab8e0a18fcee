//! Request store
//!
//! The lifecycle store holding one `PlanRequest` row per user need. The
//! pipeline never touches it directly; `lifecycle::submit` drives it.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{Plan, PlanRequest, RequestStatus, RequestUpdate};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("request not found: {0}")]
    NotFound(String),

    #[error("request already exists: {0}")]
    Duplicate(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("request {id} is {status}; only complete plans can be edited")]
    NotEditable { id: String, status: RequestStatus },

    #[error("corrupt row: {0}")]
    Corrupt(String),

    #[error("store task failed: {0}")]
    Task(String),
}

/// Persistence for plan requests
#[async_trait]
pub trait RequestStore: Send + Sync {
    /// Insert a new row; ids must be unused
    async fn insert(&self, request: &PlanRequest) -> Result<(), StoreError>;

    async fn get(&self, id: &str) -> Result<Option<PlanRequest>, StoreError>;

    /// Overwrite status, phases and result of an existing row
    async fn update(&self, id: &str, update: &RequestUpdate) -> Result<(), StoreError>;

    /// A user's requests, newest first
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<PlanRequest>, StoreError>;

    /// Swap the plan of a complete request for an edited one
    ///
    /// Rewrites `phases` and `result` only. Rows still generating or failed
    /// are `NotEditable`.
    async fn replace_plan(&self, id: &str, plan: &Plan) -> Result<(), StoreError>;

    /// Mark a request complete with its generated plan
    async fn complete(&self, id: &str, plan: &Plan) -> Result<(), StoreError> {
        self.update(id, &RequestUpdate::complete(plan)).await
    }

    /// Mark a request failed, keeping the error and the fallback plan
    async fn fail(&self, id: &str, error: &str, fallback: &Plan) -> Result<(), StoreError> {
        self.update(id, &RequestUpdate::failed(error, fallback)).await
    }
}
