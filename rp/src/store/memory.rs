//! In-memory request store

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::{RequestStore, StoreError};
use crate::domain::{Plan, PlanRequest, RequestStatus, RequestUpdate};

/// Request store backed by a map; contents live as long as the value
#[derive(Default)]
pub struct MemoryStore {
    rows: RwLock<HashMap<String, PlanRequest>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RequestStore for MemoryStore {
    async fn insert(&self, request: &PlanRequest) -> Result<(), StoreError> {
        debug!(id = %request.id, "MemoryStore::insert: called");
        let mut rows = self.rows.write().await;
        if rows.contains_key(&request.id) {
            return Err(StoreError::Duplicate(request.id.clone()));
        }
        rows.insert(request.id.clone(), request.clone());
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<PlanRequest>, StoreError> {
        debug!(%id, "MemoryStore::get: called");
        Ok(self.rows.read().await.get(id).cloned())
    }

    async fn update(&self, id: &str, update: &RequestUpdate) -> Result<(), StoreError> {
        debug!(%id, status = %update.status, "MemoryStore::update: called");
        let mut rows = self.rows.write().await;
        let row = rows.get_mut(id).ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        row.apply(update);
        Ok(())
    }

    async fn replace_plan(&self, id: &str, plan: &Plan) -> Result<(), StoreError> {
        debug!(%id, goal = %plan.goal, "MemoryStore::replace_plan: called");
        let mut rows = self.rows.write().await;
        let row = rows.get_mut(id).ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        if row.status != RequestStatus::Complete {
            return Err(StoreError::NotEditable {
                id: id.to_string(),
                status: row.status,
            });
        }
        row.apply(&RequestUpdate::complete(plan));
        Ok(())
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<PlanRequest>, StoreError> {
        debug!(%user_id, "MemoryStore::list_for_user: called");
        let mut requests: Vec<PlanRequest> = self
            .rows
            .read()
            .await
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        // Ids are time ordered, so they break created_at ties
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Ok(requests)
    }
}
