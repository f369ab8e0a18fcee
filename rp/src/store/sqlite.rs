//! SQLite request store
//!
//! One `requests` table. JSON columns are stored as text and timestamps as
//! RFC 3339 strings with microsecond precision, which sort lexically.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, info};

use super::{RequestStore, StoreError};
use crate::domain::{Plan, PlanRequest, RequestStatus, RequestUpdate};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS requests (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    need TEXT NOT NULL,
    file_ref TEXT,
    status TEXT NOT NULL,
    phases TEXT NOT NULL,
    result TEXT NOT NULL,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_requests_user ON requests(user_id, created_at DESC);
";

const COLUMNS: &str = "id, user_id, need, file_ref, status, phases, result, created_at";

/// Request store backed by a SQLite database file
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) the database at `path`
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        debug!(?path, "SqliteStore::open: called");
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let store = Self::init(Connection::open(path)?)?;
        info!("Opened request store at {}", path.display());
        Ok(store)
    }

    /// A private in-memory database
    pub fn in_memory() -> Result<Self, StoreError> {
        debug!("SqliteStore::in_memory: called");
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` with the connection on the blocking pool
    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|e| StoreError::Task(format!("connection lock poisoned: {}", e)))?;
            f(&guard)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

/// A row as stored, before JSON and timestamp decoding
struct RawRow {
    id: String,
    user_id: String,
    need: String,
    file_ref: Option<String>,
    status: String,
    phases: String,
    result: String,
    created_at: String,
}

impl RawRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            need: row.get(2)?,
            file_ref: row.get(3)?,
            status: row.get(4)?,
            phases: row.get(5)?,
            result: row.get(6)?,
            created_at: row.get(7)?,
        })
    }

    fn decode(self) -> Result<PlanRequest, StoreError> {
        let status: RequestStatus = self.status.parse().map_err(StoreError::Corrupt)?;
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .map_err(|e| StoreError::Corrupt(format!("created_at of {}: {}", self.id, e)))?
            .with_timezone(&Utc);

        Ok(PlanRequest {
            id: self.id,
            user_id: self.user_id,
            need: self.need,
            file_ref: self.file_ref,
            status,
            phases: serde_json::from_str(&self.phases)?,
            result: serde_json::from_str(&self.result)?,
            created_at,
        })
    }
}

fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[async_trait]
impl RequestStore for SqliteStore {
    async fn insert(&self, request: &PlanRequest) -> Result<(), StoreError> {
        debug!(id = %request.id, "SqliteStore::insert: called");
        let request = request.clone();
        self.with_conn(move |conn| {
            let exists = conn
                .query_row("SELECT 1 FROM requests WHERE id = ?1", params![request.id], |_| Ok(()))
                .optional()?
                .is_some();
            if exists {
                return Err(StoreError::Duplicate(request.id));
            }

            conn.execute(
                &format!("INSERT INTO requests ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)", COLUMNS),
                params![
                    request.id,
                    request.user_id,
                    request.need,
                    request.file_ref,
                    request.status.to_string(),
                    serde_json::to_string(&request.phases)?,
                    serde_json::to_string(&request.result)?,
                    timestamp(&request.created_at),
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn get(&self, id: &str) -> Result<Option<PlanRequest>, StoreError> {
        debug!(%id, "SqliteStore::get: called");
        let id = id.to_string();
        self.with_conn(move |conn| {
            conn.query_row(
                &format!("SELECT {} FROM requests WHERE id = ?1", COLUMNS),
                params![id],
                RawRow::from_row,
            )
            .optional()?
            .map(RawRow::decode)
            .transpose()
        })
        .await
    }

    async fn update(&self, id: &str, update: &RequestUpdate) -> Result<(), StoreError> {
        debug!(%id, status = %update.status, "SqliteStore::update: called");
        let id = id.to_string();
        let status = update.status.to_string();
        let phases = serde_json::to_string(&update.phases)?;
        let result = serde_json::to_string(&update.result)?;
        self.with_conn(move |conn| {
            let changed = conn.execute(
                "UPDATE requests SET status = ?1, phases = ?2, result = ?3 WHERE id = ?4",
                params![status, phases, result, id],
            )?;
            if changed == 0 {
                return Err(StoreError::NotFound(id));
            }
            Ok(())
        })
        .await
    }

    async fn replace_plan(&self, id: &str, plan: &Plan) -> Result<(), StoreError> {
        debug!(%id, goal = %plan.goal, "SqliteStore::replace_plan: called");
        let id = id.to_string();
        let update = RequestUpdate::complete(plan);
        let phases = serde_json::to_string(&update.phases)?;
        let result = serde_json::to_string(&update.result)?;
        self.with_conn(move |conn| {
            let status: String = conn
                .query_row("SELECT status FROM requests WHERE id = ?1", params![id], |row| row.get(0))
                .optional()?
                .ok_or_else(|| StoreError::NotFound(id.clone()))?;
            let status: RequestStatus = status.parse().map_err(StoreError::Corrupt)?;
            if status != RequestStatus::Complete {
                return Err(StoreError::NotEditable { id, status });
            }

            conn.execute(
                "UPDATE requests SET phases = ?1, result = ?2 WHERE id = ?3",
                params![phases, result, id],
            )?;
            Ok(())
        })
        .await
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<PlanRequest>, StoreError> {
        debug!(%user_id, "SqliteStore::list_for_user: called");
        let user_id = user_id.to_string();
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM requests WHERE user_id = ?1 ORDER BY created_at DESC, id DESC",
                COLUMNS
            ))?;
            let rows = stmt
                .query_map(params![user_id], RawRow::from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            rows.into_iter().map(RawRow::decode).collect()
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Phase, Task};
    use tempfile::TempDir;

    fn plan() -> Plan {
        Plan {
            goal: "Ship".to_string(),
            phases: vec![],
        }
    }

    #[tokio::test]
    async fn test_round_trip() {
        let store = SqliteStore::in_memory().unwrap();
        let request = PlanRequest::new("alice", "Grow \"enterprise\" sales", Some("leads.csv".to_string()));
        store.insert(&request).await.unwrap();

        let loaded = store.get(&request.id).await.unwrap().unwrap();
        assert_eq!(loaded, request);
        assert!(store.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_fail_stores_fallback() {
        let store = SqliteStore::in_memory().unwrap();
        let request = PlanRequest::new("alice", "Grow", None);
        store.insert(&request).await.unwrap();
        store.fail(&request.id, "NoJsonFound: nothing", &plan()).await.unwrap();

        let loaded = store.get(&request.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, RequestStatus::Failed);
        assert!(loaded.phases.is_null());
        assert_eq!(loaded.error(), Some("NoJsonFound: nothing"));
        assert_eq!(loaded.plan(), Some(plan()));
    }

    #[tokio::test]
    async fn test_update_missing_and_duplicate() {
        let store = SqliteStore::in_memory().unwrap();
        assert!(matches!(
            store.complete("missing", &plan()).await,
            Err(StoreError::NotFound(_))
        ));

        let request = PlanRequest::new("alice", "Grow", None);
        store.insert(&request).await.unwrap();
        assert!(matches!(store.insert(&request).await, Err(StoreError::Duplicate(_))));
    }

    fn edited_plan() -> Plan {
        Plan {
            goal: "Ship faster".to_string(),
            phases: vec![Phase {
                title: "Launch".to_string(),
                tasks: vec![Task {
                    task_id: "T1.1".to_string(),
                    title: "Announce".to_string(),
                    owner: "Marketing".to_string(),
                    start_date: "2025-03-01".to_string(),
                    end_date: "2025-03-02".to_string(),
                    success_metric: "500 signups".to_string(),
                    instruction: "Post on launch day".to_string(),
                    example: "E.g., a blog post".to_string(),
                }],
            }],
        }
    }

    #[tokio::test]
    async fn test_replace_plan_rewrites_complete_row() {
        let store = SqliteStore::in_memory().unwrap();
        let request = PlanRequest::new("alice", "Ship", None);
        store.insert(&request).await.unwrap();
        store.complete(&request.id, &plan()).await.unwrap();

        store.replace_plan(&request.id, &edited_plan()).await.unwrap();

        let loaded = store.get(&request.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, RequestStatus::Complete);
        assert_eq!(loaded.plan(), Some(edited_plan()));
        assert_eq!(loaded.phases[0]["title"], "Launch");
        assert_eq!(loaded.need, "Ship");
        assert_eq!(loaded.created_at, request.created_at);
    }

    #[tokio::test]
    async fn test_replace_plan_rejects_missing_and_unfinished_rows() {
        let store = SqliteStore::in_memory().unwrap();
        assert!(matches!(
            store.replace_plan("missing", &edited_plan()).await,
            Err(StoreError::NotFound(_))
        ));

        let request = PlanRequest::new("alice", "Ship", None);
        store.insert(&request).await.unwrap();
        assert!(matches!(
            store.replace_plan(&request.id, &edited_plan()).await,
            Err(StoreError::NotEditable {
                status: RequestStatus::Generating,
                ..
            })
        ));

        store.fail(&request.id, "BackendTimeout: slow", &plan()).await.unwrap();
        assert!(matches!(
            store.replace_plan(&request.id, &edited_plan()).await,
            Err(StoreError::NotEditable {
                status: RequestStatus::Failed,
                ..
            })
        ));
        let loaded = store.get(&request.id).await.unwrap().unwrap();
        assert_eq!(loaded.plan(), Some(plan()));
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("requests.db");

        let older = PlanRequest::new("alice", "older", None);
        let newer = PlanRequest::new("alice", "newer", None);
        {
            let store = SqliteStore::open(&path).unwrap();
            store.insert(&older).await.unwrap();
            store.insert(&newer).await.unwrap();
            store.insert(&PlanRequest::new("bob", "other", None)).await.unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        let listed = store.list_for_user("alice").await.unwrap();
        let needs: Vec<&str> = listed.iter().map(|r| r.need.as_str()).collect();
        assert_eq!(needs, vec!["newer", "older"]);
    }
}
