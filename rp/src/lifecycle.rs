//! Request lifecycle
//!
//! Drives one submission through the store: insert a `generating` row, run
//! the pipeline, then record either the model plan or the failure together
//! with the fallback plan. Also replaces the plan of a finished request with
//! a user-edited one.

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::{PlanRequest, RequestUpdate};
use crate::pipeline::{ErrorKind, GenerationOutcome, Orchestrator, SchemaViolation, fallback, normalize};
use crate::store::{RequestStore, StoreError};

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("need text is empty")]
    InputInvalid,

    #[error("persistence failure: {0}")]
    Persistence(#[from] StoreError),
}

impl SubmitError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InputInvalid => ErrorKind::InputInvalid,
            Self::Persistence(_) => ErrorKind::PersistenceFailure,
        }
    }
}

/// A finished submission: the stored row and how its plan was produced
#[derive(Debug, Clone)]
pub struct Submission {
    pub request: PlanRequest,
    pub outcome: GenerationOutcome,
}

/// Submit a need and persist the outcome
pub async fn submit(
    store: &dyn RequestStore,
    orchestrator: &Orchestrator,
    user_id: &str,
    need: &str,
    file_ref: Option<String>,
) -> Result<Submission, SubmitError> {
    debug!(%user_id, need_len = %need.len(), ?file_ref, "submit: called");
    if need.trim().is_empty() {
        return Err(SubmitError::InputInvalid);
    }

    let mut request = PlanRequest::new(user_id, need, file_ref);
    store.insert(&request).await?;
    info!(id = %request.id, "Request created, generating plan");

    let outcome = orchestrator.generate_plan(need).await;

    let recorded = match &outcome.diagnostic {
        None => store.complete(&request.id, &outcome.plan).await,
        Some(diagnostic) => store.fail(&request.id, &diagnostic.to_string(), &outcome.plan).await,
    };
    if let Err(e) = recorded {
        warn!(id = %request.id, error = %e, "Failed to record outcome, marking request failed");
        let error = format!("{}: {}", ErrorKind::PersistenceFailure, e);
        if let Err(mark_err) = store.fail(&request.id, &error, &fallback(need)).await {
            warn!(id = %request.id, error = %mark_err, "Request left generating");
        }
        return Err(e.into());
    }

    request.apply(&match &outcome.diagnostic {
        None => RequestUpdate::complete(&outcome.plan),
        Some(diagnostic) => RequestUpdate::failed(diagnostic.to_string(), &outcome.plan),
    });

    info!(id = %request.id, status = %request.status, "Request finished");
    Ok(Submission { request, outcome })
}

#[derive(Debug, Error)]
pub enum EditError {
    #[error(transparent)]
    Schema(#[from] SchemaViolation),

    #[error("persistence failure: {0}")]
    Persistence(#[from] StoreError),
}

impl EditError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Schema(_) => ErrorKind::SchemaViolation,
            Self::Persistence(_) => ErrorKind::PersistenceFailure,
        }
    }
}

/// Replace the plan of a complete request with an edited one
///
/// The edit goes through the same schema enforcement as a model answer, so
/// defaults are filled and task ids repaired before it is stored.
pub async fn edit_plan(store: &dyn RequestStore, id: &str, edited: &Value) -> Result<PlanRequest, EditError> {
    debug!(%id, "edit_plan: called");
    let plan = normalize(edited)?;
    store.replace_plan(id, &plan).await?;

    let request = store
        .get(id)
        .await?
        .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
    info!(%id, goal = %plan.goal, "Plan edited");
    Ok(request)
}
