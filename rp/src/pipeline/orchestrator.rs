//! Pipeline Orchestrator
//!
//! Sequences retrieval, prompt assembly, the plan call, extraction and schema
//! enforcement. Any failure along the way ends in the fallback plan plus a
//! diagnostic; `generate_plan` itself never fails.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::error::{Diagnostic, PipelineError};
use super::extract::{JsonMode, extract};
use super::fallback::fallback;
use super::invoker::ModelInvoker;
use super::keywords::extract_keywords;
use super::prompt::build_prompt;
use super::retrieval::Retriever;
use super::schema::normalize;
use crate::config::PipelineConfig;
use crate::domain::Plan;
use crate::llm::{LlmClient, Message};
use crate::prompts::PromptLoader;

/// Where a returned plan came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanSource {
    Model,
    Fallback,
}

/// Result of one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationOutcome {
    pub plan: Plan,
    pub source: PlanSource,
    /// Why the fallback was used; `None` for model plans
    pub diagnostic: Option<Diagnostic>,
}

impl GenerationOutcome {
    pub fn is_fallback(&self) -> bool {
        self.source == PlanSource::Fallback
    }
}

/// Runs the plan generation pipeline
pub struct Orchestrator {
    invoker: ModelInvoker,
    prompts: PromptLoader,
    config: PipelineConfig,
}

impl Orchestrator {
    pub fn new(client: Arc<dyn LlmClient>, prompts: PromptLoader, config: PipelineConfig) -> Self {
        debug!(?config, "Orchestrator::new: called");
        let invoker = ModelInvoker::new(client, Duration::from_millis(config.deadline_ms));
        Self {
            invoker,
            prompts,
            config,
        }
    }

    /// Produce a plan for the need text
    pub async fn generate_plan(&self, need: &str) -> GenerationOutcome {
        debug!(need_len = %need.len(), "generate_plan: called");
        match self.try_generate(need).await {
            Ok(plan) => {
                info!(goal = %plan.goal, task_count = %plan.task_count(), "Generated plan from model");
                GenerationOutcome {
                    plan,
                    source: PlanSource::Model,
                    diagnostic: None,
                }
            }
            Err(e) => {
                let diagnostic = Diagnostic::from(&e);
                warn!(kind = %diagnostic.kind, error = %e, "Plan generation failed, using fallback");
                GenerationOutcome {
                    plan: fallback(need),
                    source: PlanSource::Fallback,
                    diagnostic: Some(diagnostic),
                }
            }
        }
    }

    async fn try_generate(&self, need: &str) -> Result<Plan, PipelineError> {
        if need.trim().is_empty() {
            debug!("try_generate: empty need");
            return Err(PipelineError::InputInvalid);
        }

        let retriever = Retriever::new(&self.invoker, &self.prompts);
        let templates = retriever
            .fetch_templates(need, self.config.template_count, self.config.template_max_tokens)
            .await;

        let keywords = extract_keywords(need, &self.config.keywords);
        let trends = retriever
            .fetch_trends(&keywords, self.config.trend_count, self.config.trend_max_tokens)
            .await;
        debug!(template_count = %templates.len(), trend_count = %trends.len(), "try_generate: context ready");

        let blocks = build_prompt(&self.prompts, &templates, &trends, need)?;
        let raw = self.invoke_with_retry(&blocks).await?;

        let candidate = extract(&raw, JsonMode::Object)?;
        Ok(normalize(&candidate)?)
    }

    /// The plan call, retried on transient backend failures
    async fn invoke_with_retry(&self, blocks: &[Message]) -> Result<String, PipelineError> {
        let mut attempt = 0;
        loop {
            match self.invoker.invoke(blocks, self.config.plan_max_tokens).await {
                Ok(text) => return Ok(text),
                Err(e) if e.is_retryable() && attempt < self.config.retries => {
                    attempt += 1;
                    let wait = retry_wait(
                        &e,
                        Duration::from_millis(self.config.retry_backoff_ms),
                        Duration::from_millis(self.config.deadline_ms),
                    );
                    warn!(%attempt, ?wait, error = %e, "Plan call failed, retrying");
                    tokio::time::sleep(wait).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Pause before a retry: the configured backoff, raised to the backend's
/// Retry-After hint, never longer than one call deadline
fn retry_wait(err: &PipelineError, backoff: Duration, cap: Duration) -> Duration {
    err.retry_after().map_or(backoff, |hint| hint.max(backoff)).min(cap)
}
