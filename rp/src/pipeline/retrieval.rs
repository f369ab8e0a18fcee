//! Template and trend retrieval
//!
//! Both retrievers ask the model for a JSON array and keep the elements that
//! fit. They are best-effort context: any failure yields an empty list.

use serde_json::Value;
use tracing::{debug, warn};

use super::error::PipelineError;
use super::extract::{JsonMode, extract};
use super::invoker::ModelInvoker;
use super::schema::normalize;
use crate::domain::{Plan, TrendSnippet};
use crate::llm::Message;
use crate::prompts::{PromptLoader, TemplatesPromptContext, TrendsPromptContext};

pub struct Retriever<'a> {
    invoker: &'a ModelInvoker,
    prompts: &'a PromptLoader,
}

impl<'a> Retriever<'a> {
    pub fn new(invoker: &'a ModelInvoker, prompts: &'a PromptLoader) -> Self {
        Self { invoker, prompts }
    }

    /// Up to `k` example plans for the query domain
    pub async fn fetch_templates(&self, query: &str, k: usize, max_tokens: u32) -> Vec<Plan> {
        debug!(%k, "fetch_templates: called");
        let items = match self
            .fetch_array("templates", &TemplatesPromptContext { query, count: k }, max_tokens)
            .await
        {
            Ok(items) => items,
            Err(e) => {
                warn!(error = %e, "fetch_templates: retrieval failed, continuing without templates");
                return vec![];
            }
        };

        let templates: Vec<Plan> = items
            .iter()
            .filter_map(|item| match normalize(item) {
                Ok(plan) => Some(plan),
                Err(e) => {
                    debug!(error = %e, "fetch_templates: skipping element");
                    None
                }
            })
            .take(k)
            .collect();
        debug!(template_count = %templates.len(), "fetch_templates: done");
        templates
    }

    /// Up to `top_n` trend snippets for the keywords
    pub async fn fetch_trends(&self, keywords: &[String], top_n: usize, max_tokens: u32) -> Vec<TrendSnippet> {
        debug!(?keywords, %top_n, "fetch_trends: called");
        let context = TrendsPromptContext {
            keywords: keywords.join(", "),
            count: top_n,
        };
        let items = match self.fetch_array("trends", &context, max_tokens).await {
            Ok(items) => items,
            Err(e) => {
                warn!(error = %e, "fetch_trends: retrieval failed, continuing without trends");
                return vec![];
            }
        };

        let trends: Vec<TrendSnippet> = items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .take(top_n)
            .collect();
        debug!(trend_count = %trends.len(), "fetch_trends: done");
        trends
    }

    async fn fetch_array<T: serde::Serialize>(
        &self,
        prompt: &str,
        context: &T,
        max_tokens: u32,
    ) -> Result<Vec<Value>, PipelineError> {
        let instruction = self
            .prompts
            .render(prompt, context)
            .map_err(|e| PipelineError::PromptRender(e.to_string()))?;
        let raw = self.invoker.invoke(&[Message::user(instruction)], max_tokens).await?;

        match extract(&raw, JsonMode::Array)? {
            Value::Array(items) => Ok(items),
            // Array mode only yields arrays
            _ => Ok(vec![]),
        }
    }
}
