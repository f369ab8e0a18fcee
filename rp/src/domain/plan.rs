//! Plan domain types
//!
//! A Plan is the structured output of one pipeline run: a goal and an ordered
//! list of phases, each holding an ordered list of tasks. Plans are built fresh
//! per run (from model output or from the fallback) and never edited in place;
//! a correction replaces the whole Plan.

use serde::{Deserialize, Serialize};

/// A structured execution plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    /// What the plan achieves (never empty)
    pub goal: String,

    /// Ordered phases; empty only for quick-tip style answers
    pub phases: Vec<Phase>,
}

impl Plan {
    /// Total number of tasks across all phases
    pub fn task_count(&self) -> usize {
        self.phases.iter().map(|p| p.tasks.len()).sum()
    }

    /// Iterate every task in phase order
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.phases.iter().flat_map(|p| p.tasks.iter())
    }
}

/// A named group of tasks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    pub title: String,
    pub tasks: Vec<Task>,
}

/// A single unit of work with an owner, a date range and a success metric
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Unique within a plan
    pub task_id: String,
    pub title: String,
    pub owner: String,
    /// ISO date (YYYY-MM-DD)
    pub start_date: String,
    /// ISO date (YYYY-MM-DD), not before `start_date`
    pub end_date: String,
    pub success_metric: String,
    pub instruction: String,
    pub example: String,
}

/// A short topical blurb used as prompt context
///
/// Never persisted on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendSnippet {
    pub title: String,

    #[serde(default)]
    pub summary: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

/// Example plans used as few-shot context share the Plan shape
pub type TemplateExample = Plan;

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: &str) -> Task {
        Task {
            task_id: id.to_string(),
            title: "Title".to_string(),
            owner: "Owner".to_string(),
            start_date: "2025-01-01".to_string(),
            end_date: "2025-01-02".to_string(),
            success_metric: "Done".to_string(),
            instruction: "Do it".to_string(),
            example: "Like this".to_string(),
        }
    }

    #[test]
    fn test_task_count_spans_phases() {
        let plan = Plan {
            goal: "Goal".to_string(),
            phases: vec![
                Phase {
                    title: "One".to_string(),
                    tasks: vec![task("A"), task("B")],
                },
                Phase {
                    title: "Two".to_string(),
                    tasks: vec![task("C")],
                },
            ],
        };

        assert_eq!(plan.task_count(), 3);
        let ids: Vec<_> = plan.tasks().map(|t| t.task_id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_trend_snippet_optional_fields() {
        let snippet: TrendSnippet = serde_json::from_str(r#"{"title": "AI SDRs"}"#).unwrap();
        assert_eq!(snippet.title, "AI SDRs");
        assert_eq!(snippet.summary, "");
        assert!(snippet.url.is_none());

        let json = serde_json::to_string(&snippet).unwrap();
        assert!(!json.contains("url"));
        assert!(!json.contains("date"));
    }

    #[test]
    fn test_trend_snippet_ignores_unknown_fields() {
        let snippet: TrendSnippet =
            serde_json::from_str(r#"{"title": "PLG", "summary": "Product-led growth", "score": 9}"#).unwrap();
        assert_eq!(snippet.summary, "Product-led growth");
    }
}
