//! Prompt Builder
//!
//! Assembles the three role-tagged blocks sent to the model for the plan call.

use tracing::debug;

use super::error::PipelineError;
use crate::domain::{Plan, TrendSnippet};
use crate::llm::Message;
use crate::prompts::{PlanPromptContext, PromptLoader};

/// Separator placed between serialized templates in the few-shot block
pub const TEMPLATE_SEPARATOR: &str = "\n---\n";

/// Build the system, assistant and user blocks, in that order
///
/// Output depends only on the inputs (and the loaded prompt files), so
/// identical inputs give byte-identical blocks.
pub fn build_prompt(
    prompts: &PromptLoader,
    templates: &[Plan],
    trends: &[TrendSnippet],
    need: &str,
) -> Result<Vec<Message>, PipelineError> {
    debug!(
        template_count = %templates.len(),
        trend_count = %trends.len(),
        "build_prompt: called"
    );

    let system = prompts
        .render("plan-system", &PlanPromptContext { need })
        .map_err(|e| PipelineError::PromptRender(e.to_string()))?;

    let few_shot = templates
        .iter()
        .map(serde_json::to_string)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| PipelineError::PromptRender(e.to_string()))?
        .join(TEMPLATE_SEPARATOR);

    let trends = serde_json::to_string(trends).map_err(|e| PipelineError::PromptRender(e.to_string()))?;

    Ok(vec![
        Message::system(system),
        Message::assistant(few_shot),
        Message::user(format!("Trends: {}", trends)),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Role;
    use crate::pipeline::fallback::fallback;

    fn trend(title: &str) -> TrendSnippet {
        TrendSnippet {
            title: title.to_string(),
            summary: "short desc".to_string(),
            url: None,
            date: None,
        }
    }

    #[test]
    fn test_blocks_in_fixed_order() {
        let loader = PromptLoader::embedded_only();
        let blocks = build_prompt(&loader, &[fallback("a")], &[trend("AI SDRs")], "Grow my B2B sales pipeline").unwrap();

        let roles: Vec<Role> = blocks.iter().map(|b| b.role).collect();
        assert_eq!(roles, vec![Role::System, Role::Assistant, Role::User]);

        assert!(blocks[0].content.contains("Grow my B2B sales pipeline"));
        for field in [
            "task_id",
            "title",
            "owner",
            "start_date",
            "end_date",
            "success_metric",
            "instruction",
            "example",
        ] {
            assert!(blocks[0].content.contains(field), "system block is missing {}", field);
        }

        assert_eq!(
            blocks[2].content,
            r#"Trends: [{"title":"AI SDRs","summary":"short desc"}]"#
        );
    }

    #[test]
    fn test_templates_joined_by_separator() {
        let loader = PromptLoader::embedded_only();
        let templates = vec![fallback("a"), fallback("b")];
        let blocks = build_prompt(&loader, &templates, &[], "need").unwrap();

        let parts: Vec<&str> = blocks[1].content.split(TEMPLATE_SEPARATOR).collect();
        assert_eq!(parts.len(), 2);
        let first: Plan = serde_json::from_str(parts[0]).unwrap();
        assert_eq!(first, templates[0]);
        assert_eq!(blocks[2].content, "Trends: []");
    }

    #[test]
    fn test_empty_context_gives_empty_few_shot_block() {
        let loader = PromptLoader::embedded_only();
        let blocks = build_prompt(&loader, &[], &[], "need").unwrap();
        assert_eq!(blocks.len(), 3);
        assert!(blocks[1].content.is_empty());
    }

    #[test]
    fn test_deterministic() {
        let loader = PromptLoader::embedded_only();
        let templates = vec![fallback("a")];
        let trends = vec![trend("PLG"), trend("RevOps")];
        let first = build_prompt(&loader, &templates, &trends, "Scale outbound").unwrap();
        let second = build_prompt(&loader, &templates, &trends, "Scale outbound").unwrap();
        assert_eq!(first, second);
    }
}
