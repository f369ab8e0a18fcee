//! Keyword Extractor
//!
//! Derives the trend keyword set from need text.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::config::KeywordPolicy;

static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w+").expect("valid word regex"));

/// Distinct lower-cased word tokens in first-seen order, capped by the policy
///
/// Falls back to the policy defaults when the text has no tokens, or when a
/// focus list is configured and none of its terms appear.
pub fn extract_keywords(need: &str, policy: &KeywordPolicy) -> Vec<String> {
    debug!(need_len = %need.len(), limit = %policy.limit, "extract_keywords: called");
    let lowered = need.to_lowercase();
    let tokens: Vec<&str> = WORD.find_iter(&lowered).map(|m| m.as_str()).collect();

    if tokens.is_empty() {
        debug!("extract_keywords: no tokens, using defaults");
        return policy.defaults.clone();
    }

    if !policy.focus.is_empty() {
        let on_topic = tokens
            .iter()
            .any(|t| policy.focus.iter().any(|f| f.eq_ignore_ascii_case(t)));
        if !on_topic {
            debug!("extract_keywords: no focus term present, using defaults");
            return policy.defaults.clone();
        }
    }

    let mut keywords: Vec<String> = Vec::with_capacity(policy.limit);
    for token in tokens {
        if keywords.len() == policy.limit {
            break;
        }
        if !keywords.iter().any(|k| k == token) {
            keywords.push(token.to_string());
        }
    }
    keywords
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_distinct_tokens() {
        let keywords = extract_keywords("Grow my B2B sales pipeline", &KeywordPolicy::default());
        assert_eq!(keywords, vec!["grow", "my", "b2b", "sales"]);
    }

    #[test]
    fn test_duplicates_are_skipped() {
        let keywords = extract_keywords("Sales, sales and more SALES leads", &KeywordPolicy::default());
        assert_eq!(keywords, vec!["sales", "and", "more", "leads"]);
    }

    #[test]
    fn test_defaults_without_tokens() {
        let keywords = extract_keywords("!!! ???", &KeywordPolicy::default());
        assert_eq!(keywords, vec!["growth", "b2b"]);
    }

    #[test]
    fn test_focus_policy() {
        let policy = KeywordPolicy {
            focus: vec!["sales".to_string(), "marketing".to_string()],
            ..KeywordPolicy::default()
        };
        assert_eq!(extract_keywords("Bake sourdough bread", &policy), vec!["growth", "b2b"]);
        assert_eq!(
            extract_keywords("Fix our Marketing funnel", &policy),
            vec!["fix", "our", "marketing", "funnel"]
        );
    }

    #[test]
    fn test_limit_is_respected() {
        let policy = KeywordPolicy {
            limit: 5,
            ..KeywordPolicy::default()
        };
        assert_eq!(extract_keywords("a b c d e f g", &policy).len(), 5);
    }
}
