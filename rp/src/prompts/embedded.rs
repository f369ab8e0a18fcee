//! Embedded prompts
//!
//! These are compiled into the binary from .pmt files at build time.

use tracing::debug;

/// System rule for the plan call: schema plus "JSON only"
pub const PLAN_SYSTEM: &str = include_str!("../../prompts/plan-system.pmt");

/// Instruction asking for example plans
pub const TEMPLATES: &str = include_str!("../../prompts/templates.pmt");

/// Instruction asking for trend snippets
pub const TRENDS: &str = include_str!("../../prompts/trends.pmt");

/// Get the embedded prompt by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    debug!(%name, "get_embedded: called");
    match name {
        "plan-system" => Some(PLAN_SYSTEM),
        "templates" => Some(TEMPLATES),
        "trends" => Some(TRENDS),
        _ => {
            debug!("get_embedded: no match found");
            None
        }
    }
}
