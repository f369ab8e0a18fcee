//! Structured plan generation pipeline
//!
//! Control flow, leaves first:
//!
//! ```text
//! Orchestrator
//!   -> Retriever::fetch_templates
//!   -> extract_keywords -> Retriever::fetch_trends
//!   -> build_prompt
//!   -> ModelInvoker::invoke (deadline, retried on transient failures)
//!   -> extract (object mode)
//!   -> normalize
//!   => Plan, or fallback(need) plus a Diagnostic
//! ```

mod error;
mod extract;
mod fallback;
mod invoker;
mod keywords;
mod orchestrator;
mod prompt;
mod retrieval;
mod schema;

pub use error::{Diagnostic, ErrorKind, PipelineError};
pub use extract::{ExtractError, JsonMode, extract};
pub use fallback::fallback;
pub use invoker::ModelInvoker;
pub use keywords::extract_keywords;
pub use orchestrator::{GenerationOutcome, Orchestrator, PlanSource};
pub use prompt::{TEMPLATE_SEPARATOR, build_prompt};
pub use retrieval::Retriever;
pub use schema::{DEFAULT_EXAMPLE, DEFAULT_INSTRUCTION, DEFAULT_OWNER, SchemaViolation, is_normalized, normalize};
