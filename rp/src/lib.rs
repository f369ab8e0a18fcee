//! romplan - Structured Plan Generation
//!
//! romplan turns a free-text need into a multi-phase execution plan (goal,
//! phases, tasks with owners, dates and success metrics). It asks a
//! text-generation backend for example templates and trend snippets, builds a
//! prompt from them, and parses the model's answer into a schema-checked Plan.
//! When any step fails the caller still gets a plan: a fixed fallback, plus a
//! diagnostic naming what went wrong.
//!
//! # Modules
//!
//! - [`pipeline`] - Orchestrator, retrieval, prompt assembly, extraction, schema enforcement
//! - [`llm`] - LLM client trait with Hugging Face and OpenAI backends
//! - [`domain`] - Plan and PlanRequest types
//! - [`store`] - Request store trait with in-memory and SQLite implementations
//! - [`lifecycle`] - Submission driver over a request store
//! - [`prompts`] - Handlebars prompt templates
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod cli;
pub mod config;
pub mod domain;
pub mod lifecycle;
pub mod llm;
pub mod pipeline;
pub mod prompts;
pub mod store;

pub use config::Config;
pub use domain::{Phase, Plan, PlanRequest, RequestStatus, Task};
pub use lifecycle::{Submission, SubmitError, submit};
pub use pipeline::{Diagnostic, ErrorKind, GenerationOutcome, Orchestrator, PlanSource};
