//! Domain types for romplan
//!
//! Plan, Phase and Task are the pipeline's output; PlanRequest is the row the
//! request store keeps for each user need.

mod plan;
mod request;

pub use plan::{Phase, Plan, Task, TemplateExample, TrendSnippet};
pub use request::{PlanRequest, RequestStatus, RequestUpdate};
