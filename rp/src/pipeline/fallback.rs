//! Fallback Generator
//!
//! A fixed three-phase growth plan returned whenever the generative path
//! fails. Pure and infallible.

use tracing::debug;

use crate::domain::{Phase, Plan, Task};

struct TaskSeed {
    task_id: &'static str,
    title: &'static str,
    owner: &'static str,
    start_date: &'static str,
    end_date: &'static str,
    success_metric: &'static str,
    instruction: &'static str,
    example: &'static str,
}

const PHASES: [(&str, [TaskSeed; 2]); 3] = [
    (
        "Phase 1: Validate Market",
        [
            TaskSeed {
                task_id: "V1",
                title: "Customer Interviews",
                owner: "CEO",
                start_date: "2025-11-10",
                end_date: "2025-11-20",
                success_metric: "20 interviews completed",
                instruction: "Schedule calls with potential customers to validate pain points.",
                example: "Use Calendly for booking; ask 'What frustrates you most in B2B sales?'",
            },
            TaskSeed {
                task_id: "V2",
                title: "Competitor Analysis",
                owner: "Product Lead",
                start_date: "2025-11-15",
                end_date: "2025-11-25",
                success_metric: "SWOT report drafted",
                instruction: "Map competitors' features and pricing.",
                example: "Tools: SimilarWeb, G2 reviews; output Google Doc with gaps.",
            },
        ],
    ),
    (
        "Phase 2: Build MVP",
        [
            TaskSeed {
                task_id: "B1",
                title: "Prototype Development",
                owner: "Dev Team",
                start_date: "2025-11-25",
                end_date: "2025-12-10",
                success_metric: "Clickable prototype ready",
                instruction: "Prioritize core features based on validation.",
                example: "Use Figma for wireframes; test with 5 users via UserTesting.com.",
            },
            TaskSeed {
                task_id: "B2",
                title: "Beta Launch Prep",
                owner: "Marketing",
                start_date: "2025-12-05",
                end_date: "2025-12-15",
                success_metric: "Landing page live",
                instruction: "Create waitlist and teaser content.",
                example: "Tools: Carrd for page, Mailchimp for signups; aim for 100 leads.",
            },
        ],
    ),
    (
        "Phase 3: Scale & Iterate",
        [
            TaskSeed {
                task_id: "S1",
                title: "Metrics Tracking",
                owner: "Ops",
                start_date: "2025-12-15",
                end_date: "2025-12-31",
                success_metric: "10 paying users",
                instruction: "Set up analytics and feedback loops.",
                example: "Google Analytics + Hotjar; weekly review meetings.",
            },
            TaskSeed {
                task_id: "S2",
                title: "Funding Pitch",
                owner: "CEO",
                start_date: "2025-12-20",
                end_date: "2026-01-10",
                success_metric: "Pitch deck sent to 5 VCs",
                instruction: "Refine deck with traction data.",
                example: "Template: Sequoia pitch deck; highlight 20% MoM growth.",
            },
        ],
    ),
];

/// Build the fallback plan for a need
pub fn fallback(need: &str) -> Plan {
    debug!(need_len = %need.len(), "fallback: called");
    Plan {
        goal: format!("Growth Plan for B2B Startup: {}", need),
        phases: PHASES
            .iter()
            .map(|(title, seeds)| Phase {
                title: title.to_string(),
                tasks: seeds.iter().map(TaskSeed::to_task).collect(),
            })
            .collect(),
    }
}

impl TaskSeed {
    fn to_task(&self) -> Task {
        Task {
            task_id: self.task_id.to_string(),
            title: self.title.to_string(),
            owner: self.owner.to_string(),
            start_date: self.start_date.to_string(),
            end_date: self.end_date.to_string(),
            success_metric: self.success_metric.to_string(),
            instruction: self.instruction.to_string(),
            example: self.example.to_string(),
        }
    }
}
