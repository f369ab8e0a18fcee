//! Schema Enforcer
//!
//! Converts a loosely-typed parsed value into a [`Plan`]. Structural problems
//! (no goal, phases that are not a list, phases or tasks that are not objects)
//! are rejected. Narrative and bookkeeping gaps are repaired with fixed
//! defaults. Every repair is stable, so normalizing a normalized plan changes
//! nothing.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::domain::{Phase, Plan, Task};

/// Default for a task without an instruction
pub const DEFAULT_INSTRUCTION: &str = "Follow standard process.";

/// Default for a task without an example
pub const DEFAULT_EXAMPLE: &str = "E.g., survey 50 leads.";

/// Default for a task without an owner
pub const DEFAULT_OWNER: &str = "Unassigned";

const ISO_DATE: &str = "%Y-%m-%d";

/// A candidate that cannot become a Plan
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("schema violation: {0}")]
pub struct SchemaViolation(pub String);

impl SchemaViolation {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

/// Validate and repair a candidate plan
pub fn normalize(candidate: &Value) -> Result<Plan, SchemaViolation> {
    debug!("normalize: called");
    let object = candidate
        .as_object()
        .ok_or_else(|| SchemaViolation::new("plan is not a JSON object"))?;

    let goal = match object.get("goal") {
        Some(Value::String(goal)) if !goal.trim().is_empty() => goal.clone(),
        Some(Value::String(_)) => return Err(SchemaViolation::new("goal is empty")),
        Some(Value::Null) | None => return Err(SchemaViolation::new("goal is missing")),
        Some(_) => return Err(SchemaViolation::new("goal is not a string")),
    };

    let raw_phases = match object.get("phases") {
        Some(Value::Array(phases)) => phases,
        Some(_) => return Err(SchemaViolation::new("phases is not a sequence")),
        None => return Err(SchemaViolation::new("phases is missing")),
    };

    let mut phases = raw_phases
        .iter()
        .enumerate()
        .map(|(idx, raw)| normalize_phase(idx, raw))
        .collect::<Result<Vec<_>, _>>()?;

    assign_task_ids(&mut phases);

    debug!(phase_count = %phases.len(), "normalize: accepted");
    Ok(Plan { goal, phases })
}

/// Whether a plan already satisfies every invariant `normalize` guarantees
pub fn is_normalized(plan: &Plan) -> bool {
    let mut seen = HashSet::new();
    !plan.goal.trim().is_empty()
        && plan.tasks().all(|t| {
            !t.instruction.trim().is_empty()
                && !t.example.trim().is_empty()
                && !t.task_id.trim().is_empty()
                && seen.insert(t.task_id.as_str())
                && dates_ordered(&t.start_date, &t.end_date)
        })
}

fn normalize_phase(idx: usize, raw: &Value) -> Result<Phase, SchemaViolation> {
    let object = raw
        .as_object()
        .ok_or_else(|| SchemaViolation::new(format!("phase {} is not an object", idx + 1)))?;

    let title = non_empty_text(object, "title").unwrap_or_else(|| format!("Phase {}", idx + 1));

    let tasks = match object.get("tasks") {
        None | Some(Value::Null) => vec![],
        Some(Value::Array(tasks)) => tasks
            .iter()
            .enumerate()
            .map(|(task_idx, raw)| normalize_task(idx, task_idx, raw))
            .collect::<Result<Vec<_>, _>>()?,
        Some(_) => {
            return Err(SchemaViolation::new(format!(
                "tasks of phase {} is not a sequence",
                idx + 1
            )));
        }
    };

    Ok(Phase { title, tasks })
}

fn normalize_task(phase_idx: usize, idx: usize, raw: &Value) -> Result<Task, SchemaViolation> {
    let object = raw.as_object().ok_or_else(|| {
        SchemaViolation::new(format!("task {} of phase {} is not an object", idx + 1, phase_idx + 1))
    })?;

    let mut start_date = text(object, "start_date").unwrap_or_default();
    let mut end_date = text(object, "end_date").unwrap_or_default();
    if !dates_ordered(&start_date, &end_date) {
        debug!(%start_date, %end_date, "normalize_task: swapping reversed dates");
        std::mem::swap(&mut start_date, &mut end_date);
    }

    Ok(Task {
        // Empty ids are filled in by assign_task_ids
        task_id: text(object, "task_id").unwrap_or_default(),
        title: non_empty_text(object, "title").unwrap_or_else(|| format!("Task {}", idx + 1)),
        owner: non_empty_text(object, "owner").unwrap_or_else(|| DEFAULT_OWNER.to_string()),
        start_date,
        end_date,
        success_metric: text(object, "success_metric").unwrap_or_default(),
        instruction: non_empty_text(object, "instruction").unwrap_or_else(|| DEFAULT_INSTRUCTION.to_string()),
        example: non_empty_text(object, "example").unwrap_or_else(|| DEFAULT_EXAMPLE.to_string()),
    })
}

/// Give every task a unique, non-empty id
///
/// The first occurrence of an id keeps it. Empty ids and later duplicates get
/// `T{phase}.{task}`, suffixed until unused.
fn assign_task_ids(phases: &mut [Phase]) {
    let mut taken = HashSet::new();
    let mut pending = Vec::new();

    for (p, phase) in phases.iter().enumerate() {
        for (t, task) in phase.tasks.iter().enumerate() {
            if task.task_id.trim().is_empty() || !taken.insert(task.task_id.clone()) {
                pending.push((p, t));
            }
        }
    }

    for (p, t) in pending {
        let base = format!("T{}.{}", p + 1, t + 1);
        let mut candidate = base.clone();
        let mut n = 2;
        while taken.contains(&candidate) {
            candidate = format!("{}-{}", base, n);
            n += 1;
        }
        debug!(old = %phases[p].tasks[t].task_id, new = %candidate, "assign_task_ids: reassigned");
        taken.insert(candidate.clone());
        phases[p].tasks[t].task_id = candidate;
    }
}

/// False only when both dates parse and start is after end
fn dates_ordered(start: &str, end: &str) -> bool {
    match (
        NaiveDate::parse_from_str(start.trim(), ISO_DATE),
        NaiveDate::parse_from_str(end.trim(), ISO_DATE),
    ) {
        (Ok(start), Ok(end)) => start <= end,
        _ => true,
    }
}

/// A scalar field as text; objects, arrays and null count as absent
fn text(object: &Map<String, Value>, key: &str) -> Option<String> {
    match object.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn non_empty_text(object: &Map<String, Value>, key: &str) -> Option<String> {
    text(object, key).filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_empty_phases_is_valid() {
        let plan = normalize(&json!({"goal": "X", "phases": []})).unwrap();
        assert_eq!(plan.goal, "X");
        assert!(plan.phases.is_empty());
        assert!(is_normalized(&plan));
    }

    #[test]
    fn test_structural_violations() {
        assert!(normalize(&json!(["not", "an", "object"])).is_err());
        assert!(normalize(&json!({"phases": []})).is_err());
        assert!(normalize(&json!({"goal": "   ", "phases": []})).is_err());
        assert!(normalize(&json!({"goal": 42, "phases": []})).is_err());
        assert!(normalize(&json!({"goal": "X"})).is_err());
        assert!(normalize(&json!({"goal": "X", "phases": {"title": "P"}})).is_err());
        assert!(normalize(&json!({"goal": "X", "phases": ["Phase one"]})).is_err());
        assert!(normalize(&json!({"goal": "X", "phases": [{"title": "P", "tasks": "none"}]})).is_err());
        assert!(normalize(&json!({"goal": "X", "phases": [{"title": "P", "tasks": [7]}]})).is_err());
    }

    #[test]
    fn test_violation_message_names_the_problem() {
        let err = normalize(&json!({"goal": "", "phases": []})).unwrap_err();
        assert_eq!(err.to_string(), "schema violation: goal is empty");
    }

    #[test]
    fn test_missing_tasks_default_to_empty() {
        let plan = normalize(&json!({"goal": "X", "phases": [{"title": "Discovery"}]})).unwrap();
        assert_eq!(plan.phases[0].title, "Discovery");
        assert!(plan.phases[0].tasks.is_empty());
    }

    #[test]
    fn test_narrative_fields_are_repaired() {
        let plan = normalize(&json!({
            "goal": "X",
            "phases": [{
                "title": "P",
                "tasks": [
                    {"task_id": "A", "title": "Call leads", "instruction": "", "example": "  "},
                    {"task_id": "B", "title": "Email leads"}
                ]
            }]
        }))
        .unwrap();

        for task in plan.tasks() {
            assert_eq!(task.instruction, DEFAULT_INSTRUCTION);
            assert_eq!(task.example, DEFAULT_EXAMPLE);
            assert_eq!(task.owner, DEFAULT_OWNER);
        }
    }

    #[test]
    fn test_present_narrative_fields_are_kept() {
        let plan = normalize(&json!({
            "goal": "X",
            "phases": [{"title": "P", "tasks": [{
                "task_id": "V1",
                "title": "Interviews",
                "owner": "CEO",
                "start_date": "2025-11-10",
                "end_date": "2025-11-20",
                "success_metric": "20 interviews",
                "instruction": "Book calls",
                "example": "Use Calendly"
            }]}]
        }))
        .unwrap();

        let task = &plan.phases[0].tasks[0];
        assert_eq!(task.task_id, "V1");
        assert_eq!(task.owner, "CEO");
        assert_eq!(task.instruction, "Book calls");
        assert_eq!(task.example, "Use Calendly");
    }

    #[test]
    fn test_missing_titles_are_numbered() {
        let plan = normalize(&json!({"goal": "X", "phases": [{}, {"tasks": [{}, {}]}]})).unwrap();
        assert_eq!(plan.phases[0].title, "Phase 1");
        assert_eq!(plan.phases[1].title, "Phase 2");
        assert_eq!(plan.phases[1].tasks[1].title, "Task 2");
    }

    #[test]
    fn test_task_ids_made_unique() {
        let plan = normalize(&json!({
            "goal": "X",
            "phases": [
                {"title": "P1", "tasks": [{"task_id": "A"}, {"task_id": "A"}, {}]},
                {"title": "P2", "tasks": [{"task_id": "T1.2"}]}
            ]
        }))
        .unwrap();

        let ids: Vec<_> = plan.tasks().map(|t| t.task_id.as_str()).collect();
        // "T1.2" is claimed explicitly in phase 2, so the duplicate gets a suffix
        assert_eq!(ids, vec!["A", "T1.2-2", "T1.3", "T1.2"]);
        assert!(is_normalized(&plan));
    }

    #[test]
    fn test_scalar_fields_are_stringified() {
        let plan = normalize(&json!({
            "goal": "X",
            "phases": [{"title": 1, "tasks": [{"task_id": 7, "success_metric": 50}]}]
        }))
        .unwrap();
        assert_eq!(plan.phases[0].title, "1");
        assert_eq!(plan.phases[0].tasks[0].task_id, "7");
        assert_eq!(plan.phases[0].tasks[0].success_metric, "50");
    }

    #[test]
    fn test_reversed_dates_are_swapped() {
        let plan = normalize(&json!({
            "goal": "X",
            "phases": [{"title": "P", "tasks": [
                {"task_id": "A", "start_date": "2025-12-10", "end_date": "2025-11-25"},
                {"task_id": "B", "start_date": "next week", "end_date": "2025-01-01"}
            ]}]
        }))
        .unwrap();

        let tasks = &plan.phases[0].tasks;
        assert_eq!(tasks[0].start_date, "2025-11-25");
        assert_eq!(tasks[0].end_date, "2025-12-10");
        // Unparseable dates are left alone
        assert_eq!(tasks[1].start_date, "next week");
    }

    #[test]
    fn test_is_normalized_detects_gaps() {
        let mut plan = normalize(&json!({"goal": "X", "phases": [{"title": "P", "tasks": [{}]}]})).unwrap();
        assert!(is_normalized(&plan));
        plan.phases[0].tasks[0].example.clear();
        assert!(!is_normalized(&plan));
    }

    fn maybe_text() -> impl Strategy<Value = Option<Value>> {
        prop_oneof![
            Just(None),
            Just(Some(Value::Null)),
            Just(Some(json!(""))),
            "[a-zA-Z ]{1,12}".prop_map(|s| Some(json!(s))),
            (0i64..100).prop_map(|n| Some(json!(n))),
        ]
    }

    fn maybe_date() -> impl Strategy<Value = Option<Value>> {
        prop_oneof![
            Just(None),
            Just(Some(json!("soon"))),
            (1u32..=12, 1u32..=28).prop_map(|(m, d)| Some(json!(format!("2025-{:02}-{:02}", m, d)))),
        ]
    }

    fn task_value() -> impl Strategy<Value = Value> {
        (
            prop_oneof![Just(None), "[AB]".prop_map(|s| Some(json!(s))), Just(Some(json!("T1.1")))],
            maybe_text(),
            maybe_text(),
            maybe_date(),
            maybe_date(),
            maybe_text(),
            maybe_text(),
        )
            .prop_map(|(id, title, owner, start, end, instruction, example)| {
                let mut object = Map::new();
                for (key, value) in [
                    ("task_id", id),
                    ("title", title),
                    ("owner", owner),
                    ("start_date", start),
                    ("end_date", end),
                    ("instruction", instruction),
                    ("example", example),
                ] {
                    if let Some(value) = value {
                        object.insert(key.to_string(), value);
                    }
                }
                Value::Object(object)
            })
    }

    fn plan_value() -> impl Strategy<Value = Value> {
        (
            maybe_text(),
            prop::collection::vec((maybe_text(), prop::collection::vec(task_value(), 0..4)), 0..4),
        )
            .prop_map(|(goal, phases)| {
                let phases: Vec<Value> = phases
                    .into_iter()
                    .map(|(title, tasks)| {
                        let mut object = Map::new();
                        if let Some(title) = title {
                            object.insert("title".to_string(), title);
                        }
                        object.insert("tasks".to_string(), Value::Array(tasks));
                        Value::Object(object)
                    })
                    .collect();
                let mut object = Map::new();
                if let Some(goal) = goal {
                    object.insert("goal".to_string(), goal);
                }
                object.insert("phases".to_string(), Value::Array(phases));
                Value::Object(object)
            })
    }

    proptest! {
        #[test]
        fn prop_normalize_is_idempotent(candidate in plan_value()) {
            match normalize(&candidate) {
                Ok(once) => {
                    prop_assert!(is_normalized(&once));
                    let twice = normalize(&serde_json::to_value(&once).unwrap()).unwrap();
                    prop_assert_eq!(twice, once);
                }
                Err(first) => {
                    prop_assert_eq!(normalize(&candidate).unwrap_err(), first);
                }
            }
        }
    }
}
