use crate::ipc::helpers::{get_required, get_required_id, repo, repo_mut, respond, to_value, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::model::{LessonPlan, LessonPlanInput};
use serde_json::json;

/// Plans sorted by date; `from`/`to` (inclusive, `YYYY-MM-DD`) narrow the range.
fn handle_lessons_list(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let class_id = get_required_id(&req.params, "classId")?;
    let from = req.params.get("from").and_then(|v| v.as_str());
    let to = req.params.get("to").and_then(|v| v.as_str());
    let class = repo(state)?.class(&class_id)?;
    // ISO dates order lexically.
    let mut plans: Vec<&LessonPlan> = class
        .lesson_plans
        .iter()
        .filter(|p| from.map_or(true, |f| p.date.as_str() >= f))
        .filter(|p| to.map_or(true, |t| p.date.as_str() <= t))
        .collect();
    plans.sort_by(|a, b| a.date.cmp(&b.date));
    Ok(json!({ "lessons": to_value(&plans)? }))
}

fn handle_lessons_upsert(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let class_id = get_required_id(&req.params, "classId")?;
    let plan: LessonPlanInput = get_required(&req.params, "lesson")?;
    let saved = repo_mut(state)?.update_lesson_plan(&class_id, plan)?;
    Ok(json!({ "lesson": to_value(&saved)? }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "planner.lessons.list" => handle_lessons_list(state, req),
        "planner.lessons.upsert" => handle_lessons_upsert(state, req),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
