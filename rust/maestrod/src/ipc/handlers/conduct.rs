use crate::calc;
use crate::ipc::helpers::{get_required_id, parse_params, repo, repo_mut, respond, to_value, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::model::NewConductEntry;
use serde_json::json;

fn handle_conduct_add(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let class_id = get_required_id(&req.params, "classId")?;
    let student_id = get_required_id(&req.params, "studentId")?;
    let entry: NewConductEntry = parse_params(req)?;
    let entry = repo_mut(state)?.add_conduct_entry(&class_id, &student_id, entry)?;
    Ok(json!({ "entry": to_value(&entry)? }))
}

fn handle_conduct_list(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let class_id = get_required_id(&req.params, "classId")?;
    let student_id = get_required_id(&req.params, "studentId")?;
    let student = repo(state)?.student(&class_id, &student_id)?;
    Ok(json!({
        "entries": to_value(&student.conduct_log)?,
        "totalPoints": calc::conduct_points(student),
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "conduct.add" => handle_conduct_add(state, req),
        "conduct.list" => handle_conduct_list(state, req),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
