use crate::ipc::helpers::{
    get_required_id, get_required_str, parse_params, repo_mut, respond, to_value, HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use crate::model::{AssignmentPatch, NewAssignment};
use serde_json::json;

/// `grade: null` (or a missing key) clears the cell.
fn parse_grade(params: &serde_json::Value) -> Result<Option<f64>, HandlerErr> {
    match params.get("grade") {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(v) => v
            .as_f64()
            .map(Some)
            .ok_or_else(|| HandlerErr::bad_params("grade must be a number or null")),
    }
}

fn handle_grades_update(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let class_id = get_required_id(&req.params, "classId")?;
    let student_id = get_required_id(&req.params, "studentId")?;
    let assignment_id = get_required_id(&req.params, "assignmentId")?;
    let grade = parse_grade(&req.params)?;
    repo_mut(state)?.update_grade(&class_id, &student_id, &assignment_id, grade)?;
    Ok(json!({ "ok": true, "grade": grade }))
}

fn handle_assignments_create(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let class_id = get_required_id(&req.params, "classId")?;
    let data: NewAssignment = parse_params(req)?;
    let assignment = repo_mut(state)?.create_assignment(&class_id, data)?;
    Ok(json!({ "assignment": to_value(&assignment)? }))
}

fn handle_assignments_update(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let class_id = get_required_id(&req.params, "classId")?;
    let assignment_id = get_required_id(&req.params, "assignmentId")?;
    let patch: AssignmentPatch = match req.params.get("patch") {
        Some(p) => serde_json::from_value(p.clone())
            .map_err(|e| HandlerErr::bad_params(format!("invalid patch: {}", e)))?,
        None => return Err(HandlerErr::bad_params("missing patch")),
    };
    let assignment = repo_mut(state)?.update_assignment(&class_id, &assignment_id, patch)?;
    Ok(json!({ "assignment": to_value(&assignment)? }))
}

fn handle_assignments_delete(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let class_id = get_required_id(&req.params, "classId")?;
    let assignment_id = get_required_id(&req.params, "assignmentId")?;
    repo_mut(state)?.delete_assignment(&class_id, &assignment_id)?;
    Ok(json!({ "ok": true }))
}

fn handle_blocks_create(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let class_id = get_required_id(&req.params, "classId")?;
    let name = get_required_str(&req.params, "name")?;
    let block = repo_mut(state)?.add_block(&class_id, &name)?;
    Ok(json!({ "block": to_value(&block)? }))
}

fn handle_blocks_delete(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let class_id = get_required_id(&req.params, "classId")?;
    let block_id = get_required_id(&req.params, "blockId")?;
    let removed = repo_mut(state)?.delete_block(&class_id, &block_id)?;
    Ok(json!({ "ok": true, "removedAssignmentIds": removed }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "grades.update" => handle_grades_update(state, req),
        "assignments.create" => handle_assignments_create(state, req),
        "assignments.update" => handle_assignments_update(state, req),
        "assignments.delete" => handle_assignments_delete(state, req),
        "blocks.create" => handle_blocks_create(state, req),
        "blocks.delete" => handle_blocks_delete(state, req),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
