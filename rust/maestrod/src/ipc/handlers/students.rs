use crate::ipc::helpers::{get_required, get_required_id, get_required_str, repo, repo_mut, respond, to_value, HandlerErr};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_students_list(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let class_id = get_required_id(&req.params, "classId")?;
    let class = repo(state)?.class(&class_id)?;
    let rows: Vec<serde_json::Value> = class
        .students
        .iter()
        .enumerate()
        .map(|(i, s)| {
            json!({
                "id": s.id,
                "name": s.name,
                "sortOrder": i,
                "seated": s.seating_position.is_some(),
            })
        })
        .collect();
    Ok(json!({ "students": rows }))
}

fn handle_students_create(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let class_id = get_required_id(&req.params, "classId")?;
    let name = get_required_str(&req.params, "name")?;
    let student = repo_mut(state)?.add_student(&class_id, &name)?;
    Ok(json!({ "student": to_value(&student)? }))
}

/// Accepts either `names: [..]` or a pasted block of `text`, one name per line.
fn handle_students_import(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let class_id = get_required_id(&req.params, "classId")?;
    let names: Vec<String> = if req.params.get("names").is_some() {
        get_required(&req.params, "names")?
    } else {
        get_required_str(&req.params, "text")?
            .lines()
            .map(|l| l.to_string())
            .collect()
    };
    let created = repo_mut(state)?.import_students(&class_id, &names)?;
    let ids: Vec<&str> = created.iter().map(|s| s.id.as_str()).collect();
    Ok(json!({ "created": created.len(), "studentIds": ids }))
}

fn handle_students_update(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let class_id = get_required_id(&req.params, "classId")?;
    let student_id = get_required_id(&req.params, "studentId")?;
    let name = get_required_str(&req.params, "name")?;
    repo_mut(state)?.update_student(&class_id, &student_id, &name)?;
    Ok(json!({ "ok": true }))
}

fn handle_students_delete(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let class_id = get_required_id(&req.params, "classId")?;
    let student_id = get_required_id(&req.params, "studentId")?;
    repo_mut(state)?.delete_student(&class_id, &student_id)?;
    Ok(json!({ "ok": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "students.list" => handle_students_list(state, req),
        "students.create" => handle_students_create(state, req),
        "students.import" => handle_students_import(state, req),
        "students.update" => handle_students_update(state, req),
        "students.delete" => handle_students_delete(state, req),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
