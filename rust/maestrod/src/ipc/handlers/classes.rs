use crate::calc;
use crate::ipc::helpers::{get_required_id, parse_params, repo, repo_mut, respond, to_value, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::model::{ClassMeta, ClassSettingsPatch};
use serde_json::json;

/// Dashboard cards: one row per class with its headline numbers.
fn handle_classes_list(state: &mut AppState, _req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let repo = repo(state)?;
    let rows: Vec<serde_json::Value> = repo
        .classes()
        .iter()
        .map(|c| {
            let summary = calc::class_summary(c);
            json!({
                "id": c.id,
                "name": c.name,
                "semester": c.semester,
                "professor": c.professor,
                "studentCount": c.students.len(),
                "assignmentCount": c.assignments.len(),
                "classAverage": summary.class_average,
                "atRiskCount": summary.at_risk_count,
            })
        })
        .collect();
    Ok(json!({ "classes": rows }))
}

fn handle_classes_get(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let class_id = get_required_id(&req.params, "classId")?;
    let class = repo(state)?.class(&class_id)?;
    Ok(json!({ "class": to_value(class)? }))
}

fn handle_classes_create(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let meta: ClassMeta = parse_params(req)?;
    let class = repo_mut(state)?.create_class(meta)?;
    Ok(json!({ "class": to_value(&class)? }))
}

fn handle_classes_delete(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let class_id = get_required_id(&req.params, "classId")?;
    let deleted = repo_mut(state)?.delete_class(&class_id)?;
    Ok(json!({ "deleted": deleted }))
}

fn handle_classes_update_settings(
    state: &mut AppState,
    req: &Request,
) -> Result<serde_json::Value, HandlerErr> {
    let class_id = get_required_id(&req.params, "classId")?;
    let patch: ClassSettingsPatch = parse_params(req)?;
    let settings = repo_mut(state)?.update_class_settings(&class_id, patch)?;
    to_value(&settings)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "classes.list" => handle_classes_list(state, req),
        "classes.get" => handle_classes_get(state, req),
        "classes.create" => handle_classes_create(state, req),
        "classes.delete" => handle_classes_delete(state, req),
        "classes.updateSettings" => handle_classes_update_settings(state, req),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
