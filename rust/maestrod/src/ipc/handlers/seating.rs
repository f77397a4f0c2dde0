use crate::ipc::helpers::{get_required_id, repo, repo_mut, respond, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::model::SeatingPosition;
use serde_json::json;

fn handle_seating_get(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let class_id = get_required_id(&req.params, "classId")?;
    let class = repo(state)?.class(&class_id)?;
    let mut seats = Vec::new();
    let mut unseated = Vec::new();
    for s in &class.students {
        match s.seating_position {
            Some(p) => seats.push(json!({ "studentId": s.id, "name": s.name, "x": p.col, "y": p.row })),
            None => unseated.push(json!({ "studentId": s.id, "name": s.name })),
        }
    }
    Ok(json!({
        "rows": class.seating_chart.rows,
        "cols": class.seating_chart.cols,
        "seats": seats,
        "unseated": unseated,
    }))
}

/// `position: null` sends the student back to the unseated list.
fn handle_seating_update(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let class_id = get_required_id(&req.params, "classId")?;
    let student_id = get_required_id(&req.params, "studentId")?;
    let position: Option<SeatingPosition> = match req.params.get("position") {
        None | Some(serde_json::Value::Null) => None,
        Some(v) => Some(
            serde_json::from_value(v.clone())
                .map_err(|e| HandlerErr::bad_params(format!("invalid position: {}", e)))?,
        ),
    };
    repo_mut(state)?.update_seating_chart(&class_id, &student_id, position)?;
    Ok(json!({ "ok": true }))
}

fn handle_seating_clear(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let class_id = get_required_id(&req.params, "classId")?;
    let cleared = repo_mut(state)?.clear_all_seats(&class_id)?;
    Ok(json!({ "cleared": cleared }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "seating.get" => handle_seating_get(state, req),
        "seating.update" => handle_seating_update(state, req),
        "seating.clear" => handle_seating_clear(state, req),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
