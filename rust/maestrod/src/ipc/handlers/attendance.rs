use crate::ipc::helpers::{get_required, get_required_id, get_required_str, repo, repo_mut, respond, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::model::AttendanceStatus;
use chrono::NaiveDate;
use serde_json::json;

fn handle_attendance_update(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let class_id = get_required_id(&req.params, "classId")?;
    let student_id = get_required_id(&req.params, "studentId")?;
    let date = get_required_str(&req.params, "date")?;
    let status: AttendanceStatus = get_required(&req.params, "status")?;
    repo_mut(state)?.update_attendance(&class_id, &student_id, &date, status)?;
    Ok(json!({ "ok": true }))
}

/// One row per student for a single day, with totals for the roll-call header.
fn handle_attendance_day(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let class_id = get_required_id(&req.params, "classId")?;
    let date = get_required_str(&req.params, "date")?;
    let day = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .map_err(|_| HandlerErr::bad_params("date must be YYYY-MM-DD"))?
        .format("%Y-%m-%d")
        .to_string();
    let class = repo(state)?.class(&class_id)?;

    let (mut present, mut absent, mut late, mut unmarked) = (0usize, 0usize, 0usize, 0usize);
    let rows: Vec<serde_json::Value> = class
        .students
        .iter()
        .map(|s| {
            let status = s.attendance.get(&day).copied();
            match status {
                Some(AttendanceStatus::Present) => present += 1,
                Some(AttendanceStatus::Absent) => absent += 1,
                Some(AttendanceStatus::Late) => late += 1,
                None => unmarked += 1,
            }
            json!({ "studentId": s.id, "name": s.name, "status": status })
        })
        .collect();

    Ok(json!({
        "date": day,
        "rows": rows,
        "counts": {
            "present": present,
            "absent": absent,
            "late": late,
            "unmarked": unmarked,
        }
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "attendance.update" => handle_attendance_update(state, req),
        "attendance.day" => handle_attendance_day(state, req),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
