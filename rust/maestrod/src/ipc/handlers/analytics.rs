use crate::calc;
use crate::ipc::helpers::{get_required_id, repo, respond, to_value, HandlerErr};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_class_summary(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let class_id = get_required_id(&req.params, "classId")?;
    let class = repo(state)?.class(&class_id)?;
    let summary = calc::class_summary(class);
    Ok(json!({
        "summary": to_value(&summary)?,
        "gradeThresholds": to_value(&class.grade_thresholds)?,
        "atRiskThresholds": to_value(&class.at_risk_thresholds)?,
    }))
}

fn handle_student_risk(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let class_id = get_required_id(&req.params, "classId")?;
    let student_id = get_required_id(&req.params, "studentId")?;
    let repo = repo(state)?;
    let class = repo.class(&class_id)?;
    let student = repo.student(&class_id, &student_id)?;
    let summary = calc::student_summary(class, student);
    Ok(json!({
        "atRisk": !summary.risk_reasons.is_empty(),
        "student": to_value(&summary)?,
        "thresholds": to_value(&class.at_risk_thresholds)?,
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "analytics.classSummary" => handle_class_summary(state, req),
        "analytics.studentRisk" => handle_student_risk(state, req),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
