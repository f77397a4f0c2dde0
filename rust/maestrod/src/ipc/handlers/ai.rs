use crate::ai::{self, EmailPurpose, EvaluationToolKind, ParentEmailContext, SchoolLevel, TextGenerator};
use crate::calc;
use crate::ipc::helpers::{get_required, get_required_id, get_required_str, repo, respond, HandlerErr};
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use tracing::{info, warn};

fn generator(state: &AppState) -> Result<&(dyn TextGenerator + 'static), HandlerErr> {
    state.ai.as_deref().ok_or_else(|| {
        HandlerErr::new(
            "ai_unavailable",
            "AI backend is not configured (set MAESTRO_AI_URL and MAESTRO_AI_KEY)",
        )
    })
}

fn run(generator: &dyn TextGenerator, prompt: &str) -> Result<serde_json::Value, HandlerErr> {
    match generator.generate(prompt) {
        Ok(text) => {
            info!(chars = text.chars().count(), "AI content generated");
            Ok(json!({ "text": text }))
        }
        Err(e) => {
            warn!(error = %format!("{e:#}"), "AI generation failed");
            Err(HandlerErr::new("ai_failed", format!("{e:#}")))
        }
    }
}

fn handle_ai_generate(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    repo(state)?;
    let prompt = get_required_str(&req.params, "prompt")?;
    if prompt.trim().is_empty() {
        return Err(HandlerErr::bad_params("prompt must not be empty"));
    }
    run(generator(state)?, &prompt)
}

fn handle_ai_evaluation_tool(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    repo(state)?;
    let topic = get_required_str(&req.params, "topic")?;
    if topic.trim().is_empty() {
        return Err(HandlerErr::bad_params("topic must not be empty"));
    }
    let kind: EvaluationToolKind = get_required(&req.params, "type")?;
    let level: SchoolLevel = get_required(&req.params, "level")?;
    let prompt = ai::evaluation_tool_prompt(kind, &topic, level);
    run(generator(state)?, &prompt)
}

/// Builds the prompt from the student's current record.
fn handle_ai_parent_email(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let class_id = get_required_id(&req.params, "classId")?;
    let student_id = get_required_id(&req.params, "studentId")?;
    let purpose: EmailPurpose = get_required(&req.params, "purpose")?;
    let note = req
        .params
        .get("note")
        .and_then(|v| v.as_str())
        .unwrap_or("");

    let repo = repo(state)?;
    let class = repo.class(&class_id)?;
    let student = repo.student(&class_id, &student_id)?;
    let prompt = ai::parent_email_prompt(&ParentEmailContext {
        student_name: &student.name,
        class_name: &class.name,
        professor: &class.professor,
        average: calc::weighted_average(&student.grades, &class.assignments),
        absences: calc::absence_count(student),
        conduct_points: calc::conduct_points(student),
        purpose,
        note,
    });
    run(generator(state)?, &prompt)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "ai.generate" => handle_ai_generate(state, req),
        "ai.evaluationTool" => handle_ai_evaluation_tool(state, req),
        "ai.parentEmail" => handle_ai_parent_email(state, req),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
