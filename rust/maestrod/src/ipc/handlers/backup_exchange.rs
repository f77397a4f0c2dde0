use crate::backup;
use crate::error::RepoError;
use crate::ipc::helpers::{get_required_str, repo, repo_mut, respond, HandlerErr};
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use std::path::PathBuf;
use tracing::info;

/// `outPath` may name a file or an existing directory; a directory gets the
/// dated default file name.
fn handle_backup_export_json(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let out_path = get_required_str(&req.params, "outPath")?;
    if out_path.trim().is_empty() {
        return Err(HandlerErr::bad_params("missing outPath"));
    }
    let repo = repo(state)?;

    let mut out = PathBuf::from(out_path.trim());
    if out.is_dir() {
        out = out.join(backup::default_export_file_name(
            chrono::Local::now().date_naive(),
        ));
    }

    let summary = backup::export_classes_json(repo.classes(), &out).map_err(|e| {
        HandlerErr::new("io_failed", format!("{e:#}"))
            .with_details(json!({ "path": out.to_string_lossy() }))
    })?;
    info!(path = %out.display(), classes = summary.class_count, "classes exported");

    Ok(json!({
        "path": out.to_string_lossy(),
        "classCount": summary.class_count,
        "bytes": summary.byte_count,
    }))
}

/// Replaces every class in the workspace with the file's content.
fn handle_backup_import_json(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let in_path = get_required_str(&req.params, "inPath")?;
    let src = PathBuf::from(in_path.trim());
    let repo = repo_mut(state)?;
    if !src.is_file() {
        return Err(HandlerErr::new("not_found", "import file not found")
            .with_details(json!({ "path": in_path })));
    }

    let classes = backup::read_import_file(&src).map_err(|e| match e {
        RepoError::Persistence(inner) => HandlerErr::new("io_failed", format!("{inner:#}")),
        other => HandlerErr::from(other),
    })?;
    let count = repo.import_data(classes)?;
    Ok(json!({ "classCount": count }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "backup.exportJson" => handle_backup_export_json(state, req),
        "backup.importJson" => handle_backup_import_json(state, req),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
