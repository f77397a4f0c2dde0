use crate::db::SqliteStore;
use crate::ipc::helpers::{get_required_str, respond, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::repo::ClassRepository;
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::info;

fn handle_health(state: &mut AppState, _req: &Request) -> Result<serde_json::Value, HandlerErr> {
    Ok(json!({
        "version": env!("CARGO_PKG_VERSION"),
        "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string()),
        "aiConfigured": state.ai.is_some(),
    }))
}

/// Opens (creating and seeding when needed) the workspace at `path` and makes
/// it the current one. The previous workspace stays open if this fails.
pub fn open_workspace(state: &mut AppState, path: &Path) -> Result<usize, HandlerErr> {
    let store = SqliteStore::open(path).map_err(|e| {
        HandlerErr::new("db_open_failed", format!("{e:#}"))
            .with_details(json!({ "path": path.to_string_lossy() }))
    })?;
    let repo = ClassRepository::open(store)?;
    let count = repo.classes().len();
    state.workspace = Some(path.to_path_buf());
    state.repo = Some(repo);
    info!(workspace = %path.display(), classes = count, "workspace opened");
    Ok(count)
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> Result<serde_json::Value, HandlerErr> {
    let path = PathBuf::from(get_required_str(&req.params, "path")?);
    let count = open_workspace(state, &path)?;
    Ok(json!({ "workspacePath": path.to_string_lossy(), "classCount": count }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "health" => handle_health(state, req),
        "workspace.select" => handle_workspace_select(state, req),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
