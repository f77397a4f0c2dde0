use crate::db::SqliteStore;
use crate::error::RepoError;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::repo::ClassRepository;
use serde::de::DeserializeOwned;
use serde_json::json;

pub type Repo = ClassRepository<SqliteStore>;

pub struct HandlerErr {
    pub code: &'static str,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl HandlerErr {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn bad_params(message: impl Into<String>) -> Self {
        Self::new("bad_params", message)
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn response(self, id: &str) -> serde_json::Value {
        err(id, self.code, self.message, self.details)
    }
}

impl From<RepoError> for HandlerErr {
    fn from(e: RepoError) -> Self {
        let details = match &e {
            RepoError::NotFound { entity, id } => Some(json!({ "entity": entity, "id": id })),
            _ => None,
        };
        Self {
            code: e.code(),
            message: e.to_string(),
            details,
        }
    }
}

pub fn respond(id: &str, result: Result<serde_json::Value, HandlerErr>) -> serde_json::Value {
    match result {
        Ok(v) => ok(id, v),
        Err(e) => e.response(id),
    }
}

pub fn get_required_str(params: &serde_json::Value, key: &str) -> Result<String, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

/// Accepts a string or a number; old clients send numeric ids.
pub fn get_required_id(params: &serde_json::Value, key: &str) -> Result<String, HandlerErr> {
    match params.get(key) {
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        Some(serde_json::Value::Number(n)) => Ok(n.to_string()),
        _ => Err(HandlerErr::bad_params(format!("missing {}", key))),
    }
}

/// Deserializes `params[key]`; a missing key is reported as such.
pub fn get_required<T: DeserializeOwned>(params: &serde_json::Value, key: &str) -> Result<T, HandlerErr> {
    let Some(raw) = params.get(key) else {
        return Err(HandlerErr::bad_params(format!("missing {}", key)));
    };
    serde_json::from_value(raw.clone())
        .map_err(|e| HandlerErr::bad_params(format!("invalid {}: {}", key, e)))
}

/// Deserializes the whole params object.
pub fn parse_params<T: DeserializeOwned>(req: &Request) -> Result<T, HandlerErr> {
    serde_json::from_value(req.params.clone())
        .map_err(|e| HandlerErr::bad_params(format!("invalid params: {}", e)))
}

pub fn repo(state: &AppState) -> Result<&Repo, HandlerErr> {
    state
        .repo
        .as_ref()
        .ok_or_else(|| HandlerErr::new("no_workspace", "select a workspace first"))
}

pub fn repo_mut(state: &mut AppState) -> Result<&mut Repo, HandlerErr> {
    state
        .repo
        .as_mut()
        .ok_or_else(|| HandlerErr::new("no_workspace", "select a workspace first"))
}

pub fn to_value<T: serde::Serialize>(v: &T) -> Result<serde_json::Value, HandlerErr> {
    serde_json::to_value(v).map_err(|e| HandlerErr::new("internal", e.to_string()))
}
