use std::path::PathBuf;

use serde::Deserialize;

use crate::ai::TextGenerator;
use crate::db::SqliteStore;
use crate::repo::ClassRepository;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub repo: Option<ClassRepository<SqliteStore>>,
    pub ai: Option<Box<dyn TextGenerator>>,
}
