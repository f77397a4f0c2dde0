use thiserror::Error;

/// Failure of a repository operation. State is never partially updated.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("{0}")]
    Validation(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("invalid import payload: {0}")]
    ImportFormat(String),

    #[error("persistence failed: {0:#}")]
    Persistence(#[from] anyhow::Error),
}

impl RepoError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(entity: &'static str, id: &str) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Stable code used on the IPC wire.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "bad_params",
            Self::NotFound { .. } => "not_found",
            Self::ImportFormat(_) => "import_format",
            Self::Persistence(_) => "persist_failed",
        }
    }
}

pub type RepoResult<T> = std::result::Result<T, RepoError>;
