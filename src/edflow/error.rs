use crate::model::Kind;
use crate::validation::ValidationError;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EdflowError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{kind} does not exist: {lookup}")]
    NotFound { kind: Kind, lookup: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store error: {0}")]
    Store(String),
}

pub type Result<T> = std::result::Result<T, EdflowError>;

impl EdflowError {
    pub fn not_found(kind: Kind, lookup: impl std::fmt::Display) -> Self {
        EdflowError::NotFound {
            kind,
            lookup: lookup.to_string(),
        }
    }

    /// True for failures raised by the underlying engine rather than by policy.
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            EdflowError::Io(_) | EdflowError::Serialization(_) | EdflowError::Store(_)
        )
    }

    pub fn http_status(&self) -> u16 {
        match self {
            EdflowError::Validation(_) => 400,
            EdflowError::NotFound { .. } => 404,
            _ => 500,
        }
    }

    pub fn response(&self) -> ErrorResponse {
        let code = if self.is_storage() { "storage" } else { "invalid" };
        ErrorResponse {
            code,
            message: self.to_string(),
        }
    }
}

/// Machine-readable error body handed back to callers of the CRUD surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorResponse {
    pub code: &'static str,
    pub message: String,
}
