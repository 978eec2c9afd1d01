use std::io;

use thiserror::Error;

use crate::auth::AuthRejection;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("authentication rejected: {0}")]
    Auth(AuthRejection),
    #[error("failed to {operation}: {detail}")]
    RemoteFetch { operation: String, detail: String },
    #[error("no transition to '{requested}'; available: {}", available.join(", "))]
    InvalidTransition {
        requested: String,
        available: Vec<String>,
    },
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
    #[error("unknown tool: {0}")]
    UnknownTool(String),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl AppError {
    pub fn remote(operation: impl Into<String>, detail: impl ToString) -> Self {
        AppError::RemoteFetch {
            operation: operation.into(),
            detail: detail.to_string(),
        }
    }

    /// Text that may be shown to a caller. Upstream detail stays in the logs.
    pub fn caller_message(&self) -> String {
        match self {
            AppError::Auth(rejection) => rejection.message().to_string(),
            AppError::RemoteFetch { operation, .. } => format!("Failed to {operation}"),
            AppError::InvalidTransition { requested, .. } => {
                format!("No transition matches '{requested}'")
            }
            AppError::InvalidArguments(message) => message.clone(),
            AppError::UnknownTool(name) => format!("Unknown tool '{name}'"),
            _ => "Internal error".to_string(),
        }
    }
}

impl From<AuthRejection> for AppError {
    fn from(rejection: AuthRejection) -> Self {
        AppError::Auth(rejection)
    }
}

pub type AppResult<T> = Result<T, AppError>;
