//! Error types and error handling for the hub
//!
//! Every caller-facing fault is surfaced as a structured failure on the same
//! call; none of them crash the process. All variants implement `IntoResponse`
//! so HTTP transports get a consistent `{error, code, status}` body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Hub-level error taxonomy
#[derive(Error, Debug)]
pub enum HubError {
    /// Message sent to an id that is not registered
    #[error("Unknown recipient: {0}")]
    UnknownRecipient(String),

    /// Shared context id is absent or has expired
    #[error("Context not found: {0}")]
    ContextNotFound(String),

    /// Reader is not on the context's allow-list
    #[error("Access denied: {ai_id} may not read context {context_id}")]
    AccessDenied {
        /// Context the read was attempted on
        context_id: String,
        /// The rejected reader
        ai_id: String,
    },

    /// Malformed arguments (missing required field, empty id, bad shape)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Task id does not exist
    #[error("Task not found: {0}")]
    TaskNotFound(String),

    /// Tool dispatch received an operation name the hub does not expose
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Error from the durable store
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal server error (catch-all for unexpected errors)
    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl HubError {
    /// Stable machine-readable code for the variant, independent of transport
    pub fn code(&self) -> &'static str {
        match self {
            HubError::UnknownRecipient(_) => "UnknownRecipient",
            HubError::ContextNotFound(_) => "ContextNotFound",
            HubError::AccessDenied { .. } => "AccessDenied",
            HubError::Validation(_) => "ValidationError",
            HubError::TaskNotFound(_) => "TaskNotFound",
            HubError::UnknownTool(_) => "UnknownTool",
            HubError::Database(_) => "DatabaseError",
            HubError::Internal(_) => "InternalError",
        }
    }
}

impl IntoResponse for HubError {
    fn into_response(self) -> Response {
        let status = match self {
            HubError::UnknownRecipient(_) => StatusCode::NOT_FOUND,
            HubError::ContextNotFound(_) => StatusCode::NOT_FOUND,
            HubError::AccessDenied { .. } => StatusCode::FORBIDDEN,
            HubError::Validation(_) => StatusCode::BAD_REQUEST,
            HubError::TaskNotFound(_) => StatusCode::NOT_FOUND,
            HubError::UnknownTool(_) => StatusCode::NOT_FOUND,
            HubError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            HubError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string(),
            "code": self.code(),
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}
