use crate::services::blob_store::BlobError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;
use thiserror::Error;

/// Failures of a single migration call.
///
/// None of these are retried internally; the caller decides whether the
/// surrounding transaction can be retried.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("unknown resource group `{0}`")]
    UnknownResourceGroup(String),
    #[error("no blob container registered for tenant `{0}`")]
    TenantContainerNotFound(String),
    #[error("{sources} source ids paired with {destinations} destination ids")]
    LengthMismatch { sources: usize, destinations: usize },
    #[error("no destination paired with source owner `{0}`")]
    DestinationMissing(String),
    #[error("copying `{filename}` failed: {source}")]
    CopyFailed {
        filename: String,
        #[source]
        source: BlobError,
    },
    #[error("copy worker aborted: {0}")]
    CopyAborted(String),
    #[error("copy phase cancelled")]
    Cancelled,
    #[error("inserting attachment rows failed: {0}")]
    InsertFailed(#[source] sqlx::Error),
    #[error("row has {actual} values but the batch has {expected} columns")]
    ColumnCountMismatch { expected: usize, actual: usize },
    #[error("cannot finalize an empty insert batch")]
    EmptyBatch,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub type MigrationResult<T> = Result<T, MigrationError>;

/// A lightweight wrapper for general errors that keeps the message local.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    /// Create a new AppError with a specific status and message.
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
        }
    }

    /// Shortcut for a 500 Internal Server Error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.message,
            "status": self.status.as_u16()
        }));

        (self.status, body).into_response()
    }
}

/// Migration failures are logged in full and surfaced to clients as a
/// generic internal error.
impl From<MigrationError> for AppError {
    fn from(err: MigrationError) -> Self {
        tracing::error!(error = %err, "attachment migration failed");
        AppError::internal("internal error")
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!(error = %err, "database error");
        AppError::internal("internal error")
    }
}
