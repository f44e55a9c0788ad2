//! HTTP handlers that clone attachments between owning documents.
//!
//! Each request opens its own transaction, runs the migration under the
//! configured deadline, and commits only if the migration succeeded.

use super::AppState;
use crate::{
    errors::{AppError, MigrationResult},
    models::{attachment::DocumentRef, resource_group::ResourceGroup},
    services::migration_service::CopyManyRequest,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use sqlx::{Sqlite, Transaction};
use tokio::time::{error::Elapsed, timeout};
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Body of `POST /tenants/{tenant}/attachments/copy`.
#[derive(Debug, Deserialize)]
pub struct CopyAttachmentsReq {
    pub source: DocumentRef,
    pub destination: DocumentRef,
}

/// Body of `POST /tenants/{tenant}/attachments/copy-many`.
#[derive(Debug, Deserialize)]
pub struct CopyManyAttachmentsReq {
    pub source_group: ResourceGroup,
    pub destination_group: ResourceGroup,
    pub source_ids: Vec<String>,
    pub destination_ids: Vec<String>,
}

impl From<CopyManyAttachmentsReq> for CopyManyRequest {
    fn from(req: CopyManyAttachmentsReq) -> Self {
        Self {
            source_group: req.source_group,
            destination_group: req.destination_group,
            source_ids: req.source_ids,
            destination_ids: req.destination_ids,
        }
    }
}

/// Copy one document's attachments into another document.
pub async fn copy_attachments(
    State(state): State<AppState>,
    Path(tenant): Path<String>,
    Json(req): Json<CopyAttachmentsReq>,
) -> Result<StatusCode, AppError> {
    let mut tx = state.migrations.db.begin().await?;
    let cancel = CancellationToken::new();

    let outcome = timeout(
        state.request_timeout,
        state
            .migrations
            .copy_one(&mut tx, &tenant, &req.source, &req.destination, &cancel),
    )
    .await;

    finish(tx, outcome).await
}

/// Copy the attachments of several documents, pairwise, in one transaction.
pub async fn copy_many_attachments(
    State(state): State<AppState>,
    Path(tenant): Path<String>,
    Json(req): Json<CopyManyAttachmentsReq>,
) -> Result<StatusCode, AppError> {
    let request = CopyManyRequest::from(req);
    let mut tx = state.migrations.db.begin().await?;
    let cancel = CancellationToken::new();

    let outcome = timeout(
        state.request_timeout,
        state
            .migrations
            .copy_many(&mut tx, &tenant, &request, &cancel),
    )
    .await;

    finish(tx, outcome).await
}

/// Commit on success; roll back on failure or when the deadline fired.
async fn finish(
    tx: Transaction<'static, Sqlite>,
    outcome: Result<MigrationResult<()>, Elapsed>,
) -> Result<StatusCode, AppError> {
    match outcome {
        Ok(Ok(())) => {
            tx.commit().await?;
            Ok(StatusCode::NO_CONTENT)
        }
        Ok(Err(err)) => {
            rollback(tx).await;
            Err(err.into())
        }
        Err(elapsed) => {
            warn!(error = %elapsed, "attachment copy exceeded request deadline");
            rollback(tx).await;
            Err(AppError::internal("internal error"))
        }
    }
}

async fn rollback(tx: Transaction<'static, Sqlite>) {
    if let Err(err) = tx.rollback().await {
        warn!(error = %err, "rollback after failed migration did not complete");
    }
}
