//! Defines routes for the attachment migration service.
//!
//! ## Structure
//! - **Health**
//!   - `GET  /healthz` — liveness
//!   - `GET  /readyz`  — schema and blob store readiness
//!
//! - **Tenant-scoped migrations**
//!   - `POST /tenants/{tenant}/attachments/copy`      — one document to one document
//!   - `POST /tenants/{tenant}/attachments/copy-many` — paired lists of documents

use crate::handlers::{
    AppState,
    health_handlers::{healthz, readyz},
    migration_handlers::{copy_attachments, copy_many_attachments},
};
use axum::{
    Router,
    routing::{get, post},
};

/// Build and return the router. Every handler receives the shared `AppState`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/tenants/{tenant}/attachments/copy", post(copy_attachments))
        .route(
            "/tenants/{tenant}/attachments/copy-many",
            post(copy_many_attachments),
        )
}
