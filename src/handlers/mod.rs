//! HTTP handlers. They are thin callers of `MigrationService`: each request
//! owns its transaction and decides whether to commit it.

use crate::services::migration_service::MigrationService;
use std::time::Duration;

pub mod health_handlers;
pub mod migration_handlers;

/// Shared state carried by the router into every handler.
#[derive(Clone)]
pub struct AppState {
    pub migrations: MigrationService,

    /// Deadline applied to each copy request.
    pub request_timeout: Duration,
}
