//! Health & readiness handlers.
//!
//! - GET /healthz  -> simple liveness ("ok")
//! - GET /readyz   -> the attachment schema is in place and the blob store
//!   accepts copies

use super::AppState;
use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::warn;

/// `GET /healthz`
///
/// Liveness only; never performs I/O.
pub async fn healthz() -> (StatusCode, Json<HealthResponse>) {
    (StatusCode::OK, Json(HealthResponse { status: "ok" }))
}

/// `GET /readyz`
///
/// 200 when the tenant directory is queryable and the blob store reports
/// ready, 503 otherwise. Each check is listed with its error, if any.
pub async fn readyz(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    let schema = sqlx::query_scalar::<_, i64>("SELECT 1 FROM tenants LIMIT 1")
        .fetch_optional(&*state.migrations.db)
        .await
        .map(|_| ())
        .map_err(|e| e.to_string());
    let blobs = state
        .migrations
        .blobs
        .check_ready()
        .await
        .map_err(|e| e.to_string());

    let checks = BTreeMap::from([
        ("schema", CheckStatus::from(schema)),
        ("blobs", CheckStatus::from(blobs)),
    ]);
    let ready = checks.values().all(|c| c.ok);
    if !ready {
        warn!(?checks, "readiness check failed");
    }

    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    let body = ReadyResponse {
        status: if ready { "ok" } else { "error" },
        checks,
    };
    (status, Json(body))
}

#[derive(Serialize, Debug)]
pub struct HealthResponse {
    status: &'static str,
}

#[derive(Serialize, Debug)]
pub struct ReadyResponse {
    status: &'static str,
    checks: BTreeMap<&'static str, CheckStatus>,
}

#[derive(Serialize, Debug)]
pub struct CheckStatus {
    ok: bool,
    error: Option<String>,
}

impl From<Result<(), String>> for CheckStatus {
    fn from(result: Result<(), String>) -> Self {
        Self {
            ok: result.is_ok(),
            error: result.err(),
        }
    }
}
