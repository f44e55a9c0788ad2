//! Shared fixtures for unit tests: an on-disk SQLite database with the
//! schema applied and an in-memory `BlobStore` that records every copy.

use crate::{
    db,
    models::{attachment::AttachmentRow, resource_group::ResourceGroup},
    services::blob_store::{BlobError, BlobResult, BlobStore, ObjectHandle},
};
use async_trait::async_trait;
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
};
use std::{
    collections::HashSet,
    io,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};
use tempfile::TempDir;

/// Fresh database in a temp dir. Keep the `TempDir` alive for the test.
pub async fn setup_db() -> (TempDir, Arc<SqlitePool>) {
    let dir = TempDir::new().expect("create temp dir");
    let options = SqliteConnectOptions::new()
        .filename(dir.path().join("migrator.db"))
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal);
    let pool = SqlitePoolOptions::new()
        .max_connections(4)
        .connect_with(options)
        .await
        .expect("open test database");
    db::run_migrations(&pool).await.expect("apply schema");
    (dir, Arc::new(pool))
}

pub async fn register_tenant(db: &SqlitePool, tenant_id: &str, container_id: Option<&str>) {
    sqlx::query("INSERT INTO tenants (id, container_id) VALUES (?, ?)")
        .bind(tenant_id)
        .bind(container_id)
        .execute(db)
        .await
        .expect("insert tenant");
}

pub async fn seed_attachments(
    db: &SqlitePool,
    group: ResourceGroup,
    tenant_id: &str,
    owner_id: &str,
    container_id: &str,
    filenames: &[&str],
) {
    let sql = format!(
        "INSERT INTO {} (tenant_id, owner_id, container_id, filename) VALUES (?, ?, ?, ?)",
        group.table()
    );
    for filename in filenames {
        sqlx::query(&sql)
            .bind(tenant_id)
            .bind(owner_id)
            .bind(container_id)
            .bind(*filename)
            .execute(db)
            .await
            .expect("seed attachment");
    }
}

/// Rows owned by `owner_id` in `group`'s table, in insertion order.
pub async fn attachment_rows(db: &SqlitePool, group: ResourceGroup, owner_id: &str) -> Vec<AttachmentRow> {
    let sql = format!(
        "SELECT tenant_id, owner_id, container_id, filename FROM {} WHERE owner_id = ? ORDER BY id",
        group.table()
    );
    sqlx::query_as::<_, AttachmentRow>(&sql)
        .bind(owner_id)
        .fetch_all(db)
        .await
        .expect("load attachment rows")
}

/// Records `(source_url, destination)` for each copy; fails on chosen names.
#[derive(Default)]
pub struct RecordingStore {
    copies: Mutex<Vec<(String, ObjectHandle)>>,
    failing: Mutex<HashSet<String>>,
    stall: Mutex<Option<Duration>>,
    unready: AtomicBool,
}

impl RecordingStore {
    pub fn fail_on(&self, name: &str) {
        self.failing.lock().unwrap().insert(name.to_string());
    }

    /// Delay every copy by `delay` before it is recorded.
    pub fn stall_for(&self, delay: Duration) {
        *self.stall.lock().unwrap() = Some(delay);
    }

    pub fn mark_unready(&self) {
        self.unready.store(true, Ordering::SeqCst);
    }

    pub fn copies(&self) -> Vec<(String, ObjectHandle)> {
        self.copies.lock().unwrap().clone()
    }
}

#[async_trait]
impl BlobStore for RecordingStore {
    fn url(&self, object: &ObjectHandle) -> String {
        format!("mem://{}/{}", object.container, object.name)
    }

    async fn copy_from_url(&self, destination: &ObjectHandle, source_url: &str) -> BlobResult<()> {
        let stall = *self.stall.lock().unwrap();
        if let Some(delay) = stall {
            tokio::time::sleep(delay).await;
        }
        if self.failing.lock().unwrap().contains(&destination.name) {
            return Err(BlobError::Io(io::Error::other("injected copy failure")));
        }
        self.copies
            .lock()
            .unwrap()
            .push((source_url.to_string(), destination.clone()));
        Ok(())
    }

    async fn check_ready(&self) -> BlobResult<()> {
        if self.unready.load(Ordering::SeqCst) {
            return Err(BlobError::Io(io::Error::other("store offline")));
        }
        Ok(())
    }
}
