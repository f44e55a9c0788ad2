//! src/services/migration_service.rs
//!
//! MigrationService — duplicates the attachments of one owning document (or
//! of many, pairwise) into other owning documents. Blob payloads are copied
//! server-side with bounded parallelism while the new metadata rows are
//! inserted as a single batch on the caller's transaction.
//!
//! Both entry points run the same pipeline:
//! resolve tables → locate the tenant container → fetch source rows →
//! dispatch copy tasks and destination rows → copy ‖ insert → join.
//!
//! The service never commits or rolls back. On error the caller is expected
//! to roll back; on success it continues and eventually commits.

use super::{
    blob_store::{BlobStore, ObjectHandle},
    container_locator::{ContainerPair, tenant_container},
    copy_scheduler::{CopyTask, run_copies},
    insert_batch::InsertBatch,
};
use crate::{
    errors::{MigrationError, MigrationResult},
    models::{
        attachment::{AttachmentRow, DocumentRef},
        resource_group::ResourceGroup,
    },
};
use sqlx::{QueryBuilder, Sqlite, SqlitePool, Transaction};
use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Paired copy of many documents between two resource groups.
#[derive(Clone, Debug)]
pub struct CopyManyRequest {
    pub source_group: ResourceGroup,
    pub destination_group: ResourceGroup,
    pub source_ids: Vec<String>,
    pub destination_ids: Vec<String>,
}

#[derive(Clone)]
pub struct MigrationService {
    /// Pool used for the tenant-directory lookup, outside any transaction.
    pub db: Arc<SqlitePool>,

    /// Blob backend performing the object copies.
    pub blobs: Arc<dyn BlobStore>,
}

/// Resolved tables and containers for one call, plus the work it produces.
struct MigrationPlan<'a> {
    tenant_id: &'a str,
    source_table: &'static str,
    containers: ContainerPair,
    batch: InsertBatch,
    tasks: Vec<CopyTask>,
    /// Destinations already holding a queued copy.
    queued: HashSet<ObjectHandle>,
}

impl<'a> MigrationPlan<'a> {
    fn new(
        tenant_id: &'a str,
        source: ResourceGroup,
        destination: ResourceGroup,
        tenant_container: &str,
    ) -> Self {
        Self {
            tenant_id,
            source_table: source.table(),
            containers: ContainerPair::resolve(source, destination, tenant_container),
            batch: InsertBatch::new(destination.table(), &AttachmentRow::COLUMNS),
            tasks: Vec::new(),
            queued: HashSet::new(),
        }
    }

    /// Queue one source file for `destination_owner`: always a metadata row,
    /// and a blob copy only when the containers differ. Objects are keyed by
    /// container and filename, so each destination object is copied once even
    /// when several owners receive the same file.
    fn dispatch(
        &mut self,
        blobs: &dyn BlobStore,
        destination_owner: &str,
        filename: String,
    ) -> MigrationResult<()> {
        if self.containers.needs_copy() {
            let destination = ObjectHandle::new(self.containers.destination.as_str(), &filename);
            if self.queued.insert(destination.clone()) {
                let source = ObjectHandle::new(self.containers.source.as_str(), &filename);
                self.tasks.push(CopyTask {
                    source_url: blobs.url(&source),
                    destination,
                    filename: filename.clone(),
                });
            }
        }

        let row = AttachmentRow {
            tenant_id: self.tenant_id.to_string(),
            owner_id: destination_owner.to_string(),
            container_id: self.containers.destination.as_str().to_string(),
            filename,
        };
        self.batch.append(row.into_values())
    }

    /// Route `(owner_id, filename)` rows to the destinations paired with
    /// their owner. An owner with no pairing means the caller's id lists
    /// disagree with the stored rows.
    fn dispatch_paired(
        &mut self,
        blobs: &dyn BlobStore,
        destinations: &HashMap<&str, Vec<&str>>,
        rows: Vec<(String, String)>,
    ) -> MigrationResult<()> {
        for (owner_id, filename) in rows {
            let Some(targets) = destinations.get(owner_id.as_str()) else {
                return Err(MigrationError::DestinationMissing(owner_id));
            };
            for target in targets {
                self.dispatch(blobs, target, filename.clone())?;
            }
        }
        Ok(())
    }
}

impl MigrationService {
    pub fn new(db: Arc<SqlitePool>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { db, blobs }
    }

    /// Copy every attachment of `source` to `destination`.
    pub async fn copy_one(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        tenant_id: &str,
        source: &DocumentRef,
        destination: &DocumentRef,
        cancel: &CancellationToken,
    ) -> MigrationResult<()> {
        let mut plan = self
            .plan(tenant_id, source.group, destination.group)
            .await?;

        let sql = format!(
            "SELECT filename FROM {} WHERE tenant_id = ? AND owner_id = ? ORDER BY id",
            plan.source_table
        );
        let filenames: Vec<String> = sqlx::query_scalar(&sql)
            .bind(tenant_id)
            .bind(&source.owner_id)
            .fetch_all(&mut **tx)
            .await?;
        debug!(
            tenant = %tenant_id,
            source = %source.owner_id,
            files = filenames.len(),
            "fetched source attachments"
        );

        for filename in filenames {
            plan.dispatch(self.blobs.as_ref(), &destination.owner_id, filename)?;
        }

        self.execute(tx, plan, cancel).await?;
        info!(
            tenant = %tenant_id,
            source = %source.owner_id,
            destination = %destination.owner_id,
            "copied document attachments"
        );
        Ok(())
    }

    /// Copy the attachments of each `source_ids[i]` to `destination_ids[i]`.
    pub async fn copy_many(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        tenant_id: &str,
        request: &CopyManyRequest,
        cancel: &CancellationToken,
    ) -> MigrationResult<()> {
        if request.source_ids.len() != request.destination_ids.len() {
            return Err(MigrationError::LengthMismatch {
                sources: request.source_ids.len(),
                destinations: request.destination_ids.len(),
            });
        }

        let mut plan = self
            .plan(tenant_id, request.source_group, request.destination_group)
            .await?;
        if request.source_ids.is_empty() {
            return Ok(());
        }

        // A source listed twice fans out to each of its destinations.
        let mut destinations: HashMap<&str, Vec<&str>> = HashMap::new();
        for (source, destination) in request.source_ids.iter().zip(&request.destination_ids) {
            destinations
                .entry(source.as_str())
                .or_default()
                .push(destination.as_str());
        }

        let mut query = QueryBuilder::<Sqlite>::new(format!(
            "SELECT owner_id, filename FROM {} WHERE tenant_id = ",
            plan.source_table
        ));
        query.push_bind(tenant_id);
        // One bound parameter per distinct source id; SQLite caps a statement
        // at 32766 of them.
        query.push(" AND owner_id IN (");
        let mut ids = query.separated(", ");
        for source in destinations.keys() {
            ids.push_bind(*source);
        }
        ids.push_unseparated(") ORDER BY id");

        let rows: Vec<(String, String)> = query.build_query_as().fetch_all(&mut **tx).await?;
        debug!(
            tenant = %tenant_id,
            documents = request.source_ids.len(),
            files = rows.len(),
            "fetched source attachments"
        );

        plan.dispatch_paired(self.blobs.as_ref(), &destinations, rows)?;
        self.execute(tx, plan, cancel).await?;
        info!(
            tenant = %tenant_id,
            documents = request.source_ids.len(),
            "copied attachments for document set"
        );
        Ok(())
    }

    /// Resolve both tables and the tenant container. Nothing concurrent runs
    /// before this completes.
    async fn plan<'a>(
        &self,
        tenant_id: &'a str,
        source: ResourceGroup,
        destination: ResourceGroup,
    ) -> MigrationResult<MigrationPlan<'a>> {
        let tenant_container = tenant_container(&self.db, tenant_id).await?;
        Ok(MigrationPlan::new(tenant_id, source, destination, &tenant_container))
    }

    /// Run the copy phase and the insert phase side by side and join them.
    async fn execute(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        plan: MigrationPlan<'_>,
        cancel: &CancellationToken,
    ) -> MigrationResult<()> {
        let MigrationPlan { batch, tasks, .. } = plan;
        let copies = tasks.len();
        let rows = batch.len();
        debug!(copies, rows, "running copy and insert phases");

        let copy_phase = run_copies(self.blobs.clone(), tasks, cancel);
        let insert_phase = async move {
            if batch.is_empty() {
                return Ok(());
            }
            let (sql, args) = batch.finalize_query()?;
            let mut query = sqlx::query(&sql);
            for arg in args {
                query = query.bind(arg);
            }
            query
                .execute(&mut **tx)
                .await
                .map(|_| ())
                .map_err(MigrationError::InsertFailed)
        };

        let (copied, inserted) = tokio::join!(copy_phase, insert_phase);
        copied?;
        if let Err(err) = inserted {
            if copies > 0 {
                warn!(
                    orphaned = copies,
                    "copied objects left unreferenced after insert failure"
                );
            }
            return Err(err);
        }
        Ok(())
    }
}
