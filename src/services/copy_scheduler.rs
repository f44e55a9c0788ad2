//! Bounded, fail-fast fan-out of blob copies.
//!
//! Copies run as tokio tasks in a `JoinSet`, at most [`concurrency_for`] at a
//! time. The first failure cancels the shared token, aborts everything still
//! in flight and is returned as the single representative error; tasks that
//! were never spawned are never attempted.

use super::blob_store::{BlobStore, ObjectHandle};
use crate::errors::{MigrationError, MigrationResult};
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

const TASKS_PER_WORKER: usize = 4;
const MAX_WORKERS: usize = 16;

/// One object to duplicate. Lives only for the duration of a migration call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CopyTask {
    pub source_url: String,
    pub destination: ObjectHandle,
    pub filename: String,
}

/// Worker count for a batch: `min(ceil(n / 4), 16)`.
pub fn concurrency_for(task_count: usize) -> usize {
    task_count.div_ceil(TASKS_PER_WORKER).min(MAX_WORKERS)
}

/// Run every copy in `tasks`, stopping at the first failure.
///
/// `cancel` belongs to the caller; cancelling it stops the phase with
/// `MigrationError::Cancelled`. Dropping the returned future aborts all
/// in-flight copies.
pub async fn run_copies(
    store: Arc<dyn BlobStore>,
    tasks: Vec<CopyTask>,
    cancel: &CancellationToken,
) -> MigrationResult<()> {
    if tasks.is_empty() {
        return Ok(());
    }

    let limit = concurrency_for(tasks.len());
    let total = tasks.len();
    debug!(tasks = total, workers = limit, "starting copy phase");

    let phase = cancel.child_token();
    let mut pending = tasks.into_iter();
    let mut in_flight: JoinSet<MigrationResult<()>> = JoinSet::new();
    let mut completed = 0usize;

    loop {
        while in_flight.len() < limit && !phase.is_cancelled() {
            let Some(task) = pending.next() else { break };
            let store = store.clone();
            let phase = phase.clone();
            in_flight.spawn(async move {
                tokio::select! {
                    biased;
                    _ = phase.cancelled() => Err(MigrationError::Cancelled),
                    res = store.copy_from_url(&task.destination, &task.source_url) => {
                        res.map_err(|source| MigrationError::CopyFailed {
                            filename: task.filename,
                            source,
                        })
                    }
                }
            });
        }

        let Some(joined) = in_flight.join_next().await else {
            break;
        };
        let failure = match joined {
            Ok(Ok(())) => {
                completed += 1;
                continue;
            }
            Ok(Err(err)) => err,
            Err(join_err) => MigrationError::CopyAborted(join_err.to_string()),
        };

        phase.cancel();
        in_flight.abort_all();
        warn!(
            completed,
            total,
            error = %failure,
            "copy phase stopped at first failure"
        );
        return Err(failure);
    }

    if completed < total {
        // Caller cancelled before every task could be spawned.
        return Err(MigrationError::Cancelled);
    }

    debug!(copied = completed, "copy phase finished");
    Ok(())
}
