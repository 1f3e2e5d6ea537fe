use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, Semaphore};
use tracing::{debug, info, warn};

use super::error::SweepError;
use super::plan::Plan;
use crate::context::RunContext;
use crate::git::{GitClient, GitError};

/// Controls how deletion is performed
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecuteOptions {
    /// Upper bound on deletions in flight; `0` picks a default from the CPU count
    pub max_parallel: usize,
    /// Use `git branch -D` instead of `-d` for the whole batch
    pub force_delete: bool,
}

/// Why one branch was not deleted
#[derive(Debug, Error)]
pub enum DeleteError {
    #[error("refusing to delete current branch")]
    CurrentBranch,
    #[error("delete failed: {0}")]
    Git(#[source] GitError),
    /// The deletion task panicked or was cancelled before reporting
    #[error("delete aborted: {reason}")]
    Aborted { reason: String },
}

/// Per-branch deletion outcomes.
///
/// `deleted` is in completion order, which differs between runs.
#[derive(Debug, Default, Serialize)]
pub struct DeletionResult {
    pub deleted: Vec<String>,
    #[serde(serialize_with = "serialize_failures")]
    pub failed: BTreeMap<String, DeleteError>,
}

impl DeletionResult {
    /// True when branches were attempted and none of them were deleted
    pub fn all_failed(&self) -> bool {
        self.deleted.is_empty() && !self.failed.is_empty()
    }
}

fn serialize_failures<S: Serializer>(failed: &BTreeMap<String, DeleteError>, serializer: S) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(failed.len()))?;
    for (name, error) in failed {
        map.serialize_entry(name, &error.to_string())?;
    }
    map.end()
}

/// Default parallelism: one deletion per available CPU, never fewer than two
pub fn default_max_parallel() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .max(2)
}

/// Delete the plan's candidates with bounded parallelism.
///
/// The current branch is never attempted and is recorded as failed. Every
/// other candidate is deleted independently: one failure never stops the
/// rest, and the call returns only once all deletions have finished.
pub async fn execute_deletions(
    git: &GitClient,
    ctx: &RunContext,
    plan: &Plan,
    opts: ExecuteOptions,
) -> Result<DeletionResult, SweepError> {
    let max_parallel = if opts.max_parallel == 0 {
        default_max_parallel()
    } else {
        opts.max_parallel
    };

    if plan.candidates.is_empty() {
        return Ok(DeletionResult::default());
    }

    info!(
        candidates = plan.candidates.len(),
        max_parallel,
        force = opts.force_delete,
        "Deleting branches"
    );

    let result = Arc::new(Mutex::new(DeletionResult::default()));
    let semaphore = Arc::new(Semaphore::new(max_parallel));
    let mut handles = Vec::with_capacity(plan.candidates.len());

    for branch in &plan.candidates {
        let name = branch.name.clone();
        if name == plan.current_branch {
            warn!(branch = %name, "Refusing to delete current branch");
            result.lock().await.failed.insert(name, DeleteError::CurrentBranch);
            continue;
        }

        let git = git.clone();
        let ctx = ctx.clone();
        let sem = semaphore.clone();
        let result = result.clone();
        let force = opts.force_delete;
        let task_name = name.clone();

        let handle = tokio::spawn(async move {
            let _permit = sem.acquire().await.ok();
            let outcome = git.delete_branch(&ctx, &task_name, force).await.map_err(DeleteError::Git);

            let mut result = result.lock().await;
            match outcome {
                Ok(()) => {
                    debug!(branch = %task_name, "Deleted branch");
                    result.deleted.push(task_name);
                }
                Err(e) => {
                    warn!(branch = %task_name, error = %e, "Failed to delete branch");
                    result.failed.insert(task_name, e);
                }
            }
        });
        handles.push((name, handle));
    }

    let joined = futures::future::join_all(handles.into_iter().map(|(name, handle)| async move {
        (name, handle.await)
    }))
    .await;

    let mut result = result.lock().await;
    for (name, join) in joined {
        if let Err(e) = join {
            warn!(branch = %name, error = %e, "Deletion task did not complete");
            result.failed.insert(
                name,
                DeleteError::Aborted {
                    reason: e.to_string(),
                },
            );
        }
    }

    info!(
        deleted = result.deleted.len(),
        failed = result.failed.len(),
        "Deletion finished"
    );
    Ok(std::mem::take(&mut *result))
}
