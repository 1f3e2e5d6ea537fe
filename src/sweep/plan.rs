use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::error::SweepError;
use super::filter::{select_branches_to_delete, FilterOptions};
use super::protect::{protected_names_from_env_var, resolve_protected_names};
use crate::context::RunContext;
use crate::git::{effective_remote, Branch, GitClient, GitError};

/// Controls how a plan selects branches. Deletion itself is not performed here.
///
/// The current branch is always protected; `protect_upstream` additionally
/// protects a local branch named like the current branch's upstream.
#[derive(Debug, Clone, Default)]
pub struct PlanOptions {
    /// Remote to prune; blank means `origin`
    pub remote: String,
    pub include_pattern: Option<String>,
    pub exclude_pattern: Option<String>,
    /// Names protected on top of the defaults and `GIT_SWEEP_PROTECTED`
    pub extra_protected: Vec<String>,
    /// Protect a local branch named exactly like the current upstream.
    ///
    /// There is no matching flag for the current branch: a plan never lists
    /// it, so `build_plan` always filters with `protect_current` set.
    pub protect_upstream: bool,
}

/// Snapshot of one discovery pass: what would be deleted and in which repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub repo_root: String,
    pub remote: String,
    pub current_branch: String,
    pub current_upstream: String,
    pub candidates: Vec<Branch>,
}

/// Discover gone branches and filter them according to `opts` and the
/// protection policy.
///
/// Steps run strictly in sequence and any failure aborts the plan:
/// work-tree check, repo root, fetch-prune, branch listing, current branch
/// and upstream, protection, filtering.
pub async fn build_plan(git: &GitClient, ctx: &RunContext, opts: &PlanOptions) -> Result<Plan, SweepError> {
    match git.is_inside_work_tree(ctx).await {
        Ok(true) => {}
        Ok(false) | Err(GitError::RepositoryNotFound) => return Err(SweepError::NotAWorkTree),
        Err(e) => return Err(SweepError::git("rev-parse --is-inside-work-tree")(e)),
    }

    let repo_root = git
        .repo_root(ctx)
        .await
        .map_err(SweepError::git("rev-parse --show-toplevel"))?;

    let remote = effective_remote(&opts.remote).to_string();
    info!(repo_root = %repo_root, remote = %remote, "Pruning remote-tracking refs");
    git.fetch_prune(ctx, &remote)
        .await
        .map_err(SweepError::git("fetch --prune"))?;

    let branches = git
        .list_local_branches(ctx)
        .await
        .map_err(SweepError::git("list local branches"))?;

    let current_branch = git
        .current_branch(ctx)
        .await
        .map_err(SweepError::git("resolve current branch"))?;
    let current_upstream = git
        .branch_upstream(ctx, &current_branch)
        .await
        .map_err(SweepError::git("resolve current upstream"))?;

    let protected_names = resolve_protected_names(&protected_names_from_env_var(), &opts.extra_protected);
    debug!(
        branches = branches.len(),
        current_branch = %current_branch,
        current_upstream = %current_upstream,
        protected = ?protected_names,
        "Discovered local branches"
    );

    let candidates = select_branches_to_delete(
        &branches,
        &current_branch,
        &current_upstream,
        &FilterOptions {
            include_pattern: opts.include_pattern.clone(),
            exclude_pattern: opts.exclude_pattern.clone(),
            protected_names,
            protect_current: true,
            protect_upstream: opts.protect_upstream,
        },
    )?;

    info!(candidates = candidates.len(), "Plan built");

    Ok(Plan {
        repo_root,
        remote,
        current_branch,
        current_upstream,
        candidates,
    })
}

/// Candidates that are not merged into the remote's default branch, in plan order.
///
/// These are the ones a non-force delete may refuse. When the remote has no
/// known default branch nothing can be said and the result is empty.
pub async fn unmerged_candidates(git: &GitClient, ctx: &RunContext, plan: &Plan) -> Result<Vec<String>, SweepError> {
    let Some(default_ref) = git
        .remote_default_ref(ctx, &plan.remote)
        .await
        .map_err(SweepError::git("resolve remote default branch"))?
    else {
        debug!(remote = %plan.remote, "Remote has no default branch, skipping merge check");
        return Ok(Vec::new());
    };

    let mut unmerged = Vec::new();
    for branch in &plan.candidates {
        let merged = git
            .is_ancestor(ctx, &branch.name, &default_ref)
            .await
            .map_err(SweepError::git("merge-base --is-ancestor"))?;
        if !merged {
            unmerged.push(branch.name.clone());
        }
    }
    Ok(unmerged)
}
