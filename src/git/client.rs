//! Typed git queries over a `CommandExecutor`
//!
//! Every method issues exactly one backend command (or a command and its
//! fallback) and returns parsed values. Callers never see raw argument lists.

use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use super::branch::Branch;
use super::parse::{parse_branch_vv, parse_for_each_ref, FOR_EACH_REF_FORMAT};
use crate::context::RunContext;
use crate::external::{CommandError, CommandExecutor};

/// Remote used when none is configured
pub const DEFAULT_REMOTE: &str = "origin";

#[derive(Debug, Error, Clone)]
pub enum GitError {
    #[error("Repository not found or not a git repository")]
    RepositoryNotFound,
    #[error("git {args} failed with exit code {exit_code}: {stderr}")]
    CommandFailed {
        args: String,
        exit_code: i32,
        stderr: String,
    },
    #[error("Command execution error: {source}")]
    Command {
        #[from]
        source: CommandError,
    },
    #[error("Unexpected output from git {args}: {output:?}")]
    UnexpectedOutput { args: String, output: String },
}

/// Resolve a possibly blank remote name to the one actually used
pub fn effective_remote(remote: &str) -> &str {
    let remote = remote.trim();
    if remote.is_empty() {
        DEFAULT_REMOTE
    } else {
        remote
    }
}

/// Git client backed by any `CommandExecutor`. Cheap to clone.
#[derive(Clone)]
pub struct GitClient {
    executor: Arc<dyn CommandExecutor>,
}

impl GitClient {
    pub fn new(executor: Arc<dyn CommandExecutor>) -> Self {
        Self { executor }
    }

    async fn execute_git_command(&self, ctx: &RunContext, args: &[&str]) -> Result<String, GitError> {
        match self.executor.execute(ctx, args).await {
            Ok(output) => Ok(output.stdout),
            Err(CommandError::NonZeroExit { output, .. }) => {
                Err(self.classify_git_error(&output.stderr, output.status_code, args))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn execute_trimmed(&self, ctx: &RunContext, args: &[&str]) -> Result<String, GitError> {
        Ok(self.execute_git_command(ctx, args).await?.trim().to_string())
    }

    fn classify_git_error(&self, stderr: &str, exit_code: i32, args: &[&str]) -> GitError {
        if stderr.contains("not a git repository") {
            GitError::RepositoryNotFound
        } else {
            GitError::CommandFailed {
                args: args.join(" "),
                exit_code,
                stderr: stderr.trim().to_string(),
            }
        }
    }

    /// Output of `git --version`
    pub async fn version(&self, ctx: &RunContext) -> Result<String, GitError> {
        self.execute_trimmed(ctx, &["--version"]).await
    }

    pub async fn is_inside_work_tree(&self, ctx: &RunContext) -> Result<bool, GitError> {
        let args = ["rev-parse", "--is-inside-work-tree"];
        let output = self.execute_trimmed(ctx, &args).await?;
        match output.to_lowercase().as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(GitError::UnexpectedOutput {
                args: args.join(" "),
                output,
            }),
        }
    }

    /// Absolute path of the repository's top-level directory
    pub async fn repo_root(&self, ctx: &RunContext) -> Result<String, GitError> {
        self.execute_trimmed(ctx, &["rev-parse", "--show-toplevel"]).await
    }

    /// `git fetch --prune <remote>`, refreshing which upstreams are gone
    pub async fn fetch_prune(&self, ctx: &RunContext, remote: &str) -> Result<(), GitError> {
        self.execute_git_command(ctx, &["fetch", "--prune", effective_remote(remote)])
            .await?;
        Ok(())
    }

    /// All local branches with upstream and tracking status.
    ///
    /// Prefers the structured `for-each-ref` listing; when it yields nothing
    /// usable, falls back to parsing `branch -vv`.
    pub async fn list_local_branches(&self, ctx: &RunContext) -> Result<Vec<Branch>, GitError> {
        let format = format!("--format={}", FOR_EACH_REF_FORMAT);
        match self
            .execute_git_command(ctx, &["for-each-ref", &format, "refs/heads"])
            .await
        {
            Ok(output) if !output.trim().is_empty() => return Ok(parse_for_each_ref(&output)),
            Ok(_) => debug!("for-each-ref returned no branches, falling back to branch -vv"),
            Err(GitError::Command { source }) if source.is_interrupted() => {
                return Err(GitError::Command { source })
            }
            Err(e) => debug!(error = %e, "for-each-ref failed, falling back to branch -vv"),
        }

        let output = self.execute_git_command(ctx, &["branch", "-vv"]).await?;
        Ok(parse_branch_vv(&output))
    }

    /// Short name of the checked-out branch, or `DETACHED_HEAD`
    pub async fn current_branch(&self, ctx: &RunContext) -> Result<String, GitError> {
        match self
            .execute_trimmed(ctx, &["rev-parse", "--abbrev-ref", "HEAD"])
            .await
        {
            Ok(branch) => Ok(branch),
            // An unborn branch has no HEAD commit yet but still has a name
            Err(first @ GitError::CommandFailed { .. }) => self
                .execute_trimmed(ctx, &["symbolic-ref", "--short", "HEAD"])
                .await
                .map_err(|_| first),
            Err(e) => Err(e),
        }
    }

    /// Short upstream of `branch` (e.g. `origin/main`), empty when none is configured
    pub async fn branch_upstream(&self, ctx: &RunContext, branch: &str) -> Result<String, GitError> {
        let spec = format!("{}@{{upstream}}", branch);
        match self
            .execute_trimmed(ctx, &["rev-parse", "--abbrev-ref", "--symbolic-full-name", &spec])
            .await
        {
            Ok(upstream) => Ok(upstream),
            Err(GitError::CommandFailed { .. }) => Ok(String::new()),
            Err(e) => Err(e),
        }
    }

    /// The remote's default branch such as `origin/main`, if the remote HEAD is known
    pub async fn remote_default_ref(&self, ctx: &RunContext, remote: &str) -> Result<Option<String>, GitError> {
        let head = format!("refs/remotes/{}/HEAD", effective_remote(remote));
        match self.execute_trimmed(ctx, &["symbolic-ref", &head]).await {
            Ok(full) => Ok(full.strip_prefix("refs/remotes/").map(str::to_string)),
            Err(GitError::CommandFailed { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Whether `ancestor` is reachable from `descendant`
    pub async fn is_ancestor(&self, ctx: &RunContext, ancestor: &str, descendant: &str) -> Result<bool, GitError> {
        match self
            .execute_git_command(ctx, &["merge-base", "--is-ancestor", ancestor, descendant])
            .await
        {
            Ok(_) => Ok(true),
            Err(GitError::CommandFailed { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Delete a local branch, with `-D` when `force` is set and `-d` otherwise
    pub async fn delete_branch(&self, ctx: &RunContext, branch: &str, force: bool) -> Result<(), GitError> {
        let flag = if force { "-D" } else { "-d" };
        self.execute_git_command(ctx, &["branch", flag, branch]).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::ScriptedCommandExecutor;

    fn client(executor: ScriptedCommandExecutor) -> (GitClient, Arc<ScriptedCommandExecutor>) {
        let executor = Arc::new(executor);
        (GitClient::new(executor.clone()), executor)
    }

    const FOR_EACH_REF: [&str; 3] = [
        "for-each-ref",
        "--format=%(refname:short)\t%(upstream:short)\t%(upstream:track)",
        "refs/heads",
    ];

    #[test]
    fn test_effective_remote() {
        assert_eq!(effective_remote(""), "origin");
        assert_eq!(effective_remote("  "), "origin");
        assert_eq!(effective_remote("upstream"), "upstream");
    }

    #[tokio::test]
    async fn test_list_local_branches_prefers_for_each_ref() {
        let (git, executor) = client(
            ScriptedCommandExecutor::new()
                .expect_command(&FOR_EACH_REF, "main\torigin/main\t\nold\torigin/old\t[gone]"),
        );

        let branches = git.list_local_branches(&RunContext::new()).await.unwrap();

        assert_eq!(branches.len(), 2);
        assert!(branches[1].is_gone);
        assert!(!executor.was_called(&["branch", "-vv"]));
    }

    #[tokio::test]
    async fn test_list_local_branches_falls_back_to_branch_vv() {
        let (git, executor) = client(
            ScriptedCommandExecutor::new()
                .expect_command(&FOR_EACH_REF, "")
                .expect_command(&["branch", "-vv"], "  old 1234abc [origin/old: gone] msg"),
        );

        let branches = git.list_local_branches(&RunContext::new()).await.unwrap();

        assert_eq!(branches, vec![Branch::new("old", "origin/old", "gone")]);
        assert!(executor.was_called(&["branch", "-vv"]));
    }

    #[tokio::test]
    async fn test_list_local_branches_fails_when_both_queries_fail() {
        let (git, _) = client(
            ScriptedCommandExecutor::new()
                .expect_failure(&FOR_EACH_REF, 129, "usage")
                .expect_failure(&["branch", "-vv"], 128, "fatal: broken"),
        );

        let err = git.list_local_branches(&RunContext::new()).await.unwrap_err();

        assert!(matches!(err, GitError::CommandFailed { exit_code: 128, .. }));
        assert!(err.to_string().contains("branch -vv"));
    }

    #[tokio::test]
    async fn test_is_inside_work_tree_outside_repository() {
        let (git, _) = client(ScriptedCommandExecutor::new().expect_failure(
            &["rev-parse", "--is-inside-work-tree"],
            128,
            "fatal: not a git repository (or any of the parent directories): .git",
        ));

        let err = git.is_inside_work_tree(&RunContext::new()).await.unwrap_err();
        assert!(matches!(err, GitError::RepositoryNotFound));
    }

    #[tokio::test]
    async fn test_is_inside_work_tree_unexpected_output() {
        let (git, _) = client(
            ScriptedCommandExecutor::new().expect_command(&["rev-parse", "--is-inside-work-tree"], "maybe"),
        );

        let err = git.is_inside_work_tree(&RunContext::new()).await.unwrap_err();
        assert!(matches!(err, GitError::UnexpectedOutput { .. }));
    }

    #[tokio::test]
    async fn test_current_branch_falls_back_for_unborn_branch() {
        let (git, _) = client(
            ScriptedCommandExecutor::new()
                .expect_failure(&["rev-parse", "--abbrev-ref", "HEAD"], 128, "ambiguous argument 'HEAD'")
                .expect_command(&["symbolic-ref", "--short", "HEAD"], "main"),
        );

        assert_eq!(git.current_branch(&RunContext::new()).await.unwrap(), "main");
    }

    #[tokio::test]
    async fn test_branch_upstream_missing_is_empty() {
        let (git, _) = client(ScriptedCommandExecutor::new().expect_failure(
            &["rev-parse", "--abbrev-ref", "--symbolic-full-name", "topic@{upstream}"],
            128,
            "fatal: no upstream configured for branch 'topic'",
        ));

        assert_eq!(git.branch_upstream(&RunContext::new(), "topic").await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_branch_upstream_propagates_cancellation() {
        let (git, _) = client(ScriptedCommandExecutor::new());
        let ctx = RunContext::new();
        ctx.cancel();

        let err = git.branch_upstream(&ctx, "topic").await.unwrap_err();
        assert!(matches!(err, GitError::Command { source: CommandError::Cancelled { .. } }));
    }

    #[tokio::test]
    async fn test_remote_default_ref_strips_prefix() {
        let (git, _) = client(
            ScriptedCommandExecutor::new()
                .expect_command(&["symbolic-ref", "refs/remotes/origin/HEAD"], "refs/remotes/origin/main"),
        );

        let default_ref = git.remote_default_ref(&RunContext::new(), "").await.unwrap();
        assert_eq!(default_ref.as_deref(), Some("origin/main"));
    }

    #[tokio::test]
    async fn test_remote_default_ref_unset() {
        let (git, _) = client(ScriptedCommandExecutor::new());

        let default_ref = git.remote_default_ref(&RunContext::new(), "upstream").await.unwrap();
        assert_eq!(default_ref, None);
    }

    #[tokio::test]
    async fn test_is_ancestor() {
        let (git, _) = client(
            ScriptedCommandExecutor::new()
                .expect_command(&["merge-base", "--is-ancestor", "feat/a", "origin/main"], "")
                .expect_failure(&["merge-base", "--is-ancestor", "feat/b", "origin/main"], 1, ""),
        );
        let ctx = RunContext::new();

        assert!(git.is_ancestor(&ctx, "feat/a", "origin/main").await.unwrap());
        assert!(!git.is_ancestor(&ctx, "feat/b", "origin/main").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_branch_flags() {
        let (git, executor) = client(
            ScriptedCommandExecutor::new()
                .expect_command(&["branch", "-d", "merged"], "Deleted branch merged")
                .expect_command(&["branch", "-D", "unmerged"], "Deleted branch unmerged"),
        );
        let ctx = RunContext::new();

        git.delete_branch(&ctx, "merged", false).await.unwrap();
        git.delete_branch(&ctx, "unmerged", true).await.unwrap();

        assert_eq!(
            executor.calls(),
            vec![
                vec!["branch".to_string(), "-d".to_string(), "merged".to_string()],
                vec!["branch".to_string(), "-D".to_string(), "unmerged".to_string()],
            ]
        );
    }
}
