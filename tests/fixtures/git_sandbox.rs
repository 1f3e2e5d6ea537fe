/// Real git repositories in temporary directories for integration tests
use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// True when a usable `git` binary is on PATH
pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

/// A bare remote plus a working clone whose `main` tracks `origin/main`.
///
/// Both live under one temporary directory that is removed on drop.
pub struct GitSandbox {
    _root: TempDir,
    remote: PathBuf,
    work: PathBuf,
}

impl GitSandbox {
    pub fn new() -> Result<Self> {
        let root = TempDir::new()?;
        let remote = root.path().join("remote.git");
        let work = root.path().join("work");

        run_git(root.path(), &["init", "--bare", "remote.git"])?;
        run_git(&remote, &["symbolic-ref", "HEAD", "refs/heads/main"])?;

        run_git(root.path(), &["init", "work"])?;
        run_git(&work, &["symbolic-ref", "HEAD", "refs/heads/main"])?;
        run_git(&work, &["config", "user.name", "Test User"])?;
        run_git(&work, &["config", "user.email", "test@example.com"])?;
        run_git(&work, &["config", "commit.gpgsign", "false"])?;

        let sandbox = Self {
            _root: root,
            remote,
            work,
        };

        sandbox.commit_file("README.md", "# sandbox\n")?;
        let remote_url = sandbox.remote.to_string_lossy().to_string();
        sandbox.git(&["remote", "add", "origin", &remote_url])?;
        sandbox.git(&["push", "-u", "origin", "main"])?;
        sandbox.git(&["remote", "set-head", "origin", "main"])?;

        Ok(sandbox)
    }

    pub fn path(&self) -> &Path {
        &self.work
    }

    /// Run git in the working clone, failing on non-zero exit
    pub fn git(&self, args: &[&str]) -> Result<String> {
        run_git(&self.work, args)
    }

    pub fn commit_file(&self, name: &str, content: &str) -> Result<()> {
        std::fs::write(self.work.join(name), content)?;
        self.git(&["add", name])?;
        self.git(&["commit", "-m", &format!("Add {}", name)])?;
        Ok(())
    }

    /// Create `name` off main with one commit, push it with upstream tracking
    /// and return to main
    pub fn push_topic_branch(&self, name: &str) -> Result<()> {
        self.git(&["checkout", "-b", name])?;
        let file = format!("{}.txt", name.replace('/', "-"));
        self.commit_file(&file, name)?;
        self.git(&["push", "-u", "origin", name])?;
        self.git(&["checkout", "main"])?;
        Ok(())
    }

    /// Fast-forward main to `name` and publish it
    pub fn merge_into_main(&self, name: &str) -> Result<()> {
        self.git(&["merge", "--ff-only", name])?;
        self.git(&["push", "origin", "main"])?;
        Ok(())
    }

    /// Delete a branch on the remote side only, leaving the clone's
    /// remote-tracking ref stale until the next prune
    pub fn delete_on_remote(&self, name: &str) -> Result<()> {
        run_git(&self.remote, &["branch", "-D", name])?;
        Ok(())
    }

    pub fn local_branches(&self) -> Result<Vec<String>> {
        let output = self.git(&["for-each-ref", "--format=%(refname:short)", "refs/heads"])?;
        Ok(output.lines().map(str::to_string).collect())
    }
}

fn run_git(dir: &Path, args: &[&str]) -> Result<String> {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .env("GIT_TERMINAL_PROMPT", "0")
        .output()
        .with_context(|| format!("failed to run git {}", args.join(" ")))?;

    if !output.status.success() {
        bail!(
            "git {} failed: {}",
            args.join(" "),
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}
