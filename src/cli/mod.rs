use clap::Parser;
use git_sweep::SweepConfig;

pub mod output;

#[derive(Parser, Debug)]
#[command(name = "git-sweep")]
#[command(version)]
#[command(about = "Remove local branches whose upstream branch is gone")]
#[command(long_about = "git-sweep fetches the remote with --prune, lists local branches whose upstream \
                       has been deleted and removes them. Protected branches and the current branch are \
                       never touched. Run with --dry-run first to see what would be removed.")]
pub struct Cli {
    /// Remote to prune before scanning
    #[arg(long, help = "Remote to fetch with --prune (default: origin)")]
    pub remote: Option<String>,
    /// Only consider branches matching this pattern
    #[arg(long, value_name = "REGEX", help = "Keep only candidates whose name matches REGEX")]
    pub include: Option<String>,
    /// Skip branches matching this pattern
    #[arg(long, value_name = "REGEX", help = "Drop candidates whose name matches REGEX")]
    pub exclude: Option<String>,
    /// Extra branch names to protect
    #[arg(long = "protect", value_name = "BRANCH", help = "Never delete BRANCH (repeatable)")]
    pub protect: Vec<String>,
    /// Do not protect the local branch named like the current upstream
    #[arg(long, help = "Allow deleting a local branch named like the current branch's upstream")]
    pub no_protect_upstream: bool,
    /// Machine readable output
    #[arg(long, help = "Print the plan and results as JSON on stdout")]
    pub json: bool,
    /// Delete without asking
    #[arg(short = 'y', long, help = "Skip the confirmation prompt")]
    pub yes: bool,
    /// Only show the plan
    #[arg(long, help = "Show what would be deleted without deleting anything")]
    pub dry_run: bool,
    /// Delete unmerged branches too
    #[arg(long, help = "Use 'git branch -D' so unmerged branches are deleted as well")]
    pub force: bool,
    #[arg(long, value_name = "N", help = "Maximum deletions in flight at once")]
    pub max_parallel: Option<usize>,
    #[arg(long, value_name = "SECONDS", help = "Abort the run after SECONDS (0 = no limit)")]
    pub timeout: Option<u64>,
    #[arg(long, value_name = "LEVEL", help = "Log level or filter directive (RUST_LOG wins when set)")]
    pub log_level: Option<String>,
    #[arg(long, help = "Emit logs as JSON lines on stderr")]
    pub log_json: bool,
}

impl Cli {
    /// Layer command line flags over the loaded configuration
    pub fn apply_to(&self, config: &mut SweepConfig) {
        if let Some(remote) = &self.remote {
            config.remote = remote.clone();
        }
        if let Some(max_parallel) = self.max_parallel {
            config.max_parallel = Some(max_parallel);
        }
        if let Some(timeout) = self.timeout {
            config.timeout_seconds = timeout;
        }
        if let Some(level) = &self.log_level {
            config.observability.log_level = level.clone();
        }
        if self.log_json {
            config.observability.json_logs = true;
        }
        if self.no_protect_upstream {
            config.protect_upstream = false;
        }
        config.extra_protected.extend(self.protect.iter().cloned());
    }
}
