// git-sweep library - discovery and removal of local branches whose upstream is gone
// This exposes the core components for testing and integration

pub mod config;
pub mod context;
pub mod external;
pub mod git;
pub mod sweep;
pub mod telemetry;

// Re-export key types for easy access
pub use config::SweepConfig;
pub use context::{Interrupt, RunContext};
pub use external::{CommandError, CommandExecutor, CommandOutput, ProcessCommandExecutor};
pub use git::{Branch, GitClient, GitError};
pub use sweep::{
    build_plan, execute_deletions, unmerged_candidates, DeleteError, DeletionResult, ExecuteOptions, Plan,
    PlanOptions, SweepError,
};
pub use telemetry::{create_sweep_span, generate_correlation_id, init_telemetry};
