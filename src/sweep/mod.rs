//! Sweep pipeline
//!
//! Discovery, protection and filtering produce an immutable `Plan`; the
//! executor then deletes its candidates with bounded parallelism.

pub mod error;
pub mod execute;
pub mod filter;
pub mod plan;
pub mod protect;

pub use error::SweepError;
pub use execute::{default_max_parallel, execute_deletions, DeleteError, DeletionResult, ExecuteOptions};
pub use filter::{select_branches_to_delete, FilterOptions};
pub use plan::{build_plan, unmerged_candidates, Plan, PlanOptions};
pub use protect::{
    merge_protected_names, protected_names_from_env, protected_names_from_env_var, resolve_protected_names,
    PROTECTED_ENV_VAR,
};
