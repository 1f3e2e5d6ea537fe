//! Git operations module
//!
//! Typed access to the local repository through the `git` binary: the branch
//! entity, the listing parsers, and the client that issues the queries.

pub mod branch;
pub mod client;
pub mod parse;

pub use branch::{default_protected_names, is_gone_annotation, Branch, DETACHED_HEAD, GONE_MARKER};
pub use client::{effective_remote, GitClient, GitError, DEFAULT_REMOTE};
pub use parse::{parse_branch_vv, parse_for_each_ref};
