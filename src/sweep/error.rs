use thiserror::Error;

use crate::git::GitError;

#[derive(Debug, Error)]
pub enum SweepError {
    #[error("not inside a git work tree")]
    NotAWorkTree,
    #[error("invalid {kind} pattern {pattern:?}: {source}")]
    InvalidPattern {
        kind: &'static str,
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("{operation} failed: {source}")]
    Git {
        operation: &'static str,
        #[source]
        source: GitError,
    },
}

impl SweepError {
    pub(crate) fn git(operation: &'static str) -> impl FnOnce(GitError) -> SweepError {
        move |source| SweepError::Git { operation, source }
    }
}
