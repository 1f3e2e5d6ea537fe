use serde::{Deserialize, Serialize};

/// Token git uses in a tracking annotation once the upstream ref is deleted
pub const GONE_MARKER: &str = "gone";

/// What `rev-parse --abbrev-ref HEAD` reports when no branch is checked out
pub const DETACHED_HEAD: &str = "HEAD";

/// A local branch and what git knows about its upstream.
///
/// `upstream` is empty when none is configured. `track` is git's raw
/// tracking annotation, e.g. `[gone]` or `ahead 1, behind 2`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    pub name: String,
    pub upstream: String,
    pub track: String,
    pub is_gone: bool,
}

impl Branch {
    pub fn new(name: impl Into<String>, upstream: impl Into<String>, track: impl Into<String>) -> Self {
        let track = track.into();
        Self {
            name: name.into(),
            upstream: upstream.into(),
            is_gone: is_gone_annotation(&track),
            track,
        }
    }
}

/// True when a tracking annotation says the upstream no longer exists.
///
/// Accepts both the `for-each-ref` form (`[gone]`) and the `branch -vv`
/// form (`origin/topic: gone`). Matching is per comma-separated token so an
/// upstream that merely contains the word is not mistaken for gone.
pub fn is_gone_annotation(track: &str) -> bool {
    let inner = track.trim().trim_start_matches('[').trim_end_matches(']');
    let status = match inner.rsplit_once(':') {
        Some((_, status)) => status,
        None => inner,
    };
    status.split(',').any(|token| token.trim() == GONE_MARKER)
}

/// Trunk-like names that are never swept
pub fn default_protected_names() -> Vec<String> {
    vec!["main".to_string(), "master".to_string(), "develop".to_string()]
}
