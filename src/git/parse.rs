//! Parsers from raw git listings to `Branch` records
//!
//! Both are pure: they never fail and skip records that do not have the
//! expected shape, so a partially odd listing still yields what it can.

use regex::Regex;
use std::sync::LazyLock;

use super::branch::{Branch, GONE_MARKER};

/// `for-each-ref` format producing one tab-separated record per branch:
/// short name, short upstream, upstream tracking annotation.
pub const FOR_EACH_REF_FORMAT: &str = "%(refname:short)\t%(upstream:short)\t%(upstream:track)";

// e.g. "* feature 1234abcd [origin/feature: gone] message"
// or "+ feature 1234abcd (/path/to/worktree) [origin/feature] message"
static BRANCH_VV_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[*+]?\s*(?P<branch>\S+)\s+\S+\s+(?:\([^)]*\)\s+)?\[(?P<track>[^\]]+)\]")
        .expect("branch -vv pattern is valid")
});

/// Parse `git for-each-ref --format=FOR_EACH_REF_FORMAT refs/heads` output
pub fn parse_for_each_ref(output: &str) -> Vec<Branch> {
    output
        .lines()
        .filter_map(|line| {
            let mut parts = line.splitn(3, '\t');
            let name = parts.next()?.trim();
            let upstream = parts.next()?.trim();
            let track = parts.next()?.trim();
            if name.is_empty() {
                return None;
            }
            Some(Branch::new(name, upstream, track))
        })
        .collect()
}

/// Parse the human-oriented `git branch -vv` listing.
///
/// Only branches with a bracketed tracking annotation naming an upstream are
/// returned; a branch without an upstream has nothing to be gone from.
pub fn parse_branch_vv(output: &str) -> Vec<Branch> {
    output
        .lines()
        .filter_map(|line| {
            let captures = BRANCH_VV_RE.captures(line)?;
            let name = captures.name("branch")?.as_str().trim();
            let (upstream, track) = split_vv_annotation(captures.name("track")?.as_str())?;
            Some(Branch::new(name, upstream, track))
        })
        .collect()
}

/// Split `origin/x: ahead 1` into upstream and status; `origin/x` alone is up
/// to date. git always names the upstream first, so a bracket holding only
/// status words (`[gone]`) belongs to the commit subject of an untracked branch.
fn split_vv_annotation(annotation: &str) -> Option<(&str, &str)> {
    let annotation = annotation.trim();
    let (upstream, status) = match annotation.split_once(':') {
        Some((upstream, status)) => (upstream.trim(), status.trim()),
        None if is_status_only(annotation) => return None,
        None => (annotation, ""),
    };
    if upstream.is_empty() {
        return None;
    }
    Some((upstream, status))
}

fn is_status_only(annotation: &str) -> bool {
    annotation.split(',').map(str::trim).all(|token| {
        token == GONE_MARKER || token.starts_with("ahead ") || token.starts_with("behind ")
    })
}
