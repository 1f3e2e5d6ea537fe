use regex::Regex;
use std::collections::HashSet;

use super::error::SweepError;
use crate::git::Branch;

/// Controls how branches are selected for deletion.
///
/// Include/exclude are optional regular expressions over the branch name.
/// `protected_names` are exact, case-sensitive names that are never selected.
#[derive(Debug, Clone, Default)]
pub struct FilterOptions {
    pub include_pattern: Option<String>,
    pub exclude_pattern: Option<String>,
    pub protected_names: Vec<String>,
    pub protect_current: bool,
    pub protect_upstream: bool,
}

fn compile(kind: &'static str, pattern: Option<&str>) -> Result<Option<Regex>, SweepError> {
    match pattern {
        None | Some("") => Ok(None),
        Some(pattern) => Regex::new(pattern)
            .map(Some)
            .map_err(|source| SweepError::InvalidPattern {
                kind,
                pattern: pattern.to_string(),
                source,
            }),
    }
}

/// Gone branches that survive protection and the include/exclude patterns,
/// sorted by name.
///
/// Rules apply in order: not gone, protected, include miss, exclude hit.
pub fn select_branches_to_delete(
    branches: &[Branch],
    current: &str,
    current_upstream: &str,
    opts: &FilterOptions,
) -> Result<Vec<Branch>, SweepError> {
    let include = compile("include", opts.include_pattern.as_deref())?;
    let exclude = compile("exclude", opts.exclude_pattern.as_deref())?;

    let mut protected: HashSet<&str> = opts.protected_names.iter().map(String::as_str).collect();
    if opts.protect_current && !current.is_empty() {
        protected.insert(current);
    }
    if opts.protect_upstream && !current_upstream.is_empty() {
        protected.insert(current_upstream);
    }

    let mut selected: Vec<Branch> = branches
        .iter()
        .filter(|b| b.is_gone)
        .filter(|b| !protected.contains(b.name.as_str()))
        .filter(|b| include.as_ref().map_or(true, |re| re.is_match(&b.name)))
        .filter(|b| !exclude.as_ref().is_some_and(|re| re.is_match(&b.name)))
        .cloned()
        .collect();

    selected.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(selected)
}
