use std::collections::BTreeSet;

use crate::git::default_protected_names;

/// Environment variable extending the protected branch names.
/// The value is a comma- or semicolon-separated list.
pub const PROTECTED_ENV_VAR: &str = "GIT_SWEEP_PROTECTED";

/// Split a delimited list of names, trimming whitespace and dropping empty segments
pub fn protected_names_from_env(value: &str) -> Vec<String> {
    value
        .split([',', ';'])
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Names listed in `PROTECTED_ENV_VAR`; unset or non-unicode counts as empty
pub fn protected_names_from_env_var() -> Vec<String> {
    std::env::var(PROTECTED_ENV_VAR)
        .map(|value| protected_names_from_env(&value))
        .unwrap_or_default()
}

/// Deduplicated union of `base` and `extra`, ignoring empty names
pub fn merge_protected_names(base: &[String], extra: &[String]) -> Vec<String> {
    base.iter()
        .chain(extra)
        .filter(|name| !name.is_empty())
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Defaults, the environment contribution and caller extras merged into one set
pub fn resolve_protected_names(env_names: &[String], extra: &[String]) -> Vec<String> {
    let protected = merge_protected_names(&default_protected_names(), env_names);
    merge_protected_names(&protected, extra)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_protected_names_from_env() {
        assert_eq!(
            protected_names_from_env("main, develop ; hotfix/x"),
            vec!["main", "develop", "hotfix/x"]
        );
        assert!(protected_names_from_env("  ").is_empty());
        assert!(protected_names_from_env(",;, ;").is_empty());
        assert_eq!(protected_names_from_env("release;"), vec!["release"]);
    }

    #[test]
    fn test_merge_protected_names() {
        let base = vec!["main".to_string(), "master".to_string()];
        let extra = vec!["develop".to_string(), "main".to_string(), String::new()];

        let merged = merge_protected_names(&base, &extra);

        assert_eq!(merged, vec!["develop", "main", "master"]);
    }

    #[test]
    fn test_merge_is_case_sensitive() {
        let merged = merge_protected_names(&["Main".to_string()], &["main".to_string()]);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_resolve_includes_defaults() {
        let resolved = resolve_protected_names(&["release".to_string()], &["qa".to_string()]);
        assert_eq!(resolved, vec!["develop", "main", "master", "qa", "release"]);
    }

    #[test]
    #[serial]
    fn test_protected_names_from_env_var() {
        std::env::set_var(PROTECTED_ENV_VAR, "staging; prod");
        assert_eq!(protected_names_from_env_var(), vec!["staging", "prod"]);

        std::env::remove_var(PROTECTED_ENV_VAR);
        assert!(protected_names_from_env_var().is_empty());
    }
}
