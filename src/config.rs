use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Configuration files looked up in the working directory, lowest precedence first
pub const CONFIG_FILES: [&str; 2] = ["git-sweep.toml", ".git-sweep.toml"];

/// Main configuration structure for git-sweep
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SweepConfig {
    /// Remote to prune and compare against
    pub remote: String,
    /// Deletions allowed in flight at once (unset picks a CPU-based default)
    pub max_parallel: Option<usize>,
    /// Bound on the whole run in seconds (0 = unlimited)
    pub timeout_seconds: u64,
    /// Branch names protected in addition to the defaults and GIT_SWEEP_PROTECTED
    pub extra_protected: Vec<String>,
    /// Also protect a local branch named like the current branch's upstream
    pub protect_upstream: bool,
    /// Logging settings
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level or `EnvFilter` directive, used when RUST_LOG is unset
    pub log_level: String,
    /// Emit logs as JSON lines
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            json_logs: false,
        }
    }
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            remote: crate::git::DEFAULT_REMOTE.to_string(),
            max_parallel: None,
            timeout_seconds: 60,
            extra_protected: Vec::new(),
            protect_upstream: true,
            observability: ObservabilityConfig::default(),
        }
    }
}

impl SweepConfig {
    /// Load configuration with precedence:
    /// 1. Default values
    /// 2. Configuration files (git-sweep.toml, .git-sweep.toml)
    /// 3. Environment variables (prefixed with GIT_SWEEP_, `__` for nesting)
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("."))
    }

    /// Same as `load`, looking for configuration files in `dir`
    pub fn load_from(dir: &Path) -> Result<Self> {
        let mut builder = Config::builder();

        for name in CONFIG_FILES {
            let path = dir.join(name);
            if path.exists() {
                builder = builder.add_source(File::from(path));
            }
        }

        // GIT_SWEEP_PROTECTED maps to an unknown key and is read by the protection policy instead
        builder = builder.add_source(
            Environment::with_prefix("GIT_SWEEP")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("extra_protected")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to read configuration")?;
        config
            .try_deserialize()
            .context("Failed to parse configuration")
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::debug!("Loaded environment variables from .env file");
        }
        Ok(())
    }

    /// The run's time bound, `None` when unlimited
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_seconds > 0).then(|| Duration::from_secs(self.timeout_seconds))
    }
}
