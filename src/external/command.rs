//! Base command execution abstraction
//!
//! Provides the foundational trait for executing backend subcommands, enabling
//! dependency injection for testing. Nothing in here prints: all output is
//! returned structurally.

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use thiserror::Error;
use tracing::debug;

use crate::context::{Interrupt, RunContext};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub status_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status_code == 0
    }
}

#[derive(Debug, Error, Clone)]
pub enum CommandError {
    #[error("Command not found: {command}")]
    CommandNotFound { command: String },
    #[error("{command}: exit code {}: {}", .output.status_code, .output.stderr)]
    NonZeroExit {
        command: String,
        output: CommandOutput,
    },
    #[error("{command}: cancelled")]
    Cancelled { command: String },
    #[error("{command}: timed out after {timeout_ms}ms")]
    Timeout { command: String, timeout_ms: u64 },
    #[error("{command}: IO error: {message}")]
    Io { command: String, message: String },
}

impl CommandError {
    /// Structured output of a command that ran but exited non-zero
    pub fn output(&self) -> Option<&CommandOutput> {
        match self {
            CommandError::NonZeroExit { output, .. } => Some(output),
            _ => None,
        }
    }

    pub fn is_interrupted(&self) -> bool {
        matches!(
            self,
            CommandError::Cancelled { .. } | CommandError::Timeout { .. }
        )
    }

    fn interrupted(command: String, interrupt: Interrupt, ctx: &RunContext) -> Self {
        match interrupt {
            Interrupt::Cancelled => CommandError::Cancelled { command },
            Interrupt::DeadlineExceeded => CommandError::Timeout {
                command,
                timeout_ms: ctx.timeout().map(|t| t.as_millis() as u64).unwrap_or(0),
            },
        }
    }
}

/// Trait for executing backend subcommands
///
/// Implementations run the backend with `args`, never touching the process's
/// own stdout/stderr. A non-zero exit is reported as
/// `CommandError::NonZeroExit` carrying the captured output. Implementations
/// must honor `ctx` and must be safe to share across tasks.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    async fn execute(&self, ctx: &RunContext, args: &[&str]) -> Result<CommandOutput, CommandError>;
}

/// Real implementation using tokio::process::Command
#[derive(Debug, Clone)]
pub struct ProcessCommandExecutor {
    program: String,
    work_dir: Option<PathBuf>,
}

impl Default for ProcessCommandExecutor {
    fn default() -> Self {
        Self::git()
    }
}

impl ProcessCommandExecutor {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            work_dir: None,
        }
    }

    /// Executor for the `git` binary found on PATH
    pub fn git() -> Self {
        Self::new("git")
    }

    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = Some(dir.into());
        self
    }

    fn describe(&self, args: &[&str]) -> String {
        if args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, args.join(" "))
        }
    }
}

#[async_trait]
impl CommandExecutor for ProcessCommandExecutor {
    async fn execute(&self, ctx: &RunContext, args: &[&str]) -> Result<CommandOutput, CommandError> {
        let command = self.describe(args);
        if let Some(interrupt) = ctx.interrupted() {
            return Err(CommandError::interrupted(command, interrupt, ctx));
        }

        let mut cmd = tokio::process::Command::new(&self.program);
        cmd.args(args)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.work_dir {
            cmd.current_dir(dir);
        }

        debug!(command = %command, "Running backend command");

        let child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CommandError::CommandNotFound {
                    command: self.program.clone(),
                }
            } else {
                CommandError::Io {
                    command: command.clone(),
                    message: e.to_string(),
                }
            }
        })?;

        // Dropping the wait future on interrupt drops the child, which kills it.
        let output = tokio::select! {
            result = child.wait_with_output() => result.map_err(|e| CommandError::Io {
                command: command.clone(),
                message: e.to_string(),
            })?,
            interrupt = ctx.done() => {
                debug!(command = %command, ?interrupt, "Backend command interrupted");
                return Err(CommandError::interrupted(command, interrupt, ctx));
            }
        };

        let output = CommandOutput {
            status_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).trim_end_matches('\n').to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim_end_matches('\n').to_string(),
        };

        if !output.success() {
            debug!(command = %command, status = output.status_code, stderr = %output.stderr, "Backend command failed");
            return Err(CommandError::NonZeroExit { command, output });
        }

        Ok(output)
    }
}
