// Scripted command executor for testing - no subprocesses

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use super::command::{CommandError, CommandExecutor, CommandOutput};
use crate::context::RunContext;

/// Replays canned responses keyed by the joined argument list and records
/// every invocation. Unscripted commands fail with exit code 1.
#[derive(Debug, Default)]
pub struct ScriptedCommandExecutor {
    responses: HashMap<String, Result<CommandOutput, CommandError>>,
    calls: Mutex<Vec<Vec<String>>>,
    delay: Option<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedCommandExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Respond to `args` with a successful exit and the given stdout
    pub fn expect_command(mut self, args: &[&str], stdout: &str) -> Self {
        let output = CommandOutput {
            status_code: 0,
            stdout: stdout.to_string(),
            stderr: String::new(),
        };
        self.responses.insert(args.join(" "), Ok(output));
        self
    }

    /// Respond to `args` with a non-zero exit
    pub fn expect_failure(mut self, args: &[&str], status_code: i32, stderr: &str) -> Self {
        let key = args.join(" ");
        let output = CommandOutput {
            status_code,
            stdout: String::new(),
            stderr: stderr.to_string(),
        };
        let error = CommandError::NonZeroExit {
            command: format!("git {}", key),
            output,
        };
        self.responses.insert(key, Err(error));
        self
    }

    /// Respond to `args` with an arbitrary error
    pub fn expect_error(mut self, args: &[&str], error: CommandError) -> Self {
        self.responses.insert(args.join(" "), Err(error));
        self
    }

    /// Hold every call for `delay` before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }

    pub fn was_called(&self, args: &[&str]) -> bool {
        self.calls()
            .iter()
            .any(|call| call.iter().map(String::as_str).eq(args.iter().copied()))
    }

    /// Highest number of calls observed running at the same time
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CommandExecutor for ScriptedCommandExecutor {
    async fn execute(&self, ctx: &RunContext, args: &[&str]) -> Result<CommandOutput, CommandError> {
        let key = args.join(" ");
        self.calls
            .lock()
            .unwrap()
            .push(args.iter().map(|a| a.to_string()).collect());

        if ctx.is_cancelled() {
            return Err(CommandError::Cancelled {
                command: format!("git {}", key),
            });
        }

        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        self.responses.get(&key).cloned().unwrap_or_else(|| {
            Err(CommandError::NonZeroExit {
                command: format!("git {}", key),
                output: CommandOutput {
                    status_code: 1,
                    stdout: String::new(),
                    stderr: format!("unscripted command: {}", key),
                },
            })
        })
    }
}
