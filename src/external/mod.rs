//! External tool abstractions
//!
//! This module provides the trait-based abstraction for the host `git`
//! binary, enabling testable code through dependency injection and a
//! scripted implementation.

pub mod command;
pub mod mocks;

pub use command::{CommandError, CommandExecutor, CommandOutput, ProcessCommandExecutor};
pub use mocks::ScriptedCommandExecutor;
