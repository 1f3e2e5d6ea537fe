//! Run-scoped cancellation and deadline
//!
//! A `RunContext` is created once per invocation and cloned into every
//! backend call. Cancelling any clone interrupts all of them; the optional
//! deadline bounds the whole run (discovery plus deletion).

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

/// Why a run stopped before its work finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
    Cancelled,
    DeadlineExceeded,
}

#[derive(Debug, Clone)]
pub struct RunContext {
    cancel: Arc<watch::Sender<bool>>,
    deadline: Option<Instant>,
    timeout: Option<Duration>,
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RunContext {
    /// A context that is only interrupted by an explicit `cancel()`
    pub fn new() -> Self {
        let (cancel, _) = watch::channel(false);
        Self {
            cancel: Arc::new(cancel),
            deadline: None,
            timeout: None,
        }
    }

    /// A context that also expires `timeout` from now
    pub fn with_timeout(timeout: Duration) -> Self {
        let mut ctx = Self::new();
        ctx.deadline = Some(Instant::now() + timeout);
        ctx.timeout = Some(timeout);
        ctx
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn cancel(&self) {
        self.cancel.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }

    /// Returns the interrupt reason if the context is already done
    pub fn interrupted(&self) -> Option<Interrupt> {
        if self.is_cancelled() {
            return Some(Interrupt::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(Interrupt::DeadlineExceeded),
            _ => None,
        }
    }

    /// Resolves once the context is cancelled or its deadline passes
    pub async fn done(&self) -> Interrupt {
        let mut rx = self.cancel.subscribe();
        let cancelled = async move {
            // The sender lives as long as `self`, so this only returns on cancel.
            let _ = rx.wait_for(|cancelled| *cancelled).await;
        };

        match self.deadline {
            Some(deadline) => tokio::select! {
                _ = cancelled => Interrupt::Cancelled,
                _ = tokio::time::sleep_until(deadline) => Interrupt::DeadlineExceeded,
            },
            None => {
                cancelled.await;
                Interrupt::Cancelled
            }
        }
    }
}
