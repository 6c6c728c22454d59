//! Cancellation tokens for in-flight requests.
//!
//! A token is bound to at most one network task at a time. Cancelling it
//! aborts that task exactly once; the awaiting caller sees
//! `request_cancelled` and never a successful result.

use crate::transport::tasks::{TaskId, TaskRegistry, WeakTaskRegistry};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use log::debug;

#[derive(Debug, Default)]
struct TokenState {
    cancelled: AtomicBool,
    task: Mutex<Option<(WeakTaskRegistry, TaskId)>>,
}

#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    state: Arc<TokenState>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel the token and abort its attached task, if any.
    ///
    /// Returns true only for the call that flipped the token.
    pub fn cancel(&self) -> bool {
        let mut task = self.lock_task();

        if self.state.cancelled.swap(true, Ordering::SeqCst) {
            return false;
        }

        if let Some((registry, id)) = task.take()
            && let Some(registry) = registry.upgrade()
        {
            registry.cancel(id);
        }

        debug!("Cancellation token cancelled");
        true
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::SeqCst)
    }

    /// Bind the token to a freshly spawned task.
    ///
    /// A token that was cancelled before the task existed aborts it right away.
    pub(crate) fn attach(&self, registry: &TaskRegistry, id: TaskId) {
        let mut task = self.lock_task();

        if self.is_cancelled() {
            registry.cancel(id);
            return;
        }

        *task = Some((registry.downgrade(), id));
    }

    /// Drop the binding once the task completed on its own.
    pub(crate) fn detach(&self, id: TaskId) {
        let mut task = self.lock_task();
        if task.as_ref().is_some_and(|(_, bound)| *bound == id) {
            *task = None;
        }
    }

    fn lock_task(&self) -> std::sync::MutexGuard<'_, Option<(WeakTaskRegistry, TaskId)>> {
        self.state.task.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
