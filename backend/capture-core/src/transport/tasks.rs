//! Registry of in-flight network tasks.
//!
//! Each dispatched request runs as a spawned tokio task. The registry keeps an
//! abort handle per task so a cancellation token can stop the exact request it
//! was attached to, and counts how many tasks were cancelled that way.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use log::trace;
use tokio::task::{AbortHandle, JoinError, JoinHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

#[derive(Debug, Default)]
struct RegistryInner {
    next_id: AtomicU64,
    handles: Mutex<HashMap<TaskId, AbortHandle>>,
    cancelled: AtomicUsize,
}

#[derive(Debug, Clone, Default)]
pub struct TaskRegistry {
    inner: Arc<RegistryInner>,
}

/// Non-owning reference held by cancellation tokens.
#[derive(Debug, Clone)]
pub struct WeakTaskRegistry {
    inner: Weak<RegistryInner>,
}

impl WeakTaskRegistry {
    pub fn upgrade(&self) -> Option<TaskRegistry> {
        self.inner.upgrade().map(|inner| TaskRegistry { inner })
    }
}

/// A spawned task still tracked by its registry.
pub struct RegisteredTask<T> {
    id: TaskId,
    handle: JoinHandle<T>,
    registry: TaskRegistry,
}

impl<T> RegisteredTask<T> {
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Wait for the task and drop its registry entry.
    pub async fn join(self) -> Result<T, JoinError> {
        let result = self.handle.await;
        self.registry.finish(self.id);
        result
    }
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn downgrade(&self) -> WeakTaskRegistry {
        WeakTaskRegistry {
            inner: Arc::downgrade(&self.inner),
        }
    }

    pub fn spawn<F>(&self, future: F) -> RegisteredTask<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let id = TaskId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let handle = tokio::spawn(future);

        self.lock_handles().insert(id, handle.abort_handle());
        trace!("Registered network task {id:?}");

        RegisteredTask {
            id,
            handle,
            registry: self.clone(),
        }
    }

    /// Abort a tracked task. Returns false if it already finished or was
    /// cancelled before.
    pub fn cancel(&self, id: TaskId) -> bool {
        let Some(handle) = self.lock_handles().remove(&id) else {
            return false;
        };

        handle.abort();
        self.inner.cancelled.fetch_add(1, Ordering::SeqCst);
        trace!("Cancelled network task {id:?}");
        true
    }

    /// Number of tasks stopped through [`TaskRegistry::cancel`].
    pub fn cancelled_count(&self) -> usize {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    pub fn in_flight(&self) -> usize {
        self.lock_handles().len()
    }

    fn finish(&self, id: TaskId) {
        self.lock_handles().remove(&id);
    }

    fn lock_handles(&self) -> std::sync::MutexGuard<'_, HashMap<TaskId, AbortHandle>> {
        self.inner
            .handles
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
