//! Deferring work to a later turn of the host's event loop.

use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::runtime::Handle;

use crate::error::{GhostError, GhostResult, LockResultExt};

pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Runs tasks on a later scheduler turn, never inline.
pub trait Scheduler: Send + Sync {
    fn defer(&self, task: Task);
}

/// Defers onto a tokio runtime as a spawned task.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    handle: Handle,
}

impl TokioScheduler {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Use the runtime the caller is running in.
    pub fn current() -> GhostResult<Self> {
        Handle::try_current()
            .map(Self::new)
            .map_err(|err| GhostError::scheduler(err.to_string()))
    }
}

impl Scheduler for TokioScheduler {
    fn defer(&self, task: Task) {
        self.handle.spawn(async move {
            task();
        });
    }
}

/// Queue drained explicitly by whoever owns the event loop.
#[derive(Default)]
pub struct QueueScheduler {
    pending: Mutex<VecDeque<Task>>,
}

impl std::fmt::Debug for QueueScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueScheduler")
            .field("pending", &self.pending_count())
            .finish()
    }
}

impl QueueScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending_count(&self) -> usize {
        self.pending
            .lock()
            .recover_poison("QueueScheduler::pending_count")
            .len()
    }

    /// Run every task queued before this call; returns how many ran.
    ///
    /// Tasks queued while draining wait for the next call, like a new turn.
    pub fn run_pending(&self) -> usize {
        let batch: Vec<Task> = self
            .pending
            .lock()
            .recover_poison("QueueScheduler::run_pending")
            .drain(..)
            .collect();
        let count = batch.len();
        for task in batch {
            task();
        }
        count
    }
}

impl Scheduler for QueueScheduler {
    fn defer(&self, task: Task) {
        self.pending
            .lock()
            .recover_poison("QueueScheduler::defer")
            .push_back(task);
    }
}
