//! Evaluation settings.

use std::num::NonZeroUsize;
use std::thread;

/// How an evaluation pass is run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvalOptions {
    workers: usize,
    queue_capacity: Option<usize>,
}

impl EvalOptions {
    /// Run with `workers` threads. Zero is accepted here and rejected by
    /// the evaluation itself.
    pub fn new(workers: usize) -> Self {
        Self {
            workers,
            queue_capacity: None,
        }
    }

    /// Bound the shared delivery queue to `capacity` nodes (at least one).
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = Some(capacity.max(1));
        self
    }

    /// Requested worker count.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Delivery queue bound; defaults to the worker count.
    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity.unwrap_or(self.workers).max(1)
    }
}

impl Default for EvalOptions {
    /// One worker per available core.
    fn default() -> Self {
        let workers = thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(1);
        Self::new(workers)
    }
}
