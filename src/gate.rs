//! Bounds the number of simultaneous in-flight transfers, independent of how
//! many work items exist. One gate is shared by both phases of a run.

use crate::config::MAX_CONCURRENCY;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

pub struct ConcurrencyGate {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

impl ConcurrencyGate {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.clamp(1, MAX_CONCURRENCY);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Suspend until a slot is free. The slot is returned when the permit is
    /// dropped; waiters are woken in FIFO order.
    pub async fn acquire(&self) -> OwnedSemaphorePermit {
        // The semaphore is never closed while the gate is alive.
        self.semaphore
            .clone()
            .acquire_owned()
            .await
            .expect("gate semaphore closed")
    }

    /// Number of currently free slots. Test/diagnostic hook.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}
