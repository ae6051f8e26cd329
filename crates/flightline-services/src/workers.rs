//! Worker dispatch — how accepted connections become workers.
//!
//! The faithful strategy spawns a task per connection with no admission
//! limit. The bounded strategy is the hardened variant: a semaphore permit
//! per live worker, so switching is a config change rather than a rewrite.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerPolicy {
    /// Spawn per connection, no limit.
    Unbounded,
    /// At most this many connection workers at once.
    Bounded(usize),
}

impl WorkerPolicy {
    /// Map the `max_connections` config knob onto a policy. 0 = unbounded.
    pub fn from_limit(max_connections: u32) -> Self {
        match max_connections {
            0 => WorkerPolicy::Unbounded,
            n => WorkerPolicy::Bounded(n as usize),
        }
    }
}

/// Admission gate handed to each listener. Cloned into accept loops.
#[derive(Clone)]
pub struct WorkerGate {
    permits: Option<Arc<Semaphore>>,
}

impl WorkerGate {
    pub fn new(policy: WorkerPolicy) -> Self {
        let permits = match policy {
            WorkerPolicy::Unbounded => None,
            WorkerPolicy::Bounded(n) => Some(Arc::new(Semaphore::new(n))),
        };
        Self { permits }
    }

    /// Wait for a worker slot. The returned permit, if any, must live as
    /// long as the worker; dropping it frees the slot.
    pub async fn admit(&self) -> Option<OwnedSemaphorePermit> {
        let permits = self.permits.as_ref()?;
        match permits.clone().acquire_owned().await {
            Ok(permit) => Some(permit),
            // the semaphore is never closed
            Err(_) => None,
        }
    }
}
