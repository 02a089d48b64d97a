//! Bounded worker pool.
//!
//! A [`WorkerPool`] admits at most `max_concurrency` calls at a time. Each
//! admitted call holds a [`Worker`] guard owning one [`ExecutionSlot`];
//! dropping the guard releases the admission and parks the slot on a free
//! list for the next call.
//!
//! Admission never waits. When every slot is busy, [`WorkerPool::acquire`]
//! fails at once with [`XmlRpcError::Overloaded`] and the caller decides
//! whether to retry.
//!
//! # Example
//!
//! ```
//! use xmlrpc_common::WorkerPool;
//!
//! let pool = WorkerPool::new(1, 1).unwrap();
//! let worker = pool.acquire().unwrap();
//! assert!(pool.acquire().is_err());
//!
//! drop(worker);
//! assert!(pool.acquire().is_ok());
//! ```

use parking_lot::Mutex;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::protocol::error::{Result, XmlRpcError};

/// Reusable per-call execution context.
///
/// Owned by exactly one call at a time. The server encodes each reply
/// into `buffer`, which keeps its capacity across calls so that encoding a
/// response does not reallocate.
#[derive(Debug)]
pub struct ExecutionSlot {
    id: u64,
    calls_served: u64,
    pub buffer: Vec<u8>,
}

impl ExecutionSlot {
    fn new(id: u64) -> Self {
        Self {
            id,
            calls_served: 0,
            buffer: Vec::new(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Calls this slot has been handed out for, including the current one.
    pub fn calls_served(&self) -> u64 {
        self.calls_served
    }
}

#[derive(Debug)]
struct PoolState {
    active: usize,
    idle: Vec<ExecutionSlot>,
    next_id: u64,
}

#[derive(Debug)]
struct PoolInner {
    max_concurrency: usize,
    max_idle: usize,
    state: Mutex<PoolState>,
}

/// Admission control plus a free list of execution slots.
///
/// Cloning shares the same pool. The free list and the active count are
/// guarded by one mutex held only for the bookkeeping, never across a call.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    inner: Arc<PoolInner>,
}

impl WorkerPool {
    /// Creates a pool admitting `max_concurrency` calls and keeping up to
    /// `max_idle` released slots for reuse.
    ///
    /// # Errors
    ///
    /// A `max_concurrency` of zero is rejected with [`XmlRpcError::Config`].
    pub fn new(max_concurrency: usize, max_idle: usize) -> Result<Self> {
        if max_concurrency == 0 {
            return Err(XmlRpcError::Config(
                "max_concurrency must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            inner: Arc::new(PoolInner {
                max_concurrency,
                max_idle: max_idle.min(max_concurrency),
                state: Mutex::new(PoolState {
                    active: 0,
                    idle: Vec::new(),
                    next_id: 0,
                }),
            }),
        })
    }

    /// Admits one call, preferring an idle slot over a fresh one.
    pub fn acquire(&self) -> Result<Worker> {
        let mut state = self.inner.state.lock();
        if state.active >= self.inner.max_concurrency {
            warn!(
                max_concurrency = self.inner.max_concurrency,
                "Rejecting call, worker pool exhausted"
            );
            return Err(XmlRpcError::Overloaded(format!(
                "maximum of {} concurrent calls reached",
                self.inner.max_concurrency
            )));
        }
        state.active += 1;

        let mut slot = match state.idle.pop() {
            Some(slot) => slot,
            None => {
                let id = state.next_id;
                state.next_id += 1;
                debug!(slot = id, "Allocated execution slot");
                ExecutionSlot::new(id)
            }
        };
        drop(state);

        slot.calls_served += 1;
        Ok(Worker {
            slot,
            pool: self.inner.clone(),
        })
    }

    pub fn active_count(&self) -> usize {
        self.inner.state.lock().active
    }

    pub fn idle_count(&self) -> usize {
        self.inner.state.lock().idle.len()
    }

    pub fn max_concurrency(&self) -> usize {
        self.inner.max_concurrency
    }
}

/// Guard for one admitted call. Releases the admission on drop.
#[derive(Debug)]
pub struct Worker {
    slot: ExecutionSlot,
    pool: Arc<PoolInner>,
}

impl Deref for Worker {
    type Target = ExecutionSlot;

    fn deref(&self) -> &ExecutionSlot {
        &self.slot
    }
}

impl DerefMut for Worker {
    fn deref_mut(&mut self) -> &mut ExecutionSlot {
        &mut self.slot
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        let mut buffer = std::mem::take(&mut self.slot.buffer);
        buffer.clear();
        let slot = ExecutionSlot {
            id: self.slot.id,
            calls_served: self.slot.calls_served,
            buffer,
        };

        let mut state = self.pool.state.lock();
        state.active -= 1;
        if state.idle.len() < self.pool.max_idle {
            state.idle.push(slot);
        }
    }
}
