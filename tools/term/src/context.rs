//! Task context pool.
//!
//! Spawned demonstration tasks keep their private state in one of
//! [`CONTEXT_SLOTS`] fixed records. A record's index is its identity for the
//! lifetime of the task. Tasks hold their record through a [`ContextLease`],
//! which returns the slot to the pool when the task body is dropped, i.e.
//! when the task exits or the scheduler refuses it.

use alloc::sync::Arc;

use spin::Mutex;
use tickos_pool::{PoolError, SlotId, SlotPool};

/// Number of task contexts.
pub const CONTEXT_SLOTS: usize = 16;

/// Per-task state.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AppContext {
    /// Caller-supplied work count
    pub cnt: i64,
}

/// Shared pool of task contexts.
#[derive(Clone)]
pub struct ContextPool {
    inner: Arc<Mutex<SlotPool<AppContext, CONTEXT_SLOTS>>>,
}

impl ContextPool {
    /// Creates a pool with every slot free.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(SlotPool::new())),
        }
    }

    /// Allocates a context and populates it with `cnt`.
    pub fn lease(&self, cnt: i64) -> Result<ContextLease, PoolError> {
        let mut pool = self.inner.lock();
        let slot = pool.alloc()?;
        pool.get_mut(slot)?.cnt = cnt;

        Ok(ContextLease {
            pool: self.clone(),
            slot,
        })
    }

    /// Reads the context in `slot`.
    pub fn get(&self, slot: SlotId) -> Result<AppContext, PoolError> {
        self.inner.lock().get(slot).copied()
    }

    /// Number of free contexts.
    pub fn available(&self) -> usize {
        self.inner.lock().available()
    }

    /// Number of leased contexts.
    pub fn in_use(&self) -> usize {
        self.inner.lock().in_use()
    }
}

impl Default for ContextPool {
    fn default() -> Self {
        Self::new()
    }
}

/// Exclusive hold on one task context.
pub struct ContextLease {
    pool: ContextPool,
    slot: SlotId,
}

impl ContextLease {
    /// Slot backing this context.
    pub fn slot(&self) -> SlotId {
        self.slot
    }

    /// 1-based context number, as shown in task output.
    pub fn number(&self) -> usize {
        self.slot.index() + 1
    }

    /// Current work count.
    pub fn cnt(&self) -> i64 {
        self.pool.get(self.slot).map(|ctx| ctx.cnt).unwrap_or_default()
    }
}

impl Drop for ContextLease {
    fn drop(&mut self) {
        if let Err(err) = self.pool.inner.lock().free(self.slot) {
            log::warn!("context: release of slot {} failed: {}", self.slot, err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    #[test]
    fn test_lease_populates_context() {
        let pool = ContextPool::new();
        let lease = pool.lease(5000).unwrap();
        assert_eq!(lease.slot(), SlotId(0));
        assert_eq!(lease.number(), 1);
        assert_eq!(lease.cnt(), 5000);
        assert_eq!(pool.get(lease.slot()), Ok(AppContext { cnt: 5000 }));
        assert_eq!(pool.in_use(), 1);
    }

    #[test]
    fn test_exhaustion_and_release() {
        let pool = ContextPool::new();
        let leases: Vec<_> = (0..CONTEXT_SLOTS as i64)
            .map(|i| pool.lease(i).unwrap())
            .collect();
        assert_eq!(pool.available(), 0);
        assert!(matches!(pool.lease(1), Err(PoolError::Exhausted)));

        drop(leases);
        assert_eq!(pool.available(), CONTEXT_SLOTS);
        assert!(pool.lease(1).is_ok());
    }

    #[test]
    fn test_dropped_lease_slot_is_reused() {
        let pool = ContextPool::new();
        let first = pool.lease(1).unwrap();
        let second = pool.lease(2).unwrap();
        let slot = first.slot();
        drop(first);

        let third = pool.lease(3).unwrap();
        assert_eq!(third.slot(), slot);
        assert_eq!(third.cnt(), 3);
        assert_eq!(second.cnt(), 2);
    }

    #[test]
    fn test_clones_share_slots() {
        let pool = ContextPool::new();
        let other = pool.clone();
        let _lease = other.lease(9).unwrap();
        assert_eq!(pool.in_use(), 1);
    }
}
