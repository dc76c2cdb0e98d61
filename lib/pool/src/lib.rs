//! # Slot Pool
//!
//! A fixed-capacity allocator over a caller-supplied backing array. Each
//! allocation hands out a [`SlotId`], a stable index into the array, rather
//! than a reference. The record behind a handle never moves, so the index is
//! also the record's identity for as long as it stays allocated.
//!
//! ## Design
//!
//! - Capacity is the length of the backing array; there is no resizing
//! - Freed slots are reused most-recently-freed first
//! - Slots that were never handed out are taken in index order, so a fresh
//!   pool yields 0, 1, 2, ...
//! - Out-of-range and double-free handles fail with [`PoolError`]
//!
//! ## Usage
//!
//! ```
//! use tickos_pool::{PoolError, SlotPool};
//!
//! let mut pool: SlotPool<u32, 2> = SlotPool::new();
//! let a = pool.alloc().unwrap();
//! let b = pool.alloc().unwrap();
//! assert_eq!(pool.alloc(), Err(PoolError::Exhausted));
//!
//! pool.free(a).unwrap();
//! assert_eq!(pool.alloc(), Ok(a));
//! assert_ne!(a, b);
//! ```

#![no_std]

use core::fmt;

/// Handle to one slot of a [`SlotPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotId(pub usize);

impl SlotId {
    /// Creates a handle from a raw index.
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the index of the slot in the backing array.
    pub const fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Pool errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolError {
    /// Every slot is allocated
    Exhausted,
    /// Handle does not name a slot of this pool
    OutOfRange(SlotId),
    /// Handle names a slot that is not allocated
    DoubleFree(SlotId),
}

impl fmt::Display for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolError::Exhausted => write!(f, "no free slot"),
            PoolError::OutOfRange(id) => write!(f, "slot {} out of range", id),
            PoolError::DoubleFree(id) => write!(f, "slot {} is not allocated", id),
        }
    }
}

/// A fixed-capacity pool of `N` records of type `T`.
pub struct SlotPool<T, const N: usize> {
    /// Backing records, indexed by `SlotId`
    slots: [T; N],
    /// Allocation flag per slot
    taken: [bool; N],
    /// Stack of freed indices, most recent on top
    recycled: [usize; N],
    recycled_len: usize,
    /// Slots at or above this index have never been handed out
    watermark: usize,
}

impl<T: Default, const N: usize> SlotPool<T, N> {
    /// Creates a pool over `N` default-initialized records.
    pub fn new() -> Self {
        Self::from_array(core::array::from_fn(|_| T::default()))
    }
}

impl<T: Default, const N: usize> Default for SlotPool<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> SlotPool<T, N> {
    /// Creates a pool over a caller-supplied backing array.
    ///
    /// All slots start free; the records keep whatever values they hold.
    pub const fn from_array(slots: [T; N]) -> Self {
        Self {
            slots,
            taken: [false; N],
            recycled: [0; N],
            recycled_len: 0,
            watermark: 0,
        }
    }

    /// Allocates a slot.
    ///
    /// The record is handed out as-is; callers populate it through
    /// [`SlotPool::get_mut`].
    pub fn alloc(&mut self) -> Result<SlotId, PoolError> {
        let index = if self.recycled_len > 0 {
            self.recycled_len -= 1;
            self.recycled[self.recycled_len]
        } else if self.watermark < N {
            self.watermark += 1;
            self.watermark - 1
        } else {
            return Err(PoolError::Exhausted);
        };

        self.taken[index] = true;
        log::trace!("pool: alloc slot {} ({} left)", index, self.available());
        Ok(SlotId(index))
    }

    /// Returns a slot to the pool.
    pub fn free(&mut self, id: SlotId) -> Result<(), PoolError> {
        let index = self.check(id)?;

        self.taken[index] = false;
        self.recycled[self.recycled_len] = index;
        self.recycled_len += 1;
        log::trace!("pool: free slot {} ({} left)", index, self.available());
        Ok(())
    }

    /// Gets the record behind an allocated handle.
    pub fn get(&self, id: SlotId) -> Result<&T, PoolError> {
        let index = self.check(id)?;
        Ok(&self.slots[index])
    }

    /// Gets the record behind an allocated handle, mutably.
    pub fn get_mut(&mut self, id: SlotId) -> Result<&mut T, PoolError> {
        let index = self.check(id)?;
        Ok(&mut self.slots[index])
    }

    /// Checks whether a handle is currently allocated.
    pub fn is_allocated(&self, id: SlotId) -> bool {
        self.check(id).is_ok()
    }

    /// Total number of slots.
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Number of free slots.
    pub fn available(&self) -> usize {
        N - self.in_use()
    }

    /// Number of allocated slots.
    pub fn in_use(&self) -> usize {
        self.watermark - self.recycled_len
    }

    fn check(&self, id: SlotId) -> Result<usize, PoolError> {
        if id.0 >= N {
            return Err(PoolError::OutOfRange(id));
        }
        if !self.taken[id.0] {
            return Err(PoolError::DoubleFree(id));
        }
        Ok(id.0)
    }
}
