//! Object pooling
//!
//! Bounded free lists for short-lived instances (particles, pickups,
//! projectiles). A pool hands back previously released instances before the
//! caller allocates new ones, and refuses to keep more than its capacity:
//! releasing into a full pool discards the instance instead of growing.
//!
//! # Usage
//!
//! ```rust
//! use nova_engine::pool::{ObjectPool, Released};
//!
//! let mut pool: ObjectPool<u32> = ObjectPool::new("sparks", 2);
//! let mut next_id = 0;
//! let mut create = || { next_id += 1; next_id };
//!
//! let a = pool.acquire_or_else(&mut create);
//! assert_eq!(pool.release(a), Released::Pooled);
//! assert_eq!(pool.release(a), Released::AlreadyPooled);
//! assert_eq!(pool.acquire(), Some(a));
//! ```

use std::collections::HashSet;
use std::hash::Hash;

/// Result of returning an instance to a pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Released<T> {
    /// The instance was stored for reuse
    Pooled,
    /// The pool was full; the caller owns the instance and should destroy it
    Discarded(T),
    /// The instance was already in the free list; nothing changed
    AlreadyPooled,
}

/// Statistics for a single pool
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Instances handed out (fresh or reused)
    pub acquired: u64,
    /// Acquisitions served from the free list
    pub reused: u64,
    /// Instances accepted back into the free list
    pub released: u64,
    /// Instances refused because the pool was full
    pub discarded: u64,
}

/// Bounded free list of reusable instances
#[derive(Debug, Clone)]
pub struct ObjectPool<T> {
    name: &'static str,
    free: Vec<T>,
    members: HashSet<T>,
    capacity: usize,
    stats: PoolStats,
}

impl<T> ObjectPool<T>
where
    T: Copy + Eq + Hash,
{
    /// Create an empty pool that keeps at most `capacity` free instances
    pub fn new(name: &'static str, capacity: usize) -> Self {
        log::debug!("Created pool '{}' with capacity {}", name, capacity);
        Self {
            name,
            free: Vec::with_capacity(capacity),
            members: HashSet::with_capacity(capacity),
            capacity,
            stats: PoolStats::default(),
        }
    }

    /// Take a previously released instance, if any
    pub fn acquire(&mut self) -> Option<T> {
        let item = self.free.pop()?;
        self.members.remove(&item);
        self.stats.acquired += 1;
        self.stats.reused += 1;
        Some(item)
    }

    /// Take a released instance or build a fresh one with `create`
    pub fn acquire_or_else<F: FnOnce() -> T>(&mut self, create: F) -> T {
        if let Some(item) = self.acquire() {
            return item;
        }
        self.stats.acquired += 1;
        create()
    }

    /// Return an instance to the pool
    ///
    /// Releasing an instance that is already free is a no-op. When the pool is
    /// at capacity the instance is handed back as [`Released::Discarded`].
    pub fn release(&mut self, item: T) -> Released<T> {
        if self.members.contains(&item) {
            return Released::AlreadyPooled;
        }
        if self.free.len() >= self.capacity {
            self.stats.discarded += 1;
            log::trace!("Pool '{}' full, discarding instance", self.name);
            return Released::Discarded(item);
        }
        self.free.push(item);
        self.members.insert(item);
        self.stats.released += 1;
        Released::Pooled
    }

    /// Whether `item` is sitting in the free list
    pub fn contains(&self, item: &T) -> bool {
        self.members.contains(item)
    }

    /// Number of free instances
    pub fn len(&self) -> usize {
        self.free.len()
    }

    /// Whether the free list is empty
    pub fn is_empty(&self) -> bool {
        self.free.is_empty()
    }

    /// Maximum number of free instances kept
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Pool name used in logs
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Usage statistics
    pub fn stats(&self) -> PoolStats {
        self.stats
    }

    /// Remove every free instance, returning them for destruction
    pub fn drain(&mut self) -> Vec<T> {
        self.members.clear();
        std::mem::take(&mut self.free)
    }
}
