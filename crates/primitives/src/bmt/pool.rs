//! Bounded pool of reusable BMT hashers.
//!
//! Each hasher owns a 4 KiB buffer, so chunking pipelines borrow them from a
//! shared pool instead of allocating one per chunk. The pool never blocks:
//! when no idle hasher is available a new one is allocated, and on release
//! hashers beyond the configured capacity are dropped.

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use digest::Reset;
use parking_lot::Mutex;

use super::constants::DEFAULT_POOL_CAPACITY;
use super::hasher::Hasher;

struct PoolInner {
    idle: Mutex<Vec<Box<Hasher>>>,
    capacity: usize,
}

/// Shared pool of [`Hasher`]s.
///
/// Cloning is cheap and yields a handle to the same pool.
#[derive(Clone)]
pub struct HasherPool {
    inner: Arc<PoolInner>,
}

impl fmt::Debug for HasherPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HasherPool")
            .field("capacity", &self.inner.capacity)
            .field("idle", &self.idle())
            .finish()
    }
}

impl Default for HasherPool {
    fn default() -> Self {
        Self::new(DEFAULT_POOL_CAPACITY)
    }
}

impl HasherPool {
    /// Create a pool that retains at most `capacity` idle hashers.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(PoolInner { idle: Mutex::new(Vec::with_capacity(capacity)), capacity }),
        }
    }

    /// Maximum number of idle hashers retained.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    /// Number of hashers currently waiting in the pool.
    #[inline]
    pub fn idle(&self) -> usize {
        self.inner.idle.lock().len()
    }

    /// Borrow a hasher in its reset state.
    ///
    /// The hasher returns to the pool when the guard is dropped.
    pub fn acquire(&self) -> PooledHasher {
        let hasher = self.inner.idle.lock().pop().unwrap_or_else(|| Box::new(Hasher::new()));
        PooledHasher { hasher: Some(hasher), pool: Arc::clone(&self.inner) }
    }

    /// Return a hasher explicitly. Equivalent to dropping the guard.
    #[inline]
    pub fn release(&self, hasher: PooledHasher) {
        drop(hasher);
    }
}

/// A hasher on loan from a [`HasherPool`].
pub struct PooledHasher {
    hasher: Option<Box<Hasher>>,
    pool: Arc<PoolInner>,
}

impl fmt::Debug for PooledHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledHasher").field("len", &self.len()).finish()
    }
}

impl Deref for PooledHasher {
    type Target = Hasher;

    fn deref(&self) -> &Hasher {
        // only taken in `drop`
        self.hasher.as_deref().unwrap_or_else(|| unreachable!())
    }
}

impl DerefMut for PooledHasher {
    fn deref_mut(&mut self) -> &mut Hasher {
        self.hasher.as_deref_mut().unwrap_or_else(|| unreachable!())
    }
}

impl Drop for PooledHasher {
    fn drop(&mut self) {
        let Some(mut hasher) = self.hasher.take() else { return };
        hasher.reset();
        let mut idle = self.pool.idle.lock();
        if idle.len() < self.pool.capacity {
            idle.push(hasher);
        }
    }
}
