//! Lazily computed, write-once values.

use std::sync::OnceLock;

/// Write-once cache for a value derived from immutable data, such as a
/// chunk's BMT address.
#[derive(Debug)]
pub(crate) struct OnceCache<T> {
    value: OnceLock<T>,
}

impl<T> OnceCache<T> {
    pub(crate) const fn new() -> Self {
        Self { value: OnceLock::new() }
    }

    /// Cache seeded with a value known up front.
    pub(crate) fn with_value(value: T) -> Self {
        let cache = Self::new();
        // a fresh cell cannot already be set
        let _ = cache.value.set(value);
        cache
    }

    pub(crate) fn get(&self) -> Option<&T> {
        self.value.get()
    }

    /// Store `value` unless another caller got there first.
    pub(crate) fn set(&self, value: T) {
        let _ = self.value.set(value);
    }

    pub(crate) fn get_or_compute(&self, compute: impl FnOnce() -> T) -> &T {
        self.value.get_or_init(compute)
    }
}

impl<T> Default for OnceCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Clone for OnceCache<T> {
    fn clone(&self) -> Self {
        match self.value.get() {
            Some(value) => Self::with_value(value.clone()),
            None => Self::new(),
        }
    }
}
