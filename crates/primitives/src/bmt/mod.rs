//! Binary Merkle Tree (BMT) hashing for content addressing.
//!
//! [`Hasher`] computes the address of a single chunk; [`HasherPool`] hands
//! out reusable hashers to concurrent callers.

pub mod constants;
pub mod error;
pub mod hasher;
pub mod pool;

pub use constants::*;
pub use error::{BmtError, Result};
pub use hasher::Hasher;
pub use pool::{HasherPool, PooledHasher};
