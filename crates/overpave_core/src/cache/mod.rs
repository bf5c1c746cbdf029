//! # Caching
//!
//! Generic bounded storage shared by every per-region cache.

mod bounded;

pub use bounded::{BoundedCache, CacheError, EvictFn};
