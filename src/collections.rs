//! Hash collections used for XRef indexes and traversal bookkeeping.
//!
//! With the `gxhash` feature (default) maps and sets use gxhash; without it
//! they fall back to the std hasher so the crate builds on CPUs lacking the
//! AES/SSE2 intrinsics gxhash needs.

use crate::types::XRef;

#[cfg(feature = "gxhash")]
pub use gxhash::{HashMap, HashMapExt, HashSet, HashSetExt};

#[cfg(not(feature = "gxhash"))]
pub use std::collections::{HashMap, HashSet};

/// Map keyed by record identifier
pub type XRefMap<V> = HashMap<XRef, V>;

/// Constructor shim so call sites can use `HashMap::new()` with either hasher
#[cfg(not(feature = "gxhash"))]
pub trait HashMapExt {
    /// Creates an empty map
    fn new() -> Self;

    /// Creates an empty map with room for `capacity` entries
    fn with_capacity(capacity: usize) -> Self;
}

#[cfg(not(feature = "gxhash"))]
impl<K, V> HashMapExt for HashMap<K, V> {
    fn new() -> Self {
        Default::default()
    }

    fn with_capacity(capacity: usize) -> Self {
        HashMap::with_capacity_and_hasher(capacity, Default::default())
    }
}

/// Constructor shim so call sites can use `HashSet::new()` with either hasher
#[cfg(not(feature = "gxhash"))]
pub trait HashSetExt {
    /// Creates an empty set
    fn new() -> Self;

    /// Creates an empty set with room for `capacity` entries
    fn with_capacity(capacity: usize) -> Self;
}

#[cfg(not(feature = "gxhash"))]
impl<T> HashSetExt for HashSet<T> {
    fn new() -> Self {
        Default::default()
    }

    fn with_capacity(capacity: usize) -> Self {
        HashSet::with_capacity_and_hasher(capacity, Default::default())
    }
}
