//! # Type Identity Without Runtime Reflection
//!
//! Every port and queue in the runtime is attached to exactly one message
//! type, fixed at construction. Components and the registry never need to
//! know *which* type that is at compile time (ports live in plain
//! `HashMap`s, not generic collections), so the runtime needs a process-wide
//! token that answers "same type or not" and "arbitrary total order" without
//! leaning on a language reflection facility.
//!
//! [`TypeId`] wraps `std::any::TypeId` for equality (the only contract the
//! standard library guarantees) and derives a stable ordering key by hashing
//! that id with a fixed-seed hasher. The derived key is only ever used for
//! ordering (e.g. sorting a `Vec<TypeId>` for diagnostics); equality always
//! goes through the wrapped standard id.

use std::any::TypeId as StdTypeId;
use std::cmp::Ordering;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// A process-wide, type-monomorphization-unique token.
///
/// `type_id::<T1>() == type_id::<T2>()` iff `T1` and `T2` are the same type,
/// for any two monomorphizations observed within one process.
#[derive(Clone, Copy, Eq, Debug)]
pub struct TypeId {
    std_id: StdTypeId,
    order_key: u64,
}

impl TypeId {
    /// Returns the token for `T`.
    pub fn of<T: 'static>() -> Self {
        let std_id = StdTypeId::of::<T>();
        let mut hasher = DefaultHasher::new();
        std_id.hash(&mut hasher);
        Self {
            std_id,
            order_key: hasher.finish(),
        }
    }
}

impl PartialEq for TypeId {
    fn eq(&self, other: &Self) -> bool {
        self.std_id == other.std_id
    }
}

impl PartialOrd for TypeId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TypeId {
    fn cmp(&self, other: &Self) -> Ordering {
        // Equal tokens must compare Equal; the hash key alone cannot promise
        // that (collisions are astronomically unlikely but not impossible),
        // so fast-path actual equality first.
        if self.std_id == other.std_id {
            Ordering::Equal
        } else {
            self.order_key.cmp(&other.order_key)
        }
    }
}

/// Returns the [`TypeId`] token for `T`. Free function mirroring the
/// source's `type_id<T>()` call convention.
pub fn type_id<T: 'static>() -> TypeId {
    TypeId::of::<T>()
}
