//! Shared container storage.
//!
//! Lists, sets and maps are reference types: every copy of a container
//! value sees the same storage. Storage is guarded by a `parking_lot`
//! lock so values can cross into generators and host callbacks, and an
//! `immutable` flag rejects writes to literals declared read-only.

use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::Value;
use crate::errors::immutable_container;
use crate::EvalError;

/// Lock-guarded container storage with an immutability flag.
#[derive(Debug)]
pub struct Shared<T> {
    data: RwLock<T>,
    immutable: bool,
}

impl<T> Shared<T> {
    pub fn new(data: T) -> Self {
        Shared {
            data: RwLock::new(data),
            immutable: false,
        }
    }

    /// Storage that rejects every write.
    pub fn frozen(data: T) -> Self {
        Shared {
            data: RwLock::new(data),
            immutable: true,
        }
    }

    #[inline]
    pub fn read(&self) -> RwLockReadGuard<'_, T> {
        self.data.read()
    }

    /// Write access; fails on immutable storage.
    pub fn write(&self, type_name: &str) -> Result<RwLockWriteGuard<'_, T>, EvalError> {
        if self.immutable {
            return Err(immutable_container(type_name));
        }
        Ok(self.data.write())
    }

    #[inline]
    pub fn is_immutable(&self) -> bool {
        self.immutable
    }
}

/// Ordered elements of a list or set.
pub type SharedSeq = Arc<Shared<Vec<Value>>>;

/// Insertion-ordered key/value pairs of a map.
pub type SharedMap = Arc<Shared<Vec<(Value, Value)>>>;

/// Look up `key` in map entries.
pub fn map_get(entries: &[(Value, Value)], key: &Value) -> Option<Value> {
    entries
        .iter()
        .find(|(k, _)| k.loosely_equals(key))
        .map(|(_, v)| v.clone())
}

/// Insert or replace `key`, returning the previous value.
pub fn map_put(entries: &mut Vec<(Value, Value)>, key: Value, value: Value) -> Option<Value> {
    if let Some(slot) = entries.iter_mut().find(|(k, _)| k.loosely_equals(&key)) {
        return Some(std::mem::replace(&mut slot.1, value));
    }
    entries.push((key, value));
    None
}

/// Append `value` to set elements unless an equal element exists.
pub fn set_add(items: &mut Vec<Value>, value: Value) -> bool {
    if items.iter().any(|v| v.loosely_equals(&value)) {
        return false;
    }
    items.push(value);
    true
}
