//! Call-site memo side table.
//!
//! The syntax tree is immutable and shared, so resolved call targets are
//! cached beside it, keyed by [`NodeKey`]. An entry records the operand
//! kinds it was resolved for; a lookup with different kinds misses and the
//! caller re-resolves and overwrites the entry. An entry resolved for
//! narrowed arguments also records the narrowed kinds; a hit whose
//! arguments no longer narrow to them is stale as well. Concurrent writers
//! racing on one key are harmless: both resolutions are valid, the last one
//! wins.

use dashmap::DashMap;
use quill_ir::NodeKey;
use smallvec::SmallVec;

use crate::introspect::MethodHandle;
use crate::{NativeFunction, Value, ValueKind};

/// Operand kinds a resolution was made for.
pub type Signature = SmallVec<[ValueKind; 4]>;

/// Kinds of `values`, in order.
pub fn signature<'a>(values: impl IntoIterator<Item = &'a Value>) -> Signature {
    values.into_iter().map(Value::kind).collect()
}

/// A cached resolution.
#[derive(Clone, Debug)]
pub enum MemoTarget {
    /// Method found by introspection.
    Method(MethodHandle),
    /// Context or policy function; method syntax passes the receiver first.
    Function(NativeFunction),
    /// Operator overload from the policy.
    Overload(NativeFunction),
}

/// Resolution cached at one call site.
#[derive(Clone, Debug)]
pub struct CallSiteMemo {
    pub target: MemoTarget,
    pub signature: Signature,
    /// Kinds of the narrowed arguments `target` was resolved for; `None`
    /// when the arguments are passed as given.
    pub narrowed: Option<Signature>,
}

/// Side table of call-site memos.
#[derive(Default)]
pub struct MemoTable {
    entries: DashMap<NodeKey, CallSiteMemo>,
}

impl MemoTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached resolution for `key`, if it was made for `signature`.
    pub fn lookup(&self, key: NodeKey, signature: &[ValueKind]) -> Option<CallSiteMemo> {
        let entry = self.entries.get(&key)?;
        if entry.signature.as_slice() == signature {
            Some(entry.value().clone())
        } else {
            tracing::trace!(node = ?key.node, "stale call-site memo");
            None
        }
    }

    pub fn store(&self, key: NodeKey, memo: CallSiteMemo) {
        self.entries.insert(key, memo);
    }

    pub fn invalidate(&self, key: NodeKey) {
        self.entries.remove(&key);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl std::fmt::Debug for MemoTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoTable")
            .field("entries", &self.entries.len())
            .finish()
    }
}
