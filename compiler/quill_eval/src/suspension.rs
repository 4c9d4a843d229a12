//! Suspension records for resumable evaluation.
//!
//! A generator suspends by unwinding a `Yield` action all the way to its
//! root. On the way up, every sequencing construct the action passes
//! through stores a [`SuspensionRecord`] describing where it was: which
//! child it was evaluating, the host iterator it was draining, its block
//! scope. Resuming re-enters the same root; each construct finds its record
//! and jumps straight to the recorded child, so nothing that ran before the
//! suspension point runs again.
//!
//! The map is keyed by node id and owned by one interpreter (one generator
//! instance). A construct removes its record on entry; it puts a fresh one
//! back only when a yield unwinds through it again.

use quill_ir::NodeId;
use rustc_hash::FxHashMap;

use crate::scope::BlockScope;
use crate::{EvalResult, Value, ValueIter};

/// Progress of one suspended construct.
#[derive(Default)]
pub struct SuspensionRecord {
    /// Child index (or construct phase) to resume at.
    pub child: usize,
    /// Host iterator of a suspended `foreach`.
    pub iterator: Option<ValueIter>,
    /// Last statement value produced before suspending.
    pub last: Value,
    /// Block scope popped by the unwind, pushed back on resume.
    pub scope: Option<BlockScope>,
    /// Outcome a `try` delivers once its `finally` completes.
    pub pending: Option<EvalResult>,
}

impl SuspensionRecord {
    pub fn at(child: usize) -> Self {
        SuspensionRecord {
            child,
            ..SuspensionRecord::default()
        }
    }

    #[must_use]
    pub fn with_last(mut self, last: Value) -> Self {
        self.last = last;
        self
    }

    #[must_use]
    pub fn with_scope(mut self, scope: BlockScope) -> Self {
        self.scope = Some(scope);
        self
    }

    #[must_use]
    pub fn with_iterator(mut self, iterator: ValueIter) -> Self {
        self.iterator = Some(iterator);
        self
    }

    #[must_use]
    pub fn with_pending(mut self, pending: Option<EvalResult>) -> Self {
        self.pending = pending;
        self
    }
}

impl std::fmt::Debug for SuspensionRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SuspensionRecord")
            .field("child", &self.child)
            .field("iterator", &self.iterator.is_some())
            .field("last", &self.last)
            .field("scope", &self.scope)
            .field("pending", &self.pending.is_some())
            .finish()
    }
}

/// Records of one generator instance, by node.
#[derive(Debug, Default)]
pub struct SuspensionMap {
    records: FxHashMap<NodeId, SuspensionRecord>,
}

impl SuspensionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return the record of `node`.
    #[inline]
    pub fn take(&mut self, node: NodeId) -> Option<SuspensionRecord> {
        if self.records.is_empty() {
            return None;
        }
        self.records.remove(&node)
    }

    pub fn insert(&mut self, node: NodeId, record: SuspensionRecord) {
        self.records.insert(node, record);
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.records.contains_key(&node)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drop every record, closing any retained iterators.
    pub fn clear(&mut self) {
        self.records.clear();
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::value::SeqIter;

    #[test]
    fn take_consumes_the_record() {
        let mut map = SuspensionMap::new();
        map.insert(NodeId::new(3), SuspensionRecord::at(2).with_last(Value::Int(7)));
        assert!(map.contains(NodeId::new(3)));

        let record = map.take(NodeId::new(3));
        assert_eq!(record.as_ref().map(|r| r.child), Some(2));
        assert_eq!(record.map(|r| r.last), Some(Value::Int(7)));
        assert!(map.take(NodeId::new(3)).is_none());
        assert!(map.is_empty());
    }

    #[test]
    fn clear_drops_retained_iterators() {
        let mut map = SuspensionMap::new();
        let iterator: ValueIter = Box::new(SeqIter::from_values(vec![Value::Int(1)]));
        map.insert(NodeId::new(0), SuspensionRecord::at(1).with_iterator(iterator));
        assert_eq!(map.len(), 1);
        map.clear();
        assert!(map.is_empty());
    }
}
