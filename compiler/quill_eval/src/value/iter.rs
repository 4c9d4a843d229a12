//! Iteration over values.
//!
//! `foreach` pulls elements through a [`ValueIterator`]. An iterator that
//! is suspended inside a generator is kept alive in the suspension record;
//! otherwise it is dropped, which is how host iterators release resources.

use super::{SharedMap, SharedSeq, Value};
use crate::errors::remove_unsupported;
use crate::{EvalError, Generator};

/// Pull-based element source for `foreach`.
pub trait ValueIterator {
    /// Next element, `None` when exhausted.
    fn next_value(&mut self) -> Option<Result<Value, EvalError>>;

    /// Remove the element most recently returned by `next_value`.
    fn remove_current(&mut self) -> Result<(), EvalError> {
        Err(remove_unsupported("this value"))
    }
}

/// Boxed iterator stored in suspension records.
pub type ValueIter = Box<dyn ValueIterator + Send>;

/// Elements of a list or set.
pub(crate) struct SeqIter {
    items: SharedSeq,
    next: usize,
    type_name: &'static str,
}

impl SeqIter {
    pub(crate) fn new(items: SharedSeq, type_name: &'static str) -> Self {
        SeqIter {
            items,
            next: 0,
            type_name,
        }
    }

    /// Iterate an owned snapshot.
    pub(crate) fn from_values(values: Vec<Value>) -> Self {
        Self::new(std::sync::Arc::new(super::Shared::new(values)), "list")
    }
}

impl ValueIterator for SeqIter {
    fn next_value(&mut self) -> Option<Result<Value, EvalError>> {
        let item = self.items.read().get(self.next).cloned()?;
        self.next += 1;
        Some(Ok(item))
    }

    fn remove_current(&mut self) -> Result<(), EvalError> {
        if self.next == 0 {
            return Err(remove_unsupported(self.type_name));
        }
        let mut items = self.items.write(self.type_name)?;
        if self.next <= items.len() {
            items.remove(self.next - 1);
            self.next -= 1;
        }
        Ok(())
    }
}

/// Values of a map, in insertion order.
pub(crate) struct MapValuesIter {
    entries: SharedMap,
    next: usize,
}

impl MapValuesIter {
    pub(crate) fn new(entries: SharedMap) -> Self {
        MapValuesIter { entries, next: 0 }
    }
}

impl ValueIterator for MapValuesIter {
    fn next_value(&mut self) -> Option<Result<Value, EvalError>> {
        let value = self.entries.read().get(self.next).map(|(_, v)| v.clone())?;
        self.next += 1;
        Some(Ok(value))
    }

    fn remove_current(&mut self) -> Result<(), EvalError> {
        if self.next == 0 {
            return Err(remove_unsupported("map"));
        }
        let mut entries = self.entries.write("map")?;
        if self.next <= entries.len() {
            entries.remove(self.next - 1);
            self.next -= 1;
        }
        Ok(())
    }
}

/// Longs of an inclusive range.
pub(crate) struct RangeIter {
    next: i64,
    high: i64,
    done: bool,
}

impl RangeIter {
    pub(crate) fn new(low: i64, high: i64) -> Self {
        RangeIter {
            next: low,
            high,
            done: low > high,
        }
    }
}

impl ValueIterator for RangeIter {
    fn next_value(&mut self) -> Option<Result<Value, EvalError>> {
        if self.done {
            return None;
        }
        let current = self.next;
        match current.checked_add(1) {
            Some(next) if next <= self.high => self.next = next,
            _ => self.done = true,
        }
        Some(Ok(Value::Long(current)))
    }
}

/// Values yielded by a generator.
pub(crate) struct GeneratorIter {
    generator: Generator,
}

impl GeneratorIter {
    pub(crate) fn new(generator: Generator) -> Self {
        GeneratorIter { generator }
    }
}

impl ValueIterator for GeneratorIter {
    fn next_value(&mut self) -> Option<Result<Value, EvalError>> {
        self.generator.resume(Value::Null).transpose()
    }
}
