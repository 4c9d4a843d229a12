//! Activation frames.
//!
//! A frame holds the argument and local slots of one script or lambda
//! activation. Slots are addressed by the indices lowering assigned, and
//! a lambda's frame links to the frame it captured so `hops > 0`
//! references walk outward.
//!
//! Frames are shared (`Arc`) because closures capture them and generators
//! keep them across suspensions.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::Value;

/// Shared frame handle.
pub type FrameRef = Arc<Frame>;

/// Fixed-size slot array of one activation.
pub struct Frame {
    /// `None` until the slot is first assigned.
    slots: RwLock<Vec<Option<Value>>>,
    parent: Option<FrameRef>,
}

impl Frame {
    pub fn new(size: usize, parent: Option<FrameRef>) -> FrameRef {
        Arc::new(Frame {
            slots: RwLock::new(vec![None; size]),
            parent,
        })
    }

    /// Current slot value; `None` when never assigned or out of range.
    pub fn get(&self, slot: u32) -> Option<Value> {
        self.slots.read().get(slot as usize).cloned().flatten()
    }

    pub fn set(&self, slot: u32, value: Value) {
        let mut slots = self.slots.write();
        let index = slot as usize;
        if index >= slots.len() {
            slots.resize(index + 1, None);
        }
        slots[index] = Some(value);
    }

    /// Whether the slot was ever assigned.
    pub fn is_assigned(&self, slot: u32) -> bool {
        self.slots
            .read()
            .get(slot as usize)
            .is_some_and(Option::is_some)
    }

    pub fn parent(&self) -> Option<&FrameRef> {
        self.parent.as_ref()
    }

    pub fn size(&self) -> usize {
        self.slots.read().len()
    }
}

/// Walk `hops` captured frames outward from `frame`.
pub fn ancestor(frame: &FrameRef, hops: u16) -> Option<FrameRef> {
    let mut current = frame;
    for _ in 0..hops {
        current = current.parent()?;
    }
    Some(Arc::clone(current))
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("size", &self.size())
            .field("has_parent", &self.parent.is_some())
            .finish()
    }
}
