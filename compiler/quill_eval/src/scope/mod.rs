//! Lexical scope tracking.
//!
//! Lowering fixes *where* a symbol lives (its frame slot); the lexical
//! scope tracks *whether* that slot is currently declared and how it may be
//! written. Every block that declares symbols pushes a [`BlockScope`] on
//! entry and pops it on every exit path.
//!
//! A popped block can be kept: a construct suspended by `yield` stores its
//! block in the suspension record and pushes it back on resume, so
//! declarations made before the suspension stay visible afterwards.


use bitflags::bitflags;
use quill_ir::DeclaredType;
use smallvec::SmallVec;

bitflags! {
    /// Per-symbol declaration flags.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
    pub struct SymbolFlags: u8 {
        /// The symbol's declaration has executed.
        const DECLARED = 1 << 0;
        /// `const`: reassignment is an error.
        const FINAL = 1 << 1;
        /// Non-nullable declared type: null is rejected.
        const REQUIRED = 1 << 2;
        /// Assigned values are coerced to the declared type.
        const TYPED = 1 << 3;
    }
}

/// A declared symbol: its slot, flags and declared type.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Symbol {
    pub slot: u32,
    pub flags: SymbolFlags,
    pub ty: Option<DeclaredType>,
}

/// Symbols declared by one block.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BlockScope {
    symbols: SmallVec<[Symbol; 4]>,
}

impl BlockScope {
    pub fn new() -> Self {
        Self::default()
    }

    fn find(&self, slot: u32) -> Option<&Symbol> {
        self.symbols.iter().find(|s| s.slot == slot)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// Stack of block scopes for one activation.
///
/// Index 0 is the activation's root block; it holds parameters and
/// function-scoped `var` declarations.
#[derive(Clone, Debug)]
pub struct LexicalScope {
    blocks: Vec<BlockScope>,
}

impl Default for LexicalScope {
    fn default() -> Self {
        Self::new()
    }
}

impl LexicalScope {
    pub fn new() -> Self {
        LexicalScope {
            blocks: vec![BlockScope::new()],
        }
    }

    /// Enter a fresh block.
    pub fn push(&mut self) {
        self.blocks.push(BlockScope::new());
    }

    /// Re-enter a block saved by [`pop`](Self::pop).
    pub fn push_block(&mut self, block: BlockScope) {
        self.blocks.push(block);
    }

    /// Leave the innermost block, returning it. The root block is never popped.
    pub fn pop(&mut self) -> Option<BlockScope> {
        if self.blocks.len() > 1 {
            self.blocks.pop()
        } else {
            None
        }
    }

    /// Number of blocks, including the root.
    pub fn depth(&self) -> usize {
        self.blocks.len()
    }

    /// The innermost block, or the root block when none is pushed.
    pub fn innermost(&self) -> &BlockScope {
        let depth = self.blocks.len() - 1;
        &self.blocks[depth]
    }

    /// Drop blocks above `depth`; used to recover after an unwind.
    pub fn truncate(&mut self, depth: usize) {
        self.blocks.truncate(depth.max(1));
    }

    /// Declare `slot` in the innermost block; `false` if it is already
    /// declared there.
    pub fn declare(&mut self, slot: u32, flags: SymbolFlags, ty: Option<DeclaredType>) -> bool {
        let depth = self.blocks.len() - 1;
        Self::declare_in(&mut self.blocks[depth], slot, flags, ty)
    }

    /// Declare `slot` in the root block, replacing any earlier declaration.
    pub fn declare_root(&mut self, slot: u32, flags: SymbolFlags, ty: Option<DeclaredType>) {
        let root = &mut self.blocks[0];
        root.symbols.retain(|s| s.slot != slot);
        Self::declare_in(root, slot, flags, ty);
    }

    fn declare_in(
        block: &mut BlockScope,
        slot: u32,
        flags: SymbolFlags,
        ty: Option<DeclaredType>,
    ) -> bool {
        if block.find(slot).is_some() {
            return false;
        }
        block.symbols.push(Symbol {
            slot,
            flags: flags | SymbolFlags::DECLARED,
            ty,
        });
        true
    }

    /// Innermost visible declaration of `slot`.
    pub fn lookup(&self, slot: u32) -> Option<Symbol> {
        self.blocks.iter().rev().find_map(|b| b.find(slot).copied())
    }

    #[inline]
    pub fn is_declared(&self, slot: u32) -> bool {
        self.lookup(slot).is_some()
    }

    /// Whether the innermost block declares `slot`.
    pub fn declared_in_current(&self, slot: u32) -> bool {
        self.blocks
            .last()
            .is_some_and(|block| block.find(slot).is_some())
    }
}
