//! Quill IR - syntax trees for the Quill evaluation engine
//!
//! This crate contains the data structures the evaluator walks:
//! - Spans for source locations
//! - Names for interned identifiers
//! - The owned surface AST a parser produces ([`ast`])
//! - Lowering from the surface AST to a flat, slot-resolved tree ([`lower`])
//! - The immutable [`SyntaxTree`] arena and its node kinds
//!
//! # Design Philosophy
//!
//! - **Intern Everything**: identifiers and string literals → `Name(u32)`
//! - **Flatten Everything**: nodes refer to children through `NodeId(u32)`
//! - **Resolve Early**: identifiers become frame slots before evaluation
//! - **Immutable Trees**: per-node runtime state lives in side tables keyed
//!   by [`NodeKey`], never in the tree

/// Compile-time assertion that a type has a specific size.
///
/// Used to prevent accidental size regressions in frequently-allocated types.
#[macro_export]
macro_rules! static_assert_size {
    ($ty:ty, $size:expr) => {
        const _: [(); $size] = [(); ::std::mem::size_of::<$ty>()];
    };
}

pub mod ast;
mod interner;
pub mod lower;
mod name;
pub mod node;
mod span;
mod tree;

pub use interner::{InternError, SharedInterner, StringInterner};
pub use lower::{lower, LowerError};
pub use name::Name;
pub use node::{
    BinaryOp, DeclKind, DeclaredType, Declaration, FrameId, IncDecOp, Label, LambdaId, LocalRef,
    Node, NodeId, NodeKind, NodeRange, Number, TypeKind, UnaryOp, VarRef,
};
pub use span::Span;
pub use tree::{FrameLayout, LambdaInfo, NodeKey, SharedTree, SyntaxTree, TreeId};

#[cfg(target_pointer_width = "64")]
mod size_asserts {
    use super::{LocalRef, NodeId};
    crate::static_assert_size!(NodeId, 4);
    crate::static_assert_size!(LocalRef, 12);
}
