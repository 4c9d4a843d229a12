//! The immutable syntax tree arena.
//!
//! A `SyntaxTree` is produced once (by [`lower`](crate::lower)) and then only
//! read. The evaluator keeps its per-node mutable state (call-site memos and
//! suspension records) in side tables keyed by [`NodeKey`], so a tree can be
//! shared between interpreters and generators behind an `Arc`.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use crate::node::{DeclaredType, FrameId, LambdaId, Node, NodeId, NodeKind, NodeRange};
use crate::{Name, SharedInterner, Span};

/// Process-unique identity of a tree.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct TreeId(u32);

impl TreeId {
    fn fresh() -> Self {
        static NEXT: AtomicU32 = AtomicU32::new(0);
        TreeId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Node identity across trees, used as a side-table key.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct NodeKey {
    pub tree: TreeId,
    pub node: NodeId,
}

/// Slot layout of one activation (script or lambda).
#[derive(Clone, Debug, PartialEq)]
pub struct FrameLayout {
    /// Source name per slot; parameters come first.
    pub slots: Vec<Name>,
    /// Number of leading slots that are parameters.
    pub params: u32,
    /// Declared return type, if any.
    pub return_type: Option<DeclaredType>,
    /// Whether the body contains a `yield` (outside nested lambdas).
    pub generator: bool,
}

impl FrameLayout {
    #[inline]
    pub fn size(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn param_count(&self) -> usize {
        self.params as usize
    }
}

/// Lambda metadata resolved during lowering.
#[derive(Clone, Debug, PartialEq)]
pub struct LambdaInfo {
    pub frame: FrameId,
    /// Slot of the defining frame that receives this lambda, when the lambda's
    /// body refers to that same slot (a recursive closure).
    pub self_slot: Option<u32>,
}

/// Shared, immutable syntax tree.
pub type SharedTree = Arc<SyntaxTree>;

/// Flat arena of nodes.
pub struct SyntaxTree {
    id: TreeId,
    nodes: Vec<Node>,
    child_ids: Vec<NodeId>,
    frames: Vec<FrameLayout>,
    lambdas: Vec<LambdaInfo>,
    root: NodeId,
    interner: SharedInterner,
}

impl SyntaxTree {
    pub(crate) fn new(interner: SharedInterner) -> Self {
        SyntaxTree {
            id: TreeId::fresh(),
            nodes: Vec::new(),
            child_ids: Vec::new(),
            frames: Vec::new(),
            lambdas: Vec::new(),
            root: NodeId::INVALID,
            interner,
        }
    }

    pub(crate) fn push(&mut self, kind: NodeKind, children: &[NodeId], span: Span) -> NodeId {
        let start = u32::try_from(self.child_ids.len()).unwrap_or(u32::MAX);
        let len = u32::try_from(children.len()).unwrap_or(u32::MAX);
        self.child_ids.extend_from_slice(children);
        let id = NodeId::new(u32::try_from(self.nodes.len()).unwrap_or(u32::MAX));
        self.nodes.push(Node {
            kind,
            children: NodeRange::new(start, len),
            span,
        });
        id
    }

    pub(crate) fn push_frame(&mut self, layout: FrameLayout) -> FrameId {
        self.frames.push(layout);
        FrameId(u32::try_from(self.frames.len() - 1).unwrap_or(u32::MAX))
    }

    pub(crate) fn frame_mut(&mut self, id: FrameId) -> &mut FrameLayout {
        &mut self.frames[id.0 as usize]
    }

    pub(crate) fn push_lambda(&mut self, info: LambdaInfo) -> LambdaId {
        self.lambdas.push(info);
        LambdaId(u32::try_from(self.lambdas.len() - 1).unwrap_or(u32::MAX))
    }

    pub(crate) fn set_root(&mut self, root: NodeId) {
        self.root = root;
    }

    /// Tree identity.
    #[inline]
    pub fn id(&self) -> TreeId {
        self.id
    }

    /// Side-table key for a node of this tree.
    #[inline]
    pub fn key(&self, node: NodeId) -> NodeKey {
        NodeKey {
            tree: self.id,
            node,
        }
    }

    /// The root `Script` node.
    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    #[inline]
    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.nodes[id.index()].kind
    }

    #[inline]
    pub fn span(&self, id: NodeId) -> Span {
        self.nodes[id.index()].span
    }

    /// All children of a node, including `INVALID` placeholders.
    #[inline]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        let range = self.nodes[id.index()].children;
        let start = range.start as usize;
        &self.child_ids[start..start + range.len()]
    }

    /// The `i`-th child, or `INVALID` when out of range.
    #[inline]
    pub fn child(&self, id: NodeId, i: usize) -> NodeId {
        self.children(id).get(i).copied().unwrap_or(NodeId::INVALID)
    }

    #[inline]
    pub fn child_count(&self, id: NodeId) -> usize {
        self.nodes[id.index()].children.len()
    }

    #[inline]
    pub fn frame(&self, id: FrameId) -> &FrameLayout {
        &self.frames[id.0 as usize]
    }

    #[inline]
    pub fn lambda(&self, id: LambdaId) -> &LambdaInfo {
        &self.lambdas[id.0 as usize]
    }

    /// Layout of the root script's frame.
    pub fn root_frame(&self) -> Option<&FrameLayout> {
        match self.nodes.get(self.root.index())?.kind {
            NodeKind::Script(frame) => Some(self.frame(frame)),
            _ => None,
        }
    }

    /// Number of nodes.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub fn interner(&self) -> &SharedInterner {
        &self.interner
    }

    /// Resolve an interned name.
    #[inline]
    pub fn name(&self, name: Name) -> &'static str {
        self.interner.lookup(name)
    }
}

impl std::fmt::Debug for SyntaxTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyntaxTree")
            .field("id", &self.id)
            .field("nodes", &self.nodes.len())
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}
