//! Flat syntax tree nodes.
//!
//! Nodes live in a [`SyntaxTree`](crate::SyntaxTree) arena and refer to each
//! other through [`NodeId`] indices. Per-node payload (operator, label,
//! declaration) is carried by the [`NodeKind`] variant, so the
//! evaluator dispatches with one exhaustive `match`.
//!
//! Optional children (a missing `else`, a `for(;;)` with no condition) are
//! stored as [`NodeId::INVALID`] so that a construct's child positions are
//! fixed and a suspension record can refer to them by index.

use std::fmt;

use crate::{Name, Span};

/// Index into the node arena.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct NodeId(u32);

impl NodeId {
    /// Invalid node ID (sentinel for absent optional children).
    pub const INVALID: NodeId = NodeId(u32::MAX);

    /// Create a new `NodeId`.
    #[inline]
    pub const fn new(index: u32) -> Self {
        NodeId(index)
    }

    /// Get the index into the arena.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Get the raw u32 value.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Check if this is a valid ID.
    #[inline]
    pub const fn is_valid(self) -> bool {
        self.0 != u32::MAX
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "NodeId({})", self.0)
        } else {
            write!(f, "NodeId::INVALID")
        }
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::INVALID
    }
}

/// Range of child ids in the tree's flattened child list.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct NodeRange {
    pub start: u32,
    pub len: u32,
}

impl NodeRange {
    /// Empty range.
    pub const EMPTY: NodeRange = NodeRange { start: 0, len: 0 };

    #[inline]
    pub const fn new(start: u32, len: u32) -> Self {
        NodeRange { start, len }
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub const fn len(&self) -> usize {
        self.len as usize
    }
}

/// Index into the tree's frame layout table.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct FrameId(pub u32);

/// Index into the tree's lambda table.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct LambdaId(pub u32);

/// A local variable reference resolved during lowering.
///
/// `hops` counts how many captured frames to walk outward (0 = the current
/// activation's frame); `slot` indexes that frame. The name is kept for
/// context fallback and diagnostics.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct LocalRef {
    pub hops: u16,
    pub slot: u32,
    pub name: Name,
}

/// How an identifier is resolved at runtime.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum VarRef {
    /// Frame slot, possibly in a captured frame.
    Local(LocalRef),
    /// No slot: resolved against the context by name.
    Context(Name),
}

impl VarRef {
    /// The source name of the variable.
    pub fn name(self) -> Name {
        match self {
            VarRef::Local(local) => local.name,
            VarRef::Context(name) => name,
        }
    }
}

/// Declaration keyword.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum DeclKind {
    /// `var`: function scoped unless the engine runs in lexical mode.
    Var,
    /// `let`: block scoped.
    Let,
    /// `const`: block scoped, final, initializer required.
    Const,
}

impl DeclKind {
    /// Whether this declaration is block scoped regardless of options.
    #[inline]
    pub fn is_block_scoped(self) -> bool {
        !matches!(self, DeclKind::Var)
    }
}

/// Primitive kinds a declaration or return type may name.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum TypeKind {
    Any,
    Bool,
    Int,
    Long,
    Double,
    Str,
}

impl TypeKind {
    /// Primitive kinds cannot hold null.
    #[inline]
    pub fn is_primitive(self) -> bool {
        matches!(
            self,
            TypeKind::Bool | TypeKind::Int | TypeKind::Long | TypeKind::Double
        )
    }
}

/// A declared variable or return type, e.g. `int`, `string?`.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct DeclaredType {
    pub kind: TypeKind,
    pub nullable: bool,
}

impl DeclaredType {
    /// Whether a null value is acceptable for this type.
    #[inline]
    pub fn accepts_null(self) -> bool {
        self.nullable && !self.kind.is_primitive()
    }
}

/// A variable declaration resolved to a frame slot.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Declaration {
    pub slot: u32,
    pub name: Name,
    pub kind: DeclKind,
    pub ty: Option<DeclaredType>,
}

/// Numeric literal payload.
#[derive(Copy, Clone, PartialEq, Debug)]
pub enum Number {
    Int(i32),
    Long(i64),
    Double(f64),
}

/// Binary operators that go through operator dispatch.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    UShr,
    Eq,
    NotEq,
    Identical,
    NotIdentical,
    Lt,
    LtEq,
    Gt,
    GtEq,
    /// `=~`
    Contains,
    /// `!~`
    NotContains,
    /// `=^`
    StartsWith,
    /// `!^`
    NotStartsWith,
    /// `=$`
    EndsWith,
    /// `!$`
    NotEndsWith,
}

impl BinaryOp {
    /// Source symbol, used in diagnostics.
    pub fn as_symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::UShr => ">>>",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Identical => "===",
            BinaryOp::NotIdentical => "!==",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::Contains => "=~",
            BinaryOp::NotContains => "!~",
            BinaryOp::StartsWith => "=^",
            BinaryOp::NotStartsWith => "!^",
            BinaryOp::EndsWith => "=$",
            BinaryOp::NotEndsWith => "!$",
        }
    }

    /// Operator name used for overload lookup and duck-typed probes.
    pub fn method_name(self) -> &'static str {
        match self {
            BinaryOp::Add => "add",
            BinaryOp::Sub => "subtract",
            BinaryOp::Mul => "multiply",
            BinaryOp::Div => "divide",
            BinaryOp::Mod => "mod",
            BinaryOp::BitAnd => "and",
            BinaryOp::BitOr => "or",
            BinaryOp::BitXor => "xor",
            BinaryOp::Shl => "shiftLeft",
            BinaryOp::Shr => "shiftRight",
            BinaryOp::UShr => "shiftRightUnsigned",
            BinaryOp::Eq | BinaryOp::NotEq => "equals",
            BinaryOp::Identical | BinaryOp::NotIdentical => "identical",
            BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => "compareTo",
            BinaryOp::Contains | BinaryOp::NotContains => "contains",
            BinaryOp::StartsWith | BinaryOp::NotStartsWith => "startsWith",
            BinaryOp::EndsWith | BinaryOp::NotEndsWith => "endsWith",
        }
    }

    /// The positive operator for negated forms (`!=` → `==`, `!~` → `=~`).
    pub fn negated_of(self) -> Option<BinaryOp> {
        match self {
            BinaryOp::NotEq => Some(BinaryOp::Eq),
            BinaryOp::NotIdentical => Some(BinaryOp::Identical),
            BinaryOp::NotContains => Some(BinaryOp::Contains),
            BinaryOp::NotStartsWith => Some(BinaryOp::StartsWith),
            BinaryOp::NotEndsWith => Some(BinaryOp::EndsWith),
            _ => None,
        }
    }

    /// Whether this operator yields a boolean.
    pub fn is_relational(self) -> bool {
        !matches!(
            self,
            BinaryOp::Add
                | BinaryOp::Sub
                | BinaryOp::Mul
                | BinaryOp::Div
                | BinaryOp::Mod
                | BinaryOp::BitAnd
                | BinaryOp::BitOr
                | BinaryOp::BitXor
                | BinaryOp::Shl
                | BinaryOp::Shr
                | BinaryOp::UShr
        )
    }
}

/// Unary operators.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum UnaryOp {
    Neg,
    Pos,
    Not,
    BitNot,
    /// `empty x`
    Empty,
    /// `size x`
    Size,
}

impl UnaryOp {
    pub fn as_symbol(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Pos => "+",
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "~",
            UnaryOp::Empty => "empty",
            UnaryOp::Size => "size",
        }
    }

    pub fn method_name(self) -> &'static str {
        match self {
            UnaryOp::Neg => "negate",
            UnaryOp::Pos => "positivize",
            UnaryOp::Not => "not",
            UnaryOp::BitNot => "complement",
            UnaryOp::Empty => "isEmpty",
            UnaryOp::Size => "size",
        }
    }
}

/// Increment/decrement operator.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum IncDecOp {
    Increment,
    Decrement,
}

/// Loop label; `None` for unlabeled loops and signals.
pub type Label = Option<Name>;

/// Node kind with its literal payload.
///
/// The comment on each variant lists its fixed child positions.
#[derive(Copy, Clone, PartialEq, Debug)]
pub enum NodeKind {
    // Roots
    /// Children: statements.
    Script(FrameId),
    /// Children: `[body]`.
    Lambda(LambdaId),

    // Literals
    Null,
    Bool(bool),
    Number(Number),
    Str(Name),
    /// Children: parts, concatenated as strings.
    Template,
    /// Children: `[low, high]`, inclusive.
    Range,
    /// Children: elements.
    ArrayLiteral { immutable: bool },
    /// Children: elements.
    SetLiteral { immutable: bool },
    /// Children: `MapEntry` nodes.
    MapLiteral { immutable: bool },
    /// Children: `[key, value]`.
    MapEntry,

    // References
    Identifier(VarRef),

    // Operators
    /// Children: `[left, right]`.
    Binary(BinaryOp),
    /// Children: `[left, right]`.
    And,
    /// Children: `[left, right]`.
    Or,
    /// `a ?? b`. Children: `[left, right]`.
    NullCoalesce,
    /// `a ?: b`. Children: `[left, right]`.
    Elvis,
    /// Children: `[cond, then, else]`.
    Ternary,
    /// Children: `[operand]`.
    Unary(UnaryOp),
    /// Children: `[target]`.
    IncDec { op: IncDecOp, prefix: bool },
    /// Children: `[target, value]`.
    Assign,
    /// Children: `[target, value]`.
    CompoundAssign(BinaryOp),

    // Access
    /// Children: `[object]`.
    Property { name: Name, safe: bool },
    /// Children: `[object, index]`.
    Index { safe: bool },

    // Calls
    /// Children: `[callee, args...]`.
    FunctionCall,
    /// Children: `[target, args...]`.
    MethodCall { name: Name, safe: bool },
    /// `ns:name(args)`. Children: args.
    NamespaceCall { namespace: Name, name: Name },
    /// `new(class, args...)`. Children: `[class, args...]`.
    Constructor,

    // Statements
    /// Children: statements.
    Block,
    /// Children: `[init]` (INVALID when absent).
    Declare(Declaration),
    /// Children: `[cond, then, else]`.
    If,
    /// Children: `[cond, body]`.
    While { label: Label },
    /// Children: `[body, cond]`.
    DoWhile { label: Label },
    /// Children: `[init, cond, step, body]`.
    For { label: Label },
    /// Children: `[iterable, body]`.
    Foreach {
        label: Label,
        var: Declaration,
    },
    /// Children: `[discriminant, cases...]`.
    Switch,
    /// Children: `[value, statements...]`.
    Case,
    /// Children: statements.
    DefaultCase,
    Break(Label),
    Continue(Label),
    Remove(Label),
    /// Children: `[value]` (INVALID when absent).
    Return,
    /// Children: `[value]` (INVALID when absent).
    Yield,
    /// Children: `[value]`.
    Throw,
    /// Children: `[body, catch, finally]`; `catch_var` receives the thrown value.
    Try { catch_var: Option<Declaration> },
    /// Children: `[args..., statement]`.
    Annotated { name: Name },
    /// Children: `[cond, message]` (message INVALID when absent).
    Assert,
    /// Empty statement.
    Empty,
}

impl NodeKind {
    /// Constructs that keep suspension records and create resume points.
    pub fn is_sequencing(&self) -> bool {
        matches!(
            self,
            NodeKind::Script(_)
                | NodeKind::Block
                | NodeKind::If
                | NodeKind::While { .. }
                | NodeKind::DoWhile { .. }
                | NodeKind::For { .. }
                | NodeKind::Foreach { .. }
                | NodeKind::Switch
                | NodeKind::Case
                | NodeKind::DefaultCase
                | NodeKind::Try { .. }
        )
    }

    /// Loop label, if this node is a loop.
    pub fn loop_label(&self) -> Option<Label> {
        match self {
            NodeKind::While { label }
            | NodeKind::DoWhile { label }
            | NodeKind::For { label }
            | NodeKind::Foreach { label, .. } => Some(*label),
            _ => None,
        }
    }
}

/// A node in the arena.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct Node {
    pub kind: NodeKind,
    pub children: NodeRange,
    pub span: Span,
}
