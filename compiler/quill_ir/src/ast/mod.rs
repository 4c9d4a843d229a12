//! Owned surface syntax tree.
//!
//! This is the shape a parser hands to the engine: nested, boxed, named by
//! strings. [`lower`](crate::lower) resolves its identifiers to frame slots
//! and flattens it into a [`SyntaxTree`](crate::SyntaxTree).
//!
//! The [`build`] module has one constructor function per form so hosts and
//! tests can assemble trees without a parser.

pub mod build;

use crate::node::{BinaryOp, DeclKind, DeclaredType, IncDecOp, UnaryOp};
use crate::Span;

/// A lambda or script parameter.
#[derive(Clone, Debug, PartialEq)]
pub struct Param {
    pub name: String,
}

/// One `case` arm; `value` is `None` for `default`.
#[derive(Clone, Debug, PartialEq)]
pub struct SwitchCase {
    pub value: Option<Ast>,
    pub body: Vec<Ast>,
}

/// A `catch (name) { ... }` clause.
#[derive(Clone, Debug, PartialEq)]
pub struct CatchClause {
    pub kind: DeclKind,
    pub name: String,
    pub body: Box<Ast>,
}

/// A top-level script.
#[derive(Clone, Debug, PartialEq)]
pub struct Script {
    pub params: Vec<Param>,
    pub return_type: Option<DeclaredType>,
    pub body: Vec<Ast>,
}

/// Surface syntax node.
#[derive(Clone, Debug, PartialEq)]
pub enum Ast {
    /// Attach a source span to the wrapped node.
    At(Span, Box<Ast>),

    // Literals
    Null,
    Bool(bool),
    Int(i64),
    Double(f64),
    Str(String),
    Template(Vec<Ast>),
    Range(Box<Ast>, Box<Ast>),
    Array {
        items: Vec<Ast>,
        immutable: bool,
    },
    Set {
        items: Vec<Ast>,
        immutable: bool,
    },
    Map {
        entries: Vec<(Ast, Ast)>,
        immutable: bool,
    },

    Ident(String),

    // Operators
    Binary(BinaryOp, Box<Ast>, Box<Ast>),
    And(Box<Ast>, Box<Ast>),
    Or(Box<Ast>, Box<Ast>),
    NullCoalesce(Box<Ast>, Box<Ast>),
    Elvis(Box<Ast>, Box<Ast>),
    Ternary(Box<Ast>, Box<Ast>, Box<Ast>),
    Unary(UnaryOp, Box<Ast>),
    IncDec {
        op: IncDecOp,
        prefix: bool,
        target: Box<Ast>,
    },
    Assign(Box<Ast>, Box<Ast>),
    CompoundAssign(BinaryOp, Box<Ast>, Box<Ast>),

    // Access
    Property {
        object: Box<Ast>,
        name: String,
        safe: bool,
    },
    Index {
        object: Box<Ast>,
        index: Box<Ast>,
        safe: bool,
    },

    // Calls
    Call {
        callee: Box<Ast>,
        args: Vec<Ast>,
    },
    MethodCall {
        target: Box<Ast>,
        name: String,
        args: Vec<Ast>,
        safe: bool,
    },
    NamespaceCall {
        namespace: String,
        name: String,
        args: Vec<Ast>,
    },
    New {
        class: Box<Ast>,
        args: Vec<Ast>,
    },
    Lambda {
        params: Vec<Param>,
        return_type: Option<DeclaredType>,
        body: Box<Ast>,
    },

    // Statements
    Block(Vec<Ast>),
    Declare {
        kind: DeclKind,
        name: String,
        ty: Option<DeclaredType>,
        init: Option<Box<Ast>>,
    },
    If {
        cond: Box<Ast>,
        then_branch: Box<Ast>,
        else_branch: Option<Box<Ast>>,
    },
    While {
        label: Option<String>,
        cond: Box<Ast>,
        body: Box<Ast>,
    },
    DoWhile {
        label: Option<String>,
        body: Box<Ast>,
        cond: Box<Ast>,
    },
    For {
        label: Option<String>,
        init: Option<Box<Ast>>,
        cond: Option<Box<Ast>>,
        step: Option<Box<Ast>>,
        body: Box<Ast>,
    },
    Foreach {
        label: Option<String>,
        kind: DeclKind,
        var: String,
        iterable: Box<Ast>,
        body: Box<Ast>,
    },
    Switch {
        discriminant: Box<Ast>,
        cases: Vec<SwitchCase>,
    },
    Break(Option<String>),
    Continue(Option<String>),
    Remove(Option<String>),
    Return(Option<Box<Ast>>),
    Yield(Option<Box<Ast>>),
    Throw(Box<Ast>),
    Try {
        body: Box<Ast>,
        catch: Option<CatchClause>,
        finally: Option<Box<Ast>>,
    },
    Annotated {
        name: String,
        args: Vec<Ast>,
        statement: Box<Ast>,
    },
    Assert {
        cond: Box<Ast>,
        message: Option<Box<Ast>>,
    },
    Empty,
}

impl Ast {
    /// Wrap this node with a source span.
    #[must_use]
    pub fn at(self, span: Span) -> Ast {
        Ast::At(span, Box::new(self))
    }

    /// Strip any span wrappers.
    pub fn unspanned(&self) -> &Ast {
        match self {
            Ast::At(_, inner) => inner.unspanned(),
            other => other,
        }
    }
}
