//! Surface AST → flat `SyntaxTree` lowering.
//!
//! Lowering does three things in one walk:
//! - flattens boxed [`Ast`] nodes into the arena, fixing each construct's
//!   child positions (absent optional children become `NodeId::INVALID`);
//! - resolves every identifier ahead of evaluation to a frame slot plus a
//!   hop count through captured frames, or to a context name when no
//!   declaration is visible;
//! - records per-frame facts the evaluator needs up front: slot layouts,
//!   whether a body yields, and which slot a recursive lambda is bound to.
//!
//! `var` declarations land in the enclosing function's top block, `let` and
//! `const` in the innermost block. Redeclaring a name in the same block
//! reuses its slot; rejecting the redefinition is a runtime concern because
//! it depends on the engine's lexical options.

mod expr;
mod statements;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::ast::{Ast, Param, Script};
use crate::node::{DeclKind, FrameId, LocalRef, NodeId, NodeKind, VarRef};
use crate::tree::{FrameLayout, SharedTree, SyntaxTree};
use crate::{Name, SharedInterner, Span};

/// Errors detected while lowering.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LowerError {
    #[error("const `{name}` must be initialized")]
    ConstWithoutInit { name: String, span: Span },
    #[error("invalid assignment target")]
    InvalidAssignTarget { span: Span },
    #[error("duplicate parameter `{name}`")]
    DuplicateParameter { name: String, span: Span },
    #[error("functions nested too deeply")]
    TooDeep { span: Span },
}

/// Lower a script into a shared, immutable tree.
pub fn lower(script: &Script, interner: &SharedInterner) -> Result<SharedTree, LowerError> {
    let mut lowerer = Lowerer::new(interner.clone());
    let root = lowerer.lower_script(script)?;
    lowerer.tree.set_root(root);
    Ok(Arc::new(lowerer.tree))
}

/// Per-function resolution state.
struct FunctionScope {
    frame: FrameId,
    /// Name → slot maps; index 0 is the function's top block.
    blocks: Vec<FxHashMap<Name, u32>>,
    has_yield: bool,
    /// `(function depth, slot)` pairs read from enclosing functions.
    outer_refs: FxHashSet<(usize, u32)>,
}

impl FunctionScope {
    fn new(frame: FrameId) -> Self {
        FunctionScope {
            frame,
            blocks: vec![FxHashMap::default()],
            has_yield: false,
            outer_refs: FxHashSet::default(),
        }
    }
}

pub(crate) struct Lowerer {
    tree: SyntaxTree,
    functions: Vec<FunctionScope>,
    interner: SharedInterner,
    /// Span of the innermost `Ast::At` being lowered.
    span: Span,
}

type LowerResult = Result<NodeId, LowerError>;

impl Lowerer {
    fn new(interner: SharedInterner) -> Self {
        Lowerer {
            tree: SyntaxTree::new(interner.clone()),
            functions: Vec::new(),
            interner,
            span: Span::DUMMY,
        }
    }

    fn push(&mut self, kind: NodeKind, children: &[NodeId]) -> NodeId {
        self.tree.push(kind, children, self.span)
    }

    fn intern(&self, s: &str) -> Name {
        self.interner.intern(s)
    }

    fn current(&mut self) -> &mut FunctionScope {
        let depth = self.functions.len() - 1;
        &mut self.functions[depth]
    }

    fn enter_block(&mut self) {
        self.current().blocks.push(FxHashMap::default());
    }

    fn exit_block(&mut self) {
        self.current().blocks.pop();
    }

    /// Run `f` inside a fresh block; the block is exited on every path.
    fn in_block<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T, LowerError>) -> Result<T, LowerError> {
        self.enter_block();
        let result = f(self);
        self.exit_block();
        result
    }

    /// Bind `name` in the block its declaration kind selects, returning its slot.
    fn declare(&mut self, name: Name, kind: DeclKind) -> u32 {
        let scope = self.current();
        let block = if kind.is_block_scoped() {
            scope.blocks.len() - 1
        } else {
            0
        };
        if let Some(&slot) = scope.blocks[block].get(&name) {
            return slot;
        }
        let frame = scope.frame;
        let layout = self.tree.frame_mut(frame);
        let slot = u32::try_from(layout.slots.len()).unwrap_or(u32::MAX);
        layout.slots.push(name);
        self.current().blocks[block].insert(name, slot);
        slot
    }

    /// Resolve a name against the visible declarations, innermost first.
    fn resolve(&mut self, name: Name) -> Result<VarRef, LowerError> {
        let depth = self.functions.len();
        for fi in (0..depth).rev() {
            let found = self.functions[fi]
                .blocks
                .iter()
                .rev()
                .find_map(|block| block.get(&name).copied());
            if let Some(slot) = found {
                for inner in &mut self.functions[fi + 1..] {
                    inner.outer_refs.insert((fi, slot));
                }
                let hops = u16::try_from(depth - 1 - fi)
                    .map_err(|_| LowerError::TooDeep { span: self.span })?;
                return Ok(VarRef::Local(LocalRef { hops, slot, name }));
            }
        }
        Ok(VarRef::Context(name))
    }

    fn lower_script(&mut self, script: &Script) -> LowerResult {
        let frame = self.tree.push_frame(FrameLayout {
            slots: Vec::new(),
            params: param_count(&script.params),
            return_type: script.return_type,
            generator: false,
        });
        self.functions.push(FunctionScope::new(frame));
        self.declare_params(&script.params)?;
        let mut stmts = Vec::with_capacity(script.body.len());
        for stmt in &script.body {
            stmts.push(self.lower_node(stmt)?);
        }
        let scope = self.functions.pop();
        if let Some(scope) = scope {
            self.tree.frame_mut(frame).generator = scope.has_yield;
        }
        Ok(self.push(NodeKind::Script(frame), &stmts))
    }

    fn declare_params(&mut self, params: &[Param]) -> Result<(), LowerError> {
        let mut seen = FxHashSet::default();
        for param in params {
            let name = self.intern(&param.name);
            if !seen.insert(name) {
                return Err(LowerError::DuplicateParameter {
                    name: param.name.clone(),
                    span: self.span,
                });
            }
            self.declare(name, DeclKind::Var);
        }
        Ok(())
    }

    /// Lower any node, tracking the span of the innermost `At` wrapper.
    pub(crate) fn lower_node(&mut self, ast: &Ast) -> LowerResult {
        match ast {
            Ast::At(span, inner) => {
                let saved = std::mem::replace(&mut self.span, *span);
                let result = self.lower_node(inner);
                self.span = saved;
                result
            }

            Ast::Null
            | Ast::Bool(_)
            | Ast::Int(_)
            | Ast::Double(_)
            | Ast::Str(_)
            | Ast::Template(_)
            | Ast::Range(..)
            | Ast::Array { .. }
            | Ast::Set { .. }
            | Ast::Map { .. } => self.lower_literal(ast),

            Ast::Ident(name) => {
                let name = self.intern(name);
                let var = self.resolve(name)?;
                Ok(self.push(NodeKind::Identifier(var), &[]))
            }

            Ast::Binary(..)
            | Ast::And(..)
            | Ast::Or(..)
            | Ast::NullCoalesce(..)
            | Ast::Elvis(..)
            | Ast::Ternary(..)
            | Ast::Unary(..) => self.lower_operator(ast),

            Ast::IncDec { op, prefix, target } => {
                let target = self.lower_target(target)?;
                Ok(self.push(
                    NodeKind::IncDec {
                        op: *op,
                        prefix: *prefix,
                    },
                    &[target],
                ))
            }
            Ast::Assign(target, value) => self.lower_assign(target, value, None),
            Ast::CompoundAssign(op, target, value) => self.lower_assign(target, value, Some(*op)),

            Ast::Property { .. }
            | Ast::Index { .. }
            | Ast::Call { .. }
            | Ast::MethodCall { .. }
            | Ast::NamespaceCall { .. }
            | Ast::New { .. } => self.lower_access(ast),

            Ast::Lambda {
                params,
                return_type,
                body,
            } => self.lower_lambda(params, *return_type, body, None),

            Ast::Block(stmts) => self.lower_block(stmts),
            Ast::Declare {
                kind,
                name,
                ty,
                init,
            } => self.lower_declare(*kind, name, *ty, init.as_deref()),
            Ast::If {
                cond,
                then_branch,
                else_branch,
            } => {
                let cond = self.lower_node(cond)?;
                let then_branch = self.lower_node(then_branch)?;
                let else_branch = self.lower_opt(else_branch.as_deref())?;
                Ok(self.push(NodeKind::If, &[cond, then_branch, else_branch]))
            }
            Ast::While { label, cond, body } => {
                let label = self.label(label.as_ref());
                let cond = self.lower_node(cond)?;
                let body = self.lower_node(body)?;
                Ok(self.push(NodeKind::While { label }, &[cond, body]))
            }
            Ast::DoWhile { label, body, cond } => {
                let label = self.label(label.as_ref());
                let body = self.lower_node(body)?;
                let cond = self.lower_node(cond)?;
                Ok(self.push(NodeKind::DoWhile { label }, &[body, cond]))
            }
            Ast::For {
                label,
                init,
                cond,
                step,
                body,
            } => self.lower_for(
                label.as_ref(),
                init.as_deref(),
                cond.as_deref(),
                step.as_deref(),
                body,
            ),
            Ast::Foreach {
                label,
                kind,
                var,
                iterable,
                body,
            } => self.lower_foreach(label.as_ref(), *kind, var, iterable, body),
            Ast::Switch {
                discriminant,
                cases,
            } => self.lower_switch(discriminant, cases),
            Ast::Break(label) => {
                let label = self.label(label.as_ref());
                Ok(self.push(NodeKind::Break(label), &[]))
            }
            Ast::Continue(label) => {
                let label = self.label(label.as_ref());
                Ok(self.push(NodeKind::Continue(label), &[]))
            }
            Ast::Remove(label) => {
                let label = self.label(label.as_ref());
                Ok(self.push(NodeKind::Remove(label), &[]))
            }
            Ast::Return(value) => {
                let value = self.lower_opt(value.as_deref())?;
                Ok(self.push(NodeKind::Return, &[value]))
            }
            Ast::Yield(value) => {
                self.current().has_yield = true;
                let value = self.lower_opt(value.as_deref())?;
                Ok(self.push(NodeKind::Yield, &[value]))
            }
            Ast::Throw(value) => {
                let value = self.lower_node(value)?;
                Ok(self.push(NodeKind::Throw, &[value]))
            }
            Ast::Try {
                body,
                catch,
                finally,
            } => self.lower_try(body, catch.as_ref(), finally.as_deref()),
            Ast::Annotated {
                name,
                args,
                statement,
            } => {
                let name = self.intern(name);
                let mut children = self.lower_all(args)?;
                children.push(self.lower_node(statement)?);
                Ok(self.push(NodeKind::Annotated { name }, &children))
            }
            Ast::Assert { cond, message } => {
                let cond = self.lower_node(cond)?;
                let message = self.lower_opt(message.as_deref())?;
                Ok(self.push(NodeKind::Assert, &[cond, message]))
            }
            Ast::Empty => Ok(self.push(NodeKind::Empty, &[])),
        }
    }

    /// Lower an optional child, using `INVALID` when absent.
    fn lower_opt(&mut self, ast: Option<&Ast>) -> LowerResult {
        match ast {
            Some(ast) => self.lower_node(ast),
            None => Ok(NodeId::INVALID),
        }
    }

    fn lower_all(&mut self, items: &[Ast]) -> Result<Vec<NodeId>, LowerError> {
        items.iter().map(|item| self.lower_node(item)).collect()
    }

    fn label(&self, label: Option<&String>) -> Option<Name> {
        label.map(|l| self.intern(l))
    }
}

fn param_count(params: &[Param]) -> u32 {
    u32::try_from(params.len()).unwrap_or(u32::MAX)
}
