//! Tree-walking interpreter for Quill.
//!
//! # Architecture
//!
//! All evaluation goes through [`Interpreter::eval`], which dispatches on
//! the node's [`NodeKind`](quill_ir::NodeKind) in `eval.rs`. Helper modules
//! split the node kinds by concern:
//!
//! - `expressions` - literals, operators, assignment
//! - `access` - variables, properties, indexing, assignment targets
//! - `calls` - function, method, namespace and constructor calls, closures
//! - `statements` - blocks, declarations, loops, switch, try, and the
//!   suspension bookkeeping every sequencing construct performs
//!
//! # Tree Threading
//!
//! A closure carries the tree it was created from. Calling it builds a
//! child interpreter over that tree with a fresh frame whose parent is the
//! captured frame; the caller's call stack is cloned into the child
//! (clone-per-child), so no mutable state is shared between activations.
//!
//! # Suspension
//!
//! An interpreter owns a [`SuspensionMap`]. While `suspended` is set,
//! sequencing constructs take their record on entry and resume at the
//! recorded child; the `yield` that suspended clears the flag when it is
//! reached again. See [`crate::suspension`].

mod access;
mod builder;
mod calls;
mod eval;
mod expressions;
mod scope_guard;
mod statements;

#[cfg(test)]
mod tests;

pub use builder::InterpreterBuilder;
pub use scope_guard::ScopedInterpreter;

use std::sync::Arc;

use quill_ir::{DeclaredType, Declaration, NodeId, NodeKind, SharedTree};

use crate::diagnostics::CallStack;
use crate::errors::{cancelled, escaped_signal, return_type_mismatch};
use crate::frame::FrameRef;
use crate::policy::type_name;
use crate::scope::{LexicalScope, SymbolFlags};
use crate::suspension::{SuspensionMap, SuspensionRecord};
use crate::{
    Closure, ControlAction, EvalError, EvalErrorKind, EvalResult, Generator, Runtime, Value,
};

/// Tree-walking interpreter over one activation.
///
/// One interpreter evaluates one script or one closure call; it is not
/// shared between threads while evaluating. The tree and the runtime
/// collaborators are shared through `Arc`s.
pub struct Interpreter {
    pub(crate) tree: SharedTree,
    pub(crate) rt: Runtime,
    /// Slots of the current activation.
    pub(crate) frame: FrameRef,
    pub(crate) scopes: LexicalScope,
    pub(crate) records: SuspensionMap,
    /// Set while unwinding from, or descending back to, a suspended `yield`.
    pub(crate) suspended: bool,
    /// Value the resumed `yield` evaluates to.
    pub(crate) sent: Value,
    pub(crate) call_stack: CallStack,
}

impl Interpreter {
    pub fn tree(&self) -> &SharedTree {
        &self.tree
    }

    pub fn runtime(&self) -> &Runtime {
        &self.rt
    }

    pub fn frame(&self) -> &FrameRef {
        &self.frame
    }

    /// Run the root script with `args` bound to its parameters.
    ///
    /// A `return` anywhere in the script ends it with that value. The result
    /// is coerced to the script's declared return type, if any. Observed
    /// cancellation ends the script with null unless the options make it
    /// an error.
    #[tracing::instrument(level = "debug", skip_all, fields(args = args.len()))]
    pub fn execute(&mut self, args: &[Value]) -> Result<Value, EvalError> {
        let root = self.tree.root();
        let (params, return_type) = match self.tree.root_frame() {
            Some(layout) => (layout.param_count(), layout.return_type),
            None => return Err(EvalError::new("tree has no script root")),
        };
        self.scopes = LexicalScope::new();
        self.bind_args(params, args);
        self.declare_params(params);
        self.records.clear();
        self.suspended = false;

        let result = self.eval(root);
        self.records.clear();
        match self.finish(result, return_type) {
            Err(e) if e.kind == EvalErrorKind::Cancelled && !self.rt.options.cancellable => {
                tracing::debug!("evaluation cancelled");
                Ok(Value::Null)
            }
            other => other,
        }
    }

    /// Start the root script as a generator with `args` bound to its
    /// parameters.
    ///
    /// Nothing runs until the generator is first resumed. The generator
    /// evaluates against its own frame; this interpreter is left untouched.
    pub fn drive_generator(&self, args: &[Value]) -> Generator {
        let root = self.tree.root();
        let params = self.tree.root_frame().map_or(0, quill_ir::FrameLayout::param_count);
        let mut child = InterpreterBuilder::new(self.tree.clone())
            .runtime(self.rt.clone())
            .call_stack(self.call_stack.clone())
            .build();
        child.bind_args(params, args);
        child.declare_params(params);
        tracing::debug!(params, "generator created");
        Generator::new(child, root)
    }

    /// Create a closure for a lambda node, capturing the current frame.
    ///
    /// A lambda stored into a slot its own body refers to is written into
    /// that slot here, so the body can call itself.
    pub fn create_closure(&mut self, node: NodeId) -> Result<Value, EvalError> {
        let NodeKind::Lambda(lambda) = self.tree.kind(node) else {
            return Err(EvalError::new("not a lambda node"));
        };
        let closure = Arc::new(Closure {
            tree: self.tree.clone(),
            lambda,
            node,
            captured: self.frame.clone(),
            runtime: self.rt.clone(),
        });
        let value = Value::Closure(closure);
        if let Some(slot) = self.tree.lambda(lambda).self_slot {
            self.frame.set(slot, value.clone());
        }
        Ok(value)
    }

    /// Declare a variable in the scope its kind selects.
    ///
    /// Block-scoped declarations go to the innermost block and return
    /// `false` when the block already declares the slot. Function-scoped
    /// `var`s go to the root block and replace an earlier declaration.
    pub fn define_variable(&mut self, decl: &Declaration) -> bool {
        let mut flags = SymbolFlags::empty();
        if decl.kind == quill_ir::DeclKind::Const {
            flags |= SymbolFlags::FINAL;
        }
        if let Some(ty) = decl.ty {
            flags |= SymbolFlags::TYPED;
            if !ty.accepts_null() {
                flags |= SymbolFlags::REQUIRED;
            }
        }
        if decl.kind.is_block_scoped() || self.rt.options.is_lexical() {
            self.scopes.declare(decl.slot, flags, decl.ty)
        } else {
            self.scopes.declare_root(decl.slot, flags, decl.ty);
            true
        }
    }

    /// Declare the leading `count` slots as parameters in the root block.
    pub(crate) fn declare_params(&mut self, count: usize) {
        for slot in 0..count {
            let slot = u32::try_from(slot).unwrap_or(u32::MAX);
            self.scopes.declare_root(slot, SymbolFlags::empty(), None);
        }
    }

    fn bind_args(&self, params: usize, args: &[Value]) {
        for slot in 0..params {
            let value = args.get(slot).cloned().unwrap_or_default();
            self.frame.set(u32::try_from(slot).unwrap_or(u32::MAX), value);
        }
    }

    /// Turn the outcome of an activation body into its result.
    ///
    /// `return` is intercepted here; any other signal reaching an
    /// activation boundary is an error.
    pub(crate) fn finish(
        &self,
        result: EvalResult,
        return_type: Option<DeclaredType>,
    ) -> Result<Value, EvalError> {
        let value = match result {
            Ok(value) | Err(ControlAction::Return(value)) => value,
            Err(ControlAction::Error(e)) => return Err(self.call_stack.attach_backtrace(*e)),
            Err(ControlAction::Cancel) => return Err(cancelled()),
            Err(other) => return Err(escaped_signal(other.keyword())),
        };
        let Some(ty) = return_type else {
            return Ok(value);
        };
        if value.is_null() && !ty.accepts_null() {
            return Err(return_type_mismatch(type_name(ty.kind), "null"));
        }
        let got = value.type_name();
        self.rt
            .policy
            .coerce(value, ty)
            .map_err(|_| return_type_mismatch(type_name(ty.kind), got))
    }

    /// Unwind signal for an observed cancellation.
    #[inline]
    pub(crate) fn check_cancel(&self) -> Result<(), ControlAction> {
        if self.rt.is_cancelled() {
            return Err(ControlAction::Cancel);
        }
        Ok(())
    }

    /// Record of `node` when resuming, `None` when starting fresh.
    #[inline]
    pub(crate) fn take_record(&mut self, node: NodeId) -> Option<SuspensionRecord> {
        let record = self.records.take(node)?;
        self.suspended.then_some(record)
    }

    /// Pass `action` on, first recording `node`'s progress when a yield is
    /// unwinding.
    pub(crate) fn unwind_with(
        &mut self,
        node: NodeId,
        action: ControlAction,
        record: impl FnOnce(&Self) -> SuspensionRecord,
    ) -> ControlAction {
        if self.suspended {
            let record = record(self);
            self.records.insert(node, record);
        }
        action
    }
}

impl std::fmt::Debug for Interpreter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interpreter")
            .field("tree", &self.tree)
            .field("scope_depth", &self.scopes.depth())
            .field("records", &self.records.len())
            .field("suspended", &self.suspended)
            .field("call_depth", &self.call_stack.depth())
            .finish_non_exhaustive()
    }
}
