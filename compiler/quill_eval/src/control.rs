//! Non-local control flow.
//!
//! Every evaluation step returns `Result<Value, ControlAction>`: the `Err`
//! side carries both typed signals (`return`, `break`, `yield`, ...) and
//! errors, so `?` unwinds through enclosing constructs until one that
//! handles the action intercepts it.

use quill_ir::Label;

use crate::{EvalError, Value};

/// A non-local exit travelling up the evaluation stack.
#[derive(Clone, Debug)]
pub enum ControlAction {
    /// `return value` unwinding to the activation boundary.
    Return(Value),
    /// `break [label]` unwinding to the matching loop or switch.
    Break(Label),
    /// `continue [label]` unwinding to the matching loop.
    Continue(Label),
    /// `remove [label]`: drop the current element and continue.
    Remove(Label),
    /// `yield value`: suspend the enclosing generator.
    Yield(Value),
    /// Cancellation was observed.
    Cancel,
    /// A runtime error.
    Error(Box<EvalError>),
}

impl ControlAction {
    /// Short keyword for diagnostics.
    pub fn keyword(&self) -> &'static str {
        match self {
            ControlAction::Return(_) => "return",
            ControlAction::Break(_) => "break",
            ControlAction::Continue(_) => "continue",
            ControlAction::Remove(_) => "remove",
            ControlAction::Yield(_) => "yield",
            ControlAction::Cancel => "cancel",
            ControlAction::Error(_) => "error",
        }
    }

    /// Whether a loop signal carrying `signal` is meant for the loop labeled `label`.
    ///
    /// An unlabeled signal matches the innermost loop.
    #[inline]
    pub(crate) fn targets(label: quill_ir::Label, signal: quill_ir::Label) -> bool {
        signal.is_none() || signal == label
    }
}

impl From<EvalError> for ControlAction {
    #[cold]
    fn from(err: EvalError) -> Self {
        ControlAction::Error(Box::new(err))
    }
}

/// Result of evaluating one node.
pub type EvalResult = Result<Value, ControlAction>;
