//! Generators: resumable evaluations of a yielding body.
//!
//! A generator owns the interpreter that evaluates its body, including the
//! frame, the block scopes and the suspension records. Each `resume`
//! re-enters evaluation at the body root; the records steer it back to the
//! suspended `yield`, which evaluates to the value sent in.

use std::sync::Arc;

use parking_lot::Mutex;
use quill_ir::NodeId;

use crate::diagnostics::ensure_sufficient_stack;
use crate::errors::{cancelled, escaped_signal, generator_running};
use crate::{ControlAction, EvalError, Interpreter, Value};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Status {
    /// Created, body not entered yet.
    Ready,
    /// Stopped at a `yield`.
    Suspended,
    /// Completed, failed or closed.
    Done,
}

struct GeneratorState {
    interpreter: Interpreter,
    root: NodeId,
    status: Status,
}

/// Handle to a resumable evaluation.
///
/// Cloning shares the underlying state; all clones observe the same
/// progress.
#[derive(Clone)]
pub struct Generator(Arc<Mutex<GeneratorState>>);

impl Generator {
    pub(crate) fn new(interpreter: Interpreter, root: NodeId) -> Self {
        Generator(Arc::new(Mutex::new(GeneratorState {
            interpreter,
            root,
            status: Status::Ready,
        })))
    }

    /// Run until the next `yield`, delivering `sent` as the value of the
    /// `yield` expression that suspended last.
    ///
    /// `Ok(None)` once the body has completed. A generator that fails is
    /// done afterwards. Resuming a generator from inside its own body is an
    /// error.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn resume(&self, sent: Value) -> Result<Option<Value>, EvalError> {
        let Some(mut state) = self.0.try_lock() else {
            return Err(generator_running());
        };
        let resuming = match state.status {
            Status::Done => return Ok(None),
            Status::Ready => false,
            Status::Suspended => true,
        };
        let root = state.root;
        let interpreter = &mut state.interpreter;
        interpreter.suspended = resuming;
        interpreter.sent = sent;
        let result = ensure_sufficient_stack(|| interpreter.eval(root));
        interpreter.suspended = false;

        let outcome = match result {
            Err(ControlAction::Yield(value)) => {
                state.status = Status::Suspended;
                tracing::debug!(records = state.interpreter.records.len(), "generator suspended");
                return Ok(Some(value));
            }
            Ok(_) | Err(ControlAction::Return(_)) => Ok(None),
            Err(ControlAction::Error(e)) => Err(state.interpreter.call_stack.attach_backtrace(*e)),
            Err(ControlAction::Cancel) => Err(cancelled()),
            Err(other) => Err(escaped_signal(other.keyword())),
        };
        state.status = Status::Done;
        state.interpreter.records.clear();
        tracing::debug!(failed = outcome.is_err(), "generator completed");
        outcome
    }

    /// Resume with null.
    pub fn next_value(&self) -> Result<Option<Value>, EvalError> {
        self.resume(Value::Null)
    }

    /// Whether the generator can produce no more values.
    ///
    /// A generator that is currently running reports `false`.
    pub fn is_done(&self) -> bool {
        self.0
            .try_lock()
            .is_some_and(|state| state.status == Status::Done)
    }

    /// Abandon the generator, closing any host iterators it holds.
    pub fn close(&self) {
        if let Some(mut state) = self.0.try_lock() {
            state.status = Status::Done;
            state.interpreter.records.clear();
        }
    }

    pub fn ptr_eq(&self, other: &Generator) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Iterator for Generator {
    type Item = Result<Value, EvalError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.resume(Value::Null).transpose()
    }
}

impl std::fmt::Debug for Generator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = self.0.try_lock().map(|state| state.status);
        f.debug_struct("Generator").field("status", &status).finish()
    }
}
