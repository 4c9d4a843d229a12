//! Call tracking and stack safety for the evaluator.
//!
//! - `CallStack` tracks nested closure calls, enforces the depth limit and
//!   captures backtraces at error sites.
//! - `ensure_sufficient_stack` grows the native stack before deep
//!   recursion.

use quill_ir::Span;

use crate::errors::{recursion_limit_exceeded, BacktraceFrame, EvalBacktrace};
use crate::EvalError;

/// One live call.
#[derive(Clone, Debug)]
pub struct CallFrame {
    /// Callee name; `<lambda>` for closures called through an expression.
    pub name: &'static str,
    /// Where the call was made.
    pub call_span: Option<Span>,
}

/// Live call stack.
///
/// # Clone-per-child model
///
/// A closure call clones the caller's stack into the child interpreter
/// and pushes onto the clone, so no state is shared between activations.
/// A generator keeps the clone it was created with.
#[derive(Clone, Debug)]
pub struct CallStack {
    frames: Vec<CallFrame>,
    max_depth: Option<usize>,
}

impl CallStack {
    /// `max_depth` of `None` means unlimited.
    pub fn new(max_depth: Option<usize>) -> Self {
        Self {
            frames: Vec::new(),
            max_depth,
        }
    }

    /// Push a frame; fails with `StackOverflow` at the depth limit, in
    /// which case nothing is pushed.
    pub fn push(&mut self, frame: CallFrame) -> Result<(), EvalError> {
        if let Some(max) = self.max_depth {
            if self.frames.len() >= max {
                return Err(recursion_limit_exceeded(max));
            }
        }
        self.frames.push(frame);
        Ok(())
    }

    pub fn pop(&mut self) {
        debug_assert!(
            !self.frames.is_empty(),
            "CallStack::pop() called on empty stack"
        );
        self.frames.pop();
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Snapshot, most recent call first.
    pub fn capture(&self) -> EvalBacktrace {
        EvalBacktrace::new(
            self.frames
                .iter()
                .rev()
                .map(|f| BacktraceFrame {
                    name: f.name.to_string(),
                    span: f.call_span,
                })
                .collect(),
        )
    }

    /// Attach a backtrace unless the error already has one or the stack is
    /// empty.
    pub fn attach_backtrace(&self, err: EvalError) -> EvalError {
        if self.frames.is_empty() || err.backtrace.is_some() {
            return err;
        }
        err.with_backtrace(self.capture())
    }
}

impl Default for CallStack {
    fn default() -> Self {
        Self::new(None)
    }
}

/// Run `f` with at least a red zone of native stack available.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    /// Remaining stack below which a new segment is allocated (128KB).
    const RED_ZONE: usize = 128 * 1024;
    /// Size of each newly allocated segment (2MB).
    const SEGMENT: usize = 2 * 1024 * 1024;

    stacker::maybe_grow(RED_ZONE, SEGMENT, f)
}

/// WASM manages its own stack.
#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::EvalErrorKind;

    fn frame(name: &'static str) -> CallFrame {
        CallFrame {
            name,
            call_span: Some(Span::new(0, 1)),
        }
    }

    #[test]
    fn push_beyond_limit_is_stack_overflow() {
        let mut stack = CallStack::new(Some(2));
        assert!(stack.push(frame("a")).is_ok());
        assert!(stack.push(frame("b")).is_ok());
        let err = stack.push(frame("c")).err();
        assert_eq!(
            err.map(|e| e.kind),
            Some(EvalErrorKind::StackOverflow { depth: 2 })
        );
        assert_eq!(stack.depth(), 2);
    }

    #[test]
    fn capture_lists_most_recent_first() {
        let mut stack = CallStack::default();
        let _ = stack.push(frame("outer"));
        let _ = stack.push(frame("inner"));
        let names: Vec<String> = stack
            .capture()
            .frames()
            .iter()
            .map(|f| f.name.clone())
            .collect();
        assert_eq!(names, vec!["inner".to_string(), "outer".to_string()]);
    }

    #[test]
    fn attach_keeps_existing_backtrace() {
        let mut stack = CallStack::default();
        let _ = stack.push(frame("f"));
        let err = stack.attach_backtrace(EvalError::new("boom"));
        assert_eq!(err.backtrace.as_ref().map(EvalBacktrace::len), Some(1));

        let _ = stack.push(frame("g"));
        let err = stack.attach_backtrace(err);
        assert_eq!(err.backtrace.as_ref().map(EvalBacktrace::len), Some(1));
    }

    #[test]
    fn empty_stack_attaches_nothing() {
        let err = CallStack::default().attach_backtrace(EvalError::new("boom"));
        assert!(err.backtrace.is_none());
    }
}
