//! Closures: a lambda node plus the frame it was created in.

use quill_ir::{LambdaId, NodeId, SharedTree, Span};

use crate::diagnostics::{ensure_sufficient_stack, CallFrame, CallStack};
use crate::errors::cancelled;
use crate::frame::{Frame, FrameRef};
use crate::{EvalError, Generator, InterpreterBuilder, Runtime, Value};

/// A lambda value.
///
/// The captured frame is held by reference, so a closure sees later writes
/// to the variables it captured, and a closure stored into one of its own
/// captured slots (a recursive closure) forms an `Arc` cycle that lives as
/// long as the frame does.
pub struct Closure {
    pub(crate) tree: SharedTree,
    pub(crate) lambda: LambdaId,
    pub(crate) node: NodeId,
    pub(crate) captured: FrameRef,
    pub(crate) runtime: Runtime,
}

impl Closure {
    /// Number of declared parameters.
    pub fn arity(&self) -> usize {
        let info = self.tree.lambda(self.lambda);
        self.tree.frame(info.frame).param_count()
    }

    /// The lambda node this closure evaluates.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Call from outside any evaluation, e.g. from host code.
    pub fn call(&self, args: &[Value]) -> Result<Value, EvalError> {
        let stack = CallStack::new(self.runtime.options.max_depth);
        self.invoke(
            args,
            &stack,
            CallFrame {
                name: "<lambda>",
                call_span: None,
            },
        )
    }

    /// Call on top of `caller`'s stack.
    ///
    /// Missing arguments bind null and extra arguments are ignored. A
    /// generator lambda returns a suspended generator instead of running.
    #[tracing::instrument(level = "trace", skip_all, fields(callee = call.name))]
    pub(crate) fn invoke(
        &self,
        args: &[Value],
        caller: &CallStack,
        call: CallFrame,
    ) -> Result<Value, EvalError> {
        if self.runtime.is_cancelled() {
            return Err(cancelled());
        }
        let call_span: Option<Span> = call.call_span;
        let mut stack = caller.clone();
        stack.push(call).map_err(|e| match call_span {
            Some(span) => e.with_span(span),
            None => e,
        })?;

        let layout = self.tree.frame(self.tree.lambda(self.lambda).frame);
        let frame = Frame::new(layout.size(), Some(self.captured.clone()));
        let params = layout.param_count();
        for slot in 0..params {
            let value = args.get(slot).cloned().unwrap_or_default();
            frame.set(u32::try_from(slot).unwrap_or(u32::MAX), value);
        }

        let body = self.tree.child(self.node, 0);
        let return_type = layout.return_type;
        let mut interpreter = InterpreterBuilder::new(self.tree.clone())
            .runtime(self.runtime.clone())
            .frame(frame)
            .call_stack(stack)
            .build();
        interpreter.declare_params(params);

        if layout.generator {
            tracing::debug!("generator lambda called");
            return Ok(Value::Generator(Generator::new(interpreter, body)));
        }

        let result = ensure_sufficient_stack(|| interpreter.eval(body));
        interpreter.finish(result, return_type)
    }
}

impl std::fmt::Debug for Closure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Closure")
            .field("lambda", &self.lambda)
            .field("node", &self.node)
            .finish_non_exhaustive()
    }
}
