//! `InterpreterBuilder` for creating Interpreter instances with various configurations.

use std::sync::Arc;

use quill_ir::SharedTree;

use super::Interpreter;
use crate::diagnostics::CallStack;
use crate::dispatch::MemoTable;
use crate::frame::{Frame, FrameRef};
use crate::introspect::ValueIntrospector;
use crate::policy::ArithmeticPolicy;
use crate::scope::LexicalScope;
use crate::suspension::SuspensionMap;
use crate::{Context, Options, Runtime};

/// Builder for creating Interpreter instances.
///
/// Everything but the tree is optional. Collaborators not supplied come
/// from [`Runtime::new`]; a missing frame is sized for the tree's root
/// script.
pub struct InterpreterBuilder {
    tree: SharedTree,
    runtime: Option<Runtime>,
    context: Option<Arc<dyn Context>>,
    options: Option<Options>,
    policy: Option<Arc<dyn ArithmeticPolicy>>,
    introspector: Option<Arc<dyn ValueIntrospector>>,
    memo: Option<Arc<MemoTable>>,
    frame: Option<FrameRef>,
    call_stack: Option<CallStack>,
}

impl InterpreterBuilder {
    pub fn new(tree: SharedTree) -> Self {
        Self {
            tree,
            runtime: None,
            context: None,
            options: None,
            policy: None,
            introspector: None,
            memo: None,
            frame: None,
            call_stack: None,
        }
    }

    /// Start from an existing runtime; later setters override its parts.
    #[must_use]
    pub fn runtime(mut self, runtime: Runtime) -> Self {
        self.runtime = Some(runtime);
        self
    }

    #[must_use]
    pub fn context(mut self, context: Arc<dyn Context>) -> Self {
        self.context = Some(context);
        self
    }

    #[must_use]
    pub fn options(mut self, options: Options) -> Self {
        self.options = Some(options);
        self
    }

    #[must_use]
    pub fn policy(mut self, policy: Arc<dyn ArithmeticPolicy>) -> Self {
        self.policy = Some(policy);
        self
    }

    #[must_use]
    pub fn introspector(mut self, introspector: Arc<dyn ValueIntrospector>) -> Self {
        self.introspector = Some(introspector);
        self
    }

    /// Share a call-site memo table, e.g. between interpreters of one tree.
    #[must_use]
    pub fn memo(mut self, memo: Arc<MemoTable>) -> Self {
        self.memo = Some(memo);
        self
    }

    /// Evaluate against an existing frame.
    #[must_use]
    pub fn frame(mut self, frame: FrameRef) -> Self {
        self.frame = Some(frame);
        self
    }

    /// Set the call stack for recursion tracking.
    ///
    /// Used when creating child interpreters for closure calls to propagate
    /// the caller's call stack (clone-per-child model).
    #[must_use]
    pub fn call_stack(mut self, stack: CallStack) -> Self {
        self.call_stack = Some(stack);
        self
    }

    /// Build the interpreter.
    pub fn build(self) -> Interpreter {
        let mut runtime = match self.runtime {
            Some(runtime) => runtime,
            None => Runtime::new(
                self.context
                    .clone()
                    .unwrap_or_else(|| Arc::new(crate::MapContext::new())),
                self.options.clone().unwrap_or_default(),
            ),
        };
        if let Some(context) = self.context {
            runtime.context = context;
        }
        if let Some(options) = self.options {
            runtime.options = options;
        }
        if let Some(policy) = self.policy {
            runtime.policy = policy;
        }
        if let Some(introspector) = self.introspector {
            runtime.introspector = introspector;
        }
        if let Some(memo) = self.memo {
            runtime.memo = memo;
        }

        let frame = self.frame.unwrap_or_else(|| {
            let size = self.tree.root_frame().map_or(0, quill_ir::FrameLayout::size);
            Frame::new(size, None)
        });
        let call_stack = self
            .call_stack
            .unwrap_or_else(|| CallStack::new(runtime.options.max_depth));

        Interpreter {
            tree: self.tree,
            rt: runtime,
            frame,
            scopes: LexicalScope::new(),
            records: SuspensionMap::new(),
            suspended: false,
            sent: crate::Value::Null,
            call_stack,
        }
    }
}
