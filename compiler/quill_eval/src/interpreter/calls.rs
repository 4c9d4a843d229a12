//! Function, method, namespace and constructor calls.
//!
//! # Method Resolution Order
//!
//! A call through a context name or method syntax is resolved by trying, in
//! order:
//! 1. The call-site memo, when it was filled for the current argument kinds
//! 2. For method syntax, a method found by introspection on the receiver
//! 3. A context function (method syntax passes the receiver first)
//! 4. A policy function for the argument kinds
//! 5. For method syntax, a callable property of the receiver
//!
//! Each of tiers 2-4 is tried with the arguments as given and then once
//! more with every narrowable number narrowed. A resolution from tiers 2-4
//! is written back to the memo together with the narrowed kinds, if
//! narrowing was needed. A memo hit whose arguments no longer narrow to
//! those kinds is dropped and the call is resolved again.

use std::borrow::Cow;
use std::iter;

use quill_ir::{NodeId, NodeKey, NodeKind, VarRef};

use super::Interpreter;
use crate::diagnostics::CallFrame;
use crate::dispatch::{self, signature, CallSiteMemo, MemoTarget, Signature};
use crate::errors::{not_callable, undefined_method};
use crate::{EvalError, EvalResult, Value, ValueKind};

/// Name recorded in backtraces for calls through an expression.
const ANONYMOUS: &str = "<lambda>";

impl Interpreter {
    pub(super) fn eval_function_call(&mut self, node: NodeId) -> EvalResult {
        let callee = self.tree.child(node, 0);
        let (callee, name) = match self.tree.kind(callee) {
            NodeKind::Identifier(VarRef::Context(name)) => {
                let args = self.eval_children(node, 1)?;
                self.check_cancel()?;
                return self.call_named(node, self.tree.name(name), &args);
            }
            NodeKind::Identifier(var) => (self.read_var(var)?, self.tree.name(var.name())),
            _ => (self.eval(callee)?, ANONYMOUS),
        };
        let args = self.eval_children(node, 1)?;
        self.check_cancel()?;
        if callee.is_null() && name != ANONYMOUS {
            return self.call_named(node, name, &args);
        }
        self.call_value(node, &callee, name, &args)
    }

    /// `name(args)` where `name` has no frame slot.
    fn call_named(&self, node: NodeId, name: &'static str, args: &[Value]) -> EvalResult {
        if let Some(value) = self.rt.context.get(name) {
            if !value.is_null() {
                return self.call_value(node, &value, name, args);
            }
        }
        let key = self.tree.key(node);
        let kinds = signature(args);
        if let Some(result) = self.call_memo(key, &kinds, None, args) {
            return Ok(result?);
        }

        let resolved = self
            .rt
            .context
            .function(name)
            .map(|function| (function, None))
            .or_else(|| self.with_narrowing(args, |args| self.rt.policy.function(name, &signature(args))));
        let Some((function, narrowed)) = resolved else {
            return self.degrade(undefined_method(name), Value::Null);
        };
        let target = self.remember(node, MemoTarget::Function(function), kinds, narrowed.as_deref());
        let args = narrowed.as_deref().unwrap_or(args);
        Ok(Self::invoke_target(&target, None, args)?)
    }

    pub(super) fn eval_method_call(&mut self, node: NodeId, name: quill_ir::Name, safe: bool) -> EvalResult {
        let target = self.eval(self.tree.child(node, 0))?;
        if target.is_null() && (safe || self.rt.options.safe) {
            return Ok(Value::Null);
        }
        let args = self.eval_children(node, 1)?;
        self.check_cancel()?;
        self.call_method(node, &target, self.tree.name(name), &args)
    }

    pub(super) fn eval_namespace_call(
        &mut self,
        node: NodeId,
        namespace: quill_ir::Name,
        name: quill_ir::Name,
    ) -> EvalResult {
        let args = self.eval_children(node, 0)?;
        self.check_cancel()?;
        let (namespace, name) = (self.tree.name(namespace), self.tree.name(name));
        match self.rt.context.resolve_namespace(namespace) {
            Some(target) => self.call_method(node, &target, name, &args),
            None => self.degrade(undefined_method(&format!("{namespace}:{name}")), Value::Null),
        }
    }

    /// `target.name(args)`.
    fn call_method(&self, node: NodeId, target: &Value, name: &'static str, args: &[Value]) -> EvalResult {
        let key = self.tree.key(node);
        let kinds = signature(iter::once(target).chain(args));
        if let Some(result) = self.call_memo(key, &kinds, Some(target), args) {
            return Ok(result?);
        }

        let introspector = &self.rt.introspector;
        let resolved = self
            .with_narrowing(args, |args| introspector.resolve_method(target, name, args))
            .map(|(handle, narrowed)| (MemoTarget::Method(handle), narrowed))
            .or_else(|| {
                let function = self.rt.context.function(name)?;
                Some((MemoTarget::Function(function), None))
            })
            .or_else(|| {
                self.with_narrowing(args, |args| {
                    let kinds = signature(iter::once(target).chain(args));
                    self.rt.policy.function(name, &kinds)
                })
                .map(|(function, narrowed)| (MemoTarget::Function(function), narrowed))
            });
        if let Some((resolved, narrowed)) = resolved {
            let resolved = self.remember(node, resolved, kinds, narrowed.as_deref());
            let args = narrowed.as_deref().unwrap_or(args);
            return Ok(Self::invoke_target(&resolved, Some(target), args)?);
        }

        let property = Value::string(name);
        if let Some(Ok(callee)) = self.rt.introspector.property_get(target, &property) {
            if callee.is_callable() {
                return self.call_value(node, &callee, name, args);
            }
        }
        self.degrade(
            undefined_method(&format!("{}.{name}", target.type_name())),
            Value::Null,
        )
    }

    /// `new(class, args...)`. Constructors are resolved on every call.
    pub(super) fn eval_constructor(&mut self, node: NodeId) -> EvalResult {
        let class = self.eval(self.tree.child(node, 0))?;
        let args = self.eval_children(node, 1)?;
        self.check_cancel()?;
        let introspector = &self.rt.introspector;
        let resolved = self.with_narrowing(&args, |args| introspector.resolve_constructor(&class, args));
        match resolved {
            Some((handle, None)) => Ok(handle.invoke(&class, &args)?),
            Some((handle, Some(narrowed))) => Ok(handle.invoke(&class, &narrowed)?),
            None => self.degrade(undefined_method(&format!("new {class}")), Value::Null),
        }
    }

    /// Invoke a callable value.
    pub(crate) fn call_value(
        &self,
        node: NodeId,
        callee: &Value,
        name: &'static str,
        args: &[Value],
    ) -> EvalResult {
        match callee {
            Value::Closure(closure) => {
                let call = CallFrame {
                    name,
                    call_span: Some(self.tree.span(node)),
                };
                Ok(closure.invoke(args, &self.call_stack, call)?)
            }
            Value::Function(function) => Ok(function.call(args)?),
            Value::Host(host) if host.responds_to("call", args) => Ok(host.call_method("call", args)?),
            other => Err(not_callable(other.type_name()).into()),
        }
    }

    /// Run `resolve` on `args`, then once more on the narrowed arguments.
    ///
    /// The narrowed arguments are returned when only they resolved.
    fn with_narrowing<T>(
        &self,
        args: &[Value],
        resolve: impl Fn(&[Value]) -> Option<T>,
    ) -> Option<(T, Option<Vec<Value>>)> {
        if let Some(found) = resolve(args) {
            return Some((found, None));
        }
        let narrowed = dispatch::narrow_args(&self.rt, args)?;
        resolve(&narrowed).map(|found| (found, Some(narrowed)))
    }

    fn remember(
        &self,
        node: NodeId,
        target: MemoTarget,
        signature: Signature,
        narrowed: Option<&[Value]>,
    ) -> MemoTarget {
        let narrowed = narrowed.map(dispatch::signature);
        tracing::debug!(node = ?node, ?signature, ?narrowed, "call site resolved");
        let memo = CallSiteMemo {
            target,
            signature,
            narrowed,
        };
        self.rt.memo.store(self.tree.key(node), memo.clone());
        memo.target
    }

    /// Invoke the memo at `key` if it still applies to `args`.
    ///
    /// A memo resolved for narrowed arguments is invalidated when `args` no
    /// longer narrow to the same kinds.
    fn call_memo(
        &self,
        key: NodeKey,
        kinds: &[ValueKind],
        receiver: Option<&Value>,
        args: &[Value],
    ) -> Option<Result<Value, EvalError>> {
        let memo = self.rt.memo.lookup(key, kinds)?;
        match self.memo_args(&memo, args) {
            Some(args) => Some(Self::invoke_target(&memo.target, receiver, &args)),
            None => {
                tracing::trace!(node = ?key.node, "narrowed call-site memo no longer applies");
                self.rt.memo.invalidate(key);
                None
            }
        }
    }

    /// Arguments to invoke `memo` with; `None` when the memo is stale.
    fn memo_args<'a>(&self, memo: &CallSiteMemo, args: &'a [Value]) -> Option<Cow<'a, [Value]>> {
        let Some(expected) = &memo.narrowed else {
            return Some(Cow::Borrowed(args));
        };
        let narrowed = dispatch::narrow_args(&self.rt, args)?;
        (signature(&narrowed) == *expected).then_some(Cow::Owned(narrowed))
    }

    /// Invoke a resolved target; a function target called with method
    /// syntax receives the receiver as its first argument.
    fn invoke_target(
        target: &MemoTarget,
        receiver: Option<&Value>,
        args: &[Value],
    ) -> Result<Value, EvalError> {
        match (target, receiver) {
            (MemoTarget::Method(handle), receiver) => {
                handle.invoke(receiver.unwrap_or(&Value::Null), args)
            }
            (MemoTarget::Function(function) | MemoTarget::Overload(function), Some(receiver)) => {
                let mut all = Vec::with_capacity(args.len() + 1);
                all.push(receiver.clone());
                all.extend_from_slice(args);
                function.call(&all)
            }
            (MemoTarget::Function(function) | MemoTarget::Overload(function), None) => {
                function.call(args)
            }
        }
    }
}
