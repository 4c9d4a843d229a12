//! Statements and sequencing constructs.
//!
//! Every sequencing construct follows the same protocol:
//!
//! 1. On entry, take its suspension record (only while resuming) and start
//!    at the recorded child instead of the first one.
//! 2. On normal completion, leave no record behind.
//! 3. When an action unwinds through it, record its progress if a `yield`
//!    is unwinding (`unwind_with`), otherwise just pass the action on.
//!
//! Constructs that own a block scope save a snapshot of it in the record
//! and re-enter it on resume.

use std::sync::Arc;

use quill_ir::{BinaryOp, DeclaredType, Declaration, Label, Name, NodeId, NodeKind};

use super::Interpreter;
use crate::errors::{assertion_failed, not_iterable, null_variable, redefined_variable};
use crate::scope::BlockScope;
use crate::suspension::SuspensionRecord;
use crate::{dispatch, ControlAction, EvalError, EvalResult, Value, ValueIter};

// Loop phases, stored as the record's child index.
const WHILE_COND: usize = 0;
const WHILE_BODY: usize = 1;

const DO_BODY: usize = 0;
const DO_COND: usize = 1;

const FOR_INIT: usize = 0;
const FOR_COND: usize = 1;
const FOR_BODY: usize = 2;
const FOR_STEP: usize = 3;

const FOREACH_ITERABLE: usize = 0;
const FOREACH_BODY: usize = 1;

const TRY_BODY: usize = 0;
const TRY_CATCH: usize = 1;
const TRY_FINALLY: usize = 2;

/// How a loop body ended.
enum LoopFlow {
    Next,
    Exit,
}

impl Interpreter {
    /// Run the children of `node` from `first` (or from the recorded child
    /// when resuming), yielding the last statement's value.
    pub(crate) fn eval_sequence(&mut self, node: NodeId, first: usize, scoped: bool) -> EvalResult {
        let (start, last) = match self.take_record(node) {
            Some(record) => (record.child, record.last),
            None => (first, Value::Null),
        };
        self.run_sequence(node, start, last, scoped)
    }

    fn run_sequence(&mut self, node: NodeId, start: usize, mut last: Value, scoped: bool) -> EvalResult {
        let tree = self.tree.clone();
        for (index, &stmt) in tree.children(node).iter().enumerate().skip(start) {
            self.check_cancel()?;
            match self.eval(stmt) {
                Ok(value) => last = value,
                Err(action) => {
                    return Err(self.unwind_with(node, action, |this| {
                        let record = SuspensionRecord::at(index).with_last(last);
                        if scoped {
                            record.with_scope(this.scope_snapshot())
                        } else {
                            record
                        }
                    }));
                }
            }
        }
        Ok(last)
    }

    pub(super) fn eval_block(&mut self, node: NodeId) -> EvalResult {
        let (start, last, scope) = self.resume_point(node, 0);
        let mut scoped = self.scoped_with(scope);
        scoped.run_sequence(node, start, last, true)
    }

    /// Child index, last value and block scope to start a scoped construct
    /// with.
    fn resume_point(&mut self, node: NodeId, first: usize) -> (usize, Value, BlockScope) {
        match self.take_record(node) {
            Some(record) => (record.child, record.last, record.scope.unwrap_or_default()),
            None => (first, Value::Null, BlockScope::new()),
        }
    }

    pub(super) fn eval_declare(&mut self, node: NodeId, decl: &Declaration) -> EvalResult {
        let init = self.tree.child(node, 0);
        let value = if init.is_valid() {
            self.eval(init)?
        } else {
            Value::Null
        };
        if !self.define_variable(decl) {
            return Err(redefined_variable(self.tree.name(decl.name)).into());
        }
        let value = match decl.ty {
            Some(ty) if init.is_valid() => self.coerce_declared(decl.name, value, ty)?,
            _ => value,
        };
        self.frame.set(decl.slot, value.clone());
        Ok(value)
    }

    /// Convert `value` for a variable of declared type `ty`.
    pub(crate) fn coerce_declared(
        &self,
        name: Name,
        value: Value,
        ty: DeclaredType,
    ) -> Result<Value, EvalError> {
        if value.is_null() && !ty.accepts_null() {
            return Err(null_variable(self.tree.name(name)));
        }
        self.rt.policy.coerce(value, ty)
    }

    pub(super) fn eval_if(&mut self, node: NodeId) -> EvalResult {
        let tree = self.tree.clone();
        let mut branch = self.take_record(node).map_or(0, |record| record.child);
        if branch == 0 {
            let cond = match self.eval(tree.child(node, 0)) {
                Ok(cond) => cond,
                Err(action) => return Err(self.unwind_with(node, action, |_| SuspensionRecord::at(0))),
            };
            branch = if self.rt.policy.truthy(&cond) { 1 } else { 2 };
        }
        match self.eval(tree.child(node, branch)) {
            Ok(value) => Ok(value),
            Err(action) => Err(self.unwind_with(node, action, |_| SuspensionRecord::at(branch))),
        }
    }

    /// Route a loop body's outcome: matching `break`/`continue` are
    /// consumed, anything else unwinds.
    fn loop_flow(label: Label, result: EvalResult, last: &mut Value) -> Result<LoopFlow, ControlAction> {
        match result {
            Ok(value) => {
                *last = value;
                Ok(LoopFlow::Next)
            }
            Err(ControlAction::Break(signal)) if ControlAction::targets(label, signal) => {
                Ok(LoopFlow::Exit)
            }
            Err(ControlAction::Continue(signal)) if ControlAction::targets(label, signal) => {
                Ok(LoopFlow::Next)
            }
            Err(action) => Err(action),
        }
    }

    pub(super) fn eval_while(&mut self, node: NodeId, label: Label) -> EvalResult {
        let tree = self.tree.clone();
        let (cond, body) = (tree.child(node, 0), tree.child(node, 1));
        let (mut phase, mut last) = match self.take_record(node) {
            Some(record) => (record.child, record.last),
            None => (WHILE_COND, Value::Null),
        };
        loop {
            if phase == WHILE_COND {
                self.check_cancel()?;
                match self.eval(cond) {
                    Ok(value) if self.rt.policy.truthy(&value) => {}
                    Ok(_) => break,
                    Err(action) => {
                        return Err(self.unwind_with(node, action, |_| {
                            SuspensionRecord::at(WHILE_COND).with_last(last)
                        }));
                    }
                }
            }
            phase = WHILE_COND;
            let result = self.eval(body);
            match Self::loop_flow(label, result, &mut last) {
                Ok(LoopFlow::Next) => {}
                Ok(LoopFlow::Exit) => break,
                Err(action) => {
                    return Err(self.unwind_with(node, action, |_| {
                        SuspensionRecord::at(WHILE_BODY).with_last(last)
                    }));
                }
            }
        }
        Ok(last)
    }

    pub(super) fn eval_do_while(&mut self, node: NodeId, label: Label) -> EvalResult {
        let tree = self.tree.clone();
        let (body, cond) = (tree.child(node, 0), tree.child(node, 1));
        let (mut phase, mut last) = match self.take_record(node) {
            Some(record) => (record.child, record.last),
            None => (DO_BODY, Value::Null),
        };
        loop {
            if phase == DO_BODY {
                self.check_cancel()?;
                let result = self.eval(body);
                match Self::loop_flow(label, result, &mut last) {
                    Ok(LoopFlow::Next) => {}
                    Ok(LoopFlow::Exit) => break,
                    Err(action) => {
                        return Err(self.unwind_with(node, action, |_| {
                            SuspensionRecord::at(DO_BODY).with_last(last)
                        }));
                    }
                }
            }
            phase = DO_BODY;
            match self.eval(cond) {
                Ok(value) if self.rt.policy.truthy(&value) => {}
                Ok(_) => break,
                Err(action) => {
                    return Err(self.unwind_with(node, action, |_| {
                        SuspensionRecord::at(DO_COND).with_last(last)
                    }));
                }
            }
        }
        Ok(last)
    }

    pub(super) fn eval_for(&mut self, node: NodeId, label: Label) -> EvalResult {
        let (phase, last, scope) = self.resume_point(node, FOR_INIT);
        let mut scoped = self.scoped_with(scope);
        scoped.run_for(node, label, phase, last)
    }

    fn run_for(&mut self, node: NodeId, label: Label, mut phase: usize, mut last: Value) -> EvalResult {
        let tree = self.tree.clone();
        let [init, cond, step, body] = [0, 1, 2, 3].map(|i| tree.child(node, i));
        loop {
            let next = match phase {
                FOR_INIT => self.eval(init).map(|_| FOR_COND),
                FOR_COND => {
                    self.check_cancel()?;
                    if cond.is_valid() {
                        match self.eval(cond) {
                            Ok(value) if self.rt.policy.truthy(&value) => Ok(FOR_BODY),
                            Ok(_) => break,
                            Err(action) => Err(action),
                        }
                    } else {
                        Ok(FOR_BODY)
                    }
                }
                FOR_BODY => {
                    let result = self.eval(body);
                    match Self::loop_flow(label, result, &mut last) {
                        Ok(LoopFlow::Next) => Ok(FOR_STEP),
                        Ok(LoopFlow::Exit) => break,
                        Err(action) => Err(action),
                    }
                }
                _ => self.eval(step).map(|_| FOR_COND),
            };
            match next {
                Ok(next) => phase = next,
                Err(action) => {
                    return Err(self.unwind_with(node, action, |this| {
                        SuspensionRecord::at(phase)
                            .with_last(last)
                            .with_scope(this.scope_snapshot())
                    }));
                }
            }
        }
        Ok(last)
    }

    pub(super) fn eval_foreach(&mut self, node: NodeId, label: Label, var: &Declaration) -> EvalResult {
        let (iterator, last, scope) = match self.take_record(node) {
            Some(SuspensionRecord {
                iterator: Some(iterator),
                last,
                scope,
                ..
            }) => (iterator, last, scope),
            _ => {
                let iterable = match self.eval(self.tree.child(node, 0)) {
                    Ok(iterable) => iterable,
                    Err(action) => {
                        return Err(self.unwind_with(node, action, |_| {
                            SuspensionRecord::at(FOREACH_ITERABLE)
                        }));
                    }
                };
                match self.iterate(&iterable)? {
                    Some(iterator) => (iterator, Value::Null, None),
                    None => return Ok(Value::Null),
                }
            }
        };
        let resuming = scope.is_some();
        let mut scoped = self.scoped_with(scope.unwrap_or_default());
        if !resuming {
            scoped.define_variable(var);
        }
        scoped.run_foreach(node, label, var.slot, iterator, resuming, last)
    }

    /// Host iterator over `value`; `None` when a lenient engine skips a
    /// value that cannot be iterated.
    fn iterate(&self, value: &Value) -> Result<Option<ValueIter>, EvalError> {
        match self.rt.introspector.resolve_iterable(value) {
            Some(iterator) => Ok(Some(iterator)),
            None if self.rt.options.raises_unsolvable() => Err(not_iterable(value.type_name())),
            None => {
                tracing::debug!(kind = value.type_name(), "skipping non-iterable value");
                Ok(None)
            }
        }
    }

    fn run_foreach(
        &mut self,
        node: NodeId,
        label: Label,
        slot: u32,
        mut iterator: ValueIter,
        mut resume_body: bool,
        mut last: Value,
    ) -> EvalResult {
        let body = self.tree.child(node, 1);
        loop {
            if !resume_body {
                self.check_cancel()?;
                match iterator.next_value() {
                    Some(item) => self.frame.set(slot, item?),
                    None => break,
                }
            }
            resume_body = false;
            match self.eval(body) {
                Err(ControlAction::Remove(signal)) if ControlAction::targets(label, signal) => {
                    iterator.remove_current()?;
                }
                result => match Self::loop_flow(label, result, &mut last) {
                    Ok(LoopFlow::Next) => {}
                    Ok(LoopFlow::Exit) => break,
                    Err(action) => {
                        return Err(self.unwind_with(node, action, move |this| {
                            SuspensionRecord::at(FOREACH_BODY)
                                .with_last(last)
                                .with_iterator(iterator)
                                .with_scope(this.scope_snapshot())
                        }));
                    }
                },
            }
        }
        Ok(last)
    }

    pub(super) fn eval_switch(&mut self, node: NodeId) -> EvalResult {
        let (phase, last, scope) = self.resume_point(node, 0);
        let mut scoped = self.scoped_with(scope);
        scoped.run_switch(node, phase, last)
    }

    /// Cases fall through; an unlabeled `break` leaves the switch.
    fn run_switch(&mut self, node: NodeId, mut phase: usize, mut last: Value) -> EvalResult {
        let tree = self.tree.clone();
        let children = tree.children(node);
        if phase == 0 {
            match self.select_case(children) {
                Ok(Some(index)) => phase = index,
                Ok(None) => return Ok(Value::Null),
                Err(action) => {
                    return Err(self.unwind_with(node, action, |this| {
                        SuspensionRecord::at(0).with_scope(this.scope_snapshot())
                    }));
                }
            }
        }
        for (index, &case) in children.iter().enumerate().skip(phase) {
            match self.eval(case) {
                Ok(value) => last = value,
                Err(ControlAction::Break(None)) => break,
                Err(action) => {
                    return Err(self.unwind_with(node, action, |this| {
                        SuspensionRecord::at(index)
                            .with_last(last)
                            .with_scope(this.scope_snapshot())
                    }));
                }
            }
        }
        Ok(last)
    }

    /// Child index of the first case equal to the discriminant, else of the
    /// default case.
    fn select_case(&mut self, children: &[NodeId]) -> Result<Option<usize>, ControlAction> {
        let Some((&discriminant, cases)) = children.split_first() else {
            return Ok(None);
        };
        let discriminant = self.eval(discriminant)?;
        let mut default = None;
        for (offset, &case) in cases.iter().enumerate() {
            let index = offset + 1;
            if !matches!(self.tree.kind(case), NodeKind::Case) {
                default = default.or(Some(index));
                continue;
            }
            let value = self.eval(self.tree.child(case, 0))?;
            let key = self.tree.key(case);
            let matched = dispatch::binary(&self.rt, key, BinaryOp::Eq, &discriminant, &value)?;
            if self.rt.policy.truthy(&matched) {
                return Ok(Some(index));
            }
        }
        Ok(default)
    }

    pub(super) fn eval_yield(&mut self, node: NodeId) -> EvalResult {
        if self.take_record(node).is_some() {
            self.suspended = false;
            return Ok(std::mem::take(&mut self.sent));
        }
        let value = self.eval(self.tree.child(node, 0))?;
        self.suspended = true;
        self.records.insert(node, SuspensionRecord::at(0));
        Err(ControlAction::Yield(value))
    }

    /// `try`/`catch`/`finally`.
    ///
    /// Only catchable errors reach the handler. `finally` always runs; an
    /// action raised by it replaces the pending outcome.
    pub(super) fn eval_try(&mut self, node: NodeId, catch_var: Option<&Declaration>) -> EvalResult {
        let tree = self.tree.clone();
        let [body, handler, finally] = [0, 1, 2].map(|i| tree.child(node, i));
        let (mut phase, mut pending, scope) = match self.take_record(node) {
            Some(record) => (record.child, record.pending, record.scope),
            None => (TRY_BODY, None, None),
        };

        if phase == TRY_BODY {
            match self.eval(body) {
                Err(action) if self.suspended => {
                    return Err(self.unwind_with(node, action, |_| SuspensionRecord::at(TRY_BODY)));
                }
                Err(ControlAction::Error(e)) if e.is_catchable() && handler.is_valid() => {
                    phase = TRY_CATCH;
                    pending = Some(Err(ControlAction::Error(e)));
                }
                result => {
                    phase = TRY_FINALLY;
                    pending = Some(result);
                }
            }
        }

        if phase == TRY_CATCH {
            let caught = pending.take();
            match self.run_catch(node, handler, catch_var, caught, scope) {
                Err(action) if self.suspended => return Err(action),
                result => pending = Some(result),
            }
        }

        if finally.is_valid() {
            match self.eval(finally) {
                Ok(_) => {}
                Err(action) if self.suspended => {
                    return Err(self.unwind_with(node, action, move |_| {
                        SuspensionRecord::at(TRY_FINALLY).with_pending(pending)
                    }));
                }
                Err(action) => return Err(action),
            }
        }
        pending.unwrap_or(Ok(Value::Null))
    }

    /// Run the handler with the thrown value (or the error message) bound to
    /// the catch variable.
    fn run_catch(
        &mut self,
        node: NodeId,
        handler: NodeId,
        catch_var: Option<&Declaration>,
        caught: Option<EvalResult>,
        scope: Option<BlockScope>,
    ) -> EvalResult {
        let resuming = scope.is_some();
        let mut scoped = self.scoped_with(scope.unwrap_or_default());
        if let (Some(decl), false) = (catch_var, resuming) {
            scoped.define_variable(decl);
            let value = match caught {
                Some(Err(ControlAction::Error(e))) => e
                    .thrown
                    .clone()
                    .unwrap_or_else(|| Value::string(e.message())),
                _ => Value::Null,
            };
            scoped.frame.set(decl.slot, value);
        }
        match scoped.eval(handler) {
            Err(action) if scoped.suspended => Err(scoped.unwind_with(node, action, |this| {
                SuspensionRecord::at(TRY_CATCH).with_scope(this.scope_snapshot())
            })),
            result => result,
        }
    }

    pub(super) fn eval_annotated(&mut self, node: NodeId, name: Name) -> EvalResult {
        let tree = self.tree.clone();
        let Some((&statement, args)) = tree.children(node).split_last() else {
            return Ok(Value::Null);
        };
        let mut values = Vec::with_capacity(args.len());
        for &arg in args {
            values.push(self.eval(arg)?);
        }
        let context = Arc::clone(&self.rt.context);
        context.process_annotation(tree.name(name), &values, &mut || self.eval(statement))
    }

    /// Checked only when assertions are enabled.
    pub(super) fn eval_assert(&mut self, node: NodeId) -> EvalResult {
        if !self.rt.options.assertions {
            return Ok(Value::Null);
        }
        let cond = self.eval(self.tree.child(node, 0))?;
        if self.rt.policy.truthy(&cond) {
            return Ok(Value::Bool(true));
        }
        let message = self.tree.child(node, 1);
        let message = if message.is_valid() {
            self.eval(message)?.to_string()
        } else {
            String::from("assertion failed")
        };
        Err(assertion_failed(message).into())
    }
}
