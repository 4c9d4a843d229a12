//! Literals, operators and compound assignment.

use quill_ir::{BinaryOp, IncDecOp, NodeId, UnaryOp};

use super::Interpreter;
use crate::errors::{operator_error, EvalErrorKind, VariableIssue};
use crate::{dispatch, ControlAction, EvalResult, Value};

impl Interpreter {
    /// String template: parts concatenated, nulls rendered empty.
    pub(super) fn eval_template(&mut self, node: NodeId) -> EvalResult {
        let mut out = String::new();
        for part in self.eval_children(node, 0)? {
            if !part.is_null() {
                out.push_str(&part.to_string());
            }
        }
        Ok(Value::string(out))
    }

    pub(super) fn eval_range(&mut self, node: NodeId) -> EvalResult {
        let low = self.eval(self.tree.child(node, 0))?;
        let high = self.eval(self.tree.child(node, 1))?;
        match (low.as_i64(), high.as_i64()) {
            (Some(low), Some(high)) => Ok(Value::Range { low, high }),
            _ => {
                let cause = format!(
                    "range bounds must be integers, got {} and {}",
                    low.type_name(),
                    high.type_name()
                );
                Err(operator_error("..", cause).into())
            }
        }
    }

    pub(super) fn eval_map_literal(&mut self, node: NodeId, immutable: bool) -> EvalResult {
        let tree = self.tree.clone();
        let children = tree.children(node);
        let mut entries = Vec::with_capacity(children.len());
        for &entry in children {
            let key = self.eval(tree.child(entry, 0))?;
            let value = self.eval(tree.child(entry, 1))?;
            entries.push((key, value));
        }
        Ok(self.rt.policy.build_map(entries, immutable))
    }

    pub(super) fn eval_binary(&mut self, node: NodeId, op: BinaryOp) -> EvalResult {
        let left = self.eval(self.tree.child(node, 0))?;
        let right = self.eval(self.tree.child(node, 1))?;
        let key = self.tree.key(node);
        match dispatch::binary(&self.rt, key, op, &left, &right) {
            Ok(value) => Ok(value),
            Err(e) => {
                let fallback = if op.is_relational() {
                    Value::Bool(false)
                } else {
                    Value::Null
                };
                self.degrade(e, fallback)
            }
        }
    }

    pub(super) fn eval_and(&mut self, node: NodeId) -> EvalResult {
        let left = self.eval(self.tree.child(node, 0))?;
        if !self.rt.policy.truthy(&left) {
            return Ok(Value::Bool(false));
        }
        let right = self.eval(self.tree.child(node, 1))?;
        Ok(Value::Bool(self.rt.policy.truthy(&right)))
    }

    pub(super) fn eval_or(&mut self, node: NodeId) -> EvalResult {
        let left = self.eval(self.tree.child(node, 0))?;
        if self.rt.policy.truthy(&left) {
            return Ok(Value::Bool(true));
        }
        let right = self.eval(self.tree.child(node, 1))?;
        Ok(Value::Bool(self.rt.policy.truthy(&right)))
    }

    /// `a ?? b`: `b` when `a` is null or unresolvable.
    pub(super) fn eval_null_coalesce(&mut self, node: NodeId) -> EvalResult {
        let left = self.eval_tolerant(self.tree.child(node, 0))?;
        if left.is_null() {
            return self.eval(self.tree.child(node, 1));
        }
        Ok(left)
    }

    /// `a ?: b`: `b` when `a` is falsy or unresolvable.
    pub(super) fn eval_elvis(&mut self, node: NodeId) -> EvalResult {
        let left = self.eval_tolerant(self.tree.child(node, 0))?;
        if self.rt.policy.truthy(&left) {
            return Ok(left);
        }
        self.eval(self.tree.child(node, 1))
    }

    /// Evaluate `node`, reading an undefined variable or property as null.
    fn eval_tolerant(&mut self, node: NodeId) -> EvalResult {
        match self.eval(node) {
            Err(ControlAction::Error(e))
                if matches!(
                    e.kind,
                    EvalErrorKind::Variable {
                        issue: VariableIssue::Undefined,
                        ..
                    } | EvalErrorKind::UndefinedProperty { .. }
                ) =>
            {
                Ok(Value::Null)
            }
            other => other,
        }
    }

    pub(super) fn eval_ternary(&mut self, node: NodeId) -> EvalResult {
        let cond = self.eval(self.tree.child(node, 0))?;
        let branch = if self.rt.policy.truthy(&cond) { 1 } else { 2 };
        self.eval(self.tree.child(node, branch))
    }

    pub(super) fn eval_unary(&mut self, node: NodeId, op: UnaryOp) -> EvalResult {
        let operand = self.eval(self.tree.child(node, 0))?;
        match dispatch::unary(&self.rt, self.tree.key(node), op, &operand) {
            Ok(value) => Ok(value),
            Err(e) => self.degrade(e, Value::Null),
        }
    }

    /// `++x`, `x--`, ...: the new value for prefix forms, the old one
    /// otherwise.
    pub(super) fn eval_inc_dec(&mut self, node: NodeId, op: IncDecOp, prefix: bool) -> EvalResult {
        let target = self.resolve_target(self.tree.child(node, 0))?;
        let old = self.read_target(&target)?;
        let op = match op {
            IncDecOp::Increment => BinaryOp::Add,
            IncDecOp::Decrement => BinaryOp::Sub,
        };
        let new = match dispatch::binary(&self.rt, self.tree.key(node), op, &old, &Value::Int(1)) {
            Ok(value) => value,
            Err(e) => self.degrade(e, Value::Null)?,
        };
        let new = self.write_target(&target, new)?;
        Ok(if prefix { new } else { old })
    }

    /// `x op= y`.
    ///
    /// A `self<Op>` method on the current value (e.g. `selfAdd`) takes
    /// precedence and may update it in place; a null result from it keeps
    /// the current value. Otherwise the plain operator applies.
    pub(super) fn eval_compound_assign(&mut self, node: NodeId, op: BinaryOp) -> EvalResult {
        let target = self.resolve_target(self.tree.child(node, 0))?;
        let current = self.read_target(&target)?;
        let operand = self.eval(self.tree.child(node, 1))?;

        let args = [operand];
        let probe = dispatch::self_method_name(op);
        let result = match self.rt.introspector.resolve_method(&current, &probe, &args) {
            Some(handle) => {
                tracing::trace!(method = %probe, "compound assignment through self method");
                match handle.invoke(&current, &args)? {
                    Value::Null => current,
                    updated => updated,
                }
            }
            None => {
                let [operand] = args;
                match dispatch::binary(&self.rt, self.tree.key(node), op, &current, &operand) {
                    Ok(value) => value,
                    Err(e) => self.degrade(e, Value::Null)?,
                }
            }
        };
        self.write_target(&target, result)
    }
}
