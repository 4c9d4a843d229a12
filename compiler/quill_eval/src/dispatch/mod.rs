//! Operator dispatch.
//!
//! # Resolution Order
//!
//! A binary or unary operator is resolved by trying, in order:
//! 1. The call-site memo, when it holds an overload for the current
//!    operand kinds
//! 2. A policy overload registered for the operator and operand kinds
//!    (memoized on success)
//! 3. The policy's base semantics
//! 4. A duck-typed probe: a method on the operand named after the
//!    operator's intent (`add`, `compareTo`, `contains`, `size`, ...)
//!
//! Negated operators (`!=`, `!~`, `!^`, `!$`, `!==`) dispatch their
//! positive form and invert the result.

mod memo;

#[cfg(test)]
mod tests;

pub use memo::{signature, CallSiteMemo, MemoTable, MemoTarget, Signature};

use quill_ir::{BinaryOp, NodeKey, UnaryOp};

use crate::errors::{operator_error, unsupported_operands};
use crate::{EvalError, Runtime, Value};

/// Apply a binary operator.
pub fn binary(
    rt: &Runtime,
    key: NodeKey,
    op: BinaryOp,
    left: &Value,
    right: &Value,
) -> Result<Value, EvalError> {
    if let Some(positive) = op.negated_of() {
        let result = binary(rt, key, positive, left, right)?;
        return Ok(Value::Bool(!rt.policy.truthy(&result)));
    }

    let kinds = signature([left, right]);
    let args = [left.clone(), right.clone()];
    if let Some(result) = overload(rt, key, op.method_name(), &kinds, &args) {
        return result;
    }
    if let Some(result) = rt.policy.binary(op, left, right) {
        return result;
    }
    probe_binary(rt, op, left, right)
        .unwrap_or_else(|| Err(unsupported_operands(op.as_symbol(), left.type_name(), right.type_name())))
}

/// Apply a unary operator.
pub fn unary(rt: &Runtime, key: NodeKey, op: UnaryOp, operand: &Value) -> Result<Value, EvalError> {
    let kinds = signature([operand]);
    let args = [operand.clone()];
    if let Some(result) = overload(rt, key, op.method_name(), &kinds, &args) {
        return result;
    }
    if let Some(result) = rt.policy.unary(op, operand) {
        return result;
    }
    match rt.introspector.resolve_method(operand, op.method_name(), &[]) {
        Some(handle) => handle.invoke(operand, &[]),
        None => Err(operator_error(
            op.as_symbol(),
            format!("unsupported operand kind {}", operand.type_name()),
        )),
    }
}

/// Memoized overload lookup shared by binary and unary dispatch.
fn overload(
    rt: &Runtime,
    key: NodeKey,
    name: &str,
    kinds: &Signature,
    args: &[Value],
) -> Option<Result<Value, EvalError>> {
    if let Some(memo) = rt.memo.lookup(key, kinds) {
        if let MemoTarget::Overload(function) = memo.target {
            return Some(function.call(args));
        }
    }
    let function = rt.policy.overload(name, kinds)?;
    tracing::debug!(op = name, ?kinds, "operator overload resolved");
    rt.memo.store(
        key,
        CallSiteMemo {
            target: MemoTarget::Overload(function.clone()),
            signature: kinds.clone(),
            narrowed: None,
        },
    );
    Some(function.call(args))
}

/// Duck-typed probe: call the operator's method on the operand.
///
/// `=~` probes the right operand (the container); every other operator
/// probes the left one.
fn probe_binary(
    rt: &Runtime,
    op: BinaryOp,
    left: &Value,
    right: &Value,
) -> Option<Result<Value, EvalError>> {
    let (receiver, arg) = if op == BinaryOp::Contains {
        (right, left)
    } else {
        (left, right)
    };
    let args = [arg.clone()];
    let handle = rt
        .introspector
        .resolve_method(receiver, op.method_name(), &args)?;
    let result = match handle.invoke(receiver, &args) {
        Ok(result) => result,
        Err(e) => return Some(Err(e)),
    };
    let value = match op {
        BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => {
            let Some(ordering) = result.as_i64() else {
                return Some(Err(operator_error(
                    op.as_symbol(),
                    format!("compareTo returned {}", result.type_name()),
                )));
            };
            Value::Bool(match op {
                BinaryOp::Lt => ordering < 0,
                BinaryOp::LtEq => ordering <= 0,
                BinaryOp::Gt => ordering > 0,
                _ => ordering >= 0,
            })
        }
        op if op.is_relational() => Value::Bool(rt.policy.truthy(&result)),
        _ => result,
    };
    Some(Ok(value))
}

/// Method probed by a compound assignment before the plain operator,
/// e.g. `selfAdd` for `+=`.
pub fn self_method_name(op: BinaryOp) -> String {
    let name = op.method_name();
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => format!("self{}{}", first.to_ascii_uppercase(), chars.as_str()),
        None => String::from("self"),
    }
}

/// Arguments with every narrowable number narrowed; `None` when nothing
/// changes, so a retry would be pointless.
pub fn narrow_args(rt: &Runtime, args: &[Value]) -> Option<Vec<Value>> {
    let mut changed = false;
    let narrowed = args
        .iter()
        .map(|arg| match rt.policy.narrow(arg) {
            Some(smaller) => {
                changed = true;
                smaller
            }
            None => arg.clone(),
        })
        .collect();
    changed.then_some(narrowed)
}
