//! Numeric kernels for the default policy.
//!
//! Integer arithmetic widens instead of wrapping: an `Int` result that
//! overflows becomes a `Long`, and a `Long` that overflows becomes a
//! `Double`. Division and modulo by zero are errors for every kind.

use std::cmp::Ordering;

use quill_ir::{BinaryOp, UnaryOp};

use crate::errors::{division_by_zero, modulo_by_zero};
use crate::value::map_get;
use crate::{EvalError, Value};

/// Apply an arithmetic, bitwise or shift operator to two numbers.
pub(super) fn arithmetic(
    op: BinaryOp,
    left: &Value,
    right: &Value,
) -> Option<Result<Value, EvalError>> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => int_op(op, *a, *b),
        _ => match (left.as_i64(), right.as_i64()) {
            (Some(a), Some(b)) => long_op(op, a, b),
            _ => double_op(op, left.as_f64()?, right.as_f64()?),
        },
    }
}

fn int_op(op: BinaryOp, a: i32, b: i32) -> Option<Result<Value, EvalError>> {
    let checked = match op {
        BinaryOp::Add => a.checked_add(b),
        BinaryOp::Sub => a.checked_sub(b),
        BinaryOp::Mul => a.checked_mul(b),
        BinaryOp::Div if b == 0 => return Some(Err(division_by_zero())),
        BinaryOp::Div => a.checked_div(b),
        BinaryOp::Mod if b == 0 => return Some(Err(modulo_by_zero())),
        BinaryOp::Mod => a.checked_rem(b),
        BinaryOp::BitAnd => Some(a & b),
        BinaryOp::BitOr => Some(a | b),
        BinaryOp::BitXor => Some(a ^ b),
        BinaryOp::Shl => Some(a.wrapping_shl(shift_amount(i64::from(b)))),
        BinaryOp::Shr => Some(a.wrapping_shr(shift_amount(i64::from(b)))),
        BinaryOp::UShr => Some(ushr32(a, b)),
        _ => return None,
    };
    match checked {
        Some(n) => Some(Ok(Value::Int(n))),
        None => long_op(op, i64::from(a), i64::from(b)),
    }
}

#[expect(
    clippy::cast_precision_loss,
    reason = "long overflow widens to double"
)]
fn long_op(op: BinaryOp, a: i64, b: i64) -> Option<Result<Value, EvalError>> {
    let checked = match op {
        BinaryOp::Add => a.checked_add(b),
        BinaryOp::Sub => a.checked_sub(b),
        BinaryOp::Mul => a.checked_mul(b),
        BinaryOp::Div if b == 0 => return Some(Err(division_by_zero())),
        BinaryOp::Div => a.checked_div(b),
        BinaryOp::Mod if b == 0 => return Some(Err(modulo_by_zero())),
        BinaryOp::Mod => Some(a.checked_rem(b).unwrap_or(0)),
        BinaryOp::BitAnd => Some(a & b),
        BinaryOp::BitOr => Some(a | b),
        BinaryOp::BitXor => Some(a ^ b),
        BinaryOp::Shl => Some(a.wrapping_shl(shift_amount(b))),
        BinaryOp::Shr => Some(a.wrapping_shr(shift_amount(b))),
        BinaryOp::UShr => Some(ushr64(a, b)),
        _ => return None,
    };
    match checked {
        Some(n) => Some(Ok(Value::Long(n))),
        None => double_op(op, a as f64, b as f64),
    }
}

fn double_op(op: BinaryOp, a: f64, b: f64) -> Option<Result<Value, EvalError>> {
    let result = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div if b == 0.0 => return Some(Err(division_by_zero())),
        BinaryOp::Div => a / b,
        BinaryOp::Mod if b == 0.0 => return Some(Err(modulo_by_zero())),
        BinaryOp::Mod => a % b,
        _ => return None,
    };
    Some(Ok(Value::Double(result)))
}

#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "shift amounts are masked to the operand width"
)]
fn shift_amount(b: i64) -> u32 {
    (b & 63) as u32
}

#[expect(
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap,
    reason = "unsigned shift reinterprets the bit pattern"
)]
fn ushr32(a: i32, b: i32) -> i32 {
    ((a as u32) >> (b & 31)) as i32
}

#[expect(
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap,
    reason = "unsigned shift reinterprets the bit pattern"
)]
fn ushr64(a: i64, b: i64) -> i64 {
    ((a as u64) >> (b & 63)) as i64
}

/// Numeric negation, identity and complement.
#[expect(clippy::cast_precision_loss, reason = "long overflow widens to double")]
pub(super) fn unary(op: UnaryOp, operand: &Value) -> Option<Result<Value, EvalError>> {
    let value = match (op, operand) {
        (UnaryOp::Neg, Value::Int(n)) => match n.checked_neg() {
            Some(neg) => Value::Int(neg),
            None => Value::Long(-i64::from(*n)),
        },
        (UnaryOp::Neg, Value::Long(n)) => match n.checked_neg() {
            Some(neg) => Value::Long(neg),
            None => Value::Double(-(*n as f64)),
        },
        (UnaryOp::Neg, Value::Double(d)) => Value::Double(-d),
        (UnaryOp::Pos, v) if v.is_number() => v.clone(),
        (UnaryOp::BitNot, Value::Int(n)) => Value::Int(!n),
        (UnaryOp::BitNot, Value::Long(n)) => Value::Long(!n),
        _ => return None,
    };
    Some(Ok(value))
}

/// Ordering for relational operators: numbers across kinds, strings and
/// booleans among themselves.
pub(crate) fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (a, b) => match (a.as_i64(), b.as_i64()) {
            (Some(x), Some(y)) => Some(x.cmp(&y)),
            _ => a.as_f64()?.partial_cmp(&b.as_f64()?),
        },
    }
}

/// `left =~ right`: membership in a collection, a map's keys or a range;
/// substring for two strings.
pub(super) fn contains(left: &Value, right: &Value) -> Option<bool> {
    match right {
        Value::List(items) | Value::Set(items) => {
            Some(items.read().iter().any(|item| item.loosely_equals(left)))
        }
        Value::Map(entries) => Some(map_get(&entries.read(), left).is_some()),
        Value::Range { low, high } => {
            let n = to_i64(left)?;
            Some(*low <= n && n <= *high)
        }
        Value::Str(pattern) => match left {
            Value::Str(s) => Some(s.contains(&**pattern)),
            _ => None,
        },
        _ => None,
    }
}

/// `empty x`; `None` for values the policy cannot judge.
pub(super) fn is_empty(value: &Value) -> Option<bool> {
    match value {
        Value::Null => Some(true),
        Value::Str(s) => Some(s.is_empty()),
        Value::List(items) | Value::Set(items) => Some(items.read().is_empty()),
        Value::Map(entries) => Some(entries.read().is_empty()),
        Value::Range { low, high } => Some(low > high),
        Value::Host(_) => None,
        _ => Some(false),
    }
}

/// `size x`; `None` for values without a size.
pub(super) fn size(value: &Value) -> Option<i64> {
    let n = match value {
        Value::Null => 0,
        Value::Str(s) => s.chars().count(),
        Value::List(items) | Value::Set(items) => items.read().len(),
        Value::Map(entries) => entries.read().len(),
        Value::Range { low, high } => {
            return Some(high.saturating_sub(*low).saturating_add(1).max(0));
        }
        _ => return None,
    };
    i64::try_from(n).ok()
}

/// Integral conversion used by `int`/`long` coercion and range membership.
#[expect(
    clippy::cast_possible_truncation,
    reason = "doubles truncate toward zero after a range check"
)]
pub(crate) fn to_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Int(_) | Value::Long(_) => value.as_i64(),
        Value::Double(d) if d.is_finite() && d.abs() < 9.2e18 => Some(d.trunc() as i64),
        Value::Bool(b) => Some(i64::from(*b)),
        Value::Str(s) => s
            .trim()
            .parse::<i64>()
            .ok()
            .or_else(|| to_i64(&Value::Double(s.trim().parse().ok()?))),
        _ => None,
    }
}

pub(super) fn to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Str(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        other => other.as_f64(),
    }
}

/// Narrow a number to a smaller kind holding the same value.
#[expect(
    clippy::cast_possible_truncation,
    clippy::float_cmp,
    reason = "narrowing only applies to integral doubles"
)]
pub(super) fn narrow(value: &Value) -> Option<Value> {
    match value {
        Value::Long(n) => i32::try_from(*n).ok().map(Value::Int),
        Value::Double(d) if d.is_finite() && d.trunc() == *d && d.abs() < 9.2e18 => {
            Some(Value::integer(*d as i64))
        }
        _ => None,
    }
}
