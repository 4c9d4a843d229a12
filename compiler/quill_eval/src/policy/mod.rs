//! Numeric and semantic policy.
//!
//! The [`ArithmeticPolicy`] decides what operators mean for built-in value
//! kinds, what is truthy, how values convert to declared types and which
//! overloads and free functions exist. Operator dispatch consults the
//! policy between the call-site memo and the duck-typed probe.

mod numeric;


use std::sync::Arc;

use quill_ir::{BinaryOp, DeclaredType, TypeKind, UnaryOp};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::errors::{cannot_coerce, operator_error};
use crate::value::{map_put, set_add, Shared};
use crate::{EvalError, NativeFunction, Value, ValueKind};

/// Operand kinds an overload is registered for.
pub type KindSignature = SmallVec<[ValueKind; 2]>;

/// Arithmetic and coercion semantics.
pub trait ArithmeticPolicy: Send + Sync {
    /// Whether null is rejected by arithmetic.
    fn is_strict(&self) -> bool;

    /// Base semantics of a positive binary operator; `None` when the policy
    /// does not handle these operand kinds. Negated operators (`!=`, `!~`,
    /// ...) are derived by the caller.
    fn binary(&self, op: BinaryOp, left: &Value, right: &Value) -> Option<Result<Value, EvalError>>;

    fn unary(&self, op: UnaryOp, operand: &Value) -> Option<Result<Value, EvalError>>;

    fn truthy(&self, value: &Value) -> bool;

    /// Convert `value` for a slot or return value of type `ty`. Null passes
    /// through; rejecting it is the caller's concern.
    fn coerce(&self, value: Value, ty: DeclaredType) -> Result<Value, EvalError>;

    /// Overload of operator `op` (by method name) for the operand kinds.
    fn overload(&self, _op: &str, _kinds: &[ValueKind]) -> Option<NativeFunction> {
        None
    }

    /// Policy-provided free function.
    fn function(&self, _name: &str, _kinds: &[ValueKind]) -> Option<NativeFunction> {
        None
    }

    /// A smaller numeric kind holding the same value, if any.
    fn narrow(&self, value: &Value) -> Option<Value> {
        numeric::narrow(value)
    }

    fn build_list(&self, items: Vec<Value>, immutable: bool) -> Value {
        Value::List(Arc::new(shared(items, immutable)))
    }

    fn build_set(&self, items: Vec<Value>, immutable: bool) -> Value {
        let mut unique = Vec::with_capacity(items.len());
        for item in items {
            set_add(&mut unique, item);
        }
        Value::Set(Arc::new(shared(unique, immutable)))
    }

    fn build_map(&self, entries: Vec<(Value, Value)>, immutable: bool) -> Value {
        let mut unique = Vec::with_capacity(entries.len());
        for (k, v) in entries {
            map_put(&mut unique, k, v);
        }
        Value::Map(Arc::new(shared(unique, immutable)))
    }
}

fn shared<T>(data: T, immutable: bool) -> Shared<T> {
    if immutable {
        Shared::frozen(data)
    } else {
        Shared::new(data)
    }
}

/// Default policy: widening integer arithmetic, null-as-zero unless strict.
#[derive(Default)]
pub struct DefaultArithmetic {
    strict: bool,
    overloads: FxHashMap<(String, KindSignature), NativeFunction>,
    functions: FxHashMap<String, NativeFunction>,
}

impl DefaultArithmetic {
    pub fn new(strict: bool) -> Self {
        DefaultArithmetic {
            strict,
            ..Self::default()
        }
    }

    /// Register an operator overload for exact operand kinds.
    #[must_use]
    pub fn with_overload(mut self, op: &str, kinds: &[ValueKind], function: NativeFunction) -> Self {
        self.overloads
            .insert((op.to_owned(), SmallVec::from_slice(kinds)), function);
        self
    }

    /// Register a free function.
    #[must_use]
    pub fn with_function(mut self, function: NativeFunction) -> Self {
        self.functions.insert(function.name().to_owned(), function);
        self
    }

    /// Null operands count as zero unless strict.
    fn null_as_zero<'a>(&self, value: &'a Value) -> Option<std::borrow::Cow<'a, Value>> {
        match value {
            Value::Null if self.strict => None,
            Value::Null => Some(std::borrow::Cow::Owned(Value::Int(0))),
            other => Some(std::borrow::Cow::Borrowed(other)),
        }
    }
}

impl ArithmeticPolicy for DefaultArithmetic {
    fn is_strict(&self) -> bool {
        self.strict
    }

    fn binary(&self, op: BinaryOp, left: &Value, right: &Value) -> Option<Result<Value, EvalError>> {
        match op {
            BinaryOp::Eq => Some(Ok(Value::Bool(left.loosely_equals(right)))),
            BinaryOp::Identical => Some(Ok(Value::Bool(left == right))),
            BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => {
                let ordering = numeric::compare(left, right)?;
                let result = match op {
                    BinaryOp::Lt => ordering.is_lt(),
                    BinaryOp::LtEq => ordering.is_le(),
                    BinaryOp::Gt => ordering.is_gt(),
                    _ => ordering.is_ge(),
                };
                Some(Ok(Value::Bool(result)))
            }
            BinaryOp::Contains => numeric::contains(left, right).map(|b| Ok(Value::Bool(b))),
            BinaryOp::StartsWith => match (left, right) {
                (Value::Str(l), Value::Str(r)) => Some(Ok(Value::Bool(l.starts_with(&**r)))),
                _ => None,
            },
            BinaryOp::EndsWith => match (left, right) {
                (Value::Str(l), Value::Str(r)) => Some(Ok(Value::Bool(l.ends_with(&**r)))),
                _ => None,
            },
            BinaryOp::NotEq
            | BinaryOp::NotIdentical
            | BinaryOp::NotContains
            | BinaryOp::NotStartsWith
            | BinaryOp::NotEndsWith => None,
            BinaryOp::Add if matches!(left, Value::Str(_)) || matches!(right, Value::Str(_)) => {
                Some(Ok(Value::string(format!("{left}{right}"))))
            }
            _ => {
                if (left.is_null() || right.is_null()) && self.strict {
                    return Some(Err(operator_error(op.as_symbol(), "null operand")));
                }
                let left = self.null_as_zero(left)?;
                let right = self.null_as_zero(right)?;
                numeric::arithmetic(op, &left, &right)
            }
        }
    }

    fn unary(&self, op: UnaryOp, operand: &Value) -> Option<Result<Value, EvalError>> {
        match op {
            UnaryOp::Not => Some(Ok(Value::Bool(!self.truthy(operand)))),
            UnaryOp::Empty => numeric::is_empty(operand).map(|b| Ok(Value::Bool(b))),
            UnaryOp::Size => numeric::size(operand).map(|n| Ok(Value::integer(n))),
            UnaryOp::Neg | UnaryOp::Pos | UnaryOp::BitNot => {
                if operand.is_null() && self.strict {
                    return Some(Err(operator_error(op.as_symbol(), "null operand")));
                }
                let operand = self.null_as_zero(operand)?;
                numeric::unary(op, &operand)
            }
        }
    }

    fn truthy(&self, value: &Value) -> bool {
        match value {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Long(n) => *n != 0,
            Value::Double(d) => *d != 0.0 && !d.is_nan(),
            Value::Str(s) => !s.is_empty(),
            Value::List(items) | Value::Set(items) => !items.read().is_empty(),
            Value::Map(entries) => !entries.read().is_empty(),
            Value::Range { low, high } => low <= high,
            Value::Closure(_) | Value::Function(_) | Value::Host(_) | Value::Generator(_) => true,
        }
    }

    fn coerce(&self, value: Value, ty: DeclaredType) -> Result<Value, EvalError> {
        if value.is_null() {
            return Ok(value);
        }
        let converted = match ty.kind {
            TypeKind::Any => Some(value.clone()),
            TypeKind::Bool => match &value {
                Value::Bool(_) => Some(value.clone()),
                Value::Str(s) => s.parse::<bool>().ok().map(Value::Bool),
                v if v.is_number() => Some(Value::Bool(self.truthy(v))),
                _ => None,
            },
            TypeKind::Int => numeric::to_i64(&value)
                .and_then(|n| i32::try_from(n).ok())
                .map(Value::Int),
            TypeKind::Long => numeric::to_i64(&value).map(Value::Long),
            TypeKind::Double => numeric::to_f64(&value).map(Value::Double),
            TypeKind::Str => Some(Value::string(value.to_string())),
        };
        converted.ok_or_else(|| cannot_coerce(value.type_name(), type_name(ty.kind)))
    }

    fn overload(&self, op: &str, kinds: &[ValueKind]) -> Option<NativeFunction> {
        if self.overloads.is_empty() {
            return None;
        }
        self.overloads
            .get(&(op.to_owned(), SmallVec::from_slice(kinds)))
            .cloned()
    }

    fn function(&self, name: &str, _kinds: &[ValueKind]) -> Option<NativeFunction> {
        self.functions.get(name).cloned()
    }
}

/// Source spelling of a declared type kind.
pub fn type_name(kind: TypeKind) -> &'static str {
    match kind {
        TypeKind::Any => "var",
        TypeKind::Bool => "boolean",
        TypeKind::Int => "int",
        TypeKind::Long => "long",
        TypeKind::Double => "double",
        TypeKind::Str => "string",
    }
}
