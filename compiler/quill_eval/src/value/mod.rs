//! Runtime values.
//!
//! Scalars are stored inline; strings, containers, closures and host objects
//! are reference counted so that copying a `Value` is cheap and containers
//! have reference semantics.
//!
//! # Thread Safety
//!
//! Every heap payload is `Send + Sync`: containers go through [`Shared`],
//! host objects are `Arc<dyn HostObject>`, and generators keep their
//! suspended state behind a mutex.

mod collections;
mod host;
mod iter;


use std::fmt;
use std::sync::Arc;

pub use collections::{map_get, map_put, set_add, Shared, SharedMap, SharedSeq};
pub use host::HostObject;
pub use iter::{ValueIter, ValueIterator};
pub(crate) use iter::{GeneratorIter, MapValuesIter, RangeIter, SeqIter};

use crate::{Closure, EvalError, Generator};

/// Signature of a native function.
pub type NativeFn = dyn Fn(&[Value]) -> Result<Value, EvalError> + Send + Sync;

/// A named host function callable from scripts.
#[derive(Clone)]
pub struct NativeFunction {
    name: Arc<str>,
    func: Arc<NativeFn>,
}

impl NativeFunction {
    pub fn new(
        name: impl Into<Arc<str>>,
        func: impl Fn(&[Value]) -> Result<Value, EvalError> + Send + Sync + 'static,
    ) -> Self {
        NativeFunction {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn call(&self, args: &[Value]) -> Result<Value, EvalError> {
        (self.func)(args)
    }

    /// Identity comparison.
    pub fn ptr_eq(&self, other: &NativeFunction) -> bool {
        Arc::ptr_eq(&self.func, &other.func)
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeFunction({})", self.name)
    }
}

/// Runtime value.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i32),
    Long(i64),
    Double(f64),
    Str(Arc<str>),
    List(SharedSeq),
    /// Insertion-ordered set.
    Set(SharedSeq),
    /// Insertion-ordered map.
    Map(SharedMap),
    /// Inclusive integer range.
    Range { low: i64, high: i64 },
    Closure(Arc<Closure>),
    Function(NativeFunction),
    Host(Arc<dyn HostObject>),
    Generator(Generator),
}

/// Runtime kind of a value, used for dispatch signatures.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Bool,
    Int,
    Long,
    Double,
    Str,
    List,
    Set,
    Map,
    Range,
    Closure,
    Function,
    Host(&'static str),
    Generator,
}

impl ValueKind {
    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Null => "null",
            ValueKind::Bool => "boolean",
            ValueKind::Int => "int",
            ValueKind::Long => "long",
            ValueKind::Double => "double",
            ValueKind::Str => "string",
            ValueKind::List => "list",
            ValueKind::Set => "set",
            ValueKind::Map => "map",
            ValueKind::Range => "range",
            ValueKind::Closure => "closure",
            ValueKind::Function => "function",
            ValueKind::Host(name) => name,
            ValueKind::Generator => "generator",
        }
    }

    #[inline]
    pub fn is_numeric(self) -> bool {
        matches!(self, ValueKind::Int | ValueKind::Long | ValueKind::Double)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// Factory Methods

impl Value {
    /// Integer value of the smallest kind that holds `n`.
    pub fn integer(n: i64) -> Self {
        match i32::try_from(n) {
            Ok(small) => Value::Int(small),
            Err(_) => Value::Long(n),
        }
    }

    pub fn string(s: impl Into<Arc<str>>) -> Self {
        Value::Str(s.into())
    }

    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Arc::new(Shared::new(items)))
    }

    /// A set; duplicates in `items` are dropped, first occurrence wins.
    pub fn set(items: Vec<Value>) -> Self {
        let mut unique = Vec::with_capacity(items.len());
        for item in items {
            set_add(&mut unique, item);
        }
        Value::Set(Arc::new(Shared::new(unique)))
    }

    /// A map; later duplicate keys replace earlier ones.
    pub fn map(entries: Vec<(Value, Value)>) -> Self {
        let mut unique = Vec::with_capacity(entries.len());
        for (k, v) in entries {
            map_put(&mut unique, k, v);
        }
        Value::Map(Arc::new(Shared::new(unique)))
    }

    pub fn native(
        name: impl Into<Arc<str>>,
        func: impl Fn(&[Value]) -> Result<Value, EvalError> + Send + Sync + 'static,
    ) -> Self {
        Value::Function(NativeFunction::new(name, func))
    }

    pub fn host(object: impl HostObject + 'static) -> Self {
        Value::Host(Arc::new(object))
    }
}

// Accessors

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Long(_) => ValueKind::Long,
            Value::Double(_) => ValueKind::Double,
            Value::Str(_) => ValueKind::Str,
            Value::List(_) => ValueKind::List,
            Value::Set(_) => ValueKind::Set,
            Value::Map(_) => ValueKind::Map,
            Value::Range { .. } => ValueKind::Range,
            Value::Closure(_) => ValueKind::Closure,
            Value::Function(_) => ValueKind::Function,
            Value::Host(h) => ValueKind::Host(h.type_name()),
            Value::Generator(_) => ValueKind::Generator,
        }
    }

    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.kind().name()
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    #[inline]
    pub fn is_number(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Long(_) | Value::Double(_))
    }

    /// Integral value of an `Int` or `Long`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(i64::from(*n)),
            Value::Long(n) => Some(*n),
            _ => None,
        }
    }

    /// Any numeric value as a double.
    #[expect(
        clippy::cast_precision_loss,
        reason = "long to double conversion is the language's numeric widening"
    )]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(f64::from(*n)),
            Value::Long(n) => Some(*n as f64),
            Value::Double(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Whether the value can be invoked with call syntax.
    #[inline]
    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Closure(_) | Value::Function(_))
    }

    /// Structural equality that also equates numbers across kinds.
    ///
    /// Used for map keys, set membership and `==`.
    #[allow(clippy::float_cmp, reason = "language equality is exact")]
    pub fn loosely_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (a, b) if a.is_number() && b.is_number() => match (a.as_i64(), b.as_i64()) {
                (Some(x), Some(y)) => x == y,
                _ => a.as_f64() == b.as_f64(),
            },
            (Value::List(a), Value::List(b)) | (Value::Set(a), Value::Set(b)) => {
                if Arc::ptr_eq(a, b) {
                    return true;
                }
                let (a, b) = (a.read(), b.read());
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.loosely_equals(y))
            }
            (Value::Map(a), Value::Map(b)) => {
                if Arc::ptr_eq(a, b) {
                    return true;
                }
                let (a, b) = (a.read(), b.read());
                a.len() == b.len()
                    && a.iter().all(|(k, v)| {
                        map_get(&b, k).is_some_and(|other| other.loosely_equals(v))
                    })
            }
            _ => self == other,
        }
    }
}

impl PartialEq for Value {
    /// Exact equality: values of different kinds are never equal.
    #[allow(clippy::float_cmp, reason = "language equality is exact")]
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Long(a), Value::Long(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) | (Value::Set(a), Value::Set(b)) => {
                Arc::ptr_eq(a, b) || *a.read() == *b.read()
            }
            (Value::Map(a), Value::Map(b)) => Arc::ptr_eq(a, b) || *a.read() == *b.read(),
            (
                Value::Range { low: a, high: b },
                Value::Range {
                    low: c,
                    high: d,
                },
            ) => a == c && b == d,
            (Value::Closure(a), Value::Closure(b)) => Arc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
            (Value::Host(a), Value::Host(b)) => Arc::ptr_eq(a, b),
            (Value::Generator(a), Value::Generator(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Int(n) => write!(f, "Int({n})"),
            Value::Long(n) => write!(f, "Long({n})"),
            Value::Double(d) => write!(f, "Double({d:?})"),
            Value::Str(s) => write!(f, "Str({s:?})"),
            Value::List(items) => f.debug_tuple("List").field(&*items.read()).finish(),
            Value::Set(items) => f.debug_tuple("Set").field(&*items.read()).finish(),
            Value::Map(entries) => f.debug_tuple("Map").field(&*entries.read()).finish(),
            Value::Range { low, high } => write!(f, "Range({low}..{high})"),
            Value::Closure(c) => write!(f, "{c:?}"),
            Value::Function(func) => write!(f, "{func:?}"),
            Value::Host(h) => write!(f, "Host({h:?})"),
            Value::Generator(g) => write!(f, "{g:?}"),
        }
    }
}

impl fmt::Display for Value {
    /// Script-visible string form; null renders as `null`.
    #[allow(clippy::float_cmp, reason = "integral doubles keep a trailing `.0`")]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Long(n) => write!(f, "{n}"),
            Value::Double(d) => {
                if d.fract() == 0.0 && d.is_finite() {
                    write!(f, "{d:.1}")
                } else {
                    write!(f, "{d}")
                }
            }
            Value::Str(s) => write!(f, "{s}"),
            Value::List(items) => write_seq(f, "[", &items.read(), "]"),
            Value::Set(items) => write_seq(f, "{", &items.read(), "}"),
            Value::Map(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.read().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
            Value::Range { low, high } => write!(f, "{low}..{high}"),
            Value::Closure(_) => write!(f, "<closure>"),
            Value::Function(func) => write!(f, "<function {}>", func.name()),
            Value::Host(h) => write!(f, "{}", h.display()),
            Value::Generator(_) => write!(f, "<generator>"),
        }
    }
}

fn write_seq(f: &mut fmt::Formatter<'_>, open: &str, items: &[Value], close: &str) -> fmt::Result {
    f.write_str(open)?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{item}")?;
    }
    f.write_str(close)
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Long(n)
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Value::Double(d)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(Arc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(Arc::from(s))
    }
}
