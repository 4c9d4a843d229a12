//! Value introspection: properties, methods, constructors, iteration.
//!
//! The evaluator never inspects a value's structure directly for member
//! access; it asks a [`ValueIntrospector`]. [`DefaultIntrospector`] covers
//! the built-in value kinds and forwards host values to their
//! [`HostObject`](crate::HostObject) implementation.
//!
//! # Method Resolution Order
//!
//! Methods are resolved through a chain of resolvers, tried in priority
//! order until one returns a handle:
//! 1. Host object methods via `HostMethodResolver` (priority 0)
//! 2. Built-in methods on strings, collections, ranges and generators via
//!    `BuiltinMethodResolver` (priority 1)

mod builtins;

#[cfg(test)]
mod tests;

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

pub use builtins::BuiltinMethodResolver;

use crate::value::{map_get, map_put, GeneratorIter, MapValuesIter, RangeIter, SeqIter};
use crate::{EvalError, NativeFunction, Value, ValueIter};

/// Signature of a resolved method body.
pub type MethodFn = dyn Fn(&Value, &[Value]) -> Result<Value, EvalError> + Send + Sync;

/// A resolved, invocable method.
///
/// A handle does not capture its receiver, so it can be memoized at a call
/// site and reused for any receiver of the same kind.
#[derive(Clone)]
pub struct MethodHandle {
    name: Arc<str>,
    invoke: Arc<MethodFn>,
}

impl MethodHandle {
    pub fn new(
        name: impl Into<Arc<str>>,
        invoke: impl Fn(&Value, &[Value]) -> Result<Value, EvalError> + Send + Sync + 'static,
    ) -> Self {
        MethodHandle {
            name: name.into(),
            invoke: Arc::new(invoke),
        }
    }

    /// Wrap a free function, ignoring the receiver.
    pub fn from_function(function: NativeFunction) -> Self {
        let name: Arc<str> = Arc::from(function.name());
        MethodHandle::new(name, move |_, args| function.call(args))
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn invoke(&self, target: &Value, args: &[Value]) -> Result<Value, EvalError> {
        (self.invoke)(target, args)
    }
}

impl fmt::Debug for MethodHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MethodHandle({})", self.name)
    }
}

/// Narrow capability interface over runtime values.
///
/// `None` results mean "not found"; the evaluator then applies its
/// strictness rules. `Some(Err(..))` is a failure of a found member.
pub trait ValueIntrospector: Send + Sync {
    fn property_get(&self, object: &Value, key: &Value) -> Option<Result<Value, EvalError>>;

    fn property_set(
        &self,
        object: &Value,
        key: &Value,
        value: Value,
    ) -> Option<Result<(), EvalError>>;

    fn resolve_method(&self, target: &Value, name: &str, args: &[Value]) -> Option<MethodHandle>;

    /// Constructor for `new(class, args...)`; `class` is a type name, a
    /// function or a host factory.
    fn resolve_constructor(&self, class: &Value, args: &[Value]) -> Option<MethodHandle>;

    fn resolve_iterable(&self, value: &Value) -> Option<ValueIter>;

    /// A statically resolvable type reference, e.g. a class name used as a
    /// value.
    fn resolve_type(&self, name: &str) -> Option<Value>;
}

/// Trait for method resolvers in the chain.
pub trait MethodResolver {
    fn resolve(&self, target: &Value, name: &str, args: &[Value]) -> Option<MethodHandle>;

    /// Lower = tried first.
    fn priority(&self) -> u8;

    /// Human-readable resolver name for tracing.
    fn resolver_name(&self) -> &'static str;
}

/// Methods of host objects.
#[derive(Clone, Copy, Debug, Default)]
pub struct HostMethodResolver;

impl MethodResolver for HostMethodResolver {
    fn resolve(&self, target: &Value, name: &str, args: &[Value]) -> Option<MethodHandle> {
        let Value::Host(host) = target else {
            return None;
        };
        if !host.responds_to(name, args) {
            return None;
        }
        let method: Arc<str> = Arc::from(name);
        let invoked = Arc::clone(&method);
        Some(MethodHandle::new(method, move |target, args| match target {
            Value::Host(host) => host.call_method(&invoked, args),
            other => Err(crate::errors::undefined_method(&format!(
                "{}.{invoked}",
                other.type_name()
            ))),
        }))
    }

    fn priority(&self) -> u8 {
        0
    }

    fn resolver_name(&self) -> &'static str {
        "host"
    }
}

/// Enum-based resolver kind for the fixed set of method resolvers.
#[derive(Clone, Debug)]
pub enum MethodResolverKind {
    Host(HostMethodResolver),
    Builtin(BuiltinMethodResolver),
}

impl MethodResolverKind {
    pub fn resolve(&self, target: &Value, name: &str, args: &[Value]) -> Option<MethodHandle> {
        match self {
            Self::Host(r) => r.resolve(target, name, args),
            Self::Builtin(r) => r.resolve(target, name, args),
        }
    }

    pub fn priority(&self) -> u8 {
        match self {
            Self::Host(r) => r.priority(),
            Self::Builtin(r) => r.priority(),
        }
    }

    pub fn resolver_name(&self) -> &'static str {
        match self {
            Self::Host(r) => r.resolver_name(),
            Self::Builtin(r) => r.resolver_name(),
        }
    }
}

/// Method dispatcher that chains resolvers in priority order.
#[derive(Clone, Debug)]
pub struct MethodDispatcher {
    resolvers: Arc<Vec<MethodResolverKind>>,
}

impl MethodDispatcher {
    pub fn new(mut resolvers: Vec<MethodResolverKind>) -> Self {
        resolvers.sort_by_key(MethodResolverKind::priority);
        Self {
            resolvers: Arc::new(resolvers),
        }
    }

    pub fn resolve(&self, target: &Value, name: &str, args: &[Value]) -> Option<MethodHandle> {
        self.resolvers.iter().find_map(|resolver| {
            let handle = resolver.resolve(target, name, args)?;
            tracing::trace!(resolver = resolver.resolver_name(), method = name, "method resolved");
            Some(handle)
        })
    }
}

impl Default for MethodDispatcher {
    fn default() -> Self {
        MethodDispatcher::new(vec![
            MethodResolverKind::Builtin(BuiltinMethodResolver),
            MethodResolverKind::Host(HostMethodResolver),
        ])
    }
}

/// Introspector for built-in values and [`HostObject`](crate::HostObject)s.
#[derive(Default)]
pub struct DefaultIntrospector {
    dispatcher: MethodDispatcher,
    types: FxHashMap<String, Value>,
    constructors: FxHashMap<String, NativeFunction>,
}

impl DefaultIntrospector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `name` resolvable as a type reference.
    #[must_use]
    pub fn with_type(mut self, name: &str, value: Value) -> Self {
        self.types.insert(name.to_owned(), value);
        self
    }

    /// Register a constructor for `new('name', ...)`.
    #[must_use]
    pub fn with_constructor(mut self, class: &str, constructor: NativeFunction) -> Self {
        self.constructors.insert(class.to_owned(), constructor);
        self
    }
}

impl ValueIntrospector for DefaultIntrospector {
    fn property_get(&self, object: &Value, key: &Value) -> Option<Result<Value, EvalError>> {
        match object {
            // A missing key reads as null rather than an unknown property.
            Value::Map(entries) => Some(Ok(map_get(&entries.read(), key).unwrap_or(Value::Null))),
            Value::List(items) => {
                let index = index_of(key)?;
                items.read().get(index).cloned().map(Ok)
            }
            Value::Str(s) => {
                let index = index_of(key)?;
                s.chars().nth(index).map(|c| Ok(Value::string(c.to_string())))
            }
            Value::Host(host) => host.property(key.as_str()?).map(Ok),
            _ => None,
        }
    }

    fn property_set(
        &self,
        object: &Value,
        key: &Value,
        value: Value,
    ) -> Option<Result<(), EvalError>> {
        match object {
            Value::Map(entries) => Some(entries.write("map").map(|mut entries| {
                map_put(&mut *entries, key.clone(), value);
            })),
            Value::List(items) => {
                let index = index_of(key)?;
                if index >= items.read().len() {
                    return None;
                }
                Some(items.write("list").map(|mut items| {
                    if let Some(slot) = items.get_mut(index) {
                        *slot = value;
                    }
                }))
            }
            Value::Host(host) => match host.set_property(key.as_str()?, value) {
                Ok(true) => Some(Ok(())),
                Ok(false) => None,
                Err(e) => Some(Err(e)),
            },
            _ => None,
        }
    }

    fn resolve_method(&self, target: &Value, name: &str, args: &[Value]) -> Option<MethodHandle> {
        self.dispatcher.resolve(target, name, args)
    }

    fn resolve_constructor(&self, class: &Value, args: &[Value]) -> Option<MethodHandle> {
        match class {
            Value::Str(name) => self
                .constructors
                .get(&**name)
                .cloned()
                .map(MethodHandle::from_function),
            Value::Function(function) => Some(MethodHandle::from_function(function.clone())),
            Value::Host(host) if host.responds_to("new", args) => {
                Some(MethodHandle::new("new", |target, args| match target {
                    Value::Host(host) => host.call_method("new", args),
                    other => Err(crate::errors::not_callable(other.type_name())),
                }))
            }
            _ => None,
        }
    }

    fn resolve_iterable(&self, value: &Value) -> Option<ValueIter> {
        let iter: ValueIter = match value {
            Value::Null => Box::new(SeqIter::from_values(Vec::new())),
            Value::List(items) => Box::new(SeqIter::new(Arc::clone(items), "list")),
            Value::Set(items) => Box::new(SeqIter::new(Arc::clone(items), "set")),
            Value::Map(entries) => Box::new(MapValuesIter::new(Arc::clone(entries))),
            Value::Range { low, high } => Box::new(RangeIter::new(*low, *high)),
            Value::Str(s) => Box::new(SeqIter::from_values(
                s.chars().map(|c| Value::string(c.to_string())).collect(),
            )),
            Value::Generator(generator) => Box::new(GeneratorIter::new(generator.clone())),
            Value::Host(host) => return host.iterate(),
            _ => return None,
        };
        Some(iter)
    }

    fn resolve_type(&self, name: &str) -> Option<Value> {
        self.types.get(name).cloned()
    }
}

/// Non-negative integral index from a key value.
fn index_of(key: &Value) -> Option<usize> {
    usize::try_from(key.as_i64()?).ok()
}
