//! The host-supplied variable environment.
//!
//! Identifiers with no frame slot resolve against a [`Context`] by name.
//! The context also supplies functions, namespaces and the annotation hook.

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::{EvalError, EvalResult, NativeFunction, Value};

/// External namespace for variables without a frame slot.
pub trait Context: Send + Sync {
    /// Value bound to `name`, `None` when unbound.
    fn get(&self, name: &str) -> Option<Value>;

    fn set(&self, name: &str, value: Value) -> Result<(), EvalError>;

    fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Object resolving `ns:f(...)` calls.
    fn resolve_namespace(&self, _namespace: &str) -> Option<Value> {
        None
    }

    /// Function bound to `name` for `name(args)` and method syntax.
    fn function(&self, _name: &str) -> Option<NativeFunction> {
        None
    }

    /// Run an annotated statement.
    ///
    /// `statement` evaluates the annotated statement; the default runs it
    /// unchanged.
    fn process_annotation(
        &self,
        _name: &str,
        _args: &[Value],
        statement: &mut dyn FnMut() -> EvalResult,
    ) -> EvalResult {
        statement()
    }
}

/// Hash-map backed [`Context`].
#[derive(Default)]
pub struct MapContext {
    vars: RwLock<FxHashMap<String, Value>>,
    functions: RwLock<FxHashMap<String, NativeFunction>>,
    namespaces: RwLock<FxHashMap<String, Value>>,
}

impl MapContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style variable binding.
    #[must_use]
    pub fn with_var(self, name: &str, value: impl Into<Value>) -> Self {
        self.vars.write().insert(name.to_owned(), value.into());
        self
    }

    pub fn define_function(&self, function: NativeFunction) {
        self.functions
            .write()
            .insert(function.name().to_owned(), function);
    }

    pub fn define_namespace(&self, name: &str, value: Value) {
        self.namespaces.write().insert(name.to_owned(), value);
    }

    pub fn remove(&self, name: &str) -> Option<Value> {
        self.vars.write().remove(name)
    }
}

impl Context for MapContext {
    fn get(&self, name: &str) -> Option<Value> {
        self.vars.read().get(name).cloned()
    }

    fn set(&self, name: &str, value: Value) -> Result<(), EvalError> {
        self.vars.write().insert(name.to_owned(), value);
        Ok(())
    }

    fn has(&self, name: &str) -> bool {
        self.vars.read().contains_key(name)
    }

    fn resolve_namespace(&self, namespace: &str) -> Option<Value> {
        self.namespaces.read().get(namespace).cloned()
    }

    fn function(&self, name: &str) -> Option<NativeFunction> {
        self.functions.read().get(name).cloned()
    }
}

impl std::fmt::Debug for MapContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapContext")
            .field("vars", &self.vars.read().len())
            .field("functions", &self.functions.read().len())
            .finish_non_exhaustive()
    }
}
