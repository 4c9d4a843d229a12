//! Host objects exposed to scripts.

use std::fmt;

use super::{Value, ValueIter};
use crate::errors::undefined_method;
use crate::EvalError;

/// An application object scripts can read, write, call and iterate.
///
/// Every method has a default so hosts implement only the capabilities they
/// expose. Returning `None`/`false` means "not handled here" and lets the
/// dispatch layer try its remaining tiers.
pub trait HostObject: Send + Sync + fmt::Debug {
    /// Name reported in diagnostics and dispatch signatures.
    fn type_name(&self) -> &'static str;

    fn property(&self, _name: &str) -> Option<Value> {
        None
    }

    /// Returns `Ok(false)` when the property does not exist.
    fn set_property(&self, _name: &str, _value: Value) -> Result<bool, EvalError> {
        Ok(false)
    }

    /// Whether `call_method(name, args)` would be handled.
    fn responds_to(&self, _name: &str, _args: &[Value]) -> bool {
        false
    }

    fn call_method(&self, name: &str, _args: &[Value]) -> Result<Value, EvalError> {
        Err(undefined_method(name))
    }

    fn iterate(&self) -> Option<ValueIter> {
        None
    }

    fn display(&self) -> String {
        format!("<{}>", self.type_name())
    }
}
