//! Variable, property and index access, and assignment targets.
//!
//! Reads resolve a local slot first, then the context by name, then a
//! static type reference. Whatever stays unresolved goes through
//! [`Interpreter::degrade`], which raises or substitutes a default
//! depending on the engine's strictness.

use quill_ir::{LocalRef, NodeId, NodeKind, VarRef};

use super::Interpreter;
use crate::errors::{final_variable, undefined_property, undefined_variable};
use crate::frame::ancestor;
use crate::scope::SymbolFlags;
use crate::{ControlAction, EvalError, EvalResult, Value};

/// An evaluated assignment target.
///
/// The object and key of a member target are evaluated once, so compound
/// assignments and increments read and write the same member.
pub(super) enum Target {
    Var(VarRef),
    Member { object: Value, key: Value, safe: bool },
}

impl Interpreter {
    pub(super) fn read_var(&self, var: VarRef) -> EvalResult {
        match var {
            VarRef::Local(local) => self.read_local(local),
            VarRef::Context(name) => self.read_context(self.tree.name(name)),
        }
    }

    fn read_local(&self, local: LocalRef) -> EvalResult {
        let name = self.tree.name(local.name);
        if local.hops > 0 {
            let value = ancestor(&self.frame, local.hops).and_then(|frame| frame.get(local.slot));
            return match value {
                Some(value) => Ok(value),
                None => self.read_context(name),
            };
        }
        if self.scopes.is_declared(local.slot) {
            return Ok(self.frame.get(local.slot).unwrap_or_default());
        }
        let options = &self.rt.options;
        if options.lexical_shade {
            return Err(undefined_variable(name).into());
        }
        match self.frame.get(local.slot) {
            Some(value) if !options.is_lexical() => Ok(value),
            _ => self.read_context(name),
        }
    }

    fn read_context(&self, name: &str) -> EvalResult {
        let context = &self.rt.context;
        if let Some(value) = context.get(name) {
            return Ok(value);
        }
        if context.has(name) {
            return Ok(Value::Null);
        }
        if let Some(ty) = self.rt.introspector.resolve_type(name) {
            return Ok(ty);
        }
        self.degrade(undefined_variable(name), Value::Null)
    }

    /// Raise `err`, or log it and return `fallback` when the engine
    /// tolerates unresolved references.
    pub(crate) fn degrade(&self, err: EvalError, fallback: Value) -> EvalResult {
        if !err.is_degradable() || self.rt.options.raises_unsolvable() {
            return Err(err.into());
        }
        if self.rt.options.strict {
            tracing::warn!(error = %err, "unsolvable reference");
        } else {
            tracing::trace!(error = %err, "degraded to default");
        }
        Ok(fallback)
    }

    pub(super) fn eval_property(&mut self, node: NodeId, name: quill_ir::Name, safe: bool) -> EvalResult {
        let object = self.eval(self.tree.child(node, 0))?;
        let key = Value::string(self.tree.name(name));
        self.read_member(&object, &key, safe)
    }

    pub(super) fn eval_index(&mut self, node: NodeId, safe: bool) -> EvalResult {
        let object = self.eval(self.tree.child(node, 0))?;
        let key = self.eval(self.tree.child(node, 1))?;
        self.read_member(&object, &key, safe)
    }

    fn read_member(&self, object: &Value, key: &Value, safe: bool) -> EvalResult {
        if object.is_null() {
            if safe || self.rt.options.safe {
                return Ok(Value::Null);
            }
            return self.degrade(undefined_property(&format!("null.{key}")), Value::Null);
        }
        match self.rt.introspector.property_get(object, key) {
            Some(result) => Ok(result?),
            None => self.degrade(
                undefined_property(&format!("{}.{key}", object.type_name())),
                Value::Null,
            ),
        }
    }

    pub(super) fn resolve_target(&mut self, node: NodeId) -> Result<Target, ControlAction> {
        match self.tree.kind(node) {
            NodeKind::Identifier(var) => Ok(Target::Var(var)),
            NodeKind::Property { name, safe } => {
                let object = self.eval(self.tree.child(node, 0))?;
                let key = Value::string(self.tree.name(name));
                Ok(Target::Member { object, key, safe })
            }
            NodeKind::Index { safe } => {
                let object = self.eval(self.tree.child(node, 0))?;
                let key = self.eval(self.tree.child(node, 1))?;
                Ok(Target::Member { object, key, safe })
            }
            _ => Err(EvalError::new("invalid assignment target").into()),
        }
    }

    pub(super) fn read_target(&self, target: &Target) -> EvalResult {
        match target {
            Target::Var(var) => self.read_var(*var),
            Target::Member { object, key, safe } => self.read_member(object, key, *safe),
        }
    }

    /// Store `value` into `target`, returning the value actually stored.
    pub(super) fn write_target(&mut self, target: &Target, value: Value) -> EvalResult {
        match target {
            Target::Var(VarRef::Local(local)) => self.write_local(*local, value),
            Target::Var(VarRef::Context(name)) => {
                self.rt.context.set(self.tree.name(*name), value.clone())?;
                Ok(value)
            }
            Target::Member { object, key, safe } => {
                if object.is_null() && (*safe || self.rt.options.safe) {
                    return Ok(value);
                }
                match self.rt.introspector.property_set(object, key, value.clone()) {
                    Some(result) => result?,
                    None => {
                        let property = format!("{}.{key}", object.type_name());
                        self.degrade(undefined_property(&property), Value::Null)?;
                    }
                }
                Ok(value)
            }
        }
    }

    fn write_local(&mut self, local: LocalRef, value: Value) -> EvalResult {
        let name = self.tree.name(local.name);
        if local.hops > 0 {
            let Some(frame) = ancestor(&self.frame, local.hops) else {
                return Err(undefined_variable(name).into());
            };
            frame.set(local.slot, value.clone());
            return Ok(value);
        }
        let value = match self.scopes.lookup(local.slot) {
            Some(symbol) => {
                if symbol.flags.contains(SymbolFlags::FINAL) && self.frame.is_assigned(local.slot) {
                    return Err(final_variable(name).into());
                }
                match symbol.ty {
                    Some(ty) if symbol.flags.contains(SymbolFlags::TYPED) => {
                        self.coerce_declared(local.name, value, ty)?
                    }
                    _ => value,
                }
            }
            None if self.rt.options.lexical_shade => {
                return Err(undefined_variable(name).into());
            }
            None if self.rt.options.lexical => {
                self.rt.context.set(name, value.clone())?;
                return Ok(value);
            }
            None => value,
        };
        self.frame.set(local.slot, value.clone());
        Ok(value)
    }

    pub(super) fn eval_assign(&mut self, node: NodeId) -> EvalResult {
        let target = self.resolve_target(self.tree.child(node, 0))?;
        let value = self.eval(self.tree.child(node, 1))?;
        self.write_target(&target, value)
    }
}
