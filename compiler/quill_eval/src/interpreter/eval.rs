//! Node dispatch.
//!
//! One exhaustive `match` over [`NodeKind`]; each arm hands off to the
//! module that owns that kind of node. Errors leaving a node are stamped
//! with the innermost node and span they came from.

use quill_ir::{NodeId, NodeKind, Number};

use super::Interpreter;
use crate::diagnostics::ensure_sufficient_stack;
use crate::{ControlAction, EvalResult, Value};

impl Interpreter {
    /// Evaluate `node` against the current frame and context.
    ///
    /// An `INVALID` node (an absent optional child) evaluates to null.
    #[tracing::instrument(level = "trace", skip(self))]
    pub fn eval(&mut self, node: NodeId) -> EvalResult {
        if !node.is_valid() {
            return Ok(Value::Null);
        }
        match ensure_sufficient_stack(|| self.eval_inner(node)) {
            Err(ControlAction::Error(mut e)) => {
                if e.node.is_none() {
                    e.node = Some(node);
                    e.span = Some(self.tree.span(node));
                }
                Err(ControlAction::Error(e))
            }
            other => other,
        }
    }

    fn eval_inner(&mut self, node: NodeId) -> EvalResult {
        match self.tree.kind(node) {
            // Roots
            NodeKind::Script(_) => self.eval_sequence(node, 0, false),
            NodeKind::Lambda(_) => Ok(self.create_closure(node)?),

            // Literals
            NodeKind::Null => Ok(Value::Null),
            NodeKind::Bool(b) => Ok(Value::Bool(b)),
            NodeKind::Number(Number::Int(n)) => Ok(Value::Int(n)),
            NodeKind::Number(Number::Long(n)) => Ok(Value::Long(n)),
            NodeKind::Number(Number::Double(d)) => Ok(Value::Double(d)),
            NodeKind::Str(name) => Ok(Value::string(self.tree.name(name))),
            NodeKind::Template => self.eval_template(node),
            NodeKind::Range => self.eval_range(node),
            NodeKind::ArrayLiteral { immutable } => {
                let items = self.eval_children(node, 0)?;
                Ok(self.rt.policy.build_list(items, immutable))
            }
            NodeKind::SetLiteral { immutable } => {
                let items = self.eval_children(node, 0)?;
                Ok(self.rt.policy.build_set(items, immutable))
            }
            NodeKind::MapLiteral { immutable } => self.eval_map_literal(node, immutable),
            NodeKind::MapEntry => {
                let entry = self.eval_children(node, 0)?;
                Ok(Value::list(entry))
            }

            // References
            NodeKind::Identifier(var) => self.read_var(var),

            // Operators
            NodeKind::Binary(op) => self.eval_binary(node, op),
            NodeKind::And => self.eval_and(node),
            NodeKind::Or => self.eval_or(node),
            NodeKind::NullCoalesce => self.eval_null_coalesce(node),
            NodeKind::Elvis => self.eval_elvis(node),
            NodeKind::Ternary => self.eval_ternary(node),
            NodeKind::Unary(op) => self.eval_unary(node, op),
            NodeKind::IncDec { op, prefix } => self.eval_inc_dec(node, op, prefix),
            NodeKind::Assign => self.eval_assign(node),
            NodeKind::CompoundAssign(op) => self.eval_compound_assign(node, op),

            // Access
            NodeKind::Property { name, safe } => self.eval_property(node, name, safe),
            NodeKind::Index { safe } => self.eval_index(node, safe),

            // Calls
            NodeKind::FunctionCall => self.eval_function_call(node),
            NodeKind::MethodCall { name, safe } => self.eval_method_call(node, name, safe),
            NodeKind::NamespaceCall { namespace, name } => {
                self.eval_namespace_call(node, namespace, name)
            }
            NodeKind::Constructor => self.eval_constructor(node),

            // Statements
            NodeKind::Block => self.eval_block(node),
            NodeKind::Declare(decl) => self.eval_declare(node, &decl),
            NodeKind::If => self.eval_if(node),
            NodeKind::While { label } => self.eval_while(node, label),
            NodeKind::DoWhile { label } => self.eval_do_while(node, label),
            NodeKind::For { label } => self.eval_for(node, label),
            NodeKind::Foreach { label, var } => self.eval_foreach(node, label, &var),
            NodeKind::Switch => self.eval_switch(node),
            NodeKind::Case => self.eval_sequence(node, 1, false),
            NodeKind::DefaultCase => self.eval_sequence(node, 0, false),
            NodeKind::Break(label) => Err(ControlAction::Break(label)),
            NodeKind::Continue(label) => Err(ControlAction::Continue(label)),
            NodeKind::Remove(label) => Err(ControlAction::Remove(label)),
            NodeKind::Return => {
                let value = self.eval(self.tree.child(node, 0))?;
                Err(ControlAction::Return(value))
            }
            NodeKind::Yield => self.eval_yield(node),
            NodeKind::Throw => {
                let value = self.eval(self.tree.child(node, 0))?;
                Err(crate::errors::thrown(value).into())
            }
            NodeKind::Try { catch_var } => self.eval_try(node, catch_var.as_ref()),
            NodeKind::Annotated { name } => self.eval_annotated(node, name),
            NodeKind::Assert => self.eval_assert(node),
            NodeKind::Empty => Ok(Value::Null),
        }
    }

    /// Evaluate the children of `node` from index `from`, left to right.
    pub(crate) fn eval_children(
        &mut self,
        node: NodeId,
        from: usize,
    ) -> Result<Vec<Value>, ControlAction> {
        let tree = self.tree.clone();
        let children = tree.children(node);
        let mut values = Vec::with_capacity(children.len().saturating_sub(from));
        for &child in children.iter().skip(from) {
            values.push(self.eval(child)?);
        }
        Ok(values)
    }
}
