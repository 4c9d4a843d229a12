//! Expression lowering: literals, operators, assignment targets, access,
//! calls and lambdas.

use super::{FunctionScope, LowerError, LowerResult, Lowerer};
use crate::ast::{Ast, Param};
use crate::node::{BinaryOp, DeclaredType, NodeId, NodeKind, Number, VarRef};
use crate::tree::{FrameLayout, LambdaInfo};

impl Lowerer {
    pub(super) fn lower_literal(&mut self, ast: &Ast) -> LowerResult {
        let id = match ast {
            Ast::Bool(b) => self.push(NodeKind::Bool(*b), &[]),
            Ast::Int(n) => {
                let number = match i32::try_from(*n) {
                    Ok(small) => Number::Int(small),
                    Err(_) => Number::Long(*n),
                };
                self.push(NodeKind::Number(number), &[])
            }
            Ast::Double(d) => self.push(NodeKind::Number(Number::Double(*d)), &[]),
            Ast::Str(s) => {
                let name = self.intern(s);
                self.push(NodeKind::Str(name), &[])
            }
            Ast::Template(parts) => {
                let parts = self.lower_all(parts)?;
                self.push(NodeKind::Template, &parts)
            }
            Ast::Range(low, high) => {
                let low = self.lower_node(low)?;
                let high = self.lower_node(high)?;
                self.push(NodeKind::Range, &[low, high])
            }
            Ast::Array { items, immutable } => {
                let items = self.lower_all(items)?;
                self.push(
                    NodeKind::ArrayLiteral {
                        immutable: *immutable,
                    },
                    &items,
                )
            }
            Ast::Set { items, immutable } => {
                let items = self.lower_all(items)?;
                self.push(
                    NodeKind::SetLiteral {
                        immutable: *immutable,
                    },
                    &items,
                )
            }
            Ast::Map { entries, immutable } => {
                let mut children = Vec::with_capacity(entries.len());
                for (key, value) in entries {
                    let key = self.lower_node(key)?;
                    let value = self.lower_node(value)?;
                    children.push(self.push(NodeKind::MapEntry, &[key, value]));
                }
                self.push(
                    NodeKind::MapLiteral {
                        immutable: *immutable,
                    },
                    &children,
                )
            }
            _ => self.push(NodeKind::Null, &[]),
        };
        Ok(id)
    }

    pub(super) fn lower_operator(&mut self, ast: &Ast) -> LowerResult {
        let (kind, operands): (NodeKind, Vec<&Ast>) = match ast {
            Ast::Binary(op, l, r) => (NodeKind::Binary(*op), vec![l.as_ref(), r.as_ref()]),
            Ast::And(l, r) => (NodeKind::And, vec![l.as_ref(), r.as_ref()]),
            Ast::Or(l, r) => (NodeKind::Or, vec![l.as_ref(), r.as_ref()]),
            Ast::NullCoalesce(l, r) => (NodeKind::NullCoalesce, vec![l.as_ref(), r.as_ref()]),
            Ast::Elvis(l, r) => (NodeKind::Elvis, vec![l.as_ref(), r.as_ref()]),
            Ast::Ternary(c, t, e) => (NodeKind::Ternary, vec![c.as_ref(), t.as_ref(), e.as_ref()]),
            Ast::Unary(op, operand) => (NodeKind::Unary(*op), vec![operand.as_ref()]),
            other => return self.lower_literal(other),
        };
        let mut children = Vec::with_capacity(operands.len());
        for operand in operands {
            children.push(self.lower_node(operand)?);
        }
        Ok(self.push(kind, &children))
    }

    /// Lower an assignment target, rejecting anything that cannot be written.
    pub(super) fn lower_target(&mut self, target: &Ast) -> LowerResult {
        match target.unspanned() {
            Ast::Ident(_) | Ast::Property { .. } | Ast::Index { .. } => self.lower_node(target),
            _ => Err(LowerError::InvalidAssignTarget { span: self.span }),
        }
    }

    pub(super) fn lower_assign(
        &mut self,
        target: &Ast,
        value: &Ast,
        op: Option<BinaryOp>,
    ) -> LowerResult {
        let target_id = self.lower_target(target)?;
        let binding = match self.tree.kind(target_id) {
            NodeKind::Identifier(VarRef::Local(local)) if local.hops == 0 => {
                Some((self.functions.len() - 1, local.slot))
            }
            _ => None,
        };
        let value_id = self.lower_bound_value(value, binding)?;
        let kind = match op {
            Some(op) => NodeKind::CompoundAssign(op),
            None => NodeKind::Assign,
        };
        Ok(self.push(kind, &[target_id, value_id]))
    }

    /// Lower a value that is about to be stored into `binding`; a lambda
    /// that refers to that slot learns it is recursive.
    pub(super) fn lower_bound_value(
        &mut self,
        value: &Ast,
        binding: Option<(usize, u32)>,
    ) -> LowerResult {
        match value.unspanned() {
            Ast::Lambda {
                params,
                return_type,
                body,
            } => self.lower_lambda(params, *return_type, body, binding),
            _ => self.lower_node(value),
        }
    }

    pub(super) fn lower_access(&mut self, ast: &Ast) -> LowerResult {
        match ast {
            Ast::Property { object, name, safe } => {
                let object = self.lower_node(object)?;
                let name = self.intern(name);
                Ok(self.push(NodeKind::Property { name, safe: *safe }, &[object]))
            }
            Ast::Index {
                object,
                index,
                safe,
            } => {
                let object = self.lower_node(object)?;
                let index = self.lower_node(index)?;
                Ok(self.push(NodeKind::Index { safe: *safe }, &[object, index]))
            }
            Ast::Call { callee, args } => {
                let mut children = vec![self.lower_node(callee)?];
                children.extend(self.lower_all(args)?);
                Ok(self.push(NodeKind::FunctionCall, &children))
            }
            Ast::MethodCall {
                target,
                name,
                args,
                safe,
            } => {
                let mut children = vec![self.lower_node(target)?];
                children.extend(self.lower_all(args)?);
                let name = self.intern(name);
                Ok(self.push(NodeKind::MethodCall { name, safe: *safe }, &children))
            }
            Ast::NamespaceCall {
                namespace,
                name,
                args,
            } => {
                let children = self.lower_all(args)?;
                let namespace = self.intern(namespace);
                let name = self.intern(name);
                Ok(self.push(NodeKind::NamespaceCall { namespace, name }, &children))
            }
            Ast::New { class, args } => {
                let mut children = vec![self.lower_node(class)?];
                children.extend(self.lower_all(args)?);
                Ok(self.push(NodeKind::Constructor, &children))
            }
            other => self.lower_operator(other),
        }
    }

    /// Lower a lambda into its own frame layout.
    ///
    /// `binding` is the `(function depth, slot)` the lambda is being stored
    /// into, if any.
    pub(super) fn lower_lambda(
        &mut self,
        params: &[Param],
        return_type: Option<DeclaredType>,
        body: &Ast,
        binding: Option<(usize, u32)>,
    ) -> LowerResult {
        let frame = self.tree.push_frame(FrameLayout {
            slots: Vec::new(),
            params: super::param_count(params),
            return_type,
            generator: false,
        });
        self.functions.push(FunctionScope::new(frame));
        let body = self
            .declare_params(params)
            .and_then(|()| self.lower_node(body));
        let scope = self.functions.pop();
        let body: NodeId = body?;

        let mut self_slot = None;
        if let Some(scope) = scope {
            self.tree.frame_mut(frame).generator = scope.has_yield;
            self_slot = binding
                .filter(|b| scope.outer_refs.contains(b))
                .map(|(_, slot)| slot);
        }
        let lambda = self.tree.push_lambda(LambdaInfo { frame, self_slot });
        Ok(self.push(NodeKind::Lambda(lambda), &[body]))
    }
}
