//! Statement lowering: blocks, declarations, loops, switch and try.

use super::{LowerError, LowerResult, Lowerer};
use crate::ast::{Ast, CatchClause, SwitchCase};
use crate::node::{DeclKind, DeclaredType, Declaration, NodeId, NodeKind};

impl Lowerer {
    pub(super) fn lower_block(&mut self, stmts: &[Ast]) -> LowerResult {
        self.in_block(|this| {
            let children = this.lower_all(stmts)?;
            Ok(this.push(NodeKind::Block, &children))
        })
    }

    /// The name is bound before its initializer is lowered so a lambda
    /// initializer can refer to itself.
    pub(super) fn lower_declare(
        &mut self,
        kind: DeclKind,
        name: &str,
        ty: Option<DeclaredType>,
        init: Option<&Ast>,
    ) -> LowerResult {
        if kind == DeclKind::Const && init.is_none() {
            return Err(LowerError::ConstWithoutInit {
                name: name.to_owned(),
                span: self.span,
            });
        }
        let interned = self.intern(name);
        let slot = self.declare(interned, kind);
        let depth = self.functions.len() - 1;
        let init = match init {
            Some(init) => self.lower_bound_value(init, Some((depth, slot)))?,
            None => NodeId::INVALID,
        };
        let decl = Declaration {
            slot,
            name: interned,
            kind,
            ty,
        };
        Ok(self.push(NodeKind::Declare(decl), &[init]))
    }

    pub(super) fn lower_for(
        &mut self,
        label: Option<&String>,
        init: Option<&Ast>,
        cond: Option<&Ast>,
        step: Option<&Ast>,
        body: &Ast,
    ) -> LowerResult {
        let label = self.label(label);
        self.in_block(|this| {
            let init = this.lower_opt(init)?;
            let cond = this.lower_opt(cond)?;
            let step = this.lower_opt(step)?;
            let body = this.lower_node(body)?;
            Ok(this.push(NodeKind::For { label }, &[init, cond, step, body]))
        })
    }

    pub(super) fn lower_foreach(
        &mut self,
        label: Option<&String>,
        kind: DeclKind,
        var: &str,
        iterable: &Ast,
        body: &Ast,
    ) -> LowerResult {
        let label = self.label(label);
        // The iterable sees the enclosing scope, not the loop variable.
        let iterable = self.lower_node(iterable)?;
        self.in_block(|this| {
            let name = this.intern(var);
            let slot = this.declare(name, kind);
            let var = Declaration {
                slot,
                name,
                kind,
                ty: None,
            };
            let body = this.lower_node(body)?;
            Ok(this.push(NodeKind::Foreach { label, var }, &[iterable, body]))
        })
    }

    pub(super) fn lower_switch(&mut self, discriminant: &Ast, cases: &[SwitchCase]) -> LowerResult {
        let discriminant = self.lower_node(discriminant)?;
        self.in_block(|this| {
            let mut children = Vec::with_capacity(cases.len() + 1);
            children.push(discriminant);
            for case in cases {
                let id = match &case.value {
                    Some(value) => {
                        let mut case_children = vec![this.lower_node(value)?];
                        case_children.extend(this.lower_all(&case.body)?);
                        this.push(NodeKind::Case, &case_children)
                    }
                    None => {
                        let stmts = this.lower_all(&case.body)?;
                        this.push(NodeKind::DefaultCase, &stmts)
                    }
                };
                children.push(id);
            }
            Ok(this.push(NodeKind::Switch, &children))
        })
    }

    pub(super) fn lower_try(
        &mut self,
        body: &Ast,
        catch: Option<&CatchClause>,
        finally: Option<&Ast>,
    ) -> LowerResult {
        let body = self.lower_node(body)?;
        let (catch_var, handler) = match catch {
            Some(clause) => self.in_block(|this| {
                let name = this.intern(&clause.name);
                let slot = this.declare(name, clause.kind);
                let decl = Declaration {
                    slot,
                    name,
                    kind: clause.kind,
                    ty: None,
                };
                let handler = this.lower_node(&clause.body)?;
                Ok((Some(decl), handler))
            })?,
            None => (None, NodeId::INVALID),
        };
        let finally = self.lower_opt(finally)?;
        Ok(self.push(NodeKind::Try { catch_var }, &[body, handler, finally]))
    }
}
