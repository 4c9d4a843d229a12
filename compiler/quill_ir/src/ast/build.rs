//! Constructor helpers for [`Ast`] nodes.
//!
//! ```
//! use quill_ir::ast::build::*;
//!
//! // var x = 0; for (var i = 0; i < 3; ++i) { x += i }
//! let body = vec![
//!     var("x", Some(int(0))),
//!     for_loop(
//!         Some(var("i", Some(int(0)))),
//!         Some(lt(ident("i"), int(3))),
//!         Some(pre_inc(ident("i"))),
//!         block(vec![add_assign(ident("x"), ident("i"))]),
//!     ),
//! ];
//! let _script = script(&[], body);
//! ```

use super::{Ast, CatchClause, Param, Script, SwitchCase};
use crate::node::{BinaryOp, DeclKind, DeclaredType, IncDecOp, TypeKind, UnaryOp};

fn boxed(ast: Ast) -> Box<Ast> {
    Box::new(ast)
}

/// A script with untyped parameters.
pub fn script(params: &[&str], body: Vec<Ast>) -> Script {
    Script {
        params: params.iter().map(|p| param(p)).collect(),
        return_type: None,
        body,
    }
}

/// An untyped parameter.
pub fn param(name: &str) -> Param {
    Param {
        name: name.to_owned(),
    }
}

/// A declared type.
pub fn ty(kind: TypeKind, nullable: bool) -> DeclaredType {
    DeclaredType { kind, nullable }
}

// Literals

pub fn null() -> Ast {
    Ast::Null
}

pub fn boolean(b: bool) -> Ast {
    Ast::Bool(b)
}

pub fn int(n: i64) -> Ast {
    Ast::Int(n)
}

pub fn double(d: f64) -> Ast {
    Ast::Double(d)
}

pub fn string(s: &str) -> Ast {
    Ast::Str(s.to_owned())
}

pub fn template(parts: Vec<Ast>) -> Ast {
    Ast::Template(parts)
}

pub fn range(low: Ast, high: Ast) -> Ast {
    Ast::Range(boxed(low), boxed(high))
}

pub fn array(items: Vec<Ast>) -> Ast {
    Ast::Array {
        items,
        immutable: false,
    }
}

pub fn set(items: Vec<Ast>) -> Ast {
    Ast::Set {
        items,
        immutable: false,
    }
}

pub fn map(entries: Vec<(Ast, Ast)>) -> Ast {
    Ast::Map {
        entries,
        immutable: false,
    }
}

pub fn ident(name: &str) -> Ast {
    Ast::Ident(name.to_owned())
}

// Operators

pub fn binary(op: BinaryOp, left: Ast, right: Ast) -> Ast {
    Ast::Binary(op, boxed(left), boxed(right))
}

pub fn add(left: Ast, right: Ast) -> Ast {
    binary(BinaryOp::Add, left, right)
}

pub fn sub(left: Ast, right: Ast) -> Ast {
    binary(BinaryOp::Sub, left, right)
}

pub fn mul(left: Ast, right: Ast) -> Ast {
    binary(BinaryOp::Mul, left, right)
}

pub fn div(left: Ast, right: Ast) -> Ast {
    binary(BinaryOp::Div, left, right)
}

pub fn eq(left: Ast, right: Ast) -> Ast {
    binary(BinaryOp::Eq, left, right)
}

pub fn lt(left: Ast, right: Ast) -> Ast {
    binary(BinaryOp::Lt, left, right)
}

pub fn gt(left: Ast, right: Ast) -> Ast {
    binary(BinaryOp::Gt, left, right)
}

pub fn and(left: Ast, right: Ast) -> Ast {
    Ast::And(boxed(left), boxed(right))
}

pub fn or(left: Ast, right: Ast) -> Ast {
    Ast::Or(boxed(left), boxed(right))
}

pub fn coalesce(left: Ast, right: Ast) -> Ast {
    Ast::NullCoalesce(boxed(left), boxed(right))
}

pub fn elvis(left: Ast, right: Ast) -> Ast {
    Ast::Elvis(boxed(left), boxed(right))
}

pub fn ternary(cond: Ast, then_value: Ast, else_value: Ast) -> Ast {
    Ast::Ternary(boxed(cond), boxed(then_value), boxed(else_value))
}

pub fn unary(op: UnaryOp, operand: Ast) -> Ast {
    Ast::Unary(op, boxed(operand))
}

pub fn not(operand: Ast) -> Ast {
    unary(UnaryOp::Not, operand)
}

pub fn neg(operand: Ast) -> Ast {
    unary(UnaryOp::Neg, operand)
}

pub fn pre_inc(target: Ast) -> Ast {
    Ast::IncDec {
        op: IncDecOp::Increment,
        prefix: true,
        target: boxed(target),
    }
}

pub fn post_inc(target: Ast) -> Ast {
    Ast::IncDec {
        op: IncDecOp::Increment,
        prefix: false,
        target: boxed(target),
    }
}

pub fn pre_dec(target: Ast) -> Ast {
    Ast::IncDec {
        op: IncDecOp::Decrement,
        prefix: true,
        target: boxed(target),
    }
}

pub fn assign(target: Ast, value: Ast) -> Ast {
    Ast::Assign(boxed(target), boxed(value))
}

pub fn compound_assign(op: BinaryOp, target: Ast, value: Ast) -> Ast {
    Ast::CompoundAssign(op, boxed(target), boxed(value))
}

pub fn add_assign(target: Ast, value: Ast) -> Ast {
    compound_assign(BinaryOp::Add, target, value)
}

// Access

pub fn prop(object: Ast, name: &str) -> Ast {
    Ast::Property {
        object: boxed(object),
        name: name.to_owned(),
        safe: false,
    }
}

pub fn safe_prop(object: Ast, name: &str) -> Ast {
    Ast::Property {
        object: boxed(object),
        name: name.to_owned(),
        safe: true,
    }
}

pub fn index(object: Ast, key: Ast) -> Ast {
    Ast::Index {
        object: boxed(object),
        index: boxed(key),
        safe: false,
    }
}

// Calls

pub fn call(callee: Ast, args: Vec<Ast>) -> Ast {
    Ast::Call {
        callee: boxed(callee),
        args,
    }
}

/// A call by bare name, `name(args)`.
pub fn fcall(name: &str, args: Vec<Ast>) -> Ast {
    call(ident(name), args)
}

pub fn method(target: Ast, name: &str, args: Vec<Ast>) -> Ast {
    Ast::MethodCall {
        target: boxed(target),
        name: name.to_owned(),
        args,
        safe: false,
    }
}

pub fn ns_call(namespace: &str, name: &str, args: Vec<Ast>) -> Ast {
    Ast::NamespaceCall {
        namespace: namespace.to_owned(),
        name: name.to_owned(),
        args,
    }
}

pub fn new_instance(class: Ast, args: Vec<Ast>) -> Ast {
    Ast::New {
        class: boxed(class),
        args,
    }
}

pub fn lambda(params: &[&str], body: Ast) -> Ast {
    Ast::Lambda {
        params: params.iter().map(|p| param(p)).collect(),
        return_type: None,
        body: boxed(body),
    }
}

// Statements

pub fn block(stmts: Vec<Ast>) -> Ast {
    Ast::Block(stmts)
}

fn declare(kind: DeclKind, name: &str, init: Option<Ast>) -> Ast {
    Ast::Declare {
        kind,
        name: name.to_owned(),
        ty: None,
        init: init.map(boxed),
    }
}

pub fn var(name: &str, init: Option<Ast>) -> Ast {
    declare(DeclKind::Var, name, init)
}

pub fn let_(name: &str, init: Option<Ast>) -> Ast {
    declare(DeclKind::Let, name, init)
}

pub fn const_(name: &str, init: Ast) -> Ast {
    declare(DeclKind::Const, name, Some(init))
}

/// A typed declaration, `var int x = init`.
pub fn typed_var(kind: DeclKind, declared: DeclaredType, name: &str, init: Option<Ast>) -> Ast {
    Ast::Declare {
        kind,
        name: name.to_owned(),
        ty: Some(declared),
        init: init.map(boxed),
    }
}

pub fn if_(cond: Ast, then_branch: Ast) -> Ast {
    Ast::If {
        cond: boxed(cond),
        then_branch: boxed(then_branch),
        else_branch: None,
    }
}

pub fn if_else(cond: Ast, then_branch: Ast, else_branch: Ast) -> Ast {
    Ast::If {
        cond: boxed(cond),
        then_branch: boxed(then_branch),
        else_branch: Some(boxed(else_branch)),
    }
}

pub fn while_(cond: Ast, body: Ast) -> Ast {
    Ast::While {
        label: None,
        cond: boxed(cond),
        body: boxed(body),
    }
}

pub fn do_while(body: Ast, cond: Ast) -> Ast {
    Ast::DoWhile {
        label: None,
        body: boxed(body),
        cond: boxed(cond),
    }
}

pub fn for_loop(init: Option<Ast>, cond: Option<Ast>, step: Option<Ast>, body: Ast) -> Ast {
    Ast::For {
        label: None,
        init: init.map(boxed),
        cond: cond.map(boxed),
        step: step.map(boxed),
        body: boxed(body),
    }
}

pub fn foreach(kind: DeclKind, var: &str, iterable: Ast, body: Ast) -> Ast {
    Ast::Foreach {
        label: None,
        kind,
        var: var.to_owned(),
        iterable: boxed(iterable),
        body: boxed(body),
    }
}

/// Attach a label to a loop node; other nodes are returned unchanged.
pub fn labeled(name: &str, loop_node: Ast) -> Ast {
    let label = Some(name.to_owned());
    match loop_node {
        Ast::While { cond, body, .. } => Ast::While { label, cond, body },
        Ast::DoWhile { body, cond, .. } => Ast::DoWhile { label, body, cond },
        Ast::For {
            init,
            cond,
            step,
            body,
            ..
        } => Ast::For {
            label,
            init,
            cond,
            step,
            body,
        },
        Ast::Foreach {
            kind,
            var,
            iterable,
            body,
            ..
        } => Ast::Foreach {
            label,
            kind,
            var,
            iterable,
            body,
        },
        other => other,
    }
}

pub fn switch(discriminant: Ast, cases: Vec<SwitchCase>) -> Ast {
    Ast::Switch {
        discriminant: boxed(discriminant),
        cases,
    }
}

pub fn case(value: Ast, body: Vec<Ast>) -> SwitchCase {
    SwitchCase {
        value: Some(value),
        body,
    }
}

pub fn default_case(body: Vec<Ast>) -> SwitchCase {
    SwitchCase { value: None, body }
}

pub fn break_(label: Option<&str>) -> Ast {
    Ast::Break(label.map(str::to_owned))
}

pub fn continue_(label: Option<&str>) -> Ast {
    Ast::Continue(label.map(str::to_owned))
}

pub fn remove(label: Option<&str>) -> Ast {
    Ast::Remove(label.map(str::to_owned))
}

pub fn return_(value: Option<Ast>) -> Ast {
    Ast::Return(value.map(boxed))
}

pub fn yield_(value: Option<Ast>) -> Ast {
    Ast::Yield(value.map(boxed))
}

pub fn throw(value: Ast) -> Ast {
    Ast::Throw(boxed(value))
}

pub fn try_catch(body: Ast, catch_var: &str, handler: Ast) -> Ast {
    Ast::Try {
        body: boxed(body),
        catch: Some(CatchClause {
            kind: DeclKind::Let,
            name: catch_var.to_owned(),
            body: boxed(handler),
        }),
        finally: None,
    }
}

pub fn try_finally(body: Ast, finally: Ast) -> Ast {
    Ast::Try {
        body: boxed(body),
        catch: None,
        finally: Some(boxed(finally)),
    }
}

pub fn annotated(name: &str, args: Vec<Ast>, statement: Ast) -> Ast {
    Ast::Annotated {
        name: name.to_owned(),
        args,
        statement: boxed(statement),
    }
}

pub fn assert_(cond: Ast, message: Option<Ast>) -> Ast {
    Ast::Assert {
        cond: boxed(cond),
        message: message.map(boxed),
    }
}
