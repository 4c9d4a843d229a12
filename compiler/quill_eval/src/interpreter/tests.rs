#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Tests can panic")]

use std::sync::Arc;

use pretty_assertions::assert_eq;
use quill_ir::ast::build::*;
use quill_ir::{DeclKind, Declaration, SharedInterner, SharedTree};

use super::*;
use crate::{MapContext, Options};

fn tree(params: &[&str], body: Vec<quill_ir::ast::Ast>) -> SharedTree {
    quill_ir::lower(&script(params, body), &SharedInterner::new()).unwrap()
}

fn declaration(tree: &SharedTree, slot: u32, kind: DeclKind) -> Declaration {
    Declaration {
        slot,
        name: tree.root_frame().unwrap().slots[slot as usize],
        kind,
        ty: None,
    }
}

#[test]
fn builder_defaults_size_the_root_frame() {
    let tree = tree(&["a"], vec![var("b", None)]);
    let interpreter = InterpreterBuilder::new(tree).build();
    assert_eq!(interpreter.frame().size(), 2);
    assert_eq!(interpreter.scopes.depth(), 1);
    assert!(!interpreter.suspended);
}

#[test]
fn builder_setters_override_runtime_parts() {
    let runtime = Runtime::new(Arc::new(MapContext::new()), Options::default());
    let interpreter = InterpreterBuilder::new(tree(&[], vec![]))
        .runtime(runtime)
        .options(Options::strict())
        .build();
    assert!(interpreter.runtime().options.strict);
}

#[test]
fn interpreters_can_share_a_memo_table() {
    let memo = Arc::new(crate::dispatch::MemoTable::new());
    let tree = tree(&[], vec![method(string("ab"), "size", vec![])]);
    for _ in 0..2 {
        let mut interpreter = InterpreterBuilder::new(tree.clone()).memo(Arc::clone(&memo)).build();
        assert_eq!(interpreter.execute(&[]).unwrap(), Value::Int(2));
    }
    assert_eq!(memo.len(), 1);
}

#[test]
fn scoped_guard_pops_on_drop() {
    let mut interpreter = InterpreterBuilder::new(tree(&[], vec![])).build();
    {
        let mut scoped = interpreter.scoped();
        assert_eq!(scoped.scopes.depth(), 2);
        let _inner = scoped.scoped();
    }
    assert_eq!(interpreter.scopes.depth(), 1);
}

#[test]
fn with_block_scope_discards_its_declarations() {
    let tree = tree(&[], vec![let_("x", None)]);
    let decl = declaration(&tree, 0, DeclKind::Let);
    let mut interpreter = InterpreterBuilder::new(tree).build();
    let declared = interpreter.with_block_scope(|scoped| {
        assert!(scoped.define_variable(&decl));
        scoped.scopes.is_declared(0)
    });
    assert!(declared);
    assert!(!interpreter.scopes.is_declared(0));
}

#[test]
fn block_scoped_redeclaration_is_refused() {
    let tree = tree(&[], vec![let_("x", None)]);
    let decl = declaration(&tree, 0, DeclKind::Let);
    let mut interpreter = InterpreterBuilder::new(tree).build();
    assert!(interpreter.define_variable(&decl));
    assert!(!interpreter.define_variable(&decl));
}

#[test]
fn var_declarations_land_in_the_root_block() {
    let tree = tree(&[], vec![var("x", None)]);
    let decl = declaration(&tree, 0, DeclKind::Var);
    let mut interpreter = InterpreterBuilder::new(tree).build();
    {
        let mut scoped = interpreter.scoped();
        assert!(scoped.define_variable(&decl));
        assert!(scoped.define_variable(&decl));
    }
    assert!(interpreter.scopes.is_declared(0));
}

#[test]
fn execute_is_repeatable() {
    let tree = tree(&["n"], vec![var("x", Some(add(ident("n"), int(1)))), ident("x")]);
    let mut interpreter = InterpreterBuilder::new(tree).build();
    assert_eq!(interpreter.execute(&[Value::Int(1)]).unwrap(), Value::Int(2));
    assert_eq!(interpreter.execute(&[Value::Int(5)]).unwrap(), Value::Int(6));
}

#[test]
fn drive_generator_binds_arguments_and_leaves_the_parent_alone() {
    let tree = tree(&["n"], vec![yield_(Some(ident("n"))), yield_(Some(add(ident("n"), int(1))))]);
    let interpreter = InterpreterBuilder::new(tree).build();
    let generator = interpreter.drive_generator(&[Value::Int(3)]);
    let values: Vec<Value> = generator.map(Result::unwrap).collect();
    assert_eq!(values, vec![Value::Int(3), Value::Int(4)]);
    assert_eq!(interpreter.frame().get(0), None);
}

#[test]
fn resuming_from_inside_the_body_is_refused() {
    let tree = tree(
        &[],
        vec![var("g", Some(lambda(&[], block(vec![
            yield_(Some(method(ident("it"), "next", vec![]))),
        ])))),
        assign(ident("it"), fcall("g", vec![])),
        method(ident("it"), "next", vec![])],
    );
    let context = Arc::new(MapContext::new());
    let mut interpreter = InterpreterBuilder::new(tree).context(context).build();
    let err = interpreter.execute(&[]).unwrap_err();
    assert_eq!(err.message(), "generator is already running");
}

#[test]
fn errors_carry_a_backtrace_of_closure_calls() {
    let tree = tree(
        &[],
        vec![
            var("inner", Some(lambda(&[], block(vec![throw(string("deep"))])))),
            var("outer", Some(lambda(&[], fcall("inner", vec![])))),
            fcall("outer", vec![]),
        ],
    );
    let err = InterpreterBuilder::new(tree).build().execute(&[]).unwrap_err();
    let backtrace = err.backtrace.expect("backtrace attached");
    assert_eq!(backtrace.len(), 2);
    assert!(err.span.is_some());
}
