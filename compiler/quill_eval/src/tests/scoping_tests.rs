use std::sync::Arc;

use pretty_assertions::assert_eq;
use quill_ir::ast::build::*;

use super::{interpreter, kind_of, run, run_with};
use crate::errors::{EvalErrorKind, VariableIssue};
use crate::{MapContext, Options, Value};

#[test]
fn let_is_invisible_after_its_block() {
    let context = Arc::new(MapContext::new().with_var("x", 9));
    let result = run_with(
        vec![block(vec![let_("x", Some(int(1)))]), ident("x")],
        Options::default(),
        &context,
    );
    assert_eq!(result.unwrap(), Value::Int(9));
}

#[test]
fn inner_let_shadows_outer() {
    let result = run(vec![
        let_("x", Some(int(1))),
        block(vec![let_("x", Some(int(2)))]),
        ident("x"),
    ]);
    assert_eq!(result.unwrap(), Value::Int(1));
}

#[test]
fn var_is_function_scoped_by_default() {
    let result = run(vec![block(vec![var("x", Some(int(1)))]), ident("x")]);
    assert_eq!(result.unwrap(), Value::Int(1));
}

#[test]
fn lexical_mode_scopes_var_to_its_block() {
    let context = Arc::new(MapContext::new().with_var("x", 5));
    let result = run_with(
        vec![block(vec![var("x", Some(int(1)))]), ident("x")],
        Options::default().with_lexical(true),
        &context,
    );
    assert_eq!(result.unwrap(), Value::Int(5));
}

#[test]
fn lexical_shade_rejects_reads_outside_the_block() {
    let context = Arc::new(MapContext::new().with_var("x", 5));
    let err = run_with(
        vec![block(vec![var("x", Some(int(1)))]), ident("x")],
        Options::default().with_lexical_shade(true),
        &context,
    );
    assert_eq!(
        kind_of(err),
        EvalErrorKind::Variable {
            name: "x".into(),
            issue: VariableIssue::Undefined
        }
    );
}

#[test]
fn var_may_be_redeclared() {
    let result = run(vec![
        var("x", Some(int(1))),
        var("x", Some(add(ident("x"), int(1)))),
        ident("x"),
    ]);
    assert_eq!(result.unwrap(), Value::Int(2));
}

#[test]
fn closure_sees_later_writes_to_captured_variable() {
    let result = run(vec![
        var("x", Some(int(1))),
        var("f", Some(lambda(&[], ident("x")))),
        assign(ident("x"), int(5)),
        fcall("f", vec![]),
    ]);
    assert_eq!(result.unwrap(), Value::Int(5));
}

#[test]
fn closure_writes_through_to_captured_variable() {
    let result = run(vec![
        var("c", Some(int(0))),
        var(
            "bump",
            Some(lambda(&[], assign(ident("c"), add(ident("c"), int(1))))),
        ),
        fcall("bump", vec![]),
        fcall("bump", vec![]),
        ident("c"),
    ]);
    assert_eq!(result.unwrap(), Value::Int(2));
}

#[test]
fn recursive_closure_refers_to_itself() {
    let body = block(vec![if_else(
        lt(ident("n"), int(2)),
        return_(Some(int(1))),
        return_(Some(mul(
            ident("n"),
            fcall("fact", vec![sub(ident("n"), int(1))]),
        ))),
    )]);
    let result = run(vec![
        var("fact", Some(lambda(&["n"], body))),
        fcall("fact", vec![int(5)]),
    ]);
    assert_eq!(result.unwrap(), Value::Int(120));
}

#[test]
fn missing_arguments_bind_null() {
    let result = run(vec![
        var("f", Some(lambda(&["a", "b"], ident("b")))),
        fcall("f", vec![int(1)]),
    ]);
    assert_eq!(result.unwrap(), Value::Null);
}

#[test]
fn closure_is_callable_from_host_code() {
    let value = run(vec![lambda(&["n"], mul(ident("n"), int(2)))]).unwrap();
    let Value::Closure(closure) = value else {
        panic!("expected a closure, got {value:?}");
    };
    assert_eq!(closure.arity(), 1);
    assert_eq!(closure.call(&[Value::Int(4)]).unwrap(), Value::Int(8));
}

#[test]
fn unbounded_recursion_hits_the_depth_limit() {
    let context = Arc::new(MapContext::new());
    let err = run_with(
        vec![
            var(
                "f",
                Some(lambda(&[], block(vec![return_(Some(fcall("f", vec![])))]))),
            ),
            fcall("f", vec![]),
        ],
        Options::default().with_max_depth(Some(16)),
        &context,
    );
    assert!(matches!(kind_of(err), EvalErrorKind::StackOverflow { .. }));
}

#[test]
fn recursion_limit_is_not_catchable() {
    let context = Arc::new(MapContext::new());
    let recurse = var(
        "f",
        Some(lambda(&[], block(vec![return_(Some(fcall("f", vec![])))]))),
    );
    let err = run_with(
        vec![
            recurse,
            try_catch(block(vec![fcall("f", vec![])]), "e", block(vec![int(0)])),
        ],
        Options::default().with_max_depth(Some(8)),
        &context,
    );
    assert!(matches!(kind_of(err), EvalErrorKind::StackOverflow { .. }));
}

#[test]
fn scopes_unwind_after_an_error() {
    let context = Arc::new(MapContext::new());
    let body = vec![block(vec![
        let_("a", Some(int(1))),
        block(vec![let_("b", Some(int(2))), throw(string("x"))]),
    ])];
    let mut interpreter = interpreter(&script(&[], body), Options::default(), &context);
    assert!(interpreter.execute(&[]).is_err());
    assert_eq!(interpreter.scopes.depth(), 1);
}

#[test]
fn script_parameters_bind_arguments() {
    let context = Arc::new(MapContext::new());
    let mut interpreter = interpreter(
        &script(&["a", "b"], vec![add(ident("a"), ident("b"))]),
        Options::default(),
        &context,
    );
    let result = interpreter.execute(&[Value::Int(2), Value::Int(3)]);
    assert_eq!(result.unwrap(), Value::Int(5));
}
