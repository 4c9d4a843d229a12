use std::sync::Arc;

use pretty_assertions::assert_eq;
use quill_ir::ast::build::*;
use quill_ir::{DeclKind, TypeKind};

use super::{calls, counted, kind_of, run, run_with};
use crate::errors::{EvalErrorKind, VariableIssue};
use crate::{Context, EvalError, EvalResult, MapContext, Options, Value};

#[test]
fn for_loop_sums_its_counter() {
    let result = run(vec![
        var("s", Some(int(0))),
        for_loop(
            Some(var("i", Some(int(1)))),
            Some(lt(ident("i"), int(5))),
            Some(assign(ident("i"), add(ident("i"), int(1)))),
            block(vec![assign(ident("s"), add(ident("s"), ident("i")))]),
        ),
        ident("s"),
    ]);
    assert_eq!(result.unwrap(), Value::Int(10));
}

#[test]
fn labeled_continue_and_break_target_the_outer_loop() {
    let inner = for_loop(
        Some(var("j", Some(int(0)))),
        Some(lt(ident("j"), int(3))),
        Some(assign(ident("j"), add(ident("j"), int(1)))),
        block(vec![
            if_(eq(ident("j"), int(1)), continue_(Some("outer"))),
            if_(eq(ident("i"), int(2)), break_(Some("outer"))),
            assign(ident("s"), add(ident("s"), int(1))),
        ]),
    );
    let outer = labeled(
        "outer",
        for_loop(
            Some(var("i", Some(int(0)))),
            Some(lt(ident("i"), int(3))),
            Some(assign(ident("i"), add(ident("i"), int(1)))),
            block(vec![inner]),
        ),
    );
    let result = run(vec![var("s", Some(int(0))), outer, ident("s")]);
    assert_eq!(result.unwrap(), Value::Int(2));
}

#[test]
fn while_loop_stops_on_unlabeled_break() {
    let result = run(vec![
        var("n", Some(int(0))),
        while_(
            boolean(true),
            block(vec![
                assign(ident("n"), add(ident("n"), int(1))),
                if_(eq(ident("n"), int(4)), break_(None)),
            ]),
        ),
        ident("n"),
    ]);
    assert_eq!(result.unwrap(), Value::Int(4));
}

#[test]
fn do_while_runs_its_body_at_least_once() {
    let result = run(vec![
        var("n", Some(int(0))),
        do_while(
            block(vec![assign(ident("n"), add(ident("n"), int(10)))]),
            boolean(false),
        ),
        ident("n"),
    ]);
    assert_eq!(result.unwrap(), Value::Int(10));

    let result = run(vec![
        var("n", Some(int(0))),
        do_while(
            block(vec![assign(ident("n"), add(ident("n"), int(1)))]),
            lt(ident("n"), int(3)),
        ),
        ident("n"),
    ]);
    assert_eq!(result.unwrap(), Value::Int(3));
}

#[test]
fn foreach_over_list_and_range() {
    let sum = |iterable: quill_ir::ast::Ast| {
        run(vec![
            var("s", Some(int(0))),
            foreach(
                DeclKind::Let,
                "x",
                iterable,
                block(vec![assign(ident("s"), add(ident("s"), ident("x")))]),
            ),
            ident("s"),
        ])
        .unwrap()
    };
    assert_eq!(sum(array(vec![int(1), int(2), int(3)])), Value::Int(6));
    // Range elements are longs; the sum widens with them.
    assert_eq!(sum(range(int(1), int(4))), Value::Long(10));
}

#[test]
fn foreach_over_null_runs_no_iterations() {
    let result = run(vec![
        var("s", Some(int(7))),
        foreach(DeclKind::Let, "x", null(), block(vec![assign(ident("s"), int(0))])),
        ident("s"),
    ]);
    assert_eq!(result.unwrap(), Value::Int(7));
}

#[test]
fn remove_drops_the_current_element() {
    let result = run(vec![
        var("xs", Some(array(vec![int(1), int(2), int(3)]))),
        foreach(
            DeclKind::Let,
            "x",
            ident("xs"),
            block(vec![if_(eq(ident("x"), int(2)), remove(None))]),
        ),
        ident("xs"),
    ]);
    assert_eq!(result.unwrap(), Value::list(vec![Value::Int(1), Value::Int(3)]));
}

fn switch_on(k: i64) -> Value {
    let append = |s: &str| assign(ident("out"), add(ident("out"), string(s)));
    run(vec![
        var("out", Some(string(""))),
        switch(
            int(k),
            vec![
                case(int(1), vec![append("a")]),
                case(int(2), vec![append("b")]),
                case(int(3), vec![append("c"), break_(None)]),
                default_case(vec![append("d")]),
            ],
        ),
        ident("out"),
    ])
    .unwrap()
}

#[test]
fn switch_falls_through_until_break() {
    assert_eq!(switch_on(2), Value::from("bc"));
    assert_eq!(switch_on(1), Value::from("abc"));
}

#[test]
fn switch_without_match_takes_default() {
    assert_eq!(switch_on(9), Value::from("d"));
}

#[test]
fn catch_binds_the_thrown_value() {
    let result = run(vec![try_catch(
        block(vec![throw(string("boom"))]),
        "e",
        block(vec![add(ident("e"), string("!"))]),
    )]);
    assert_eq!(result.unwrap(), Value::from("boom!"));
}

#[test]
fn catch_binds_the_message_of_an_engine_error() {
    let result = run(vec![try_catch(
        block(vec![div(int(1), int(0))]),
        "e",
        block(vec![ident("e")]),
    )]);
    assert_eq!(result.unwrap(), Value::from("division by zero"));
}

#[test]
fn finally_runs_once_after_return() {
    let context = Arc::new(MapContext::new());
    let (tick, ticks) = counted("tick");
    context.define_function(tick);
    let result = run_with(
        vec![
            try_finally(
                block(vec![return_(Some(int(1)))]),
                block(vec![fcall("tick", vec![])]),
            ),
            int(2),
        ],
        Options::default(),
        &context,
    );
    assert_eq!(result.unwrap(), Value::Int(1));
    assert_eq!(calls(&ticks), 1);
}

#[test]
fn uncaught_throw_surfaces_as_error() {
    let err = run(vec![throw(int(3))]).unwrap_err();
    assert_eq!(err.thrown, Some(Value::Int(3)));
    assert!(matches!(err.kind, EvalErrorKind::Thrown { .. }));
}

#[test]
fn assertions_are_checked_only_when_enabled() {
    let body = || vec![assert_(boolean(false), None)];
    assert_eq!(run(body()).unwrap(), Value::Null);

    let context = Arc::new(MapContext::new());
    let err = run_with(body(), Options::default().with_assertions(true), &context);
    assert_eq!(
        kind_of(err),
        EvalErrorKind::Assertion {
            message: "assertion failed".into()
        }
    );

    let err = run_with(
        vec![assert_(lt(int(2), int(1)), Some(string("order")))],
        Options::default().with_assertions(true),
        &context,
    );
    assert_eq!(
        kind_of(err),
        EvalErrorKind::Assertion {
            message: "order".into()
        }
    );
}

/// Runs every statement annotated `@twice` two times.
struct Twice(MapContext);

impl Context for Twice {
    fn get(&self, name: &str) -> Option<Value> {
        self.0.get(name)
    }

    fn set(&self, name: &str, value: Value) -> Result<(), EvalError> {
        self.0.set(name, value)
    }

    fn process_annotation(
        &self,
        name: &str,
        _args: &[Value],
        statement: &mut dyn FnMut() -> EvalResult,
    ) -> EvalResult {
        if name == "twice" {
            statement()?;
        }
        statement()
    }
}

#[test]
fn annotation_hook_controls_the_statement() {
    let tree = super::lower_script(&script(
        &[],
        vec![
            var("n", Some(int(0))),
            annotated("twice", vec![], assign(ident("n"), add(ident("n"), int(1)))),
            annotated("once", vec![int(1)], assign(ident("n"), add(ident("n"), int(1)))),
            ident("n"),
        ],
    ));
    let mut interpreter = crate::InterpreterBuilder::new(tree)
        .context(Arc::new(Twice(MapContext::new())))
        .build();
    assert_eq!(interpreter.execute(&[]).unwrap(), Value::Int(3));
}

#[test]
fn typed_declaration_coerces_its_initializer() {
    let result = run(vec![
        typed_var(DeclKind::Var, ty(TypeKind::Int, false), "n", Some(string("42"))),
        ident("n"),
    ]);
    assert_eq!(result.unwrap(), Value::Int(42));
}

#[test]
fn required_variable_rejects_null() {
    let err = run(vec![typed_var(
        DeclKind::Var,
        ty(TypeKind::Int, false),
        "n",
        Some(null()),
    )]);
    assert!(matches!(
        kind_of(err),
        EvalErrorKind::Variable {
            issue: VariableIssue::Null,
            ..
        }
    ));

    let err = run(vec![
        typed_var(DeclKind::Var, ty(TypeKind::Int, false), "n", Some(int(1))),
        assign(ident("n"), null()),
    ]);
    assert!(matches!(
        kind_of(err),
        EvalErrorKind::Variable {
            issue: VariableIssue::Null,
            ..
        }
    ));
}

#[test]
fn nullable_typed_variable_accepts_null() {
    let result = run(vec![
        typed_var(DeclKind::Var, ty(TypeKind::Int, true), "n", Some(int(1))),
        assign(ident("n"), null()),
        ident("n"),
    ]);
    assert_eq!(result.unwrap(), Value::Null);
}

#[test]
fn const_cannot_be_reassigned() {
    let err = run(vec![const_("x", int(1)), assign(ident("x"), int(2))]);
    assert_eq!(
        kind_of(err),
        EvalErrorKind::Variable {
            name: "x".into(),
            issue: VariableIssue::Final
        }
    );
}

#[test]
fn let_redeclared_in_one_block_is_an_error() {
    let err = run(vec![let_("x", Some(int(1))), let_("x", Some(int(2)))]);
    assert!(matches!(
        kind_of(err),
        EvalErrorKind::Variable {
            issue: VariableIssue::Redefined,
            ..
        }
    ));
}

#[test]
fn script_result_is_checked_against_its_return_type() {
    let declared = quill_ir::ast::Script {
        return_type: Some(ty(TypeKind::Int, false)),
        ..script(&[], vec![string("abc")])
    };
    let mut interpreter = crate::InterpreterBuilder::new(super::lower_script(&declared)).build();
    assert!(matches!(
        interpreter.execute(&[]).map_err(|e| e.kind),
        Err(EvalErrorKind::ReturnType { .. })
    ));

    let declared = quill_ir::ast::Script {
        return_type: Some(ty(TypeKind::Long, false)),
        ..script(&["n"], vec![ident("n")])
    };
    let mut interpreter = crate::InterpreterBuilder::new(super::lower_script(&declared)).build();
    assert_eq!(interpreter.execute(&[Value::Int(5)]).unwrap(), Value::Long(5));
}

#[test]
fn division_by_zero_is_raised_even_when_lenient() {
    let context = Arc::new(MapContext::new());
    let err = run_with(vec![div(int(1), int(0))], Options::lenient(), &context);
    assert!(matches!(kind_of(err), EvalErrorKind::Arithmetic { .. }));
}

#[test]
fn signal_escaping_the_script_is_an_error() {
    assert_eq!(
        kind_of(run(vec![break_(None)])),
        EvalErrorKind::Signal { signal: "break" }
    );
}

#[test]
fn return_ends_the_script_early() {
    let result = run(vec![return_(Some(int(1))), int(2)]);
    assert_eq!(result.unwrap(), Value::Int(1));
}

#[test]
fn cancelled_script_yields_null_unless_cancellable() {
    let body = || {
        vec![while_(boolean(true), block(vec![]))]
    };
    let options = Options::default();
    options.cancel.cancel();
    let context = Arc::new(MapContext::new());
    assert_eq!(run_with(body(), options.clone(), &context).unwrap(), Value::Null);
    assert_eq!(
        kind_of(run_with(body(), options.with_cancellable(true), &context)),
        EvalErrorKind::Cancelled
    );
}
