//! Property tests: a resumed generator produces exactly what an eager run
//! would, with the same side effects, and one call site stays correct
//! across changing receiver kinds.

#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    reason = "Proptest inputs are small"
)]

use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use proptest::prelude::*;
use quill_ir::ast::build::*;
use quill_ir::ast::Ast;
use quill_ir::DeclKind;

use super::{calls, counted, drain, generate, run_with};
use crate::{MapContext, Options, Value};

/// Nested `for`/`while` loops with a `continue`, yielding `i * 10 + j`.
fn nested_loops(emit: fn(Ast) -> Ast) -> Vec<Ast> {
    let inner = while_(
        lt(ident("j"), ident("m")),
        block(vec![
            assign(ident("j"), add(ident("j"), int(1))),
            if_(eq(ident("j"), ident("skip")), continue_(None)),
            emit(add(mul(ident("i"), int(10)), ident("j"))),
        ]),
    );
    vec![for_loop(
        Some(var("i", Some(int(0)))),
        Some(lt(ident("i"), ident("n"))),
        Some(assign(ident("i"), add(ident("i"), int(1)))),
        block(vec![var("j", Some(int(0))), inner]),
    )]
}

fn loop_context(n: i32, m: i32, skip: i32) -> Arc<MapContext> {
    Arc::new(
        MapContext::new()
            .with_var("n", n)
            .with_var("m", m)
            .with_var("skip", skip)
            .with_var("out", Value::list(Vec::new())),
    )
}

fn expected(n: i32, m: i32, skip: i32) -> Vec<Value> {
    let mut values = Vec::new();
    for i in 0..n {
        for j in 1..=m {
            if j != skip {
                values.push(Value::Int(i * 10 + j));
            }
        }
    }
    values
}

/// `foreach` over `xs` with a `switch` that falls through, an `if`/`else`
/// in its default arm and a `finally` that ticks once per element.
fn statement_mix(emit: fn(Ast) -> Ast) -> Vec<Ast> {
    let x = || ident("x");
    let tick = |arg: Ast| fcall("tick", vec![arg]);
    let cases = vec![
        case(int(0), vec![emit(add(x(), int(100)))]),
        case(int(1), vec![emit(tick(mul(x(), int(10)))), break_(None)]),
        case(int(2), vec![emit(x())]),
        default_case(vec![if_else(
            gt(x(), ident("t")),
            emit(add(x(), int(200))),
            tick(x()),
        )]),
    ];
    vec![foreach(
        DeclKind::Let,
        "x",
        ident("xs"),
        block(vec![try_finally(
            block(vec![switch(x(), cases)]),
            block(vec![tick(int(-1))]),
        )]),
    )]
}

fn mix_context(xs: &[i32], t: i32) -> (Arc<MapContext>, Arc<AtomicUsize>) {
    let (tick, ticks) = counted("tick");
    let context = MapContext::new()
        .with_var("xs", Value::list(xs.iter().copied().map(Value::Int).collect()))
        .with_var("t", t)
        .with_var("out", Value::list(Vec::new()));
    context.define_function(tick);
    (Arc::new(context), ticks)
}

/// Values emitted by [`statement_mix`] and the number of ticks it makes.
fn expected_mix(xs: &[i32], t: i32) -> (Vec<Value>, usize) {
    let mut values = Vec::new();
    let mut ticks = 0;
    for &x in xs {
        let reaches_default = match x {
            0 => {
                values.extend([Value::Int(100), Value::Int(0)]);
                ticks += 1;
                false
            }
            1 => {
                values.push(Value::Int(10));
                ticks += 1;
                false
            }
            2 => {
                values.push(Value::Int(2));
                true
            }
            _ => true,
        };
        if reaches_default {
            if x > t {
                values.push(Value::Int(x + 200));
            } else {
                ticks += 1;
            }
        }
        ticks += 1;
    }
    (values, ticks)
}

fn sized(len: usize, as_list: bool) -> Value {
    if as_list {
        Value::list((0..len).map(|i| Value::Int(i as i32)).collect())
    } else {
        Value::string("x".repeat(len))
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn resumed_generator_matches_eager_run(n in 0i32..4, m in 0i32..4, skip in 0i32..5) {
        let context = loop_context(n, m, skip);
        let generator = generate(nested_loops(|v| yield_(Some(v))), &context);
        prop_assert_eq!(drain(&generator), expected(n, m, skip));

        let mut eager = nested_loops(|v| method(ident("out"), "add", vec![v]));
        eager.push(ident("out"));
        let collected = run_with(eager, Options::default(), &context).unwrap();
        prop_assert_eq!(collected, Value::list(expected(n, m, skip)));
    }

    #[test]
    fn resumed_generator_matches_eager_run_across_statements(
        xs in prop::collection::vec(0i32..5, 0..10),
        t in 0i32..5,
    ) {
        let (values, ticks) = expected_mix(&xs, t);

        let (context, generated_ticks) = mix_context(&xs, t);
        let generator = generate(statement_mix(|v| yield_(Some(v))), &context);
        prop_assert_eq!(drain(&generator), values.clone());
        prop_assert_eq!(calls(&generated_ticks), ticks);

        let (context, eager_ticks) = mix_context(&xs, t);
        let mut eager = statement_mix(|v| method(ident("out"), "add", vec![v]));
        eager.push(ident("out"));
        let collected = run_with(eager, Options::default(), &context).unwrap();
        prop_assert_eq!(collected, Value::list(values));
        prop_assert_eq!(calls(&eager_ticks), ticks);
    }

    #[test]
    fn call_site_memo_never_serves_a_stale_target(
        items in prop::collection::vec((0usize..6, any::<bool>()), 0..12)
    ) {
        let values: Vec<Value> = items.iter().map(|&(len, as_list)| sized(len, as_list)).collect();
        let total: usize = items.iter().map(|&(len, _)| len).sum();
        let context = Arc::new(MapContext::new().with_var("items", Value::list(values)));
        let result = run_with(
            vec![
                var("n", Some(int(0))),
                foreach(
                    DeclKind::Let,
                    "v",
                    ident("items"),
                    block(vec![assign(
                        ident("n"),
                        add(ident("n"), method(ident("v"), "size", vec![])),
                    )]),
                ),
                ident("n"),
            ],
            Options::strict(),
            &context,
        );
        prop_assert_eq!(result.unwrap(), Value::Int(total as i32));
    }
}
