//! End-to-end evaluation tests.
//!
//! Scripts are built with `quill_ir::ast::build`, lowered, and run through
//! an [`Interpreter`] against a [`MapContext`].

#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Tests can panic")]

mod property_tests;
mod scoping_tests;
mod statement_tests;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use quill_ir::ast::build::script;
use quill_ir::ast::{Ast, Script};
use quill_ir::{lower, SharedInterner, SharedTree};

use crate::{
    EvalError, EvalErrorKind, Generator, Interpreter, InterpreterBuilder, MapContext,
    NativeFunction, Options, Value,
};

pub(crate) fn lower_script(script: &Script) -> SharedTree {
    lower(script, &SharedInterner::new()).unwrap()
}

pub(crate) fn interpreter(script: &Script, options: Options, context: &Arc<MapContext>) -> Interpreter {
    InterpreterBuilder::new(lower_script(script))
        .options(options)
        .context(Arc::clone(context) as Arc<dyn crate::Context>)
        .build()
}

/// Run a parameterless script with default options and an empty context.
pub(crate) fn run(body: Vec<Ast>) -> Result<Value, EvalError> {
    run_with(body, Options::default(), &Arc::new(MapContext::new()))
}

pub(crate) fn run_with(
    body: Vec<Ast>,
    options: Options,
    context: &Arc<MapContext>,
) -> Result<Value, EvalError> {
    interpreter(&script(&[], body), options, context).execute(&[])
}

/// Start a parameterless script as a generator.
pub(crate) fn generate(body: Vec<Ast>, context: &Arc<MapContext>) -> Generator {
    interpreter(&script(&[], body), Options::default(), context).drive_generator(&[])
}

/// Resume until done, collecting every yielded value.
pub(crate) fn drain(generator: &Generator) -> Vec<Value> {
    let mut values = Vec::new();
    while let Some(value) = generator.next_value().unwrap() {
        values.push(value);
    }
    values
}

pub(crate) fn ints(values: &[i32]) -> Vec<Value> {
    values.iter().copied().map(Value::Int).collect()
}

/// A function named `name` that returns its first argument and counts
/// its calls.
pub(crate) fn counted(name: &str) -> (NativeFunction, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&calls);
    let function = NativeFunction::new(name, move |args| {
        seen.fetch_add(1, Ordering::SeqCst);
        Ok(args.first().cloned().unwrap_or_default())
    });
    (function, calls)
}

pub(crate) fn calls(counter: &AtomicUsize) -> usize {
    counter.load(Ordering::SeqCst)
}

pub(crate) fn kind_of(result: Result<Value, EvalError>) -> EvalErrorKind {
    match result {
        Ok(value) => panic!("expected an error, got {value:?}"),
        Err(e) => e.kind,
    }
}
