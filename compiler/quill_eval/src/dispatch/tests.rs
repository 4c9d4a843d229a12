#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Tests can panic")]

use std::sync::atomic::Ordering;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use quill_ir::ast::build::{int, script};
use quill_ir::{BinaryOp, NodeId, NodeKey, UnaryOp};

use super::*;
use crate::policy::DefaultArithmetic;
use crate::tests::{counted, lower_script};
use crate::{EvalErrorKind, NativeFunction, ValueKind};

/// Two distinct node keys of a freshly lowered tree.
fn keys() -> (NodeKey, NodeKey) {
    let tree = lower_script(&script(&[], vec![int(1), int(2)]));
    (tree.key(NodeId::new(0)), tree.key(NodeId::new(1)))
}

fn runtime_with(policy: DefaultArithmetic) -> Runtime {
    Runtime {
        policy: Arc::new(policy),
        ..Runtime::default()
    }
}

// Memo table

#[test]
fn memo_hits_only_for_the_recorded_signature() {
    let (key, other) = keys();
    let table = MemoTable::new();
    assert!(table.is_empty());
    table.store(
        key,
        CallSiteMemo {
            target: MemoTarget::Function(NativeFunction::new("f", |_| Ok(Value::Null))),
            signature: signature([&Value::Int(1)]),
            narrowed: None,
        },
    );
    assert!(table.lookup(key, &[ValueKind::Int]).is_some());
    assert!(table.lookup(key, &[ValueKind::Long]).is_none());
    assert!(table.lookup(other, &[ValueKind::Int]).is_none());
    assert_eq!(table.len(), 1);

    table.invalidate(key);
    assert!(table.is_empty());
}

#[test]
fn keys_differ_across_trees() {
    let (first, _) = keys();
    let (second, _) = keys();
    assert_ne!(first, second);
}

#[test]
fn signature_lists_kinds_in_order() {
    let kinds = signature([&Value::from("a"), &Value::Null, &Value::Double(1.0)]);
    assert_eq!(kinds.as_slice(), &[ValueKind::Str, ValueKind::Null, ValueKind::Double]);
}

// Binary operators

#[test]
fn base_semantics_without_overloads() {
    let (key, _) = keys();
    let rt = Runtime::default();
    assert_eq!(
        binary(&rt, key, BinaryOp::Mul, &Value::Int(6), &Value::Int(7)).unwrap(),
        Value::Int(42)
    );
    assert!(rt.memo.is_empty());
}

#[test]
fn negated_operators_invert_their_positive_form() {
    let (key, _) = keys();
    let rt = Runtime::default();
    let list = Value::list(vec![Value::Int(1)]);
    assert_eq!(
        binary(&rt, key, BinaryOp::NotContains, &Value::Int(2), &list).unwrap(),
        Value::Bool(true)
    );
    assert_eq!(
        binary(&rt, key, BinaryOp::NotEq, &Value::Int(1), &Value::Long(1)).unwrap(),
        Value::Bool(false)
    );
}

#[test]
fn overloads_are_memoized_per_site() {
    let (key, other) = keys();
    let (function, calls) = counted("add");
    let rt = runtime_with(DefaultArithmetic::new(false).with_overload(
        "add",
        &[ValueKind::Bool, ValueKind::Bool],
        function,
    ));
    let (t, f) = (Value::Bool(true), Value::Bool(false));
    assert_eq!(binary(&rt, key, BinaryOp::Add, &t, &f).unwrap(), t);
    binary(&rt, key, BinaryOp::Add, &f, &t).unwrap();
    assert_eq!(rt.memo.len(), 1);
    binary(&rt, other, BinaryOp::Add, &t, &t).unwrap();
    assert_eq!(rt.memo.len(), 2);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[derive(Debug)]
struct Version(i64);

impl crate::HostObject for Version {
    fn type_name(&self) -> &'static str {
        "Version"
    }

    fn responds_to(&self, name: &str, args: &[Value]) -> bool {
        name == "compareTo" && args.len() == 1
    }

    fn call_method(&self, _name: &str, args: &[Value]) -> Result<Value, crate::EvalError> {
        let other = args.first().and_then(Value::as_i64).unwrap_or_default();
        Ok(Value::integer(self.0 - other))
    }
}

#[test]
fn relational_probe_uses_compare_to() {
    let (key, _) = keys();
    let rt = Runtime::default();
    let version = Value::host(Version(3));
    assert_eq!(
        binary(&rt, key, BinaryOp::Lt, &version, &Value::Int(5)).unwrap(),
        Value::Bool(true)
    );
    assert_eq!(
        binary(&rt, key, BinaryOp::GtEq, &version, &Value::Int(3)).unwrap(),
        Value::Bool(true)
    );
    assert!(rt.memo.is_empty());
}

#[test]
fn unsupported_operands_report_both_kinds() {
    let (key, _) = keys();
    let rt = Runtime::default();
    let err = binary(&rt, key, BinaryOp::Sub, &Value::from("a"), &Value::Bool(true)).unwrap_err();
    assert!(err.is_degradable());
    assert!(matches!(err.kind, EvalErrorKind::Operator { .. }));
}

// Unary operators

#[test]
fn unary_base_and_probe() {
    let (key, _) = keys();
    let rt = Runtime::default();
    assert_eq!(unary(&rt, key, UnaryOp::Neg, &Value::Int(3)).unwrap(), Value::Int(-3));
    assert_eq!(
        unary(&rt, key, UnaryOp::Size, &Value::list(vec![Value::Null])).unwrap(),
        Value::Int(1)
    );
    assert!(unary(&rt, key, UnaryOp::Neg, &Value::from("s")).is_err());
}

// Helpers

#[test]
fn self_method_names() {
    assert_eq!(self_method_name(BinaryOp::Add), "selfAdd");
    assert_eq!(self_method_name(BinaryOp::Shl), "selfShiftLeft");
}

#[test]
fn narrowing_only_reports_changes() {
    let rt = Runtime::default();
    assert_eq!(
        narrow_args(&rt, &[Value::Long(3), Value::from("s")]),
        Some(vec![Value::Int(3), Value::from("s")])
    );
    assert_eq!(narrow_args(&rt, &[Value::Int(3)]), None);
}
