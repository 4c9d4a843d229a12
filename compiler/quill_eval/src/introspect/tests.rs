#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Tests can panic")]

use std::sync::atomic::{AtomicI64, Ordering};

use pretty_assertions::assert_eq;

use super::*;
use crate::HostObject;

fn drain(mut iter: ValueIter) -> Vec<Value> {
    let mut out = Vec::new();
    while let Some(item) = iter.next_value() {
        out.push(item.unwrap());
    }
    out
}

fn call(target: &Value, name: &str, args: &[Value]) -> Value {
    let introspector = DefaultIntrospector::new();
    introspector
        .resolve_method(target, name, args)
        .unwrap_or_else(|| panic!("no method {name}"))
        .invoke(target, args)
        .unwrap()
}

#[derive(Debug, Default)]
struct Counter {
    count: AtomicI64,
}

impl HostObject for Counter {
    fn type_name(&self) -> &'static str {
        "Counter"
    }

    fn property(&self, name: &str) -> Option<Value> {
        (name == "count").then(|| Value::Long(self.count.load(Ordering::SeqCst)))
    }

    fn set_property(&self, name: &str, value: Value) -> Result<bool, EvalError> {
        if name != "count" {
            return Ok(false);
        }
        self.count.store(value.as_i64().unwrap_or_default(), Ordering::SeqCst);
        Ok(true)
    }

    fn responds_to(&self, name: &str, _args: &[Value]) -> bool {
        matches!(name, "size" | "bump" | "new")
    }

    fn call_method(&self, name: &str, _args: &[Value]) -> Result<Value, EvalError> {
        match name {
            "size" => Ok(Value::Int(99)),
            "bump" => Ok(Value::Long(self.count.fetch_add(1, Ordering::SeqCst) + 1)),
            "new" => Ok(Value::host(Counter::default())),
            other => Err(crate::errors::undefined_method(other)),
        }
    }
}

// Properties

#[test]
fn map_properties_read_missing_keys_as_null() {
    let introspector = DefaultIntrospector::new();
    let map = Value::map(vec![(Value::from("a"), Value::Int(1))]);
    assert_eq!(
        introspector.property_get(&map, &Value::from("a")).unwrap().unwrap(),
        Value::Int(1)
    );
    assert_eq!(
        introspector.property_get(&map, &Value::from("b")).unwrap().unwrap(),
        Value::Null
    );
}

#[test]
fn indexing_lists_and_strings() {
    let introspector = DefaultIntrospector::new();
    let list = Value::list(vec![Value::Int(1), Value::Int(2)]);
    assert_eq!(
        introspector.property_get(&list, &Value::Long(1)).unwrap().unwrap(),
        Value::Int(2)
    );
    assert!(introspector.property_get(&list, &Value::Int(5)).is_none());
    assert!(introspector.property_get(&list, &Value::Int(-1)).is_none());
    assert_eq!(
        introspector.property_get(&Value::from("héllo"), &Value::Int(1)).unwrap().unwrap(),
        Value::from("é")
    );
    assert!(introspector.property_get(&Value::Int(3), &Value::from("x")).is_none());
}

#[test]
fn writes_to_maps_and_lists() {
    let introspector = DefaultIntrospector::new();
    let map = Value::map(Vec::new());
    introspector
        .property_set(&map, &Value::from("k"), Value::Int(1))
        .unwrap()
        .unwrap();
    assert_eq!(map.to_string(), "{k: 1}");

    let list = Value::list(vec![Value::Int(0)]);
    introspector
        .property_set(&list, &Value::Int(0), Value::Int(7))
        .unwrap()
        .unwrap();
    assert_eq!(list.to_string(), "[7]");
    assert!(introspector.property_set(&list, &Value::Int(3), Value::Null).is_none());
}

#[test]
fn writes_to_frozen_containers_fail() {
    let introspector = DefaultIntrospector::new();
    let Value::Map(entries) = Value::map(Vec::new()) else {
        unreachable!()
    };
    let frozen = Value::Map(Arc::new(crate::Shared::frozen(entries.read().clone())));
    let err = introspector
        .property_set(&frozen, &Value::from("k"), Value::Int(1))
        .unwrap()
        .unwrap_err();
    assert_eq!(err.to_string(), "cannot modify immutable map");
}

#[test]
fn host_properties() {
    let introspector = DefaultIntrospector::new();
    let host = Value::host(Counter::default());
    introspector
        .property_set(&host, &Value::from("count"), Value::Long(4))
        .unwrap()
        .unwrap();
    assert_eq!(
        introspector.property_get(&host, &Value::from("count")).unwrap().unwrap(),
        Value::Long(4)
    );
    assert!(introspector.property_get(&host, &Value::from("other")).is_none());
    assert!(introspector
        .property_set(&host, &Value::from("other"), Value::Null)
        .is_none());
}

// Methods

#[test]
fn builtin_string_methods() {
    let s = Value::from("Hello");
    assert_eq!(call(&s, "size", &[]), Value::Int(5));
    assert_eq!(call(&s, "toUpperCase", &[]), Value::from("HELLO"));
    assert_eq!(call(&s, "indexOf", &[Value::from("l")]), Value::Int(2));
    assert_eq!(call(&s, "indexOf", &[Value::from("z")]), Value::Int(-1));
    assert_eq!(call(&s, "startsWith", &[Value::from("He")]), Value::Bool(true));
}

#[test]
fn builtin_collection_methods() {
    let list = Value::list(vec![Value::Int(1)]);
    assert_eq!(call(&list, "add", &[Value::Int(2)]), Value::Bool(true));
    assert_eq!(call(&list, "get", &[Value::Int(1)]), Value::Int(2));
    assert_eq!(call(&list, "set", &[Value::Int(0), Value::Int(5)]), Value::Int(1));
    assert_eq!(call(&list, "indexOf", &[Value::Long(5)]), Value::Int(0));
    assert_eq!(list.to_string(), "[5, 2]");

    let set = Value::set(vec![Value::Int(1)]);
    assert_eq!(call(&set, "add", &[Value::Int(1)]), Value::Bool(false));
    assert_eq!(call(&set, "add", &[Value::Int(2)]), Value::Bool(true));
    assert_eq!(set.to_string(), "{1, 2}");

    let map = Value::map(Vec::new());
    assert_eq!(call(&map, "put", &[Value::from("a"), Value::Int(1)]), Value::Null);
    assert_eq!(call(&map, "put", &[Value::from("a"), Value::Int(2)]), Value::Int(1));
    assert_eq!(call(&map, "containsKey", &[Value::from("a")]), Value::Bool(true));
    assert_eq!(call(&map, "keys", &[]).to_string(), "[a]");

    let range = Value::Range { low: 1, high: 4 };
    assert_eq!(call(&range, "size", &[]), Value::Int(4));
    assert_eq!(call(&range, "contains", &[Value::Int(4)]), Value::Bool(true));
}

#[test]
fn builtin_arity_must_match() {
    let introspector = DefaultIntrospector::new();
    let s = Value::from("abc");
    assert!(introspector.resolve_method(&s, "size", &[Value::Int(1)]).is_none());
    assert!(introspector.resolve_method(&s, "nope", &[]).is_none());
    assert!(introspector.resolve_method(&Value::Int(1), "size", &[]).is_none());
}

#[test]
fn out_of_range_list_set_fails() {
    let introspector = DefaultIntrospector::new();
    let list = Value::list(Vec::new());
    let args = [Value::Int(3), Value::Null];
    let handle = introspector.resolve_method(&list, "set", &args).unwrap();
    assert!(handle.invoke(&list, &args).is_err());
}

#[test]
fn host_methods_resolve_through_the_chain() {
    let host = Value::host(Counter::default());
    assert_eq!(call(&host, "bump", &[]), Value::Long(1));
    // Host objects are not built-in kinds; `size` comes from the host.
    assert_eq!(call(&host, "size", &[]), Value::Int(99));
    assert!(DefaultIntrospector::new().resolve_method(&host, "other", &[]).is_none());
}

#[test]
fn dispatcher_orders_resolvers_by_priority() {
    let dispatcher = MethodDispatcher::new(vec![
        MethodResolverKind::Builtin(BuiltinMethodResolver),
        MethodResolverKind::Host(HostMethodResolver),
    ]);
    let names: Vec<_> = dispatcher
        .resolvers
        .iter()
        .map(MethodResolverKind::resolver_name)
        .collect();
    assert_eq!(names, vec!["host", "builtin"]);
}

#[test]
fn method_handles_ignore_their_receiver_when_wrapping_functions() {
    let handle = MethodHandle::from_function(NativeFunction::new("first", |args| {
        Ok(args.first().cloned().unwrap_or_default())
    }));
    assert_eq!(handle.name(), "first");
    assert_eq!(handle.invoke(&Value::Null, &[Value::Int(3)]).unwrap(), Value::Int(3));
}

// Constructors and types

#[test]
fn constructors_by_name_function_and_host() {
    let introspector = DefaultIntrospector::new().with_constructor(
        "Pair",
        NativeFunction::new("Pair", |args| Ok(Value::list(args.to_vec()))),
    );
    let pair = introspector
        .resolve_constructor(&Value::from("Pair"), &[])
        .unwrap()
        .invoke(&Value::Null, &[Value::Int(1), Value::Int(2)])
        .unwrap();
    assert_eq!(pair.to_string(), "[1, 2]");
    assert!(introspector.resolve_constructor(&Value::from("Other"), &[]).is_none());

    let factory = Value::host(Counter::default());
    let made = introspector
        .resolve_constructor(&factory, &[])
        .unwrap()
        .invoke(&factory, &[])
        .unwrap();
    assert_eq!(made.type_name(), "Counter");
    assert!(introspector.resolve_constructor(&Value::Int(1), &[]).is_none());
}

#[test]
fn registered_types_resolve() {
    let introspector = DefaultIntrospector::new().with_type("Math", Value::from("math"));
    assert_eq!(introspector.resolve_type("Math"), Some(Value::from("math")));
    assert_eq!(introspector.resolve_type("Other"), None);
}

// Iteration

#[test]
fn iterables() {
    let introspector = DefaultIntrospector::new();
    let iter = |value: Value| drain(introspector.resolve_iterable(&value).unwrap());
    assert_eq!(iter(Value::Null), Vec::<Value>::new());
    assert_eq!(iter(Value::from("ab")), vec![Value::from("a"), Value::from("b")]);
    assert_eq!(
        iter(Value::map(vec![(Value::from("k"), Value::Int(1))])),
        vec![Value::Int(1)]
    );
    assert_eq!(iter(Value::Range { low: 0, high: 1 }), vec![Value::Long(0), Value::Long(1)]);
    assert!(introspector.resolve_iterable(&Value::Int(1)).is_none());
    assert!(introspector
        .resolve_iterable(&Value::host(Counter::default()))
        .is_none());
}
