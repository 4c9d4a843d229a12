//! Built-in methods on strings, collections, ranges and generators.

use super::{MethodHandle, MethodResolver};
use crate::errors::{undefined_method, wrong_arg_count};
use crate::value::{map_get, map_put, set_add};
use crate::{EvalError, Value, ValueKind};

type BuiltinFn = fn(&Value, &[Value]) -> Result<Value, EvalError>;

/// Resolver for methods every built-in value kind understands.
#[derive(Clone, Copy, Debug, Default)]
pub struct BuiltinMethodResolver;

impl MethodResolver for BuiltinMethodResolver {
    fn resolve(&self, target: &Value, name: &str, args: &[Value]) -> Option<MethodHandle> {
        let (body, arity) = lookup(target.kind(), name)?;
        if args.len() != arity {
            return None;
        }
        Some(MethodHandle::new(name, body))
    }

    fn priority(&self) -> u8 {
        1
    }

    fn resolver_name(&self) -> &'static str {
        "builtin"
    }
}

/// Method body and arity for `kind.name(...)`.
fn lookup(kind: ValueKind, name: &str) -> Option<(BuiltinFn, usize)> {
    let found = match (kind, name) {
        (
            ValueKind::Str | ValueKind::List | ValueKind::Set | ValueKind::Map | ValueKind::Range,
            "size" | "length",
        ) => entry(size, 0),
        (
            ValueKind::Str | ValueKind::List | ValueKind::Set | ValueKind::Map | ValueKind::Range,
            "isEmpty",
        ) => entry(is_empty, 0),

        (ValueKind::Str, "contains") => entry(str_contains, 1),
        (ValueKind::Str, "startsWith") => entry(str_starts_with, 1),
        (ValueKind::Str, "endsWith") => entry(str_ends_with, 1),
        (ValueKind::Str, "toUpperCase") => entry(|t, _| map_str(t, str::to_uppercase), 0),
        (ValueKind::Str, "toLowerCase") => entry(|t, _| map_str(t, str::to_lowercase), 0),
        (ValueKind::Str, "trim") => entry(|t, _| map_str(t, |s| s.trim().to_owned()), 0),
        (ValueKind::Str, "indexOf") => entry(str_index_of, 1),

        (ValueKind::List | ValueKind::Set | ValueKind::Range, "contains") => entry(seq_contains, 1),
        (ValueKind::List | ValueKind::Set, "add") => entry(seq_add, 1),
        (ValueKind::List, "get") => entry(list_get, 1),
        (ValueKind::List, "set") => entry(list_set, 2),
        (ValueKind::List, "indexOf") => entry(list_index_of, 1),

        (ValueKind::Map, "containsKey") => entry(map_contains_key, 1),
        (ValueKind::Map, "get") => entry(map_get_method, 1),
        (ValueKind::Map, "put") => entry(map_put_method, 2),
        (ValueKind::Map, "keys") => entry(map_keys, 0),
        (ValueKind::Map, "values") => entry(map_values, 0),

        (ValueKind::Generator, "next") => entry(generator_next, 0),
        (ValueKind::Generator, "isDone") => entry(generator_is_done, 0),
        _ => return None,
    };
    Some(found)
}

fn entry(body: BuiltinFn, arity: usize) -> (BuiltinFn, usize) {
    (body, arity)
}

fn arg(args: &[Value], index: usize, method: &str, expected: usize) -> Result<Value, EvalError> {
    args.get(index)
        .cloned()
        .ok_or_else(|| wrong_arg_count(method, expected, args.len()))
}

fn size(target: &Value, _: &[Value]) -> Result<Value, EvalError> {
    let n = match target {
        Value::Str(s) => s.chars().count(),
        Value::List(items) | Value::Set(items) => items.read().len(),
        Value::Map(entries) => entries.read().len(),
        Value::Range { low, high } => {
            return Ok(Value::integer(
                high.saturating_sub(*low).saturating_add(1).max(0),
            ));
        }
        other => return Err(undefined_method(&format!("{}.size", other.type_name()))),
    };
    Ok(Value::integer(i64::try_from(n).unwrap_or(i64::MAX)))
}

fn is_empty(target: &Value, _: &[Value]) -> Result<Value, EvalError> {
    let empty = match target {
        Value::Str(s) => s.is_empty(),
        Value::List(items) | Value::Set(items) => items.read().is_empty(),
        Value::Map(entries) => entries.read().is_empty(),
        Value::Range { low, high } => low > high,
        _ => false,
    };
    Ok(Value::Bool(empty))
}

fn str_op(
    target: &Value,
    args: &[Value],
    method: &str,
    op: fn(&str, &str) -> Value,
) -> Result<Value, EvalError> {
    let needle = arg(args, 0, method, 1)?.to_string();
    match target {
        Value::Str(s) => Ok(op(s, &needle)),
        other => Err(undefined_method(&format!("{}.{method}", other.type_name()))),
    }
}

fn str_contains(target: &Value, args: &[Value]) -> Result<Value, EvalError> {
    str_op(target, args, "contains", |s, n| Value::Bool(s.contains(n)))
}

fn str_starts_with(target: &Value, args: &[Value]) -> Result<Value, EvalError> {
    str_op(target, args, "startsWith", |s, n| Value::Bool(s.starts_with(n)))
}

fn str_ends_with(target: &Value, args: &[Value]) -> Result<Value, EvalError> {
    str_op(target, args, "endsWith", |s, n| Value::Bool(s.ends_with(n)))
}

fn str_index_of(target: &Value, args: &[Value]) -> Result<Value, EvalError> {
    str_op(target, args, "indexOf", |s, n| {
        let index = s
            .find(n)
            .map_or(-1, |byte| i64::try_from(s[..byte].chars().count()).unwrap_or(-1));
        Value::integer(index)
    })
}

fn map_str(target: &Value, f: fn(&str) -> String) -> Result<Value, EvalError> {
    match target {
        Value::Str(s) => Ok(Value::string(f(s))),
        other => Err(undefined_method(other.type_name())),
    }
}

fn seq_contains(target: &Value, args: &[Value]) -> Result<Value, EvalError> {
    let needle = arg(args, 0, "contains", 1)?;
    let found = match target {
        Value::List(items) | Value::Set(items) => {
            items.read().iter().any(|item| item.loosely_equals(&needle))
        }
        Value::Range { low, high } => needle.as_i64().is_some_and(|n| *low <= n && n <= *high),
        _ => false,
    };
    Ok(Value::Bool(found))
}

fn seq_add(target: &Value, args: &[Value]) -> Result<Value, EvalError> {
    let item = arg(args, 0, "add", 1)?;
    match target {
        Value::List(items) => {
            items.write("list")?.push(item);
            Ok(Value::Bool(true))
        }
        Value::Set(items) => Ok(Value::Bool(set_add(&mut *items.write("set")?, item))),
        other => Err(undefined_method(&format!("{}.add", other.type_name()))),
    }
}

fn list_get(target: &Value, args: &[Value]) -> Result<Value, EvalError> {
    let index = arg(args, 0, "get", 1)?;
    match (target, index.as_i64().and_then(|i| usize::try_from(i).ok())) {
        (Value::List(items), Some(i)) => Ok(items.read().get(i).cloned().unwrap_or(Value::Null)),
        _ => Ok(Value::Null),
    }
}

fn list_set(target: &Value, args: &[Value]) -> Result<Value, EvalError> {
    let index = arg(args, 0, "set", 2)?;
    let value = arg(args, 1, "set", 2)?;
    let Value::List(items) = target else {
        return Err(undefined_method(&format!("{}.set", target.type_name())));
    };
    let mut items = items.write("list")?;
    let position = index.as_i64().and_then(|i| usize::try_from(i).ok());
    let slot = match position {
        Some(i) => items.get_mut(i),
        None => None,
    };
    match slot {
        Some(slot) => Ok(std::mem::replace(slot, value)),
        None => Err(EvalError::new(format!("list index {index} out of range"))),
    }
}

fn list_index_of(target: &Value, args: &[Value]) -> Result<Value, EvalError> {
    let needle = arg(args, 0, "indexOf", 1)?;
    let Value::List(items) = target else {
        return Ok(Value::Int(-1));
    };
    let index = items
        .read()
        .iter()
        .position(|item| item.loosely_equals(&needle))
        .and_then(|i| i64::try_from(i).ok())
        .unwrap_or(-1);
    Ok(Value::integer(index))
}

fn map_contains_key(target: &Value, args: &[Value]) -> Result<Value, EvalError> {
    let key = arg(args, 0, "containsKey", 1)?;
    match target {
        Value::Map(entries) => Ok(Value::Bool(map_get(&entries.read(), &key).is_some())),
        _ => Ok(Value::Bool(false)),
    }
}

fn map_get_method(target: &Value, args: &[Value]) -> Result<Value, EvalError> {
    let key = arg(args, 0, "get", 1)?;
    match target {
        Value::Map(entries) => Ok(map_get(&entries.read(), &key).unwrap_or(Value::Null)),
        _ => Ok(Value::Null),
    }
}

fn map_put_method(target: &Value, args: &[Value]) -> Result<Value, EvalError> {
    let key = arg(args, 0, "put", 2)?;
    let value = arg(args, 1, "put", 2)?;
    match target {
        Value::Map(entries) => {
            Ok(map_put(&mut *entries.write("map")?, key, value).unwrap_or(Value::Null))
        }
        other => Err(undefined_method(&format!("{}.put", other.type_name()))),
    }
}

fn map_keys(target: &Value, _: &[Value]) -> Result<Value, EvalError> {
    match target {
        Value::Map(entries) => Ok(Value::list(
            entries.read().iter().map(|(k, _)| k.clone()).collect(),
        )),
        _ => Ok(Value::list(Vec::new())),
    }
}

fn map_values(target: &Value, _: &[Value]) -> Result<Value, EvalError> {
    match target {
        Value::Map(entries) => Ok(Value::list(
            entries.read().iter().map(|(_, v)| v.clone()).collect(),
        )),
        _ => Ok(Value::list(Vec::new())),
    }
}

fn generator_next(target: &Value, _: &[Value]) -> Result<Value, EvalError> {
    match target {
        Value::Generator(generator) => Ok(generator.resume(Value::Null)?.unwrap_or(Value::Null)),
        other => Err(undefined_method(&format!("{}.next", other.type_name()))),
    }
}

fn generator_is_done(target: &Value, _: &[Value]) -> Result<Value, EvalError> {
    match target {
        Value::Generator(generator) => Ok(Value::Bool(generator.is_done())),
        _ => Ok(Value::Bool(true)),
    }
}
