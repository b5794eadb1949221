//! Built-in functions of the expression language.
//!
//! Every builtin is pure and total: an argument type mismatch returns the
//! zero value of the declared return type instead of raising, so a compiled
//! program can never abort evaluation inside a builtin.

use std::collections::HashMap;

use regex::Regex;

use alertflow_core::severity::{severity_at_least, severity_level};

use crate::typecheck::ExprType;
use crate::value::Value;

/// Compile-time signature of a builtin: arity bounds and return type.
/// Argument types are not enforced at compile time — totality at runtime
/// covers mismatches — but arity is.
#[derive(Debug, Clone, Copy)]
pub struct BuiltinSig {
    pub name: &'static str,
    pub min_args: usize,
    pub max_args: usize,
    pub ret: ExprType,
}

/// The builtin signature table.
pub const BUILTINS: &[BuiltinSig] = &[
    BuiltinSig { name: "contains", min_args: 2, max_args: 2, ret: ExprType::Bool },
    BuiltinSig { name: "hasLabel", min_args: 2, max_args: 2, ret: ExprType::Bool },
    BuiltinSig { name: "getLabel", min_args: 3, max_args: 3, ret: ExprType::String },
    BuiltinSig { name: "labelEquals", min_args: 3, max_args: 3, ret: ExprType::Bool },
    BuiltinSig { name: "labelIn", min_args: 3, max_args: 3, ret: ExprType::Bool },
    BuiltinSig { name: "labelMatches", min_args: 3, max_args: 3, ret: ExprType::Bool },
    BuiltinSig { name: "regexMatch", min_args: 2, max_args: 2, ret: ExprType::Bool },
    BuiltinSig { name: "startsWith", min_args: 2, max_args: 2, ret: ExprType::Bool },
    BuiltinSig { name: "endsWith", min_args: 2, max_args: 2, ret: ExprType::Bool },
    BuiltinSig { name: "lower", min_args: 1, max_args: 1, ret: ExprType::String },
    BuiltinSig { name: "upper", min_args: 1, max_args: 1, ret: ExprType::String },
    BuiltinSig { name: "trim", min_args: 1, max_args: 1, ret: ExprType::String },
    BuiltinSig { name: "split", min_args: 2, max_args: 2, ret: ExprType::StringList },
    BuiltinSig { name: "join", min_args: 2, max_args: 2, ret: ExprType::String },
    BuiltinSig { name: "severityLevel", min_args: 1, max_args: 1, ret: ExprType::Int },
    BuiltinSig { name: "severityAtLeast", min_args: 2, max_args: 2, ret: ExprType::Bool },
];

/// Look up a builtin signature by name.
pub fn signature(name: &str) -> Option<&'static BuiltinSig> {
    BUILTINS.iter().find(|sig| sig.name == name)
}

/// The zero value of a declared return type.
fn zero_of(ty: ExprType) -> Value {
    match ty {
        ExprType::Bool => Value::Bool(false),
        ExprType::Int | ExprType::Timestamp => Value::Int(0),
        ExprType::Float => Value::Float(0.0),
        ExprType::String => Value::String(String::new()),
        ExprType::StringList | ExprType::List => Value::List(Vec::new()),
        ExprType::StringMap => Value::Map(HashMap::new()),
        ExprType::Null | ExprType::Any => Value::Null,
    }
}

fn str_arg<'a>(args: &'a [Value], idx: usize) -> Option<&'a str> {
    args.get(idx).and_then(Value::as_str)
}

fn map_arg<'a>(args: &'a [Value], idx: usize) -> Option<&'a HashMap<String, Value>> {
    match args.get(idx) {
        Some(Value::Map(m)) => Some(m),
        _ => None,
    }
}

fn list_arg<'a>(args: &'a [Value], idx: usize) -> Option<&'a [Value]> {
    match args.get(idx) {
        Some(Value::List(v)) => Some(v),
        _ => None,
    }
}

/// Look up `map[key]` as a string, if present.
fn map_str_value<'a>(map: &'a HashMap<String, Value>, key: &str) -> Option<&'a str> {
    map.get(key).and_then(Value::as_str)
}

/// Invoke a builtin. Total: unknown names return null, argument mismatches
/// return the zero value of the builtin's declared return type.
#[allow(clippy::too_many_lines)]
pub fn call(name: &str, args: &[Value]) -> Value {
    let Some(sig) = signature(name) else {
        return Value::Null;
    };
    if args.len() < sig.min_args || args.len() > sig.max_args {
        return zero_of(sig.ret);
    }

    match name {
        // contains(list, x) / contains(map, key) / contains(string, substr)
        "contains" => {
            let result = match (&args[0], &args[1]) {
                (Value::List(list), needle) => list.iter().any(|v| v.loosely_equals(needle)),
                (Value::Map(map), Value::String(key)) => map.contains_key(key),
                (Value::String(s), Value::String(sub)) => s.contains(sub.as_str()),
                _ => false,
            };
            Value::Bool(result)
        }

        "hasLabel" => {
            let result = match (map_arg(args, 0), str_arg(args, 1)) {
                (Some(map), Some(key)) => map.contains_key(key),
                _ => false,
            };
            Value::Bool(result)
        }

        "getLabel" => {
            let fallback = str_arg(args, 2).unwrap_or_default();
            let result = match (map_arg(args, 0), str_arg(args, 1)) {
                (Some(map), Some(key)) => {
                    map_str_value(map, key).unwrap_or(fallback).to_owned()
                }
                _ => fallback.to_owned(),
            };
            Value::String(result)
        }

        "labelEquals" => {
            let result = match (map_arg(args, 0), str_arg(args, 1), str_arg(args, 2)) {
                (Some(map), Some(key), Some(expected)) => {
                    map_str_value(map, key) == Some(expected)
                }
                _ => false,
            };
            Value::Bool(result)
        }

        "labelIn" => {
            let result = match (map_arg(args, 0), str_arg(args, 1), list_arg(args, 2)) {
                (Some(map), Some(key), Some(list)) => map_str_value(map, key)
                    .is_some_and(|v| list.iter().any(|item| item.as_str() == Some(v))),
                _ => false,
            };
            Value::Bool(result)
        }

        "labelMatches" => {
            let result = match (map_arg(args, 0), str_arg(args, 1), str_arg(args, 2)) {
                (Some(map), Some(key), Some(pattern)) => match map_str_value(map, key) {
                    Some(v) => regex_is_match(pattern, v),
                    None => false,
                },
                _ => false,
            };
            Value::Bool(result)
        }

        "regexMatch" => {
            let result = match (str_arg(args, 0), str_arg(args, 1)) {
                (Some(s), Some(pattern)) => regex_is_match(pattern, s),
                _ => false,
            };
            Value::Bool(result)
        }

        "startsWith" => {
            let result = match (str_arg(args, 0), str_arg(args, 1)) {
                (Some(s), Some(prefix)) => s.starts_with(prefix),
                _ => false,
            };
            Value::Bool(result)
        }

        "endsWith" => {
            let result = match (str_arg(args, 0), str_arg(args, 1)) {
                (Some(s), Some(suffix)) => s.ends_with(suffix),
                _ => false,
            };
            Value::Bool(result)
        }

        "lower" => Value::String(
            str_arg(args, 0).map(str::to_lowercase).unwrap_or_default(),
        ),
        "upper" => Value::String(
            str_arg(args, 0).map(str::to_uppercase).unwrap_or_default(),
        ),
        "trim" => Value::String(
            str_arg(args, 0).map(|s| s.trim().to_owned()).unwrap_or_default(),
        ),

        "split" => {
            let result = match (str_arg(args, 0), str_arg(args, 1)) {
                (Some(s), Some(sep)) if !sep.is_empty() => s
                    .split(sep)
                    .map(|part| Value::String(part.to_owned()))
                    .collect(),
                _ => Vec::new(),
            };
            Value::List(result)
        }

        "join" => {
            let result = match (list_arg(args, 0), str_arg(args, 1)) {
                (Some(list), Some(sep)) => list
                    .iter()
                    .filter_map(Value::as_str)
                    .collect::<Vec<_>>()
                    .join(sep),
                _ => String::new(),
            };
            Value::String(result)
        }

        "severityLevel" => {
            Value::Int(str_arg(args, 0).map_or(0, severity_level))
        }

        "severityAtLeast" => {
            let result = match (str_arg(args, 0), str_arg(args, 1)) {
                (Some(label), Some(min)) => severity_at_least(label, min),
                _ => false,
            };
            Value::Bool(result)
        }

        _ => Value::Null,
    }
}

/// Match `text` against `pattern`, treating an invalid pattern as no-match.
fn regex_is_match(pattern: &str, text: &str) -> bool {
    Regex::new(pattern).is_ok_and(|re| re.is_match(text))
}
