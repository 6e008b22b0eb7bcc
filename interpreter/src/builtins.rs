//! Global functions and the methods available on arrays, strings, numbers
//! and functions. Nothing here is visible to a script until
//! [`install`] puts the globals into a scope.

use std::io::Write;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::context::Context;
use crate::environment::Environment;
use crate::error::RuntimeError;
use crate::executor::call_function;
use crate::inspect::inspect;
use crate::runtime_value::{
    Array, BoundMethod, MethodFn, NativeFn, RuntimeValue, format_number, join_array,
};

const GLOBALS: &[(&str, NativeFn)] = &[
    ("print", print),
    ("keys", keys),
    ("isArray", is_array),
    ("String", to_string),
    ("Number", to_number),
    ("Error", error),
];

const ARRAY_METHODS: &[(&str, MethodFn)] = &[
    ("push", array_push),
    ("pop", array_pop),
    ("slice", array_slice),
    ("concat", array_concat),
    ("join", array_join),
    ("map", array_map),
    ("filter", array_filter),
    ("reduce", array_reduce),
    ("forEach", array_for_each),
    ("some", array_some),
    ("every", array_every),
    ("find", array_find),
    ("indexOf", array_index_of),
    ("includes", array_includes),
    ("reverse", array_reverse),
];

const STRING_METHODS: &[(&str, MethodFn)] = &[
    ("split", string_split),
    ("slice", string_slice),
    ("indexOf", string_index_of),
    ("includes", string_includes),
    ("toUpperCase", string_to_upper_case),
    ("toLowerCase", string_to_lower_case),
    ("trim", string_trim),
    ("charAt", string_char_at),
];

const NUMBER_METHODS: &[(&str, MethodFn)] = &[
    ("toFixed", number_to_fixed),
    ("toString", value_to_string),
];

const FUNCTION_METHODS: &[(&str, MethodFn)] = &[("apply", function_apply), ("call", function_call)];

/// Declare the global functions in `env`.
pub fn install(env: &Environment) {
    for &(name, function) in GLOBALS {
        env.declare(name, RuntimeValue::native(name, function));
    }
}

/// Look up a builtin method on `receiver`, bound to it.
pub fn method(receiver: &RuntimeValue, name: &str) -> Option<RuntimeValue> {
    let table = match receiver {
        RuntimeValue::Array(_) => ARRAY_METHODS,
        RuntimeValue::String(_) => STRING_METHODS,
        RuntimeValue::Number(_) => NUMBER_METHODS,
        RuntimeValue::Function(_) | RuntimeValue::Native(_) | RuntimeValue::Method(_) => {
            FUNCTION_METHODS
        }
        _ => return None,
    };
    let &(name, function) = table.iter().find(|(candidate, _)| *candidate == name)?;
    Some(RuntimeValue::Method(Rc::new(BoundMethod {
        name,
        receiver: receiver.clone(),
        function,
    })))
}

fn arg(args: &[RuntimeValue], index: usize) -> RuntimeValue {
    args.get(index).cloned().unwrap_or(RuntimeValue::Undefined)
}

fn array_of(receiver: &RuntimeValue) -> Result<&Array, RuntimeError> {
    match receiver {
        RuntimeValue::Array(items) => Ok(items),
        other => Err(RuntimeError::type_error(format!(
            "{} is not an array",
            inspect(other)
        ))),
    }
}

fn string_of(receiver: &RuntimeValue) -> Result<&str, RuntimeError> {
    match receiver {
        RuntimeValue::String(s) => Ok(s),
        other => Err(RuntimeError::type_error(format!(
            "{} is not a string",
            inspect(other)
        ))),
    }
}

/// Resolve a possibly negative `slice` bound against `len`.
fn relative_index(value: &RuntimeValue, len: usize, default: usize) -> usize {
    if matches!(value, RuntimeValue::Undefined) {
        return default;
    }
    let n = value.to_number();
    if n.is_nan() {
        return 0;
    }
    let n = n.trunc();
    if n < 0.0 {
        (len as f64 + n).max(0.0) as usize
    } else {
        n.min(len as f64) as usize
    }
}

// --- Globals ---

/// Strings are written as-is, everything else inspected; arguments are
/// separated by spaces.
fn print(args: &[RuntimeValue], ctx: &mut Context<'_>) -> Result<RuntimeValue, RuntimeError> {
    let line = args
        .iter()
        .map(|value| match value {
            RuntimeValue::String(s) => s.clone(),
            other => inspect(other),
        })
        .collect::<Vec<_>>()
        .join(" ");
    writeln!(ctx.output, "{}", line)
        .map_err(|e| RuntimeError::error(format!("print failed: {}", e)))?;
    Ok(RuntimeValue::Undefined)
}

fn keys(args: &[RuntimeValue], _ctx: &mut Context<'_>) -> Result<RuntimeValue, RuntimeError> {
    let target = arg(args, 0);
    let keys: Vec<RuntimeValue> = match &target {
        RuntimeValue::Object(entries) => entries
            .borrow()
            .keys()
            .map(|key| RuntimeValue::string(key.as_str()))
            .collect(),
        RuntimeValue::Array(items) => (0..items.borrow().len())
            .map(|i| RuntimeValue::string(i.to_string()))
            .collect(),
        RuntimeValue::Undefined | RuntimeValue::Null => {
            return Err(RuntimeError::type_error(
                "cannot convert undefined or null to object",
            ));
        }
        _ => Vec::new(),
    };
    Ok(RuntimeValue::array(keys))
}

fn is_array(args: &[RuntimeValue], _ctx: &mut Context<'_>) -> Result<RuntimeValue, RuntimeError> {
    Ok(RuntimeValue::Boolean(matches!(
        arg(args, 0),
        RuntimeValue::Array(_)
    )))
}

fn to_string(args: &[RuntimeValue], _ctx: &mut Context<'_>) -> Result<RuntimeValue, RuntimeError> {
    Ok(RuntimeValue::String(arg(args, 0).to_display_string()))
}

fn to_number(args: &[RuntimeValue], _ctx: &mut Context<'_>) -> Result<RuntimeValue, RuntimeError> {
    let value = match args.first() {
        Some(value) => value.to_number(),
        None => 0.0,
    };
    Ok(RuntimeValue::Number(value))
}

/// `Error(message)` makes a `{ name, message }` object suitable for `throw`.
fn error(args: &[RuntimeValue], _ctx: &mut Context<'_>) -> Result<RuntimeValue, RuntimeError> {
    let message = match arg(args, 0) {
        RuntimeValue::Undefined => String::new(),
        other => other.to_display_string(),
    };
    let mut entries = IndexMap::new();
    entries.insert("name".to_string(), RuntimeValue::string("Error"));
    entries.insert("message".to_string(), RuntimeValue::String(message));
    Ok(RuntimeValue::object(entries))
}

// --- Array methods ---

fn array_push(
    receiver: &RuntimeValue,
    args: &[RuntimeValue],
    _ctx: &mut Context<'_>,
) -> Result<RuntimeValue, RuntimeError> {
    let mut items = array_of(receiver)?.borrow_mut();
    items.extend(args.iter().cloned());
    Ok(RuntimeValue::Number(items.len() as f64))
}

fn array_pop(
    receiver: &RuntimeValue,
    _args: &[RuntimeValue],
    _ctx: &mut Context<'_>,
) -> Result<RuntimeValue, RuntimeError> {
    let popped = array_of(receiver)?.borrow_mut().pop();
    Ok(popped.unwrap_or(RuntimeValue::Undefined))
}

fn array_slice(
    receiver: &RuntimeValue,
    args: &[RuntimeValue],
    _ctx: &mut Context<'_>,
) -> Result<RuntimeValue, RuntimeError> {
    let items = array_of(receiver)?.borrow();
    let start = relative_index(&arg(args, 0), items.len(), 0);
    let end = relative_index(&arg(args, 1), items.len(), items.len());
    let slice = if start < end {
        items[start..end].to_vec()
    } else {
        Vec::new()
    };
    Ok(RuntimeValue::array(slice))
}

fn array_concat(
    receiver: &RuntimeValue,
    args: &[RuntimeValue],
    _ctx: &mut Context<'_>,
) -> Result<RuntimeValue, RuntimeError> {
    let mut result = array_of(receiver)?.borrow().clone();
    for value in args {
        match value {
            RuntimeValue::Array(items) => result.extend(items.borrow().iter().cloned()),
            other => result.push(other.clone()),
        }
    }
    Ok(RuntimeValue::array(result))
}

fn array_join(
    receiver: &RuntimeValue,
    args: &[RuntimeValue],
    _ctx: &mut Context<'_>,
) -> Result<RuntimeValue, RuntimeError> {
    let separator = match arg(args, 0) {
        RuntimeValue::Undefined => ",".to_string(),
        other => other.to_display_string(),
    };
    let joined = join_array(array_of(receiver)?, &separator, &mut Vec::new());
    Ok(RuntimeValue::String(joined))
}

/// Call `callback(item, index, array)` for each item of a snapshot of the
/// receiver, stopping early when `visit` returns `Some`.
fn each_item(
    receiver: &RuntimeValue,
    callback: &RuntimeValue,
    ctx: &mut Context<'_>,
    mut visit: impl FnMut(RuntimeValue, RuntimeValue) -> Option<RuntimeValue>,
) -> Result<Option<RuntimeValue>, RuntimeError> {
    let items = array_of(receiver)?.borrow().clone();
    for (index, item) in items.into_iter().enumerate() {
        let result = call_function(
            callback,
            vec![
                item.clone(),
                RuntimeValue::Number(index as f64),
                receiver.clone(),
            ],
            ctx,
        )?;
        if let Some(stop) = visit(item, result) {
            return Ok(Some(stop));
        }
    }
    Ok(None)
}

fn array_map(
    receiver: &RuntimeValue,
    args: &[RuntimeValue],
    ctx: &mut Context<'_>,
) -> Result<RuntimeValue, RuntimeError> {
    let mut mapped = Vec::new();
    each_item(receiver, &arg(args, 0), ctx, |_, result| {
        mapped.push(result);
        None
    })?;
    Ok(RuntimeValue::array(mapped))
}

fn array_filter(
    receiver: &RuntimeValue,
    args: &[RuntimeValue],
    ctx: &mut Context<'_>,
) -> Result<RuntimeValue, RuntimeError> {
    let mut kept = Vec::new();
    each_item(receiver, &arg(args, 0), ctx, |item, result| {
        if result.is_truthy() {
            kept.push(item);
        }
        None
    })?;
    Ok(RuntimeValue::array(kept))
}

fn array_for_each(
    receiver: &RuntimeValue,
    args: &[RuntimeValue],
    ctx: &mut Context<'_>,
) -> Result<RuntimeValue, RuntimeError> {
    each_item(receiver, &arg(args, 0), ctx, |_, _| None)?;
    Ok(RuntimeValue::Undefined)
}

fn array_some(
    receiver: &RuntimeValue,
    args: &[RuntimeValue],
    ctx: &mut Context<'_>,
) -> Result<RuntimeValue, RuntimeError> {
    let found = each_item(receiver, &arg(args, 0), ctx, |_, result| {
        result.is_truthy().then_some(RuntimeValue::Boolean(true))
    })?;
    Ok(found.unwrap_or(RuntimeValue::Boolean(false)))
}

fn array_every(
    receiver: &RuntimeValue,
    args: &[RuntimeValue],
    ctx: &mut Context<'_>,
) -> Result<RuntimeValue, RuntimeError> {
    let failed = each_item(receiver, &arg(args, 0), ctx, |_, result| {
        (!result.is_truthy()).then_some(RuntimeValue::Boolean(false))
    })?;
    Ok(failed.unwrap_or(RuntimeValue::Boolean(true)))
}

fn array_find(
    receiver: &RuntimeValue,
    args: &[RuntimeValue],
    ctx: &mut Context<'_>,
) -> Result<RuntimeValue, RuntimeError> {
    let found = each_item(receiver, &arg(args, 0), ctx, |item, result| {
        result.is_truthy().then_some(item)
    })?;
    Ok(found.unwrap_or(RuntimeValue::Undefined))
}

fn array_reduce(
    receiver: &RuntimeValue,
    args: &[RuntimeValue],
    ctx: &mut Context<'_>,
) -> Result<RuntimeValue, RuntimeError> {
    let callback = arg(args, 0);
    let items = array_of(receiver)?.borrow().clone();
    let mut items = items.into_iter().enumerate();
    let mut accumulator = if args.len() >= 2 {
        args[1].clone()
    } else {
        match items.next() {
            Some((_, first)) => first,
            None => {
                return Err(RuntimeError::type_error(
                    "reduce of empty array with no initial value",
                ));
            }
        }
    };
    for (index, item) in items {
        accumulator = call_function(
            &callback,
            vec![
                accumulator,
                item,
                RuntimeValue::Number(index as f64),
                receiver.clone(),
            ],
            ctx,
        )?;
    }
    Ok(accumulator)
}

fn array_index_of(
    receiver: &RuntimeValue,
    args: &[RuntimeValue],
    _ctx: &mut Context<'_>,
) -> Result<RuntimeValue, RuntimeError> {
    let needle = arg(args, 0);
    let position = array_of(receiver)?
        .borrow()
        .iter()
        .position(|item| item.strict_equals(&needle));
    Ok(RuntimeValue::Number(position.map_or(-1.0, |i| i as f64)))
}

fn array_includes(
    receiver: &RuntimeValue,
    args: &[RuntimeValue],
    _ctx: &mut Context<'_>,
) -> Result<RuntimeValue, RuntimeError> {
    let needle = arg(args, 0);
    let found = array_of(receiver)?.borrow().iter().any(|item| {
        item.strict_equals(&needle)
            || matches!((item, &needle), (RuntimeValue::Number(a), RuntimeValue::Number(b)) if a.is_nan() && b.is_nan())
    });
    Ok(RuntimeValue::Boolean(found))
}

/// Reverses in place and returns the same array.
fn array_reverse(
    receiver: &RuntimeValue,
    _args: &[RuntimeValue],
    _ctx: &mut Context<'_>,
) -> Result<RuntimeValue, RuntimeError> {
    array_of(receiver)?.borrow_mut().reverse();
    Ok(receiver.clone())
}

// --- String methods ---

fn string_split(
    receiver: &RuntimeValue,
    args: &[RuntimeValue],
    _ctx: &mut Context<'_>,
) -> Result<RuntimeValue, RuntimeError> {
    let s = string_of(receiver)?;
    let parts: Vec<RuntimeValue> = match arg(args, 0) {
        RuntimeValue::Undefined => vec![RuntimeValue::string(s)],
        separator => {
            let separator = separator.to_display_string();
            if separator.is_empty() {
                s.chars().map(|c| RuntimeValue::string(c)).collect()
            } else {
                s.split(separator.as_str())
                    .map(|part| RuntimeValue::string(part))
                    .collect()
            }
        }
    };
    Ok(RuntimeValue::array(parts))
}

fn string_slice(
    receiver: &RuntimeValue,
    args: &[RuntimeValue],
    _ctx: &mut Context<'_>,
) -> Result<RuntimeValue, RuntimeError> {
    let chars: Vec<char> = string_of(receiver)?.chars().collect();
    let start = relative_index(&arg(args, 0), chars.len(), 0);
    let end = relative_index(&arg(args, 1), chars.len(), chars.len());
    let slice: String = if start < end {
        chars[start..end].iter().collect()
    } else {
        String::new()
    };
    Ok(RuntimeValue::String(slice))
}

fn string_index_of(
    receiver: &RuntimeValue,
    args: &[RuntimeValue],
    _ctx: &mut Context<'_>,
) -> Result<RuntimeValue, RuntimeError> {
    let s = string_of(receiver)?;
    let needle = arg(args, 0).to_display_string();
    let position = s
        .find(needle.as_str())
        .map_or(-1.0, |byte| s[..byte].chars().count() as f64);
    Ok(RuntimeValue::Number(position))
}

fn string_includes(
    receiver: &RuntimeValue,
    args: &[RuntimeValue],
    _ctx: &mut Context<'_>,
) -> Result<RuntimeValue, RuntimeError> {
    let s = string_of(receiver)?;
    let needle = arg(args, 0).to_display_string();
    Ok(RuntimeValue::Boolean(s.contains(needle.as_str())))
}

fn string_to_upper_case(
    receiver: &RuntimeValue,
    _args: &[RuntimeValue],
    _ctx: &mut Context<'_>,
) -> Result<RuntimeValue, RuntimeError> {
    Ok(RuntimeValue::String(string_of(receiver)?.to_uppercase()))
}

fn string_to_lower_case(
    receiver: &RuntimeValue,
    _args: &[RuntimeValue],
    _ctx: &mut Context<'_>,
) -> Result<RuntimeValue, RuntimeError> {
    Ok(RuntimeValue::String(string_of(receiver)?.to_lowercase()))
}

fn string_trim(
    receiver: &RuntimeValue,
    _args: &[RuntimeValue],
    _ctx: &mut Context<'_>,
) -> Result<RuntimeValue, RuntimeError> {
    Ok(RuntimeValue::string(string_of(receiver)?.trim()))
}

fn string_char_at(
    receiver: &RuntimeValue,
    args: &[RuntimeValue],
    _ctx: &mut Context<'_>,
) -> Result<RuntimeValue, RuntimeError> {
    let s = string_of(receiver)?;
    let index = match arg(args, 0) {
        RuntimeValue::Undefined => 0.0,
        other => other.to_number(),
    };
    let c = if index >= 0.0 && index.fract() == 0.0 {
        s.chars().nth(index as usize)
    } else {
        None
    };
    Ok(RuntimeValue::String(c.map(String::from).unwrap_or_default()))
}

// --- Number methods ---

fn number_to_fixed(
    receiver: &RuntimeValue,
    args: &[RuntimeValue],
    _ctx: &mut Context<'_>,
) -> Result<RuntimeValue, RuntimeError> {
    let n = receiver.to_number();
    let digits = match arg(args, 0) {
        RuntimeValue::Undefined => 0.0,
        other => other.to_number(),
    };
    if !(0.0..=100.0).contains(&digits) {
        return Err(RuntimeError::Range(
            "toFixed() digits argument must be between 0 and 100".to_string(),
        ));
    }
    if !n.is_finite() {
        return Ok(RuntimeValue::String(format_number(n)));
    }
    Ok(RuntimeValue::String(format!("{:.*}", digits as usize, n)))
}

fn value_to_string(
    receiver: &RuntimeValue,
    _args: &[RuntimeValue],
    _ctx: &mut Context<'_>,
) -> Result<RuntimeValue, RuntimeError> {
    Ok(RuntimeValue::String(receiver.to_display_string()))
}

// --- Function methods ---

/// `f.apply(thisArg, [args])`; `thisArg` is ignored.
fn function_apply(
    receiver: &RuntimeValue,
    args: &[RuntimeValue],
    ctx: &mut Context<'_>,
) -> Result<RuntimeValue, RuntimeError> {
    let list = arg(args, 1);
    let arguments = match &list {
        RuntimeValue::Array(items) => items.borrow().clone(),
        RuntimeValue::Undefined | RuntimeValue::Null => Vec::new(),
        other => {
            return Err(RuntimeError::type_error(format!(
                "{} is not an array",
                inspect(other)
            )));
        }
    };
    call_function(receiver, arguments, ctx)
}

/// `f.call(thisArg, ...args)`; `thisArg` is ignored.
fn function_call(
    receiver: &RuntimeValue,
    args: &[RuntimeValue],
    ctx: &mut Context<'_>,
) -> Result<RuntimeValue, RuntimeError> {
    let arguments = args.get(1..).map(<[RuntimeValue]>::to_vec).unwrap_or_default();
    call_function(receiver, arguments, ctx)
}
