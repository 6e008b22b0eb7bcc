use std::rc::Rc;

use indexmap::IndexMap;
use script::expression::{
    AssignmentOperator, BinaryOperator, Expression, FunctionLiteral, Property, UnaryOperator,
    UpdateOperator,
};

use crate::builtins;
use crate::context::Context;
use crate::environment::Environment;
use crate::error::RuntimeError;
use crate::executor::call_function;
use crate::runtime_value::{Closure, MAX_ARRAY_LENGTH, RuntimeValue, format_number};

/// Evaluate an Expression AST node to produce a RuntimeValue.
pub fn evaluate(
    expr: &Expression,
    env: &Environment,
    ctx: &mut Context<'_>,
) -> Result<RuntimeValue, RuntimeError> {
    match expr {
        // --- Literals ---
        Expression::NumberLiteral(n) => Ok(RuntimeValue::Number(*n)),
        Expression::StringLiteral(s) => Ok(RuntimeValue::String(s.clone())),
        Expression::BooleanLiteral(b) => Ok(RuntimeValue::Boolean(*b)),
        Expression::NullLiteral => Ok(RuntimeValue::Null),
        Expression::UndefinedLiteral => Ok(RuntimeValue::Undefined),
        Expression::ArrayLiteral(elements) => {
            let mut items = Vec::with_capacity(elements.len());
            for element in elements {
                items.push(evaluate(element, env, ctx)?);
            }
            Ok(RuntimeValue::array(items))
        }
        Expression::ObjectLiteral(properties) => {
            let mut entries = IndexMap::with_capacity(properties.len());
            for (key, value) in properties {
                entries.insert(key.clone(), evaluate(value, env, ctx)?);
            }
            Ok(RuntimeValue::object(entries))
        }
        Expression::Function(literal) => Ok(make_closure(literal, env)),

        // --- References ---
        Expression::Identifier(name, _) => env
            .get(name)
            .ok_or_else(|| RuntimeError::UndefinedVariable(name.clone())),
        Expression::Member { object, property } => {
            let target = evaluate(object, env, ctx)?;
            let key = property_key(property, env, ctx)?;
            get_property(&target, &key)
        }

        Expression::Call {
            callee, arguments, ..
        } => {
            let function = evaluate(callee, env, ctx)?;
            let mut args = Vec::with_capacity(arguments.len());
            for argument in arguments {
                args.push(evaluate(argument, env, ctx)?);
            }
            if !function.is_callable() {
                return Err(RuntimeError::type_error(format!(
                    "{} is not a function",
                    callee.describe()
                )));
            }
            call_function(&function, args, ctx)
        }

        // --- Operations ---
        Expression::UnaryOperation { operator, operand } => {
            // `typeof missing` is "undefined", not a ReferenceError.
            if let (UnaryOperator::TypeOf, Expression::Identifier(name, _)) =
                (operator, operand.as_ref())
            {
                let value = env.get(name).unwrap_or(RuntimeValue::Undefined);
                return Ok(RuntimeValue::string(value.type_of()));
            }
            let value = evaluate(operand, env, ctx)?;
            Ok(match operator {
                UnaryOperator::Negation => RuntimeValue::Number(-value.to_number()),
                UnaryOperator::Plus => RuntimeValue::Number(value.to_number()),
                UnaryOperator::LogicalNot => RuntimeValue::Boolean(!value.is_truthy()),
                UnaryOperator::TypeOf => RuntimeValue::string(value.type_of()),
            })
        }

        Expression::BinaryOperation {
            operator,
            left,
            right,
        } => {
            let l = evaluate(left, env, ctx)?;
            match operator {
                BinaryOperator::LogicalAnd if !l.is_truthy() => return Ok(l),
                BinaryOperator::LogicalOr if l.is_truthy() => return Ok(l),
                BinaryOperator::LogicalAnd | BinaryOperator::LogicalOr => {
                    return evaluate(right, env, ctx);
                }
                _ => {}
            }
            let r = evaluate(right, env, ctx)?;
            Ok(eval_binary_op(operator, &l, &r))
        }

        Expression::Conditional {
            condition,
            consequent,
            alternate,
        } => {
            if evaluate(condition, env, ctx)?.is_truthy() {
                evaluate(consequent, env, ctx)
            } else {
                evaluate(alternate, env, ctx)
            }
        }

        Expression::Assignment {
            operator,
            target,
            value,
        } => {
            let reference = resolve_reference(target, env, ctx)?;
            let value = match operator {
                AssignmentOperator::Assign => evaluate(value, env, ctx)?,
                AssignmentOperator::AddAssign => {
                    let current = reference.get(env)?;
                    let rhs = evaluate(value, env, ctx)?;
                    eval_binary_op(&BinaryOperator::Addition, &current, &rhs)
                }
                AssignmentOperator::SubtractAssign => {
                    let current = reference.get(env)?;
                    let rhs = evaluate(value, env, ctx)?;
                    eval_binary_op(&BinaryOperator::Subtraction, &current, &rhs)
                }
            };
            reference.set(env, value.clone())?;
            Ok(value)
        }

        Expression::Update {
            operator,
            prefix,
            target,
        } => {
            let reference = resolve_reference(target, env, ctx)?;
            let old = reference.get(env)?.to_number();
            let new = match operator {
                UpdateOperator::Increment => old + 1.0,
                UpdateOperator::Decrement => old - 1.0,
            };
            reference.set(env, RuntimeValue::Number(new))?;
            Ok(RuntimeValue::Number(if *prefix { new } else { old }))
        }
    }
}

pub(crate) fn make_closure(literal: &Rc<FunctionLiteral>, env: &Environment) -> RuntimeValue {
    RuntimeValue::Function(Rc::new(Closure {
        literal: Rc::clone(literal),
        scope: env.clone(),
    }))
}

/// The place an assignment or update writes to.
enum Reference<'e> {
    Variable(&'e str),
    Property { object: RuntimeValue, key: String },
}

fn resolve_reference<'e>(
    target: &'e Expression,
    env: &Environment,
    ctx: &mut Context<'_>,
) -> Result<Reference<'e>, RuntimeError> {
    match target {
        Expression::Identifier(name, _) => Ok(Reference::Variable(name)),
        Expression::Member { object, property } => {
            let object = evaluate(object, env, ctx)?;
            let key = property_key(property, env, ctx)?;
            Ok(Reference::Property { object, key })
        }
        _ => Err(RuntimeError::Syntax("invalid assignment target".to_string())),
    }
}

impl Reference<'_> {
    fn get(&self, env: &Environment) -> Result<RuntimeValue, RuntimeError> {
        match self {
            Reference::Variable(name) => env
                .get(name)
                .ok_or_else(|| RuntimeError::UndefinedVariable(name.to_string())),
            Reference::Property { object, key } => get_property(object, key),
        }
    }

    fn set(&self, env: &Environment, value: RuntimeValue) -> Result<(), RuntimeError> {
        match self {
            Reference::Variable(name) => {
                env.assign(name, value);
                Ok(())
            }
            Reference::Property { object, key } => set_property(object, key, value),
        }
    }
}

fn property_key(
    property: &Property,
    env: &Environment,
    ctx: &mut Context<'_>,
) -> Result<String, RuntimeError> {
    match property {
        Property::Named(name) => Ok(name.clone()),
        Property::Computed(expr) => Ok(match evaluate(expr, env, ctx)? {
            RuntimeValue::Number(n) => format_number(n),
            other => other.to_display_string(),
        }),
    }
}

/// `"3"` → 3; `"03"`, `"-1"` and `"1.5"` are not array indices.
fn array_index(key: &str) -> Option<usize> {
    let index: usize = key.parse().ok()?;
    (index.to_string() == key).then_some(index)
}

/// Read `target[key]`. Missing properties are `undefined`; reading from
/// `undefined` or `null` is a TypeError.
pub fn get_property(target: &RuntimeValue, key: &str) -> Result<RuntimeValue, RuntimeError> {
    let value = match target {
        RuntimeValue::Undefined | RuntimeValue::Null => {
            return Err(RuntimeError::type_error(format!(
                "cannot read properties of {} (reading '{}')",
                target.to_display_string(),
                key
            )));
        }
        RuntimeValue::Array(items) => {
            if key == "length" {
                return Ok(RuntimeValue::Number(items.borrow().len() as f64));
            }
            match array_index(key) {
                Some(index) => items.borrow().get(index).cloned(),
                None => builtins::method(target, key),
            }
        }
        RuntimeValue::String(s) => {
            if key == "length" {
                return Ok(RuntimeValue::Number(s.chars().count() as f64));
            }
            match array_index(key) {
                Some(index) => s.chars().nth(index).map(|c| RuntimeValue::string(c)),
                None => builtins::method(target, key),
            }
        }
        RuntimeValue::Object(entries) => entries.borrow().get(key).cloned(),
        RuntimeValue::Function(closure) if key == "length" => {
            Some(RuntimeValue::Number(closure.literal.params.len() as f64))
        }
        RuntimeValue::Function(_) | RuntimeValue::Native(_) | RuntimeValue::Method(_) => {
            if key == "name" {
                Some(RuntimeValue::string(target.function_name().unwrap_or_default()))
            } else {
                builtins::method(target, key)
            }
        }
        RuntimeValue::Boolean(_) | RuntimeValue::Number(_) => builtins::method(target, key),
    };
    Ok(value.unwrap_or(RuntimeValue::Undefined))
}

/// Write `target[key] = value`. Writes to primitives are ignored.
pub fn set_property(target: &RuntimeValue, key: &str, value: RuntimeValue) -> Result<(), RuntimeError> {
    match target {
        RuntimeValue::Undefined | RuntimeValue::Null => Err(RuntimeError::type_error(format!(
            "cannot set properties of {} (setting '{}')",
            target.to_display_string(),
            key
        ))),
        RuntimeValue::Array(items) => {
            if key == "length" {
                // Converted before borrowing: the value may be this very array.
                let n = value.to_number();
                if n < 0.0 || n.fract() != 0.0 || !n.is_finite() || n > MAX_ARRAY_LENGTH as f64 {
                    return Err(RuntimeError::Range("invalid array length".to_string()));
                }
                items.borrow_mut().resize(n as usize, RuntimeValue::Undefined);
            } else if let Some(index) = array_index(key) {
                if index >= MAX_ARRAY_LENGTH {
                    return Err(RuntimeError::Range(format!(
                        "array index {} is past the maximum length {}",
                        index, MAX_ARRAY_LENGTH
                    )));
                }
                let mut items = items.borrow_mut();
                if index >= items.len() {
                    items.resize(index + 1, RuntimeValue::Undefined);
                }
                items[index] = value;
            }
            Ok(())
        }
        RuntimeValue::Object(entries) => {
            entries.borrow_mut().insert(key.to_string(), value);
            Ok(())
        }
        _ => Ok(()),
    }
}

fn eval_binary_op(op: &BinaryOperator, left: &RuntimeValue, right: &RuntimeValue) -> RuntimeValue {
    match op {
        BinaryOperator::Addition => {
            if is_numeric_operand(left) && is_numeric_operand(right) {
                RuntimeValue::Number(left.to_number() + right.to_number())
            } else {
                RuntimeValue::String(format!(
                    "{}{}",
                    left.to_display_string(),
                    right.to_display_string()
                ))
            }
        }
        BinaryOperator::Subtraction => numeric_binop(left, right, |a, b| a - b),
        BinaryOperator::Multiplication => numeric_binop(left, right, |a, b| a * b),
        BinaryOperator::Division => numeric_binop(left, right, |a, b| a / b),
        BinaryOperator::Modulo => numeric_binop(left, right, |a, b| a % b),
        BinaryOperator::Equality => RuntimeValue::Boolean(left.loose_equals(right)),
        BinaryOperator::Inequality => RuntimeValue::Boolean(!left.loose_equals(right)),
        BinaryOperator::StrictEquality => RuntimeValue::Boolean(left.strict_equals(right)),
        BinaryOperator::StrictInequality => RuntimeValue::Boolean(!left.strict_equals(right)),
        BinaryOperator::GreaterThan => compare(left, right, |o| o.is_gt()),
        BinaryOperator::LessThan => compare(left, right, |o| o.is_lt()),
        BinaryOperator::GreaterThanOrEqual => compare(left, right, |o| o.is_ge()),
        BinaryOperator::LessThanOrEqual => compare(left, right, |o| o.is_le()),
        // Short-circuited in `evaluate`.
        BinaryOperator::LogicalAnd | BinaryOperator::LogicalOr => RuntimeValue::Undefined,
    }
}

/// Operands that `+` adds numerically rather than concatenating.
fn is_numeric_operand(value: &RuntimeValue) -> bool {
    matches!(
        value,
        RuntimeValue::Number(_)
            | RuntimeValue::Boolean(_)
            | RuntimeValue::Null
            | RuntimeValue::Undefined
    )
}

fn numeric_binop(
    left: &RuntimeValue,
    right: &RuntimeValue,
    f: impl Fn(f64, f64) -> f64,
) -> RuntimeValue {
    RuntimeValue::Number(f(left.to_number(), right.to_number()))
}

/// Strings compare lexicographically, everything else numerically; any
/// comparison involving NaN is false.
fn compare(
    left: &RuntimeValue,
    right: &RuntimeValue,
    f: impl Fn(std::cmp::Ordering) -> bool,
) -> RuntimeValue {
    let ordering = match (left, right) {
        (RuntimeValue::String(a), RuntimeValue::String(b)) => Some(a.cmp(b)),
        _ => left.to_number().partial_cmp(&right.to_number()),
    };
    RuntimeValue::Boolean(ordering.is_some_and(f))
}
