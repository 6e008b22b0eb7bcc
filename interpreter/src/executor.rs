use std::rc::Rc;

use script::Program;
use script::expression::FunctionBody;
use script::statement::{DeclarationKind, Statement};

use crate::context::Context;
use crate::environment::Environment;
use crate::error::RuntimeError;
use crate::evaluator::{evaluate, make_closure};
use crate::runtime_value::{Closure, RuntimeValue};

/// How a statement finished.
#[derive(Debug)]
pub enum Completion {
    /// Ran to the end; carries the value of the last value-producing statement.
    Normal(Option<RuntimeValue>),
    Return(RuntimeValue),
    Break,
    Continue,
}

/// Run a whole program in `env` and return its completion value.
pub fn execute_program(
    program: &Program,
    env: &Environment,
    ctx: &mut Context<'_>,
) -> Result<RuntimeValue, RuntimeError> {
    hoist_vars(&program.statements, env);
    match execute_body(&program.statements, env, ctx)? {
        Completion::Normal(value) => Ok(value.unwrap_or(RuntimeValue::Undefined)),
        Completion::Return(value) => Ok(value),
        // The parser rejects break/continue outside loops.
        Completion::Break | Completion::Continue => Ok(RuntimeValue::Undefined),
    }
}

/// Execute a statement list in `env`, after hoisting its function declarations.
pub fn execute_body(
    statements: &[Statement],
    env: &Environment,
    ctx: &mut Context<'_>,
) -> Result<Completion, RuntimeError> {
    for statement in statements {
        if let Statement::Function(literal) = statement {
            if let Some(name) = &literal.name {
                env.declare(name, make_closure(literal, env));
            }
        }
    }

    let mut last = None;
    for statement in statements {
        match execute_statement(statement, env, ctx)? {
            Completion::Normal(Some(value)) => last = Some(value),
            Completion::Normal(None) => {}
            other => return Ok(other),
        }
    }
    Ok(Completion::Normal(last))
}

fn execute_statement(
    statement: &Statement,
    env: &Environment,
    ctx: &mut Context<'_>,
) -> Result<Completion, RuntimeError> {
    match statement {
        Statement::Expression { value, .. } => {
            Ok(Completion::Normal(Some(evaluate(value, env, ctx)?)))
        }

        Statement::Declaration {
            kind, declarators, ..
        } => {
            for (name, init) in declarators {
                let value = match init {
                    Some(expr) => Some(evaluate(expr, env, ctx)?),
                    None => None,
                };
                match kind {
                    DeclarationKind::Var => env.declare_var(name, value),
                    DeclarationKind::Let | DeclarationKind::Const => {
                        env.declare(name, value.unwrap_or(RuntimeValue::Undefined))
                    }
                }
            }
            Ok(Completion::Normal(None))
        }

        // Bound by `execute_body` before the list runs.
        Statement::Function(_) | Statement::Empty => Ok(Completion::Normal(None)),

        Statement::Return { value, .. } => {
            let value = match value {
                Some(expr) => evaluate(expr, env, ctx)?,
                None => RuntimeValue::Undefined,
            };
            Ok(Completion::Return(value))
        }

        Statement::If {
            condition,
            consequent,
            alternate,
        } => {
            if evaluate(condition, env, ctx)?.is_truthy() {
                execute_statement(consequent, env, ctx)
            } else if let Some(alternate) = alternate {
                execute_statement(alternate, env, ctx)
            } else {
                Ok(Completion::Normal(None))
            }
        }

        Statement::While { condition, body } => {
            let mut last = None;
            while evaluate(condition, env, ctx)?.is_truthy() {
                match execute_statement(body, env, ctx)? {
                    Completion::Break => break,
                    Completion::Normal(value) => last = value.or(last),
                    Completion::Continue => {}
                    completion @ Completion::Return(_) => return Ok(completion),
                }
            }
            Ok(Completion::Normal(last))
        }

        Statement::For {
            init,
            condition,
            update,
            body,
        } => {
            let loop_env = env.child();
            if let Some(init) = init {
                execute_statement(init, &loop_env, ctx)?;
            }
            let mut last = None;
            loop {
                if let Some(condition) = condition {
                    if !evaluate(condition, &loop_env, ctx)?.is_truthy() {
                        break;
                    }
                }
                match execute_statement(body, &loop_env, ctx)? {
                    Completion::Break => break,
                    Completion::Normal(value) => last = value.or(last),
                    Completion::Continue => {}
                    completion @ Completion::Return(_) => return Ok(completion),
                }
                if let Some(update) = update {
                    evaluate(update, &loop_env, ctx)?;
                }
            }
            Ok(Completion::Normal(last))
        }

        Statement::ForIn {
            kind,
            variable,
            object,
            body,
        } => {
            let target = evaluate(object, env, ctx)?;
            let mut last = None;
            for key in enumerable_keys(&target) {
                let iteration_env = match kind {
                    Some(DeclarationKind::Var) => {
                        env.declare_var(variable, Some(RuntimeValue::String(key)));
                        env.clone()
                    }
                    Some(DeclarationKind::Let | DeclarationKind::Const) => {
                        let scope = env.child();
                        scope.declare(variable, RuntimeValue::String(key));
                        scope
                    }
                    None => {
                        env.assign(variable, RuntimeValue::String(key));
                        env.clone()
                    }
                };
                match execute_statement(body, &iteration_env, ctx)? {
                    Completion::Break => break,
                    Completion::Normal(value) => last = value.or(last),
                    Completion::Continue => {}
                    completion @ Completion::Return(_) => return Ok(completion),
                }
            }
            Ok(Completion::Normal(last))
        }

        Statement::Break => Ok(Completion::Break),
        Statement::Continue => Ok(Completion::Continue),

        Statement::Throw { value, .. } => Err(thrown(evaluate(value, env, ctx)?)),

        Statement::Block(statements) => execute_body(statements, &env.child(), ctx),
    }
}

/// Keys visited by `for ... in`, in order.
fn enumerable_keys(target: &RuntimeValue) -> Vec<String> {
    match target {
        RuntimeValue::Object(entries) => entries.borrow().keys().cloned().collect(),
        RuntimeValue::Array(items) => (0..items.borrow().len()).map(|i| i.to_string()).collect(),
        RuntimeValue::String(s) => (0..s.chars().count()).map(|i| i.to_string()).collect(),
        _ => Vec::new(),
    }
}

/// The error raised by `throw value`. Objects with a `message` (such as
/// those made by `Error(...)`) supply their own name and message.
fn thrown(value: RuntimeValue) -> RuntimeError {
    if let RuntimeValue::Object(entries) = &value {
        let entries = entries.borrow();
        if let Some(RuntimeValue::String(message)) = entries.get("message") {
            let name = match entries.get("name") {
                Some(RuntimeValue::String(name)) if !name.is_empty() => name.clone(),
                _ => "Error".to_string(),
            };
            return RuntimeError::Thrown {
                name,
                message: message.clone(),
            };
        }
    }
    RuntimeError::error(value.to_display_string())
}

/// Declare every `var` in a function body up front (as `undefined`), so
/// reading one before its declaration is not a ReferenceError. Nested
/// function bodies are skipped.
fn hoist_vars(statements: &[Statement], env: &Environment) {
    for statement in statements {
        match statement {
            Statement::Declaration {
                kind: DeclarationKind::Var,
                declarators,
                ..
            } => {
                for (name, _) in declarators {
                    env.declare_var(name, None);
                }
            }
            Statement::If {
                consequent,
                alternate,
                ..
            } => {
                hoist_vars(std::slice::from_ref(consequent.as_ref()), env);
                if let Some(alternate) = alternate {
                    hoist_vars(std::slice::from_ref(alternate.as_ref()), env);
                }
            }
            Statement::While { body, .. } => hoist_vars(std::slice::from_ref(body.as_ref()), env),
            Statement::For { init, body, .. } => {
                if let Some(init) = init {
                    hoist_vars(std::slice::from_ref(init.as_ref()), env);
                }
                hoist_vars(std::slice::from_ref(body.as_ref()), env);
            }
            Statement::ForIn {
                kind: Some(DeclarationKind::Var),
                variable,
                body,
                ..
            } => {
                env.declare_var(variable, None);
                hoist_vars(std::slice::from_ref(body.as_ref()), env);
            }
            Statement::ForIn { body, .. } => hoist_vars(std::slice::from_ref(body.as_ref()), env),
            Statement::Block(inner) => hoist_vars(inner, env),
            _ => {}
        }
    }
}

/// Call any callable value with already-evaluated arguments.
pub fn call_function(
    function: &RuntimeValue,
    args: Vec<RuntimeValue>,
    ctx: &mut Context<'_>,
) -> Result<RuntimeValue, RuntimeError> {
    ctx.enter_call()?;
    let result = match function {
        RuntimeValue::Function(closure) => call_closure(closure, args, ctx),
        RuntimeValue::Native(native) => (native.function)(&args, ctx),
        RuntimeValue::Method(method) => (method.function)(&method.receiver, &args, ctx),
        other => Err(RuntimeError::type_error(format!(
            "{} is not a function",
            crate::inspect::inspect(other)
        ))),
    };
    ctx.exit_call();
    result
}

fn call_closure(
    closure: &Rc<Closure>,
    args: Vec<RuntimeValue>,
    ctx: &mut Context<'_>,
) -> Result<RuntimeValue, RuntimeError> {
    let literal = &closure.literal;
    let scope = closure.scope.function_scope();

    // A named function expression can refer to itself.
    if let Some(name) = &literal.name {
        scope.declare(name, RuntimeValue::Function(Rc::clone(closure)));
    }
    for (i, param) in literal.params.iter().enumerate() {
        scope.declare(param, args.get(i).cloned().unwrap_or(RuntimeValue::Undefined));
    }
    scope.declare("arguments", RuntimeValue::array(args));

    match &literal.body {
        FunctionBody::Expression(expr) => evaluate(expr, &scope, ctx),
        FunctionBody::Block(statements) => {
            hoist_vars(statements, &scope);
            match execute_body(statements, &scope, ctx)? {
                Completion::Return(value) => Ok(value),
                _ => Ok(RuntimeValue::Undefined),
            }
        }
    }
}
