use std::io::{self, Write};

use script::Program;
use script::parser::{ParseError, Parser};
use tracing::debug;

use crate::builtins;
use crate::context::{Context, DEFAULT_MAX_DEPTH};
use crate::environment::Environment;
use crate::error::RuntimeError;
use crate::evaluator::evaluate;
use crate::executor::execute_program;
use crate::runtime_value::RuntimeValue;

/// An evaluation session: one global scope that library code, example code
/// and expectations all run in, in the order they are given.
///
/// Text passed to a session is executed with the full power of the script
/// language and nothing more. The language has no file, network or process
/// access; `print` writes to the session's output sink. There is no further
/// sandbox, so only evaluate text from sources you would run anyway.
pub struct Session {
    globals: Environment,
    output: Box<dyn Write>,
    max_depth: usize,
}

impl Default for Session {
    fn default() -> Self {
        Session::new()
    }
}

impl Session {
    /// A session whose `print` writes to stdout.
    pub fn new() -> Self {
        Session::with_output(Box::new(io::stdout()))
    }

    pub fn with_output(output: Box<dyn Write>) -> Self {
        let globals = Environment::global();
        builtins::install(&globals);
        Session {
            globals,
            output,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Limit on nested function calls before a RangeError.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn globals(&self) -> &Environment {
        &self.globals
    }

    /// Execute an already parsed program in the global scope.
    pub fn load(&mut self, program: &Program) -> Result<RuntimeValue, RuntimeError> {
        debug!(
            statements = program.statements.len(),
            "loading program into session"
        );
        let mut ctx = Context::new(&mut *self.output, self.max_depth);
        let result = execute_program(program, &self.globals, &mut ctx);
        self.flush();
        result
    }

    /// Parse and run a sequence of statements; the result is the value of the
    /// last value-producing statement, or `undefined`.
    pub fn eval(&mut self, text: &str) -> Result<RuntimeValue, RuntimeError> {
        let program = Parser::new(text.to_string(), 0)
            .parse()
            .map_err(syntax_error)?;
        self.load(&program)
    }

    /// Parse and evaluate a single expression. Blank text is `undefined`.
    pub fn eval_expression(&mut self, text: &str) -> Result<RuntimeValue, RuntimeError> {
        if text.trim().is_empty() {
            return Ok(RuntimeValue::Undefined);
        }
        let expression = Parser::new(text.to_string(), 0)
            .parse_expression()
            .map_err(syntax_error)?;
        let mut ctx = Context::new(&mut *self.output, self.max_depth);
        let result = evaluate(&expression, &self.globals, &mut ctx);
        self.flush();
        result
    }

    fn flush(&mut self) {
        if let Err(e) = self.output.flush() {
            debug!(error = %e, "failed to flush session output");
        }
    }
}

fn syntax_error(errors: Vec<ParseError>) -> RuntimeError {
    let message = errors
        .first()
        .map(|e| e.message.clone())
        .unwrap_or_else(|| "invalid syntax".to_string());
    RuntimeError::Syntax(message)
}
