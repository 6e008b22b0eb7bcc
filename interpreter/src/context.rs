use std::io::Write;

use crate::error::RuntimeError;

pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Per-evaluation state threaded through the evaluator: where `print`
/// writes, and how deep the call stack currently is.
pub struct Context<'a> {
    pub output: &'a mut dyn Write,
    depth: usize,
    max_depth: usize,
}

impl<'a> Context<'a> {
    pub fn new(output: &'a mut dyn Write, max_depth: usize) -> Self {
        Context {
            output,
            depth: 0,
            max_depth,
        }
    }

    /// Enter a function call; fails once the call depth exceeds the limit.
    pub fn enter_call(&mut self) -> Result<(), RuntimeError> {
        if self.depth >= self.max_depth {
            return Err(RuntimeError::stack_overflow());
        }
        self.depth += 1;
        Ok(())
    }

    pub fn exit_call(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    pub fn depth(&self) -> usize {
        self.depth
    }
}
