pub mod comment;
pub mod expression;
pub mod parser;
pub mod statement;

use crate::comment::Comment;
use crate::statement::Statement;

/// A parsed script.
#[derive(Debug, Clone)]
pub struct Program {
    /// Top-level statements in source order.
    pub statements: Vec<Statement>,
    /// Every comment the lexer saw, block and line, in source order.
    pub comments: Vec<Comment>,
    /// The source file ID (for error reporting with codespan-reporting).
    pub source_id: usize,
}

impl Program {
    /// Iterate over the block comments only, in source order.
    pub fn block_comments(&self) -> impl Iterator<Item = &Comment> {
        self.comments.iter().filter(|c| c.is_block())
    }
}
