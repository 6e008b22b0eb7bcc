pub mod error;
mod expression;
mod lexer;
mod statement;

pub use error::ParseError;

use std::ops::Range;

use crate::Program;
use crate::expression::Expression;
use crate::parser::lexer::{Spanned, Token};

/// Deepest nesting of statements and expressions a source may use.
pub const MAX_NESTING: usize = 64;

/// Parser entry point.
pub struct Parser {
    source: String,
    file_id: usize,
}

impl Parser {
    pub fn new(source: String, file_id: usize) -> Self {
        Parser { source, file_id }
    }

    /// Parse the source into a complete Program, comments included.
    ///
    /// Lexical errors are all reported together; parsing stops at the first
    /// syntax error.
    pub fn parse(&self) -> Result<Program, Vec<ParseError>> {
        let lexed = lexer::tokenize(&self.source, self.file_id);
        if !lexed.errors.is_empty() {
            return Err(lexed.errors);
        }

        let mut cursor = TokenCursor::new(lexed.tokens, self.file_id);
        let statements = cursor
            .parse_statements_until(&Token::Eof)
            .map_err(|e| vec![e])?;

        Ok(Program {
            statements,
            comments: lexed.comments,
            source_id: self.file_id,
        })
    }

    /// Parse the source as exactly one expression, optionally followed by `;`.
    pub fn parse_expression(&self) -> Result<Expression, Vec<ParseError>> {
        let lexed = lexer::tokenize(&self.source, self.file_id);
        if !lexed.errors.is_empty() {
            return Err(lexed.errors);
        }

        let mut cursor = TokenCursor::new(lexed.tokens, self.file_id);
        let expression = cursor.parse_expression().map_err(|e| vec![e])?;
        cursor.eat(&Token::Semicolon);
        if !cursor.at_end() {
            return Err(vec![cursor.error("expected end of input after expression")]);
        }
        Ok(expression)
    }
}

// ---------------------------------------------------------------------------
// Token cursor shared by the statement and expression parsers
// ---------------------------------------------------------------------------

pub(crate) struct TokenCursor {
    /// Always ends with `Token::Eof`.
    tokens: Vec<Spanned>,
    pos: usize,
    file_id: usize,
    /// Number of enclosing loops in the current function body.
    loop_depth: usize,
    /// Inside a function body, where `return` is allowed.
    in_function: bool,
    /// Statements and expressions currently being parsed inside one another.
    nesting: usize,
}

impl TokenCursor {
    fn new(tokens: Vec<Spanned>, file_id: usize) -> Self {
        TokenCursor {
            tokens,
            pos: 0,
            file_id,
            loop_depth: 0,
            in_function: false,
            nesting: 0,
        }
    }

    /// Run `parse` one level deeper, failing past [`MAX_NESTING`].
    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        if self.nesting >= MAX_NESTING {
            return Err(ParseError::error(
                format!("nesting deeper than {} levels", MAX_NESTING),
                self.span(),
                self.file_id,
            ));
        }
        self.nesting += 1;
        let result = parse(self);
        self.nesting -= 1;
        result
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos].token
    }

    /// Look ahead `offset` tokens; clamps to the trailing `Eof`.
    fn peek_at(&self, offset: usize) -> &Token {
        let idx = (self.pos + offset).min(self.tokens.len() - 1);
        &self.tokens[idx].token
    }

    fn span(&self) -> Range<usize> {
        self.tokens[self.pos].span.clone()
    }

    /// End offset of the most recently consumed token.
    fn previous_end(&self) -> usize {
        if self.pos == 0 {
            0
        } else {
            self.tokens[self.pos - 1].span.end
        }
    }

    fn newline_before(&self) -> bool {
        self.tokens[self.pos].newline_before
    }

    fn advance(&mut self) -> Spanned {
        let spanned = self.tokens[self.pos].clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        spanned
    }

    fn check(&self, token: &Token) -> bool {
        self.peek() == token
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn at_end(&self) -> bool {
        matches!(self.peek(), Token::Eof)
    }

    fn expect(&mut self, token: &Token, what: &str) -> Result<Range<usize>, ParseError> {
        if self.check(token) {
            Ok(self.advance().span)
        } else {
            Err(self.error(&format!("expected {}", what)))
        }
    }

    fn expect_ident(&mut self) -> Result<String, ParseError> {
        if let Token::Ident(name) = self.peek() {
            let name = name.clone();
            self.advance();
            Ok(name)
        } else {
            Err(self.error("expected an identifier"))
        }
    }

    /// Error at the current token: "<context>, found <token>".
    fn error(&self, context: &str) -> ParseError {
        ParseError::error(
            format!("{}, found {}", context, self.peek().describe()),
            self.span(),
            self.file_id,
        )
    }
}
