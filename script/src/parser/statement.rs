use crate::parser::TokenCursor;
use crate::parser::error::ParseError;
use crate::parser::lexer::Token;
use crate::statement::{DeclarationKind, Statement};

impl TokenCursor {
    /// Statements up to (not including) `end`, or to end of input.
    pub(crate) fn parse_statements_until(
        &mut self,
        end: &Token,
    ) -> Result<Vec<Statement>, ParseError> {
        let mut statements = Vec::new();
        while !self.check(end) && !self.at_end() {
            statements.push(self.parse_statement()?);
        }
        Ok(statements)
    }

    fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        self.nested(Self::statement)
    }

    fn statement(&mut self) -> Result<Statement, ParseError> {
        match self.peek() {
            Token::Semicolon => {
                self.advance();
                Ok(Statement::Empty)
            }
            Token::LBrace => {
                self.advance();
                let body = self.parse_statements_until(&Token::RBrace)?;
                self.expect(&Token::RBrace, "`}`")?;
                Ok(Statement::Block(body))
            }
            Token::Var | Token::Let | Token::Const => {
                let statement = self.parse_declaration()?;
                self.end_statement()?;
                Ok(statement)
            }
            Token::Function if matches!(self.peek_at(1), Token::Ident(_)) => {
                Ok(Statement::Function(self.parse_function(true)?))
            }
            Token::Return => self.parse_return(),
            Token::If => self.parse_if(),
            Token::While => {
                self.advance();
                self.expect(&Token::LParen, "`(` after `while`")?;
                let condition = self.parse_expression()?;
                self.expect(&Token::RParen, "`)`")?;
                let body = self.parse_loop_body()?;
                Ok(Statement::While {
                    condition,
                    body: Box::new(body),
                })
            }
            Token::For => self.parse_for(),
            Token::Break | Token::Continue => {
                let is_break = self.check(&Token::Break);
                if self.loop_depth == 0 {
                    let keyword = if is_break { "break" } else { "continue" };
                    return Err(ParseError::error(
                        format!("`{}` outside of a loop", keyword),
                        self.span(),
                        self.file_id,
                    ));
                }
                self.advance();
                self.end_statement()?;
                Ok(if is_break {
                    Statement::Break
                } else {
                    Statement::Continue
                })
            }
            Token::Throw => {
                let start = self.advance().span.start;
                if self.newline_before() || self.at_end() {
                    return Err(self.error("expected an expression after `throw`"));
                }
                let value = self.parse_expression()?;
                let span = start..self.previous_end();
                self.end_statement()?;
                Ok(Statement::Throw { value, span })
            }
            _ => {
                let start = self.span().start;
                let value = self.parse_expression()?;
                let span = start..self.previous_end();
                self.end_statement()?;
                Ok(Statement::Expression { value, span })
            }
        }
    }

    /// `var|let|const name [= value], ...` without the terminator.
    fn parse_declaration(&mut self) -> Result<Statement, ParseError> {
        let start = self.span().start;
        let kind = match self.advance().token {
            Token::Let => DeclarationKind::Let,
            Token::Const => DeclarationKind::Const,
            _ => DeclarationKind::Var,
        };

        let mut declarators = Vec::new();
        loop {
            let name_span = self.span();
            let name = self.expect_ident()?;
            let init = if self.eat(&Token::Eq) {
                Some(self.parse_expression()?)
            } else if kind == DeclarationKind::Const {
                return Err(ParseError::error(
                    format!("missing initializer in const declaration of `{}`", name),
                    name_span,
                    self.file_id,
                ));
            } else {
                None
            };
            declarators.push((name, init));
            if !self.eat(&Token::Comma) {
                break;
            }
        }

        Ok(Statement::Declaration {
            kind,
            declarators,
            span: start..self.previous_end(),
        })
    }

    fn parse_return(&mut self) -> Result<Statement, ParseError> {
        let span = self.span();
        if !self.in_function {
            return Err(ParseError::error(
                "`return` outside of a function",
                span,
                self.file_id,
            ));
        }
        self.advance();
        // `return` followed by a line break returns undefined.
        let value = if self.at_statement_end() {
            None
        } else {
            Some(self.parse_expression()?)
        };
        let span = span.start..self.previous_end();
        self.end_statement()?;
        Ok(Statement::Return { value, span })
    }

    fn parse_if(&mut self) -> Result<Statement, ParseError> {
        self.advance();
        self.expect(&Token::LParen, "`(` after `if`")?;
        let condition = self.parse_expression()?;
        self.expect(&Token::RParen, "`)`")?;
        let consequent = self.parse_statement()?;
        let alternate = if self.eat(&Token::Else) {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };
        Ok(Statement::If {
            condition,
            consequent: Box::new(consequent),
            alternate,
        })
    }

    /// `for (init; condition; update) body` or `for ([var] name in object) body`.
    fn parse_for(&mut self) -> Result<Statement, ParseError> {
        self.advance();
        self.expect(&Token::LParen, "`(` after `for`")?;

        let declares = matches!(self.peek(), Token::Var | Token::Let | Token::Const);
        let name_offset = if declares { 1 } else { 0 };
        if matches!(self.peek_at(name_offset), Token::Ident(_))
            && matches!(self.peek_at(name_offset + 1), Token::In)
        {
            let kind = if declares {
                match self.advance().token {
                    Token::Let => Some(DeclarationKind::Let),
                    Token::Const => Some(DeclarationKind::Const),
                    _ => Some(DeclarationKind::Var),
                }
            } else {
                None
            };
            let variable = self.expect_ident()?;
            self.expect(&Token::In, "`in`")?;
            let object = self.parse_expression()?;
            self.expect(&Token::RParen, "`)`")?;
            let body = self.parse_loop_body()?;
            return Ok(Statement::ForIn {
                kind,
                variable,
                object,
                body: Box::new(body),
            });
        }

        let init = if self.check(&Token::Semicolon) {
            None
        } else if declares {
            Some(Box::new(self.parse_declaration()?))
        } else {
            let start = self.span().start;
            let value = self.parse_expression()?;
            Some(Box::new(Statement::Expression {
                value,
                span: start..self.previous_end(),
            }))
        };
        self.expect(&Token::Semicolon, "`;` after loop initializer")?;

        let condition = if self.check(&Token::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(&Token::Semicolon, "`;` after loop condition")?;

        let update = if self.check(&Token::RParen) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(&Token::RParen, "`)`")?;

        let body = self.parse_loop_body()?;
        Ok(Statement::For {
            init,
            condition,
            update,
            body: Box::new(body),
        })
    }

    fn parse_loop_body(&mut self) -> Result<Statement, ParseError> {
        self.loop_depth += 1;
        let body = self.parse_statement();
        self.loop_depth -= 1;
        body
    }

    /// A statement ends at `;`, before `}`, at end of input, or at a line break.
    fn at_statement_end(&self) -> bool {
        matches!(self.peek(), Token::Semicolon | Token::RBrace | Token::Eof) || self.newline_before()
    }

    fn end_statement(&mut self) -> Result<(), ParseError> {
        if self.eat(&Token::Semicolon) || self.at_statement_end() {
            Ok(())
        } else {
            Err(self.error("expected `;` or a line break"))
        }
    }
}
