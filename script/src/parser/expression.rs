use std::rc::Rc;

use crate::expression::{
    AssignmentOperator, BinaryOperator, Expression, FunctionBody, FunctionLiteral, Property,
    UnaryOperator, UpdateOperator,
};
use crate::parser::TokenCursor;
use crate::parser::error::ParseError;
use crate::parser::lexer::Token;
use crate::statement::Statement;

/// Binding power of a binary operator token; higher binds tighter.
fn binary_operator(token: &Token) -> Option<(BinaryOperator, u8)> {
    let op = match token {
        Token::PipePipe => (BinaryOperator::LogicalOr, 1),
        Token::AmpAmp => (BinaryOperator::LogicalAnd, 2),
        Token::EqEq => (BinaryOperator::Equality, 3),
        Token::BangEq => (BinaryOperator::Inequality, 3),
        Token::EqEqEq => (BinaryOperator::StrictEquality, 3),
        Token::BangEqEq => (BinaryOperator::StrictInequality, 3),
        Token::Lt => (BinaryOperator::LessThan, 4),
        Token::Gt => (BinaryOperator::GreaterThan, 4),
        Token::LtEq => (BinaryOperator::LessThanOrEqual, 4),
        Token::GtEq => (BinaryOperator::GreaterThanOrEqual, 4),
        Token::Plus => (BinaryOperator::Addition, 5),
        Token::Minus => (BinaryOperator::Subtraction, 5),
        Token::Star => (BinaryOperator::Multiplication, 6),
        Token::Slash => (BinaryOperator::Division, 6),
        Token::Percent => (BinaryOperator::Modulo, 6),
        _ => return None,
    };
    Some(op)
}

impl TokenCursor {
    pub(crate) fn parse_expression(&mut self) -> Result<Expression, ParseError> {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> Result<Expression, ParseError> {
        self.nested(Self::assignment)
    }

    fn assignment(&mut self) -> Result<Expression, ParseError> {
        if self.at_arrow_function() {
            return self.parse_arrow_function();
        }

        let start = self.span().start;
        let target = self.parse_conditional()?;
        let operator = match self.peek() {
            Token::Eq => AssignmentOperator::Assign,
            Token::PlusEq => AssignmentOperator::AddAssign,
            Token::MinusEq => AssignmentOperator::SubtractAssign,
            _ => return Ok(target),
        };
        if !target.is_assignable() {
            return Err(ParseError::error(
                "invalid assignment target",
                start..self.previous_end(),
                self.file_id,
            ));
        }
        self.advance();
        let value = self.parse_assignment()?;
        Ok(Expression::Assignment {
            operator,
            target: Box::new(target),
            value: Box::new(value),
        })
    }

    /// `x =>` or a parenthesised list whose closing paren is followed by `=>`.
    fn at_arrow_function(&self) -> bool {
        match self.peek() {
            Token::Ident(_) => matches!(self.peek_at(1), Token::Arrow),
            Token::LParen => {
                let mut depth = 0usize;
                let mut offset = 0;
                loop {
                    match self.peek_at(offset) {
                        Token::LParen => depth += 1,
                        Token::RParen => {
                            depth -= 1;
                            if depth == 0 {
                                return matches!(self.peek_at(offset + 1), Token::Arrow);
                            }
                        }
                        Token::Eof => return false,
                        _ => {}
                    }
                    offset += 1;
                }
            }
            _ => false,
        }
    }

    fn parse_arrow_function(&mut self) -> Result<Expression, ParseError> {
        let start = self.span().start;
        let params = if self.eat(&Token::LParen) {
            self.parse_parameter_list()?
        } else {
            vec![self.expect_ident()?]
        };
        self.expect(&Token::Arrow, "`=>`")?;
        let body = if self.check(&Token::LBrace) {
            FunctionBody::Block(self.parse_function_block()?)
        } else {
            FunctionBody::Expression(Box::new(self.parse_assignment()?))
        };
        Ok(Expression::Function(Rc::new(FunctionLiteral {
            name: None,
            params,
            body,
            span: start..self.previous_end(),
        })))
    }

    /// `function [name](params) { body }`, starting at the `function` keyword.
    pub(crate) fn parse_function(
        &mut self,
        require_name: bool,
    ) -> Result<Rc<FunctionLiteral>, ParseError> {
        let start = self.span().start;
        self.expect(&Token::Function, "`function`")?;
        let name = if matches!(self.peek(), Token::Ident(_)) {
            Some(self.expect_ident()?)
        } else if require_name {
            return Err(self.error("expected a function name"));
        } else {
            None
        };
        self.expect(&Token::LParen, "`(`")?;
        let params = self.parse_parameter_list()?;
        let body = self.parse_function_block()?;
        Ok(Rc::new(FunctionLiteral {
            name,
            params,
            body: FunctionBody::Block(body),
            span: start..self.previous_end(),
        }))
    }

    /// Parameter names up to and including the closing `)`; the `(` is already consumed.
    fn parse_parameter_list(&mut self) -> Result<Vec<String>, ParseError> {
        let mut params = Vec::new();
        if self.eat(&Token::RParen) {
            return Ok(params);
        }
        loop {
            params.push(self.expect_ident()?);
            if self.eat(&Token::Comma) {
                continue;
            }
            self.expect(&Token::RParen, "`,` or `)`")?;
            return Ok(params);
        }
    }

    /// `{ statements }` of a function body. Loops outside the function do not
    /// make `break` legal inside it.
    fn parse_function_block(&mut self) -> Result<Vec<Statement>, ParseError> {
        self.expect(&Token::LBrace, "`{`")?;
        let enclosing_loops = std::mem::replace(&mut self.loop_depth, 0);
        let enclosing_function = std::mem::replace(&mut self.in_function, true);
        let body = self.parse_statements_until(&Token::RBrace);
        self.loop_depth = enclosing_loops;
        self.in_function = enclosing_function;
        let body = body?;
        self.expect(&Token::RBrace, "`}`")?;
        Ok(body)
    }

    fn parse_conditional(&mut self) -> Result<Expression, ParseError> {
        let condition = self.parse_binary(0)?;
        if !self.eat(&Token::Question) {
            return Ok(condition);
        }
        let consequent = self.parse_assignment()?;
        self.expect(&Token::Colon, "`:`")?;
        let alternate = self.parse_assignment()?;
        Ok(Expression::Conditional {
            condition: Box::new(condition),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
        })
    }

    /// Precedence climbing over the binary operators; all are left associative.
    fn parse_binary(&mut self, min_prec: u8) -> Result<Expression, ParseError> {
        let mut left = self.parse_unary()?;
        while let Some((operator, prec)) = binary_operator(self.peek()) {
            if prec < min_prec {
                break;
            }
            self.advance();
            let right = self.parse_binary(prec + 1)?;
            left = Expression::BinaryOperation {
                operator,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expression, ParseError> {
        let operator = match self.peek() {
            Token::Bang => UnaryOperator::LogicalNot,
            Token::Minus => UnaryOperator::Negation,
            Token::Plus => UnaryOperator::Plus,
            Token::TypeOf => UnaryOperator::TypeOf,
            Token::PlusPlus | Token::MinusMinus => {
                let operator = update_operator(self.peek());
                let start = self.advance().span.start;
                let target = self.nested(Self::parse_unary)?;
                if !target.is_assignable() {
                    return Err(ParseError::error(
                        "invalid increment/decrement target",
                        start..self.previous_end(),
                        self.file_id,
                    ));
                }
                return Ok(Expression::Update {
                    operator,
                    prefix: true,
                    target: Box::new(target),
                });
            }
            _ => return self.parse_postfix(),
        };
        self.advance();
        let operand = self.nested(Self::parse_unary)?;
        Ok(Expression::UnaryOperation {
            operator,
            operand: Box::new(operand),
        })
    }

    fn parse_postfix(&mut self) -> Result<Expression, ParseError> {
        let start = self.span().start;
        let mut expr = self.parse_primary()?;

        loop {
            match self.peek() {
                Token::Dot => {
                    self.advance();
                    let name = self.expect_property_name()?;
                    expr = Expression::Member {
                        object: Box::new(expr),
                        property: Property::Named(name),
                    };
                }
                Token::LBracket => {
                    self.advance();
                    let index = self.parse_expression()?;
                    self.expect(&Token::RBracket, "`]`")?;
                    expr = Expression::Member {
                        object: Box::new(expr),
                        property: Property::Computed(Box::new(index)),
                    };
                }
                Token::LParen => {
                    self.advance();
                    let arguments = self.parse_arguments()?;
                    expr = Expression::Call {
                        callee: Box::new(expr),
                        arguments,
                        span: start..self.previous_end(),
                    };
                }
                // A line break before `++` starts a new statement.
                Token::PlusPlus | Token::MinusMinus if !self.newline_before() => {
                    if !expr.is_assignable() {
                        return Err(self.error("invalid increment/decrement target"));
                    }
                    let operator = update_operator(self.peek());
                    self.advance();
                    return Ok(Expression::Update {
                        operator,
                        prefix: false,
                        target: Box::new(expr),
                    });
                }
                _ => break,
            }
        }

        Ok(expr)
    }

    /// Call arguments up to and including the closing `)`.
    fn parse_arguments(&mut self) -> Result<Vec<Expression>, ParseError> {
        let mut arguments = Vec::new();
        if self.eat(&Token::RParen) {
            return Ok(arguments);
        }
        loop {
            arguments.push(self.parse_expression()?);
            if self.eat(&Token::Comma) {
                if self.eat(&Token::RParen) {
                    return Ok(arguments);
                }
                continue;
            }
            self.expect(&Token::RParen, "`,` or `)`")?;
            return Ok(arguments);
        }
    }

    fn expect_property_name(&mut self) -> Result<String, ParseError> {
        let name = match self.peek() {
            Token::Ident(name) => name.clone(),
            other => match other.keyword_name() {
                Some(keyword) => keyword.to_string(),
                None => return Err(self.error("expected a property name")),
            },
        };
        self.advance();
        Ok(name)
    }

    fn parse_primary(&mut self) -> Result<Expression, ParseError> {
        if self.check(&Token::Function) {
            return Ok(Expression::Function(self.parse_function(false)?));
        }

        let spanned = self.advance();
        match spanned.token {
            Token::Number(n) => Ok(Expression::NumberLiteral(n)),
            Token::Str(s) => Ok(Expression::StringLiteral(s)),
            Token::True => Ok(Expression::BooleanLiteral(true)),
            Token::False => Ok(Expression::BooleanLiteral(false)),
            Token::Null => Ok(Expression::NullLiteral),
            Token::Undefined => Ok(Expression::UndefinedLiteral),
            Token::Ident(name) => Ok(Expression::Identifier(name, spanned.span)),
            Token::LParen => {
                let inner = self.parse_expression()?;
                self.expect(&Token::RParen, "`)`")?;
                Ok(inner)
            }
            Token::LBracket => self.parse_array_literal(),
            Token::LBrace => self.parse_object_literal(),
            other => Err(ParseError::error(
                format!("expected an expression, found {}", other.describe()),
                spanned.span,
                self.file_id,
            )),
        }
    }

    /// Elements up to the closing `]`; a trailing comma is allowed.
    fn parse_array_literal(&mut self) -> Result<Expression, ParseError> {
        let mut elements = Vec::new();
        while !self.check(&Token::RBracket) {
            elements.push(self.parse_expression()?);
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        self.expect(&Token::RBracket, "`,` or `]`")?;
        Ok(Expression::ArrayLiteral(elements))
    }

    /// `key: value` pairs up to the closing `}`. Keys are identifiers, keywords,
    /// strings or numbers; `{ name }` is shorthand for `{ name: name }`.
    fn parse_object_literal(&mut self) -> Result<Expression, ParseError> {
        let mut properties = Vec::new();
        while !self.check(&Token::RBrace) {
            let key_span = self.span();
            let (key, shorthand) = match self.peek() {
                Token::Ident(name) => (name.clone(), true),
                Token::Str(s) => (s.clone(), false),
                Token::Number(n) => (format_number_key(*n), false),
                other => match other.keyword_name() {
                    Some(keyword) => (keyword.to_string(), false),
                    None => return Err(self.error("expected a property key")),
                },
            };
            self.advance();

            let value = if self.eat(&Token::Colon) {
                self.parse_expression()?
            } else if shorthand && matches!(self.peek(), Token::Comma | Token::RBrace) {
                Expression::Identifier(key.clone(), key_span)
            } else {
                return Err(self.error("expected `:`"));
            };
            properties.push((key, value));

            if !self.eat(&Token::Comma) {
                break;
            }
        }
        self.expect(&Token::RBrace, "`,` or `}`")?;
        Ok(Expression::ObjectLiteral(properties))
    }
}

fn update_operator(token: &Token) -> UpdateOperator {
    if matches!(token, Token::PlusPlus) {
        UpdateOperator::Increment
    } else {
        UpdateOperator::Decrement
    }
}

/// Numeric object keys are stored as their canonical string form (`1`, not `1.0`).
fn format_number_key(n: f64) -> String {
    if n.is_finite() && n == n.floor() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}
