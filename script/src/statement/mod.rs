use std::ops::Range;
use std::rc::Rc;

use crate::expression::{Expression, FunctionLiteral};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeclarationKind {
    /// Function-scoped.
    Var,
    /// Block-scoped.
    Let,
    /// Block-scoped; treated like `let` at runtime.
    Const,
}

/// A single statement.
#[derive(Debug, Clone)]
pub enum Statement {
    /// Expression evaluated for its value or side effects.
    Expression {
        value: Expression,
        span: Range<usize>,
    },
    /// `var a = 1, b`
    Declaration {
        kind: DeclarationKind,
        declarators: Vec<(String, Option<Expression>)>,
        span: Range<usize>,
    },
    /// `function name(params) { ... }`, hoisted within its enclosing body.
    Function(Rc<FunctionLiteral>),
    Return {
        value: Option<Expression>,
        span: Range<usize>,
    },
    If {
        condition: Expression,
        consequent: Box<Statement>,
        alternate: Option<Box<Statement>>,
    },
    While {
        condition: Expression,
        body: Box<Statement>,
    },
    /// `for (init; condition; update) body`
    For {
        init: Option<Box<Statement>>,
        condition: Option<Expression>,
        update: Option<Expression>,
        body: Box<Statement>,
    },
    /// `for (var key in object) body`
    ForIn {
        kind: Option<DeclarationKind>,
        variable: String,
        object: Expression,
        body: Box<Statement>,
    },
    Break,
    Continue,
    Throw {
        value: Expression,
        span: Range<usize>,
    },
    Block(Vec<Statement>),
    Empty,
}
