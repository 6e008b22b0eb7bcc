use std::ops::Range;
use std::rc::Rc;

use crate::statement::Statement;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnaryOperator {
    /// Arithmetic negation: -x
    Negation,
    /// Numeric conversion: +x
    Plus,
    /// Logical not: !x
    LogicalNot,
    /// typeof x
    TypeOf,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinaryOperator {
    Addition,
    Subtraction,
    Multiplication,
    Division,
    Modulo,
    LogicalAnd,
    LogicalOr,
    Equality,
    Inequality,
    StrictEquality,
    StrictInequality,
    GreaterThan,
    LessThan,
    GreaterThanOrEqual,
    LessThanOrEqual,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AssignmentOperator {
    /// x = y
    Assign,
    /// x += y
    AddAssign,
    /// x -= y
    SubtractAssign,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UpdateOperator {
    /// ++
    Increment,
    /// --
    Decrement,
}

/// The right-hand side of a member access.
#[derive(Debug, Clone)]
pub enum Property {
    /// obj.name
    Named(String),
    /// obj[expr]
    Computed(Box<Expression>),
}

#[derive(Debug, Clone)]
pub enum FunctionBody {
    Block(Vec<Statement>),
    /// Concise arrow body: `x => x * 2`
    Expression(Box<Expression>),
}

/// A function literal, shared between the AST and every closure created from it.
#[derive(Debug, Clone)]
pub struct FunctionLiteral {
    pub name: Option<String>,
    pub params: Vec<String>,
    pub body: FunctionBody,
    pub span: Range<usize>,
}

/// An expression AST node.
#[derive(Debug, Clone)]
pub enum Expression {
    // Literals
    NumberLiteral(f64),
    StringLiteral(String),
    BooleanLiteral(bool),
    NullLiteral,
    UndefinedLiteral,
    ArrayLiteral(Vec<Expression>),
    /// Keys are kept in source order.
    ObjectLiteral(Vec<(String, Expression)>),
    Function(Rc<FunctionLiteral>),

    // References
    Identifier(String, Range<usize>),
    Member {
        object: Box<Expression>,
        property: Property,
    },

    Call {
        callee: Box<Expression>,
        arguments: Vec<Expression>,
        span: Range<usize>,
    },

    // Operations
    UnaryOperation {
        operator: UnaryOperator,
        operand: Box<Expression>,
    },
    BinaryOperation {
        operator: BinaryOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Conditional {
        condition: Box<Expression>,
        consequent: Box<Expression>,
        alternate: Box<Expression>,
    },
    Assignment {
        operator: AssignmentOperator,
        target: Box<Expression>,
        value: Box<Expression>,
    },
    /// `++x`, `x--`
    Update {
        operator: UpdateOperator,
        prefix: bool,
        target: Box<Expression>,
    },
}

impl Expression {
    /// Short source-like text naming the expression, for error messages
    /// such as "obj.method is not a function".
    pub fn describe(&self) -> String {
        match self {
            Expression::Identifier(name, _) => name.clone(),
            Expression::Member { object, property } => match property {
                Property::Named(name) => format!("{}.{}", object.describe(), name),
                Property::Computed(index) => format!("{}[{}]", object.describe(), index.describe()),
            },
            Expression::Call { callee, .. } => format!("{}(...)", callee.describe()),
            Expression::NumberLiteral(n) => format!("{}", n),
            Expression::StringLiteral(s) => format!("'{}'", s),
            Expression::BooleanLiteral(b) => format!("{}", b),
            Expression::NullLiteral => "null".to_string(),
            Expression::UndefinedLiteral => "undefined".to_string(),
            Expression::Function(f) => f.name.clone().unwrap_or_else(|| "(anonymous)".to_string()),
            _ => "expression".to_string(),
        }
    }

    pub fn is_assignable(&self) -> bool {
        matches!(self, Expression::Identifier(..) | Expression::Member { .. })
    }
}
