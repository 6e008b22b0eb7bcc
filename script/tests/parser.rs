use pretty_assertions::assert_eq;
use rstest::rstest;
use script::comment::CommentKind;
use script::expression::{BinaryOperator, Expression, FunctionBody, Property};
use script::parser::Parser;
use script::statement::{DeclarationKind, Statement};

fn parse(source: &str) -> script::Program {
    Parser::new(source.to_string(), 0)
        .parse()
        .expect("parse failed")
}

fn parse_err(source: &str) -> String {
    let errors = Parser::new(source.to_string(), 0)
        .parse()
        .expect_err("expected a parse error");
    errors[0].message.clone()
}

fn expression(source: &str) -> Expression {
    Parser::new(source.to_string(), 0)
        .parse_expression()
        .expect("parse failed")
}

#[test]
fn multiplication_binds_tighter_than_addition() {
    let Expression::BinaryOperation { operator, right, .. } = expression("1 + 2 * 3") else {
        panic!("expected a binary operation");
    };
    assert_eq!(operator, BinaryOperator::Addition);
    assert!(matches!(
        *right,
        Expression::BinaryOperation {
            operator: BinaryOperator::Multiplication,
            ..
        }
    ));
}

#[test]
fn subtraction_is_left_associative() {
    let Expression::BinaryOperation { left, right, .. } = expression("10 - 4 - 3") else {
        panic!("expected a binary operation");
    };
    assert!(matches!(*left, Expression::BinaryOperation { .. }));
    assert!(matches!(*right, Expression::NumberLiteral(n) if n == 3.0));
}

#[test]
fn braces_in_expression_position_are_an_object() {
    let Expression::ObjectLiteral(properties) = expression("{ a: 1, 'b c': 2, d }") else {
        panic!("expected an object literal");
    };
    let keys: Vec<&str> = properties.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(keys, vec!["a", "b c", "d"]);
}

#[test]
fn arrow_functions() {
    let Expression::Function(f) = expression("(a, b) => a + b") else {
        panic!("expected a function");
    };
    assert_eq!(f.params, vec!["a".to_string(), "b".to_string()]);
    assert!(matches!(f.body, FunctionBody::Expression(_)));

    let Expression::Function(f) = expression("x => { return x }") else {
        panic!("expected a function");
    };
    assert_eq!(f.params, vec!["x".to_string()]);
    assert!(matches!(f.body, FunctionBody::Block(_)));
}

#[test]
fn keywords_are_allowed_as_property_names() {
    let Expression::Member { property, .. } = expression("obj.in") else {
        panic!("expected a member access");
    };
    assert!(matches!(property, Property::Named(name) if name == "in"));
}

#[test]
fn trailing_semicolon_is_accepted_by_parse_expression() {
    assert!(matches!(expression("42;"), Expression::NumberLiteral(_)));
}

#[test]
fn parse_expression_rejects_trailing_tokens() {
    let errors = Parser::new("1 2".to_string(), 0)
        .parse_expression()
        .expect_err("expected a parse error");
    assert_eq!(
        errors[0].message,
        "expected end of input after expression, found number `2`"
    );
}

#[test]
fn newlines_terminate_statements() {
    let program = parse("var a = 1\nvar b = 2\na + b");
    assert_eq!(program.statements.len(), 3);
    assert!(matches!(
        program.statements[0],
        Statement::Declaration {
            kind: DeclarationKind::Var,
            ..
        }
    ));
    assert!(matches!(program.statements[2], Statement::Expression { .. }));
}

#[test]
fn return_followed_by_newline_returns_nothing() {
    let program = parse("function f() {\n  return\n  1\n}");
    let Statement::Function(f) = &program.statements[0] else {
        panic!("expected a function declaration");
    };
    let FunctionBody::Block(body) = &f.body else {
        panic!("expected a block body");
    };
    assert!(matches!(body[0], Statement::Return { value: None, .. }));
    assert_eq!(body.len(), 2);
}

#[test]
fn for_loops() {
    let program = parse("for (var i = 0; i < 3; i++) {}\nfor (var k in obj) {}\nfor (;;) break");
    assert!(matches!(program.statements[0], Statement::For { .. }));
    assert!(matches!(
        program.statements[1],
        Statement::ForIn {
            kind: Some(DeclarationKind::Var),
            ..
        }
    ));
    assert!(matches!(
        program.statements[2],
        Statement::For {
            init: None,
            condition: None,
            update: None,
            ..
        }
    ));
}

#[test]
fn comments_are_kept_in_source_order() {
    let program = parse("/** doc */\n// note\nvar x = 1 /* trailing */");
    let kinds: Vec<CommentKind> = program.comments.iter().map(|c| c.kind).collect();
    assert_eq!(
        kinds,
        vec![CommentKind::Block, CommentKind::Line, CommentKind::Block]
    );
    assert_eq!(program.block_comments().count(), 2);
    assert_eq!(program.comments[0].text, "* doc ");
}

#[rstest]
#[case("var = 1", "expected an identifier, found `=`")]
#[case("1 +", "expected an expression, found end of input")]
#[case("break", "`break` outside of a loop")]
#[case("return 1", "`return` outside of a function")]
#[case("const x", "missing initializer in const declaration of `x`")]
#[case("1 = 2", "invalid assignment target")]
#[case("f(1 2)", "expected `,` or `)`, found number `2`")]
#[case("while (true) { function g() { continue } }", "`continue` outside of a loop")]
fn syntax_errors(#[case] source: &str, #[case] message: &str) {
    assert_eq!(parse_err(source), message);
}

#[test]
fn errors_carry_byte_spans() {
    let errors = Parser::new("var x = ;".to_string(), 0)
        .parse()
        .expect_err("expected a parse error");
    assert_eq!(errors[0].span, 8..9);
}

#[rstest]
#[case("(".repeat(20_000))]
#[case("[".repeat(20_000))]
#[case("!".repeat(20_000) + "x")]
#[case("{".repeat(20_000))]
#[case("if (x) ".repeat(20_000) + "y")]
#[case("x = ".repeat(20_000) + "1")]
fn deep_nesting_is_an_error(#[case] source: String) {
    let message = parse_err(&source);
    assert_eq!(message, "nesting deeper than 64 levels");
}

#[test]
fn moderate_nesting_parses() {
    let source = format!("{}1{}", "(".repeat(30), ")".repeat(30));
    assert_eq!(parse(&source).statements.len(), 1);
    parse(&format!("{}x", "- ".repeat(40)));
}
