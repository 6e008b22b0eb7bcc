use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use interpreter::{Session, inspect};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn eval(source: &str) -> String {
    let mut session = Session::with_output(Box::new(io::sink()));
    let value = session.eval(source).expect("evaluation failed");
    inspect(&value)
}

fn eval_err(source: &str) -> (String, String) {
    let mut session = Session::with_output(Box::new(io::sink())).with_max_depth(20);
    let err = session.eval(source).expect_err("expected an error");
    (err.name().to_string(), err.to_string())
}

/// A writer whose contents can be read back after the session owns it.
#[derive(Clone, Default)]
struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[rstest]
#[case("1 + 2 * 3", "7")]
#[case("(1 + 2) * 3", "9")]
#[case("10 % 4", "2")]
#[case("1 / 0", "Infinity")]
#[case("0.1 + 0.2", "0.30000000000000004")]
#[case("-'3'", "-3")]
fn arithmetic(#[case] source: &str, #[case] expected: &str) {
    assert_eq!(eval(source), expected);
}

#[rstest]
#[case("'a' + 1", "'a1'")]
#[case("[1, 2] + ''", "'1,2'")]
#[case("'Hi'.toUpperCase()", "'HI'")]
#[case("'a,b'.split(',')", "['a', 'b']")]
#[case("'  x '.trim().length", "1")]
#[case("String(12) + Number('3')", "'123'")]
fn strings(#[case] source: &str, #[case] expected: &str) {
    assert_eq!(eval(source), expected);
}

#[test]
fn equality_and_logic() {
    assert_eq!(
        eval("[1 == '1', 1 === '1', null == undefined, null === undefined]"),
        "[true, false, true, false]"
    );
    assert_eq!(eval("null || 'default'"), "'default'");
    assert_eq!(eval("0 && missing()"), "0");
    assert_eq!(eval("typeof missing"), "'undefined'");
    assert_eq!(eval("[typeof 1, typeof 'a', typeof null, typeof print]"), "['number', 'string', 'object', 'function']");
}

#[test]
fn closures_keep_their_scope() {
    let source = "function counter() {
  var n = 0
  return function () { n += 1; return n }
}
var c = counter()
c()
c()";
    assert_eq!(eval(source), "2");
}

#[test]
fn recursion() {
    assert_eq!(
        eval("function fact(n) { return n <= 1 ? 1 : n * fact(n - 1) }\nfact(10)"),
        "3628800"
    );
}

#[test]
fn function_declarations_are_hoisted() {
    assert_eq!(eval("double(4)\nfunction double(x) { return x * 2 }"), "8");
}

#[test]
fn var_is_hoisted_let_is_block_scoped() {
    assert_eq!(eval("function f() { return x; var x = 1 }\nf()"), "undefined");
    assert_eq!(eval("let a = 1\n{ let a = 2 }\na"), "1");
    assert_eq!(eval("var a = 1\n{ var a = 2 }\na"), "2");
}

#[test]
fn arrays() {
    assert_eq!(eval("[1, 2, 3].map(x => x * 2)"), "[2, 4, 6]");
    assert_eq!(eval("[1, 2, 3, 4].filter(x => x % 2 === 0)"), "[2, 4]");
    assert_eq!(eval("[1, 2, 3].reduce((a, b) => a + b, 0)"), "6");
    assert_eq!(eval("[3, 1, 2].reverse()"), "[2, 1, 3]");
    assert_eq!(eval("[1, 2].concat([3], 4)"), "[1, 2, 3, 4]");
    assert_eq!(eval("var xs = [1]\nxs.push(2, 3)\nxs"), "[1, 2, 3]");
    assert_eq!(eval("var xs = []\nxs[2] = 'c'\nxs"), "[undefined, undefined, 'c']");
    assert_eq!(eval("isArray([]) && !isArray({})"), "true");
}

#[test]
fn objects_keep_insertion_order() {
    assert_eq!(eval("var o = { b: 1, a: 2 }\no.c = [1]\no"), "{ b: 1, a: 2, c: [1] }");
    assert_eq!(eval("keys({ x: 1, 'y z': 2 })"), "['x', 'y z']");
    assert_eq!(eval("var o = { a: 1 }\no['a'] += 1\no.a"), "2");
}

#[test]
fn loops() {
    assert_eq!(
        eval("var total = 0\nfor (var i = 0; i < 5; i++) { total += i }\ntotal"),
        "10"
    );
    assert_eq!(
        eval("var o = { x: 1, y: 2 }\nvar ks = []\nfor (var k in o) ks.push(k)\nks"),
        "['x', 'y']"
    );
    let source = "var i = 0
var odd = []
while (true) {
  i++
  if (i > 6) break
  if (i % 2 === 0) continue
  odd.push(i)
}
odd";
    assert_eq!(eval(source), "[1, 3, 5]");
}

#[test]
fn calls_bind_arguments() {
    assert_eq!(eval("function count() { return arguments.length }\ncount(1, 2, 3)"), "3");
    assert_eq!(
        eval("function add(a, b) { return a + b }\n[add.apply(null, [1, 2]), add.call(null, 3, 4)]"),
        "[3, 7]"
    );
    assert_eq!(eval("function f(a, b) { return b }\nf(1)"), "undefined");
}

#[test]
fn functions_render_by_name() {
    assert_eq!(eval("function named() {}\nnamed"), "[Function: named]");
    assert_eq!(eval("(x => x)"), "[Function (anonymous)]");
    assert_eq!(eval("[].push"), "[Function: push]");
}

#[test]
fn print_writes_to_the_session_output() {
    let buffer = SharedBuffer::default();
    let mut session = Session::with_output(Box::new(buffer.clone()));
    session.eval("print('hello', 1, [2])").expect("evaluation failed");
    let output = String::from_utf8(buffer.0.borrow().clone()).expect("utf-8");
    assert_eq!(output, "hello 1 [2]\n");
}

#[rstest]
#[case("missing", "ReferenceError", "missing is not defined")]
#[case("var o = {}\no.f()", "TypeError", "o.f is not a function")]
#[case("undefined.x", "TypeError", "cannot read properties of undefined (reading 'x')")]
#[case("null.x = 1", "TypeError", "cannot set properties of null (setting 'x')")]
#[case("throw 'boom'", "Error", "boom")]
#[case("throw Error('bad')", "Error", "bad")]
#[case("throw { name: 'ValidationError', message: 'nope' }", "ValidationError", "nope")]
#[case("function f() { return f() }\nf()", "RangeError", "maximum call stack size exceeded")]
#[case("1 +", "SyntaxError", "expected an expression, found end of input")]
#[case("[].reduce((a, b) => a)", "TypeError", "reduce of empty array with no initial value")]
#[case("var a = []\na[1000000000000000000] = 1", "RangeError", "array index 1000000000000000000 is past the maximum length 16777216")]
#[case("var a = []\na.length = 1e12", "RangeError", "invalid array length")]
#[case("var a = []\na.length = -1", "RangeError", "invalid array length")]
fn errors(#[case] source: &str, #[case] name: &str, #[case] message: &str) {
    assert_eq!(eval_err(source), (name.to_string(), message.to_string()));
}

#[test]
fn self_containing_arrays_convert_to_strings() {
    assert_eq!(eval("var a = [1]\na.push(a)\nString(a)"), "'1,'");
    assert_eq!(eval("var a = [1]\na.push(a)\na.join('-')"), "'1-'");
    assert_eq!(eval("var a = [1]\nvar b = [a]\na.push(b)\na + ''"), "'1,'");
    assert_eq!(eval("var a = [1]\na.push(a)\na"), "[1, [Circular]]");
}

#[test]
fn array_length_from_the_array_itself() {
    assert_eq!(eval("var a = [1]\na.length = a\na.length"), "1");
    assert_eq!(eval("var a = [1, 2]\na.length = [1]\na"), "[1]");
}

#[test]
fn arrays_grow_up_to_the_limit() {
    assert_eq!(eval("var a = []\na[3] = 'x'\na.length"), "4");
    let mut session = Session::with_output(Box::new(io::sink()));
    session
        .eval("var a = []\na[100000000] = 1")
        .expect_err("index past the limit");
    let value = session.eval("a.length").expect("array still usable");
    assert_eq!(inspect(&value), "0");
}

#[test]
fn deeply_nested_source_is_a_syntax_error() {
    let (name, message) = eval_err(&"(".repeat(20_000));
    assert_eq!(name, "SyntaxError");
    assert_eq!(message, "nesting deeper than 64 levels");
}

#[test]
fn depth_resets_after_an_error() {
    let mut session = Session::with_output(Box::new(io::sink())).with_max_depth(20);
    session.eval("function f() { return f() }").expect("definition");
    session.eval("f()").expect_err("overflow");
    let value = session
        .eval("function g(n) { return n === 0 ? 'done' : g(n - 1) }\ng(10)")
        .expect("evaluation after overflow");
    assert_eq!(inspect(&value), "'done'");
}
