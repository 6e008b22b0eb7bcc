use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use script::expression::FunctionLiteral;

use crate::context::Context;
use crate::environment::Environment;
use crate::error::RuntimeError;

pub type Array = Rc<RefCell<Vec<RuntimeValue>>>;

/// Arrays are dense; growing one past this many items through `length` or an
/// index write is a RangeError.
pub const MAX_ARRAY_LENGTH: usize = 1 << 24;
pub type Object = Rc<RefCell<IndexMap<String, RuntimeValue>>>;

pub type NativeFn = fn(&[RuntimeValue], &mut Context<'_>) -> Result<RuntimeValue, RuntimeError>;
pub type MethodFn =
    fn(&RuntimeValue, &[RuntimeValue], &mut Context<'_>) -> Result<RuntimeValue, RuntimeError>;

/// A runtime value produced by evaluating an expression.
///
/// Arrays, objects and functions are shared references: cloning a value
/// clones the handle, not the contents.
#[derive(Clone)]
pub enum RuntimeValue {
    Undefined,
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
    Array(Array),
    Object(Object),
    Function(Rc<Closure>),
    Native(Rc<NativeFunction>),
    /// A builtin method bound to the value it was read from (`xs.push`).
    Method(Rc<BoundMethod>),
}

/// A user function together with the scope it was created in.
pub struct Closure {
    pub literal: Rc<FunctionLiteral>,
    pub scope: Environment,
}

pub struct NativeFunction {
    pub name: &'static str,
    pub function: NativeFn,
}

pub struct BoundMethod {
    pub name: &'static str,
    pub receiver: RuntimeValue,
    pub function: MethodFn,
}

impl RuntimeValue {
    pub fn string(s: impl Into<String>) -> Self {
        RuntimeValue::String(s.into())
    }

    pub fn array(items: Vec<RuntimeValue>) -> Self {
        RuntimeValue::Array(Rc::new(RefCell::new(items)))
    }

    pub fn object(entries: IndexMap<String, RuntimeValue>) -> Self {
        RuntimeValue::Object(Rc::new(RefCell::new(entries)))
    }

    pub fn native(name: &'static str, function: NativeFn) -> Self {
        RuntimeValue::Native(Rc::new(NativeFunction { name, function }))
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            RuntimeValue::Undefined | RuntimeValue::Null => false,
            RuntimeValue::Boolean(b) => *b,
            RuntimeValue::Number(n) => *n != 0.0 && !n.is_nan(),
            RuntimeValue::String(s) => !s.is_empty(),
            _ => true,
        }
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, RuntimeValue::Undefined | RuntimeValue::Null)
    }

    pub fn is_callable(&self) -> bool {
        matches!(
            self,
            RuntimeValue::Function(_) | RuntimeValue::Native(_) | RuntimeValue::Method(_)
        )
    }

    /// Result of the `typeof` operator.
    pub fn type_of(&self) -> &'static str {
        match self {
            RuntimeValue::Undefined => "undefined",
            RuntimeValue::Null | RuntimeValue::Array(_) | RuntimeValue::Object(_) => "object",
            RuntimeValue::Boolean(_) => "boolean",
            RuntimeValue::Number(_) => "number",
            RuntimeValue::String(_) => "string",
            RuntimeValue::Function(_) | RuntimeValue::Native(_) | RuntimeValue::Method(_) => {
                "function"
            }
        }
    }

    /// The name of a callable value, if it has one.
    pub fn function_name(&self) -> Option<String> {
        match self {
            RuntimeValue::Function(closure) => closure.literal.name.clone(),
            RuntimeValue::Native(native) => Some(native.name.to_string()),
            RuntimeValue::Method(method) => Some(method.name.to_string()),
            _ => None,
        }
    }

    /// Numeric conversion as done by unary `+`, arithmetic and `Number(x)`.
    pub fn to_number(&self) -> f64 {
        match self {
            RuntimeValue::Undefined => f64::NAN,
            RuntimeValue::Null => 0.0,
            RuntimeValue::Boolean(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            RuntimeValue::Number(n) => *n,
            RuntimeValue::String(s) => parse_number(s),
            RuntimeValue::Array(_) => parse_number(&self.to_display_string()),
            _ => f64::NAN,
        }
    }

    /// String conversion as done by `+` concatenation, `join` and `String(x)`.
    pub fn to_display_string(&self) -> String {
        self.display_string(&mut Vec::new())
    }

    /// `visiting` holds the arrays being converted further up; meeting one of
    /// them again gives `''`.
    fn display_string(&self, visiting: &mut Vec<usize>) -> String {
        match self {
            RuntimeValue::Undefined => "undefined".to_string(),
            RuntimeValue::Null => "null".to_string(),
            RuntimeValue::Boolean(b) => b.to_string(),
            RuntimeValue::Number(n) => format_number(*n),
            RuntimeValue::String(s) => s.clone(),
            RuntimeValue::Array(items) => join_array(items, ",", visiting),
            RuntimeValue::Object(_) => "[object Object]".to_string(),
            RuntimeValue::Function(_) | RuntimeValue::Native(_) | RuntimeValue::Method(_) => {
                crate::inspect::inspect(self)
            }
        }
    }

    /// `===`: primitives by value, everything else by identity.
    pub fn strict_equals(&self, other: &RuntimeValue) -> bool {
        match (self, other) {
            (RuntimeValue::Undefined, RuntimeValue::Undefined) => true,
            (RuntimeValue::Null, RuntimeValue::Null) => true,
            (RuntimeValue::Boolean(a), RuntimeValue::Boolean(b)) => a == b,
            (RuntimeValue::Number(a), RuntimeValue::Number(b)) => a == b, // NaN != NaN per IEEE 754
            (RuntimeValue::String(a), RuntimeValue::String(b)) => a == b,
            (RuntimeValue::Array(a), RuntimeValue::Array(b)) => Rc::ptr_eq(a, b),
            (RuntimeValue::Object(a), RuntimeValue::Object(b)) => Rc::ptr_eq(a, b),
            (RuntimeValue::Function(a), RuntimeValue::Function(b)) => Rc::ptr_eq(a, b),
            (RuntimeValue::Native(a), RuntimeValue::Native(b)) => Rc::ptr_eq(a, b),
            (RuntimeValue::Method(a), RuntimeValue::Method(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// `==`: like `===`, but `null == undefined` and mixed number/string/boolean
    /// operands are compared numerically.
    pub fn loose_equals(&self, other: &RuntimeValue) -> bool {
        match (self, other) {
            (a, b) if a.is_nullish() && b.is_nullish() => true,
            (a, b) if a.is_nullish() || b.is_nullish() => false,
            (
                RuntimeValue::Number(_) | RuntimeValue::String(_) | RuntimeValue::Boolean(_),
                RuntimeValue::Number(_) | RuntimeValue::String(_) | RuntimeValue::Boolean(_),
            ) if std::mem::discriminant(self) != std::mem::discriminant(other) => {
                self.to_number() == other.to_number()
            }
            _ => self.strict_equals(other),
        }
    }
}

/// `items.join(separator)`: nullish items and arrays already being joined are
/// empty.
pub fn join_array(items: &Array, separator: &str, visiting: &mut Vec<usize>) -> String {
    let id = items.as_ptr() as usize;
    if visiting.contains(&id) {
        return String::new();
    }
    visiting.push(id);
    let joined = items
        .borrow()
        .iter()
        .map(|item| {
            if item.is_nullish() {
                String::new()
            } else {
                item.display_string(visiting)
            }
        })
        .collect::<Vec<_>>()
        .join(separator);
    visiting.pop();
    joined
}

impl fmt::Debug for RuntimeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::inspect::inspect(self))
    }
}

impl fmt::Display for RuntimeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_display_string())
    }
}

/// Shortest round-trip form: `1`, `0.5`, `1e+21`, `NaN`, `-Infinity`; `-0` prints as `0`.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    let magnitude = n.abs();
    if magnitude >= 1e21 || magnitude < 1e-6 {
        let formatted = format!("{:e}", n);
        return match formatted.split_once('e') {
            Some((mantissa, exponent)) if !exponent.starts_with('-') => {
                format!("{}e+{}", mantissa, exponent)
            }
            _ => formatted,
        };
    }
    format!("{}", n)
}

/// String to number: surrounding whitespace is ignored, blank is 0, junk is NaN.
fn parse_number(s: &str) -> f64 {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    match trimmed {
        "Infinity" | "+Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        // Rust accepts spellings like "inf" and "nan" that are not numbers here.
        t if t.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') => f64::NAN,
        t => t.parse().unwrap_or(f64::NAN),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1.0, "1")]
    #[case(-0.0, "0")]
    #[case(0.5, "0.5")]
    #[case(0.1 + 0.2, "0.30000000000000004")]
    #[case(1e21, "1e+21")]
    #[case(1.5e-7, "1.5e-7")]
    #[case(123456789.0, "123456789")]
    #[case(f64::NAN, "NaN")]
    #[case(f64::NEG_INFINITY, "-Infinity")]
    fn numbers_format_like_the_language(#[case] n: f64, #[case] expected: &str) {
        assert_eq!(format_number(n), expected);
    }

    #[rstest]
    #[case(" 42 ", 42.0)]
    #[case("", 0.0)]
    #[case("1e3", 1000.0)]
    #[case("-Infinity", f64::NEG_INFINITY)]
    fn strings_convert_to_numbers(#[case] s: &str, #[case] expected: f64) {
        assert_eq!(RuntimeValue::string(s).to_number(), expected);
    }

    #[test]
    fn junk_strings_are_nan() {
        assert!(RuntimeValue::string("abc").to_number().is_nan());
        assert!(RuntimeValue::string("inf").to_number().is_nan());
    }

    #[test]
    fn containers_compare_by_identity() {
        let a = RuntimeValue::array(vec![RuntimeValue::Number(1.0)]);
        let b = RuntimeValue::array(vec![RuntimeValue::Number(1.0)]);
        assert!(a.strict_equals(&a.clone()));
        assert!(!a.strict_equals(&b));
    }

    #[test]
    fn loose_equality_coerces() {
        assert!(RuntimeValue::Null.loose_equals(&RuntimeValue::Undefined));
        assert!(RuntimeValue::Number(1.0).loose_equals(&RuntimeValue::string("1")));
        assert!(RuntimeValue::Boolean(true).loose_equals(&RuntimeValue::Number(1.0)));
        assert!(!RuntimeValue::Null.loose_equals(&RuntimeValue::Number(0.0)));
        assert!(!RuntimeValue::Number(f64::NAN).loose_equals(&RuntimeValue::Number(f64::NAN)));
    }

    #[test]
    fn array_display_joins_with_commas() {
        let xs = RuntimeValue::array(vec![
            RuntimeValue::Number(1.0),
            RuntimeValue::Null,
            RuntimeValue::string("a"),
        ]);
        assert_eq!(xs.to_display_string(), "1,,a");
    }
}
