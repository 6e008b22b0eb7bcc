use crate::runtime_value::{RuntimeValue, format_number};

/// Turns a value into the text shown when comparing or reporting it.
pub trait Render {
    fn render(&self, value: &RuntimeValue) -> String;
}

/// The default renderer: [`inspect`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Inspect;

impl Render for Inspect {
    fn render(&self, value: &RuntimeValue) -> String {
        inspect(value)
    }
}

impl<F> Render for F
where
    F: Fn(&RuntimeValue) -> String,
{
    fn render(&self, value: &RuntimeValue) -> String {
        self(value)
    }
}

/// Canonical, deterministic representation of a value.
///
/// ```text
/// undefined  null  true  42  0.5  'it\'s'
/// [1, 2, 3]  { a: 1, 'b c': [Function: f] }  [Circular]
/// ```
pub fn inspect(value: &RuntimeValue) -> String {
    let mut out = String::new();
    let mut visiting = Vec::new();
    write_value(&mut out, value, &mut visiting);
    out
}

fn write_value(out: &mut String, value: &RuntimeValue, visiting: &mut Vec<usize>) {
    match value {
        RuntimeValue::Undefined => out.push_str("undefined"),
        RuntimeValue::Null => out.push_str("null"),
        RuntimeValue::Boolean(b) => out.push_str(if *b { "true" } else { "false" }),
        RuntimeValue::Number(n) => out.push_str(&format_number(*n)),
        RuntimeValue::String(s) => write_quoted(out, s),
        RuntimeValue::Function(_) | RuntimeValue::Native(_) | RuntimeValue::Method(_) => {
            match value.function_name() {
                Some(name) => {
                    out.push_str("[Function: ");
                    out.push_str(&name);
                    out.push(']');
                }
                None => out.push_str("[Function (anonymous)]"),
            }
        }
        RuntimeValue::Array(items) => {
            let id = items.as_ptr() as usize;
            if visiting.contains(&id) {
                out.push_str("[Circular]");
                return;
            }
            visiting.push(id);
            out.push('[');
            for (i, item) in items.borrow().iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_value(out, item, visiting);
            }
            out.push(']');
            visiting.pop();
        }
        RuntimeValue::Object(entries) => {
            let id = entries.as_ptr() as usize;
            if visiting.contains(&id) {
                out.push_str("[Circular]");
                return;
            }
            let entries = entries.borrow();
            if entries.is_empty() {
                out.push_str("{}");
                return;
            }
            visiting.push(id);
            out.push_str("{ ");
            for (i, (key, item)) in entries.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                if is_identifier(key) {
                    out.push_str(key);
                } else {
                    write_quoted(out, key);
                }
                out.push_str(": ");
                write_value(out, item, visiting);
            }
            out.push_str(" }");
            visiting.pop();
        }
    }
}

fn write_quoted(out: &mut String, s: &str) {
    out.push('\'');
    for c in s.chars() {
        match c {
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out.push('\'');
}

fn is_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use pretty_assertions::assert_eq;

    fn num(n: f64) -> RuntimeValue {
        RuntimeValue::Number(n)
    }

    #[test]
    fn primitives() {
        assert_eq!(inspect(&RuntimeValue::Undefined), "undefined");
        assert_eq!(inspect(&RuntimeValue::Null), "null");
        assert_eq!(inspect(&RuntimeValue::Boolean(true)), "true");
        assert_eq!(inspect(&num(-0.0)), "0");
        assert_eq!(inspect(&RuntimeValue::string("it's\n")), "'it\\'s\\n'");
    }

    #[test]
    fn containers() {
        let xs = RuntimeValue::array(vec![num(1.0), num(2.0), num(3.0)]);
        assert_eq!(inspect(&xs), "[1, 2, 3]");

        let mut entries = IndexMap::new();
        entries.insert("a".to_string(), num(1.0));
        entries.insert("b c".to_string(), RuntimeValue::array(vec![]));
        assert_eq!(inspect(&RuntimeValue::object(entries)), "{ a: 1, 'b c': [] }");
        assert_eq!(inspect(&RuntimeValue::object(IndexMap::new())), "{}");
    }

    #[test]
    fn cycles_are_marked() {
        let xs = RuntimeValue::array(vec![num(1.0)]);
        if let RuntimeValue::Array(items) = &xs {
            items.borrow_mut().push(xs.clone());
        }
        assert_eq!(inspect(&xs), "[1, [Circular]]");
    }

    #[test]
    fn shared_but_acyclic_values_are_printed_twice() {
        let inner = RuntimeValue::array(vec![num(1.0)]);
        let outer = RuntimeValue::array(vec![inner.clone(), inner]);
        assert_eq!(inspect(&outer), "[[1], [1]]");
    }

    #[test]
    fn closures_render_through_the_trait() {
        let upper = |v: &RuntimeValue| v.to_display_string().to_uppercase();
        assert_eq!(upper.render(&RuntimeValue::string("abc")), "ABC");
        assert_eq!(Inspect.render(&RuntimeValue::string("abc")), "'abc'");
    }
}
