//! Canonical rendering of values and REPL output lines.
//!
//! This is the one place where textual fidelity matters: negative numbers
//! use the ML tilde, reals always show a decimal point, chars print as
//! `#"c"`, strings are quoted, lists bracketed, tuples parenthesised and
//! records braced with their labels in canonical order.

use std::fmt;

use crate::interpreter::Value;
use crate::types::Type;

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", pretty(self))
    }
}

pub fn pretty(value: &Value) -> String {
    match value {
        Value::Unit => "()".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Char(c) => format!("#\"{}\"", c),
        Value::Int(i) => pretty_int(*i),
        Value::Real(r) => pretty_real(*r),
        Value::String(s) => pretty_string(s),
        Value::List(values) => format!(
            "[{}]",
            values.iter().map(pretty).collect::<Vec<_>>().join(",")
        ),
        Value::Tuple(values) => format!(
            "({})",
            values.iter().map(pretty).collect::<Vec<_>>().join(",")
        ),
        Value::Record { labels, values } => format!(
            "{{{}}}",
            labels
                .iter()
                .zip(values)
                .map(|(l, v)| format!("{}={}", l, pretty(v)))
                .collect::<Vec<_>>()
                .join(",")
        ),
        Value::Con(name, None) => name.clone(),
        Value::Con(name, Some(arg)) => match arg.as_ref() {
            arg @ (Value::Con(_, Some(_)) | Value::Con(_, None)) => {
                format!("{} ({})", name, pretty(arg))
            }
            arg => format!("{} {}", name, pretty(arg)),
        },
        Value::ConFn(_)
        | Value::Closure(_)
        | Value::BuiltIn(_)
        | Value::Partial(_, _)
        | Value::Selector(_) => "fn".to_string(),
    }
}

fn pretty_int(i: i64) -> String {
    if i < 0 {
        format!("~{}", i.unsigned_abs())
    } else {
        i.to_string()
    }
}

fn pretty_real(r: f64) -> String {
    if r.is_nan() {
        return "nan".to_string();
    }
    if r.is_infinite() {
        return if r < 0.0 { "~inf" } else { "inf" }.to_string();
    }
    let rendered = if r == r.trunc() {
        format!("{:.1}", r)
    } else {
        format!("{}", r)
    };
    rendered.replace('-', "~")
}

fn pretty_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// The REPL line for one new binding.
pub fn binding_line(name: &str, value: &Value, ty: &Type) -> String {
    format!("val {} = {} : {}", name, pretty(value), ty.description())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;
    use crate::types::ty::INT;

    #[test]
    fn test_pretty_scalars() {
        assert_eq!(pretty(&Value::Int(3)), "3");
        assert_eq!(pretty(&Value::Int(-3)), "~3");
        assert_eq!(pretty(&Value::Real(3.0)), "3.0");
        assert_eq!(pretty(&Value::Real(-0.5)), "~0.5");
        assert_eq!(pretty(&Value::Char('x')), "#\"x\"");
        assert_eq!(pretty(&Value::String("hi\"".into())), "\"hi\\\"\"");
        assert_eq!(pretty(&Value::Unit), "()");
        assert_eq!(pretty(&Value::Bool(true)), "true");
    }

    #[test]
    fn test_pretty_compounds() {
        let list = Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        assert_eq!(pretty(&list), "[1,2,3]");
        let tuple = Value::Tuple(vec![Value::Int(1), Value::String("a".into())]);
        assert_eq!(pretty(&tuple), "(1,\"a\")");
        let record = Value::Record {
            labels: Rc::new(vec!["c".into(), "dept".into()]),
            values: vec![Value::Int(2), Value::Int(10)],
        };
        assert_eq!(pretty(&record), "{c=2,dept=10}");
    }

    #[test]
    fn test_pretty_constructors() {
        assert_eq!(pretty(&Value::Con("NONE".into(), None)), "NONE");
        assert_eq!(
            pretty(&Value::Con("SOME".into(), Some(Box::new(Value::Int(1))))),
            "SOME 1"
        );
    }

    #[test]
    fn test_binding_line() {
        assert_eq!(
            binding_line("it", &Value::Int(3), &INT),
            "val it = 3 : int"
        );
    }
}
