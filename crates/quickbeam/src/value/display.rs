//! Display and Debug implementations for Value

use std::fmt;

use super::*;

/// Format a number the way `print` shows it: integral values without a
/// fractional part.
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e16 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Write a value, tracking the objects and lists currently being printed so
/// that a self-reference prints `{...}` or `[...]` instead of recursing.
fn write_value(
    f: &mut fmt::Formatter<'_>,
    value: &Value,
    quote_strings: bool,
    open: &mut Vec<*const ()>,
) -> fmt::Result {
    match value {
        Value::Nil => write!(f, "nil"),
        Value::Bool(b) => write!(f, "{}", b),
        Value::Number(n) => write!(f, "{}", format_number(*n)),
        Value::String(s) if quote_strings => write!(f, "{:?}", s.as_ref()),
        Value::String(s) => write!(f, "{}", s),
        Value::Function(func) => write!(f, "<function {}>", func.name()),
        Value::Class(class) => write!(f, "<class {}>", class.name()),
        Value::Object(obj) => {
            let ptr = Rc::as_ptr(obj).cast::<()>();
            if open.contains(&ptr) {
                return write!(f, "{{...}}");
            }
            open.push(ptr);

            if let Some(class) = obj.class() {
                write!(f, "{} ", class.name())?;
            }
            let entries = obj.entries();
            if entries.is_empty() {
                write!(f, "{{}}")?;
            } else {
                write!(f, "{{ ")?;
                for (i, (name, field)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: ", name)?;
                    // Nested strings are always quoted
                    write_value(f, field, true, open)?;
                }
                write!(f, " }}")?;
            }

            open.pop();
            Ok(())
        }
        Value::List(list) => {
            let ptr = Rc::as_ptr(list).cast::<()>();
            if open.contains(&ptr) {
                return write!(f, "[...]");
            }
            open.push(ptr);

            write!(f, "[")?;
            for (i, item) in list.items().iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write_value(f, item, true, open)?;
            }
            write!(f, "]")?;

            open.pop();
            Ok(())
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_value(f, self, false, &mut Vec::new())
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_value(f, self, true, &mut Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(55.0), "55");
        assert_eq!(format_number(-3.0), "-3");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(f64::INFINITY), "inf");
    }

    #[test]
    fn test_display_strings_raw_debug_quoted() {
        let v = Value::string("Fizz");
        assert_eq!(v.to_string(), "Fizz");
        assert_eq!(format!("{:?}", v), "\"Fizz\"");
    }

    #[test]
    fn test_display_object_literal() {
        let obj = ObjectValue::literal(vec![
            ("x".to_string(), Value::Number(1.0)),
            ("name".to_string(), Value::string("a")),
        ]);
        let v = Value::Object(Rc::new(obj));
        assert_eq!(v.to_string(), "{ x: 1, name: \"a\" }");
    }

    #[test]
    fn test_display_self_reference() {
        let obj = Rc::new(ObjectValue::literal(Vec::new()));
        obj.set("me", Value::Object(Rc::clone(&obj))).unwrap();
        let v = Value::Object(obj);
        assert_eq!(v.to_string(), "{ me: {...} }");
    }

    #[test]
    fn test_display_list() {
        let inner = Value::list(vec![Value::string("b")]);
        let v = Value::list(vec![Value::Number(1.0), Value::string("a"), inner, Value::Nil]);
        assert_eq!(v.to_string(), "[1, \"a\", [\"b\"], nil]");
        assert_eq!(Value::list(Vec::new()).to_string(), "[]");
    }

    #[test]
    fn test_display_list_cycle() {
        let list = Rc::new(ListValue::new(vec![Value::Nil]));
        list.set(0, Value::List(Rc::clone(&list)));
        assert_eq!(Value::List(list).to_string(), "[[...]]");
    }

    #[test]
    fn test_display_scalars() {
        assert_eq!(Value::Nil.to_string(), "nil");
        assert_eq!(Value::Bool(true).to_string(), "true");
    }
}
