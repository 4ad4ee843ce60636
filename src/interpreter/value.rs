// File: src/interpreter/value.rs
//
// Runtime value types for the Sprig language.

use super::environment::Environment;
use crate::ast::Block;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// A declared function together with the environment it was declared in
pub struct Function {
    pub name: String,
    pub description: Option<String>,
    pub params: Vec<String>,
    pub body: Block,
    pub closure: Rc<RefCell<Environment>>,
}

impl fmt::Debug for Function {
    // The closure is left out: it usually contains this very function
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub enum Value {
    Int(i64),
    Bool(bool),
    Str(String),
    Array(Vec<Value>),
    Function(Rc<Function>),
    /// Result of a call that returned nothing; never rendered
    Void,
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Bool(_) => "bool",
            Value::Str(_) => "string",
            Value::Array(_) => "array",
            Value::Function(_) => "function",
            Value::Void => "void",
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Value::Void)
    }

    /// Converts a command-line argument: integers and booleans are recognised,
    /// everything else stays a string
    pub fn from_arg(raw: &str) -> Value {
        if let Ok(n) = raw.parse::<i64>() {
            return Value::Int(n);
        }
        match raw {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => Value::Str(raw.to_string()),
        }
    }

    /// True when `==`/`!=` may compare the two values
    pub fn comparable_with(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Int(_), Value::Int(_))
            | (Value::Bool(_), Value::Bool(_))
            | (Value::Str(_), Value::Str(_)) => true,
            (Value::Array(a), Value::Array(b)) => {
                a.len() != b.len() || a.iter().zip(b.iter()).all(|(x, y)| x.comparable_with(y))
            }
            _ => false,
        }
    }
}

/// Structural equality; functions are equal only to themselves
impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Void, Value::Void) => true,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Str(s) => write!(f, "{}", s),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Function(func) => write!(f, "<func {}({})>", func.name, func.params.join(", ")),
            Value::Void => write!(f, "void"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_arg_conversions() {
        assert_eq!(Value::from_arg("42"), Value::Int(42));
        assert_eq!(Value::from_arg("-3"), Value::Int(-3));
        assert_eq!(Value::from_arg("true"), Value::Bool(true));
        assert_eq!(Value::from_arg("False"), Value::Str("False".to_string()));
        assert_eq!(Value::from_arg("4x"), Value::Str("4x".to_string()));
    }

    #[test]
    fn test_rendering() {
        let nested = Value::Array(vec![Value::Int(1), Value::Array(vec![Value::Str("a".into())])]);
        assert_eq!(nested.to_string(), "[1, [a]]");

        let function = Function {
            name: "add".to_string(),
            description: None,
            params: vec!["a".to_string(), "b".to_string()],
            body: Block::default(),
            closure: Environment::new("root").into_ref(),
        };
        assert_eq!(Value::Function(Rc::new(function)).to_string(), "<func add(a, b)>");
    }
}
