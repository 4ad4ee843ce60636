// File: src/builtins.rs
//
// Built-in operations for the Sprig language.
// Operators and the value-only built-ins (`concat`, `arg`) are plain functions
// over Values so the interpreter stays a tree walk. `map` and `filter` call
// back into user functions and therefore live in the interpreter.

use crate::ast::{BinaryOperator, RelOperator, UnaryOperator};
use crate::errors::{ErrorKind, SprigError};
use crate::interpreter::Value;

/// Built-in call keywords, in the order they are listed by the REPL
pub const BUILTIN_NAMES: [&str; 5] = ["print", "arg", "concat", "map", "filter"];

fn expect_int(op: impl std::fmt::Display, value: &Value) -> Result<i64, SprigError> {
    match value {
        Value::Int(n) => Ok(*n),
        other => Err(SprigError::type_error(format!(
            "Operator '{}' expects int operands, got {}",
            op,
            other.type_name()
        ))),
    }
}

fn overflow(op: BinaryOperator, a: i64, b: i64) -> SprigError {
    SprigError::new(ErrorKind::Overflow, format!("Integer overflow in {} {} {}", a, op, b))
}

/// Checked integer arithmetic; `/` truncates toward zero
pub fn arithmetic(op: BinaryOperator, left: &Value, right: &Value) -> Result<Value, SprigError> {
    let a = expect_int(op, left)?;
    let b = expect_int(op, right)?;
    let result = match op {
        BinaryOperator::Add => a.checked_add(b),
        BinaryOperator::Sub => a.checked_sub(b),
        BinaryOperator::Mul => a.checked_mul(b),
        BinaryOperator::Div => {
            if b == 0 {
                return Err(SprigError::new(ErrorKind::DivisionByZero, "Division by zero"));
            }
            a.checked_div(b)
        }
    };
    result.map(Value::Int).ok_or_else(|| overflow(op, a, b))
}

pub fn unary(op: UnaryOperator, operand: &Value) -> Result<Value, SprigError> {
    let n = expect_int(op, operand)?;
    match op {
        UnaryOperator::Plus => Ok(Value::Int(n)),
        UnaryOperator::Minus => n.checked_neg().map(Value::Int).ok_or_else(|| {
            SprigError::new(ErrorKind::Overflow, format!("Integer overflow in -({})", n))
        }),
    }
}

/// `!` on a boolean
pub fn negate(operand: &Value) -> Result<Value, SprigError> {
    match operand {
        Value::Bool(b) => Ok(Value::Bool(!b)),
        other => Err(SprigError::type_error(format!(
            "Operator '!' expects a bool operand, got {}",
            other.type_name()
        ))),
    }
}

/// `>`/`<` order ints; `==`/`!=` compare values of the same kind structurally
pub fn compare(op: RelOperator, left: &Value, right: &Value) -> Result<Value, SprigError> {
    match op {
        RelOperator::Gt => Ok(Value::Bool(expect_int(op, left)? > expect_int(op, right)?)),
        RelOperator::Lt => Ok(Value::Bool(expect_int(op, left)? < expect_int(op, right)?)),
        RelOperator::Eq | RelOperator::Dif => {
            if !left.comparable_with(right) {
                return Err(SprigError::type_error(format!(
                    "Cannot compare {} with {} using '{}'",
                    left.type_name(),
                    right.type_name(),
                    op
                )));
            }
            let equal = left == right;
            Ok(Value::Bool(if op == RelOperator::Eq { equal } else { !equal }))
        }
    }
}

/// Concatenates the rendered form of every part
pub fn concat(parts: &[Value]) -> Result<Value, SprigError> {
    let mut result = String::new();
    for part in parts {
        if part.is_void() {
            return Err(SprigError::type_error("concat() cannot render a void value"));
        }
        result.push_str(&part.to_string());
    }
    Ok(Value::Str(result))
}

/// Command-line argument at a 0-based `index`
pub fn argument(args: &[Value], index: &Value) -> Result<Value, SprigError> {
    let position = match index {
        Value::Int(n) => *n,
        other => {
            return Err(SprigError::type_error(format!(
                "arg() expects an int index, got {}",
                other.type_name()
            )))
        }
    };
    usize::try_from(position).ok().and_then(|i| args.get(i)).cloned().ok_or_else(|| {
        SprigError::new(
            ErrorKind::ArgumentError,
            format!("Argument index {} out of range ({} supplied)", position, args.len()),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arithmetic_is_checked() {
        assert_eq!(
            arithmetic(BinaryOperator::Sub, &Value::Int(10), &Value::Int(15)).unwrap(),
            Value::Int(-5)
        );
        assert_eq!(
            arithmetic(BinaryOperator::Div, &Value::Int(-7), &Value::Int(2)).unwrap(),
            Value::Int(-3)
        );

        let err = arithmetic(BinaryOperator::Div, &Value::Int(1), &Value::Int(0)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::DivisionByZero);

        let err = arithmetic(BinaryOperator::Add, &Value::Int(i64::MAX), &Value::Int(1)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Overflow);

        let err = arithmetic(BinaryOperator::Div, &Value::Int(i64::MIN), &Value::Int(-1)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Overflow);

        let err = unary(UnaryOperator::Minus, &Value::Int(i64::MIN)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Overflow);
    }

    #[test]
    fn test_arithmetic_rejects_non_ints() {
        let err = arithmetic(BinaryOperator::Add, &Value::Str("a".into()), &Value::Int(1)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::TypeError);
        assert_eq!(err.message, "Operator '+' expects int operands, got string");
    }

    #[test]
    fn test_compare() {
        assert_eq!(compare(RelOperator::Gt, &Value::Int(3), &Value::Int(2)).unwrap(), Value::Bool(true));
        assert_eq!(
            compare(RelOperator::Eq, &Value::Str("a".into()), &Value::Str("a".into())).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            compare(
                RelOperator::Dif,
                &Value::Array(vec![Value::Int(1)]),
                &Value::Array(vec![Value::Int(1), Value::Int(2)])
            )
            .unwrap(),
            Value::Bool(true)
        );

        let err = compare(RelOperator::Eq, &Value::Int(1), &Value::Bool(true)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::TypeError);
        let err = compare(RelOperator::Lt, &Value::Str("a".into()), &Value::Int(1)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::TypeError);
    }

    #[test]
    fn test_negate() {
        assert_eq!(negate(&Value::Bool(true)).unwrap(), Value::Bool(false));
        assert_eq!(negate(&Value::Int(0)).unwrap_err().kind, ErrorKind::TypeError);
    }

    #[test]
    fn test_concat_renders_each_part() {
        let parts = vec![
            Value::Str("n=".into()),
            Value::Int(4),
            Value::Bool(false),
            Value::Array(vec![Value::Int(1), Value::Int(2)]),
        ];
        assert_eq!(concat(&parts).unwrap(), Value::Str("n=4false[1, 2]".into()));
        assert_eq!(concat(&[Value::Void]).unwrap_err().kind, ErrorKind::TypeError);
    }

    #[test]
    fn test_argument_lookup() {
        let args = vec![Value::Int(7), Value::Str("x".into())];
        assert_eq!(argument(&args, &Value::Int(1)).unwrap(), Value::Str("x".into()));

        let err = argument(&args, &Value::Int(2)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ArgumentError);
        assert_eq!(err.message, "Argument index 2 out of range (2 supplied)");

        assert_eq!(argument(&args, &Value::Int(-1)).unwrap_err().kind, ErrorKind::ArgumentError);
        assert_eq!(argument(&args, &Value::Bool(true)).unwrap_err().kind, ErrorKind::TypeError);
    }
}
