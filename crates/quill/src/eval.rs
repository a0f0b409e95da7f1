use quill_rt::accessor::Accessor;
use quill_rt::value::{NUMBER_EPSILON, Value, numbers_equal};

use crate::ast::{BinaryOp, Expr, UnaryOp};
use crate::error::{Error, ErrorCode};
use crate::span::TextSpan;

/// Evaluates an expression against a scope. Errors carry an empty span; the
/// renderer rebinds them to the span of the node holding the expression.
pub fn evaluate(expr: &Expr, scope: &dyn Accessor) -> Result<Value, Error> {
    match expr {
        Expr::Number(v) => Ok(Value::Number(*v)),
        Expr::Boolean(v) => Ok(Value::Boolean(*v)),
        Expr::Str(v) => Ok(Value::Text(v.clone())),
        Expr::Ident(name) => scope
            .get(name)
            .ok_or_else(|| err(ErrorCode::MissingIdent, format!("unknown identifier '{name}'"))),
        Expr::Member(target, name) => {
            let base = evaluate(target, scope)?;
            match base {
                Value::Map(mut fields) => fields.remove(name.as_str()).ok_or_else(|| {
                    err(
                        ErrorCode::MissingMember,
                        format!("value has no member '{name}'"),
                    )
                }),
                other => Err(err(
                    ErrorCode::TypeMismatch,
                    format!(
                        "Member access requires a map/object value, but got {}",
                        other.kind_name()
                    ),
                )),
            }
        }
        Expr::Unary(op, operand) => {
            let value = evaluate(operand, scope)?;
            eval_unary(*op, value)
        }
        Expr::Binary(op, left, right) => {
            // both operands always evaluate, left first; `&&`/`||` do not
            // short-circuit so type errors on the right are never swallowed
            let left = evaluate(left, scope)?;
            let right = evaluate(right, scope)?;
            eval_binary(*op, left, right)
        }
    }
}

fn eval_unary(op: UnaryOp, value: Value) -> Result<Value, Error> {
    match op {
        UnaryOp::Not => match value {
            Value::Boolean(v) => Ok(Value::Boolean(!v)),
            other => Err(err(
                ErrorCode::TypeMismatch,
                format!(
                    "Operator '!' requires a boolean operand, but got {}",
                    other.kind_name()
                ),
            )),
        },
        UnaryOp::Neg => match value {
            Value::Number(v) => Ok(Value::Number(-v)),
            other => Err(err(
                ErrorCode::TypeMismatch,
                format!(
                    "Operator '-' requires a number operand, but got {}",
                    other.kind_name()
                ),
            )),
        },
    }
}

fn eval_binary(op: BinaryOp, left: Value, right: Value) -> Result<Value, Error> {
    match op {
        BinaryOp::Add => eval_add(left, right),
        BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
            eval_arith(op, left, right)
        }
        BinaryOp::Eq | BinaryOp::NotEq => eval_equality(op, left, right),
        BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => {
            eval_compare(op, left, right)
        }
        BinaryOp::And | BinaryOp::Or => eval_bool(op, left, right),
    }
}

fn eval_add(left: Value, right: Value) -> Result<Value, Error> {
    match (left, right) {
        (Value::Text(a), Value::Text(b)) => Ok(Value::Text(format!("{a}{b}"))),
        (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
        (a, b) => Err(err(
            ErrorCode::TypeMismatch,
            format!(
                "Operator '+' requires two numbers or two text values, but got {} and {}",
                a.kind_name(),
                b.kind_name()
            ),
        )),
    }
}

fn eval_arith(op: BinaryOp, left: Value, right: Value) -> Result<Value, Error> {
    let (a, b) = match (left, right) {
        (Value::Number(a), Value::Number(b)) => (a, b),
        (a, b) => {
            return Err(err(
                ErrorCode::TypeMismatch,
                format!(
                    "Operator '{}' requires number operands, but got {} and {}",
                    op.symbol(),
                    a.kind_name(),
                    b.kind_name()
                ),
            ));
        }
    };
    match op {
        BinaryOp::Sub => Ok(Value::Number(a - b)),
        BinaryOp::Mul => Ok(Value::Number(a * b)),
        BinaryOp::Div => {
            if b.abs() < NUMBER_EPSILON {
                Err(err(ErrorCode::DivisionByZero, "division by zero"))
            } else {
                Ok(Value::Number(a / b))
            }
        }
        BinaryOp::Mod => {
            if b.abs() < NUMBER_EPSILON {
                Err(err(ErrorCode::DivisionByZero, "modulo by zero"))
            } else {
                Ok(Value::Number(a % b))
            }
        }
        _ => Err(err(
            ErrorCode::UnsupportedOp,
            format!("operator '{}' is not an arithmetic operator", op.symbol()),
        )),
    }
}

fn eval_equality(op: BinaryOp, left: Value, right: Value) -> Result<Value, Error> {
    let equal = match (&left, &right) {
        (Value::Number(a), Value::Number(b)) => numbers_equal(*a, *b),
        (Value::Boolean(a), Value::Boolean(b)) => a == b,
        (Value::Text(a), Value::Text(b)) => a == b,
        _ => {
            return Err(err(
                ErrorCode::TypeMismatch,
                format!(
                    "Operator '{}' requires two numbers, two booleans, or two text values, but got {} and {}",
                    op.symbol(),
                    left.kind_name(),
                    right.kind_name()
                ),
            ));
        }
    };
    match op {
        BinaryOp::Eq => Ok(Value::Boolean(equal)),
        BinaryOp::NotEq => Ok(Value::Boolean(!equal)),
        _ => Err(err(
            ErrorCode::UnsupportedOp,
            format!("operator '{}' is not an equality operator", op.symbol()),
        )),
    }
}

fn eval_compare(op: BinaryOp, left: Value, right: Value) -> Result<Value, Error> {
    let (a, b) = match (left, right) {
        (Value::Number(a), Value::Number(b)) => (a, b),
        (a, b) => {
            return Err(err(
                ErrorCode::TypeMismatch,
                format!(
                    "Operator '{}' requires number operands, but got {} and {}",
                    op.symbol(),
                    a.kind_name(),
                    b.kind_name()
                ),
            ));
        }
    };
    let result = match op {
        BinaryOp::Lt => a < b,
        BinaryOp::LtEq => a <= b,
        BinaryOp::Gt => a > b,
        BinaryOp::GtEq => a >= b,
        _ => {
            return Err(err(
                ErrorCode::UnsupportedOp,
                format!("operator '{}' is not a comparison operator", op.symbol()),
            ));
        }
    };
    Ok(Value::Boolean(result))
}

fn eval_bool(op: BinaryOp, left: Value, right: Value) -> Result<Value, Error> {
    let (a, b) = match (left, right) {
        (Value::Boolean(a), Value::Boolean(b)) => (a, b),
        (a, b) => {
            return Err(err(
                ErrorCode::TypeMismatch,
                format!(
                    "Operator '{}' requires boolean operands, but got {} and {}",
                    op.symbol(),
                    a.kind_name(),
                    b.kind_name()
                ),
            ));
        }
    };
    let result = match op {
        BinaryOp::And => a && b,
        BinaryOp::Or => a || b,
        _ => {
            return Err(err(
                ErrorCode::UnsupportedOp,
                format!("operator '{}' is not a boolean operator", op.symbol()),
            ));
        }
    };
    Ok(Value::Boolean(result))
}

fn err(code: ErrorCode, message: impl Into<String>) -> Error {
    Error::new(code, TextSpan::at(0), message)
}
