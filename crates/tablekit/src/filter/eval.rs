//! Evaluation of a parsed filter against one record.

use crate::error::EvalError;
use crate::record::{Record, Value};

use super::parser::{CompareOp, Expr};

/// Evaluate `expr` against `record`.
///
/// `&&` and `||` short-circuit and yield booleans. Ordering comparisons
/// between values that cannot be ordered (a string and a number, or
/// anything with a missing value) are false rather than an error.
pub fn evaluate(expr: &Expr, record: &Record) -> Result<Value, EvalError> {
    Ok(match expr {
        Expr::Literal(value) => value.clone(),
        Expr::Column(name) => record.get(name).cloned().unwrap_or_default(),
        Expr::Unknown(name) => return Err(EvalError::UnknownName(name.clone())),
        Expr::Not(inner) => Value::Bool(!evaluate(inner, record)?.is_truthy()),
        Expr::Neg(inner) => match evaluate(inner, record)? {
            Value::Int(i) => Value::Int(i.wrapping_neg()),
            Value::Float(f) => Value::Float(-f),
            other => {
                return Err(EvalError::TypeMismatch {
                    left: "number",
                    right: other.type_name(),
                });
            }
        },
        Expr::And(terms) => {
            for term in terms {
                if !evaluate(term, record)?.is_truthy() {
                    return Ok(Value::Bool(false));
                }
            }
            Value::Bool(true)
        }
        Expr::Or(terms) => {
            for term in terms {
                if evaluate(term, record)?.is_truthy() {
                    return Ok(Value::Bool(true));
                }
            }
            Value::Bool(false)
        }
        Expr::Compare(op, lhs, rhs) => {
            let lhs = evaluate(lhs, record)?;
            let rhs = evaluate(rhs, record)?;
            Value::Bool(compare(*op, &lhs, &rhs))
        }
    })
}

fn compare(op: CompareOp, lhs: &Value, rhs: &Value) -> bool {
    let ordering = match op {
        CompareOp::Eq => return lhs.loose_eq(rhs),
        CompareOp::Ne => return !lhs.loose_eq(rhs),
        _ if matches!(lhs, Value::Null) || matches!(rhs, Value::Null) => return false,
        _ => lhs.partial_compare(rhs),
    };
    let Some(ordering) = ordering else {
        return false;
    };
    match op {
        CompareOp::Lt => ordering.is_lt(),
        CompareOp::Le => ordering.is_le(),
        CompareOp::Gt => ordering.is_gt(),
        CompareOp::Ge => ordering.is_ge(),
        CompareOp::Eq => ordering.is_eq(),
        CompareOp::Ne => ordering.is_ne(),
    }
}
