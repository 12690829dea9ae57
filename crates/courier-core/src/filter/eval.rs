use std::cmp::Ordering;

use serde_json::Value;

use super::parser::{CompareOp, Expr, Operand, Segment};

static NULL: Value = Value::Null;

impl Expr {
    pub(crate) fn eval(&self, record: &Value) -> bool {
        match self {
            Expr::Or(terms) => terms.iter().any(|term| term.eval(record)),
            Expr::And(terms) => terms.iter().all(|term| term.eval(record)),
            Expr::Not(inner) => !inner.eval(record),
            Expr::Truthy(operand) => is_truthy(resolve(operand, record)),
            Expr::Compare { left, op, right } => {
                compare(resolve(left, record), *op, resolve(right, record))
            }
        }
    }
}

fn resolve<'a>(operand: &'a Operand, record: &'a Value) -> &'a Value {
    match operand {
        Operand::Literal(value) => value,
        Operand::Path(segments) => segments
            .iter()
            .try_fold(record, |current, segment| match segment {
                Segment::Key(key) => current.as_object().and_then(|o| o.get(key)),
                Segment::Index(idx) => current.as_array().and_then(|a| a.get(*idx)),
            })
            .unwrap_or(&NULL),
    }
}

fn compare(left: &Value, op: CompareOp, right: &Value) -> bool {
    match op {
        CompareOp::Eq => json_equals(left, right),
        CompareOp::Ne => !json_equals(left, right),
        CompareOp::Lt => ordering(left, right).is_some_and(|o| o == Ordering::Less),
        CompareOp::Le => ordering(left, right).is_some_and(|o| o != Ordering::Greater),
        CompareOp::Gt => ordering(left, right).is_some_and(|o| o == Ordering::Greater),
        CompareOp::Ge => ordering(left, right).is_some_and(|o| o != Ordering::Less),
        CompareOp::Contains => contains(left, right),
        CompareOp::In => contains(right, left),
        CompareOp::StartsWith => match (left, right) {
            (Value::String(s), Value::String(prefix)) => s.starts_with(prefix.as_str()),
            _ => false,
        },
        CompareOp::EndsWith => match (left, right) {
            (Value::String(s), Value::String(suffix)) => s.ends_with(suffix.as_str()),
            _ => false,
        },
    }
}

/// JSON equality where numbers compare by value (`1 == 1.0`).
fn json_equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| json_equals(x, y))
        }
        _ => left == right,
    }
}

fn ordering(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn contains(haystack: &Value, needle: &Value) -> bool {
    match (haystack, needle) {
        (Value::String(s), Value::String(sub)) => s.contains(sub.as_str()),
        (Value::Array(items), needle) => items.iter().any(|item| json_equals(item, needle)),
        (Value::Object(map), Value::String(key)) => map.contains_key(key),
        _ => false,
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
