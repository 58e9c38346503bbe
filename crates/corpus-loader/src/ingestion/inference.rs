//! Datatype inference over sampled cell values

use crate::types::table::{is_boolean_literal, parse_datetime, parse_float};
use crate::types::{DataType, Value};

/// Best-guess datatype for a column sample.
///
/// Missing values are ignored. The first type every remaining value fits
/// wins, in the order INTEGER, FLOAT, BOOLEAN, DATETIME; anything else is
/// TEXT. Text that parses as a datetime promotes the column to DATETIME.
pub fn infer_datatype(values: &[Value]) -> DataType {
    let present: Vec<&Value> = values.iter().filter(|v| !is_missing(v)).collect();
    if present.is_empty() {
        return DataType::Text;
    }

    if present.iter().all(|v| is_integral(v)) {
        DataType::Integer
    } else if present.iter().all(|v| is_numeric(v)) {
        DataType::Float
    } else if present.iter().all(|v| is_boolean(v)) {
        DataType::Boolean
    } else if present.iter().all(|v| is_datetime(v)) {
        DataType::DateTime
    } else {
        DataType::Text
    }
}

fn is_missing(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Text(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn is_integral(value: &Value) -> bool {
    match value {
        Value::Integer(_) => true,
        Value::Float(f) => f.is_finite() && f.fract() == 0.0,
        Value::Text(s) => s.trim().parse::<i64>().is_ok(),
        _ => false,
    }
}

fn is_numeric(value: &Value) -> bool {
    match value {
        Value::Integer(_) | Value::Float(_) => true,
        Value::Text(s) => parse_float(s).is_some(),
        _ => false,
    }
}

fn is_boolean(value: &Value) -> bool {
    match value {
        Value::Boolean(_) => true,
        Value::Text(s) => is_boolean_literal(s),
        _ => false,
    }
}

fn is_datetime(value: &Value) -> bool {
    match value {
        Value::DateTime(_) => true,
        Value::Text(s) => parse_datetime(s).is_some(),
        _ => false,
    }
}
