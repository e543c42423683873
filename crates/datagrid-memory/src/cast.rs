//! CAST evaluation.
//!
//! Supported target families:
//!
//! | Family | Type names | Result |
//! |--------|------------|--------|
//! | Integer | `int`, `integer`, `bigint`, `smallint`, `signed`, `unsigned` | JSON integer, truncated toward zero |
//! | Decimal | `decimal`, `numeric`, `real`, `float`, `double`, `double precision` | JSON float |
//! | Text | `char`, `varchar`, `text`, `character varying` | JSON string, cut to the length if one is given |
//!
//! Values that do not convert become `null`, as a failed cast would in most
//! SQL dialects' permissive mode.

use datagrid::CastType;
use serde_json::{Number, Value};

use crate::error::{MemoryError, Result};

/// A resolved cast target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastTarget {
    Integer,
    Decimal,
    Text(Option<u32>),
}

impl CastTarget {
    /// Resolves a cast type by name, case-insensitively.
    pub fn resolve(cast: &CastType) -> Result<Self> {
        let name = cast.name.to_ascii_lowercase();
        let target = match name.as_str() {
            "int" | "integer" | "bigint" | "smallint" | "signed" | "unsigned"
            | "signed integer" | "unsigned integer" => CastTarget::Integer,
            "decimal" | "numeric" | "real" | "float" | "double" | "double precision" => {
                CastTarget::Decimal
            }
            "char" | "varchar" | "text" | "character" | "character varying" => {
                CastTarget::Text(cast.length)
            }
            _ => return Err(MemoryError::UnsupportedCast(cast.name.clone())),
        };
        Ok(target)
    }

    /// Converts a value to this target.
    pub fn apply(self, value: &Value) -> Value {
        match self {
            CastTarget::Integer => to_number(value)
                .map(|n| Value::from(n.trunc() as i64))
                .unwrap_or(Value::Null),
            CastTarget::Decimal => to_number(value)
                .and_then(Number::from_f64)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            CastTarget::Text(length) => match text_form(value) {
                Some(text) => match length {
                    Some(length) => Value::String(text.chars().take(length as usize).collect()),
                    None => Value::String(text),
                },
                None => Value::Null,
            },
        }
    }
}

fn to_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
    .filter(|n| n.is_finite())
}

/// Returns the text a value compares as, or `None` for null and composites.
pub fn text_form(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
        _ => None,
    }
}
