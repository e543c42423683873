//! Value comparison for predicates and ORDER BY.

use std::cmp::Ordering;

use datagrid::Dir;
use serde_json::Value;

/// Compares two values for a predicate.
///
/// Numbers compare numerically, strings lexically, booleans as `false <
/// true`. A string compared with a number is parsed as a number first and
/// falls back to comparing text forms. Returns `None` when either side is
/// null or the values cannot be compared (arrays, objects, NaN).
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Null, _) | (_, Value::Null) => None,
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Number(x), Value::String(s)) => match s.trim().parse::<f64>() {
            Ok(y) => x.as_f64()?.partial_cmp(&y),
            Err(_) => Some(x.to_string().as_str().cmp(s.as_str())),
        },
        (Value::String(_), Value::Number(_)) => compare_values(b, a).map(Ordering::reverse),
        _ => None,
    }
}

fn rank(value: &Value) -> u8 {
    match value {
        Value::Bool(_) => 0,
        Value::Number(_) => 1,
        Value::String(_) => 2,
        Value::Array(_) => 3,
        Value::Object(_) => 4,
        Value::Null => 5,
    }
}

/// Total order used for sorting.
///
/// Nulls sort last. Values of different kinds order by kind; values that
/// [`compare_values`] cannot order are treated as equal so the sort stays
/// stable.
pub fn sort_order(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Greater,
        (_, Value::Null) => Ordering::Less,
        _ if rank(a) != rank(b) => rank(a).cmp(&rank(b)),
        _ => compare_values(a, b).unwrap_or(Ordering::Equal),
    }
}

/// Compares two sort keys term by term.
///
/// The first term is the primary key, later terms break ties.
pub fn compare_keys(a: &[Value], b: &[Value], dirs: &[Dir]) -> Ordering {
    for ((x, y), dir) in a.iter().zip(b).zip(dirs) {
        let ordering = dir.apply(sort_order(x, y));
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn same_kind() {
        assert_eq!(compare_values(&json!(9), &json!(10)), Some(Ordering::Less));
        assert_eq!(
            compare_values(&json!("9"), &json!("10")),
            Some(Ordering::Greater)
        );
        assert_eq!(
            compare_values(&json!(true), &json!(false)),
            Some(Ordering::Greater)
        );
    }

    #[test]
    fn mixed_number_and_string() {
        assert_eq!(compare_values(&json!(5), &json!("5")), Some(Ordering::Equal));
        assert_eq!(compare_values(&json!("12"), &json!(3)), Some(Ordering::Greater));
        assert_eq!(compare_values(&json!(1), &json!("x")), Some(Ordering::Less));
    }

    #[test]
    fn null_never_compares() {
        assert_eq!(compare_values(&Value::Null, &json!(1)), None);
        assert_eq!(compare_values(&json!("a"), &Value::Null), None);
    }

    #[test]
    fn nulls_sort_last() {
        let mut values = vec![json!(null), json!(2), json!(1)];
        values.sort_by(sort_order);
        assert_eq!(values, vec![json!(1), json!(2), json!(null)]);
    }

    #[test]
    fn keys_break_ties() {
        let dirs = [Dir::Asc, Dir::Desc];
        assert_eq!(
            compare_keys(&[json!("a"), json!(1)], &[json!("a"), json!(2)], &dirs),
            Ordering::Greater
        );
        assert_eq!(
            compare_keys(&[json!("a"), json!(1)], &[json!("b"), json!(2)], &dirs),
            Ordering::Less
        );
    }
}
