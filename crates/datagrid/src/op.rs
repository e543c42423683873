//! Comparison operators for search predicates.
//!
//! The [`Op`] enum covers the operators a backend must understand. The
//! configurable search operator of an engine is one of these, with
//! [`Op::ILike`] as the default.

use std::cmp::Ordering;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Comparison operator for a predicate.
///
/// Operators fall into two groups:
/// - **Pattern**: `Like`, `NotLike`, `ILike`, `NotILike` - SQL patterns with
///   `%` and `_` wildcards
/// - **Ordering**: `Eq`, `Ne`, `Gt`, `Gte`, `Lt`, `Lte`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Op {
    /// Equal (exact match).
    #[serde(rename = "eq", alias = "=")]
    Eq,
    /// Not equal.
    #[serde(rename = "ne", alias = "!=", alias = "<>")]
    Ne,
    /// Case-sensitive pattern match.
    #[serde(rename = "like")]
    Like,
    /// Negated case-sensitive pattern match.
    #[serde(rename = "not_like")]
    NotLike,
    /// Case-insensitive pattern match.
    #[default]
    #[serde(rename = "ilike")]
    ILike,
    /// Negated case-insensitive pattern match.
    #[serde(rename = "not_ilike")]
    NotILike,
    /// Greater than.
    #[serde(rename = "gt", alias = ">")]
    Gt,
    /// Greater than or equal.
    #[serde(rename = "gte", alias = ">=")]
    Gte,
    /// Less than.
    #[serde(rename = "lt", alias = "<")]
    Lt,
    /// Less than or equal.
    #[serde(rename = "lte", alias = "<=")]
    Lte,
}

impl Op {
    /// Returns `true` for the SQL pattern operators.
    pub fn is_pattern(self) -> bool {
        matches!(self, Op::Like | Op::NotLike | Op::ILike | Op::NotILike)
    }

    /// Returns `true` for case-insensitive pattern operators.
    pub fn is_case_insensitive(self) -> bool {
        matches!(self, Op::ILike | Op::NotILike)
    }

    /// Returns `true` if this operator negates its match.
    pub fn is_negated(self) -> bool {
        matches!(self, Op::Ne | Op::NotLike | Op::NotILike)
    }

    /// Evaluates an ordering-based comparison.
    ///
    /// Pattern operators always return `false` here; they are evaluated
    /// against the text form of a value instead.
    pub fn eval_ordering(self, ordering: Ordering) -> bool {
        match self {
            Op::Eq => ordering == Ordering::Equal,
            Op::Ne => ordering != Ordering::Equal,
            Op::Gt => ordering == Ordering::Greater,
            Op::Gte => ordering != Ordering::Less,
            Op::Lt => ordering == Ordering::Less,
            Op::Lte => ordering != Ordering::Greater,
            _ => false,
        }
    }

    /// Returns the SQL spelling of this operator.
    pub fn as_sql(self) -> &'static str {
        match self {
            Op::Eq => "=",
            Op::Ne => "<>",
            Op::Like => "LIKE",
            Op::NotLike => "NOT LIKE",
            Op::ILike => "ILIKE",
            Op::NotILike => "NOT ILIKE",
            Op::Gt => ">",
            Op::Gte => ">=",
            Op::Lt => "<",
            Op::Lte => "<=",
        }
    }
}

impl std::fmt::Display for Op {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_sql())
    }
}

/// Error returned when parsing an unknown operator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown search operator '{0}'")]
pub struct UnknownOp(pub String);

impl FromStr for Op {
    type Err = UnknownOp;

    /// Parses an operator from its SQL spelling, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.split_whitespace().collect::<Vec<_>>().join(" ");
        match normalized.to_ascii_uppercase().as_str() {
            "=" | "==" => Ok(Op::Eq),
            "<>" | "!=" => Ok(Op::Ne),
            "LIKE" => Ok(Op::Like),
            "NOT LIKE" => Ok(Op::NotLike),
            "ILIKE" => Ok(Op::ILike),
            "NOT ILIKE" => Ok(Op::NotILike),
            ">" => Ok(Op::Gt),
            ">=" => Ok(Op::Gte),
            "<" => Ok(Op::Lt),
            "<=" => Ok(Op::Lte),
            _ => Err(UnknownOp(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn op_groups() {
        assert!(Op::Like.is_pattern());
        assert!(Op::NotILike.is_pattern());
        assert!(!Op::Eq.is_pattern());

        assert!(Op::ILike.is_case_insensitive());
        assert!(!Op::Like.is_case_insensitive());

        assert!(Op::NotLike.is_negated());
        assert!(Op::Ne.is_negated());
        assert!(!Op::Gte.is_negated());
    }

    #[test]
    fn op_eval_ordering() {
        assert!(Op::Eq.eval_ordering(Ordering::Equal));
        assert!(!Op::Eq.eval_ordering(Ordering::Less));

        assert!(Op::Ne.eval_ordering(Ordering::Greater));
        assert!(!Op::Ne.eval_ordering(Ordering::Equal));

        assert!(Op::Gte.eval_ordering(Ordering::Equal));
        assert!(Op::Gte.eval_ordering(Ordering::Greater));
        assert!(!Op::Gte.eval_ordering(Ordering::Less));

        assert!(Op::Lt.eval_ordering(Ordering::Less));
        assert!(!Op::Lt.eval_ordering(Ordering::Equal));

        // Pattern operators are not ordering-based
        assert!(!Op::Like.eval_ordering(Ordering::Equal));
    }

    #[test]
    fn op_parse() {
        assert_eq!("like".parse::<Op>(), Ok(Op::Like));
        assert_eq!("NOT   ilike".parse::<Op>(), Ok(Op::NotILike));
        assert_eq!("<>".parse::<Op>(), Ok(Op::Ne));
        assert_eq!(">=".parse::<Op>(), Ok(Op::Gte));
        assert_eq!(
            "regexp".parse::<Op>(),
            Err(UnknownOp("regexp".to_string()))
        );
    }

    #[test]
    fn op_default_is_ilike() {
        assert_eq!(Op::default(), Op::ILike);
    }

    #[test]
    fn op_display() {
        assert_eq!(Op::ILike.to_string(), "ILIKE");
        assert_eq!(Op::NotLike.to_string(), "NOT LIKE");
        assert_eq!(Op::Ne.to_string(), "<>");
    }

    #[test]
    fn op_serde_names() {
        let op: Op = serde_json::from_str("\"not_like\"").unwrap();
        assert_eq!(op, Op::NotLike);
        let op: Op = serde_json::from_str("\">=\"").unwrap();
        assert_eq!(op, Op::Gte);
        assert_eq!(serde_json::to_string(&Op::ILike).unwrap(), "\"ilike\"");
    }
}
