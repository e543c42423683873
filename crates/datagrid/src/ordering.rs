//! Ordering types.
//!
//! [`Dir`] is a sort direction, [`OrderTerm`] is what an engine hands to a
//! backend, and [`OrderRequest`] is what a caller asks for: a column
//! position in the column list plus a direction.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::predicate::Operand;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dir {
    /// Ascending order (smallest first).
    #[default]
    Asc,
    /// Descending order (largest first).
    Desc,
}

impl Dir {
    /// Applies this direction to an ordering.
    pub fn apply(self, ordering: std::cmp::Ordering) -> std::cmp::Ordering {
        match self {
            Dir::Asc => ordering,
            Dir::Desc => ordering.reverse(),
        }
    }

    /// Returns the SQL keyword for this direction.
    pub fn as_sql(self) -> &'static str {
        match self {
            Dir::Asc => "ASC",
            Dir::Desc => "DESC",
        }
    }
}

impl std::fmt::Display for Dir {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_sql())
    }
}

impl FromStr for Dir {
    type Err = std::convert::Infallible;

    /// Parses a direction; anything other than `desc` is ascending.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("desc") {
            Ok(Dir::Desc)
        } else {
            Ok(Dir::Asc)
        }
    }
}

/// A single ORDER BY term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderTerm {
    /// What to sort by.
    pub target: Operand,
    /// The sort direction.
    pub dir: Dir,
}

impl OrderTerm {
    /// Creates a new order term.
    pub fn new(target: Operand, dir: Dir) -> Self {
        OrderTerm { target, dir }
    }

    /// Orders by a plain column.
    pub fn column(name: impl Into<String>, dir: Dir) -> Self {
        OrderTerm::new(Operand::column(name), dir)
    }
}

/// A caller's request to order by the column at `column` in the column list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    /// Zero-based position in the column list.
    pub column: usize,
    /// Requested direction.
    #[serde(default)]
    pub dir: Dir,
}

impl OrderRequest {
    /// Creates a new order request.
    pub fn new(column: usize, dir: Dir) -> Self {
        OrderRequest { column, dir }
    }
}
