//! Predicate evaluation over rows.
//!
//! Predicates are compiled against a table once: columns and relations are
//! resolved, casts looked up and `LIKE` patterns turned into regexes. The
//! compiled [`Matcher`] is then run over each row.

use std::cmp::Ordering;

use datagrid::{Op, Operand, Predicate};
use serde_json::Value;

use crate::cast::{text_form, CastTarget};
use crate::compare::compare_values;
use crate::database::{Database, Relation, Table};
use crate::error::Result;
use crate::pattern::LikePattern;

/// A column read from a row, optionally through a cast.
#[derive(Debug, Clone)]
pub(crate) struct Resolved {
    column: String,
    cast: Option<CastTarget>,
}

impl Resolved {
    pub fn compile(table: &Table, operand: &Operand) -> Result<Self> {
        table.require_column(operand.field())?;
        let cast = match operand {
            Operand::Column(_) => None,
            Operand::Cast(cast) => Some(CastTarget::resolve(&cast.cast)?),
        };
        Ok(Resolved {
            column: operand.field().to_string(),
            cast,
        })
    }

    pub fn column(table: &Table, column: &str) -> Result<Self> {
        table.require_column(column)?;
        Ok(Resolved {
            column: column.to_string(),
            cast: None,
        })
    }

    pub fn value(&self, row: &Value) -> Value {
        let raw = row.get(&self.column).unwrap_or(&Value::Null);
        match self.cast {
            Some(target) => target.apply(raw),
            None => raw.clone(),
        }
    }
}

#[derive(Debug)]
pub(crate) enum Test {
    Pattern { pattern: LikePattern, negated: bool },
    Ordering { op: Op, value: Value },
    Never,
}

impl Test {
    fn compile(op: Op, value: &Value) -> Result<Self> {
        if !op.is_pattern() {
            return Ok(Test::Ordering {
                op,
                value: value.clone(),
            });
        }
        // NULL LIKE anything is never true
        let Some(text) = text_form(value) else {
            return Ok(Test::Never);
        };
        Ok(Test::Pattern {
            pattern: LikePattern::new(&text, op.is_case_insensitive())?,
            negated: op.is_negated(),
        })
    }

    fn passes(&self, value: &Value) -> bool {
        match self {
            Test::Pattern { pattern, negated } => {
                text_form(value).is_some_and(|text| pattern.is_match(&text) != *negated)
            }
            Test::Ordering { op, value: expected } => {
                compare_values(value, expected).is_some_and(|o| op.eval_ordering(o))
            }
            Test::Never => false,
        }
    }
}

/// A predicate compiled against one table.
#[derive(Debug)]
pub(crate) enum Matcher<'a> {
    Compare {
        operand: Resolved,
        test: Test,
    },
    Exists {
        relation: &'a Relation,
        related: &'a Table,
        inner: Box<Matcher<'a>>,
    },
    Any(Vec<Matcher<'a>>),
    All(Vec<Matcher<'a>>),
}

impl<'a> Matcher<'a> {
    pub fn compile(db: &'a Database, table: &'a Table, predicate: &Predicate) -> Result<Self> {
        let matcher = match predicate {
            Predicate::Compare { operand, op, value } => Matcher::Compare {
                operand: Resolved::compile(table, operand)?,
                test: Test::compile(*op, value)?,
            },
            Predicate::Exists {
                relation,
                predicate,
            } => {
                let relation = db.relation(table.name(), relation)?;
                let related = db.table(&relation.related)?;
                Matcher::Exists {
                    relation,
                    related,
                    inner: Box::new(Matcher::compile(db, related, predicate)?),
                }
            }
            Predicate::Any(children) => Matcher::Any(Self::compile_all(db, table, children)?),
            Predicate::All(children) => Matcher::All(Self::compile_all(db, table, children)?),
        };
        Ok(matcher)
    }

    pub fn compile_all(
        db: &'a Database,
        table: &'a Table,
        predicates: &[Predicate],
    ) -> Result<Vec<Self>> {
        predicates
            .iter()
            .map(|p| Matcher::compile(db, table, p))
            .collect()
    }

    pub fn matches(&self, row: &Value) -> bool {
        match self {
            Matcher::Compare { operand, test } => test.passes(&operand.value(row)),
            Matcher::Exists {
                relation,
                related,
                inner,
            } => {
                let key = row.get(&relation.local_key).unwrap_or(&Value::Null);
                related.rows().iter().any(|child| {
                    belongs_to(child, &relation.foreign_key, key) && inner.matches(child)
                })
            }
            Matcher::Any(children) => children.iter().any(|m| m.matches(row)),
            Matcher::All(children) => children.iter().all(|m| m.matches(row)),
        }
    }
}

/// Returns `true` if `child.foreign_key` equals `key`. Null keys never match.
pub(crate) fn belongs_to(child: &Value, foreign_key: &str, key: &Value) -> bool {
    let value = child.get(foreign_key).unwrap_or(&Value::Null);
    compare_values(value, key) == Some(Ordering::Equal)
}
