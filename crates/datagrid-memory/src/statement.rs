//! SQL rendering.
//!
//! Statements use `?` placeholders with positional bindings. Identifiers are
//! written as given; they were validated when the field specs were parsed.

use std::fmt;

use datagrid::{OrderTerm, Predicate};
use serde_json::Value;

use crate::database::Database;
use crate::error::Result;

/// A rendered statement and its bindings, in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub bindings: Vec<Value>,
}

impl Statement {
    /// Creates a statement without bindings.
    pub fn new(sql: impl Into<String>) -> Self {
        Statement {
            sql: sql.into(),
            bindings: Vec::new(),
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.sql)
    }
}

/// What a statement selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Projection<'q> {
    Rows,
    Count,
    CountDistinct(&'q str),
}

/// The parts of a SELECT, borrowed from a query.
pub(crate) struct Select<'q> {
    pub table: &'q str,
    pub projection: Projection<'q>,
    pub filters: &'q [Predicate],
    pub groups: &'q [String],
    pub order: &'q [OrderTerm],
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl Select<'_> {
    pub fn render(&self, db: &Database) -> Result<Statement> {
        let mut writer = Writer {
            db,
            sql: String::new(),
            bindings: Vec::new(),
        };

        let projection = match self.projection {
            Projection::Rows => "*".to_string(),
            Projection::Count => "COUNT(*)".to_string(),
            Projection::CountDistinct(expr) => format!("COUNT(DISTINCT {})", expr),
        };
        writer.push(&format!("SELECT {} FROM {}", projection, self.table));

        if !self.filters.is_empty() {
            writer.push(" WHERE ");
            writer.conjunction(self.table, self.filters)?;
        }
        if !self.groups.is_empty() {
            writer.push(&format!(" GROUP BY {}", self.groups.join(", ")));
        }
        if !self.order.is_empty() {
            let terms: Vec<String> = self
                .order
                .iter()
                .map(|term| format!("{} {}", term.target, term.dir.as_sql()))
                .collect();
            writer.push(&format!(" ORDER BY {}", terms.join(", ")));
        }
        if let Some(limit) = self.limit {
            writer.push(&format!(" LIMIT {}", limit));
        }
        if let Some(offset) = self.offset {
            writer.push(&format!(" OFFSET {}", offset));
        }

        Ok(Statement {
            sql: writer.sql,
            bindings: writer.bindings,
        })
    }
}

struct Writer<'a> {
    db: &'a Database,
    sql: String,
    bindings: Vec<Value>,
}

impl Writer<'_> {
    fn push(&mut self, text: &str) {
        self.sql.push_str(text);
    }

    fn conjunction(&mut self, table: &str, predicates: &[Predicate]) -> Result<()> {
        for (i, predicate) in predicates.iter().enumerate() {
            if i > 0 {
                self.push(" AND ");
            }
            self.predicate(table, predicate)?;
        }
        Ok(())
    }

    fn group(&mut self, table: &str, predicates: &[Predicate], joiner: &str) -> Result<()> {
        self.push("(");
        for (i, predicate) in predicates.iter().enumerate() {
            if i > 0 {
                self.push(joiner);
            }
            self.predicate(table, predicate)?;
        }
        self.push(")");
        Ok(())
    }

    fn predicate(&mut self, table: &str, predicate: &Predicate) -> Result<()> {
        match predicate {
            Predicate::Compare { operand, op, value } => {
                self.push(&format!("{} {} ?", operand, op.as_sql()));
                self.bindings.push(value.clone());
            }
            Predicate::Exists {
                relation,
                predicate,
            } => {
                let relation = self.db.relation(table, relation)?;
                self.push(&format!(
                    "EXISTS (SELECT 1 FROM {related} WHERE {related}.{fk} = {parent}.{lk} AND ",
                    related = relation.related,
                    fk = relation.foreign_key,
                    parent = table,
                    lk = relation.local_key,
                ));
                self.predicate(&relation.related, predicate)?;
                self.push(")");
            }
            Predicate::Any(children) if children.is_empty() => self.push("1 = 0"),
            Predicate::All(children) if children.is_empty() => self.push("1 = 1"),
            Predicate::Any(children) => self.group(table, children, " OR ")?,
            Predicate::All(children) => self.group(table, children, " AND ")?,
        }
        Ok(())
    }
}
