//! Tables, relations and the database that owns them.

use std::collections::BTreeMap;
use std::rc::Rc;

use serde_json::{Map, Value};

use crate::error::{MemoryError, Result};
use crate::log::ExecutionLog;
use crate::query::{MemoryQuery, RelationQuery};

/// A named table with declared columns and JSON object rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    name: String,
    columns: Vec<String>,
    rows: Vec<Value>,
}

impl Table {
    /// Creates an empty table.
    pub fn new<I, S>(name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Table {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Appends a row.
    ///
    /// The row must be a JSON object whose keys are declared columns.
    /// Declared columns missing from the row are stored as `null`.
    pub fn insert(&mut self, row: Value) -> Result<()> {
        let Value::Object(fields) = row else {
            return Err(MemoryError::InvalidRow {
                table: self.name.clone(),
            });
        };
        if let Some(column) = fields.keys().find(|key| !self.has_column(key)) {
            return Err(MemoryError::UnknownColumn {
                table: self.name.clone(),
                column: column.clone(),
            });
        }

        let mut stored = Map::with_capacity(self.columns.len());
        for column in &self.columns {
            let value = fields.get(column).cloned().unwrap_or(Value::Null);
            stored.insert(column.clone(), value);
        }
        self.rows.push(Value::Object(stored));
        Ok(())
    }

    /// Appends every row, stopping at the first invalid one.
    pub fn with_rows(mut self, rows: impl IntoIterator<Item = Value>) -> Result<Self> {
        for row in rows {
            self.insert(row)?;
        }
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Value] {
        &self.rows
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Fails with [`MemoryError::UnknownColumn`] unless `column` is declared.
    pub fn require_column(&self, column: &str) -> Result<()> {
        if self.has_column(column) {
            Ok(())
        } else {
            Err(MemoryError::UnknownColumn {
                table: self.name.clone(),
                column: column.to_string(),
            })
        }
    }
}

/// A one-to-many relation from a parent table to a related table.
///
/// A related row belongs to a parent row when its `foreign_key` equals the
/// parent's `local_key`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    /// Relation name, as used in `relation::field` specs.
    pub name: String,
    pub parent: String,
    pub related: String,
    pub local_key: String,
    pub foreign_key: String,
}

impl Relation {
    pub fn has_many(
        parent: impl Into<String>,
        name: impl Into<String>,
        related: impl Into<String>,
        local_key: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        Relation {
            name: name.into(),
            parent: parent.into(),
            related: related.into(),
            local_key: local_key.into(),
            foreign_key: foreign_key.into(),
        }
    }
}

/// A set of tables and the relations between them.
///
/// Build it mutably, then share it behind an [`Rc`] to create queries.
#[derive(Debug, Default)]
pub struct Database {
    tables: BTreeMap<String, Table>,
    relations: BTreeMap<(String, String), Relation>,
    log: ExecutionLog,
}

impl Database {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a table.
    pub fn add_table(&mut self, table: Table) -> Result<()> {
        if self.tables.contains_key(table.name()) {
            return Err(MemoryError::DuplicateTable(table.name().to_string()));
        }
        self.tables.insert(table.name().to_string(), table);
        Ok(())
    }

    /// Registers a relation. Both tables and both keys must exist.
    pub fn add_relation(&mut self, relation: Relation) -> Result<()> {
        self.table(&relation.parent)?.require_column(&relation.local_key)?;
        self.table(&relation.related)?.require_column(&relation.foreign_key)?;
        let key = (relation.parent.clone(), relation.name.clone());
        self.relations.insert(key, relation);
        Ok(())
    }

    pub fn table(&self, name: &str) -> Result<&Table> {
        self.tables
            .get(name)
            .ok_or_else(|| MemoryError::UnknownTable(name.to_string()))
    }

    /// Looks up a relation declared on `table`.
    pub fn relation(&self, table: &str, name: &str) -> Result<&Relation> {
        self.relations
            .get(&(table.to_string(), name.to_string()))
            .ok_or_else(|| MemoryError::UnknownRelation {
                table: table.to_string(),
                relation: name.to_string(),
            })
    }

    /// The log of executed statements.
    pub fn log(&self) -> &ExecutionLog {
        &self.log
    }

    /// Starts a query over `table`.
    pub fn query(self: &Rc<Self>, table: &str) -> Result<MemoryQuery> {
        MemoryQuery::new(self, table)
    }

    /// Returns the relation source for the children of one parent row.
    pub fn related(
        self: &Rc<Self>,
        table: &str,
        relation: &str,
        parent_key: impl Into<Value>,
    ) -> Result<RelationQuery> {
        RelationQuery::new(self, table, relation, parent_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn insert_fills_missing_columns() {
        let mut table = Table::new("users", ["id", "name"]);
        table.insert(json!({"id": 1})).unwrap();
        assert_eq!(table.rows()[0], json!({"id": 1, "name": null}));
    }

    #[test]
    fn insert_rejects_bad_rows() {
        let mut table = Table::new("users", ["id"]);
        assert_eq!(
            table.insert(json!([1])),
            Err(MemoryError::InvalidRow {
                table: "users".into()
            })
        );
        assert_eq!(
            table.insert(json!({"age": 3})),
            Err(MemoryError::UnknownColumn {
                table: "users".into(),
                column: "age".into()
            })
        );
    }

    #[test]
    fn relation_requires_tables_and_keys() {
        let mut db = Database::new();
        db.add_table(Table::new("users", ["id"])).unwrap();
        assert_eq!(
            db.add_relation(Relation::has_many("users", "posts", "posts", "id", "user_id")),
            Err(MemoryError::UnknownTable("posts".into()))
        );

        db.add_table(Table::new("posts", ["id", "user_id"])).unwrap();
        db.add_relation(Relation::has_many("users", "posts", "posts", "id", "user_id"))
            .unwrap();
        assert_eq!(db.relation("users", "posts").unwrap().foreign_key, "user_id");
        assert!(db.relation("posts", "users").is_err());
    }

    #[test]
    fn duplicate_table() {
        let mut db = Database::new();
        db.add_table(Table::new("users", ["id"])).unwrap();
        assert_eq!(
            db.add_table(Table::new("users", ["id"])),
            Err(MemoryError::DuplicateTable("users".into()))
        );
    }
}
