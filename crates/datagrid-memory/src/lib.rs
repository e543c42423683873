//! In-memory backend for datagrid.
//!
//! Tables hold JSON object rows; queries implement
//! [`QueryExpression`](datagrid::QueryExpression) by evaluating predicates
//! directly and render the SQL an equivalent database query would run.
//! Useful for tests, fixtures and small embedded datasets.
//!
//! # Quick Start
//!
//! ```rust
//! use std::rc::Rc;
//! use datagrid::{Column, Dir, FieldColumn, FieldSpec, QueryEngine};
//! use datagrid_memory::{Database, Relation, Table};
//! use serde_json::{json, Value};
//!
//! let mut db = Database::new();
//! db.add_table(
//!     Table::new("users", ["id", "name"])
//!         .with_rows([
//!             json!({"id": 1, "name": "Ada"}),
//!             json!({"id": 2, "name": "Alan"}),
//!             json!({"id": 3, "name": "Grace"}),
//!         ])
//!         .unwrap(),
//! )
//! .unwrap();
//! let db = Rc::new(db);
//!
//! let columns: Vec<Box<dyn Column<Value>>> =
//!     vec![Box::new(FieldColumn::new("id")), Box::new(FieldColumn::new("name"))];
//! let specs = FieldSpec::parse_all(["name"]).unwrap();
//!
//! let mut engine = QueryEngine::new(db.query("users").unwrap());
//! engine.search("a").order_by(1, Dir::Desc);
//!
//! let response = engine.make(&columns, &specs, 1).unwrap();
//! assert_eq!(response.records_total, 3);
//! assert_eq!(response.records_filtered, 3);
//! assert_eq!(response.data[0].to_value(), json!([3, "Grace"]));
//! ```
//!
//! # Evaluation Rules
//!
//! - `LIKE` is case-sensitive, `ILIKE` is not; `%` and `_` are wildcards
//! - comparisons with `null` are never true
//! - GROUP BY keeps the first row of each group; a grouped `COUNT(*)`
//!   returns the size of the first group
//! - `EXISTS` follows a [`Relation`] from parent key to foreign key
//! - eager loads attach related rows as an array under the relation name

mod cast;
mod compare;
mod database;
mod error;
mod eval;
mod log;
mod pattern;
mod query;
mod statement;

// Re-export public API
pub use cast::{text_form, CastTarget};
pub use compare::{compare_keys, compare_values, sort_order};
pub use database::{Database, Relation, Table};
pub use error::{MemoryError, Result};
pub use log::ExecutionLog;
pub use pattern::LikePattern;
pub use query::{MemoryQuery, RelationQuery};
pub use statement::Statement;
