//! Datagrid - server-side processing for tabular data views.
//!
//! A grid client (a paginated, searchable, sortable table in a browser)
//! sends a request describing what it wants to see: a search term, per-column
//! searches, a sort column, a page. Datagrid turns that request into
//! predicates, ordering and pagination on a backend query, counts the
//! results, and shapes each row into an output record.
//!
//! The engine is backend-agnostic: anything implementing
//! [`QueryExpression`] can be driven. The `datagrid-memory` crate provides
//! an in-memory backend.
//!
//! # Quick Start
//!
//! ```rust
//! use datagrid::{
//!     Column, Dir, FieldColumn, FieldSpec, OrderTerm, Predicate, QueryEngine,
//!     QueryExpression,
//! };
//! use serde_json::{json, Value};
//!
//! // A toy backend that ignores predicates
//! #[derive(Clone)]
//! struct Rows(Vec<Value>);
//!
//! impl QueryExpression for Rows {
//!     type Row = Value;
//!     type Error = std::convert::Infallible;
//!
//!     fn filter(&mut self, _predicate: Predicate) {}
//!     fn group_by(&self) -> &[String] { &[] }
//!     fn set_group_by(&mut self, _groups: Vec<String>) {}
//!     fn order_by(&mut self, _term: OrderTerm) {}
//!     fn set_limit(&mut self, limit: Option<usize>) {
//!         if let Some(limit) = limit { self.0.truncate(limit); }
//!     }
//!     fn set_offset(&mut self, _offset: Option<usize>) {}
//!     fn clear_eager_loads(&mut self) {}
//!     fn fetch(&self) -> Result<Vec<Value>, Self::Error> { Ok(self.0.clone()) }
//!     fn count(&self) -> Result<u64, Self::Error> { Ok(self.0.len() as u64) }
//!     fn count_distinct(&self, _expr: &str) -> Result<u64, Self::Error> { Ok(1) }
//! }
//!
//! let rows = Rows(vec![json!({"id": 1, "name": "Ada"}), json!({"id": 2, "name": "Alan"})]);
//! let columns: Vec<Box<dyn Column<Value>>> =
//!     vec![Box::new(FieldColumn::new("id")), Box::new(FieldColumn::new("name"))];
//! let specs = FieldSpec::parse_all(["name"]).unwrap();
//!
//! let mut engine = QueryEngine::new(rows);
//! engine.order_by(1, Dir::Asc).take(1);
//!
//! let response = engine.make(&columns, &specs, 1).unwrap();
//! assert_eq!(response.records_filtered, 2);
//! assert_eq!(response.data[0].to_value(), json!([1, "Ada"]));
//! ```
//!
//! # Search Semantics
//!
//! Search predicates are combined with any filters already on the query:
//!
//! ```text
//! match = (base filters)
//!       ∧ (field_1 op term ∨ field_2 op term ∨ ...)    global search
//!       ∧ (field_a op value_a) ∧ (field_b op value_b)   column searches
//! ```
//!
//! Terms are wrapped in `%` wildcards unless exact matching is requested.
//! Exact global search keeps the configured operator; exact column search
//! switches to equality.
//!
//! # Field Specs
//!
//! | Form | Meaning |
//! |------|---------|
//! | `name` | a column of the queried entity |
//! | `age:integer` | the column cast to a type before comparison |
//! | `code:varchar:10` | cast with a length |
//! | `posts::title` | a column of a related entity, matched through EXISTS |
//!
//! # Counting
//!
//! The filtered count is computed on its own copy of the query, before
//! ordering and pagination. GROUP BY handling is configurable through
//! [`EngineOptions`]; see [`count_records`] for the strategy order.
//!
//! # Logging
//!
//! The engine emits `tracing` events at `debug` and `trace` level. It never
//! installs a subscriber.

mod column;
mod count;
mod engine;
mod error;
mod field;
mod op;
mod options;
mod ordering;
mod predicate;
mod record;
mod response;
mod search;
mod traits;

// Re-export public API
pub use column::{Column, FieldColumn, FunctionColumn, TextColumn};
pub use count::{count_records, CountStrategy};
pub use engine::{Columns, QueryEngine};
pub use error::{ConfigurationError, EngineError, Result};
pub use field::{validate_identifier, CastField, CastType, FieldSpec};
pub use op::{Op, UnknownOp};
pub use options::{EngineOptions, KeyMode};
pub use ordering::{Dir, OrderRequest, OrderTerm};
pub use predicate::{Operand, Predicate};
pub use record::{Record, RecordKey, RowDecorators, ROW_CLASS_KEY, ROW_DATA_KEY, ROW_ID_KEY};
pub use response::GridResponse;
pub use search::{wildcard, SearchState};
pub use traits::{QueryExpression, RelationSource, RowFields};
