//! Backend capability traits.
//!
//! The engine never sees a concrete query builder. Anything implementing
//! [`QueryExpression`] can be searched, ordered, paged and counted.

use serde_json::Value;

use crate::ordering::OrderTerm;
use crate::predicate::Predicate;

/// A SELECT-like statement the engine can transform and execute.
///
/// Cloning must produce an independent statement: the engine relies on
/// clones to keep the caller's original query untouched.
///
/// # Implementing
///
/// ```
/// use datagrid::{OrderTerm, Predicate, QueryExpression};
/// use serde_json::Value;
///
/// #[derive(Clone, Default)]
/// struct Fixed {
///     rows: Vec<Value>,
///     groups: Vec<String>,
/// }
///
/// impl QueryExpression for Fixed {
///     type Row = Value;
///     type Error = std::convert::Infallible;
///
///     fn filter(&mut self, _predicate: Predicate) {}
///     fn group_by(&self) -> &[String] { &self.groups }
///     fn set_group_by(&mut self, groups: Vec<String>) { self.groups = groups; }
///     fn order_by(&mut self, _term: OrderTerm) {}
///     fn set_limit(&mut self, _limit: Option<usize>) {}
///     fn set_offset(&mut self, _offset: Option<usize>) {}
///     fn clear_eager_loads(&mut self) {}
///     fn fetch(&self) -> Result<Vec<Value>, Self::Error> { Ok(self.rows.clone()) }
///     fn count(&self) -> Result<u64, Self::Error> { Ok(self.rows.len() as u64) }
///     fn count_distinct(&self, _expr: &str) -> Result<u64, Self::Error> { Ok(1) }
/// }
/// ```
pub trait QueryExpression: Clone {
    /// A fetched row.
    type Row;

    /// The backend's error type, propagated unchanged by the engine.
    type Error: std::error::Error + 'static;

    /// Adds a predicate, ANDed with every predicate already present.
    fn filter(&mut self, predicate: Predicate);

    /// Returns the GROUP BY expressions.
    fn group_by(&self) -> &[String];

    /// Replaces the GROUP BY expressions. An empty list removes the clause.
    fn set_group_by(&mut self, groups: Vec<String>);

    /// Appends an ORDER BY term.
    fn order_by(&mut self, term: OrderTerm);

    /// Sets or clears the row limit.
    fn set_limit(&mut self, limit: Option<usize>);

    /// Sets or clears the row offset.
    fn set_offset(&mut self, offset: Option<usize>);

    /// Drops any eager loading of related entities.
    fn clear_eager_loads(&mut self);

    /// Executes the statement and returns its rows.
    fn fetch(&self) -> Result<Vec<Self::Row>, Self::Error>;

    /// Executes `COUNT(*)` over the statement.
    ///
    /// With GROUP BY in place this is the backend's native grouped count.
    fn count(&self) -> Result<u64, Self::Error>;

    /// Executes `COUNT(DISTINCT expr)` over the statement, ignoring any
    /// selected columns.
    fn count_distinct(&self, expr: &str) -> Result<u64, Self::Error>;
}

/// A relation-like object that wraps a base query.
///
/// [`QueryEngine::from_relation`](crate::QueryEngine::from_relation) unwraps
/// one level: the engine works on the returned query, not the relation.
pub trait RelationSource {
    /// The query type behind the relation.
    type Query: QueryExpression;

    /// Returns the underlying base query.
    fn base_query(&self) -> Self::Query;
}

/// Field access on a fetched row.
///
/// Used by [`FieldColumn`](crate::FieldColumn) and row decorators to read
/// a value without knowing the row type.
pub trait RowFields {
    /// Returns the value of `field`, or `None` if the row has no such field.
    fn field_value(&self, field: &str) -> Option<Value>;
}

impl RowFields for Value {
    fn field_value(&self, field: &str) -> Option<Value> {
        self.get(field).cloned()
    }
}

impl RowFields for serde_json::Map<String, Value> {
    fn field_value(&self, field: &str) -> Option<Value> {
        self.get(field).cloned()
    }
}

impl RowFields for std::collections::BTreeMap<String, Value> {
    fn field_value(&self, field: &str) -> Option<Value> {
        self.get(field).cloned()
    }
}

impl RowFields for std::collections::HashMap<String, Value> {
    fn field_value(&self, field: &str) -> Option<Value> {
        self.get(field).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_row_fields() {
        let row = json!({"id": 7, "name": "Ada"});
        assert_eq!(row.field_value("id"), Some(json!(7)));
        assert_eq!(row.field_value("missing"), None);
    }

    #[test]
    fn map_row_fields() {
        let mut row = std::collections::BTreeMap::new();
        row.insert("name".to_string(), json!("Ada"));
        assert_eq!(row.field_value("name"), Some(json!("Ada")));
    }
}
