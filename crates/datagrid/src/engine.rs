//! The query engine.
//!
//! [`QueryEngine`] owns a base query and an untouched snapshot of it. Each
//! call to [`produce_results`](QueryEngine::produce_results) works on clones:
//!
//! ```text
//! base ──clone──▶ builder ──search──▶ order ──paginate──▶ fetch ──▶ records
//!      └─clone──▶ counter ──search──▶ count_records ──▶ filtered count
//! ```
//!
//! Ordering and pagination are applied to the fetch clone only.

use serde_json::Value;

use crate::column::Column;
use crate::count::count_records;
use crate::error::{ConfigurationError, EngineError};
use crate::field::{validate_identifier, FieldSpec};
use crate::op::Op;
use crate::options::{EngineOptions, KeyMode};
use crate::ordering::{Dir, OrderRequest, OrderTerm};
use crate::predicate::Operand;
use crate::record::{Record, RowDecorators};
use crate::response::GridResponse;
use crate::search::SearchState;
use crate::traits::{QueryExpression, RelationSource};

/// A boxed column over rows of type `R`.
pub type Columns<R> = [Box<dyn Column<R>>];

/// Search, ordering, pagination and record shaping over one base query.
///
/// An engine serves one request: configure it, call
/// [`produce_results`](Self::produce_results) (or [`make`](Self::make)), read
/// the counts.
///
/// Fetched rows are memoized: the first fetch wins until
/// [`clear_fetch_cache`](Self::clear_fetch_cache) or [`reset`](Self::reset)
/// is called. Changing paging or search state after a fetch without clearing
/// returns the earlier rows.
pub struct QueryEngine<Q: QueryExpression> {
    builder: Q,
    original: Q,
    options: EngineOptions,
    search: SearchState,
    order: Option<OrderRequest>,
    skip: usize,
    limit: usize,
    decorators: RowDecorators<Q::Row>,
    counter: u64,
    collection: Option<Vec<Q::Row>>,
}

impl<Q: QueryExpression> QueryEngine<Q> {
    /// Creates an engine around a base query.
    pub fn new(query: Q) -> Self {
        let original = query.clone();
        QueryEngine {
            builder: query,
            original,
            options: EngineOptions::default(),
            search: SearchState::new(),
            order: None,
            skip: 0,
            limit: 0,
            decorators: RowDecorators::new(),
            counter: 0,
            collection: None,
        }
    }

    /// Creates an engine around the base query behind a relation.
    pub fn from_relation<S>(relation: &S) -> Self
    where
        S: RelationSource<Query = Q>,
    {
        QueryEngine::new(relation.base_query())
    }

    /// Replaces the options wholesale.
    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    // ========================================================================
    // Option setters
    // ========================================================================

    /// Sets the operator used for text search.
    pub fn set_search_operator(&mut self, op: Op) -> &mut Self {
        self.options.search_operator = op;
        self
    }

    /// Counts by materializing rows, for filters on aliased output columns.
    pub fn set_search_with_alias(&mut self) -> &mut Self {
        self.options.search_with_alias = true;
        self
    }

    /// Drops GROUP BY from the count query.
    pub fn set_no_group_by_on_count(&mut self) -> &mut Self {
        self.options.no_group_by_on_count = true;
        self
    }

    /// Counts distinct values of a single GROUP BY expression instead of rows.
    pub fn set_distinct_if_group(&mut self) -> &mut Self {
        self.options.distinct_count_group = true;
        self
    }

    /// Keys records by column name (`true`) or position (`false`).
    pub fn set_alias_mapping(&mut self, alias: bool) -> &mut Self {
        self.options.key_mode = if alias { KeyMode::Alias } else { KeyMode::Index };
        self
    }

    // ========================================================================
    // Request state
    // ========================================================================

    /// Sets the global search term.
    pub fn search(&mut self, term: impl Into<String>) -> &mut Self {
        self.search.set_term(term);
        self
    }

    /// Toggles exact matching for the global search term.
    pub fn set_exact_word_search(&mut self, exact: bool) -> &mut Self {
        self.search.set_exact(exact);
        self
    }

    /// Sets a single-column search on the field spec at `index`.
    pub fn set_column_search(&mut self, index: usize, value: impl Into<String>) -> &mut Self {
        self.search.set_column_search(index, value);
        self
    }

    /// Toggles exact matching for single-column searches on `field`.
    pub fn set_column_search_exact(&mut self, field: impl Into<String>, exact: bool) -> &mut Self {
        self.search.set_column_exact(field, exact);
        self
    }

    pub fn search_state(&self) -> &SearchState {
        &self.search
    }

    /// Orders by the column at position `column` of the column list.
    pub fn order_by(&mut self, column: usize, dir: Dir) -> &mut Self {
        self.order = Some(OrderRequest::new(column, dir));
        self
    }

    /// Removes any ordering request.
    pub fn clear_order(&mut self) -> &mut Self {
        self.order = None;
        self
    }

    /// Skips the first `n` rows. Zero means no offset.
    pub fn skip(&mut self, n: usize) -> &mut Self {
        self.skip = n;
        self
    }

    /// Returns at most `n` rows. Zero means no limit.
    pub fn take(&mut self, n: usize) -> &mut Self {
        self.limit = n;
        self
    }

    pub fn set_row_class<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&Q::Row) -> String + 'static,
    {
        self.decorators.set_row_class(f);
        self
    }

    pub fn set_row_id<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&Q::Row) -> Value + 'static,
    {
        self.decorators.set_row_id(f);
        self
    }

    pub fn set_row_data<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&Q::Row) -> Value + 'static,
    {
        self.decorators.set_row_data(f);
        self
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// The working base query.
    pub fn base_query(&self) -> &Q {
        &self.builder
    }

    /// The snapshot taken at construction.
    pub fn original_query(&self) -> &Q {
        &self.original
    }

    /// Restores the base query from the original snapshot and drops the
    /// memoized rows.
    pub fn reset(&mut self) -> &mut Self {
        self.builder = self.original.clone();
        self.collection = None;
        self
    }

    /// Drops the memoized rows so the next call fetches again.
    pub fn clear_fetch_cache(&mut self) -> &mut Self {
        self.collection = None;
        self
    }

    // ========================================================================
    // Results
    // ========================================================================

    /// Filtered row count computed by the last
    /// [`produce_results`](Self::produce_results).
    pub fn count(&self) -> u64 {
        self.counter
    }

    /// Unfiltered row count.
    ///
    /// Without an active search this is the cached filtered count and no
    /// query runs. Otherwise the original query is counted with none of the
    /// search predicates applied.
    pub fn total_count(&self) -> Result<u64, EngineError<Q::Error>> {
        if !self.search.is_active() {
            return Ok(self.counter);
        }
        count_records(self.original.clone(), &self.options).map_err(EngineError::Backend)
    }

    /// Returns the base query's rows without search or ordering, paginated.
    ///
    /// Shares the memoized row collection with
    /// [`produce_results`](Self::produce_results).
    pub fn rows(&mut self) -> Result<&[Q::Row], EngineError<Q::Error>> {
        let builder = self.builder.clone();
        self.fetch_memoized(builder)
    }

    /// Runs search, count, ordering and pagination, and returns one record
    /// per fetched row.
    ///
    /// `field_specs` lists the searchable fields; single-column search
    /// indexes refer to positions in this list.
    pub fn produce_results(
        &mut self,
        columns: &Columns<Q::Row>,
        field_specs: &[FieldSpec],
    ) -> Result<Vec<Record>, EngineError<Q::Error>> {
        let predicates = self
            .search
            .predicates(field_specs, self.options.search_operator)?;
        let order = match self.order {
            Some(request) => resolve_order(columns, request)?,
            None => None,
        };

        let mut builder = self.builder.clone();
        let mut count_builder = self.builder.clone();
        for predicate in predicates {
            tracing::trace!(?predicate, "applying search predicate");
            builder.filter(predicate.clone());
            count_builder.filter(predicate);
        }

        let filtered = count_records(count_builder, &self.options).map_err(EngineError::Backend)?;

        if let Some(term) = order {
            builder.order_by(term);
        }

        let alias = self.options.alias_mapping();
        self.fetch_memoized(builder)?;
        self.counter = filtered;
        let rows = self.collection.as_deref().unwrap_or_default();
        let records: Vec<Record> = rows
            .iter()
            .map(|row| compile_row(row, columns, &self.decorators, alias))
            .collect();

        tracing::debug!(
            filtered = self.counter,
            returned = records.len(),
            "produced results"
        );
        Ok(records)
    }

    /// Produces results and wraps them with both counts.
    pub fn make(
        &mut self,
        columns: &Columns<Q::Row>,
        field_specs: &[FieldSpec],
        draw: u64,
    ) -> Result<GridResponse, EngineError<Q::Error>> {
        let data = self.produce_results(columns, field_specs)?;
        let records_total = self.total_count()?;
        Ok(GridResponse {
            draw,
            records_total,
            records_filtered: self.counter,
            data,
        })
    }

    fn fetch_memoized(&mut self, mut builder: Q) -> Result<&[Q::Row], EngineError<Q::Error>> {
        if self.collection.is_none() {
            if self.skip > 0 {
                builder.set_offset(Some(self.skip));
            }
            if self.limit > 0 {
                builder.set_limit(Some(self.limit));
            }
            let rows = builder.fetch().map_err(EngineError::Backend)?;
            tracing::debug!(
                skip = self.skip,
                limit = self.limit,
                fetched = rows.len(),
                "fetched rows"
            );
            self.collection = Some(rows);
        }
        Ok(self.collection.as_deref().unwrap_or_default())
    }
}

/// Resolves an order request against the column list.
///
/// An index past the end yields no ordering. A `field:type[:length]` column
/// name orders through a cast; related (`relation::field`) names cannot be
/// ordered and yield no ordering.
fn resolve_order<R>(
    columns: &Columns<R>,
    request: OrderRequest,
) -> Result<Option<OrderTerm>, ConfigurationError> {
    let Some(column) = columns.get(request.column) else {
        tracing::debug!(column = request.column, "order index out of range");
        return Ok(None);
    };

    let name = column.name();
    if name.contains("::") {
        tracing::debug!(column = name, "related columns are not orderable");
        return Ok(None);
    }
    if name.contains(':') {
        return match FieldSpec::parse(name)? {
            FieldSpec::Cast(cast) => Ok(Some(OrderTerm::new(Operand::Cast(cast), request.dir))),
            other => Ok(Some(OrderTerm::column(other.field(), request.dir))),
        };
    }

    validate_identifier(name)?;
    Ok(Some(OrderTerm::column(name, request.dir)))
}

fn compile_row<R>(
    row: &R,
    columns: &Columns<R>,
    decorators: &RowDecorators<R>,
    alias: bool,
) -> Record {
    let mut record = Record::new();
    decorators.decorate(row, &mut record);
    for (index, column) in columns.iter().enumerate() {
        let value = column.run(row);
        if alias {
            record.insert(column.name(), value);
        } else {
            record.insert(index, value);
        }
    }
    record
}

impl<Q> std::fmt::Debug for QueryEngine<Q>
where
    Q: QueryExpression + std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryEngine")
            .field("builder", &self.builder)
            .field("original", &self.original)
            .field("options", &self.options)
            .field("search", &self.search)
            .field("order", &self.order)
            .field("skip", &self.skip)
            .field("limit", &self.limit)
            .field("decorators", &self.decorators)
            .field("counter", &self.counter)
            .field("memoized", &self.collection.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::{FieldColumn, FunctionColumn, TextColumn};
    use crate::error::ConfigurationError;
    use crate::predicate::Predicate;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, thiserror::Error)]
    #[error("backend unavailable")]
    struct Unavailable;

    /// Matches string columns by substring, ignoring `%` wildcards.
    #[derive(Debug, Clone, Default)]
    struct Fake {
        rows: Vec<Value>,
        filters: Vec<Predicate>,
        groups: Vec<String>,
        order: Vec<OrderTerm>,
        limit: Option<usize>,
        offset: Option<usize>,
        fail: bool,
        fail_fetch: bool,
        log: Rc<RefCell<Vec<String>>>,
    }

    fn matches(row: &Value, predicate: &Predicate) -> bool {
        match predicate {
            Predicate::Compare { operand, value, .. } => {
                let needle = value.as_str().unwrap_or_default().trim_matches('%');
                row.get(operand.field())
                    .and_then(Value::as_str)
                    .is_some_and(|text| text.contains(needle))
            }
            Predicate::Exists { .. } => false,
            Predicate::Any(children) => children.iter().any(|p| matches(row, p)),
            Predicate::All(children) => children.iter().all(|p| matches(row, p)),
        }
    }

    impl Fake {
        fn with_rows(rows: Vec<Value>) -> Self {
            Fake {
                rows,
                ..Fake::default()
            }
        }

        fn matching(&self) -> Vec<Value> {
            self.rows
                .iter()
                .filter(|row| self.filters.iter().all(|p| matches(row, p)))
                .cloned()
                .collect()
        }
    }

    impl QueryExpression for Fake {
        type Row = Value;
        type Error = Unavailable;

        fn filter(&mut self, predicate: Predicate) {
            self.filters.push(predicate);
        }
        fn group_by(&self) -> &[String] {
            &self.groups
        }
        fn set_group_by(&mut self, groups: Vec<String>) {
            self.groups = groups;
        }
        fn order_by(&mut self, term: OrderTerm) {
            self.order.push(term);
        }
        fn set_limit(&mut self, limit: Option<usize>) {
            self.limit = limit;
        }
        fn set_offset(&mut self, offset: Option<usize>) {
            self.offset = offset;
        }
        fn clear_eager_loads(&mut self) {}
        fn fetch(&self) -> Result<Vec<Value>, Unavailable> {
            if self.fail || self.fail_fetch {
                return Err(Unavailable);
            }
            self.log.borrow_mut().push(format!(
                "fetch filters={} order={} offset={:?} limit={:?}",
                self.filters.len(),
                self.order.len(),
                self.offset,
                self.limit
            ));
            let rows = self.matching().into_iter().skip(self.offset.unwrap_or(0));
            Ok(match self.limit {
                Some(limit) => rows.take(limit).collect(),
                None => rows.collect(),
            })
        }
        fn count(&self) -> Result<u64, Unavailable> {
            if self.fail {
                return Err(Unavailable);
            }
            self.log.borrow_mut().push(format!(
                "count filters={} order={} offset={:?} limit={:?}",
                self.filters.len(),
                self.order.len(),
                self.offset,
                self.limit
            ));
            Ok(self.matching().len() as u64)
        }
        fn count_distinct(&self, _expr: &str) -> Result<u64, Unavailable> {
            Ok(1)
        }
    }

    fn people() -> Fake {
        Fake::with_rows(vec![
            json!({"id": 1, "name": "Ada", "code": "A1"}),
            json!({"id": 2, "name": "Grace", "code": "A10"}),
            json!({"id": 3, "name": "Alan", "code": "B2"}),
        ])
    }

    fn columns() -> Vec<Box<dyn Column<Value>>> {
        vec![Box::new(FieldColumn::new("id")), Box::new(FieldColumn::new("name"))]
    }

    fn specs() -> Vec<FieldSpec> {
        FieldSpec::parse_all(["name", "code"]).unwrap()
    }

    #[test]
    fn no_search_returns_everything() {
        let mut engine = QueryEngine::new(people());
        let records = engine.produce_results(&columns(), &specs()).unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(engine.count(), 3);
        assert_eq!(engine.total_count().unwrap(), 3);
        assert_eq!(records[0].to_value(), json!([1, "Ada"]));
    }

    #[test]
    fn count_ignores_pagination_and_order() {
        let query = people();
        let log = query.log.clone();
        let mut engine = QueryEngine::new(query);
        engine.search("A").order_by(1, Dir::Desc).skip(1).take(1);

        let records = engine.produce_results(&columns(), &specs()).unwrap();

        assert_eq!(engine.count(), 3);
        assert_eq!(records.len(), 1);
        assert_eq!(
            *log.borrow(),
            vec![
                "count filters=1 order=0 offset=None limit=None",
                "fetch filters=1 order=1 offset=Some(1) limit=Some(1)",
            ]
        );
    }

    #[test]
    fn search_narrows_filtered_count_only() {
        let mut engine = QueryEngine::new(people());
        engine.search("Gr");

        let records = engine.produce_results(&columns(), &specs()).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(engine.count(), 1);
        assert_eq!(engine.total_count().unwrap(), 3);
    }

    #[test]
    fn base_query_is_not_mutated() {
        let mut engine = QueryEngine::new(people());
        engine.search("Ada").set_column_search(1, "A1").order_by(0, Dir::Asc);
        engine.produce_results(&columns(), &specs()).unwrap();

        assert!(engine.base_query().filters.is_empty());
        assert!(engine.base_query().order.is_empty());
        assert!(engine.original_query().filters.is_empty());
    }

    #[test]
    fn alias_mode_keys_by_name() {
        let mut engine = QueryEngine::new(people());
        engine.set_alias_mapping(true);

        let records = engine.produce_results(&columns(), &specs()).unwrap();
        assert_eq!(records[1].to_value(), json!({"id": 2, "name": "Grace"}));
    }

    #[test]
    fn decorations_only_when_set() {
        let mut engine = QueryEngine::new(people());
        let plain = engine.produce_results(&columns(), &specs()).unwrap();
        assert!(!plain[0].contains_key(crate::record::ROW_ID_KEY));

        engine
            .clear_fetch_cache()
            .set_row_id(|row| json!(format!("row_{}", row["id"])));
        let decorated = engine.produce_results(&columns(), &specs()).unwrap();
        assert_eq!(
            decorated[0].get(crate::record::ROW_ID_KEY),
            Some(&json!("row_1"))
        );
        assert!(!decorated[0].contains_key(crate::record::ROW_CLASS_KEY));
        assert!(!decorated[0].contains_key(crate::record::ROW_DATA_KEY));
    }

    #[test]
    fn text_and_function_columns() {
        let columns: Vec<Box<dyn Column<Value>>> = vec![
            Box::new(TextColumn::new("kind", "person")),
            Box::new(FunctionColumn::new("upper", |row: &Value| {
                json!(row["name"].as_str().unwrap_or_default().to_uppercase())
            })),
        ];
        let mut engine = QueryEngine::new(people());
        engine.take(1);

        let records = engine.produce_results(&columns, &specs()).unwrap();
        assert_eq!(records[0].to_value(), json!(["person", "ADA"]));
    }

    #[test]
    fn rows_are_memoized_until_cleared() {
        let query = people();
        let log = query.log.clone();
        let mut engine = QueryEngine::new(query);

        engine.produce_results(&columns(), &specs()).unwrap();
        engine.take(1);
        let stale = engine.produce_results(&columns(), &specs()).unwrap();
        assert_eq!(stale.len(), 3);

        engine.reset();
        let fresh = engine.produce_results(&columns(), &specs()).unwrap();
        assert_eq!(fresh.len(), 1);

        let fetches = log
            .borrow()
            .iter()
            .filter(|entry| entry.starts_with("fetch"))
            .count();
        assert_eq!(fetches, 2);
    }

    #[test]
    fn bad_search_index_fails_before_any_query() {
        let query = people();
        let log = query.log.clone();
        let mut engine = QueryEngine::new(query);
        engine.set_column_search(7, "x");

        let err = engine.produce_results(&columns(), &specs()).unwrap_err();
        assert!(err.is_configuration());
        assert!(matches!(
            err,
            EngineError::Configuration(ConfigurationError::UnknownSearchIndex { index: 7, .. })
        ));
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn backend_error_propagates() {
        let mut query = people();
        query.fail = true;
        let mut engine = QueryEngine::new(query);

        let err = engine.produce_results(&columns(), &specs()).unwrap_err();
        assert!(err.as_backend().is_some());
        assert_eq!(err.to_string(), "backend unavailable");
    }

    #[test]
    fn failed_fetch_keeps_previous_count() {
        let mut engine = QueryEngine::new(people());
        engine.search("Gr");
        engine.produce_results(&columns(), &specs()).unwrap();
        assert_eq!(engine.count(), 1);

        // the count query succeeds with 3 rows, then the fetch fails
        engine.builder.fail_fetch = true;
        engine.clear_fetch_cache().search("");
        let err = engine.produce_results(&columns(), &specs()).unwrap_err();

        assert!(err.as_backend().is_some());
        assert_eq!(engine.count(), 1);
        assert_eq!(engine.total_count().unwrap(), 1);
    }

    #[test]
    fn clear_order_drops_request() {
        let query = people();
        let log = query.log.clone();
        let mut engine = QueryEngine::new(query);
        engine.order_by(1, Dir::Desc).clear_order();

        engine.produce_results(&columns(), &specs()).unwrap();
        assert_eq!(
            log.borrow().last().map(String::as_str),
            Some("fetch filters=0 order=0 offset=None limit=None")
        );
    }

    #[test]
    fn search_state_reflects_request() {
        let mut engine = QueryEngine::new(people());
        assert!(!engine.search_state().is_active());

        engine
            .search("Ada")
            .set_exact_word_search(true)
            .set_column_search(1, "A1");
        let state = engine.search_state();
        assert!(state.is_active());
        assert_eq!(state.term(), Some("Ada"));
        assert!(state.exact());
        assert_eq!(state.column_searches().get(&1).map(String::as_str), Some("A1"));
    }

    #[test]
    fn order_resolution() {
        let columns: Vec<Box<dyn Column<Value>>> = vec![
            Box::new(FieldColumn::new("name")),
            Box::new(FieldColumn::new("code:integer")),
            Box::new(FieldColumn::new("posts::title")),
            Box::new(TextColumn::new("bad name;", "x")),
        ];

        assert_eq!(
            resolve_order(&columns, OrderRequest::new(0, Dir::Desc)),
            Ok(Some(OrderTerm::column("name", Dir::Desc)))
        );
        let Ok(Some(cast)) = resolve_order(&columns, OrderRequest::new(1, Dir::Asc)) else {
            panic!("expected a cast ordering");
        };
        assert_eq!(cast.target.to_string(), "CAST(code AS integer)");
        assert_eq!(
            resolve_order(&columns, OrderRequest::new(2, Dir::Asc)),
            Ok(None)
        );
        assert_eq!(
            resolve_order(&columns, OrderRequest::new(9, Dir::Asc)),
            Ok(None)
        );
        assert!(matches!(
            resolve_order(&columns, OrderRequest::new(3, Dir::Asc)),
            Err(ConfigurationError::InvalidIdentifier { .. })
        ));
    }

    #[test]
    fn make_wraps_counts() {
        let mut engine = QueryEngine::new(people());
        engine.search("Al");

        let response = engine.make(&columns(), &specs(), 4).unwrap();
        assert_eq!(response.draw, 4);
        assert_eq!(response.records_total, 3);
        assert_eq!(response.records_filtered, 1);
        assert_eq!(response.data.len(), 1);
    }

    #[test]
    fn from_relation_uses_base_query() {
        struct Owner;
        impl RelationSource for Owner {
            type Query = Fake;
            fn base_query(&self) -> Fake {
                people()
            }
        }

        let mut engine = QueryEngine::from_relation(&Owner);
        assert_eq!(engine.rows().unwrap().len(), 3);
    }
}
