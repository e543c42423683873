//! In-memory queries.

use std::collections::HashSet;
use std::rc::Rc;

use datagrid::{Dir, OrderTerm, Predicate, QueryExpression, RelationSource};
use serde_json::Value;

use crate::compare::compare_keys;
use crate::database::{Database, Relation, Table};
use crate::error::{MemoryError, Result};
use crate::eval::{belongs_to, Matcher, Resolved};
use crate::statement::{Projection, Select, Statement};

/// A SELECT over one table of a shared [`Database`].
///
/// Builder methods take and return the query by value:
///
/// ```
/// use std::rc::Rc;
/// use datagrid_memory::{Database, Table};
/// use serde_json::json;
///
/// let mut db = Database::new();
/// db.add_table(
///     Table::new("users", ["id", "name"])
///         .with_rows([json!({"id": 1, "name": "Ada"}), json!({"id": 2, "name": "Alan"})])
///         .unwrap(),
/// )
/// .unwrap();
/// let db = Rc::new(db);
///
/// let query = db.query("users").unwrap().where_eq("name", "Alan");
/// assert_eq!(query.to_sql().unwrap().sql, "SELECT * FROM users WHERE name = ?");
/// ```
///
/// Unknown columns, relations and cast types are reported when the query
/// runs or renders, not when it is built.
#[derive(Debug, Clone)]
pub struct MemoryQuery {
    db: Rc<Database>,
    table: String,
    filters: Vec<Predicate>,
    groups: Vec<String>,
    order: Vec<OrderTerm>,
    eager: Vec<String>,
    limit: Option<usize>,
    offset: Option<usize>,
}

impl MemoryQuery {
    /// Starts a query over `table`.
    pub fn new(db: &Rc<Database>, table: &str) -> Result<Self> {
        db.table(table)?;
        Ok(Self::over(db, table))
    }

    fn over(db: &Rc<Database>, table: &str) -> Self {
        MemoryQuery {
            db: Rc::clone(db),
            table: table.to_string(),
            filters: Vec::new(),
            groups: Vec::new(),
            order: Vec::new(),
            eager: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    // ========================================================================
    // Builder
    // ========================================================================

    /// Adds a filter, ANDed with the existing ones.
    pub fn and_where(mut self, predicate: Predicate) -> Self {
        self.filters.push(predicate);
        self
    }

    /// Adds an equality filter.
    pub fn where_eq(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.and_where(Predicate::column(column, datagrid::Op::Eq, value))
    }

    /// Adds a GROUP BY column.
    pub fn group(mut self, column: impl Into<String>) -> Self {
        self.groups.push(column.into());
        self
    }

    pub fn order_asc(mut self, column: impl Into<String>) -> Self {
        self.order.push(OrderTerm::column(column, Dir::Asc));
        self
    }

    pub fn order_desc(mut self, column: impl Into<String>) -> Self {
        self.order.push(OrderTerm::column(column, Dir::Desc));
        self
    }

    /// Eager loads a relation: each fetched row gets its related rows as an
    /// array under the relation name.
    pub fn with(mut self, relation: impl Into<String>) -> Self {
        self.eager.push(relation.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn filters(&self) -> &[Predicate] {
        &self.filters
    }

    pub fn order(&self) -> &[OrderTerm] {
        &self.order
    }

    pub fn eager_loads(&self) -> &[String] {
        &self.eager
    }

    pub fn limit_value(&self) -> Option<usize> {
        self.limit
    }

    pub fn offset_value(&self) -> Option<usize> {
        self.offset
    }

    /// The database this query reads.
    pub fn database(&self) -> &Rc<Database> {
        &self.db
    }

    // ========================================================================
    // SQL
    // ========================================================================

    fn select<'q>(&'q self, projection: Projection<'q>) -> Select<'q> {
        let rows = projection == Projection::Rows;
        Select {
            table: &self.table,
            projection,
            filters: &self.filters,
            groups: match projection {
                Projection::CountDistinct(_) => &[],
                _ => &self.groups,
            },
            order: if rows { &self.order } else { &[] },
            limit: if rows { self.limit } else { None },
            offset: if rows { self.offset } else { None },
        }
    }

    /// Renders the row-fetching statement.
    pub fn to_sql(&self) -> Result<Statement> {
        self.select(Projection::Rows).render(&self.db)
    }

    /// Renders the `COUNT(*)` statement.
    pub fn count_sql(&self) -> Result<Statement> {
        self.select(Projection::Count).render(&self.db)
    }

    /// Renders the `COUNT(DISTINCT expr)` statement.
    pub fn count_distinct_sql(&self, expr: &str) -> Result<Statement> {
        self.select(Projection::CountDistinct(expr)).render(&self.db)
    }

    // ========================================================================
    // Execution
    // ========================================================================

    fn source(&self) -> Result<&Table> {
        self.db.table(&self.table)
    }

    /// Rows passing every filter, in table order.
    fn matching<'a>(&self, table: &'a Table) -> Result<Vec<&'a Value>> {
        let matchers = Matcher::compile_all(&self.db, table, &self.filters)?;
        Ok(table
            .rows()
            .iter()
            .filter(|row| matchers.iter().all(|m| m.matches(row)))
            .collect())
    }

    fn group_keys(&self, table: &Table) -> Result<Vec<Resolved>> {
        self.groups
            .iter()
            .map(|column| Resolved::column(table, column))
            .collect()
    }

    fn execute(&self) -> Result<Vec<Value>> {
        let statement = self.to_sql()?;
        let table = self.source()?;
        let mut rows = self.matching(table)?;

        if !self.groups.is_empty() {
            let keys = self.group_keys(table)?;
            let mut seen = HashSet::new();
            rows.retain(|row| seen.insert(group_key(&keys, row)));
        }

        if !self.order.is_empty() {
            let terms = self
                .order
                .iter()
                .map(|term| Resolved::compile(table, &term.target))
                .collect::<Result<Vec<_>>>()?;
            let dirs: Vec<Dir> = self.order.iter().map(|term| term.dir).collect();
            let mut keyed: Vec<(Vec<Value>, &Value)> = rows
                .into_iter()
                .map(|row| (terms.iter().map(|t| t.value(row)).collect(), row))
                .collect();
            keyed.sort_by(|(a, _), (b, _)| compare_keys(a, b, &dirs));
            rows = keyed.into_iter().map(|(_, row)| row).collect();
        }

        let offset = self.offset.unwrap_or(0);
        let page = rows.into_iter().skip(offset);
        let page: Vec<&Value> = match self.limit {
            Some(limit) => page.take(limit).collect(),
            None => page.collect(),
        };

        let mut fetched: Vec<Value> = page.into_iter().cloned().collect();
        for name in &self.eager {
            let relation = self.db.relation(&self.table, name)?;
            let related = self.db.table(&relation.related)?;
            for row in &mut fetched {
                attach(row, name, relation, related);
            }
        }

        self.db.log().record(statement);
        Ok(fetched)
    }
}

fn group_key(keys: &[Resolved], row: &Value) -> String {
    Value::Array(keys.iter().map(|k| k.value(row)).collect()).to_string()
}

fn attach(row: &mut Value, name: &str, relation: &Relation, related: &Table) {
    let key = row.get(&relation.local_key).cloned().unwrap_or(Value::Null);
    let children: Vec<Value> = related
        .rows()
        .iter()
        .filter(|child| belongs_to(child, &relation.foreign_key, &key))
        .cloned()
        .collect();
    if let Value::Object(fields) = row {
        fields.insert(name.to_string(), Value::Array(children));
    }
}

impl QueryExpression for MemoryQuery {
    type Row = Value;
    type Error = MemoryError;

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

    fn clear_eager_loads(&mut self) {
        self.eager.clear();
    }

    fn fetch(&self) -> Result<Vec<Value>> {
        self.execute()
    }

    /// Counts matching rows. With GROUP BY this is the size of the first
    /// group, which is what a grouped `COUNT(*)` returns as its first row.
    fn count(&self) -> Result<u64> {
        let statement = self.count_sql()?;
        let table = self.source()?;
        let rows = self.matching(table)?;

        let count = if self.groups.is_empty() {
            rows.len()
        } else {
            let keys = self.group_keys(table)?;
            match rows.first() {
                Some(first) => {
                    let first = group_key(&keys, first);
                    rows.iter().filter(|row| group_key(&keys, row) == first).count()
                }
                None => 0,
            }
        };

        self.db.log().record(statement);
        Ok(count as u64)
    }

    /// Counts distinct non-null values of the column `expr`.
    fn count_distinct(&self, expr: &str) -> Result<u64> {
        let statement = self.count_distinct_sql(expr)?;
        let table = self.source()?;
        let column = Resolved::column(table, expr)?;
        let distinct: HashSet<String> = self
            .matching(table)?
            .into_iter()
            .map(|row| column.value(row))
            .filter(|value| !value.is_null())
            .map(|value| value.to_string())
            .collect();

        self.db.log().record(statement);
        Ok(distinct.len() as u64)
    }
}

/// The children of one parent row, as a query source.
///
/// Resolves to a query over the related table constrained to the parent's
/// key.
#[derive(Debug, Clone)]
pub struct RelationQuery {
    db: Rc<Database>,
    relation: Relation,
    parent_key: Value,
}

impl RelationQuery {
    /// Looks up `relation` on `table`, for the parent row keyed `parent_key`.
    pub fn new(
        db: &Rc<Database>,
        table: &str,
        relation: &str,
        parent_key: impl Into<Value>,
    ) -> Result<Self> {
        let relation = db.relation(table, relation)?.clone();
        Ok(RelationQuery {
            db: Rc::clone(db),
            relation,
            parent_key: parent_key.into(),
        })
    }

    pub fn relation(&self) -> &Relation {
        &self.relation
    }
}

impl RelationSource for RelationQuery {
    type Query = MemoryQuery;

    fn base_query(&self) -> MemoryQuery {
        MemoryQuery::over(&self.db, &self.relation.related)
            .where_eq(self.relation.foreign_key.clone(), self.parent_key.clone())
    }
}
