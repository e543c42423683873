//! Row counting with GROUP BY awareness.
//!
//! Strategies are tried in a fixed order:
//!
//! 1. `distinct_count_group` with exactly one GROUP BY expression:
//!    `COUNT(DISTINCT expr)` with grouping and eager loads removed
//! 2. `search_with_alias`: fetch every row and count them
//! 3. `no_group_by_on_count`: `COUNT(*)` with grouping removed
//! 4. `COUNT(*)` as-is, leaving grouped counts to the backend
//!
//! With zero or several GROUP BY expressions, strategy 1 does not apply and
//! the next one is tried.

use crate::options::EngineOptions;
use crate::traits::QueryExpression;

/// The counting strategy selected for a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CountStrategy {
    /// `COUNT(DISTINCT expr)` over the single grouping expression.
    DistinctGroup(String),
    /// Materialize the rows and take their number.
    Materialize,
    /// `COUNT(*)` without GROUP BY.
    Ungrouped,
    /// `COUNT(*)` exactly as the query stands.
    Native,
}

impl CountStrategy {
    /// Selects the strategy for `query` under `options`.
    pub fn select<Q: QueryExpression>(query: &Q, options: &EngineOptions) -> Self {
        match query.group_by() {
            [group] if options.distinct_count_group => CountStrategy::DistinctGroup(group.clone()),
            _ if options.search_with_alias => CountStrategy::Materialize,
            _ if options.no_group_by_on_count => CountStrategy::Ungrouped,
            _ => CountStrategy::Native,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            CountStrategy::DistinctGroup(_) => "distinct_group",
            CountStrategy::Materialize => "materialize",
            CountStrategy::Ungrouped => "ungrouped",
            CountStrategy::Native => "native",
        }
    }
}

/// Counts the rows `query` would return, consuming it.
pub fn count_records<Q: QueryExpression>(
    mut query: Q,
    options: &EngineOptions,
) -> Result<u64, Q::Error> {
    let strategy = CountStrategy::select(&query, options);
    tracing::debug!(strategy = strategy.name(), "counting records");

    match strategy {
        CountStrategy::DistinctGroup(expr) => {
            query.set_group_by(Vec::new());
            query.clear_eager_loads();
            query.count_distinct(&expr)
        }
        CountStrategy::Materialize => {
            query.clear_eager_loads();
            Ok(query.fetch()?.len() as u64)
        }
        CountStrategy::Ungrouped => {
            query.set_group_by(Vec::new());
            query.count()
        }
        CountStrategy::Native => query.count(),
    }
}
