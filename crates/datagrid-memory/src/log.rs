//! Execution log.

use std::cell::RefCell;
use std::rc::Rc;

use crate::statement::Statement;

/// Records every statement a database executes.
///
/// Clones share the same entries, so a test can keep a handle while the
/// database is owned by the queries.
#[derive(Debug, Clone, Default)]
pub struct ExecutionLog {
    entries: Rc<RefCell<Vec<Statement>>>,
}

impl ExecutionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&self, statement: Statement) {
        tracing::trace!(sql = %statement.sql, bindings = statement.bindings.len(), "executing");
        self.entries.borrow_mut().push(statement);
    }

    /// Returns a copy of the recorded statements, oldest first.
    pub fn statements(&self) -> Vec<Statement> {
        self.entries.borrow().clone()
    }

    /// Returns the SQL text of each recorded statement.
    pub fn sql(&self) -> Vec<String> {
        self.entries.borrow().iter().map(|s| s.sql.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Forgets every recorded statement.
    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }
}
