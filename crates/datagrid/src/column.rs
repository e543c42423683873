//! Column definitions.
//!
//! A column knows its name and how to turn a row into one output value.
//! The column list is order-significant: it fixes the shape of every record
//! and what "order by column N" refers to.

use serde_json::Value;

use crate::traits::RowFields;

/// A column of the output grid.
pub trait Column<R> {
    /// The column name. In alias mode this is the record key; it is also
    /// the ORDER BY target when ordering by this column.
    fn name(&self) -> &str;

    /// Extracts and formats this column's value from a row.
    fn run(&self, row: &R) -> Value;
}

/// A column that always yields the same text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextColumn {
    name: String,
    text: String,
}

impl TextColumn {
    /// Creates a constant text column.
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        TextColumn {
            name: name.into(),
            text: text.into(),
        }
    }
}

impl<R> Column<R> for TextColumn {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, _row: &R) -> Value {
        Value::String(self.text.clone())
    }
}

/// A column that reads a field of the row.
///
/// The name may carry a cast suffix (`age:integer`) for ordering; the field
/// read from the row is the part before the first `:`. Missing fields yield
/// `null`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldColumn {
    name: String,
}

impl FieldColumn {
    /// Creates a field column.
    pub fn new(name: impl Into<String>) -> Self {
        FieldColumn { name: name.into() }
    }

    fn field(&self) -> &str {
        self.name.split(':').next().unwrap_or(&self.name)
    }
}

impl<R: RowFields> Column<R> for FieldColumn {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, row: &R) -> Value {
        row.field_value(self.field()).unwrap_or(Value::Null)
    }
}

/// A column computed by a closure.
pub struct FunctionColumn<R> {
    name: String,
    func: Box<dyn Fn(&R) -> Value>,
}

impl<R> FunctionColumn<R> {
    /// Creates a column from a closure.
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&R) -> Value + 'static,
    {
        FunctionColumn {
            name: name.into(),
            func: Box::new(func),
        }
    }
}

impl<R> Column<R> for FunctionColumn<R> {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, row: &R) -> Value {
        (self.func)(row)
    }
}

impl<R> std::fmt::Debug for FunctionColumn<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionColumn")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
