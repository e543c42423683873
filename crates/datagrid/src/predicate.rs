//! Structured filter predicates handed to query backends.
//!
//! Predicates are a small tree instead of SQL text. Values are always carried
//! separately from the operand, so a backend binds them as parameters.

use std::fmt;

use serde_json::Value;

use crate::field::{CastField, CastType, FieldSpec};
use crate::op::Op;

/// The left-hand side of a comparison.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Operand {
    /// A column referenced by name.
    Column(String),
    /// A column cast to another type.
    Cast(CastField),
}

impl Operand {
    /// Creates a column operand.
    pub fn column(name: impl Into<String>) -> Self {
        Operand::Column(name.into())
    }

    /// Creates a cast operand.
    pub fn cast(field: impl Into<String>, cast: CastType) -> Self {
        Operand::Cast(CastField {
            field: field.into(),
            cast,
        })
    }

    /// Returns the referenced column name.
    pub fn field(&self) -> &str {
        match self {
            Operand::Column(name) => name,
            Operand::Cast(cast) => &cast.field,
        }
    }
}

/// Renders the operand as a SQL expression.
impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Column(name) => write!(f, "{}", name),
            Operand::Cast(cast) => write!(f, "CAST({} AS {})", cast.field, cast.cast),
        }
    }
}

/// A filter predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `operand op value`, with the value bound as a parameter.
    Compare {
        operand: Operand,
        op: Op,
        value: Value,
    },
    /// At least one row of `relation` satisfies the inner predicate.
    Exists {
        relation: String,
        predicate: Box<Predicate>,
    },
    /// At least one child matches. An empty group matches nothing.
    Any(Vec<Predicate>),
    /// Every child matches. An empty group matches everything.
    All(Vec<Predicate>),
}

impl Predicate {
    /// Creates a comparison predicate.
    pub fn compare(operand: Operand, op: Op, value: impl Into<Value>) -> Self {
        Predicate::Compare {
            operand,
            op,
            value: value.into(),
        }
    }

    /// Creates a column comparison predicate.
    pub fn column(name: impl Into<String>, op: Op, value: impl Into<Value>) -> Self {
        Predicate::compare(Operand::column(name), op, value)
    }

    /// Creates a semi-join predicate over a relation.
    pub fn exists(relation: impl Into<String>, predicate: Predicate) -> Self {
        Predicate::Exists {
            relation: relation.into(),
            predicate: Box::new(predicate),
        }
    }

    /// Creates an OR group.
    pub fn any(predicates: impl IntoIterator<Item = Predicate>) -> Self {
        Predicate::Any(predicates.into_iter().collect())
    }

    /// Creates an AND group.
    pub fn all(predicates: impl IntoIterator<Item = Predicate>) -> Self {
        Predicate::All(predicates.into_iter().collect())
    }

    /// Builds the comparison a field spec stands for.
    ///
    /// Related specs become an [`Exists`](Predicate::Exists) wrapping a
    /// column comparison on the related entity.
    pub fn for_field(spec: &FieldSpec, op: Op, value: impl Into<Value>) -> Self {
        match spec {
            FieldSpec::Plain(field) => Predicate::column(field.clone(), op, value),
            FieldSpec::Cast(cast) => Predicate::compare(Operand::Cast(cast.clone()), op, value),
            FieldSpec::Related { relation, field } => {
                Predicate::exists(relation.clone(), Predicate::column(field.clone(), op, value))
            }
        }
    }
}
