//! Searchable field specifications.
//!
//! A [`FieldSpec`] names what a search predicate targets. Specs are written
//! as short strings and parsed once, up front:
//!
//! | Text | Variant |
//! |------|---------|
//! | `email` | [`FieldSpec::Plain`] |
//! | `age:integer`, `code:varchar:10` | [`FieldSpec::Cast`] |
//! | `author::name` | [`FieldSpec::Related`] |
//!
//! Every identifier is validated while parsing, so nothing reaches a
//! backend that could not be emitted as a plain identifier.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{ConfigurationError, Result};

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$")
        .expect("identifier pattern is valid")
});

static TYPE_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9_]*( [A-Za-z][A-Za-z0-9_]*)*$")
        .expect("type name pattern is valid")
});

/// Checks that `identifier` is a (possibly dotted) column or relation name.
pub fn validate_identifier(identifier: &str) -> Result<()> {
    if IDENTIFIER.is_match(identifier) {
        Ok(())
    } else {
        Err(ConfigurationError::InvalidIdentifier {
            identifier: identifier.to_string(),
        })
    }
}

/// Target type of a cast, such as `integer` or `varchar(50)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CastType {
    /// Type name as written, e.g. `varchar`.
    pub name: String,
    /// Optional length parameter.
    pub length: Option<u32>,
}

impl CastType {
    /// Creates a cast type without a length.
    pub fn new(name: impl Into<String>) -> Self {
        CastType {
            name: name.into(),
            length: None,
        }
    }

    /// Creates a cast type with a length parameter.
    pub fn with_length(name: impl Into<String>, length: u32) -> Self {
        CastType {
            name: name.into(),
            length: Some(length),
        }
    }
}

impl fmt::Display for CastType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.length {
            Some(length) => write!(f, "{}({})", self.name, length),
            None => write!(f, "{}", self.name),
        }
    }
}

/// A field compared through a cast.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CastField {
    /// The field being cast.
    pub field: String,
    /// The cast target.
    pub cast: CastType,
}

/// A parsed searchable field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldSpec {
    /// A column compared directly.
    Plain(String),
    /// A column cast before comparison.
    Cast(CastField),
    /// A field on a related entity, matched through a semi-join.
    Related {
        /// Relationship name on the base entity.
        relation: String,
        /// Field on the related entity.
        field: String,
    },
}

impl FieldSpec {
    /// Creates a plain field spec.
    pub fn plain(field: impl Into<String>) -> Self {
        FieldSpec::Plain(field.into())
    }

    /// Creates a cast field spec.
    pub fn cast(field: impl Into<String>, cast: CastType) -> Self {
        FieldSpec::Cast(CastField {
            field: field.into(),
            cast,
        })
    }

    /// Creates a related field spec.
    pub fn related(relation: impl Into<String>, field: impl Into<String>) -> Self {
        FieldSpec::Related {
            relation: relation.into(),
            field: field.into(),
        }
    }

    /// Parses a spec string.
    pub fn parse(spec: &str) -> Result<Self> {
        let spec = spec.trim();
        if spec.is_empty() {
            return Err(ConfigurationError::EmptySpec);
        }

        if let Some((relation, field)) = spec.split_once("::") {
            if relation.is_empty() || field.is_empty() {
                return Err(ConfigurationError::IncompleteRelated {
                    spec: spec.to_string(),
                });
            }
            validate_identifier(relation)?;
            validate_identifier(field)?;
            return Ok(FieldSpec::related(relation, field));
        }

        if spec.contains(':') {
            return parse_cast(spec).map(FieldSpec::Cast);
        }

        validate_identifier(spec)?;
        Ok(FieldSpec::plain(spec))
    }

    /// Parses a list of spec strings, failing on the first malformed one.
    pub fn parse_all<I, S>(specs: I) -> Result<Vec<FieldSpec>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        specs
            .into_iter()
            .map(|spec| FieldSpec::parse(spec.as_ref()))
            .collect()
    }

    /// Returns the underlying field name, without relation or cast.
    pub fn field(&self) -> &str {
        match self {
            FieldSpec::Plain(field) => field,
            FieldSpec::Cast(cast) => &cast.field,
            FieldSpec::Related { field, .. } => field,
        }
    }

    /// Returns the cast part, if this is a cast spec.
    pub fn as_cast(&self) -> Option<&CastField> {
        match self {
            FieldSpec::Cast(cast) => Some(cast),
            _ => None,
        }
    }
}

fn parse_cast(spec: &str) -> Result<CastField> {
    let parts: Vec<&str> = spec.split(':').collect();
    if parts.len() > 3 {
        return Err(ConfigurationError::TooManySegments {
            spec: spec.to_string(),
        });
    }

    let field = parts[0];
    let type_name = parts.get(1).copied().unwrap_or_default();
    if field.is_empty() || type_name.is_empty() {
        return Err(ConfigurationError::IncompleteCast {
            spec: spec.to_string(),
        });
    }
    validate_identifier(field)?;
    if !TYPE_NAME.is_match(type_name) {
        return Err(ConfigurationError::InvalidIdentifier {
            identifier: type_name.to_string(),
        });
    }

    let length = match parts.get(2) {
        None => None,
        Some(raw) => match raw.parse::<u32>() {
            Ok(length) if length > 0 => Some(length),
            _ => {
                return Err(ConfigurationError::InvalidCastLength {
                    spec: spec.to_string(),
                    length: raw.to_string(),
                })
            }
        },
    };

    Ok(CastField {
        field: field.to_string(),
        cast: CastType {
            name: type_name.to_string(),
            length,
        },
    })
}

impl FromStr for FieldSpec {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self> {
        FieldSpec::parse(s)
    }
}

/// Writes the spec back in its text form.
impl fmt::Display for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldSpec::Plain(field) => write!(f, "{}", field),
            FieldSpec::Cast(CastField { field, cast }) => match cast.length {
                Some(length) => write!(f, "{}:{}:{}", field, cast.name, length),
                None => write!(f, "{}:{}", field, cast.name),
            },
            FieldSpec::Related { relation, field } => write!(f, "{}::{}", relation, field),
        }
    }
}
