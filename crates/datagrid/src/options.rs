//! Engine configuration.
//!
//! [`EngineOptions`] is a plain value: build it once (with the builder
//! methods or by deserializing a config file) and hand it to the engine.
//! The count, search and ordering routines read it by reference.
//!
//! ```
//! use datagrid::{EngineOptions, KeyMode, Op};
//!
//! let options = EngineOptions::new()
//!     .search_operator(Op::Like)
//!     .distinct_count_group(true)
//!     .key_mode(KeyMode::Index);
//!
//! assert_eq!(options.search_operator, Op::Like);
//! assert!(!options.no_group_by_on_count);
//! ```

use serde::{Deserialize, Serialize};

use crate::op::Op;

/// How record entries are keyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyMode {
    /// Keyed by column name.
    Alias,
    /// Keyed by zero-based column position.
    #[default]
    Index,
}

/// Named engine behaviors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    /// Operator used for text search.
    pub search_operator: Op,
    /// Count by materializing the filtered rows, for filters that reference
    /// aliased output columns.
    pub search_with_alias: bool,
    /// Drop GROUP BY from the count query.
    pub no_group_by_on_count: bool,
    /// With exactly one GROUP BY expression, count its distinct values.
    pub distinct_count_group: bool,
    /// Record key mode.
    pub key_mode: KeyMode,
}

impl Default for EngineOptions {
    fn default() -> Self {
        EngineOptions {
            search_operator: Op::ILike,
            search_with_alias: false,
            no_group_by_on_count: false,
            distinct_count_group: false,
            key_mode: KeyMode::Index,
        }
    }
}

impl EngineOptions {
    /// Creates the default options.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search_operator(mut self, op: Op) -> Self {
        self.search_operator = op;
        self
    }

    pub fn search_with_alias(mut self, enabled: bool) -> Self {
        self.search_with_alias = enabled;
        self
    }

    pub fn no_group_by_on_count(mut self, enabled: bool) -> Self {
        self.no_group_by_on_count = enabled;
        self
    }

    pub fn distinct_count_group(mut self, enabled: bool) -> Self {
        self.distinct_count_group = enabled;
        self
    }

    pub fn key_mode(mut self, mode: KeyMode) -> Self {
        self.key_mode = mode;
        self
    }

    /// Returns `true` when records are keyed by column name.
    pub fn alias_mapping(&self) -> bool {
        self.key_mode == KeyMode::Alias
    }
}
