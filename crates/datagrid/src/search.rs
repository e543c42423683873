//! Search state and predicate construction.
//!
//! Two independent kinds of search feed the WHERE clause:
//!
//! ```text
//! WHERE <base filters>
//!   AND (f1 op term OR f2 op term OR ...)     -- global search
//!   AND fa op value_a AND fb op value_b ...   -- single-column searches
//! ```
//!
//! Global search uses one exact-match flag for every field. Single-column
//! searches look up exactness per field, keyed by the field spec's text form.
//! Both resolve fields through the same field spec list, so index `i` of a
//! single-column search is the `i`-th spec of that list.

use std::collections::{BTreeMap, HashMap};

use crate::error::{ConfigurationError, Result};
use crate::field::FieldSpec;
use crate::op::Op;
use crate::predicate::Predicate;

/// Wraps a term in `%` wildcards unless exact matching is requested.
pub fn wildcard(term: &str, exact: bool) -> String {
    if exact {
        term.to_string()
    } else {
        format!("%{}%", term)
    }
}

/// Search inputs collected between construction and result production.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchState {
    term: Option<String>,
    exact: bool,
    column_searches: BTreeMap<usize, String>,
    column_exact: HashMap<String, bool>,
}

impl SearchState {
    /// Creates an empty search state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the global search term. An empty term clears it.
    pub fn set_term(&mut self, term: impl Into<String>) {
        let term = term.into();
        self.term = if term.is_empty() { None } else { Some(term) };
    }

    /// Returns the global search term.
    pub fn term(&self) -> Option<&str> {
        self.term.as_deref()
    }

    /// Sets exact matching for global search.
    pub fn set_exact(&mut self, exact: bool) {
        self.exact = exact;
    }

    pub fn exact(&self) -> bool {
        self.exact
    }

    /// Sets the search value for field index `index`. An empty value clears it.
    pub fn set_column_search(&mut self, index: usize, value: impl Into<String>) {
        let value = value.into();
        if value.is_empty() {
            self.column_searches.remove(&index);
        } else {
            self.column_searches.insert(index, value);
        }
    }

    /// Returns the single-column searches by field index.
    pub fn column_searches(&self) -> &BTreeMap<usize, String> {
        &self.column_searches
    }

    /// Sets exact matching for single-column searches on `field`.
    ///
    /// `field` is the text form of the field spec, e.g. `code` or
    /// `age:integer`.
    pub fn set_column_exact(&mut self, field: impl Into<String>, exact: bool) {
        self.column_exact.insert(field.into(), exact);
    }

    /// Returns whether single-column search on `spec` is exact.
    ///
    /// A field with no entry uses substring matching.
    pub fn is_column_exact(&self, spec: &FieldSpec) -> bool {
        self.column_exact
            .get(&spec.to_string())
            .copied()
            .unwrap_or(false)
    }

    /// Returns `true` if either kind of search is active.
    pub fn is_active(&self) -> bool {
        self.term.is_some() || !self.column_searches.is_empty()
    }

    /// Builds the OR group for the global term, if one is set.
    ///
    /// With no searchable fields there is nothing to match against and no
    /// predicate is produced.
    pub fn global_predicate(&self, specs: &[FieldSpec], op: Op) -> Option<Predicate> {
        let term = self.term.as_deref()?;
        if specs.is_empty() {
            return None;
        }
        let value = wildcard(term, self.exact);
        Some(Predicate::any(
            specs
                .iter()
                .map(|spec| Predicate::for_field(spec, op, value.clone())),
        ))
    }

    /// Builds one predicate per single-column search, in index order.
    pub fn column_predicates(&self, specs: &[FieldSpec], op: Op) -> Result<Vec<Predicate>> {
        self.column_searches
            .iter()
            .map(|(&index, value)| {
                let spec = specs
                    .get(index)
                    .ok_or(ConfigurationError::UnknownSearchIndex {
                        index,
                        available: specs.len(),
                    })?;
                let predicate = if self.is_column_exact(spec) {
                    Predicate::for_field(spec, Op::Eq, value.clone())
                } else {
                    Predicate::for_field(spec, op, wildcard(value, false))
                };
                Ok(predicate)
            })
            .collect()
    }

    /// Builds every active predicate, global group first.
    ///
    /// Validation happens before anything is returned, so a bad index never
    /// leaves a query half-filtered.
    pub fn predicates(&self, specs: &[FieldSpec], op: Op) -> Result<Vec<Predicate>> {
        let mut predicates = Vec::new();
        if let Some(global) = self.global_predicate(specs, op) {
            predicates.push(global);
        }
        predicates.extend(self.column_predicates(specs, op)?);
        Ok(predicates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn specs() -> Vec<FieldSpec> {
        FieldSpec::parse_all(["name", "age:integer", "posts::title"]).unwrap()
    }

    #[test]
    fn wildcard_wrapping() {
        assert_eq!(wildcard("a", false), "%a%");
        assert_eq!(wildcard("a", true), "a");
    }

    #[test]
    fn inactive_by_default() {
        let state = SearchState::new();
        assert!(!state.is_active());
        assert!(state.predicates(&specs(), Op::ILike).unwrap().is_empty());
    }

    #[test]
    fn empty_term_clears() {
        let mut state = SearchState::new();
        state.set_term("x");
        assert!(state.is_active());
        state.set_term("");
        assert!(!state.is_active());
    }

    #[test]
    fn global_is_one_or_group() {
        let mut state = SearchState::new();
        state.set_term("ada");

        let predicate = state.global_predicate(&specs(), Op::ILike).unwrap();
        let Predicate::Any(children) = predicate else {
            panic!("expected an OR group");
        };
        assert_eq!(children.len(), 3);
        assert_eq!(children[0], Predicate::column("name", Op::ILike, "%ada%"));
        assert!(matches!(children[2], Predicate::Exists { .. }));
    }

    #[test]
    fn global_exact_skips_wildcards() {
        let mut state = SearchState::new();
        state.set_term("ada");
        state.set_exact(true);

        let predicate = state
            .global_predicate(&[FieldSpec::plain("name")], Op::Like)
            .unwrap();
        assert_eq!(
            predicate,
            Predicate::any([Predicate::column("name", Op::Like, "ada")])
        );
    }

    #[test]
    fn global_without_fields_is_skipped() {
        let mut state = SearchState::new();
        state.set_term("ada");
        assert!(state.global_predicate(&[], Op::ILike).is_none());
    }

    #[test]
    fn column_search_exactness_is_per_field() {
        let mut state = SearchState::new();
        state.set_column_search(0, "Ada");
        state.set_column_search(1, "4");
        state.set_column_exact("name", true);

        let predicates = state.column_predicates(&specs(), Op::ILike).unwrap();
        assert_eq!(predicates[0], Predicate::column("name", Op::Eq, "Ada"));
        assert_eq!(
            predicates[1],
            Predicate::for_field(&specs()[1], Op::ILike, "%4%")
        );
    }

    #[test]
    fn column_search_ignores_global_exact_flag() {
        let mut state = SearchState::new();
        state.set_exact(true);
        state.set_column_search(0, "Ada");

        let predicates = state.column_predicates(&specs(), Op::ILike).unwrap();
        assert_eq!(predicates[0], Predicate::column("name", Op::ILike, "%Ada%"));
    }

    #[test]
    fn column_search_unknown_index() {
        let mut state = SearchState::new();
        state.set_column_search(5, "x");
        assert_eq!(
            state.predicates(&specs(), Op::ILike),
            Err(ConfigurationError::UnknownSearchIndex {
                index: 5,
                available: 3
            })
        );
    }

    #[test]
    fn empty_column_value_clears_entry() {
        let mut state = SearchState::new();
        state.set_column_search(0, "x");
        state.set_column_search(0, "");
        assert!(state.column_searches().is_empty());
    }
}
