//! SQL `LIKE` patterns.

use regex::{Regex, RegexBuilder};

use crate::error::{MemoryError, Result};

/// A compiled `LIKE` pattern.
///
/// `%` matches any run of characters and `_` matches exactly one. Everything
/// else matches literally. The whole value must match.
#[derive(Debug, Clone)]
pub struct LikePattern {
    regex: Regex,
}

impl LikePattern {
    /// Compiles `pattern`, optionally ignoring case.
    pub fn new(pattern: &str, case_insensitive: bool) -> Result<Self> {
        let mut source = String::with_capacity(pattern.len() + 2);
        source.push('^');
        for c in pattern.chars() {
            match c {
                '%' => source.push_str(".*"),
                '_' => source.push('.'),
                c => source.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
            }
        }
        source.push('$');

        let regex = RegexBuilder::new(&source)
            .case_insensitive(case_insensitive)
            .dot_matches_new_line(true)
            .build()
            .map_err(|err| MemoryError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: err.to_string(),
            })?;
        Ok(LikePattern { regex })
    }

    /// Returns `true` if `text` matches the pattern.
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn like(pattern: &str) -> LikePattern {
        LikePattern::new(pattern, false).unwrap()
    }

    #[test]
    fn wildcards() {
        let p = like("%ad%");
        assert!(p.is_match("Grad"));
        assert!(p.is_match("ad"));
        assert!(!p.is_match("Ada"));

        let p = like("A_");
        assert!(p.is_match("A1"));
        assert!(!p.is_match("A10"));
    }

    #[test]
    fn case_sensitivity() {
        assert!(!like("ada").is_match("Ada"));
        assert!(LikePattern::new("ada", true).unwrap().is_match("Ada"));
    }

    #[test]
    fn regex_metacharacters_are_literal() {
        let p = like("a.b(%");
        assert!(p.is_match("a.b(c"));
        assert!(!p.is_match("axb(c"));
    }

    #[test]
    fn exact_pattern_is_anchored() {
        let p = LikePattern::new("A1", true).unwrap();
        assert!(p.is_match("a1"));
        assert!(!p.is_match("A10"));
    }
}
