//! Searching a segment with several searchers at once.
//!
//! Each [`SearcherFactory`] turns the query text into a [`Searcher`], or
//! rejects it. Matches from every searcher are merged by start index; when
//! two searchers match at the same start the longer match is kept and both
//! names are listed. Navigation then walks the sorted list with a binary
//! search from the caret, wrapping at both ends.

mod expression;

use std::collections::BTreeMap;

use omnivore_segment::{IndexRange, Segment, StyleBits, indexes_to_ranges};

use crate::flags::StatusFlags;
use crate::{EditError, EditResult};

pub use expression::ByteExpression;

/// Options passed to every factory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchOptions {
    pub case_sensitive_text: bool,
}

/// A configured search over one segment.
pub trait Searcher {
    /// Name listed in the match message.
    fn ui_name(&self) -> &'static str;

    /// Matching `(start, end)` spans in any order.
    fn find(&self, segment: &Segment) -> Vec<IndexRange>;
}

/// Builds a searcher from query text.
#[derive(Clone, Copy)]
pub struct SearcherFactory {
    pub name: &'static str,
    pub build: fn(&str, &SearchOptions) -> EditResult<Box<dyn Searcher>>,
}

impl std::fmt::Debug for SearcherFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearcherFactory").field("name", &self.name).finish()
    }
}

impl SearcherFactory {
    pub const HEX: SearcherFactory = SearcherFactory {
        name: "hex",
        build: HexSearcher::build,
    };
    pub const TEXT: SearcherFactory = SearcherFactory {
        name: "text",
        build: TextSearcher::build,
    };
    pub const COMMENTS: SearcherFactory = SearcherFactory {
        name: "comments",
        build: CommentSearcher::build,
    };
    pub const EXPRESSION: SearcherFactory = SearcherFactory {
        name: "expression",
        build: ExpressionSearcher::build,
    };

    pub fn builtin() -> [SearcherFactory; 4] {
        [Self::HEX, Self::TEXT, Self::COMMENTS, Self::EXPRESSION]
    }

    /// Factories with the given names, in the given order. Unknown names are
    /// skipped with a warning.
    pub fn by_names<S: AsRef<str>>(names: &[S]) -> Vec<SearcherFactory> {
        names
            .iter()
            .filter_map(|name| {
                let found = Self::builtin().into_iter().find(|f| f.name == name.as_ref());
                if found.is_none() {
                    tracing::warn!("unknown searcher '{}'", name.as_ref());
                }
                found
            })
            .collect()
    }
}

/// Every non-overlapping occurrence of `needle`, left to right.
fn find_bytes(haystack: &[u8], needle: &[u8], fold_case: bool) -> Vec<IndexRange> {
    let mut matches = Vec::new();
    if needle.is_empty() || needle.len() > haystack.len() {
        return matches;
    }
    let eq = |a: &u8, b: &u8| {
        if fold_case {
            a.eq_ignore_ascii_case(b)
        } else {
            a == b
        }
    };
    let mut i = 0;
    while i + needle.len() <= haystack.len() {
        let window = &haystack[i..i + needle.len()];
        if window.iter().zip(needle).all(|(a, b)| eq(a, b)) {
            matches.push((i, i + needle.len()));
            i += needle.len();
        } else {
            i += 1;
        }
    }
    matches
}

// ==================== Searchers ====================

/// Hex byte strings such as `a9 00 8d`.
#[derive(Debug)]
pub struct HexSearcher {
    needle: Vec<u8>,
}

impl HexSearcher {
    pub fn new(query: &str) -> EditResult<Self> {
        let digits: String = query.chars().filter(|c| !c.is_whitespace()).collect();
        if digits.is_empty() || digits.len() % 2 != 0 {
            return Err(EditError::InvalidSearchQuery(format!("Invalid hex string '{query}'")));
        }
        let needle = (0..digits.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&digits[i..i + 2], 16))
            .collect::<Result<Vec<u8>, _>>()
            .map_err(|_| EditError::InvalidSearchQuery(format!("Invalid hex string '{query}'")))?;
        Ok(Self { needle })
    }

    fn build(query: &str, _options: &SearchOptions) -> EditResult<Box<dyn Searcher>> {
        Ok(Box::new(Self::new(query)?))
    }
}

impl Searcher for HexSearcher {
    fn ui_name(&self) -> &'static str {
        "hex"
    }

    fn find(&self, segment: &Segment) -> Vec<IndexRange> {
        find_bytes(&segment.to_vec(), &self.needle, false)
    }
}

/// The query's bytes, optionally ignoring ASCII case.
#[derive(Debug)]
pub struct TextSearcher {
    needle: Vec<u8>,
    fold_case: bool,
}

impl TextSearcher {
    pub fn new(query: &str, case_sensitive: bool) -> EditResult<Self> {
        if query.is_empty() {
            return Err(EditError::InvalidSearchQuery("Empty search text".to_string()));
        }
        Ok(Self {
            needle: query.as_bytes().to_vec(),
            fold_case: !case_sensitive,
        })
    }

    fn build(query: &str, options: &SearchOptions) -> EditResult<Box<dyn Searcher>> {
        Ok(Box::new(Self::new(query, options.case_sensitive_text)?))
    }
}

impl Searcher for TextSearcher {
    fn ui_name(&self) -> &'static str {
        "text"
    }

    fn find(&self, segment: &Segment) -> Vec<IndexRange> {
        find_bytes(&segment.to_vec(), &self.needle, self.fold_case)
    }
}

/// Comments containing the query, case-insensitively.
#[derive(Debug)]
pub struct CommentSearcher {
    needle: String,
}

impl CommentSearcher {
    pub fn new(query: &str) -> EditResult<Self> {
        if query.is_empty() {
            return Err(EditError::InvalidSearchQuery("Empty search text".to_string()));
        }
        Ok(Self {
            needle: query.to_lowercase(),
        })
    }

    fn build(query: &str, _options: &SearchOptions) -> EditResult<Box<dyn Searcher>> {
        Ok(Box::new(Self::new(query)?))
    }
}

impl Searcher for CommentSearcher {
    fn ui_name(&self) -> &'static str {
        "comments"
    }

    fn find(&self, segment: &Segment) -> Vec<IndexRange> {
        segment
            .get_sorted_comments()
            .into_iter()
            .filter(|(_, text)| text.to_lowercase().contains(&self.needle))
            .map(|(index, _)| (index, index + 1))
            .collect()
    }
}

/// Bytes for which a [`ByteExpression`] is true; runs become one match.
#[derive(Debug)]
pub struct ExpressionSearcher {
    expression: ByteExpression,
}

impl ExpressionSearcher {
    pub fn new(query: &str) -> EditResult<Self> {
        Ok(Self {
            expression: ByteExpression::parse(query)?,
        })
    }

    fn build(query: &str, _options: &SearchOptions) -> EditResult<Box<dyn Searcher>> {
        Ok(Box::new(Self::new(query)?))
    }
}

impl Searcher for ExpressionSearcher {
    fn ui_name(&self) -> &'static str {
        "expression"
    }

    fn find(&self, segment: &Segment) -> Vec<IndexRange> {
        let hits: Vec<usize> = segment
            .to_vec()
            .into_iter()
            .enumerate()
            .filter(|&(i, b)| self.expression.matches(segment.address(i), b))
            .map(|(i, _)| i)
            .collect();
        indexes_to_ranges(&hits)
    }
}

// ==================== Results ====================

/// Merged, sorted matches of one find, plus the navigation cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResults {
    query: String,
    matches: Vec<IndexRange>,
    names: BTreeMap<usize, String>,
    current: Option<usize>,
    caret_index: usize,
    start_addr: usize,
}

impl SearchResults {
    /// Runs every factory over `segment` and selects the first match at or
    /// after `caret_index`.
    ///
    /// The `match` style bit is cleared everywhere and then set on every
    /// match.
    pub fn find_all(
        segment: &Segment,
        factories: &[SearcherFactory],
        query: &str,
        caret_index: usize,
        options: &SearchOptions,
    ) -> (Self, StatusFlags) {
        let mut flags = StatusFlags::new();
        flags.changed_document = false;
        flags.refresh_needed = true;

        let mut merged: BTreeMap<usize, (usize, String)> = BTreeMap::new();
        for factory in factories {
            let searcher = match (factory.build)(query, options) {
                Ok(searcher) => searcher,
                Err(err) => {
                    tracing::warn!("searcher {} rejected query: {}", factory.name, err);
                    flags.errors.push(err.to_string());
                    continue;
                }
            };
            let name = searcher.ui_name();
            for (start, end) in searcher.find(segment) {
                match merged.get_mut(&start) {
                    Some((best_end, names)) => {
                        if !names.split(", ").any(|n| n == name) {
                            names.push_str(", ");
                            names.push_str(name);
                        }
                        *best_end = (*best_end).max(end);
                    }
                    None => {
                        merged.insert(start, (end, name.to_string()));
                    }
                }
            }
        }

        let mut results = Self {
            query: query.to_string(),
            matches: merged.iter().map(|(&start, &(end, _))| (start, end)).collect(),
            names: merged.into_iter().map(|(start, (_, names))| (start, names)).collect(),
            current: None,
            caret_index,
            start_addr: segment.start_addr(),
        };

        if let Err(err) = segment.clear_style(None, StyleBits::MATCH) {
            flags.fail(err.to_string());
            return (results, flags);
        }
        if results.matches.is_empty() {
            if flags.errors.is_empty() {
                flags.fail(EditError::EmptyResult.to_string());
            } else {
                let joined = flags.errors.join(" ");
                flags.fail(joined);
            }
            return (results, flags);
        }
        if let Err(err) = segment.set_style(&results.matches, StyleBits::MATCH) {
            flags.fail(err.to_string());
            return (results, flags);
        }
        flags.byte_style_changed = true;

        let mut index = results.matches.partition_point(|&m| m < (caret_index, 0));
        if index >= results.matches.len() {
            index = 0;
        }
        results.select(index, &mut flags);
        (results, flags)
    }

    /// Moves to the match after the caret, wrapping to the first.
    pub fn find_next(&mut self) -> StatusFlags {
        let mut flags = self.navigation_flags();
        if self.matches.is_empty() {
            flags.fail(EditError::EmptyResult.to_string());
            return flags;
        }
        let mut index = self.matches.partition_point(|&m| m <= (self.caret_index, 0));
        if Some(index) == self.current {
            index += 1;
        }
        if index >= self.matches.len() {
            index = 0;
        }
        self.select(index, &mut flags);
        flags
    }

    /// Moves to the match before the caret, wrapping to the last.
    pub fn find_prev(&mut self) -> StatusFlags {
        let mut flags = self.navigation_flags();
        if self.matches.is_empty() {
            flags.fail(EditError::EmptyResult.to_string());
            return flags;
        }
        let index = self.matches.partition_point(|&m| m < (self.caret_index, 0));
        let index = index.checked_sub(1).unwrap_or(self.matches.len() - 1);
        self.select(index, &mut flags);
        flags
    }

    fn navigation_flags(&self) -> StatusFlags {
        let mut flags = StatusFlags::new();
        flags.changed_document = false;
        flags.refresh_needed = true;
        flags
    }

    fn select(&mut self, index: usize, flags: &mut StatusFlags) {
        let (start, end) = self.matches[index];
        self.current = Some(index);
        self.caret_index = start;
        flags.index_range = Some((start, end));
        flags.caret_index = Some(start);
        flags.select_range = true;
        flags.add_message(format!(
            "Match {} of {}, found at ${:04x} in {}",
            index + 1,
            self.matches.len(),
            start + self.start_addr,
            self.names.get(&start).map(String::as_str).unwrap_or_default()
        ));
    }

    /// Moves the navigation origin after the caret moved elsewhere.
    pub fn set_caret_index(&mut self, index: usize) {
        if index != self.caret_index {
            self.caret_index = index;
            self.current = None;
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Sorted `(start, end)` matches.
    pub fn matches(&self) -> &[IndexRange] {
        &self.matches
    }

    /// Searcher names that produced the match starting at `start`.
    pub fn names_at(&self, start: usize) -> Option<&str> {
        self.names.get(&start).map(String::as_str)
    }

    /// Position of the selected match.
    pub fn current(&self) -> Option<usize> {
        self.current
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment() -> Segment {
        let mut data = vec![0u8; 32];
        data[4..7].copy_from_slice(b"ABC");
        data[20..23].copy_from_slice(b"abc");
        Segment::new(data, 0x1000, "test")
    }

    fn find(query: &str, factories: &[SearcherFactory], caret: usize) -> (SearchResults, StatusFlags) {
        SearchResults::find_all(&segment(), factories, query, caret, &SearchOptions::default())
    }

    #[test]
    fn test_hex_searcher() {
        let seg = segment();
        let searcher = HexSearcher::new("41 42").unwrap();
        assert_eq!(searcher.find(&seg), vec![(4, 6)]);
        assert!(HexSearcher::new("4").is_err());
        assert!(HexSearcher::new("zz").is_err());
    }

    #[test]
    fn test_text_case_folding() {
        let (results, flags) = find("abc", &[SearcherFactory::TEXT], 0);
        assert_eq!(results.matches(), &[(4, 7), (20, 23)]);
        assert_eq!(
            flags.message.as_deref(),
            Some("Match 1 of 2, found at $1004 in text")
        );
        let options = SearchOptions { case_sensitive_text: true };
        let (results, _) = SearchResults::find_all(&segment(), &[SearcherFactory::TEXT], "abc", 0, &options);
        assert_eq!(results.matches(), &[(20, 23)]);
    }

    #[test]
    fn test_starts_at_caret_and_wraps() {
        let (results, flags) = find("abc", &[SearcherFactory::TEXT], 10);
        assert_eq!(results.current(), Some(1));
        assert_eq!(flags.caret_index, Some(20));
        let (results, _) = find("abc", &[SearcherFactory::TEXT], 25);
        assert_eq!(results.current(), Some(0));
    }

    #[test]
    fn test_next_and_prev_wrap() {
        let (mut results, _) = find("abc", &[SearcherFactory::TEXT], 0);
        assert_eq!(results.find_next().caret_index, Some(20));
        assert_eq!(results.find_next().caret_index, Some(4));
        assert_eq!(results.find_prev().caret_index, Some(20));
        assert_eq!(results.find_prev().caret_index, Some(4));
    }

    #[test]
    fn test_not_found_and_errors() {
        let (results, flags) = find("xyz", &[SearcherFactory::TEXT], 0);
        assert!(results.is_empty());
        assert!(!flags.success);
        assert_eq!(flags.message.as_deref(), Some("Not found"));

        let (_, flags) = find("q", &[SearcherFactory::HEX, SearcherFactory::EXPRESSION], 0);
        assert!(!flags.success);
        assert_eq!(flags.errors.len(), 2);
        assert!(flags.message.unwrap().contains("Invalid hex string"));
    }

    #[test]
    fn test_errors_do_not_hide_matches() {
        let (results, flags) = find("ABC", &[SearcherFactory::HEX, SearcherFactory::TEXT], 0);
        assert!(flags.success);
        assert_eq!(results.len(), 2);
        assert_eq!(flags.errors.len(), 1);
    }

    #[test]
    fn test_match_style_bits() {
        let seg = segment();
        seg.set_style(&[(0, 2)], StyleBits::MATCH).unwrap();
        SearchResults::find_all(&seg, &[SearcherFactory::TEXT], "ABC", 0, &SearchOptions::default());
        assert_eq!(seg.get_style_ranges(StyleBits::MATCH), vec![(4, 7), (20, 23)]);
    }

    #[test]
    fn test_expression_and_comments() {
        let seg = segment();
        seg.set_comment(9, "Entry Point").unwrap();
        let (results, _) = SearchResults::find_all(
            &seg,
            &[SearcherFactory::COMMENTS, SearcherFactory::EXPRESSION],
            "b == $41",
            0,
            &SearchOptions::default(),
        );
        assert_eq!(results.matches(), &[(4, 5)]);
        assert_eq!(CommentSearcher::new("entry").unwrap().find(&seg), vec![(9, 10)]);

        let runs = ExpressionSearcher::new("(a >= $1004) and (a < $1006)").unwrap();
        assert_eq!(runs.find(&seg), vec![(4, 6)]);
    }

    #[test]
    fn test_by_names() {
        let factories = SearcherFactory::by_names(&["text", "bogus", "hex"]);
        let names: Vec<_> = factories.iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["text", "hex"]);
    }
}
