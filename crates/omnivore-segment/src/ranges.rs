//! Range and index utilities.
//!
//! ## Learning: Half-Open Ranges
//!
//! All ranges here are `(start, end)` with `end` exclusive, the same
//! convention as slices: `(4, 4)` is empty and `end - start` is the length.
//! Inputs may arrive with `start > end` (a selection dragged backwards);
//! every function treats those symmetrically.

use std::collections::BTreeSet;

/// A half-open `(start, end)` index range.
pub type IndexRange = (usize, usize);

/// Orders a range so that `start <= end`.
pub fn normalize(range: IndexRange) -> IndexRange {
    let (s, e) = range;
    if s > e { (e, s) } else { (s, e) }
}

/// Collapses possibly overlapping, unsorted ranges into a sorted list of
/// disjoint ranges covering the same indexes.
///
/// Ranges that touch (`next.start == current.end`) are merged as well.
pub fn collapse_overlapping_ranges(ranges: &[IndexRange]) -> Vec<IndexRange> {
    let mut sorted: Vec<IndexRange> = ranges.iter().copied().map(normalize).collect();
    sorted.sort_unstable();

    let mut collapsed: Vec<IndexRange> = Vec::with_capacity(sorted.len());
    for (start, end) in sorted {
        match collapsed.last_mut() {
            Some(last) if start <= last.1 => {
                if end > last.1 {
                    last.1 = end;
                }
            }
            _ => collapsed.push((start, end)),
        }
    }
    collapsed
}

/// Returns the complement of `ranges` within `[0, total)`.
pub fn invert_ranges(ranges: &[IndexRange], total: usize) -> Vec<IndexRange> {
    let mut inverted = Vec::new();
    let mut first = 0;
    for (start, end) in collapse_overlapping_ranges(ranges) {
        if start >= total {
            break;
        }
        if start > first {
            inverted.push((first, start));
        }
        first = end;
    }
    if first < total {
        inverted.push((first, total));
    }
    inverted
}

/// Expands ranges into the concatenation of their indexes, in input order.
pub fn ranges_to_indexes(ranges: &[IndexRange]) -> Vec<usize> {
    let count = ranges.iter().map(|&r| {
        let (s, e) = normalize(r);
        e - s
    });
    let mut indexes = Vec::with_capacity(count.sum());
    for &range in ranges {
        let (start, end) = normalize(range);
        indexes.extend(start..end);
    }
    indexes
}

/// Run-length compresses indexes into ranges.
///
/// The input is expected to be sorted; consecutive runs become one range.
pub fn indexes_to_ranges(indexes: &[usize]) -> Vec<IndexRange> {
    let mut ranges: Vec<IndexRange> = Vec::new();
    for &index in indexes {
        match ranges.last_mut() {
            Some(last) if last.1 == index => last.1 = index + 1,
            _ => ranges.push((index, index + 1)),
        }
    }
    ranges
}

/// Indexes covered by rectangular selections on a grid `row_width` wide.
///
/// Each range gives the top-left and bottom-right corners as linear
/// indexes; the result is sorted and unique.
pub fn rect_ranges_to_indexes(row_width: usize, ranges: &[IndexRange]) -> Vec<usize> {
    if row_width == 0 {
        return Vec::new();
    }
    let mut unique = BTreeSet::new();
    for &range in ranges {
        let (start, end) = normalize(range);
        if start == end {
            continue;
        }
        let last = end - 1;
        let (r1, c1) = (start / row_width, start % row_width);
        let (r2, c2) = (last / row_width, last % row_width);
        let (c1, c2) = if c2 < c1 { (c2, c1) } else { (c1, c2) };
        for row in r1..=r2 {
            for col in c1..=c2 {
                unique.insert(row * row_width + col);
            }
        }
    }
    unique.into_iter().collect()
}

/// A rectangle of grid cells, rows `r1..r2` by columns `c1..c2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridRect {
    pub r1: usize,
    pub c1: usize,
    pub r2: usize,
    pub c2: usize,
}

impl GridRect {
    pub fn new(r1: usize, c1: usize, r2: usize, c2: usize) -> Self {
        Self { r1, c1, r2, c2 }
    }

    /// True when cell `(row, col)` lies inside the rectangle.
    pub fn contains_cell(&self, row: usize, col: usize) -> bool {
        row >= self.r1 && row < self.r2 && col >= self.c1 && col < self.c2
    }
}

/// 2-D complement of `rects` within a `rows` x `cols` grid.
///
/// The grid is subdivided at every edge of every input rectangle; each
/// resulting cell block whose top-left corner lies outside all inputs is
/// emitted in row-major order.
pub fn invert_rects(rects: &[GridRect], rows: usize, cols: usize) -> Vec<GridRect> {
    let mut row_edges: BTreeSet<usize> = [0, rows].into_iter().collect();
    let mut col_edges: BTreeSet<usize> = [0, cols].into_iter().collect();
    for rect in rects {
        row_edges.insert(rect.r1.min(rows));
        row_edges.insert(rect.r2.min(rows));
        col_edges.insert(rect.c1.min(cols));
        col_edges.insert(rect.c2.min(cols));
    }
    let row_edges: Vec<usize> = row_edges.into_iter().collect();
    let col_edges: Vec<usize> = col_edges.into_iter().collect();

    let mut outside = Vec::new();
    for rows in row_edges.windows(2) {
        for cols in col_edges.windows(2) {
            let (r1, r2, c1, c2) = (rows[0], rows[1], cols[0], cols[1]);
            if !rects.iter().any(|rect| rect.contains_cell(r1, c1)) {
                outside.push(GridRect::new(r1, c1, r2, c2));
            }
        }
    }
    outside
}
