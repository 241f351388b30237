//! Multi-caret and selection engine.
//!
//! Caret indexes name positions *between* bytes: 0 is before the first byte
//! and `len` is after the last one. A selection is the span between two
//! anchors, so `(4, 8)` selects bytes 4 through 7.
//!
//! ## Learning: Initial Anchors
//!
//! Each caret remembers where a selection *started* (`anchor_initial_*`)
//! separately from where it currently is. Extending a selection pivots
//! around the initial anchors, which lets a drag cross back over its
//! starting point without losing the originally selected block.

use serde::{Deserialize, Serialize};

use crate::history::HistoryList;
use crate::ranges::{IndexRange, collapse_overlapping_ranges, invert_ranges, ranges_to_indexes};

/// An insertion point plus an optional selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Caret {
    pub index: usize,
    pub anchor_start: usize,
    pub anchor_initial_start: usize,
    pub anchor_end: usize,
    pub anchor_initial_end: usize,
}

impl Caret {
    /// A caret at `index` with no selection.
    pub fn new(index: usize) -> Self {
        Self {
            index,
            anchor_start: index,
            anchor_initial_start: index,
            anchor_end: index,
            anchor_initial_end: index,
        }
    }

    /// A caret whose selection covers `range`; the caret sits at its end.
    pub fn with_selection(range: IndexRange) -> Self {
        let mut caret = Self::new(range.1);
        caret.set_initial_selection(range.0, range.1);
        caret
    }

    pub fn has_selection(&self) -> bool {
        self.anchor_start != self.anchor_end
    }

    /// Selected span with `start <= end`.
    pub fn range(&self) -> IndexRange {
        let (s, e) = (self.anchor_start, self.anchor_end);
        if s > e { (e, s) } else { (s, e) }
    }

    /// Moves the caret and drops any selection.
    pub fn set(&mut self, index: usize) {
        self.index = index;
        self.clear_selection();
    }

    pub fn clear_selection(&mut self) {
        self.anchor_start = self.index;
        self.anchor_initial_start = self.index;
        self.anchor_end = self.index;
        self.anchor_initial_end = self.index;
    }

    /// Sets both current and initial anchors.
    pub fn set_initial_selection(&mut self, start: usize, end: usize) {
        self.anchor_start = start;
        self.anchor_initial_start = start;
        self.anchor_end = end;
        self.anchor_initial_end = end;
    }

    /// Sets the current anchors only.
    pub fn set_selection(&mut self, start: usize, end: usize) {
        self.anchor_start = start;
        self.anchor_end = end;
    }

    /// Moves the free end of the selection to `index`, pivoting on the
    /// initial anchors.
    pub fn extend_to(&mut self, index: usize) {
        let (initial_start, initial_end) = if self.anchor_initial_start <= self.anchor_initial_end {
            (self.anchor_initial_start, self.anchor_initial_end)
        } else {
            (self.anchor_initial_end, self.anchor_initial_start)
        };
        self.index = index;
        if index >= initial_end {
            self.anchor_start = initial_start;
            self.anchor_end = index;
        } else if index <= initial_start {
            self.anchor_start = index;
            self.anchor_end = initial_end;
        } else {
            self.anchor_start = initial_start;
            self.anchor_end = initial_end;
        }
    }

    /// True if this caret has a selection that wholly covers `other`.
    pub fn contains(&self, other: &Caret) -> bool {
        if !self.has_selection() {
            return false;
        }
        let (s, e) = self.range();
        let (os, oe) = other.range();
        os >= s && oe <= e
    }

    /// True if the two spans touch or overlap.
    pub fn intersects(&self, other: &Caret) -> bool {
        let (s, e) = self.range();
        let (os, oe) = other.range();
        !(os > e || oe < s)
    }

    /// Grows this caret's selection to cover `other` as well.
    pub fn merge(&mut self, other: &Caret) {
        let (s, e) = self.range();
        let (os, oe) = other.range();
        if os < s {
            self.anchor_start = os;
            self.anchor_initial_start = os;
            self.index = self.index.min(other.index);
        } else {
            self.anchor_start = s;
        }
        if oe > e {
            self.anchor_end = oe;
            self.anchor_initial_end = oe;
            self.index = self.index.max(other.index);
        } else {
            self.anchor_end = e;
        }
    }
}

/// Ordered carets over a document of known length; the last one is current.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaretList {
    carets: Vec<Caret>,
    document_length: usize,
}

impl CaretList {
    /// A single caret at 0.
    pub fn new(document_length: usize) -> Self {
        Self {
            carets: vec![Caret::new(0)],
            document_length,
        }
    }

    pub fn document_length(&self) -> usize {
        self.document_length
    }

    /// Changes the document length and clamps every caret into it.
    pub fn set_document_length(&mut self, length: usize) {
        self.document_length = length;
        for caret in &mut self.carets {
            caret.index = caret.index.min(length);
            caret.anchor_start = caret.anchor_start.min(length);
            caret.anchor_end = caret.anchor_end.min(length);
            caret.anchor_initial_start = caret.anchor_initial_start.min(length);
            caret.anchor_initial_end = caret.anchor_initial_end.min(length);
        }
        self.collapse_overlapping();
    }

    fn clamp(&self, index: isize) -> usize {
        index.clamp(0, self.document_length as isize) as usize
    }

    pub fn len(&self) -> usize {
        self.carets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.carets.is_empty()
    }

    pub fn carets(&self) -> &[Caret] {
        &self.carets
    }

    pub fn iter(&self) -> impl Iterator<Item = &Caret> {
        self.carets.iter()
    }

    /// The most recently added caret.
    pub fn current(&self) -> Caret {
        self.carets.last().copied().unwrap_or_default()
    }

    fn current_mut(&mut self) -> &mut Caret {
        if self.carets.is_empty() {
            self.carets.push(Caret::new(0));
        }
        let last = self.carets.len() - 1;
        &mut self.carets[last]
    }

    /// Caret indexes in list order.
    pub fn indexes(&self) -> Vec<usize> {
        self.carets.iter().map(|c| c.index).collect()
    }

    pub fn has_selection(&self) -> bool {
        self.carets.iter().any(Caret::has_selection)
    }

    /// Selected spans of every caret that has one, in list order.
    pub fn selected_ranges(&self) -> Vec<IndexRange> {
        self.carets
            .iter()
            .filter(|c| c.has_selection())
            .map(Caret::range)
            .collect()
    }

    /// Disjoint selected ranges plus the indexes they cover.
    pub fn selected_ranges_and_indexes(&self) -> (Vec<IndexRange>, Vec<usize>) {
        let ranges = collapse_overlapping_ranges(&self.selected_ranges());
        let indexes = ranges_to_indexes(&ranges);
        (ranges, indexes)
    }

    // ==================== Movement ====================

    /// Replaces all carets with one at `index`, clamped to the document.
    pub fn set_caret(&mut self, index: usize) -> usize {
        let index = index.min(self.document_length);
        self.carets = vec![Caret::new(index)];
        index
    }

    /// Appends a caret without touching the others.
    pub fn add_caret(&mut self, index: usize) {
        let index = index.min(self.document_length);
        self.carets.push(Caret::new(index));
    }

    /// Shifts every caret by `delta`, clamps, clears selections and drops
    /// duplicates.
    pub fn move_carets(&mut self, delta: isize) {
        for i in 0..self.carets.len() {
            let moved = self.clamp(self.carets[i].index as isize + delta);
            self.carets[i].set(moved);
        }
        self.remove_duplicates();
    }

    /// Collapses all carets into one at `index`.
    pub fn move_carets_to(&mut self, index: usize) {
        self.set_caret(index);
    }

    /// Applies `f` to every caret index, then clamps and clears selections.
    pub fn move_carets_with<F>(&mut self, mut f: F)
    where
        F: FnMut(usize) -> isize,
    {
        for i in 0..self.carets.len() {
            let moved = self.clamp(f(self.carets[i].index));
            self.carets[i].set(moved);
        }
        self.remove_duplicates();
    }

    fn remove_duplicates(&mut self) {
        // Keep the latest occurrence so the current caret survives.
        let mut seen = std::collections::HashSet::new();
        let mut kept: Vec<Caret> = Vec::with_capacity(self.carets.len());
        for caret in self.carets.iter().rev() {
            if caret.has_selection() || seen.insert(caret.index) {
                kept.push(*caret);
            }
        }
        kept.reverse();
        self.carets = kept;
    }

    // ==================== Selection ====================

    /// Selects `start..end` on the current caret; the caret moves to `end`.
    pub fn set_selection(&mut self, start: usize, end: usize) {
        let len = self.document_length;
        let (start, end) = (start.min(len), end.min(len));
        let caret = self.current_mut();
        caret.index = end;
        caret.set_initial_selection(start, end);
    }

    /// Extends the current caret's selection to `index`.
    pub fn extend_selection(&mut self, index: usize) {
        let index = index.min(self.document_length);
        self.current_mut().extend_to(index);
        self.collapse_overlapping();
    }

    /// Drops every selection, keeping only the current caret.
    pub fn select_none(&mut self) {
        let mut caret = self.current();
        caret.clear_selection();
        self.carets = vec![caret];
    }

    pub fn select_all(&mut self) {
        self.carets = vec![Caret::with_selection((0, self.document_length))];
    }

    /// One caret per range; the last range becomes current.
    pub fn select_ranges(&mut self, ranges: &[IndexRange]) {
        let len = self.document_length;
        self.carets = ranges
            .iter()
            .map(|&(s, e)| Caret::with_selection((s.min(len), e.min(len))))
            .collect();
        if self.carets.is_empty() {
            self.carets.push(Caret::new(0));
        }
    }

    /// Selects everything that is not currently selected.
    pub fn invert_selection(&mut self) {
        let inverted = invert_ranges(&self.selected_ranges(), self.document_length);
        self.select_ranges(&inverted);
    }

    /// Merges the current caret with any caret it overlaps.
    ///
    /// With a selection, carets it contains are dropped and carets it
    /// intersects are merged into it. Without one, duplicate plain carets
    /// at the same index are dropped, and a selection enclosing the current
    /// caret becomes current instead.
    pub fn collapse_overlapping(&mut self) {
        let Some(mut current) = self.carets.pop() else {
            return;
        };
        let mut collapsed = Vec::with_capacity(self.carets.len() + 1);
        if current.has_selection() {
            for caret in self.carets.drain(..) {
                if current.contains(&caret) {
                    continue;
                } else if current.intersects(&caret) {
                    current.merge(&caret);
                } else {
                    collapsed.push(caret);
                }
            }
        } else {
            let mut absorbed = false;
            for caret in self.carets.drain(..) {
                if absorbed {
                    collapsed.push(caret);
                } else if !caret.has_selection() && caret.index == current.index {
                    continue;
                } else if caret.contains(&current) {
                    current = caret;
                    absorbed = true;
                } else {
                    collapsed.push(caret);
                }
            }
        }
        collapsed.push(current);
        tracing::trace!("collapsed to {} carets", collapsed.len());
        self.carets = collapsed;
    }

    // ==================== Snapshots ====================

    pub fn state(&self) -> Vec<Caret> {
        self.carets.clone()
    }

    /// Replaces the carets with a snapshot, clamped to the document.
    pub fn restore(&mut self, state: &[Caret]) {
        self.carets = if state.is_empty() {
            vec![Caret::new(0)]
        } else {
            state.to_vec()
        };
        let len = self.document_length;
        self.set_document_length(len);
    }
}

/// Bounded history of caret snapshots, separate from command undo.
#[derive(Debug, Clone)]
pub struct CaretHistory {
    list: HistoryList<Vec<Caret>>,
}

impl CaretHistory {
    pub fn new(limit: usize) -> Self {
        Self {
            list: HistoryList::with_capacity(limit),
        }
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Records `carets` unless it matches the entry on either side of the
    /// cursor.
    ///
    /// After an undo the cursor rests on the restored entry; recording from
    /// there keeps that entry and drops the ones after it.
    pub fn update(&mut self, carets: &CaretList) {
        let state = carets.state();
        if self.list.undo_entry() == Some(&state) || self.list.redo_entry() == Some(&state) {
            return;
        }
        if self.list.can_redo() {
            self.list.step_forward();
        }
        self.list.add(state);
    }

    /// Steps back to the previous position, restoring it into `carets`.
    ///
    /// At the end of the list the last entry is the current position, so
    /// it is skipped.
    pub fn undo(&mut self, carets: &mut CaretList) -> bool {
        if !self.list.can_redo() {
            self.list.step_back();
        }
        match self.list.prev() {
            Some(state) => {
                carets.restore(state);
                true
            }
            None => false,
        }
    }

    /// Steps forward to the next position, restoring it into `carets`.
    pub fn redo(&mut self, carets: &mut CaretList) -> bool {
        if self.list.insert_index() + 1 >= self.list.len() {
            return false;
        }
        self.list.step_forward();
        match self.list.redo_entry() {
            Some(state) => {
                carets.restore(state);
                true
            }
            None => false,
        }
    }
}
