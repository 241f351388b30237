//! A list with an insertion cursor, used for both command undo and caret
//! history.
//!
//! ## Learning: One Vec Instead of Two Stacks
//!
//! Undo/redo is often written as two stacks. Here a single `Vec` plus an
//! `insert_index` does the same job: everything before the index can be
//! undone, everything at or after it can be redone. Adding a new entry
//! truncates the redo tail first, so branching history is never kept.

use std::collections::VecDeque;

/// Ordered entries with an insertion cursor and an optional save point.
#[derive(Debug, Clone)]
pub struct HistoryList<T> {
    entries: VecDeque<T>,
    insert_index: usize,
    save_point: Option<usize>,
    capacity: Option<usize>,
}

impl<T> Default for HistoryList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> HistoryList<T> {
    /// Creates an unbounded history.
    pub fn new() -> Self {
        Self {
            entries: VecDeque::new(),
            insert_index: 0,
            save_point: Some(0),
            capacity: None,
        }
    }

    /// Creates a history that keeps at most `capacity` entries.
    ///
    /// A capacity of zero means unbounded.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: (capacity > 0).then_some(capacity),
            ..Self::new()
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Position where the next entry will be added.
    pub fn insert_index(&self) -> usize {
        self.insert_index
    }

    pub fn can_undo(&self) -> bool {
        self.insert_index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.insert_index < self.entries.len()
    }

    /// True when the cursor is away from the save point, or the save point
    /// was dropped off the front of a bounded history.
    pub fn is_dirty(&self) -> bool {
        self.save_point != Some(self.insert_index)
    }

    pub fn set_save_point(&mut self) {
        self.save_point = Some(self.insert_index);
    }

    /// Entry that `prev` would return.
    pub fn undo_entry(&self) -> Option<&T> {
        self.insert_index.checked_sub(1).and_then(|i| self.entries.get(i))
    }

    pub fn undo_entry_mut(&mut self) -> Option<&mut T> {
        match self.insert_index.checked_sub(1) {
            Some(i) => self.entries.get_mut(i),
            None => None,
        }
    }

    /// Entry that `next` would return.
    pub fn redo_entry(&self) -> Option<&T> {
        self.entries.get(self.insert_index)
    }

    pub fn redo_entry_mut(&mut self) -> Option<&mut T> {
        self.entries.get_mut(self.insert_index)
    }

    /// Adds an entry at the cursor, discarding anything that could have been
    /// redone.
    pub fn add(&mut self, entry: T) {
        self.entries.truncate(self.insert_index);
        if let Some(save) = self.save_point {
            if save > self.insert_index {
                self.save_point = None;
            }
        }
        self.entries.push_back(entry);
        self.insert_index += 1;

        if let Some(capacity) = self.capacity {
            while self.entries.len() > capacity {
                self.entries.pop_front();
                self.insert_index -= 1;
                self.save_point = match self.save_point {
                    Some(0) | None => None,
                    Some(save) => Some(save - 1),
                };
            }
        }
    }

    /// Moves the cursor back one entry and returns it.
    pub fn prev(&mut self) -> Option<&T> {
        if self.insert_index == 0 {
            return None;
        }
        self.insert_index -= 1;
        self.entries.get(self.insert_index)
    }

    /// Moves the cursor forward one entry and returns it.
    pub fn next(&mut self) -> Option<&T> {
        if self.insert_index >= self.entries.len() {
            return None;
        }
        self.insert_index += 1;
        self.entries.get(self.insert_index - 1)
    }

    /// Steps the cursor back without returning anything.
    pub fn step_back(&mut self) -> bool {
        self.prev().is_some()
    }

    /// Steps the cursor forward without returning anything.
    pub fn step_forward(&mut self) -> bool {
        self.next().is_some()
    }

    /// Removes the entry just before the cursor without undoing it.
    pub fn pop(&mut self) -> Option<T> {
        if self.insert_index == 0 {
            return None;
        }
        self.insert_index -= 1;
        let entry = self.entries.remove(self.insert_index);
        self.entries.truncate(self.insert_index);
        entry
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> {
        self.entries.iter()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.insert_index = 0;
        self.save_point = Some(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_truncates_redo_tail() {
        let mut history = HistoryList::new();
        history.add('a');
        history.add('b');
        history.add('c');
        assert_eq!(history.prev(), Some(&'c'));
        assert_eq!(history.prev(), Some(&'b'));
        history.add('x');
        assert_eq!(history.iter().copied().collect::<String>(), "ax");
        assert!(!history.can_redo());
    }

    #[test]
    fn test_save_point_tracking() {
        let mut history = HistoryList::new();
        assert!(!history.is_dirty());
        history.add(1);
        assert!(history.is_dirty());
        history.set_save_point();
        assert!(!history.is_dirty());
        history.prev();
        assert!(history.is_dirty());
        history.next();
        assert!(!history.is_dirty());

        // Branching away from the save point makes it unreachable.
        history.prev();
        history.add(2);
        history.prev();
        history.next();
        assert!(history.is_dirty());
    }

    #[test]
    fn test_bounded_capacity_drops_oldest() {
        let mut history = HistoryList::with_capacity(2);
        history.set_save_point();
        for i in 0..4 {
            history.add(i);
        }
        assert_eq!(history.iter().copied().collect::<Vec<_>>(), vec![2, 3]);
        assert_eq!(history.insert_index(), 2);
        history.prev();
        history.prev();
        assert!(history.is_dirty());
    }

    #[test]
    fn test_pop_removes_without_redo() {
        let mut history = HistoryList::new();
        history.add(1);
        history.add(2);
        assert_eq!(history.pop(), Some(2));
        assert_eq!(history.undo_entry(), Some(&1));
        assert!(!history.can_redo());
        history.prev();
        assert_eq!(history.pop(), None);
    }
}
