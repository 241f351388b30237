//! Undo/redo stack with coalescing, batching and a save point.
//!
//! ## Learning: Type-Checked Coalescing
//!
//! Two commands may only merge if they are the same concrete type. With
//! `Box<dyn Command>` the static type is gone, so the stack compares
//! `TypeId`s obtained through `as_any()` before asking the older command
//! whether it wants to absorb the newer one.

use std::time::{Duration, Instant};

use omnivore_segment::HistoryList;

use crate::command::{Batch, Command, UndoInfo};

/// Coarse state of the stack relative to the last save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UndoState {
    Clean,
    Dirty,
    BatchInProgress,
}

#[derive(Debug)]
struct Entry {
    command: Box<dyn Command>,
    recorded_at: Instant,
}

/// Ordered, bounded history of performed commands.
#[derive(Debug)]
pub struct UndoStack {
    history: HistoryList<Entry>,
    batch: Option<Batch>,
    coalesce_window: Option<Duration>,
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new()
    }
}

impl UndoStack {
    /// Unbounded stack with no coalescing time limit.
    pub fn new() -> Self {
        Self {
            history: HistoryList::new(),
            batch: None,
            coalesce_window: None,
        }
    }

    /// Stack keeping at most `undo_limit` entries (0 = unbounded) that only
    /// coalesces commands recorded within `coalesce_window_ms` (0 = always).
    pub fn with_limits(undo_limit: usize, coalesce_window_ms: u64) -> Self {
        Self {
            history: HistoryList::with_capacity(undo_limit),
            batch: None,
            coalesce_window: (coalesce_window_ms > 0)
                .then(|| Duration::from_millis(coalesce_window_ms)),
        }
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn is_dirty(&self) -> bool {
        self.history.is_dirty()
    }

    pub fn set_save_point(&mut self) {
        self.history.set_save_point();
    }

    pub fn state(&self) -> UndoState {
        if self.batch.is_some() {
            UndoState::BatchInProgress
        } else if self.is_dirty() {
            UndoState::Dirty
        } else {
            UndoState::Clean
        }
    }

    // ==================== Perform / Undo / Redo ====================

    /// Performs `command` and records it if it changed the document.
    pub fn perform(&mut self, mut command: Box<dyn Command>) -> UndoInfo {
        let info = command.perform();
        tracing::debug!(
            "perform {}: success={} changed={}",
            command.describe(),
            info.success(),
            info.flags.changed_document
        );
        if info.flags.changed_document && info.success() {
            match self.batch.as_mut() {
                Some(batch) => batch.push(command),
                None => self.add_command(command),
            }
        }
        info
    }

    /// Undoes the command before the cursor; the cursor only moves on success.
    pub fn undo(&mut self) -> UndoInfo {
        let Some(entry) = self.history.undo_entry_mut() else {
            let mut info = UndoInfo::new();
            info.flags.changed_document = false;
            info.flags.fail("Nothing to undo");
            return info;
        };
        let info = entry.command.undo();
        tracing::debug!("undo {}: success={}", entry.command.describe(), info.success());
        if info.success() {
            self.history.step_back();
        }
        info
    }

    /// Re-performs the command at the cursor; the cursor only moves on success.
    pub fn redo(&mut self) -> UndoInfo {
        let Some(entry) = self.history.redo_entry_mut() else {
            let mut info = UndoInfo::new();
            info.flags.changed_document = false;
            info.flags.fail("Nothing to redo");
            return info;
        };
        let info = entry.command.perform();
        tracing::debug!("redo {}: success={}", entry.command.describe(), info.success());
        if info.success() {
            self.history.step_forward();
        }
        info
    }

    fn add_command(&mut self, command: Box<dyn Command>) {
        let now = Instant::now();
        let window = self.coalesce_window;
        if let Some(last) = self.history.undo_entry_mut() {
            let in_window = window.is_none_or(|w| now.duration_since(last.recorded_at) <= w);
            let same_type = last.command.as_any().type_id() == command.as_any().type_id();
            if in_window && same_type && last.command.can_coalesce(command.as_ref()) {
                last.command.coalesce_merge(command.as_ref());
                last.recorded_at = now;
                tracing::debug!("coalesced into {}", last.command.describe());
                return;
            }
        }
        if command.is_recordable() {
            self.history.add(Entry {
                command,
                recorded_at: now,
            });
        }
    }

    // ==================== Batches ====================

    /// Starts collecting performed commands into one undo step.
    ///
    /// Starting a batch while one is open closes the open one first.
    pub fn start_batch(&mut self) {
        self.end_batch();
        tracing::debug!("starting batch");
        self.batch = Some(Batch::new());
    }

    /// Records the open batch as a single entry, if it has any commands.
    pub fn end_batch(&mut self) {
        if let Some(batch) = self.batch.take() {
            tracing::debug!("ending batch of {} commands", batch.len());
            if !batch.is_empty() {
                self.add_command(Box::new(batch));
            }
        }
    }

    pub fn in_batch(&self) -> bool {
        self.batch.is_some()
    }

    // ==================== Inspection ====================

    /// Descriptions of every entry, oldest first.
    pub fn history(&self) -> Vec<String> {
        self.history.iter().map(|e| e.command.describe()).collect()
    }

    /// Description of the command `undo` would revert.
    pub fn undo_description(&self) -> Option<String> {
        self.history.undo_entry().map(|e| e.command.describe())
    }

    /// Description of the command `redo` would re-apply.
    pub fn redo_description(&self) -> Option<String> {
        self.history.redo_entry().map(|e| e.command.describe())
    }

    /// Drops the most recent entry without undoing it.
    pub fn pop_command(&mut self) -> Option<Box<dyn Command>> {
        self.history.pop().map(|e| e.command)
    }

    /// Most recent entry with the given short name.
    pub fn find_most_recent(&self, short_name: &str) -> Option<&dyn Command> {
        self.history
            .iter()
            .rev()
            .map(|e| e.command.as_ref())
            .find(|c| c.short_name() == short_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{ByteOp, ChangeBytes, TransformRanges};
    use omnivore_segment::Segment;

    fn counting(len: usize) -> Segment {
        Segment::new((0..len).map(|i| i as u8).collect(), 0, "test")
    }

    #[test]
    fn test_undo_redo_moves_cursor() {
        let seg = counting(16);
        let mut stack = UndoStack::new();
        stack.perform(Box::new(TransformRanges::new(&seg, vec![(0, 4)], ByteOp::Zero)));
        assert_eq!(seg.read(0, 4).unwrap(), vec![0, 0, 0, 0]);
        assert!(stack.undo().success());
        assert_eq!(seg.read(0, 4).unwrap(), vec![0, 1, 2, 3]);
        assert!(!stack.undo().success());
        assert!(stack.redo().success());
        assert_eq!(seg.read(0, 4).unwrap(), vec![0, 0, 0, 0]);
        assert!(!stack.redo().success());
    }

    #[test]
    fn test_save_point() {
        let seg = counting(16);
        let mut stack = UndoStack::new();
        assert_eq!(stack.state(), UndoState::Clean);
        stack.perform(Box::new(TransformRanges::new(&seg, vec![(0, 4)], ByteOp::Ff)));
        assert_eq!(stack.state(), UndoState::Dirty);
        stack.set_save_point();
        assert!(!stack.is_dirty());
        stack.undo();
        assert!(stack.is_dirty());
        stack.redo();
        assert!(!stack.is_dirty());
    }

    #[test]
    fn test_failed_command_is_not_recorded() {
        let seg = counting(16);
        let mut stack = UndoStack::new();
        let info = stack.perform(Box::new(TransformRanges::new(&seg, vec![(10, 40)], ByteOp::Zero)));
        assert!(!info.success());
        assert!(stack.is_empty());
        assert_eq!(seg.to_vec(), counting(16).to_vec());
    }

    #[test]
    fn test_coalescing_keeps_one_entry() {
        let seg = counting(16);
        let mut stack = UndoStack::new();
        stack.perform(Box::new(ChangeBytes::coalescing(&seg, 3, 4, vec![0xa0])));
        stack.perform(Box::new(ChangeBytes::coalescing(&seg, 3, 4, vec![0xab])));
        assert_eq!(stack.len(), 1);
        assert_eq!(seg.byte(3).unwrap(), 0xab);
        stack.undo();
        assert_eq!(seg.byte(3).unwrap(), 3);
        stack.redo();
        assert_eq!(seg.byte(3).unwrap(), 0xab);
    }

    #[test]
    fn test_plain_change_bytes_do_not_coalesce() {
        let seg = counting(16);
        let mut stack = UndoStack::new();
        stack.perform(Box::new(ChangeBytes::new(&seg, 3, 4, vec![1])));
        stack.perform(Box::new(ChangeBytes::new(&seg, 3, 4, vec![2])));
        assert_eq!(stack.len(), 2);
    }

    #[test]
    fn test_batch_is_one_undo_step() {
        let seg = counting(16);
        let mut stack = UndoStack::new();
        stack.start_batch();
        assert_eq!(stack.state(), UndoState::BatchInProgress);
        stack.perform(Box::new(TransformRanges::new(&seg, vec![(0, 2)], ByteOp::Ff)));
        stack.perform(Box::new(TransformRanges::new(&seg, vec![(1, 3)], ByteOp::BitwiseNot)));
        stack.end_batch();
        assert_eq!(stack.len(), 1);
        assert_eq!(seg.read(0, 3).unwrap(), vec![0xff, 0x00, 0xfd]);
        stack.undo();
        assert_eq!(seg.read(0, 3).unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_bounded_depth() {
        let seg = counting(16);
        let mut stack = UndoStack::with_limits(2, 0);
        for i in 0..4 {
            stack.perform(Box::new(TransformRanges::new(&seg, vec![(i, i + 1)], ByteOp::Zero)));
        }
        assert_eq!(stack.len(), 2);
        assert!(stack.undo().success());
        assert!(stack.undo().success());
        assert!(!stack.undo().success());
        assert!(stack.is_dirty());
    }

    #[test]
    fn test_history_and_lookup() {
        let seg = counting(16);
        let mut stack = UndoStack::new();
        stack.perform(Box::new(TransformRanges::new(&seg, vec![(0, 2)], ByteOp::Zero)));
        stack.perform(Box::new(ChangeBytes::new(&seg, 4, 6, vec![1, 2])));
        assert_eq!(stack.history(), vec!["Zero Bytes", "Change Bytes @ 0004-0006"]);
        assert!(stack.find_most_recent("zero").is_some());
        assert!(stack.find_most_recent("xor_value").is_none());
        let popped = stack.pop_command().unwrap();
        assert_eq!(popped.short_name(), "cb");
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn test_find_most_recent_prefers_latest() {
        let seg = counting(16);
        let mut stack = UndoStack::new();
        stack.perform(Box::new(ChangeBytes::new(&seg, 4, 6, vec![1, 2])));
        stack.perform(Box::new(TransformRanges::new(&seg, vec![(0, 2)], ByteOp::Zero)));
        stack.perform(Box::new(ChangeBytes::new(&seg, 8, 10, vec![3, 4])));
        let found = stack.find_most_recent("cb").unwrap();
        assert_eq!(found.describe(), "Change Bytes @ 0008-000a");
    }
}
