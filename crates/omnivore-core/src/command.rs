//! The command protocol.
//!
//! ## Learning: The Command Pattern
//!
//! Every document change is a value implementing [`Command`]. A command owns
//! everything it needs to redo *and* undo itself: its parameters, a clone of
//! the segment handle it targets, and typed undo state captured the first
//! time it runs. That is what lets the undo stack replay it indefinitely.
//!
//! ## Trait Objects vs Enums
//!
//! Byte transforms that only differ in their per-byte function share one
//! struct driven by an enum (`ByteOp`). Commands with different undo state
//! (paste, comments, labels) get their own structs, and the undo stack stores
//! them all as `Box<dyn Command>`.

use std::any::Any;
use std::fmt;

use crate::flags::StatusFlags;
use crate::{EditError, EditResult};

/// Kind of a serialized command field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Segment,
    Int,
    IntList,
    Ranges,
    Bytes,
    Text,
    Bool,
    Clipboard,
    Value,
}

/// Result of performing or undoing a command.
#[derive(Debug, Clone, Default)]
pub struct UndoInfo {
    pub flags: StatusFlags,
}

impl UndoInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn success(&self) -> bool {
        self.flags.success
    }

    fn fail(&mut self, err: EditError) {
        tracing::debug!("command failed: {}", err);
        self.flags.errors.push(err.to_string());
        self.flags.fail(err.to_string());
    }
}

/// A reversible change to a document.
///
/// Implementors provide `do_change` and `undo_change`; the provided
/// `perform` and `undo` wrap them so that errors turn into flags.
pub trait Command: fmt::Debug {
    /// Stable identifier used in serialized command streams.
    fn short_name(&self) -> &'static str;

    /// Human readable name for menus and the undo history.
    fn ui_name(&self) -> &'static str;

    /// Names and kinds of the fields that identify this command.
    fn serialize_order(&self) -> &'static [(&'static str, FieldKind)] {
        &[]
    }

    /// One line description, e.g. `Change Bytes @ 0410-0414`.
    fn describe(&self) -> String {
        self.ui_name().to_string()
    }

    /// Declares the expected effects before the change runs.
    fn set_undo_flags(&self, _flags: &mut StatusFlags) {}

    /// Applies the change, capturing whatever is needed to undo it.
    fn do_change(&mut self, flags: &mut StatusFlags) -> EditResult<()>;

    /// Reverts the change made by the last `do_change`.
    fn undo_change(&mut self, flags: &mut StatusFlags) -> EditResult<()>;

    /// True if `next` can be folded into this command. Only called when both
    /// commands have the same concrete type.
    fn can_coalesce(&self, _next: &dyn Command) -> bool {
        false
    }

    /// Folds `next` into this command so that one undo reverts both.
    fn coalesce_merge(&mut self, _next: &dyn Command) {}

    /// False for commands that should run but never enter the undo stack.
    fn is_recordable(&self) -> bool {
        true
    }

    fn as_any(&self) -> &dyn Any;

    /// Runs the command and reports what changed.
    fn perform(&mut self) -> UndoInfo {
        let mut info = UndoInfo::new();
        self.set_undo_flags(&mut info.flags);
        if let Err(err) = self.do_change(&mut info.flags) {
            info.fail(err);
        }
        info
    }

    /// Reverts the command and reports what changed.
    fn undo(&mut self) -> UndoInfo {
        let mut info = UndoInfo::new();
        self.set_undo_flags(&mut info.flags);
        if let Err(err) = self.undo_change(&mut info.flags) {
            info.fail(err);
        }
        info
    }
}

/// Several commands recorded as one undo step.
///
/// Children are performed in order and undone in reverse.
#[derive(Debug, Default)]
pub struct Batch {
    commands: Vec<Box<dyn Command>>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an already performed command.
    pub fn push(&mut self, command: Box<dyn Command>) {
        self.commands.push(command);
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn commands(&self) -> &[Box<dyn Command>] {
        &self.commands
    }
}

impl Command for Batch {
    fn short_name(&self) -> &'static str {
        "batch"
    }

    fn ui_name(&self) -> &'static str {
        "<batch>"
    }

    fn describe(&self) -> String {
        match self.commands.as_slice() {
            [only] => only.describe(),
            commands => format!("{} ({} commands)", self.ui_name(), commands.len()),
        }
    }

    fn do_change(&mut self, flags: &mut StatusFlags) -> EditResult<()> {
        for i in 0..self.commands.len() {
            let info = self.commands[i].perform();
            flags.add_flags(&info.flags);
            if !info.success() {
                // Roll back what already ran so the batch stays atomic.
                for command in self.commands[..i].iter_mut().rev() {
                    command.undo();
                }
                return Ok(());
            }
        }
        Ok(())
    }

    fn undo_change(&mut self, flags: &mut StatusFlags) -> EditResult<()> {
        for command in self.commands.iter_mut().rev() {
            let info = command.undo();
            flags.add_flags(&info.flags);
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Appends its tag to a shared log on perform and removes it on undo.
    #[derive(Debug)]
    struct Push {
        log: Rc<RefCell<Vec<char>>>,
        tag: char,
        fail: bool,
    }

    impl Command for Push {
        fn short_name(&self) -> &'static str {
            "push"
        }

        fn ui_name(&self) -> &'static str {
            "Push"
        }

        fn do_change(&mut self, _flags: &mut StatusFlags) -> EditResult<()> {
            if self.fail {
                return Err(EditError::EmptyResult);
            }
            self.log.borrow_mut().push(self.tag);
            Ok(())
        }

        fn undo_change(&mut self, _flags: &mut StatusFlags) -> EditResult<()> {
            self.log.borrow_mut().pop();
            Ok(())
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn push(log: &Rc<RefCell<Vec<char>>>, tag: char, fail: bool) -> Box<dyn Command> {
        Box::new(Push {
            log: log.clone(),
            tag,
            fail,
        })
    }

    #[test]
    fn test_perform_converts_errors_to_flags() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut cmd = push(&log, 'a', true);
        let info = cmd.perform();
        assert!(!info.success());
        assert_eq!(info.flags.message.as_deref(), Some("Not found"));
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_batch_undoes_in_reverse() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut batch = Batch::new();
        batch.push(push(&log, 'a', false));
        batch.push(push(&log, 'b', false));

        assert!(batch.perform().success());
        assert_eq!(*log.borrow(), vec!['a', 'b']);
        assert!(batch.undo().success());
        assert!(log.borrow().is_empty());
        assert_eq!(batch.describe(), "<batch> (2 commands)");
    }

    #[test]
    fn test_batch_rolls_back_on_failure() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut batch = Batch::new();
        batch.push(push(&log, 'a', false));
        batch.push(push(&log, 'b', true));
        let info = batch.perform();
        assert!(!info.success());
        assert!(log.borrow().is_empty());
    }
}
