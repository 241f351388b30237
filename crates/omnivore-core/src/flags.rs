//! Status flags returned by every command.
//!
//! Commands never call back into the UI. They fill in a `StatusFlags` value
//! and the host decides what to redraw, where to move the caret, and which
//! message to show.

use omnivore_segment::{Caret, IndexRange};

/// What a command changed, plus hints for the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusFlags {
    /// Cleared when the command failed.
    pub success: bool,
    /// Cleared by commands that should not be recorded on the undo stack.
    pub changed_document: bool,
    /// Text for the status line.
    pub message: Option<String>,
    /// Detailed errors, one per line.
    pub errors: Vec<String>,

    pub byte_values_changed: bool,
    pub byte_style_changed: bool,
    pub data_model_changed: bool,
    pub metadata_dirty: bool,
    pub rebuild_ui: bool,
    pub refresh_needed: bool,

    /// Half-open span of touched indexes.
    pub index_range: Option<IndexRange>,
    /// Select `index_range` after processing.
    pub select_range: bool,
    pub caret_index: Option<usize>,
    /// Keep the current selection when the caret moves.
    pub keep_selection: bool,
    pub caret_column: Option<usize>,
    pub index_visible: Option<usize>,
    pub viewport_origin: Option<(usize, usize)>,
    /// Caret snapshot taken before the change, to detect caret movement.
    pub old_carets: Option<Vec<Caret>>,
    pub add_caret: bool,
    pub force_single_caret: bool,
}

impl Default for StatusFlags {
    fn default() -> Self {
        Self {
            success: true,
            changed_document: true,
            message: None,
            errors: Vec::new(),
            byte_values_changed: false,
            byte_style_changed: false,
            data_model_changed: false,
            metadata_dirty: false,
            rebuild_ui: false,
            refresh_needed: false,
            index_range: None,
            select_range: false,
            caret_index: None,
            keep_selection: false,
            caret_column: None,
            index_visible: None,
            viewport_origin: None,
            old_carets: None,
            add_caret: false,
            force_single_caret: false,
        }
    }
}

impl StatusFlags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends to the status message.
    pub fn add_message(&mut self, text: impl AsRef<str>) {
        let text = text.as_ref();
        if text.is_empty() {
            return;
        }
        match &mut self.message {
            Some(message) if !message.is_empty() => {
                message.push(' ');
                message.push_str(text);
            }
            _ => self.message = Some(text.to_string()),
        }
    }

    /// Marks the command as failed with `message`.
    pub fn fail(&mut self, message: impl AsRef<str>) {
        self.success = false;
        self.add_message(message);
    }

    /// Widens `index_range` to include `range`.
    pub fn expand_index_range(&mut self, range: IndexRange) {
        self.index_range = Some(match self.index_range {
            None => range,
            Some((s, e)) => (s.min(range.0), e.max(range.1)),
        });
    }

    /// True when any document content or metadata changed.
    pub fn anything_changed(&self) -> bool {
        self.byte_values_changed
            || self.byte_style_changed
            || self.data_model_changed
            || self.metadata_dirty
    }

    /// Folds the flags of another command into these.
    ///
    /// Booleans are ORed, messages concatenated, the index range widened and
    /// caret positions taken from the later flags.
    pub fn add_flags(&mut self, other: &StatusFlags) {
        if let Some(message) = &other.message {
            self.add_message(message);
        }
        self.errors.extend(other.errors.iter().cloned());
        self.success &= other.success;
        self.byte_values_changed |= other.byte_values_changed;
        self.byte_style_changed |= other.byte_style_changed;
        self.data_model_changed |= other.data_model_changed;
        self.metadata_dirty |= other.metadata_dirty;
        self.rebuild_ui |= other.rebuild_ui;
        self.refresh_needed |= other.refresh_needed;
        self.select_range |= other.select_range;
        self.keep_selection |= other.keep_selection;
        self.force_single_caret |= other.force_single_caret;
        if let Some(range) = other.index_range {
            self.expand_index_range(range);
        }
        if other.caret_index.is_some() {
            self.caret_index = other.caret_index;
        }
        if other.caret_column.is_some() {
            self.caret_column = other.caret_column;
        }
        if other.index_visible.is_some() {
            self.index_visible = other.index_visible;
        }
        if other.viewport_origin.is_some() {
            self.viewport_origin = other.viewport_origin;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let flags = StatusFlags::new();
        assert!(flags.success);
        assert!(flags.changed_document);
        assert!(!flags.anything_changed());
    }

    #[test]
    fn test_add_flags_widens_range() {
        let mut total = StatusFlags::new();
        let mut a = StatusFlags::new();
        a.index_range = Some((10, 20));
        a.caret_index = Some(10);
        let mut b = StatusFlags::new();
        b.index_range = Some((5, 30));
        b.byte_values_changed = true;
        b.caret_index = Some(29);

        total.add_flags(&a);
        total.add_flags(&b);
        assert_eq!(total.index_range, Some((5, 30)));
        assert_eq!(total.caret_index, Some(29));
        assert!(total.byte_values_changed);
    }

    #[test]
    fn test_messages_concatenate() {
        let mut total = StatusFlags::new();
        let mut a = StatusFlags::new();
        a.fail("first");
        let mut b = StatusFlags::new();
        b.add_message("second");
        total.add_flags(&a);
        total.add_flags(&b);
        assert_eq!(total.message.as_deref(), Some("first second"));
        assert!(!total.success);
    }
}
