//! Comment, label and style commands. None of these touch byte values.

use std::any::Any;

use omnivore_segment::{
    CommentSnapshot, IndexRange, Segment, StyleBits, collapse_overlapping_ranges, normalize,
    ranges_to_indexes,
};

use crate::command::{Command, FieldKind};
use crate::flags::StatusFlags;
use crate::EditResult;

use super::byte::span;

const COMMENT_FIELDS: &[(&str, FieldKind)] = &[
    ("segment", FieldKind::Segment),
    ("ranges", FieldKind::Ranges),
    ("text", FieldKind::Text),
];

const RANGE_FIELDS: &[(&str, FieldKind)] = &[("segment", FieldKind::Segment), ("ranges", FieldKind::Ranges)];

fn abbreviate(text: &str) -> String {
    match text.char_indices().nth(20) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

fn metadata_flags(flags: &mut StatusFlags) {
    flags.byte_style_changed = true;
    flags.metadata_dirty = true;
}

fn ranges_span(ranges: &[IndexRange]) -> Option<IndexRange> {
    let merged = collapse_overlapping_ranges(ranges);
    match (merged.first(), merged.last()) {
        (Some(first), Some(last)) => Some((first.0, last.1)),
        _ => None,
    }
}

// ==================== Comments ====================

/// Stores a comment at the first index of each range.
#[derive(Debug, Clone)]
pub struct SetComment {
    segment: Segment,
    ranges: Vec<IndexRange>,
    text: String,
    old: Option<CommentSnapshot>,
}

impl SetComment {
    pub fn new(segment: &Segment, ranges: &[IndexRange], text: impl Into<String>) -> Self {
        let ranges = ranges
            .iter()
            .map(|&r| {
                let (start, _) = normalize(r);
                (start, start + 1)
            })
            .collect();
        Self {
            segment: segment.clone(),
            ranges,
            text: text.into(),
            old: None,
        }
    }

    pub fn ranges(&self) -> &[IndexRange] {
        &self.ranges
    }
}

impl Command for SetComment {
    fn short_name(&self) -> &'static str {
        "set_comment"
    }

    fn ui_name(&self) -> &'static str {
        "Comment"
    }

    fn serialize_order(&self) -> &'static [(&'static str, FieldKind)] {
        COMMENT_FIELDS
    }

    fn describe(&self) -> String {
        format!("{}: {}", self.ui_name(), abbreviate(&self.text))
    }

    fn set_undo_flags(&self, flags: &mut StatusFlags) {
        metadata_flags(flags);
        flags.index_range = ranges_span(&self.ranges);
    }

    fn do_change(&mut self, _flags: &mut StatusFlags) -> EditResult<()> {
        let old = self.segment.get_comment_restore_data(&self.ranges)?;
        self.segment.set_comment_ranges(&self.ranges, &self.text)?;
        self.old = Some(old);
        Ok(())
    }

    fn undo_change(&mut self, _flags: &mut StatusFlags) -> EditResult<()> {
        if let Some(old) = &self.old {
            self.segment.restore_comments(old)?;
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Removes every comment inside the ranges.
#[derive(Debug, Clone)]
pub struct ClearComment {
    segment: Segment,
    ranges: Vec<IndexRange>,
    old: Option<CommentSnapshot>,
}

impl ClearComment {
    pub fn new(segment: &Segment, ranges: &[IndexRange]) -> Self {
        Self {
            segment: segment.clone(),
            ranges: ranges.to_vec(),
            old: None,
        }
    }
}

impl Command for ClearComment {
    fn short_name(&self) -> &'static str {
        "clear_comment"
    }

    fn ui_name(&self) -> &'static str {
        "Remove Comment"
    }

    fn serialize_order(&self) -> &'static [(&'static str, FieldKind)] {
        RANGE_FIELDS
    }

    fn set_undo_flags(&self, flags: &mut StatusFlags) {
        metadata_flags(flags);
        flags.index_range = ranges_span(&self.ranges);
    }

    fn do_change(&mut self, _flags: &mut StatusFlags) -> EditResult<()> {
        let old = self.segment.get_comment_restore_data(&self.ranges)?;
        self.segment.clear_comment_ranges(&self.ranges)?;
        self.old = Some(old);
        Ok(())
    }

    fn undo_change(&mut self, _flags: &mut StatusFlags) -> EditResult<()> {
        if let Some(old) = &self.old {
            self.segment.restore_comments(old)?;
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ==================== Labels ====================

/// Names an address.
#[derive(Debug, Clone)]
pub struct SetLabel {
    segment: Segment,
    addr: usize,
    label: String,
    old: Option<String>,
}

impl SetLabel {
    pub fn new(segment: &Segment, addr: usize, label: impl Into<String>) -> Self {
        Self {
            segment: segment.clone(),
            addr,
            label: label.into(),
            old: None,
        }
    }
}

impl Command for SetLabel {
    fn short_name(&self) -> &'static str {
        "set_label"
    }

    fn ui_name(&self) -> &'static str {
        "Label"
    }

    fn serialize_order(&self) -> &'static [(&'static str, FieldKind)] {
        &[
            ("segment", FieldKind::Segment),
            ("addr", FieldKind::Int),
            ("label", FieldKind::Text),
        ]
    }

    fn describe(&self) -> String {
        format!("{}: {}", self.ui_name(), abbreviate(&self.label))
    }

    fn set_undo_flags(&self, flags: &mut StatusFlags) {
        metadata_flags(flags);
        if let Some(index) = self.addr.checked_sub(self.segment.start_addr()) {
            if index < self.segment.len() {
                flags.index_range = Some((index, index + 1));
            }
        }
    }

    fn do_change(&mut self, _flags: &mut StatusFlags) -> EditResult<()> {
        self.old = self.segment.set_label(self.addr, self.label.clone());
        Ok(())
    }

    fn undo_change(&mut self, _flags: &mut StatusFlags) -> EditResult<()> {
        match &self.old {
            Some(old) => {
                self.segment.set_label(self.addr, old.clone());
            }
            None => {
                self.segment.remove_label(self.addr);
            }
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Removes the labels of every address inside the ranges.
#[derive(Debug, Clone)]
pub struct ClearLabel {
    segment: Segment,
    ranges: Vec<IndexRange>,
    removed: Vec<(usize, String)>,
}

impl ClearLabel {
    pub fn new(segment: &Segment, ranges: &[IndexRange]) -> Self {
        Self {
            segment: segment.clone(),
            ranges: ranges.to_vec(),
            removed: Vec::new(),
        }
    }
}

impl Command for ClearLabel {
    fn short_name(&self) -> &'static str {
        "clear_label"
    }

    fn ui_name(&self) -> &'static str {
        "Remove Label"
    }

    fn serialize_order(&self) -> &'static [(&'static str, FieldKind)] {
        RANGE_FIELDS
    }

    fn set_undo_flags(&self, flags: &mut StatusFlags) {
        metadata_flags(flags);
        flags.index_range = ranges_span(&self.ranges);
    }

    fn do_change(&mut self, _flags: &mut StatusFlags) -> EditResult<()> {
        let indexes = ranges_to_indexes(&collapse_overlapping_ranges(&self.ranges));
        self.removed = indexes
            .into_iter()
            .filter_map(|i| {
                let addr = self.segment.address(i);
                self.segment.remove_label(addr).map(|label| (addr, label))
            })
            .collect();
        Ok(())
    }

    fn undo_change(&mut self, _flags: &mut StatusFlags) -> EditResult<()> {
        for (addr, label) in &self.removed {
            self.segment.set_label(*addr, label.clone());
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ==================== Style ====================

/// Whether [`SetStyle`] turns bits on or off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleChange {
    Set,
    Clear,
    /// Replace the 3-bit user field with a value.
    User(u8),
}

/// Sets or clears style bits over ranges.
#[derive(Debug, Clone)]
pub struct SetStyle {
    segment: Segment,
    ranges: Vec<IndexRange>,
    bits: StyleBits,
    change: StyleChange,
    indexes: Vec<usize>,
    old_style: Vec<u8>,
}

impl SetStyle {
    pub fn new(segment: &Segment, ranges: &[IndexRange], bits: StyleBits, change: StyleChange) -> Self {
        Self {
            segment: segment.clone(),
            ranges: ranges.to_vec(),
            bits,
            change,
            indexes: Vec::new(),
            old_style: Vec::new(),
        }
    }

    pub fn user(segment: &Segment, ranges: &[IndexRange], value: u8) -> Self {
        Self::new(segment, ranges, StyleBits::USER, StyleChange::User(value))
    }
}

impl Command for SetStyle {
    fn short_name(&self) -> &'static str {
        match self.change {
            StyleChange::Set => "set_style",
            StyleChange::Clear => "clear_style",
            StyleChange::User(_) => "set_user_style",
        }
    }

    fn ui_name(&self) -> &'static str {
        match self.change {
            StyleChange::Set => "Set Style",
            StyleChange::Clear => "Clear Style",
            StyleChange::User(_) => "Set User Style",
        }
    }

    fn serialize_order(&self) -> &'static [(&'static str, FieldKind)] {
        &[
            ("segment", FieldKind::Segment),
            ("ranges", FieldKind::Ranges),
            ("bits", FieldKind::Int),
        ]
    }

    fn set_undo_flags(&self, flags: &mut StatusFlags) {
        flags.byte_style_changed = true;
    }

    fn do_change(&mut self, flags: &mut StatusFlags) -> EditResult<()> {
        let ranges = collapse_overlapping_ranges(&self.ranges);
        let indexes = ranges_to_indexes(&ranges);
        let old_style = self.segment.style_at(&indexes)?;
        match self.change {
            StyleChange::Set => self.segment.set_style(&ranges, self.bits)?,
            StyleChange::Clear => self.segment.clear_style(Some(&ranges), self.bits)?,
            StyleChange::User(value) => self.segment.set_user_style(&ranges, value)?,
        }
        flags.index_range = span(&indexes);
        self.indexes = indexes;
        self.old_style = old_style;
        Ok(())
    }

    fn undo_change(&mut self, flags: &mut StatusFlags) -> EditResult<()> {
        self.segment.write_style_at(&self.indexes, &self.old_style)?;
        flags.index_range = span(&self.indexes);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment() -> Segment {
        Segment::new(vec![0; 32], 0x600, "test")
    }

    #[test]
    fn test_set_comment_uses_first_index() {
        let seg = segment();
        let mut cmd = SetComment::new(&seg, &[(4, 8), (12, 10)], "loop start");
        let info = cmd.perform();
        assert!(info.flags.metadata_dirty);
        assert_eq!(info.flags.index_range, Some((4, 11)));
        assert_eq!(seg.comment_at(4).as_deref(), Some("loop start"));
        assert_eq!(seg.comment_at(5), None);
        assert_eq!(seg.comment_at(10).as_deref(), Some("loop start"));
        assert!(StyleBits::COMMENT.all_set_in(seg.style_at(&[4]).unwrap()[0]));

        cmd.undo();
        assert!(seg.get_sorted_comments().is_empty());
        assert_eq!(seg.style_at(&[4, 10]).unwrap(), vec![0, 0]);
    }

    #[test]
    fn test_set_comment_undo_restores_previous_text() {
        let seg = segment();
        seg.set_comment(4, "old").unwrap();
        let mut cmd = SetComment::new(&seg, &[(4, 5)], "new");
        cmd.perform();
        assert_eq!(seg.comment_at(4).as_deref(), Some("new"));
        cmd.undo();
        assert_eq!(seg.comment_at(4).as_deref(), Some("old"));
    }

    #[test]
    fn test_clear_comment_uses_every_index() {
        let seg = segment();
        seg.set_comment(4, "a").unwrap();
        seg.set_comment(6, "b").unwrap();
        seg.set_comment(9, "c").unwrap();
        let mut cmd = ClearComment::new(&seg, &[(4, 8)]);
        cmd.perform();
        assert_eq!(seg.get_sorted_comments(), vec![(9, "c".to_string())]);
        cmd.undo();
        assert_eq!(seg.get_sorted_comments().len(), 3);
    }

    #[test]
    fn test_describe_truncates() {
        let seg = segment();
        let cmd = SetComment::new(&seg, &[(0, 1)], "a very long comment that keeps going");
        assert_eq!(cmd.describe(), "Comment: a very long comment ...");
    }

    #[test]
    fn test_labels() {
        let seg = segment();
        let mut set = SetLabel::new(&seg, 0x604, "START");
        let info = set.perform();
        assert_eq!(info.flags.index_range, Some((4, 5)));
        assert_eq!(seg.label_at(0x604).as_deref(), Some("START"));

        let mut clear = ClearLabel::new(&seg, &[(0, 8)]);
        clear.perform();
        assert_eq!(seg.label_at(0x604), None);
        clear.undo();
        assert_eq!(seg.label_at(0x604).as_deref(), Some("START"));

        set.undo();
        assert_eq!(seg.label_at(0x604), None);
    }

    #[test]
    fn test_set_style_round_trip() {
        let seg = segment();
        seg.set_style(&[(0, 4)], StyleBits::DATA).unwrap();
        let before = seg.style_range(0, 32).unwrap();

        let mut cmd = SetStyle::new(&seg, &[(2, 6)], StyleBits::DIFF, StyleChange::Set);
        let info = cmd.perform();
        assert!(info.flags.byte_style_changed);
        assert_eq!(info.flags.index_range, Some((2, 6)));
        assert_eq!(seg.style_at(&[1, 2, 5, 6]).unwrap(), vec![0x40, 0x48, 0x08, 0x00]);
        cmd.undo();
        assert_eq!(seg.style_range(0, 32).unwrap(), before);

        let mut user = SetStyle::user(&seg, &[(0, 2)], 5);
        user.perform();
        assert_eq!(StyleBits::user_value(seg.style_at(&[0]).unwrap()[0]), 5);
        assert!(StyleBits::DATA.all_set_in(seg.style_at(&[0]).unwrap()[0]));
    }
}
