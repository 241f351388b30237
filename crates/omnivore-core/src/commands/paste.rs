//! Paste commands driven by a [`ClipboardBlob`].
//!
//! ## Learning: Capturing Context at Construction
//!
//! A paste lands where the carets were when the user pasted, not where they
//! are when the command is redone. The command therefore copies the caret
//! state it needs when it is built and never looks at the editor again.

use std::any::Any;

use omnivore_segment::{
    CaretList, CommentSnapshot, IndexRange, Segment, collapse_overlapping_ranges,
    indexes_to_ranges, ranges_to_indexes,
};

use crate::clipboard::ClipboardBlob;
use crate::command::{Command, FieldKind};
use crate::flags::StatusFlags;
use crate::{EditError, EditResult};

const PASTE_FIELDS: &[(&str, FieldKind)] = &[("segment", FieldKind::Segment), ("blob", FieldKind::Clipboard)];

/// What a [`Paste`] writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasteMode {
    /// Data, style and comments, truncated to the destination.
    Normal,
    /// Data tiled to fill the whole destination.
    Repeat,
    /// Comments only; bytes and style are left alone.
    CommentsOnly,
}

/// Where the carets were when the paste was requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasteTarget {
    pub selected_ranges: Vec<IndexRange>,
    /// Caret indexes; the last is the current caret.
    pub caret_indexes: Vec<usize>,
}

impl PasteTarget {
    pub fn from_carets(carets: &CaretList) -> Self {
        Self {
            selected_ranges: carets.selected_ranges(),
            caret_indexes: carets.indexes(),
        }
    }

    /// A single caret with no selection.
    pub fn at(index: usize) -> Self {
        Self {
            selected_ranges: Vec::new(),
            caret_indexes: vec![index],
        }
    }

    fn current(&self) -> usize {
        self.caret_indexes.last().copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone)]
struct PasteUndo {
    indexes: Vec<usize>,
    old_data: Vec<u8>,
    old_style: Vec<u8>,
    old_comments: Option<CommentSnapshot>,
}

/// Pastes a blob at the selection, or at each caret when nothing is
/// selected.
#[derive(Debug, Clone)]
pub struct Paste {
    segment: Segment,
    blob: ClipboardBlob,
    target: PasteTarget,
    mode: PasteMode,
    undo: Option<PasteUndo>,
}

impl Paste {
    pub fn new(segment: &Segment, blob: ClipboardBlob, target: PasteTarget, mode: PasteMode) -> Self {
        Self {
            segment: segment.clone(),
            blob,
            target,
            mode,
            undo: None,
        }
    }

    /// Destination indexes before clipping to the data length.
    pub fn destination(&self) -> Vec<usize> {
        let indexes = if !self.target.selected_ranges.is_empty() {
            ranges_to_indexes(&collapse_overlapping_ranges(&self.target.selected_ranges))
        } else if let Some(source) = self.blob.indexes.as_ref().filter(|i| !i.is_empty()) {
            let first = source[0];
            let caret = self.target.current();
            source
                .iter()
                .filter_map(|&i| i.checked_add(caret)?.checked_sub(first))
                .collect()
        } else {
            let count = self.blob.len();
            let blocks: Vec<IndexRange> = self
                .target
                .caret_indexes
                .iter()
                .map(|&c| (c, c + count))
                .collect();
            ranges_to_indexes(&collapse_overlapping_ranges(&blocks))
        };
        let len = self.segment.len();
        indexes.into_iter().filter(|&i| i < len).collect()
    }

    /// True when the destination is one blob-sized block per caret.
    fn fills_caret_blocks(&self) -> bool {
        self.target.selected_ranges.is_empty()
            && self.blob.indexes.as_ref().is_none_or(|i| i.is_empty())
    }

    fn source_data(&self, dest_len: usize) -> Vec<u8> {
        let data = &self.blob.data;
        let repeat = self.mode == PasteMode::Repeat || self.fills_caret_blocks();
        if repeat && !data.is_empty() {
            data.iter().copied().cycle().take(dest_len).collect()
        } else {
            data[..data.len().min(dest_len)].to_vec()
        }
    }
}

impl Command for Paste {
    fn short_name(&self) -> &'static str {
        match self.mode {
            PasteMode::Normal => "paste",
            PasteMode::Repeat => "paste_rep",
            PasteMode::CommentsOnly => "paste_comments",
        }
    }

    fn ui_name(&self) -> &'static str {
        match self.mode {
            PasteMode::Normal => "Paste",
            PasteMode::Repeat => "Paste And Repeat",
            PasteMode::CommentsOnly => "Paste Comments",
        }
    }

    fn serialize_order(&self) -> &'static [(&'static str, FieldKind)] {
        PASTE_FIELDS
    }

    fn set_undo_flags(&self, flags: &mut StatusFlags) {
        match self.mode {
            PasteMode::CommentsOnly => {
                flags.byte_style_changed = true;
                flags.metadata_dirty = true;
            }
            _ => flags.byte_values_changed = true,
        }
        flags.select_range = true;
    }

    fn do_change(&mut self, flags: &mut StatusFlags) -> EditResult<()> {
        let mut indexes = self.destination();
        let data = self.source_data(indexes.len());
        indexes.truncate(data.len());
        if indexes.is_empty() {
            flags.changed_document = false;
            flags.add_message("Nothing to paste");
            return Ok(());
        }

        let (comment_indexes, comment_texts): (Vec<usize>, Vec<String>) = self
            .blob
            .comment_positions
            .iter()
            .zip(&self.blob.comment_texts)
            .filter_map(|(&p, text)| indexes.get(p).map(|&i| (i, text.clone())))
            .unzip();
        let old_comments = if comment_indexes.is_empty() {
            None
        } else {
            let mut sorted = indexes.clone();
            sorted.sort_unstable();
            sorted.dedup();
            Some(self.segment.get_comment_restore_data(&indexes_to_ranges(&sorted))?)
        };
        let old_data = self.segment.read_at(&indexes)?;
        let old_style = self.segment.style_at(&indexes)?;

        if self.mode != PasteMode::CommentsOnly {
            self.segment.write_at(&indexes, &data)?;
            if let Some(style) = &self.blob.style {
                let n = style.len().min(indexes.len());
                self.segment.or_style_at(&indexes[..n], &style[..n])?;
            }
        }
        if !comment_indexes.is_empty() {
            self.segment
                .set_comments_at_indexes(&comment_indexes, &comment_texts)?;
        }

        flags.index_range = match (indexes.iter().min(), indexes.iter().max()) {
            (Some(&lo), Some(&hi)) => Some((lo, hi + 1)),
            _ => None,
        };
        tracing::debug!("{} {} bytes", self.short_name(), indexes.len());
        self.undo = Some(PasteUndo {
            indexes,
            old_data,
            old_style,
            old_comments,
        });
        Ok(())
    }

    fn undo_change(&mut self, flags: &mut StatusFlags) -> EditResult<()> {
        let Some(undo) = &self.undo else {
            return Ok(());
        };
        self.segment.write_at(&undo.indexes, &undo.old_data)?;
        self.segment.write_style_at(&undo.indexes, &undo.old_style)?;
        if let Some(comments) = &undo.old_comments {
            self.segment.restore_comments(comments)?;
        }
        flags.index_range = match (undo.indexes.iter().min(), undo.indexes.iter().max()) {
            (Some(&lo), Some(&hi)) => Some((lo, hi + 1)),
            _ => None,
        };
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Pastes a rectangular blob with its top-left corner at a caret, on a grid
/// `bytes_per_row` wide. Rows and columns falling off the grid are dropped.
#[derive(Debug, Clone)]
pub struct PasteRect {
    segment: Segment,
    blob: ClipboardBlob,
    index: usize,
    bytes_per_row: usize,
    indexes: Vec<usize>,
    old_data: Vec<u8>,
    old_style: Vec<u8>,
}

impl PasteRect {
    pub fn new(segment: &Segment, blob: ClipboardBlob, index: usize, bytes_per_row: usize) -> Self {
        Self {
            segment: segment.clone(),
            blob,
            index,
            bytes_per_row,
            indexes: Vec::new(),
            old_data: Vec::new(),
            old_style: Vec::new(),
        }
    }

    /// Destination index and blob position of every cell that fits.
    fn cells(&self) -> Vec<(usize, usize)> {
        let Some((rows, cols)) = self.blob.rect_shape() else {
            return Vec::new();
        };
        let bpr = self.bytes_per_row;
        if bpr == 0 {
            return Vec::new();
        }
        let (r1, c1) = (self.index / bpr, self.index % bpr);
        let c2 = (c1 + cols).min(bpr);
        let len = self.segment.len();
        let mut cells = Vec::with_capacity(rows * cols);
        for row in 0..rows {
            for col in c1..c2 {
                let dest = (r1 + row) * bpr + col;
                if dest < len {
                    cells.push((dest, row * cols + (col - c1)));
                }
            }
        }
        cells
    }
}

impl Command for PasteRect {
    fn short_name(&self) -> &'static str {
        "paste_rect"
    }

    fn ui_name(&self) -> &'static str {
        "Paste Rectangular"
    }

    fn serialize_order(&self) -> &'static [(&'static str, FieldKind)] {
        PASTE_FIELDS
    }

    fn describe(&self) -> String {
        let (rows, cols) = self.blob.rect_shape().unwrap_or_default();
        format!(
            "{} @ {:04x} ({}x{})",
            self.ui_name(),
            self.segment.address(self.index),
            cols,
            rows
        )
    }

    fn set_undo_flags(&self, flags: &mut StatusFlags) {
        flags.byte_values_changed = true;
    }

    fn do_change(&mut self, flags: &mut StatusFlags) -> EditResult<()> {
        self.blob
            .validate()
            .map_err(|err| EditError::ClipboardFormatUnsupported(err.to_string()))?;
        let cells = self.cells();
        if cells.is_empty() {
            flags.changed_document = false;
            flags.add_message("Nothing to paste");
            return Ok(());
        }
        let indexes: Vec<usize> = cells.iter().map(|&(dest, _)| dest).collect();
        let data = cells
            .iter()
            .map(|&(_, src)| self.blob.data.get(src).copied())
            .collect::<Option<Vec<u8>>>()
            .ok_or_else(|| {
                EditError::ClipboardFormatUnsupported(format!(
                    "rectangle needs more than {} bytes",
                    self.blob.data.len()
                ))
            })?;
        let old_data = self.segment.read_at(&indexes)?;
        let old_style = self.segment.style_at(&indexes)?;
        self.segment.write_at(&indexes, &data)?;
        if let Some(style) = &self.blob.style {
            let (dest, styles): (Vec<usize>, Vec<u8>) = cells
                .iter()
                .filter_map(|&(d, s)| style.get(s).map(|&v| (d, v)))
                .unzip();
            self.segment.or_style_at(&dest, &styles)?;
        }
        flags.index_range = super::byte::span(&indexes);
        self.indexes = indexes;
        self.old_data = old_data;
        self.old_style = old_style;
        Ok(())
    }

    fn undo_change(&mut self, flags: &mut StatusFlags) -> EditResult<()> {
        self.segment.write_at(&self.indexes, &self.old_data)?;
        self.segment.write_style_at(&self.indexes, &self.old_style)?;
        flags.index_range = super::byte::span(&self.indexes);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
