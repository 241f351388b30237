//! # Omnivore Segment
//!
//! Byte storage for the editor: a shared raw store, segment views into it,
//! per-byte style bits, comments and labels, plus the caret/selection
//! engine that addresses those bytes.
//!
//! ## Key Concepts for Learning Rust
//!
//! ### Interior Mutability
//! - `SegmentData` lives behind `Rc<RefCell<_>>` so several segments can
//!   view one buffer
//! - `Segment` methods take `&self` and borrow the cell internally
//!
//! ### Index Safety
//! - Every index is checked before the store is touched
//! - Out-of-range access returns `SegmentError` instead of panicking

mod caret;
mod data;
mod history;
mod ranges;
mod segment;
mod style;

pub use caret::{Caret, CaretHistory, CaretList};
pub use data::{CommentSnapshot, SegmentData, SelectionMetadata, SharedData};
pub use history::HistoryList;
pub use ranges::{
    GridRect, IndexRange, collapse_overlapping_ranges, indexes_to_ranges, invert_ranges,
    invert_rects, normalize, ranges_to_indexes, rect_ranges_to_indexes,
};
pub use segment::{Segment, SegmentDescriptor, SegmentId};
pub use style::StyleBits;

/// Result type for segment operations
pub type SegmentResult<T> = Result<T, SegmentError>;

/// Errors that can occur during segment operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SegmentError {
    #[error("Index range {start}..{end} is out of bounds for length {len}")]
    IndexOutOfRange { start: usize, end: usize, len: usize },

    #[error("Expected {expected} values, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("View of {length} bytes at offset {offset} exceeds buffer of {buffer_len} bytes")]
    ViewOutOfBounds {
        offset: usize,
        length: usize,
        buffer_len: usize,
    },

    #[error("Segment has no baseline data")]
    NoBaseline,

    #[error("Nothing to undo")]
    NothingToUndo,

    #[error("Nothing to redo")]
    NothingToRedo,
}
