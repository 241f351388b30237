//! The shared byte store behind every segment.
//!
//! ## Learning: Shared Ownership with `Rc<RefCell<_>>`
//!
//! Several segments may view the same buffer (a whole-file segment plus
//! smaller named segments inside it). Each one holds an `Rc` to the same
//! `RefCell<SegmentData>`; mutation borrows the cell for the duration of
//! one method call only, so borrows never overlap. Everything runs on the
//! UI thread, which is why `Rc` is enough and `Arc<Mutex<_>>` is not needed.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

/// Handle to a store shared by several segments.
pub type SharedData = Rc<RefCell<SegmentData>>;

/// Raw bytes plus their parallel style array and metadata maps.
///
/// Comments are keyed by raw (store) index so overlapping segments agree on
/// them; labels are keyed by absolute address.
#[derive(Debug, Clone, Default)]
pub struct SegmentData {
    pub(crate) data: Vec<u8>,
    pub(crate) style: Vec<u8>,
    pub(crate) comments: BTreeMap<usize, String>,
    pub(crate) labels: BTreeMap<usize, String>,
    pub(crate) baseline: Option<Vec<u8>>,
}

impl SegmentData {
    /// Creates a store over `data` with all style bits clear.
    pub fn new(data: Vec<u8>) -> Self {
        let style = vec![0; data.len()];
        Self {
            data,
            style,
            comments: BTreeMap::new(),
            labels: BTreeMap::new(),
            baseline: None,
        }
    }

    /// Wraps the store for sharing between segments.
    pub fn shared(data: Vec<u8>) -> SharedData {
        Rc::new(RefCell::new(Self::new(data)))
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The full byte contents.
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// The full style array.
    pub fn styles(&self) -> &[u8] {
        &self.style
    }

    /// All comments keyed by raw index.
    pub fn comments(&self) -> &BTreeMap<usize, String> {
        &self.comments
    }

    /// All labels keyed by address.
    pub fn labels(&self) -> &BTreeMap<usize, String> {
        &self.labels
    }

    /// Installs baseline bytes, truncating or zero padding to the data length.
    ///
    /// Returns the size difference that was corrected (positive when the
    /// baseline was truncated, negative when it was padded).
    pub fn set_baseline(&mut self, mut baseline: Vec<u8>) -> isize {
        let difference = baseline.len() as isize - self.data.len() as isize;
        baseline.resize(self.data.len(), 0);
        self.baseline = Some(baseline);
        difference
    }

    pub fn clear_baseline(&mut self) {
        self.baseline = None;
    }

    pub fn baseline(&self) -> Option<&[u8]> {
        self.baseline.as_deref()
    }
}

/// Comment and style state of one range, captured for undo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RangeSnapshot {
    pub(crate) start: usize,
    pub(crate) end: usize,
    pub(crate) styles: Vec<u8>,
    pub(crate) comments: Vec<Option<String>>,
}

/// Opaque snapshot of comments within a set of ranges.
///
/// Produced by `Segment::get_comment_restore_data` and consumed by
/// `Segment::restore_comments`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommentSnapshot {
    pub(crate) ranges: Vec<RangeSnapshot>,
}

impl CommentSnapshot {
    /// Number of indexes covered by the snapshot.
    pub fn len(&self) -> usize {
        self.ranges.iter().map(|r| r.end - r.start).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Style and comment state of a selection, in clipboard form.
///
/// `comment_positions` are positions within the index list that was
/// queried, not segment indexes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SelectionMetadata {
    pub style: Vec<u8>,
    pub comment_positions: Vec<usize>,
    pub comment_texts: Vec<String>,
}
