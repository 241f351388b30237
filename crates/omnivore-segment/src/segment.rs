//! Addressable views into a shared byte store.
//!
//! ## Learning: Cheap Handles
//!
//! `Segment` is a small handle (an `Rc` plus a few integers), so cloning one
//! does not copy any bytes. Commands keep their own clone of the segment
//! they target, which lets them undo long after the editor has moved on to
//! another segment.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::data::{CommentSnapshot, RangeSnapshot, SegmentData, SelectionMetadata, SharedData};
use crate::ranges::{IndexRange, indexes_to_ranges, normalize, rect_ranges_to_indexes};
use crate::style::StyleBits;
use crate::{SegmentError, SegmentResult};

/// Unique identifier for a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SegmentId(Uuid);

impl SegmentId {
    /// Creates a new unique segment ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SegmentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Serializable description of a segment view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentDescriptor {
    pub name: String,
    pub offset: usize,
    pub length: usize,
    #[serde(rename = "start addr")]
    pub start_addr: usize,
}

/// A named window over a shared byte store.
///
/// All indexes taken by `Segment` methods are relative to the segment, so
/// index 0 is the byte at `start_addr`.
#[derive(Clone)]
pub struct Segment {
    store: SharedData,
    id: SegmentId,
    name: String,
    offset: usize,
    length: usize,
    start_addr: usize,
}

impl fmt::Debug for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Segment")
            .field("name", &self.name)
            .field("offset", &self.offset)
            .field("length", &self.length)
            .field("start_addr", &format_args!("{:#06x}", self.start_addr))
            .finish()
    }
}

impl Segment {
    /// Creates a segment covering a fresh store.
    pub fn new(data: Vec<u8>, start_addr: usize, name: impl Into<String>) -> Self {
        let length = data.len();
        Self {
            store: SegmentData::shared(data),
            id: SegmentId::new(),
            name: name.into(),
            offset: 0,
            length,
            start_addr,
        }
    }

    /// Creates a view of `length` bytes starting at `offset` in `store`.
    pub fn view(
        store: &SharedData,
        offset: usize,
        length: usize,
        start_addr: usize,
        name: impl Into<String>,
    ) -> SegmentResult<Self> {
        let buffer_len = store.borrow().len();
        if offset.checked_add(length).is_none_or(|end| end > buffer_len) {
            return Err(SegmentError::ViewOutOfBounds {
                offset,
                length,
                buffer_len,
            });
        }
        Ok(Self {
            store: store.clone(),
            id: SegmentId::new(),
            name: name.into(),
            offset,
            length,
            start_addr,
        })
    }

    /// Recreates a view from its serialized description.
    pub fn from_descriptor(store: &SharedData, desc: &SegmentDescriptor) -> SegmentResult<Self> {
        Self::view(store, desc.offset, desc.length, desc.start_addr, desc.name.clone())
    }

    pub fn descriptor(&self) -> SegmentDescriptor {
        SegmentDescriptor {
            name: self.name.clone(),
            offset: self.offset,
            length: self.length,
            start_addr: self.start_addr,
        }
    }

    pub fn id(&self) -> SegmentId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn start_addr(&self) -> usize {
        self.start_addr
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// The shared store this segment views.
    pub fn store(&self) -> &SharedData {
        &self.store
    }

    /// True if both handles refer to the same segment.
    pub fn same_segment(&self, other: &Segment) -> bool {
        self.id == other.id
    }

    /// Converts a segment index to a store index.
    pub fn raw_index(&self, index: usize) -> usize {
        self.offset + index
    }

    /// Address of the byte at `index`.
    pub fn address(&self, index: usize) -> usize {
        self.start_addr + index
    }

    fn check_range(&self, start: usize, end: usize) -> SegmentResult<()> {
        if start > end || end > self.length {
            return Err(SegmentError::IndexOutOfRange {
                start,
                end,
                len: self.length,
            });
        }
        Ok(())
    }

    fn check_indexes(&self, indexes: &[usize]) -> SegmentResult<()> {
        match indexes.iter().copied().find(|&i| i >= self.length) {
            Some(bad) => Err(SegmentError::IndexOutOfRange {
                start: bad,
                end: bad + 1,
                len: self.length,
            }),
            None => Ok(()),
        }
    }

    fn check_len(expected: usize, actual: usize) -> SegmentResult<()> {
        if expected != actual {
            return Err(SegmentError::LengthMismatch { expected, actual });
        }
        Ok(())
    }

    // ==================== Data ====================

    /// Returns a copy of the bytes in `start..end`.
    pub fn read(&self, start: usize, end: usize) -> SegmentResult<Vec<u8>> {
        self.check_range(start, end)?;
        let store = self.store.borrow();
        Ok(store.data[self.raw_index(start)..self.raw_index(end)].to_vec())
    }

    /// Returns a copy of every byte in the segment.
    pub fn to_vec(&self) -> Vec<u8> {
        let store = self.store.borrow();
        store.data[self.offset..self.offset + self.length].to_vec()
    }

    /// Returns the byte at `index`.
    pub fn byte(&self, index: usize) -> SegmentResult<u8> {
        self.check_range(index, index + 1)?;
        Ok(self.store.borrow().data[self.raw_index(index)])
    }

    /// Overwrites `start..end` with `bytes`. Style and comments are untouched.
    pub fn write(&self, start: usize, end: usize, bytes: &[u8]) -> SegmentResult<()> {
        self.check_range(start, end)?;
        Self::check_len(end - start, bytes.len())?;
        let (s, e) = (self.raw_index(start), self.raw_index(end));
        self.store.borrow_mut().data[s..e].copy_from_slice(bytes);
        Ok(())
    }

    /// Gathers the bytes at `indexes`.
    pub fn read_at(&self, indexes: &[usize]) -> SegmentResult<Vec<u8>> {
        self.check_indexes(indexes)?;
        let store = self.store.borrow();
        Ok(indexes.iter().map(|&i| store.data[self.raw_index(i)]).collect())
    }

    /// Scatters `bytes` to `indexes`; with duplicate indexes the last write wins.
    pub fn write_at(&self, indexes: &[usize], bytes: &[u8]) -> SegmentResult<()> {
        self.check_indexes(indexes)?;
        Self::check_len(indexes.len(), bytes.len())?;
        let mut store = self.store.borrow_mut();
        for (&i, &b) in indexes.iter().zip(bytes) {
            store.data[self.offset + i] = b;
        }
        Ok(())
    }

    // ==================== Style ====================

    /// Returns the raw style bytes at `indexes`.
    pub fn style_at(&self, indexes: &[usize]) -> SegmentResult<Vec<u8>> {
        self.check_indexes(indexes)?;
        let store = self.store.borrow();
        Ok(indexes.iter().map(|&i| store.style[self.raw_index(i)]).collect())
    }

    /// Returns the raw style bytes for `start..end`.
    pub fn style_range(&self, start: usize, end: usize) -> SegmentResult<Vec<u8>> {
        self.check_range(start, end)?;
        let store = self.store.borrow();
        Ok(store.style[self.raw_index(start)..self.raw_index(end)].to_vec())
    }

    /// Replaces the raw style bytes at `indexes`.
    pub fn write_style_at(&self, indexes: &[usize], styles: &[u8]) -> SegmentResult<()> {
        self.check_indexes(indexes)?;
        Self::check_len(indexes.len(), styles.len())?;
        let mut store = self.store.borrow_mut();
        for (&i, &s) in indexes.iter().zip(styles) {
            store.style[self.offset + i] = s;
        }
        Ok(())
    }

    /// ORs `bits` into the style at `indexes`.
    pub fn or_style_at(&self, indexes: &[usize], styles: &[u8]) -> SegmentResult<()> {
        self.check_indexes(indexes)?;
        Self::check_len(indexes.len(), styles.len())?;
        let mut store = self.store.borrow_mut();
        for (&i, &s) in indexes.iter().zip(styles) {
            store.style[self.offset + i] |= s;
        }
        Ok(())
    }

    fn modify_style<F>(&self, ranges: &[IndexRange], mut f: F) -> SegmentResult<()>
    where
        F: FnMut(&mut u8),
    {
        for &range in ranges {
            let (start, end) = normalize(range);
            self.check_range(start, end)?;
        }
        let mut store = self.store.borrow_mut();
        for &range in ranges {
            let (start, end) = normalize(range);
            let (s, e) = (self.raw_index(start), self.raw_index(end));
            store.style[s..e].iter_mut().for_each(&mut f);
        }
        Ok(())
    }

    /// ORs `bits` into every index of every range.
    pub fn set_style(&self, ranges: &[IndexRange], bits: StyleBits) -> SegmentResult<()> {
        let mask = bits.bits();
        self.modify_style(ranges, |s| *s |= mask)
    }

    /// Clears `bits` over `ranges`, or over the whole segment when `None`.
    pub fn clear_style(&self, ranges: Option<&[IndexRange]>, bits: StyleBits) -> SegmentResult<()> {
        let mask = bits.clear_mask();
        match ranges {
            Some(ranges) => self.modify_style(ranges, |s| *s &= mask),
            None => self.modify_style(&[(0, self.length)], |s| *s &= mask),
        }
    }

    /// ORs `bits` into the style at each index.
    pub fn set_style_at(&self, indexes: &[usize], bits: StyleBits) -> SegmentResult<()> {
        let ranges = indexes_to_ranges(indexes);
        self.set_style(&ranges, bits)
    }

    /// Writes the three-bit user field over `ranges`.
    pub fn set_user_style(&self, ranges: &[IndexRange], value: u8) -> SegmentResult<()> {
        let keep = StyleBits::USER.clear_mask();
        let user = StyleBits::user(value).bits();
        self.modify_style(ranges, |s| *s = (*s & keep) | user)
    }

    /// Ranges over which every bit in `bits` is set.
    pub fn get_style_ranges(&self, bits: StyleBits) -> Vec<IndexRange> {
        let store = self.store.borrow();
        let styles = &store.style[self.offset..self.offset + self.length];
        let matching: Vec<usize> = styles
            .iter()
            .enumerate()
            .filter(|(_, s)| bits.all_set_in(**s))
            .map(|(i, _)| i)
            .collect();
        indexes_to_ranges(&matching)
    }

    /// Start of the next styled run after `index`, wrapping to the beginning.
    pub fn find_next(&self, index: usize, bits: StyleBits) -> Option<usize> {
        let starts: Vec<usize> = self.get_style_ranges(bits).iter().map(|r| r.0).collect();
        starts
            .iter()
            .copied()
            .find(|&s| s > index)
            .or_else(|| starts.first().copied())
    }

    /// Start of the previous styled run before `index`, wrapping to the end.
    pub fn find_previous(&self, index: usize, bits: StyleBits) -> Option<usize> {
        let starts: Vec<usize> = self.get_style_ranges(bits).iter().map(|r| r.0).collect();
        starts
            .iter()
            .rev()
            .copied()
            .find(|&s| s < index)
            .or_else(|| starts.last().copied())
    }

    /// Indexes of the rectangle spanned by two anchors on a grid.
    pub fn rect_indexes(&self, anchor_start: usize, anchor_end: usize, bytes_per_row: usize) -> Vec<usize> {
        rect_ranges_to_indexes(bytes_per_row, &[(anchor_start, anchor_end)])
            .into_iter()
            .filter(|&i| i < self.length)
            .collect()
    }

    // ==================== Comments ====================

    /// Stores `text` at `index` and marks it with the comment style bit.
    pub fn set_comment(&self, index: usize, text: impl Into<String>) -> SegmentResult<()> {
        self.check_range(index, index + 1)?;
        let raw = self.raw_index(index);
        let mut store = self.store.borrow_mut();
        store.comments.insert(raw, text.into());
        store.style[raw] |= StyleBits::COMMENT.bits();
        Ok(())
    }

    /// Removes any comment at `index` along with its style bit.
    pub fn clear_comment(&self, index: usize) -> SegmentResult<()> {
        self.check_range(index, index + 1)?;
        let raw = self.raw_index(index);
        let mut store = self.store.borrow_mut();
        store.comments.remove(&raw);
        store.style[raw] &= StyleBits::COMMENT.clear_mask();
        Ok(())
    }

    /// The comment at `index`, if any.
    pub fn comment_at(&self, index: usize) -> Option<String> {
        if index >= self.length {
            return None;
        }
        self.store.borrow().comments.get(&self.raw_index(index)).cloned()
    }

    /// Sets `text` at every index of every range.
    pub fn set_comment_ranges(&self, ranges: &[IndexRange], text: &str) -> SegmentResult<()> {
        for &range in ranges {
            let (start, end) = normalize(range);
            self.check_range(start, end)?;
            for i in start..end {
                self.set_comment(i, text)?;
            }
        }
        Ok(())
    }

    /// Clears the comment at every index of every range.
    pub fn clear_comment_ranges(&self, ranges: &[IndexRange]) -> SegmentResult<()> {
        for &range in ranges {
            let (start, end) = normalize(range);
            self.check_range(start, end)?;
            for i in start..end {
                self.clear_comment(i)?;
            }
        }
        Ok(())
    }

    /// Installs `texts[n]` at `indexes[n]`.
    pub fn set_comments_at_indexes(&self, indexes: &[usize], texts: &[String]) -> SegmentResult<()> {
        for (&index, text) in indexes.iter().zip(texts) {
            self.set_comment(index, text.clone())?;
        }
        Ok(())
    }

    /// Captures comments and style of every index in `ranges` so they can be
    /// put back with [`Segment::restore_comments`].
    pub fn get_comment_restore_data(&self, ranges: &[IndexRange]) -> SegmentResult<CommentSnapshot> {
        let store = self.store.borrow();
        let mut snapshot = CommentSnapshot::default();
        for &range in ranges {
            let (start, end) = normalize(range);
            self.check_range(start, end)?;
            let (s, e) = (self.raw_index(start), self.raw_index(end));
            snapshot.ranges.push(RangeSnapshot {
                start,
                end,
                styles: store.style[s..e].to_vec(),
                comments: (s..e).map(|raw| store.comments.get(&raw).cloned()).collect(),
            });
        }
        Ok(snapshot)
    }

    /// Puts back the comment state captured by `get_comment_restore_data`.
    pub fn restore_comments(&self, snapshot: &CommentSnapshot) -> SegmentResult<()> {
        for range in &snapshot.ranges {
            self.check_range(range.start, range.end)?;
        }
        let mut store = self.store.borrow_mut();
        for range in &snapshot.ranges {
            let (s, e) = (self.raw_index(range.start), self.raw_index(range.end));
            store.style[s..e].copy_from_slice(&range.styles);
            for (raw, comment) in (s..e).zip(&range.comments) {
                match comment {
                    Some(text) => {
                        store.comments.insert(raw, text.clone());
                    }
                    None => {
                        store.comments.remove(&raw);
                    }
                }
            }
        }
        Ok(())
    }

    /// Style of each index plus the comments found among them, in clipboard
    /// form.
    pub fn calc_selected_index_metadata(&self, indexes: &[usize]) -> SegmentResult<SelectionMetadata> {
        let style = self.style_at(indexes)?;
        let store = self.store.borrow();
        let mut meta = SelectionMetadata {
            style,
            ..Default::default()
        };
        for (position, &index) in indexes.iter().enumerate() {
            if let Some(text) = store.comments.get(&self.raw_index(index)) {
                if !text.is_empty() {
                    meta.comment_positions.push(position);
                    meta.comment_texts.push(text.clone());
                }
            }
        }
        Ok(meta)
    }

    /// All comments inside this segment as `(index, text)` sorted by index.
    pub fn get_sorted_comments(&self) -> Vec<(usize, String)> {
        let store = self.store.borrow();
        store
            .comments
            .range(self.offset..self.offset + self.length)
            .map(|(raw, text)| (raw - self.offset, text.clone()))
            .collect()
    }

    // ==================== Labels ====================

    /// The label at absolute address `addr`.
    pub fn label_at(&self, addr: usize) -> Option<String> {
        self.store.borrow().labels.get(&addr).cloned()
    }

    /// Sets a label, returning the previous one.
    pub fn set_label(&self, addr: usize, text: impl Into<String>) -> Option<String> {
        self.store.borrow_mut().labels.insert(addr, text.into())
    }

    /// Removes a label, returning it.
    pub fn remove_label(&self, addr: usize) -> Option<String> {
        self.store.borrow_mut().labels.remove(&addr)
    }

    /// Labels whose address falls inside this segment.
    pub fn labels(&self) -> Vec<(usize, String)> {
        let store = self.store.borrow();
        store
            .labels
            .range(self.start_addr..self.start_addr + self.length)
            .map(|(addr, text)| (*addr, text.clone()))
            .collect()
    }

    // ==================== Baseline ====================

    pub fn has_baseline(&self) -> bool {
        self.store.borrow().baseline.is_some()
    }

    /// Baseline bytes at the same indexes.
    pub fn baseline_at(&self, indexes: &[usize]) -> SegmentResult<Vec<u8>> {
        self.check_indexes(indexes)?;
        let store = self.store.borrow();
        let baseline = store.baseline.as_ref().ok_or(SegmentError::NoBaseline)?;
        Ok(indexes.iter().map(|&i| baseline[self.raw_index(i)]).collect())
    }

    /// Sets the diff bit where data differs from the baseline and clears it
    /// elsewhere. Returns the number of differing bytes.
    pub fn compare_to_baseline(&self) -> SegmentResult<usize> {
        let mut store = self.store.borrow_mut();
        let SegmentData {
            data,
            style,
            baseline,
            ..
        } = &mut *store;
        let baseline = baseline.as_ref().ok_or(SegmentError::NoBaseline)?;
        let mut count = 0;
        for raw in self.offset..self.offset + self.length {
            if data[raw] != baseline[raw] {
                style[raw] |= StyleBits::DIFF.bits();
                count += 1;
            } else {
                style[raw] &= StyleBits::DIFF.clear_mask();
            }
        }
        tracing::debug!("{}: {} bytes differ from baseline", self.name, count);
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counting(len: usize) -> Segment {
        Segment::new((0..len).map(|i| i as u8).collect(), 0x600, "test")
    }

    #[test]
    fn test_read_write() {
        let seg = counting(16);
        assert_eq!(seg.read(2, 5).unwrap(), vec![2, 3, 4]);
        seg.write(2, 5, &[9, 9, 9]).unwrap();
        assert_eq!(seg.read(0, 6).unwrap(), vec![0, 1, 9, 9, 9, 5]);
        assert!(matches!(
            seg.read(10, 17),
            Err(SegmentError::IndexOutOfRange { .. })
        ));
        assert!(matches!(
            seg.write(0, 2, &[1]),
            Err(SegmentError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn test_scatter_last_write_wins() {
        let seg = counting(8);
        seg.write_at(&[1, 3, 1], &[10, 30, 11]).unwrap();
        assert_eq!(seg.read_at(&[1, 3]).unwrap(), vec![11, 30]);
    }

    #[test]
    fn test_views_share_bytes_and_comments() {
        let whole = counting(32);
        let part = Segment::view(whole.store(), 16, 8, 0x2000, "part").unwrap();
        part.write(0, 1, &[0xaa]).unwrap();
        assert_eq!(whole.byte(16).unwrap(), 0xaa);

        part.set_comment(2, "inside").unwrap();
        assert_eq!(whole.comment_at(18).as_deref(), Some("inside"));
        assert_eq!(part.get_sorted_comments(), vec![(2, "inside".to_string())]);
        assert!(Segment::view(whole.store(), 30, 8, 0, "bad").is_err());
        assert!(matches!(
            Segment::view(whole.store(), 16, usize::MAX, 0, "huge"),
            Err(SegmentError::ViewOutOfBounds { .. })
        ));
        assert!(Segment::view(whole.store(), usize::MAX, 1, 0, "huge").is_err());
    }

    #[test]
    fn test_style_masks_preserve_other_bits() {
        let seg = counting(10);
        seg.set_style(&[(0, 10)], StyleBits::DATA).unwrap();
        seg.set_style(&[(2, 4), (6, 5)], StyleBits::MATCH).unwrap();
        assert_eq!(seg.get_style_ranges(StyleBits::MATCH), vec![(2, 4), (5, 6)]);

        seg.clear_style(None, StyleBits::MATCH).unwrap();
        assert!(seg.get_style_ranges(StyleBits::MATCH).is_empty());
        assert_eq!(seg.get_style_ranges(StyleBits::DATA), vec![(0, 10)]);
    }

    #[test]
    fn test_user_style_field() {
        let seg = counting(4);
        seg.set_style(&[(0, 4)], StyleBits::SELECTED).unwrap();
        seg.set_user_style(&[(1, 3)], 5).unwrap();
        let styles = seg.style_range(0, 4).unwrap();
        assert_eq!(styles, vec![0x80, 0x85, 0x85, 0x80]);
    }

    #[test]
    fn test_find_next_and_previous_wrap() {
        let seg = counting(20);
        seg.set_style(&[(3, 5), (10, 12)], StyleBits::MATCH).unwrap();
        assert_eq!(seg.find_next(0, StyleBits::MATCH), Some(3));
        assert_eq!(seg.find_next(3, StyleBits::MATCH), Some(10));
        assert_eq!(seg.find_next(15, StyleBits::MATCH), Some(3));
        assert_eq!(seg.find_previous(10, StyleBits::MATCH), Some(3));
        assert_eq!(seg.find_previous(2, StyleBits::MATCH), Some(10));
    }

    #[test]
    fn test_comment_restore_round_trip() {
        let seg = counting(10);
        seg.set_comment(2, "two").unwrap();
        let snapshot = seg.get_comment_restore_data(&[(0, 5)]).unwrap();

        seg.set_comment_ranges(&[(1, 4)], "new").unwrap();
        seg.clear_comment(2).unwrap();
        assert_eq!(seg.comment_at(1).as_deref(), Some("new"));

        seg.restore_comments(&snapshot).unwrap();
        assert_eq!(seg.comment_at(1), None);
        assert_eq!(seg.comment_at(2).as_deref(), Some("two"));
        assert_eq!(seg.style_range(0, 5).unwrap(), vec![0, 0, 0x20, 0, 0]);
    }

    #[test]
    fn test_selected_index_metadata() {
        let seg = counting(10);
        seg.set_comment(4, "four").unwrap();
        seg.set_comment(8, "eight").unwrap();
        let meta = seg.calc_selected_index_metadata(&[3, 4, 5, 8]).unwrap();
        assert_eq!(meta.style, vec![0, 0x20, 0, 0x20]);
        assert_eq!(meta.comment_positions, vec![1, 3]);
        assert_eq!(meta.comment_texts, vec!["four", "eight"]);
    }

    #[test]
    fn test_labels_by_address() {
        let seg = counting(16);
        assert_eq!(seg.set_label(0x604, "loop"), None);
        assert_eq!(seg.set_label(0x604, "start"), Some("loop".to_string()));
        assert_eq!(seg.labels(), vec![(0x604, "start".to_string())]);
        assert_eq!(seg.remove_label(0x604), Some("start".to_string()));
        assert_eq!(seg.label_at(0x604), None);
    }

    #[test]
    fn test_baseline_diff() {
        let seg = counting(8);
        assert!(matches!(seg.baseline_at(&[0]), Err(SegmentError::NoBaseline)));
        seg.store().borrow_mut().set_baseline(vec![0, 1, 2, 0, 4, 5, 0, 7]);
        assert_eq!(seg.compare_to_baseline().unwrap(), 2);
        assert_eq!(seg.get_style_ranges(StyleBits::DIFF), vec![(3, 4), (6, 7)]);
        assert_eq!(seg.baseline_at(&[3, 6]).unwrap(), vec![0, 0]);
    }
}
