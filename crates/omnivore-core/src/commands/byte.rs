//! Byte value commands: per-byte transforms over ranges, contiguous byte
//! changes and reverting to the baseline.

use std::any::Any;

use omnivore_segment::{
    IndexRange, Segment, collapse_overlapping_ranges, ranges_to_indexes, rect_ranges_to_indexes,
};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::command::{Command, FieldKind};
use crate::flags::StatusFlags;
use crate::{EditError, EditResult};

const RANGE_FIELDS: &[(&str, FieldKind)] = &[("segment", FieldKind::Segment), ("ranges", FieldKind::Ranges)];

const RANGE_VALUE_FIELDS: &[(&str, FieldKind)] = &[
    ("segment", FieldKind::Segment),
    ("ranges", FieldKind::Ranges),
    ("data", FieldKind::Value),
];

/// Start, optional stop and optional step of a ramp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ramp {
    pub start: i64,
    pub stop: Option<i64>,
    pub step: Option<i64>,
}

impl Ramp {
    pub fn new(start: i64, stop: Option<i64>, step: Option<i64>) -> Self {
        Self { start, stop, step }
    }

    /// `count` values wrapped to bytes. `direction` is +1 or -1 and only
    /// matters when neither stop nor step is given.
    fn values(&self, count: usize, direction: i64) -> Vec<u8> {
        let num = count as i64;
        (0..num)
            .map(|i| {
                let value = match (self.step, self.stop) {
                    (Some(step), _) => self.start + step * i,
                    (None, Some(stop)) => self.start + (stop - self.start) * i / num,
                    (None, None) => self.start + direction * i,
                };
                value.rem_euclid(256) as u8
            })
            .collect()
    }
}

impl From<u8> for Ramp {
    fn from(start: u8) -> Self {
        Self::new(start as i64, None, None)
    }
}

/// A closed-form transform from old bytes to new bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ByteOp {
    Zero,
    Ff,
    /// Fill with the CPU's no-op opcode.
    Nop(u8),
    SetValue(u8),
    Or(u8),
    And(u8),
    Xor(u8),
    SetHighBit,
    ClearHighBit,
    BitwiseNot,
    LeftShift,
    RightShift,
    LeftRotate,
    RightRotate,
    ReverseBits,
    Add(u8),
    Subtract(u8),
    SubtractFrom(u8),
    Multiply(u8),
    DivideBy(u8),
    DivideFrom(u8),
    RampUp(Ramp),
    RampDown(Ramp),
    /// Uniform random bytes. The seed is fixed on first perform so that redo
    /// writes the same bytes.
    RandomBytes { seed: Option<u64> },
    ReverseSelection,
    ReverseGroup(usize),
}

/// New bytes plus how many were left alone because of a zero divisor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transformed {
    pub data: Vec<u8>,
    pub skipped: usize,
}

impl ByteOp {
    pub fn short_name(&self) -> &'static str {
        match self {
            ByteOp::Zero => "zero",
            ByteOp::Ff => "ff",
            ByteOp::Nop(_) => "nop",
            ByteOp::SetValue(_) => "set_value",
            ByteOp::Or(_) => "or_value",
            ByteOp::And(_) => "and_value",
            ByteOp::Xor(_) => "xor_value",
            ByteOp::SetHighBit => "set_high_bit",
            ByteOp::ClearHighBit => "clear_high_bit",
            ByteOp::BitwiseNot => "bitwise_not",
            ByteOp::LeftShift => "left_shift",
            ByteOp::RightShift => "right_shift",
            ByteOp::LeftRotate => "left_rotate",
            ByteOp::RightRotate => "right_rotate",
            ByteOp::ReverseBits => "reverse_bits",
            ByteOp::Add(_) => "add_value",
            ByteOp::Subtract(_) => "subtract_value",
            ByteOp::SubtractFrom(_) => "subtract_from",
            ByteOp::Multiply(_) => "multiply",
            ByteOp::DivideBy(_) => "divide",
            ByteOp::DivideFrom(_) => "divide_from",
            ByteOp::RampUp(_) => "ramp_up",
            ByteOp::RampDown(_) => "ramp_down",
            ByteOp::RandomBytes { .. } => "random_bytes",
            ByteOp::ReverseSelection => "reverse_selection",
            ByteOp::ReverseGroup(_) => "reverse_group",
        }
    }

    pub fn ui_name(&self) -> &'static str {
        match self {
            ByteOp::Zero => "Zero Bytes",
            ByteOp::Ff => "FF Bytes",
            ByteOp::Nop(_) => "NOP Bytes",
            ByteOp::SetValue(_) => "Set Value",
            ByteOp::Or(_) => "OR With",
            ByteOp::And(_) => "AND With",
            ByteOp::Xor(_) => "XOR With",
            ByteOp::SetHighBit => "Set High Bit",
            ByteOp::ClearHighBit => "Clear High Bit",
            ByteOp::BitwiseNot => "Bitwise NOT",
            ByteOp::LeftShift => "Left Shift",
            ByteOp::RightShift => "Right Shift",
            ByteOp::LeftRotate => "Left Rotate",
            ByteOp::RightRotate => "Right Rotate",
            ByteOp::ReverseBits => "Reverse Bits",
            ByteOp::Add(_) => "Add",
            ByteOp::Subtract(_) => "Subtract",
            ByteOp::SubtractFrom(_) => "Subtract From",
            ByteOp::Multiply(_) => "Multiply",
            ByteOp::DivideBy(_) => "Divide By",
            ByteOp::DivideFrom(_) => "Divide From",
            ByteOp::RampUp(_) => "Ramp Up",
            ByteOp::RampDown(_) => "Ramp Down",
            ByteOp::RandomBytes { .. } => "Random Bytes",
            ByteOp::ReverseSelection => "Reverse Selection",
            ByteOp::ReverseGroup(_) => "Reverse In Groups",
        }
    }

    /// Every op keyed by short name, for hosts that build commands from
    /// text. Ops that need a value get `value`.
    pub fn from_short_name(name: &str, value: u8) -> Option<Self> {
        let op = match name {
            "zero" => ByteOp::Zero,
            "ff" => ByteOp::Ff,
            "nop" => ByteOp::Nop(value),
            "set_value" => ByteOp::SetValue(value),
            "or_value" => ByteOp::Or(value),
            "and_value" => ByteOp::And(value),
            "xor_value" => ByteOp::Xor(value),
            "set_high_bit" => ByteOp::SetHighBit,
            "clear_high_bit" => ByteOp::ClearHighBit,
            "bitwise_not" => ByteOp::BitwiseNot,
            "left_shift" => ByteOp::LeftShift,
            "right_shift" => ByteOp::RightShift,
            "left_rotate" => ByteOp::LeftRotate,
            "right_rotate" => ByteOp::RightRotate,
            "reverse_bits" => ByteOp::ReverseBits,
            "add_value" => ByteOp::Add(value),
            "subtract_value" => ByteOp::Subtract(value),
            "subtract_from" => ByteOp::SubtractFrom(value),
            "multiply" => ByteOp::Multiply(value),
            "divide" => ByteOp::DivideBy(value),
            "divide_from" => ByteOp::DivideFrom(value),
            "ramp_up" => ByteOp::RampUp(Ramp::from(value)),
            "ramp_down" => ByteOp::RampDown(Ramp::from(value)),
            "random_bytes" => ByteOp::RandomBytes { seed: None },
            "reverse_selection" => ByteOp::ReverseSelection,
            "reverse_group" => ByteOp::ReverseGroup(value as usize),
            _ => return None,
        };
        Some(op)
    }

    fn takes_value(&self) -> bool {
        !matches!(
            self,
            ByteOp::Zero
                | ByteOp::Ff
                | ByteOp::SetHighBit
                | ByteOp::ClearHighBit
                | ByteOp::BitwiseNot
                | ByteOp::LeftShift
                | ByteOp::RightShift
                | ByteOp::LeftRotate
                | ByteOp::RightRotate
                | ByteOp::ReverseBits
                | ByteOp::RandomBytes { .. }
                | ByteOp::ReverseSelection
        )
    }

    /// Computes the replacement for `orig`.
    pub fn apply(&self, orig: &[u8]) -> Transformed {
        let map = |f: &dyn Fn(u8) -> u8| orig.iter().map(|&b| f(b)).collect::<Vec<u8>>();
        let mut skipped = 0;
        let data = match *self {
            ByteOp::Zero => vec![0; orig.len()],
            ByteOp::Ff => vec![0xff; orig.len()],
            ByteOp::Nop(v) | ByteOp::SetValue(v) => vec![v; orig.len()],
            ByteOp::Or(v) => map(&|b| b | v),
            ByteOp::And(v) => map(&|b| b & v),
            ByteOp::Xor(v) => map(&|b| b ^ v),
            ByteOp::SetHighBit => map(&|b| b | 0x80),
            ByteOp::ClearHighBit => map(&|b| b & 0x7f),
            ByteOp::BitwiseNot => map(&|b| !b),
            ByteOp::LeftShift => map(&|b| b << 1),
            ByteOp::RightShift => map(&|b| b >> 1),
            ByteOp::LeftRotate => map(&|b| b.rotate_left(1)),
            ByteOp::RightRotate => map(&|b| b.rotate_right(1)),
            ByteOp::ReverseBits => map(&|b| b.reverse_bits()),
            ByteOp::Add(v) => map(&|b| b.wrapping_add(v)),
            ByteOp::Subtract(v) => map(&|b| b.wrapping_sub(v)),
            ByteOp::SubtractFrom(v) => map(&|b| v.wrapping_sub(b)),
            ByteOp::Multiply(v) => map(&|b| b.wrapping_mul(v)),
            ByteOp::DivideBy(v) => {
                if v == 0 {
                    skipped = orig.len();
                    orig.to_vec()
                } else {
                    map(&|b| b / v)
                }
            }
            ByteOp::DivideFrom(v) => orig
                .iter()
                .map(|&b| {
                    if b == 0 {
                        skipped += 1;
                        b
                    } else {
                        v / b
                    }
                })
                .collect(),
            ByteOp::RampUp(ramp) => ramp.values(orig.len(), 1),
            ByteOp::RampDown(ramp) => ramp.values(orig.len(), -1),
            ByteOp::RandomBytes { seed } => {
                let mut rng = match seed {
                    Some(seed) => SmallRng::seed_from_u64(seed),
                    None => SmallRng::from_os_rng(),
                };
                (0..orig.len()).map(|_| rng.random::<u8>()).collect()
            }
            ByteOp::ReverseSelection => orig.iter().rev().copied().collect(),
            ByteOp::ReverseGroup(size) => {
                let mut data = orig.to_vec();
                if size > 0 {
                    for group in data.chunks_exact_mut(size) {
                        group.reverse();
                    }
                }
                data
            }
        };
        Transformed { data, skipped }
    }
}

/// How ranges map to byte indexes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeMode {
    /// Every index between start and end.
    Linear,
    /// Rectangular blocks on a grid this many bytes wide.
    Rect(usize),
}

impl RangeMode {
    pub fn indexes(&self, ranges: &[IndexRange]) -> Vec<usize> {
        match *self {
            RangeMode::Linear => ranges_to_indexes(&collapse_overlapping_ranges(ranges)),
            RangeMode::Rect(bytes_per_row) => rect_ranges_to_indexes(bytes_per_row, ranges),
        }
    }
}

/// Span `(first, last + 1)` of sorted indexes.
pub(crate) fn span(indexes: &[usize]) -> Option<IndexRange> {
    match (indexes.first(), indexes.last()) {
        (Some(&first), Some(&last)) => Some((first, last + 1)),
        _ => None,
    }
}

/// Applies a [`ByteOp`] to every index in a set of ranges.
#[derive(Debug, Clone)]
pub struct TransformRanges {
    segment: Segment,
    ranges: Vec<IndexRange>,
    mode: RangeMode,
    op: ByteOp,
    indexes: Vec<usize>,
    old_data: Vec<u8>,
}

impl TransformRanges {
    pub fn new(segment: &Segment, ranges: Vec<IndexRange>, op: ByteOp) -> Self {
        Self::with_mode(segment, ranges, op, RangeMode::Linear)
    }

    pub fn with_mode(segment: &Segment, ranges: Vec<IndexRange>, op: ByteOp, mode: RangeMode) -> Self {
        Self {
            segment: segment.clone(),
            ranges,
            mode,
            op,
            indexes: Vec::new(),
            old_data: Vec::new(),
        }
    }

    pub fn op(&self) -> &ByteOp {
        &self.op
    }

    pub fn ranges(&self) -> &[IndexRange] {
        &self.ranges
    }
}

impl Command for TransformRanges {
    fn short_name(&self) -> &'static str {
        self.op.short_name()
    }

    fn ui_name(&self) -> &'static str {
        self.op.ui_name()
    }

    fn serialize_order(&self) -> &'static [(&'static str, FieldKind)] {
        if self.op.takes_value() {
            RANGE_VALUE_FIELDS
        } else {
            RANGE_FIELDS
        }
    }

    fn set_undo_flags(&self, flags: &mut StatusFlags) {
        flags.byte_values_changed = true;
    }

    fn do_change(&mut self, flags: &mut StatusFlags) -> EditResult<()> {
        if let ByteOp::RandomBytes { seed } = &mut self.op {
            seed.get_or_insert_with(|| SmallRng::from_os_rng().random());
        }
        let indexes = self.mode.indexes(&self.ranges);
        if indexes.is_empty() {
            flags.changed_document = false;
            flags.byte_values_changed = false;
            return Ok(());
        }
        let old_data = self.segment.read_at(&indexes)?;
        let transformed = self.op.apply(&old_data);
        self.segment.write_at(&indexes, &transformed.data)?;
        if transformed.skipped > 0 {
            flags.add_message(format!(
                "Divide by zero: skipped {} bytes",
                transformed.skipped
            ));
        }
        flags.index_range = span(&indexes);
        tracing::trace!("{} over {} bytes", self.op.short_name(), indexes.len());
        self.indexes = indexes;
        self.old_data = old_data;
        Ok(())
    }

    fn undo_change(&mut self, flags: &mut StatusFlags) -> EditResult<()> {
        self.segment.write_at(&self.indexes, &self.old_data)?;
        flags.index_range = span(&self.indexes);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Replaces `start..end` with literal bytes.
#[derive(Debug, Clone)]
pub struct ChangeBytes {
    segment: Segment,
    start: usize,
    end: usize,
    data: Vec<u8>,
    caret_at_end: bool,
    ignore_if_same_bytes: bool,
    coalescing: bool,
    old_data: Vec<u8>,
}

impl ChangeBytes {
    /// `start == end` is treated as the single byte at `start`.
    pub fn new(segment: &Segment, start: usize, end: usize, data: Vec<u8>) -> Self {
        let end = if start == end { end + 1 } else { end };
        Self {
            segment: segment.clone(),
            start,
            end,
            data,
            caret_at_end: false,
            ignore_if_same_bytes: false,
            coalescing: false,
            old_data: Vec::new(),
        }
    }

    /// A variant where consecutive edits of the same span merge into one
    /// undo step, as when typing over a byte.
    pub fn coalescing(segment: &Segment, start: usize, end: usize, data: Vec<u8>) -> Self {
        Self {
            coalescing: true,
            ..Self::new(segment, start, end, data)
        }
    }

    /// Move the caret to the end of the span after the change.
    pub fn caret_at_end(mut self, yes: bool) -> Self {
        self.caret_at_end = yes;
        self
    }

    /// Do not record the change if it writes the bytes already there.
    pub fn ignore_if_same_bytes(mut self, yes: bool) -> Self {
        self.ignore_if_same_bytes = yes;
        self
    }

    pub fn range(&self) -> IndexRange {
        (self.start, self.end)
    }
}

const CHANGE_BYTES_FIELDS: &[(&str, FieldKind)] = &[
    ("segment", FieldKind::Segment),
    ("start_index", FieldKind::Int),
    ("end_index", FieldKind::Int),
    ("byte_values", FieldKind::Bytes),
    ("caret_at_end", FieldKind::Bool),
    ("ignore_if_same_bytes", FieldKind::Bool),
];

impl Command for ChangeBytes {
    fn short_name(&self) -> &'static str {
        if self.coalescing { "ccb" } else { "cb" }
    }

    fn ui_name(&self) -> &'static str {
        "Change Bytes"
    }

    fn serialize_order(&self) -> &'static [(&'static str, FieldKind)] {
        CHANGE_BYTES_FIELDS
    }

    fn describe(&self) -> String {
        if self.end - self.start > 1 {
            format!(
                "{} @ {:04x}-{:04x}",
                self.ui_name(),
                self.segment.address(self.start),
                self.segment.address(self.end)
            )
        } else {
            format!("{} @ {:04x}", self.ui_name(), self.segment.address(self.start))
        }
    }

    fn set_undo_flags(&self, flags: &mut StatusFlags) {
        flags.byte_values_changed = true;
        flags.index_range = Some((self.start, self.end));
        if self.caret_at_end {
            flags.caret_index = Some(self.end);
        }
    }

    fn do_change(&mut self, flags: &mut StatusFlags) -> EditResult<()> {
        let old_data = self.segment.read(self.start, self.end)?;
        self.segment.write(self.start, self.end, &self.data)?;
        if self.ignore_if_same_bytes && old_data == self.data {
            flags.success = false;
            flags.changed_document = false;
        }
        self.old_data = old_data;
        Ok(())
    }

    fn undo_change(&mut self, _flags: &mut StatusFlags) -> EditResult<()> {
        self.segment.write(self.start, self.end, &self.old_data)?;
        Ok(())
    }

    fn can_coalesce(&self, next: &dyn Command) -> bool {
        match next.as_any().downcast_ref::<ChangeBytes>() {
            Some(next) => {
                self.coalescing
                    && next.coalescing
                    && self.segment.same_segment(&next.segment)
                    && self.start == next.start
                    && self.end == next.end
            }
            None => false,
        }
    }

    fn coalesce_merge(&mut self, next: &dyn Command) {
        if let Some(next) = next.as_any().downcast_ref::<ChangeBytes>() {
            self.data = next.data.clone();
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Copies the baseline bytes back over a set of ranges.
#[derive(Debug, Clone)]
pub struct RevertToBaseline {
    segment: Segment,
    ranges: Vec<IndexRange>,
    indexes: Vec<usize>,
    old_data: Vec<u8>,
}

impl RevertToBaseline {
    pub fn new(segment: &Segment, ranges: Vec<IndexRange>) -> Self {
        Self {
            segment: segment.clone(),
            ranges,
            indexes: Vec::new(),
            old_data: Vec::new(),
        }
    }
}

impl Command for RevertToBaseline {
    fn short_name(&self) -> &'static str {
        "revert_baseline"
    }

    fn ui_name(&self) -> &'static str {
        "Revert to Baseline"
    }

    fn serialize_order(&self) -> &'static [(&'static str, FieldKind)] {
        RANGE_FIELDS
    }

    fn set_undo_flags(&self, flags: &mut StatusFlags) {
        flags.byte_values_changed = true;
    }

    fn do_change(&mut self, flags: &mut StatusFlags) -> EditResult<()> {
        if !self.segment.has_baseline() {
            return Err(EditError::NoBaseline);
        }
        let indexes = RangeMode::Linear.indexes(&self.ranges);
        let baseline = self.segment.baseline_at(&indexes)?;
        let old_data = self.segment.read_at(&indexes)?;
        self.segment.write_at(&indexes, &baseline)?;
        flags.index_range = span(&indexes);
        self.indexes = indexes;
        self.old_data = old_data;
        Ok(())
    }

    fn undo_change(&mut self, flags: &mut StatusFlags) -> EditResult<()> {
        self.segment.write_at(&self.indexes, &self.old_data)?;
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

    fn counting(len: usize) -> Segment {
        Segment::new((0..len).map(|i| i as u8).collect(), 0, "test")
    }

    #[test]
    fn test_bitwise_ops() {
        let orig = [0x00, 0x81, 0x7f];
        assert_eq!(ByteOp::SetHighBit.apply(&orig).data, vec![0x80, 0x81, 0xff]);
        assert_eq!(ByteOp::ClearHighBit.apply(&orig).data, vec![0x00, 0x01, 0x7f]);
        assert_eq!(ByteOp::LeftShift.apply(&orig).data, vec![0x00, 0x02, 0xfe]);
        assert_eq!(ByteOp::RightRotate.apply(&orig).data, vec![0x00, 0xc0, 0xbf]);
        assert_eq!(ByteOp::ReverseBits.apply(&[0x01, 0xf0]).data, vec![0x80, 0x0f]);
    }

    #[test]
    fn test_arithmetic_wraps() {
        assert_eq!(ByteOp::Add(0x10).apply(&[0xf8]).data, vec![0x08]);
        assert_eq!(ByteOp::Subtract(2).apply(&[1]).data, vec![0xff]);
        assert_eq!(ByteOp::SubtractFrom(1).apply(&[2]).data, vec![0xff]);
        assert_eq!(ByteOp::Multiply(3).apply(&[0x60]).data, vec![0x20]);
    }

    #[test]
    fn test_divide_by_zero_skips() {
        let divided = ByteOp::DivideFrom(100).apply(&[0, 10, 0, 3]);
        assert_eq!(divided.data, vec![0, 10, 0, 33]);
        assert_eq!(divided.skipped, 2);
        let divided = ByteOp::DivideBy(0).apply(&[5, 6]);
        assert_eq!(divided.data, vec![5, 6]);
        assert_eq!(divided.skipped, 2);
    }

    #[test]
    fn test_ramps() {
        assert_eq!(ByteOp::RampUp(Ramp::from(0xfe)).apply(&[0; 4]).data, vec![0xfe, 0xff, 0, 1]);
        assert_eq!(ByteOp::RampDown(Ramp::from(1)).apply(&[0; 3]).data, vec![1, 0, 0xff]);
        let stepped = Ramp::new(0, None, Some(4));
        assert_eq!(ByteOp::RampUp(stepped).apply(&[0; 4]).data, vec![0, 4, 8, 12]);
        let stopped = Ramp::new(0, Some(100), None);
        assert_eq!(ByteOp::RampUp(stopped).apply(&[0; 4]).data, vec![0, 25, 50, 75]);
    }

    #[test]
    fn test_reverse_group_leaves_tail() {
        let data = ByteOp::ReverseGroup(3).apply(&[1, 2, 3, 4, 5, 6, 7]).data;
        assert_eq!(data, vec![3, 2, 1, 6, 5, 4, 7]);
        assert_eq!(ByteOp::ReverseSelection.apply(&[1, 2, 3]).data, vec![3, 2, 1]);
    }

    #[test]
    fn test_random_bytes_redo_is_deterministic() {
        let seg = Segment::new(vec![0; 64], 0, "test");
        let mut cmd = TransformRanges::new(&seg, vec![(0, 64)], ByteOp::RandomBytes { seed: None });
        assert!(cmd.perform().success());
        let first = seg.to_vec();
        assert!(cmd.undo().success());
        assert_eq!(seg.to_vec(), vec![0; 64]);
        assert!(cmd.perform().success());
        assert_eq!(seg.to_vec(), first);
    }

    #[test]
    fn test_transform_flags() {
        let seg = counting(16);
        let mut cmd = TransformRanges::new(&seg, vec![(8, 12), (2, 4)], ByteOp::Zero);
        let info = cmd.perform();
        assert!(info.flags.byte_values_changed);
        assert_eq!(info.flags.index_range, Some((2, 12)));
    }

    #[test]
    fn test_divide_message() {
        let seg = Segment::new(vec![0, 2, 4], 0, "test");
        let mut cmd = TransformRanges::new(&seg, vec![(0, 3)], ByteOp::DivideFrom(8));
        let info = cmd.perform();
        assert!(info.success());
        assert_eq!(info.flags.message.as_deref(), Some("Divide by zero: skipped 1 bytes"));
        assert_eq!(seg.to_vec(), vec![0, 4, 2]);
    }

    #[test]
    fn test_rect_mode() {
        let seg = Segment::new(vec![0; 16], 0, "test");
        let mut cmd = TransformRanges::with_mode(&seg, vec![(1, 7)], ByteOp::Ff, RangeMode::Rect(4));
        cmd.perform();
        assert_eq!(seg.read_at(&[1, 2, 5, 6]).unwrap(), vec![0xff; 4]);
        assert_eq!(seg.byte(3).unwrap(), 0);
    }

    #[test]
    fn test_change_bytes_single_index() {
        let seg = counting(8);
        let mut cmd = ChangeBytes::new(&seg, 2, 2, vec![0x99]).caret_at_end(true);
        let info = cmd.perform();
        assert_eq!(info.flags.caret_index, Some(3));
        assert_eq!(seg.byte(2).unwrap(), 0x99);
        assert_eq!(cmd.describe(), "Change Bytes @ 0002");
    }

    #[test]
    fn test_change_bytes_ignore_same() {
        let seg = counting(8);
        let mut cmd = ChangeBytes::new(&seg, 2, 4, vec![2, 3]).ignore_if_same_bytes(true);
        let info = cmd.perform();
        assert!(!info.success());
        assert!(!info.flags.changed_document);
    }

    #[test]
    fn test_revert_to_baseline() {
        let seg = counting(8);
        let mut cmd = RevertToBaseline::new(&seg, vec![(0, 4)]);
        assert!(!cmd.perform().success());

        seg.store().borrow_mut().set_baseline(vec![9; 8]);
        assert!(cmd.perform().success());
        assert_eq!(seg.read(0, 5).unwrap(), vec![9, 9, 9, 9, 4]);
        cmd.undo();
        assert_eq!(seg.read(0, 5).unwrap(), vec![0, 1, 2, 3, 4]);
    }
}
