//! Property tests for the command pipeline.

use omnivore_core::commands::{ByteOp, ClearComment, Ramp, SetComment, TransformRanges};
use omnivore_core::{Command, UndoStack};
use omnivore_segment::{IndexRange, Segment};
use proptest::prelude::*;

/// Bytes, style and comments of a segment.
fn snapshot(segment: &Segment) -> (Vec<u8>, Vec<u8>, Vec<(usize, String)>) {
    (
        segment.to_vec(),
        segment.style_range(0, segment.len()).unwrap(),
        segment.get_sorted_comments(),
    )
}

fn seeded_segment(data: Vec<u8>) -> Segment {
    let segment = Segment::new(data, 0x2000, "prop");
    segment.set_comment(0, "first").unwrap();
    segment.set_comment(segment.len() - 1, "last").unwrap();
    segment
}

fn byte_op() -> impl Strategy<Value = ByteOp> {
    prop_oneof![
        Just(ByteOp::Zero),
        Just(ByteOp::Ff),
        any::<u8>().prop_map(ByteOp::SetValue),
        any::<u8>().prop_map(ByteOp::Or),
        any::<u8>().prop_map(ByteOp::And),
        any::<u8>().prop_map(ByteOp::Xor),
        Just(ByteOp::BitwiseNot),
        Just(ByteOp::LeftShift),
        Just(ByteOp::RightRotate),
        Just(ByteOp::ReverseBits),
        any::<u8>().prop_map(ByteOp::Add),
        any::<u8>().prop_map(ByteOp::SubtractFrom),
        any::<u8>().prop_map(ByteOp::Multiply),
        any::<u8>().prop_map(ByteOp::DivideBy),
        any::<u8>().prop_map(ByteOp::DivideFrom),
        any::<u8>().prop_map(|v| ByteOp::RampDown(Ramp::from(v))),
        (any::<i8>(), 1i64..5).prop_map(|(start, step)| {
            ByteOp::RampUp(Ramp::new(start as i64, None, Some(step)))
        }),
        Just(ByteOp::RandomBytes { seed: None }),
        Just(ByteOp::ReverseSelection),
        (1usize..6).prop_map(ByteOp::ReverseGroup),
    ]
}

fn ranges(len: usize) -> impl Strategy<Value = Vec<IndexRange>> {
    prop::collection::vec((0..len, 0..len), 1..4).prop_map(|pairs| {
        pairs
            .into_iter()
            .map(|(a, b)| if a <= b { (a, b + 1) } else { (b, a + 1) })
            .collect()
    })
}

proptest! {
    #[test]
    fn transform_undo_restores_everything(
        data in prop::collection::vec(any::<u8>(), 32),
        op in byte_op(),
        ranges in ranges(32),
    ) {
        let segment = seeded_segment(data);
        let before = snapshot(&segment);
        let mut stack = UndoStack::new();

        let info = stack.perform(Box::new(TransformRanges::new(&segment, ranges, op)));
        prop_assert!(info.success());
        let after = snapshot(&segment);

        prop_assert!(stack.undo().success());
        prop_assert_eq!(snapshot(&segment), before);

        prop_assert!(stack.redo().success());
        prop_assert_eq!(snapshot(&segment), after);
    }

    #[test]
    fn comment_commands_undo_restores_everything(
        data in prop::collection::vec(any::<u8>(), 32),
        set in ranges(32),
        clear in ranges(32),
    ) {
        let segment = seeded_segment(data);
        let before = snapshot(&segment);
        let mut stack = UndoStack::new();

        stack.perform(Box::new(SetComment::new(&segment, &set, "note")));
        stack.perform(Box::new(ClearComment::new(&segment, &clear)));
        let after = snapshot(&segment);

        stack.undo();
        stack.undo();
        prop_assert_eq!(snapshot(&segment), before);
        stack.redo();
        stack.redo();
        prop_assert_eq!(snapshot(&segment), after);
    }

    #[test]
    fn describe_never_panics(op in byte_op(), ranges in ranges(16)) {
        let segment = seeded_segment(vec![0; 16]);
        let command = TransformRanges::new(&segment, ranges, op);
        prop_assert!(!command.describe().is_empty());
    }
}
