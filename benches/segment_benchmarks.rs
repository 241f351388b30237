//! Benchmarks for range handling, byte transforms and the tile layout pass.
//!
//! Run with: cargo bench

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use omnivore_core::UndoStack;
use omnivore_core::commands::{ByteOp, TransformRanges};
use omnivore_segment::{IndexRange, Segment, collapse_overlapping_ranges};
use omnivore_tile::{ClientId, Direction, Rect, Side, SplitTree};

/// Overlapping ranges scattered over `span` bytes.
fn scattered_ranges(count: usize, span: usize) -> Vec<IndexRange> {
    (0..count)
        .map(|i| {
            let start = (i * 7919) % span;
            (start, (start + 64).min(span))
        })
        .collect()
}

fn bench_collapse_ranges(c: &mut Criterion) {
    let mut group = c.benchmark_group("collapse_ranges");

    for count in [100, 1000, 10000].iter() {
        let ranges = scattered_ranges(*count, 1 << 20);
        group.bench_with_input(BenchmarkId::new("scattered", count), &ranges, |b, ranges| {
            b.iter(|| black_box(collapse_overlapping_ranges(black_box(ranges))))
        });
    }

    group.finish();
}

fn bench_transform(c: &mut Criterion) {
    let mut group = c.benchmark_group("transform");

    for size in [4096, 65536, 1 << 20].iter() {
        group.bench_with_input(BenchmarkId::new("xor_perform_undo", size), size, |b, &size| {
            let segment = Segment::new(vec![0x55; size], 0, "bench");
            let mut stack = UndoStack::new();
            b.iter(|| {
                let command = TransformRanges::new(&segment, vec![(0, size)], ByteOp::Xor(0xff));
                stack.perform(Box::new(command));
                black_box(stack.undo())
            })
        });
    }

    group.bench_function("ramp_up_1mb", |b| {
        let segment = Segment::new(vec![0; 1 << 20], 0, "bench");
        let mut stack = UndoStack::new();
        b.iter(|| {
            let command = TransformRanges::new(&segment, vec![(0, 1 << 20)], ByteOp::RampUp(0u8.into()));
            black_box(stack.perform(Box::new(command)))
        })
    });

    group.finish();
}

/// A tree of `splits` leaves, alternating split sides.
fn deep_tree(splits: usize) -> SplitTree {
    let mut tree = SplitTree::new(Direction::Horizontal, ClientId::new());
    let sides = [Side::Right, Side::Bottom, Side::Left, Side::Top];
    for i in 0..splits {
        let leaves = tree.leaves();
        let leaf = leaves[(i * 31) % leaves.len()];
        tree.split(leaf, sides[i % sides.len()], ClientId::new())
            .expect("leaves() only returns leaves");
    }
    tree
}

fn bench_layout_pass(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout_pass");

    for splits in [8, 64, 512].iter() {
        let mut tree = deep_tree(*splits);
        group.bench_function(BenchmarkId::new("layout", splits), |b| {
            b.iter(|| tree.layout(black_box(Rect::new(0, 0, 1920, 1080)), 5))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_collapse_ranges, bench_transform, bench_layout_pass);
criterion_main!(benches);
