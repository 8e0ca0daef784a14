//! Export time for growing hierarchies. Throughput should stay flat as the
//! segment count grows by 10x.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use kinetree_hierarchy::{HierarchyExporter, Segment};

/// Every segment hangs off the previous one or off the root, alternating.
fn skeleton(n: usize) -> Vec<Segment<usize, ()>> {
    (0..n)
        .map(|i| {
            let parent = match i {
                0 => None,
                i if i % 2 == 0 => Some(i - 1),
                _ => Some(0),
            };
            Segment::new(i, parent, ())
        })
        .collect()
}

fn bench_export(c: &mut Criterion) {
    let mut group = c.benchmark_group("export");

    for n in [1_000usize, 10_000, 100_000] {
        let segments = skeleton(n);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &segments, |b, segments| {
            b.iter(|| {
                let tree = HierarchyExporter::new(black_box(segments)).export().unwrap();
                black_box(tree.roots().len())
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_export);
criterion_main!(benches);
