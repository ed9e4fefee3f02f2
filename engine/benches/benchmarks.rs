//! Performance benchmarks for termsync-engine

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use termsync_engine::{classify, InMemoryRemote, Propagator, Record, RecordStatus};

fn reference_set(size: i64) -> Vec<Record> {
    (0..size)
        .map(|i| Record::reference(format!("Net{}", i), i))
        .collect()
}

/// Remote snapshot sharing half the keys, with every tenth name changed.
fn remote_set(size: i64) -> Vec<Record> {
    (size / 2..size + size / 2)
        .map(|i| {
            let name = if i % 10 == 0 {
                format!("Net{} (old)", i)
            } else {
                format!("Net{}", i)
            };
            Record::remote(format!("L{}", i), name, i)
        })
        .collect()
}

fn bench_classify(c: &mut Criterion) {
    let mut group = c.benchmark_group("classify");

    for size in [100i64, 1_000, 10_000] {
        let reference = reference_set(size);
        let remote = remote_set(size);

        group.bench_with_input(BenchmarkId::new("classify", size), &size, |b, _| {
            b.iter(|| classify(black_box(reference.clone()), black_box(remote.clone())))
        });

        group.bench_with_input(BenchmarkId::new("classify_merge", size), &size, |b, _| {
            b.iter(|| classify(black_box(reference.clone()), black_box(remote.clone())).merge())
        });
    }

    group.finish();
}

fn bench_propagate(c: &mut Criterion) {
    let mut group = c.benchmark_group("propagate");
    let runtime = tokio::runtime::Runtime::new().unwrap();

    for size in [10i64, 100, 1_000] {
        group.bench_with_input(BenchmarkId::new("in_memory_batch", size), &size, |b, &size| {
            b.to_async(&runtime).iter(|| async move {
                let remote = InMemoryRemote::new();
                let propagator = Propagator::new(&remote, "TermSync");
                let mut candidates = reference_set(size);
                for candidate in &mut candidates {
                    candidate.status = RecordStatus::Added;
                }
                propagator.propagate(black_box(&mut candidates)).await;
                candidates
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_classify, bench_propagate);
criterion_main!(benches);
