//! Benchmarking conversions between CPU bitmasks and CPU range lists.

#![allow(
    missing_docs,
    reason = "No need for API documentation in benchmark code"
)]

use std::hint::black_box;

use cpumask::{CpuList, CpuSet, Word};
use criterion::{Criterion, criterion_group, criterion_main};

criterion_group!(benches, entrypoint);
criterion_main!(benches);

fn entrypoint(c: &mut Criterion) {
    let mut group = c.benchmark_group("CpuSet_to_list");

    // Typical unrestricted affinity on a large server: one long run of set bits.
    let dense = CpuSet::from_words(vec![Word::MAX; 16]);
    group.bench_function("dense_1024", |b| {
        b.iter(|| black_box(&dense).to_list());
    });

    // Every other CPU, e.g. one hyperthread per core. Worst case for range detection.
    let alternating = CpuSet::from_words(vec![0x5555_5555_5555_5555; 16]);
    group.bench_function("alternating_1024", |b| {
        b.iter(|| black_box(&alternating).to_list());
    });

    // A few CPUs at the far end of a mostly empty mask.
    let mut sparse_words = vec![0; 16];
    sparse_words[15] = 0b1011;
    let sparse = CpuSet::from_words(sparse_words);
    group.bench_function("sparse_1024", |b| {
        b.iter(|| black_box(&sparse).to_list());
    });

    group.finish();

    let mut group = c.benchmark_group("CpuList_to_set");

    let list: CpuList = "0-31,64-95,128-159,192-223,256-1023".parse().unwrap();
    group.bench_function("mixed_1024", |b| {
        b.iter(|| black_box(&list).to_set());
    });

    group.finish();

    let mut group = c.benchmark_group("CpuList_parse");

    group.bench_function("proc_status_line", |b| {
        b.iter(|| CpuList::parse(black_box(b"0-31,64-95,128-159,192-223,256-1023")));
    });

    group.finish();
}
