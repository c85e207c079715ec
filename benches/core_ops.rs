//! Benchmarks for vector-combine host-side paths.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;
use vector_combine::backend::HostBackend;
use vector_combine::{
    combine_with_source, estimate_session_bytes, format_grid, CombineConfig, FixedVector,
    KernelSource, MemoryTracker, Vector16,
};

const ADD_KERNEL: &str = "__kernel void hello(__global float* A, __global float* B, __global float* C)\n\
                          {\n    int i = get_global_id(0);\n    C[i] = A[i] + B[i];\n}\n";

/// Benchmark a full host session: acquire, stage, dispatch, read, release.
fn bench_host_session(c: &mut Criterion) {
    let mut group = c.benchmark_group("host_session");
    let backend = HostBackend::new().with_kernel("hello", |a, b| a + b);
    let source = KernelSource::from_text(ADD_KERNEL);

    group.bench_function("combine_16", |b| {
        let config = CombineConfig::default();
        let (x, y) = (Vector16::indexed(), Vector16::indexed());
        b.iter(|| {
            backend.log().clear();
            let out = combine_with_source(&backend, &config, &source, &x, &y).unwrap();
            black_box(out)
        })
    });

    group.bench_function("combine_1024_grouped", |b| {
        let config = CombineConfig::new().with_local_work_size(64);
        let x = FixedVector::<f32, 1024>::indexed();
        b.iter(|| {
            backend.log().clear();
            let out = combine_with_source(&backend, &config, &source, &x, &x).unwrap();
            black_box(out)
        })
    });

    group.finish();
}

/// Benchmark grid formatting.
fn bench_format_grid(c: &mut Criterion) {
    let mut group = c.benchmark_group("format_grid");

    for len in [16, 256, 4096] {
        let values: Vec<f32> = (0..len).map(|k| k as f32 * 2.0).collect();
        group.bench_with_input(BenchmarkId::new("columns_4", len), &values, |b, values| {
            b.iter(|| black_box(format_grid(black_box(values), 4)))
        });
    }

    group.finish();
}

/// Benchmark memory tracking operations.
fn bench_memory_tracker(c: &mut Criterion) {
    let mut group = c.benchmark_group("memory_tracker");

    group.bench_function("allocate_deallocate", |b| {
        let tracker = MemoryTracker::new();
        b.iter(|| {
            tracker.allocate(black_box(64)).unwrap();
            tracker.deallocate(black_box(64));
        })
    });

    group.bench_function("allocate_with_limit", |b| {
        let tracker = MemoryTracker::with_limit(1024);
        b.iter(|| {
            let _ = black_box(tracker.allocate(black_box(2048)));
        })
    });

    group.bench_function("estimate_session", |b| {
        b.iter(|| black_box(estimate_session_bytes::<f32>(black_box(3), black_box(16))))
    });

    group.finish();
}

/// Benchmark fixed vector construction.
fn bench_fixed_vector(c: &mut Criterion) {
    let mut group = c.benchmark_group("fixed_vector");

    group.bench_function("indexed_16", |b| b.iter(|| black_box(Vector16::indexed())));

    group.bench_function("indexed_4096", |b| {
        b.iter(|| black_box(FixedVector::<f32, 4096>::indexed()))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_host_session,
    bench_format_grid,
    bench_memory_tracker,
    bench_fixed_vector,
);
criterion_main!(benches);
