//! Elementary-operation throughput benchmarks.
//!
//! Measures the elementwise transform across vector sizes that land in
//! different levels of the cache hierarchy, for a representative subset of
//! the catalog in both element widths.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use flopbench::{apply, InputBuffer, Operation, ResultBuffer, DEFAULT_ALIGNMENT};

/// Element counts spanning L1-resident to memory-bound working sets.
const VECTOR_SIZES: &[usize] = &[
    4_096,     // 32 KiB of f64 - L1 cache
    65_536,    // 512 KiB - L2 cache
    1_048_576, // 8 MiB - L3 cache
];

/// Operations worth tracking: one cheap and one expensive family per group.
const OPERATIONS: &[&str] = &["cos", "cosf", "exp", "expf", "sqrt", "sqrtf", "lgamma"];

/// Generates reproducible input data in (0, 1], valid for every family in
/// the benchmarked set.
fn generate_f64(len: usize) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(42);
    (0..len).map(|_| 1.0 - rng.random::<f64>()).collect()
}

fn generate_f32(len: usize) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(42);
    (0..len).map(|_| 1.0 - rng.random::<f32>()).collect()
}

fn benchmark_operations(c: &mut Criterion) {
    for &name in OPERATIONS {
        let op = Operation::resolve(name).unwrap();
        let mut group = c.benchmark_group(format!("apply_{name}"));

        for &size in VECTOR_SIZES {
            group.throughput(Throughput::Elements(size as u64));

            let input = match op.width() {
                flopbench::Width::Narrow => {
                    InputBuffer::from_f32s(&generate_f32(size), DEFAULT_ALIGNMENT).unwrap()
                }
                flopbench::Width::Wide => {
                    InputBuffer::from_f64s(&generate_f64(size), DEFAULT_ALIGNMENT).unwrap()
                }
            };
            let mut result = ResultBuffer::for_operation(op, size, DEFAULT_ALIGNMENT).unwrap();

            group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
                b.iter(|| black_box(apply(op, black_box(&input), &mut result).unwrap()))
            });
        }

        group.finish();
    }
}

criterion_group!(benches, benchmark_operations);
criterion_main!(benches);
