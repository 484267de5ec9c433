//! crates/checksums/benches/checksums_benchmark.rs
//!
//! Benchmarks for incremental MD5 throughput.
//!
//! Run with: `cargo bench -p checksums`

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rand::Rng;

use checksums::strong::Md5;

/// Generate random data of the specified size.
fn generate_random_data(size: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    let mut data = vec![0u8; size];
    rng.fill(&mut data[..]);
    data
}

/// Benchmark one-shot MD5 digest computation.
fn bench_md5_one_shot(c: &mut Criterion) {
    let mut group = c.benchmark_group("md5_one_shot");

    for size in [64, 4096, 65536, 1 << 20] {
        let data = generate_random_data(size);

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("compute", size), &data, |b, data| {
            b.iter(|| black_box(Md5::compute(black_box(data))));
        });
    }

    group.finish();
}

/// Benchmark MD5 fed in the compressor's flush-sized pieces.
fn bench_md5_streaming(c: &mut Criterion) {
    let mut group = c.benchmark_group("md5_streaming");
    let data = generate_random_data(4 << 20);

    for piece in [8192, 1 << 20] {
        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_with_input(BenchmarkId::new("update", piece), &piece, |b, &piece| {
            b.iter(|| {
                let mut hasher = Md5::new();
                for chunk in data.chunks(piece) {
                    hasher.update(black_box(chunk));
                }
                black_box(hasher.finalize())
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_md5_one_shot, bench_md5_streaming);
criterion_main!(benches);
